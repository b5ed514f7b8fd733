//! # Furodoro Core Library
//!
//! Core logic for Furodoro, a work/break credit timer. Every second of work
//! earns a fraction of a second of break; breaks spend that credit back.
//! Finished work runs can be logged against LifeUp tasks.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a tick-driven state machine over Work, Break and
//!   LongBreak with a signed credit ledger
//! - **Tick Driver**: a Tokio interval that feeds the engine once per second
//! - **Task Queue**: user-ordered external tasks, each with its own length
//! - **Integrations**: the LifeUp catalog and report relay
//! - **Storage**: TOML configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: core timer state machine
//! - [`FocusController`]: engine, queue, driver and wake lock together
//! - [`LifeUpClient`]: catalog fetch and session reporting
//! - [`Config`]: application configuration management

pub mod controller;
pub mod error;
pub mod events;
pub mod integrations;
pub mod queue;
pub mod settings;
pub mod storage;
pub mod timer;
pub mod wake;

pub use controller::FocusController;
pub use error::{CatalogError, ConfigError, QueueError, ReportError, ValidationError, WakeLockError};
pub use events::{Event, NoticeLevel};
pub use integrations::{Category, LifeUpClient, SelectorState, SessionReport, TaskItem, TaskListing};
pub use queue::{CategoryChoice, Selection, SequenceKey, TaskChoice, TaskQueue, TaskRef};
pub use settings::Settings;
pub use storage::Config;
pub use timer::{SessionPhase, Tick, TickDriver, TimerEngine, TimerSnapshot, TimerState};
pub use wake::{NoWakeLock, WakeLock};
