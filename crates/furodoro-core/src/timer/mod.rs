//! Work/break credit timer.

pub mod driver;
pub mod engine;
pub mod ledger;
pub mod phase;
pub mod snapshot;
pub mod state;

pub use driver::{Tick, TickDriver, TICK_PERIOD};
pub use engine::{LongBreakAction, TimerEngine, MIN_LOGGABLE_WORK_SECONDS};
pub use phase::SessionPhase;
pub use snapshot::TimerSnapshot;
pub use state::{Face, TickOutcome, TimerState};
