//! Timer engine implementation.
//!
//! The engine is a tick-driven state machine. It does not own a clock -
//! the caller invokes `tick()` once per elapsed second while it is running.
//!
//! ## Phase transitions
//!
//! ```text
//! Work --main--> Break --main / expiry--> Work
//!   \                                      ^
//!    `--long--> LongBreak --main---------'
//!                   \--long--> reset (Work)
//! ```
//!
//! Entering any phase pauses first; starting is always a separate step.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::phase::SessionPhase;
use super::snapshot::TimerSnapshot;
use super::state::{TickOutcome, TimerState};
use crate::events::{Event, NoticeLevel};
use crate::integrations::SessionReport;
use crate::settings::Settings;

/// Gross work below this is too short to report.
pub const MIN_LOGGABLE_WORK_SECONDS: u64 = 30;

/// Result of the long-break / reset action.
#[derive(Debug, Clone, PartialEq)]
pub struct LongBreakAction {
    pub events: Vec<Event>,
    /// Set when a finished work run should be reported.
    pub report: Option<SessionReport>,
}

/// Core timer engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    state: TimerState,
    settings: Settings,
    /// Planned minutes of the bound queue task, if any.
    task_minutes: Option<u32>,
    /// Bumped on every successful start; identifies one run of the countdown.
    run_epoch: u64,
}

impl TimerEngine {
    /// Paused Work with the full configured length.
    pub fn new(settings: Settings) -> Self {
        Self {
            state: TimerState::initial(&settings),
            settings,
            task_minutes: None,
            run_epoch: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn run_epoch(&self) -> u64 {
        self.run_epoch
    }

    pub fn task_minutes(&self) -> Option<u32> {
        self.task_minutes
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot::capture(&self.state, self.settings.work_ratio)
    }

    pub fn snapshot_event(&self) -> Event {
        Event::StateSnapshot {
            snapshot: self.snapshot(),
            at: Utc::now(),
        }
    }

    // ── Configuration ────────────────────────────────────────────────

    /// Install freshly read settings without touching the countdown.
    pub fn replace_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    /// Length used for the next Work entry. Never resizes a running phase.
    pub fn set_task_minutes(&mut self, minutes: Option<u32>) {
        self.task_minutes = minutes;
    }

    /// Install settings and, while paused, re-size the current phase.
    pub fn apply_settings(&mut self, settings: Settings) -> Vec<Event> {
        self.replace_settings(settings);
        if self.state.running {
            return Vec::new();
        }
        let phase = self.state.phase;
        self.enter_phase(phase, phase != SessionPhase::Work)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn enter_phase(&mut self, phase: SessionPhase, reset_gross_work: bool) -> Vec<Event> {
        let mut events = Vec::with_capacity(2);
        events.extend(self.pause());
        self.state
            .enter_phase(phase, reset_gross_work, &self.settings, self.task_minutes);
        tracing::info!(
            phase = %phase,
            duration_secs = self.state.session_duration_secs,
            reset_gross_work,
            "entered phase"
        );
        events.push(Event::PhaseEntered {
            phase,
            duration_secs: self.state.session_duration_secs,
            reset_gross_work,
            at: Utc::now(),
        });
        events
    }

    /// Enter a phase by name. An unknown name falls back to Work with the
    /// configured length and a cleared gross counter.
    pub fn enter_phase_named(&mut self, name: &str, reset_gross_work: bool) -> Vec<Event> {
        match name.parse::<SessionPhase>() {
            Ok(phase) => self.enter_phase(phase, reset_gross_work),
            Err(e) => {
                tracing::error!(error = %e, "invalid phase; falling back to Work");
                let mut events = Vec::with_capacity(2);
                events.extend(self.pause());
                self.state
                    .enter_phase(SessionPhase::Work, true, &self.settings, None);
                events.push(Event::PhaseEntered {
                    phase: SessionPhase::Work,
                    duration_secs: self.state.session_duration_secs,
                    reset_gross_work: true,
                    at: Utc::now(),
                });
                events
            }
        }
    }

    /// Start the countdown. A break with nothing left is re-sized once;
    /// if it is still empty the timer stays paused.
    pub fn start(&mut self) -> Vec<Event> {
        if self.state.running {
            return Vec::new();
        }

        let mut events = Vec::new();
        let phase = self.state.phase;
        if phase.is_break() && self.state.session_duration_secs <= 0 {
            tracing::warn!(phase = %phase, "start attempted with no duration; recalculating");
            events.extend(self.enter_phase(phase, false));
            if self.state.session_duration_secs <= 0 {
                tracing::info!(phase = %phase, "nothing earned; staying paused");
                events.push(Event::StartSkipped {
                    phase,
                    at: Utc::now(),
                });
                return events;
            }
        }

        self.state.running = true;
        self.run_epoch += 1;
        events.push(Event::TimerStarted {
            phase,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        });
        events
    }

    /// Stop the countdown, keeping every counter as it is.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.running {
            return None;
        }
        self.state.running = false;
        Some(Event::TimerPaused {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Advance one second. Returns `Some(Event::PhaseExpired)` when a break ends.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.state.running {
            return None;
        }
        match self.state.tick(self.settings.work_ratio) {
            TickOutcome::Continue => None,
            TickOutcome::Expired => {
                tracing::info!(phase = %self.state.phase, net = self.state.net_work_secs, "break ended");
                Some(Event::PhaseExpired {
                    phase: self.state.phase,
                    net_work_secs: self.state.net_work_secs,
                    at: Utc::now(),
                })
            }
        }
    }

    /// The primary button.
    ///
    /// A paused Work phase resumes where it stopped. In overtime that means
    /// the overtime count carries on; the Work countdown is not restarted.
    pub fn toggle_main_action(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        match (self.state.phase, self.state.running) {
            (SessionPhase::LongBreak, _) => {
                events.extend(self.enter_phase(SessionPhase::Work, true));
                events.extend(self.start());
            }
            (SessionPhase::Break, false) if self.state.remaining_secs > 0 => {
                events.extend(self.start());
            }
            (phase, false) => {
                // An ended or empty break hands over to a fresh Work countdown;
                // a paused Work phase (overtime included) simply resumes.
                if phase == SessionPhase::Break {
                    events.extend(self.enter_phase(SessionPhase::Work, false));
                }
                events.extend(self.start());
            }
            (SessionPhase::Work, true) => {
                events.extend(self.enter_phase(SessionPhase::Break, false));
                if self.state.session_duration_secs > 0 {
                    events.extend(self.start());
                }
            }
            (SessionPhase::Break, true) => {
                events.extend(self.enter_phase(SessionPhase::Work, false));
                events.extend(self.start());
            }
        }
        events
    }

    /// The secondary button: start a long break, or reset from one.
    ///
    /// `selected_task` is the task id currently chosen in the selector. A
    /// report is produced only for a selected task and at least
    /// [`MIN_LOGGABLE_WORK_SECONDS`] of gross work.
    pub fn toggle_long_break_or_reset(&mut self, selected_task: Option<&str>) -> LongBreakAction {
        if self.state.phase == SessionPhase::LongBreak {
            return LongBreakAction {
                events: self.reset(),
                report: None,
            };
        }

        let work_secs = self.state.gross_work_secs;
        let mut events = Vec::new();

        if work_secs < MIN_LOGGABLE_WORK_SECONDS {
            events.push(Event::notice(
                NoticeLevel::Error,
                format!("Work session too short ({work_secs}s). Min {MIN_LOGGABLE_WORK_SECONDS}s."),
            ));
            events.extend(self.enter_phase(SessionPhase::LongBreak, true));
            events.extend(self.start());
            return LongBreakAction {
                events,
                report: None,
            };
        }

        events.extend(self.enter_phase(SessionPhase::LongBreak, true));
        events.extend(self.start());

        let report = match selected_task.map(str::trim).filter(|id| !id.is_empty()) {
            Some(task_id) => {
                tracing::info!(task_id, work_secs, "reporting work run");
                Some(SessionReport::new(task_id, work_secs))
            }
            None => {
                tracing::warn!("No task selected. Skipping report for Long Break.");
                None
            }
        };

        LongBreakAction { events, report }
    }

    /// Back to paused Work with both ledgers cleared.
    pub fn reset(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        events.extend(self.pause());
        self.state.phase = SessionPhase::Work;
        self.state.net_work_secs = 0;
        events.extend(self.enter_phase(SessionPhase::Work, true));
        events.push(Event::TimerReset { at: Utc::now() });
        events
    }
}
