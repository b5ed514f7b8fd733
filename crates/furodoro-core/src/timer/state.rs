//! Owned timer state and its pure transitions.
//!
//! `enter_phase` and `tick` only touch the fields of [`TimerState`]; the
//! engine wraps them with events and the start/pause bookkeeping.

use serde::{Deserialize, Serialize};

use super::ledger::{break_cost_per_second, earned_break_seconds, BREAK_RATIO};
use super::phase::SessionPhase;
use crate::settings::Settings;

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Countdown continues (Work may be in overtime).
    Continue,
    /// A break phase ran below zero and paused itself.
    Expired,
}

/// Clock face values derived from the state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    pub minutes: u64,
    pub seconds: u64,
    pub progress_pct: f64,
    pub overtime: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    pub phase: SessionPhase,
    pub running: bool,
    /// Negative during Work overtime, and for one tick after a break expires.
    pub remaining_secs: i64,
    /// Planned length of the current phase; only used for progress.
    pub session_duration_secs: i64,
    /// Signed credit balance.
    pub net_work_secs: i64,
    /// Work seconds since the last reset or post-long-break Work entry.
    pub gross_work_secs: u64,
    /// Set when a break auto-stopped; pins the face to 00:00 / 100%.
    #[serde(default)]
    pub expired: bool,
}

impl TimerState {
    /// Paused Work with the full configured length and empty ledgers.
    pub fn initial(settings: &Settings) -> Self {
        let duration = settings.work_seconds();
        Self {
            phase: SessionPhase::Work,
            running: false,
            remaining_secs: duration,
            session_duration_secs: duration,
            net_work_secs: 0,
            gross_work_secs: 0,
            expired: false,
        }
    }

    /// Switch to `phase`, paused, with a freshly sized countdown.
    ///
    /// Work uses the bound task's length when there is one. Break is capped
    /// by both the configured length and the earned credit. LongBreak always
    /// gets its configured length. `reset_gross_work` only affects Work.
    pub fn enter_phase(
        &mut self,
        phase: SessionPhase,
        reset_gross_work: bool,
        settings: &Settings,
        task_minutes: Option<u32>,
    ) {
        self.running = false;
        self.expired = false;
        self.phase = phase;

        let duration = match phase {
            SessionPhase::Work => {
                if reset_gross_work {
                    self.gross_work_secs = 0;
                }
                task_minutes
                    .filter(|m| *m > 0)
                    .map(|m| i64::from(m) * 60)
                    .unwrap_or_else(|| settings.work_seconds())
            }
            SessionPhase::Break => {
                let earned =
                    earned_break_seconds(self.net_work_secs, settings.work_ratio, BREAK_RATIO);
                earned.max(0).min(settings.break_seconds())
            }
            SessionPhase::LongBreak => settings.long_break_seconds(),
        };

        self.session_duration_secs = duration.max(0);
        self.remaining_secs = self.session_duration_secs;
    }

    /// Advance one second. Callers only tick a running timer.
    pub fn tick(&mut self, work_ratio: i64) -> TickOutcome {
        match self.phase {
            SessionPhase::Work => {
                self.net_work_secs += 1;
                self.gross_work_secs += 1;
            }
            SessionPhase::Break | SessionPhase::LongBreak => {
                let cost = break_cost_per_second(work_ratio, BREAK_RATIO);
                // No charge once the break has hit zero.
                if cost > 0 && self.remaining_secs > 0 {
                    self.net_work_secs -= cost;
                }
            }
        }

        self.remaining_secs -= 1;

        if self.phase.is_break() && self.remaining_secs < 0 {
            self.running = false;
            self.expired = true;
            return TickOutcome::Expired;
        }
        TickOutcome::Continue
    }

    pub fn is_overtime(&self) -> bool {
        self.phase == SessionPhase::Work && self.remaining_secs < 0
    }

    /// Clock face for the current state.
    ///
    /// Work counts down, then counts up from the planned length once in
    /// overtime with progress pinned at 100. Breaks never show below zero.
    pub fn face(&self) -> Face {
        if self.expired {
            return Face {
                minutes: 0,
                seconds: 0,
                progress_pct: 100.0,
                overtime: false,
            };
        }

        let duration = self.session_duration_secs;
        let (shown, progress_pct, overtime) = if self.is_overtime() {
            (duration + self.remaining_secs.abs(), 100.0, true)
        } else {
            let shown = self.remaining_secs.max(0);
            let pct = if duration > 0 {
                (duration - shown) as f64 / duration as f64 * 100.0
            } else {
                0.0
            };
            (shown, pct, false)
        };

        let shown = shown.unsigned_abs();
        Face {
            minutes: shown / 60,
            seconds: shown % 60,
            progress_pct: progress_pct.clamp(0.0, 100.0),
            overtime,
        }
    }
}
