use serde::{Deserialize, Serialize};

use super::ledger::{earned_rest_text, total_work_text};
use super::phase::SessionPhase;
use super::state::TimerState;

/// Everything the presentation layer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: SessionPhase,
    pub running: bool,
    pub remaining_secs: i64,
    pub duration_secs: i64,
    pub net_work_secs: i64,
    pub gross_work_secs: u64,
    pub minutes: u64,
    pub seconds: u64,
    /// 0.0 ..= 100.0
    pub progress_pct: f64,
    pub overtime: bool,
    pub mode_label: String,
    pub title: String,
    pub stat_line: String,
    pub main_action_label: String,
    pub secondary_action_label: String,
}

impl TimerSnapshot {
    pub(crate) fn capture(state: &TimerState, work_ratio: i64) -> Self {
        let face = state.face();
        let mode_label = state.phase.label().to_string();
        let clock = format!("{:02}:{:02}", face.minutes, face.seconds);
        let title = if state.running {
            format!("{clock} - {mode_label}")
        } else {
            format!("(Paused) {clock} - {mode_label}")
        };

        let stat_line = match state.phase {
            SessionPhase::Work => total_work_text(state.gross_work_secs),
            _ => earned_rest_text(state.net_work_secs, work_ratio),
        };

        let main_action_label = match (state.running, state.phase) {
            (false, _) | (true, SessionPhase::LongBreak) => "Start Work",
            (true, SessionPhase::Work) => "Start Break",
            (true, SessionPhase::Break) => "Resume Work",
        };
        let secondary_action_label = match state.phase {
            SessionPhase::LongBreak => "Reset Timer",
            _ => "Start Long Break",
        };

        Self {
            phase: state.phase,
            running: state.running,
            remaining_secs: state.remaining_secs,
            duration_secs: state.session_duration_secs,
            net_work_secs: state.net_work_secs,
            gross_work_secs: state.gross_work_secs,
            minutes: face.minutes,
            seconds: face.seconds,
            progress_pct: face.progress_pct,
            overtime: face.overtime,
            mode_label,
            title,
            stat_line,
            main_action_label: main_action_label.to_string(),
            secondary_action_label: secondary_action_label.to_string(),
        }
    }

    /// `MM:SS` of the clock face.
    pub fn clock(&self) -> String {
        format!("{:02}:{:02}", self.minutes, self.seconds)
    }
}
