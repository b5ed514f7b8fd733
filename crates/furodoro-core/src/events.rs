use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::queue::SequenceKey;
use crate::timer::{SessionPhase, TimerSnapshot};

/// Severity of a transient user-visible notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeLevel::Success => "success",
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        }
    }
}

/// Every state change in the system produces an Event.
/// The presentation layer renders them; nothing reads them back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    PhaseEntered {
        phase: SessionPhase,
        duration_secs: i64,
        reset_gross_work: bool,
        at: DateTime<Utc>,
    },
    TimerStarted {
        phase: SessionPhase,
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: SessionPhase,
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    /// A break had no earned time left, so the countdown stayed paused.
    StartSkipped {
        phase: SessionPhase,
        at: DateTime<Utc>,
    },
    /// A break phase ran out and paused itself.
    PhaseExpired {
        phase: SessionPhase,
        net_work_secs: i64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        snapshot: TimerSnapshot,
        at: DateTime<Utc>,
    },
    TaskBound {
        key: SequenceKey,
        task_id: String,
        name: String,
        planned_minutes: u32,
        at: DateTime<Utc>,
    },
    QueueChanged {
        len: usize,
        at: DateTime<Utc>,
    },
    Notification {
        level: NoticeLevel,
        message: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn notice(level: NoticeLevel, message: impl Into<String>) -> Self {
        Event::Notification {
            level,
            message: message.into(),
            at: Utc::now(),
        }
    }
}
