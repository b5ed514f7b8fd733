use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The three mutually exclusive timer phases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Work,
    Break,
    LongBreak,
}

impl SessionPhase {
    /// Text shown in the mode indicator and window title.
    pub fn label(&self) -> &'static str {
        match self {
            SessionPhase::Work => "Work",
            SessionPhase::Break => "Break",
            SessionPhase::LongBreak => "Long Break",
        }
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, SessionPhase::Work)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SessionPhase {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "work" | "Work" => Ok(SessionPhase::Work),
            "break" | "Break" => Ok(SessionPhase::Break),
            "long_break" | "longBreak" | "long-break" | "LongBreak" => Ok(SessionPhase::LongBreak),
            other => Err(ValidationError::PhaseName(other.to_string())),
        }
    }
}
