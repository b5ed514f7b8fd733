//! Validated timer settings, derived from [`Config`] on every read.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ConfigError, ValidationError};
use crate::storage::Config;
use crate::timer::ledger::BREAK_RATIO;

pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;
pub const DEFAULT_LONG_BREAK_MINUTES: u32 = 15;
pub const DEFAULT_WORK_RATIO: i64 = 3;
pub const DEFAULT_SERVER_URL: &str = "http://localhost:13276";
pub const DEFAULT_REPORT_SCHEME: &str = "lifeup";

/// The numbers the timer actually runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub long_break_minutes: u32,
    pub work_ratio: i64,
    /// Base URL without a trailing slash.
    pub server_url: String,
    pub report_scheme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_minutes: DEFAULT_WORK_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
            long_break_minutes: DEFAULT_LONG_BREAK_MINUTES,
            work_ratio: DEFAULT_WORK_RATIO,
            server_url: DEFAULT_SERVER_URL.to_string(),
            report_scheme: DEFAULT_REPORT_SCHEME.to_string(),
        }
    }
}

impl Settings {
    /// Derive settings from the stored config.
    ///
    /// Zero or negative lengths fall back to their defaults. A zero ratio
    /// falls back to the default; a negative ratio is reported and the
    /// previous ratio (or the default) is kept.
    pub fn derive(config: &Config, previous: Option<&Settings>) -> (Self, Vec<ValidationError>) {
        let mut problems = Vec::new();

        let work_ratio = match config.timer.work_ratio {
            0 => DEFAULT_WORK_RATIO,
            r if r > 0 => r,
            r => {
                tracing::warn!(ratio = r, "Invalid work ratio input. Using default or previous value.");
                problems.push(ValidationError::WorkRatio(r));
                previous.map(|p| p.work_ratio).unwrap_or(DEFAULT_WORK_RATIO)
            }
        };

        let scheme = config.server.scheme.trim();
        let settings = Self {
            work_minutes: minutes_or(config.timer.work_minutes, DEFAULT_WORK_MINUTES),
            break_minutes: minutes_or(config.timer.break_minutes, DEFAULT_BREAK_MINUTES),
            long_break_minutes: minutes_or(
                config.timer.long_break_minutes,
                DEFAULT_LONG_BREAK_MINUTES,
            ),
            work_ratio,
            server_url: resolve_base_url(&config.server.url),
            report_scheme: if scheme.is_empty() {
                DEFAULT_REPORT_SCHEME.to_string()
            } else {
                scheme.to_string()
            },
        };
        (settings, problems)
    }

    pub fn break_ratio(&self) -> i64 {
        BREAK_RATIO
    }

    pub fn work_seconds(&self) -> i64 {
        i64::from(self.work_minutes) * 60
    }

    pub fn break_seconds(&self) -> i64 {
        i64::from(self.break_minutes) * 60
    }

    pub fn long_break_seconds(&self) -> i64 {
        i64::from(self.long_break_minutes) * 60
    }
}

fn minutes_or(value: i64, default: u32) -> u32 {
    if value > 0 {
        u32::try_from(value).unwrap_or(default)
    } else {
        default
    }
}

/// Resolve the stored server URL to a usable base.
///
/// Only absolute http/https URLs are accepted; one trailing slash is
/// stripped. Anything else falls back to [`DEFAULT_SERVER_URL`].
pub fn resolve_base_url(stored: &str) -> String {
    let stored = stored.trim();
    if stored.is_empty() {
        return DEFAULT_SERVER_URL.to_string();
    }
    match Url::parse(stored) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            let href = url.as_str();
            href.strip_suffix('/').unwrap_or(href).to_string()
        }
        Ok(url) => {
            tracing::warn!(scheme = url.scheme(), "Stored API URL is not http(s), falling back to default.");
            DEFAULT_SERVER_URL.to_string()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Stored API URL is invalid, falling back to default.");
            DEFAULT_SERVER_URL.to_string()
        }
    }
}

/// Normalize server URL input from the settings form.
///
/// Returns `Ok(None)` for blank input (keep the stored value). A missing
/// scheme gets `http://`; `javascript:`/`data:` and non-http protocols are
/// refused.
///
/// # Errors
/// [`ConfigError::UnsafeScheme`], [`ConfigError::UnsupportedProtocol`] or
/// [`ConfigError::InvalidUrl`]; nothing should be persisted in those cases.
pub fn normalize_server_input(raw: &str) -> Result<Option<String>, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("data:") {
        return Err(ConfigError::UnsafeScheme);
    }

    let candidate = match explicit_protocol(raw) {
        Some(protocol) => {
            let protocol = protocol.to_ascii_lowercase();
            if protocol != "http" && protocol != "https" {
                return Err(ConfigError::UnsupportedProtocol(protocol));
            }
            raw.to_string()
        }
        None => format!("http://{raw}"),
    };

    let url = Url::parse(&candidate).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "Protocol must be http or https, got {}",
            url.scheme()
        )));
    }
    Ok(Some(url.to_string()))
}

/// The `proto` in a leading `proto://`, if the input has one.
fn explicit_protocol(raw: &str) -> Option<&str> {
    let idx = raw.find("://")?;
    let protocol = &raw[..idx];
    let valid = !protocol.is_empty()
        && protocol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(protocol)
}
