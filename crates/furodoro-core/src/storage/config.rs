//! TOML-based application configuration.
//!
//! This is the persisted settings store. It holds:
//! - Work, break and long-break lengths
//! - The work:break ratio
//! - The LifeUp server base URL and the companion app's URL scheme
//!
//! Configuration is stored at `~/.config/furodoro/config.toml`. Values are
//! kept as the user wrote them; [`crate::Settings::derive`] turns them into
//! the validated numbers the timer runs on.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::settings::{
    normalize_server_input, DEFAULT_BREAK_MINUTES, DEFAULT_LONG_BREAK_MINUTES,
    DEFAULT_REPORT_SCHEME, DEFAULT_SERVER_URL, DEFAULT_WORK_MINUTES, DEFAULT_WORK_RATIO,
};

/// Timer lengths and credit ratio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: i64,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: i64,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: i64,
    /// Work seconds needed to earn one break second.
    #[serde(default = "default_work_ratio")]
    pub work_ratio: i64,
}

/// Where the LifeUp catalog and relay live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_url")]
    pub url: String,
    /// URL scheme of the companion app the relay forwards to.
    #[serde(default = "default_scheme")]
    pub scheme: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/furodoro/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_work_minutes() -> i64 {
    DEFAULT_WORK_MINUTES as i64
}
fn default_break_minutes() -> i64 {
    DEFAULT_BREAK_MINUTES as i64
}
fn default_long_break_minutes() -> i64 {
    DEFAULT_LONG_BREAK_MINUTES as i64
}
fn default_work_ratio() -> i64 {
    DEFAULT_WORK_RATIO
}
fn default_server_url() -> String {
    DEFAULT_SERVER_URL.into()
}
fn default_scheme() -> String {
    DEFAULT_REPORT_SCHEME.into()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            work_ratio: default_work_ratio(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            scheme: default_scheme(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Number(_) => value
                        .trim()
                        .parse::<i64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as integer")))?,
                    serde_json::Value::Object(_) => return Err(unknown()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path_in(dir: &Path) -> PathBuf {
        dir.join("config.toml")
    }

    /// Path of the config file in the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(Self::path_in(&data_dir()?))
    }

    /// Load from the data directory or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&data_dir()?)
    }

    /// Load `config.toml` from `dir`, creating it with defaults if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or the default cannot be written.
    pub fn load_from(dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::path_in(dir);
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(dir)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&data_dir()?)
    }

    /// Persist to `dir/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, dir: &Path) -> Result<(), ConfigError> {
        let path = Self::path_in(dir);
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key, in memory only.
    ///
    /// `server.url` goes through the server URL rules: a bare host gets
    /// `http://`, unsafe or non-http schemes are refused, and empty input
    /// leaves the stored URL alone. Timer values must be positive.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is rejected; the
    /// config is left unchanged in that case.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        if key == "server.url" {
            if let Some(url) = normalize_server_input(value)? {
                self.server.url = url;
            }
            return Ok(());
        }

        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("timer.work_minutes", self.timer.work_minutes),
            ("timer.break_minutes", self.timer.break_minutes),
            ("timer.long_break_minutes", self.timer.long_break_minutes),
            ("timer.work_ratio", self.timer.work_ratio),
        ];
        for (key, value) in positive {
            if value <= 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("{value} must be a positive integer"),
                });
            }
        }
        if self.server.scheme.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "server.scheme".to_string(),
                message: "scheme must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.timer.work_ratio, 3);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str(indoc! {r#"
            [timer]
            work_minutes = 50

            [server]
            url = "http://10.0.0.2:13276/"
        "#})
        .unwrap();
        assert_eq!(parsed.timer.work_minutes, 50);
        assert_eq!(parsed.timer.break_minutes, 5);
        assert_eq!(parsed.timer.long_break_minutes, 15);
        assert_eq!(parsed.server.scheme, "lifeup");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.work_minutes").as_deref(), Some("25"));
        assert_eq!(cfg.get("server.url").as_deref(), Some("http://localhost:13276"));
        assert!(cfg.get("timer.missing_key").is_none());
        assert!(cfg.get("timer").is_none());
    }

    #[test]
    fn set_updates_number() {
        let mut cfg = Config::default();
        cfg.set("timer.work_ratio", "4").unwrap();
        assert_eq!(cfg.timer.work_ratio, 4);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("timer.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_rejects_non_positive_ratio_and_keeps_old_value() {
        let mut cfg = Config::default();
        let result = cfg.set("timer.work_ratio", "-2");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        assert_eq!(cfg.timer.work_ratio, 3);
    }

    #[test]
    fn set_rejects_non_numeric() {
        let mut cfg = Config::default();
        assert!(cfg.set("timer.break_minutes", "five").is_err());
        assert_eq!(cfg.timer.break_minutes, 5);
    }

    #[test]
    fn set_server_url_prepends_http() {
        let mut cfg = Config::default();
        cfg.set("server.url", "192.168.1.20:13276").unwrap();
        assert_eq!(cfg.server.url, "http://192.168.1.20:13276/");
    }

    #[test]
    fn set_server_url_refuses_javascript() {
        let mut cfg = Config::default();
        let result = cfg.set("server.url", "javascript:alert(1)");
        assert!(matches!(result, Err(ConfigError::UnsafeScheme)));
        assert_eq!(cfg.server.url, "http://localhost:13276");
    }

    #[test]
    fn set_server_url_empty_keeps_existing() {
        let mut cfg = Config::default();
        cfg.set("server.url", "   ").unwrap();
        assert_eq!(cfg.server.url, "http://localhost:13276");
    }

    #[test]
    fn load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(dir.path()).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(dir.path().join("config.toml").exists());
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config::default();
        cfg.set("timer.long_break_minutes", "20").unwrap();
        cfg.save_to(dir.path()).unwrap();

        let loaded = Config::load_from(dir.path()).unwrap();
        assert_eq!(loaded.timer.long_break_minutes, 20);
    }

    #[test]
    fn load_from_reports_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "timer = 3 = 4").unwrap();
        assert!(matches!(
            Config::load_from(dir.path()),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
