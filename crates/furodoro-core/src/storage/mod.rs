mod config;

pub use config::{Config, ServerConfig, TimerConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the directory holding `config.toml`.
///
/// `FURODORO_HOME` wins when set. Otherwise `~/.config/furodoro[-dev]/`,
/// where `FURODORO_ENV=dev` selects the development directory.
///
/// # Errors
/// Returns an error if no home directory can be determined or if
/// creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FURODORO_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir().ok_or(ConfigError::NoDataDir)?.join(".config");
            let env = std::env::var("FURODORO_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("furodoro-dev")
            } else {
                base_dir.join("furodoro")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::SaveFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
