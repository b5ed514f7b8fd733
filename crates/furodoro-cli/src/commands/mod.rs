pub mod catalog;
pub mod config;
pub mod run;

use furodoro_core::{Config, ConfigError, Settings};

/// Read the config file and derive the settings the timer runs on.
///
/// Rejected values are logged and replaced; only an unreadable config
/// file is an error.
pub fn load_settings(previous: Option<&Settings>) -> Result<Settings, ConfigError> {
    let config = Config::load()?;
    let (settings, problems) = Settings::derive(&config, previous);
    for problem in problems {
        tracing::warn!(%problem, "config value ignored");
    }
    Ok(settings)
}
