//! Core error types for furodoro-core.
//!
//! Every failure the timer can run into is recoverable: validation problems
//! revert to a known-good value, network problems become notifications. These
//! enums carry enough detail for the caller to pick the right message.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// `javascript:` or `data:` server URL
    #[error("Invalid URL: Unsafe scheme detected.")]
    UnsafeScheme,

    /// Server URL with a protocol other than http/https
    #[error("Invalid Protocol: Only HTTP and HTTPS are allowed.")]
    UnsupportedProtocol(String),

    /// Server URL that does not parse
    #[error("Invalid URL format. Please check and try again.")]
    InvalidUrl(String),

    /// No usable home/config directory
    #[error("Cannot determine data directory")]
    NoDataDir,
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Work ratio must be a positive integer
    #[error("Invalid work ratio {0}; must be a positive integer")]
    WorkRatio(i64),

    /// Unknown session phase name
    #[error("Invalid session type: {0}")]
    PhaseName(String),
}

/// Errors from the category/task catalog endpoints.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Category id is not numeric; no request was made
    #[error("Invalid Category ID provided: {0}")]
    InvalidCategory(String),

    /// Transport failure
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP error! Status: {0}")]
    Status(u16),

    /// `{code, data}` envelope with a non-200 code or non-array data
    #[error("response format is not correct (code {code})")]
    BadEnvelope { code: i64 },
}

/// Errors from the session report relay.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Transport failure
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Relay answered with a non-success status
    #[error("relay answered with status {0}")]
    Status(u16),
}

/// Task queue errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// No entry with that sequence key
    #[error("no queued task with key {0}")]
    UnknownKey(String),

    /// Reorder input is not a permutation of the current keys
    #[error("reorder must list every queued task exactly once (got {got}, have {have})")]
    NotAPermutation { got: usize, have: usize },

    /// Index out of bounds
    #[error("Index {index} out of bounds for task queue (length: {len})")]
    OutOfBounds { index: usize, len: usize },
}

/// Screen-stay-awake capability errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WakeLockError {
    /// Host has no wake-lock support
    #[error("Screen Wake Lock API is not supported")]
    Unsupported,

    /// Host refused the request
    #[error("Screen Wake Lock request failed: {0}")]
    Refused(String),
}
