//! Error types for incidentmap

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for incidentmap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application.
///
/// Every variant is terminal for the current run. Errors that only affect a
/// single incident record never reach this type; they are tallied by the
/// aggregator instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("cache failed: {0}")]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("parse failed: {0}")]
    Parse(String),

    #[error("aggregate failed: all {skipped} incident records were rejected ({summary})")]
    AllRecordsRejected { skipped: usize, summary: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Remote fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl FetchError {
    /// Classify a reqwest failure; `timeout` is the deadline the client was built with
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(timeout)
        } else if err.is_connect() {
            FetchError::Network("failed to connect to status page".to_string())
        } else if err.is_builder() {
            FetchError::InvalidRequest(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Cache storage errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache root does not exist: {}", .0.display())]
    MissingRoot(PathBuf),

    #[error("could not determine cache directory")]
    NoHome,

    #[error("cache I/O error: {0}")]
    Io(String),

    #[error("cache database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
