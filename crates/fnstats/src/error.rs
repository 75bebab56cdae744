//! Error types for the function stats collector.
//!
//! Only construction and configuration can fail. The recording operations
//! on [`FunctionStats`](crate::FunctionStats) are infallible.

use thiserror::Error;

/// Result type alias for fallible stats operations.
pub type StatsResult<T> = Result<T, StatsError>;

/// Errors that can occur while configuring or starting a stats collector.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("no tokio runtime available to run the window reset task")]
    NoRuntime,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
