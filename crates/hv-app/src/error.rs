//! Error types for the hv-app service layer.

use crate::io::{RelayError, SensorError};

/// Application error type that wraps errors from the backend crates.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Control error: {0}")]
    Control(#[from] hv_controls::ControlError),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    #[error("Task failed: {0}")]
    Task(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for hv-app operations.
pub type AppResult<T> = Result<T, AppError>;

// Conversions from backend error types
impl From<hv_config::ConfigError> for AppError {
    fn from(err: hv_config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<hv_config::ValidationError> for AppError {
    fn from(err: hv_config::ValidationError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<hv_results::ResultsError> for AppError {
    fn from(err: hv_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Task(err.to_string())
    }
}
