//! Error types for control operations.

use thiserror::Error;

/// Result type for control operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur in control operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// A dwell shorter than the equipment-protection floor was requested.
    #[error("Dwell too short for {what}: {requested_s}s < {minimum_s}s")]
    DwellTooShort {
        what: &'static str,
        requested_s: f64,
        minimum_s: f64,
    },

    /// Hysteresis/dead-band pair that would make the controller chatter.
    #[error("Invalid thresholds: {what}")]
    InvalidThresholds { what: String },
}
