//! Fixed periods for the sampler and the control loop.
//!
//! Both loops run on a fixed cadence. The control period doubles as the
//! nominal elapsed time the rate estimator falls back to.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Period of a periodic task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cadence {
    /// Period in seconds.
    pub period_s: f64,
}

impl Cadence {
    /// Create a new cadence.
    ///
    /// # Errors
    ///
    /// Returns error if `period_s` is not positive and finite.
    pub fn new(period_s: f64) -> ControlResult<Self> {
        if !period_s.is_finite() || period_s <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "period must be positive",
            });
        }
        Ok(Self { period_s })
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.period_s)
    }
}
