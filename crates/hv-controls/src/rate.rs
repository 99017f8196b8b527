//! Temperature slope and time-to-target estimation.
//!
//! This is a linear extrapolation between consecutive control-cycle
//! averages, not a thermal model. Two edge cases are replaced by fixed
//! nominal values so the estimate is always finite:
//! - zero (or invalid) elapsed time uses the control loop's own period
//! - a flat slope uses a small nominal rate

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Nominal substitutions for the rate edge cases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatePolicy {
    /// Elapsed time (s) substituted when none has passed. Normally the control period.
    pub nominal_period_s: f64,
    /// Rate (°/s) substituted when the slope is exactly flat.
    pub nominal_rate_per_s: f64,
}

impl Default for RatePolicy {
    fn default() -> Self {
        Self {
            nominal_period_s: 2.25,
            nominal_rate_per_s: 0.1,
        }
    }
}

impl RatePolicy {
    pub fn new(nominal_period_s: f64, nominal_rate_per_s: f64) -> ControlResult<Self> {
        if !nominal_period_s.is_finite() || nominal_period_s <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "nominal_period_s must be positive",
            });
        }
        if !nominal_rate_per_s.is_finite() || nominal_rate_per_s <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "nominal_rate_per_s must be positive",
            });
        }
        Ok(Self {
            nominal_period_s,
            nominal_rate_per_s,
        })
    }

    /// Slope in °/s between two averages.
    pub fn rate(&self, prev_avg: f64, curr_avg: f64, elapsed_s: f64) -> f64 {
        let elapsed = if elapsed_s.is_finite() && elapsed_s > 0.0 {
            elapsed_s
        } else {
            self.nominal_period_s
        };
        let rate = (curr_avg - prev_avg) / elapsed;
        if rate == 0.0 || !rate.is_finite() {
            self.nominal_rate_per_s
        } else {
            rate
        }
    }

    /// Minutes until `curr_avg` reaches `desired` at `rate` °/s.
    pub fn time_to_target_min(&self, curr_avg: f64, desired: f64, rate: f64) -> f64 {
        (curr_avg - desired).abs() / rate.abs() / 60.0
    }
}

/// Result of one estimator update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateEstimate {
    /// Slope in °/s.
    pub rate_per_s: f64,
    /// Estimated minutes to reach the setpoint.
    pub time_to_target_min: f64,
}

/// Remembers the previous cycle's average and time.
#[derive(Debug, Clone, PartialEq)]
pub struct RateEstimator {
    policy: RatePolicy,
    previous: Option<(f64, f64)>,
}

impl RateEstimator {
    pub fn new(policy: RatePolicy) -> Self {
        Self {
            policy,
            previous: None,
        }
    }

    /// Feed the current average taken at `now_s` (any monotonic seconds).
    ///
    /// The first update has no history and compares the average with itself.
    pub fn update(&mut self, curr_avg: f64, now_s: f64, desired: f64) -> RateEstimate {
        let (prev_avg, prev_s) = self.previous.unwrap_or((curr_avg, now_s));
        self.previous = Some((curr_avg, now_s));

        let rate_per_s = self.policy.rate(prev_avg, curr_avg, now_s - prev_s);
        RateEstimate {
            rate_per_s,
            time_to_target_min: self.policy.time_to_target_min(curr_avg, desired, rate_per_s),
        }
    }

}
