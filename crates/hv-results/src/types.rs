//! Record data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One control cycle as written to the time-series store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instant_temperature: Option<f64>,
    pub desired_temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instant_humidity: Option<f64>,
    /// Numeric run-state code (-1 disabled … 5 transition).
    pub state: i64,
}

impl CycleRecord {
    pub fn now(
        instant_temperature: Option<f64>,
        desired_temperature: f64,
        instant_humidity: Option<f64>,
        state: i64,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            instant_temperature,
            desired_temperature,
            instant_humidity,
            state,
        }
    }
}
