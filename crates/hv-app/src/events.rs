//! Events and snapshots published to front ends.

use hv_controls::{FanSpeed, Mode, RunState, SequenceKind};
use serde::{Deserialize, Serialize};

/// Per-cycle status published to front ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Rolling average, rounded to 0.1°.
    pub current_temp: Option<f64>,
    pub desired_temp: f64,
    pub mode: Mode,
    pub fan_speed: FanSpeed,
    pub run_state: RunState,
    /// User intent, not equipment state.
    pub enabled: bool,
    /// Linear estimate, not a guarantee.
    pub time_to_target_min: Option<f64>,
    pub instant_temp: Option<f64>,
    pub instant_humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<FaultEvent>,
}

/// One calibrated sensor sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleEvent {
    /// Unix seconds.
    pub time: f64,
    /// Calibrated temperature (°F, apparent when the heat index is applied).
    pub temperature: f64,
    pub humidity: f64,
}

/// A relay sequence that ended in a hardware error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultEvent {
    pub sequence: SequenceKind,
    pub message: String,
    /// Unix seconds.
    pub time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RigEvent {
    Status(StatusSnapshot),
    /// Smoothed temperature, rounded to 0.1°, once per control cycle.
    Heartbeat { temp: f64 },
    Sample(SampleEvent),
    Fault(FaultEvent),
}

impl RigEvent {
    /// Wire form sent to socket front ends.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

pub(crate) fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
