//! Rig configuration schema.
//!
//! Every section has defaults, so an empty document (apart from `version`
//! and `name`) describes a working rig with the most conservative timing.

use hv_controls::{Cadence, ControlResult, RatePolicy, SequenceTiming, Thresholds};
use serde::{Deserialize, Serialize};

pub const LATEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RigConfig {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub control: ControlDef,
    #[serde(default)]
    pub sequencing: SequencingDef,
    #[serde(default)]
    pub sampling: SamplingDef,
    #[serde(default)]
    pub setpoint: SetpointDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence: Option<PersistenceDef>,
}

impl RigConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: LATEST_VERSION,
            name: name.into(),
            control: ControlDef::default(),
            sequencing: SequencingDef::default(),
            sampling: SamplingDef::default(),
            setpoint: SetpointDef::default(),
            persistence: None,
        }
    }
}

impl Default for RigConfig {
    fn default() -> Self {
        Self::new("rig")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlDef {
    pub period_s: f64,
    pub hysteresis: f64,
    pub deadband: f64,
    pub nominal_rate_per_s: f64,
    pub auto_high_fan_delta: f64,
}

impl Default for ControlDef {
    fn default() -> Self {
        let thresholds = Thresholds::default();
        let rate = RatePolicy::default();
        Self {
            period_s: rate.nominal_period_s,
            hysteresis: thresholds.hysteresis,
            deadband: thresholds.deadband,
            nominal_rate_per_s: rate.nominal_rate_per_s,
            auto_high_fan_delta: thresholds.auto_high_fan_delta,
        }
    }
}

impl ControlDef {
    pub fn cadence(&self) -> ControlResult<Cadence> {
        Cadence::new(self.period_s)
    }

    pub fn thresholds(&self) -> ControlResult<Thresholds> {
        Thresholds::new(self.hysteresis, self.deadband, self.auto_high_fan_delta)
    }

    /// The control period doubles as the nominal elapsed time.
    pub fn rate_policy(&self) -> ControlResult<RatePolicy> {
        RatePolicy::new(self.period_s, self.nominal_rate_per_s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SequencingDef {
    pub fan_lead_in_s: f64,
    pub compressor_cooldown_s: f64,
}

impl Default for SequencingDef {
    fn default() -> Self {
        let timing = SequenceTiming::default();
        Self {
            fan_lead_in_s: timing.fan_lead_in().as_secs_f64(),
            compressor_cooldown_s: timing.compressor_cooldown().as_secs_f64(),
        }
    }
}

impl SequencingDef {
    pub fn timing(&self) -> ControlResult<SequenceTiming> {
        SequenceTiming::new(self.fan_lead_in_s, self.compressor_cooldown_s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SamplingDef {
    pub period_s: f64,
    pub buffer_capacity: usize,
    pub chart_prune_threshold: usize,
    /// Control on apparent (heat-index) temperature instead of dry bulb.
    pub apply_heat_index: bool,
}

impl Default for SamplingDef {
    fn default() -> Self {
        Self {
            period_s: 3.0,
            buffer_capacity: 60,
            chart_prune_threshold: 500,
            apply_heat_index: true,
        }
    }
}

impl SamplingDef {
    pub fn cadence(&self) -> ControlResult<Cadence> {
        Cadence::new(self.period_s)
    }
}

/// Setpoint default and the range commands are clamped to (°F).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SetpointDef {
    pub default: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for SetpointDef {
    fn default() -> Self {
        Self {
            default: 75.0,
            min: 55.0,
            max: 90.0,
        }
    }
}

impl SetpointDef {
    /// Never panics: an inverted range (only possible on an unvalidated
    /// config) yields `max`.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistenceDef {
    /// JSON-lines file receiving one record per control cycle.
    pub path: String,
}
