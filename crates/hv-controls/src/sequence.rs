//! Relay sequencing protocol for equipment transitions.
//!
//! Every start or stop of the compressor or heater follows a fixed relay
//! order with dwell periods in between:
//! - **Lead-in**: the fan runs before refrigerant or heat flows
//! - **Cool-down / tail-out**: the fan keeps running after the compressor
//!   or heater stops
//!
//! A [`SequencePlan`] is just the ordered list of steps; executing it
//! (relay I/O and sleeping) is the runtime's job.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};
use crate::state::RunState;

/// Shortest allowed fan lead-in before a compressor or heater starts.
pub const MIN_FAN_LEAD_IN_S: f64 = 10.0;
/// Shortest allowed fan tail-out after a compressor or heater stops.
pub const MIN_COMPRESSOR_COOLDOWN_S: f64 = 45.0;

/// Relay outputs wired to the air handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relay {
    /// G1
    FanLow,
    /// G2
    FanHigh,
    /// Y1
    Cooling,
    /// W1
    Heating,
    /// O
    ReversingValve,
}

impl Relay {
    pub const ALL: [Relay; 5] = [
        Relay::FanLow,
        Relay::FanHigh,
        Relay::Cooling,
        Relay::Heating,
        Relay::ReversingValve,
    ];

    pub fn is_fan(self) -> bool {
        matches!(self, Relay::FanLow | Relay::FanHigh)
    }

    /// Compressor or heating element: must never run without a fan.
    pub fn is_load(self) -> bool {
        matches!(self, Relay::Cooling | Relay::Heating)
    }
}

impl fmt::Display for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Relay::FanLow => "fan_low",
            Relay::FanHigh => "fan_high",
            Relay::Cooling => "cooling",
            Relay::Heating => "heating",
            Relay::ReversingValve => "reversing_valve",
        };
        f.write_str(name)
    }
}

/// One of the two fan relays. Exactly one is energized at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanRelay {
    Low,
    High,
}

impl FanRelay {
    pub fn relay(self) -> Relay {
        match self {
            FanRelay::Low => Relay::FanLow,
            FanRelay::High => Relay::FanHigh,
        }
    }
}

/// Dwell durations, floored at the equipment-protection minimums.
///
/// Only [`SequenceTiming::new`] builds one; deserializing goes through it too.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTiming")]
pub struct SequenceTiming {
    fan_lead_in_s: f64,
    compressor_cooldown_s: f64,
}

#[derive(Deserialize)]
struct RawTiming {
    fan_lead_in_s: f64,
    compressor_cooldown_s: f64,
}

impl TryFrom<RawTiming> for SequenceTiming {
    type Error = ControlError;

    fn try_from(raw: RawTiming) -> ControlResult<Self> {
        Self::new(raw.fan_lead_in_s, raw.compressor_cooldown_s)
    }
}

impl SequenceTiming {
    /// # Errors
    ///
    /// Returns error if either dwell is below its minimum or not finite.
    pub fn new(fan_lead_in_s: f64, compressor_cooldown_s: f64) -> ControlResult<Self> {
        if !fan_lead_in_s.is_finite() || fan_lead_in_s < MIN_FAN_LEAD_IN_S {
            return Err(ControlError::DwellTooShort {
                what: "fan lead-in",
                requested_s: fan_lead_in_s,
                minimum_s: MIN_FAN_LEAD_IN_S,
            });
        }
        if !compressor_cooldown_s.is_finite() || compressor_cooldown_s < MIN_COMPRESSOR_COOLDOWN_S
        {
            return Err(ControlError::DwellTooShort {
                what: "compressor cool-down",
                requested_s: compressor_cooldown_s,
                minimum_s: MIN_COMPRESSOR_COOLDOWN_S,
            });
        }
        Ok(Self {
            fan_lead_in_s,
            compressor_cooldown_s,
        })
    }

    pub fn fan_lead_in(&self) -> Duration {
        Duration::from_secs_f64(self.fan_lead_in_s)
    }

    pub fn compressor_cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.compressor_cooldown_s)
    }
}

impl Default for SequenceTiming {
    /// Longest dwells observed on the rig.
    fn default() -> Self {
        Self {
            fan_lead_in_s: 30.0,
            compressor_cooldown_s: 90.0,
        }
    }
}

/// Which transition a sequence performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceKind {
    StartCooling,
    StopCooling,
    StartHeating,
    StopHeating,
    StartFan,
    StopFan,
}

impl SequenceKind {
    /// Resting state written when the sequence completes.
    pub fn final_state(self) -> RunState {
        match self {
            SequenceKind::StartCooling => RunState::Cooling,
            SequenceKind::StartHeating => RunState::Heating,
            SequenceKind::StartFan => RunState::FanOnly,
            SequenceKind::StopCooling | SequenceKind::StopHeating | SequenceKind::StopFan => {
                RunState::Shutdown
            }
        }
    }

    pub fn is_start(self) -> bool {
        matches!(
            self,
            SequenceKind::StartCooling | SequenceKind::StartHeating | SequenceKind::StartFan
        )
    }
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SequenceKind::StartCooling => "start cooling",
            SequenceKind::StopCooling => "stop cooling",
            SequenceKind::StartHeating => "start heating",
            SequenceKind::StopHeating => "stop heating",
            SequenceKind::StartFan => "start fan",
            SequenceKind::StopFan => "stop fan",
        };
        f.write_str(name)
    }
}

/// A single step of a relay sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SequenceStep {
    Energize(Relay),
    DeEnergize(Relay),
    Dwell(Duration),
}

/// Ordered relay steps for one transition.
#[derive(Debug, Clone, PartialEq)]
pub struct SequencePlan {
    pub kind: SequenceKind,
    pub fan: FanRelay,
    pub steps: Vec<SequenceStep>,
}

impl SequencePlan {
    /// Build the plan for `kind` using `fan` as the air-moving relay.
    pub fn new(kind: SequenceKind, fan: FanRelay, timing: &SequenceTiming) -> Self {
        use SequenceStep::*;

        let fan_relay = fan.relay();
        let steps = match kind {
            SequenceKind::StartCooling => vec![
                Energize(fan_relay),
                Dwell(timing.fan_lead_in()),
                Energize(Relay::ReversingValve),
                Energize(Relay::Cooling),
            ],
            SequenceKind::StopCooling => vec![
                DeEnergize(Relay::Cooling),
                DeEnergize(Relay::ReversingValve),
                Dwell(timing.compressor_cooldown()),
                DeEnergize(fan_relay),
            ],
            SequenceKind::StartHeating => vec![
                Energize(fan_relay),
                Dwell(timing.fan_lead_in()),
                Energize(Relay::Heating),
            ],
            SequenceKind::StopHeating => vec![
                DeEnergize(Relay::Heating),
                Dwell(timing.compressor_cooldown()),
                DeEnergize(fan_relay),
            ],
            SequenceKind::StartFan => vec![Energize(fan_relay)],
            SequenceKind::StopFan => vec![DeEnergize(fan_relay)],
        };
        Self { kind, fan, steps }
    }

    pub fn final_state(&self) -> RunState {
        self.kind.final_state()
    }

    /// Sum of all dwell steps.
    pub fn total_dwell(&self) -> Duration {
        self.steps
            .iter()
            .filter_map(|step| match step {
                SequenceStep::Dwell(d) => Some(*d),
                _ => None,
            })
            .sum()
    }
}
