//! Control domain for the HVAC rig.
//!
//! This crate holds the pure, clock-free parts of the thermostat: sample
//! smoothing, rate estimation, the run-state decision table and the relay
//! sequencing protocol. Nothing here touches hardware or spawns tasks; the
//! runtime in `hv-app` drives these types from its sampler, control loop and
//! sequencer tasks.
//!
//! # Architecture
//!
//! - [`RollingBuffer`] smooths sensor noise over the last N samples
//! - [`ChartSeries`] keeps a bounded history for front ends
//! - [`RateEstimator`] turns consecutive averages into a slope and an ETA
//! - [`decide`] is the bang-bang transition table with hysteresis/dead-band
//! - [`SequencePlan`] lists the relay steps and dwells for each transition
//!
//! # Design Principles
//!
//! - **Closed enums**: run states, modes and relays are exhaustive enums
//! - **Dwell floors**: [`SequenceTiming`] cannot be built below the
//!   equipment-protection minimums
//! - **Explicit fallbacks**: rate edge cases substitute documented nominal values

pub mod buffer;
pub mod cadence;
pub mod chart;
pub mod error;
pub mod machine;
pub mod rate;
pub mod sequence;
pub mod state;

pub use buffer::RollingBuffer;
pub use cadence::Cadence;
pub use chart::{ChartPoint, ChartSeries};
pub use error::{ControlError, ControlResult};
pub use machine::{ControlInputs, Decision, Thresholds, decide, select_fan};
pub use rate::{RateEstimate, RateEstimator, RatePolicy};
pub use sequence::{
    FanRelay, MIN_COMPRESSOR_COOLDOWN_S, MIN_FAN_LEAD_IN_S, Relay, SequenceKind, SequencePlan,
    SequenceStep, SequenceTiming,
};
pub use state::{FanSpeed, Mode, RunState};
