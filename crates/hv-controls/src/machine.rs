//! Bang-bang decision table with hysteresis and dead-band.
//!
//! [`decide`] is evaluated once per control cycle under the shared lock. It
//! never performs I/O: when equipment has to change it returns the sequence
//! to launch and parks the state in [`RunState::Transition`].

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};
use crate::sequence::{FanRelay, SequenceKind};
use crate::state::{FanSpeed, Mode, RunState};

/// Temperature thresholds (°F) for starting and stopping equipment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Deviation from setpoint that starts heating or cooling.
    pub hysteresis: f64,
    /// Deviation below which the setpoint counts as reached.
    pub deadband: f64,
    /// Deviation at which an `Auto` fan runs on high speed.
    pub auto_high_fan_delta: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            hysteresis: 3.0,
            deadband: 0.25,
            auto_high_fan_delta: 6.0,
        }
    }
}

impl Thresholds {
    pub fn new(hysteresis: f64, deadband: f64, auto_high_fan_delta: f64) -> ControlResult<Self> {
        if !hysteresis.is_finite() || hysteresis <= 0.0 {
            return Err(ControlError::InvalidThresholds {
                what: format!("hysteresis must be positive, got {hysteresis}"),
            });
        }
        if !deadband.is_finite() || deadband <= 0.0 || deadband >= hysteresis {
            return Err(ControlError::InvalidThresholds {
                what: format!("deadband must be in (0, {hysteresis}), got {deadband}"),
            });
        }
        if !auto_high_fan_delta.is_finite() || auto_high_fan_delta <= 0.0 {
            return Err(ControlError::InvalidThresholds {
                what: format!("auto_high_fan_delta must be positive, got {auto_high_fan_delta}"),
            });
        }
        Ok(Self {
            hysteresis,
            deadband,
            auto_high_fan_delta,
        })
    }
}

/// Everything the table reads, copied out of the shared state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlInputs {
    pub run_state: RunState,
    pub enabled: bool,
    pub mode: Mode,
    /// Rolling average, `None` until the first sample.
    pub current: Option<f64>,
    pub desired: f64,
}

impl ControlInputs {
    /// `current - desired`, positive when the room is too warm.
    pub fn diff(&self) -> Option<f64> {
        self.current.map(|c| c - self.desired)
    }
}

/// Outcome of one evaluation of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub next: RunState,
    /// Sequence to launch; always paired with `next == Transition`.
    pub sequence: Option<SequenceKind>,
}

impl Decision {
    /// Rest in `state` with no relay work.
    fn to(state: RunState) -> Self {
        Self {
            next: state,
            sequence: None,
        }
    }

    fn launch(kind: SequenceKind) -> Self {
        Self {
            next: RunState::Transition,
            sequence: Some(kind),
        }
    }

    pub fn changed(&self, from: RunState) -> bool {
        self.next != from
    }
}

/// Evaluate the transition table for one control cycle.
pub fn decide(inputs: &ControlInputs, thresholds: &Thresholds) -> Decision {
    let diff = inputs.diff();

    match inputs.run_state {
        RunState::Disabled => {
            if inputs.enabled {
                Decision::to(RunState::Idle)
            } else {
                Decision::to(RunState::Disabled)
            }
        }
        RunState::Idle => {
            if !inputs.enabled {
                return Decision::to(RunState::Disabled);
            }
            if inputs.mode == Mode::FanOnly {
                return Decision::launch(SequenceKind::StartFan);
            }
            match diff {
                Some(d) if d >= thresholds.hysteresis && inputs.mode.allows_cooling() => {
                    Decision::launch(SequenceKind::StartCooling)
                }
                Some(d) if d <= -thresholds.hysteresis && inputs.mode.allows_heating() => {
                    Decision::launch(SequenceKind::StartHeating)
                }
                _ => Decision::to(RunState::Idle),
            }
        }
        RunState::Heating => {
            let reached = diff.is_some_and(|d| d.abs() < thresholds.deadband || d > 0.0);
            if reached || !inputs.enabled || !inputs.mode.allows_heating() {
                Decision::launch(SequenceKind::StopHeating)
            } else {
                Decision::to(RunState::Heating)
            }
        }
        RunState::Cooling => {
            let reached = diff.is_some_and(|d| d.abs() < thresholds.deadband || d < 0.0);
            if reached || !inputs.enabled || !inputs.mode.allows_cooling() {
                Decision::launch(SequenceKind::StopCooling)
            } else {
                Decision::to(RunState::Cooling)
            }
        }
        RunState::FanOnly => {
            if !inputs.enabled || inputs.mode != Mode::FanOnly {
                Decision::launch(SequenceKind::StopFan)
            } else {
                Decision::to(RunState::FanOnly)
            }
        }
        RunState::Shutdown => Decision::to(RunState::Idle),
        // Only a sequencer outcome moves the state out of a transition.
        RunState::Transition => Decision::to(RunState::Transition),
    }
}

/// Fan relay to use when starting equipment.
pub fn select_fan(speed: FanSpeed, diff: Option<f64>, thresholds: &Thresholds) -> FanRelay {
    match speed {
        FanSpeed::Low => FanRelay::Low,
        FanSpeed::High => FanRelay::High,
        FanSpeed::Auto => match diff {
            Some(d) if d.abs() >= thresholds.auto_high_fan_delta => FanRelay::High,
            _ => FanRelay::Low,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn inputs(run_state: RunState, current: f64) -> ControlInputs {
        ControlInputs {
            run_state,
            enabled: true,
            mode: Mode::Auto,
            current: Some(current),
            desired: 75.0,
        }
    }

    fn th() -> Thresholds {
        Thresholds::default()
    }

    #[test]
    fn disabled_waits_for_enable() {
        let mut i = inputs(RunState::Disabled, 80.0);
        i.enabled = false;
        assert_eq!(decide(&i, &th()).next, RunState::Disabled);
        i.enabled = true;
        assert_eq!(decide(&i, &th()), Decision::to(RunState::Idle));
    }

    #[test]
    fn idle_disable_checked_first() {
        let mut i = inputs(RunState::Idle, 90.0);
        i.enabled = false;
        assert_eq!(decide(&i, &th()).next, RunState::Disabled);
    }

    #[test]
    fn idle_starts_cooling_at_hysteresis() {
        assert_eq!(
            decide(&inputs(RunState::Idle, 77.9), &th()).sequence,
            None
        );
        let d = decide(&inputs(RunState::Idle, 78.0), &th());
        assert_eq!(d, Decision::launch(SequenceKind::StartCooling));
    }

    #[test]
    fn idle_starts_heating_below_band() {
        let d = decide(&inputs(RunState::Idle, 72.0), &th());
        assert_eq!(d.sequence, Some(SequenceKind::StartHeating));
    }

    #[test]
    fn mode_gates_equipment() {
        let mut i = inputs(RunState::Idle, 80.0);
        i.mode = Mode::Heat;
        assert_eq!(decide(&i, &th()).next, RunState::Idle);
        i.current = Some(70.0);
        i.mode = Mode::Cool;
        assert_eq!(decide(&i, &th()).next, RunState::Idle);
    }

    #[test]
    fn fan_only_mode_starts_and_stops_fan() {
        let mut i = inputs(RunState::Idle, 75.0);
        i.mode = Mode::FanOnly;
        assert_eq!(decide(&i, &th()).sequence, Some(SequenceKind::StartFan));

        i.run_state = RunState::FanOnly;
        assert_eq!(decide(&i, &th()).next, RunState::FanOnly);
        i.mode = Mode::Auto;
        assert_eq!(decide(&i, &th()).sequence, Some(SequenceKind::StopFan));
    }

    #[test]
    fn cooling_stops_in_deadband_or_on_overshoot() {
        assert_eq!(decide(&inputs(RunState::Cooling, 76.0), &th()).next, RunState::Cooling);
        assert_eq!(
            decide(&inputs(RunState::Cooling, 75.2), &th()).sequence,
            Some(SequenceKind::StopCooling)
        );
        assert_eq!(
            decide(&inputs(RunState::Cooling, 74.0), &th()).sequence,
            Some(SequenceKind::StopCooling)
        );
    }

    #[test]
    fn heating_stops_on_overshoot_or_disable() {
        assert_eq!(decide(&inputs(RunState::Heating, 73.0), &th()).next, RunState::Heating);
        assert_eq!(
            decide(&inputs(RunState::Heating, 75.6), &th()).sequence,
            Some(SequenceKind::StopHeating)
        );
        let mut i = inputs(RunState::Heating, 70.0);
        i.enabled = false;
        assert_eq!(decide(&i, &th()).sequence, Some(SequenceKind::StopHeating));
    }

    #[test]
    fn shutdown_returns_to_idle() {
        let mut i = inputs(RunState::Shutdown, 90.0);
        i.enabled = false;
        assert_eq!(decide(&i, &th()), Decision::to(RunState::Idle));
    }

    #[test]
    fn no_reading_keeps_idle() {
        let mut i = inputs(RunState::Idle, 0.0);
        i.current = None;
        assert_eq!(decide(&i, &th()).next, RunState::Idle);
    }

    #[test]
    fn auto_fan_selection() {
        assert_eq!(select_fan(FanSpeed::Auto, Some(3.0), &th()), FanRelay::Low);
        assert_eq!(select_fan(FanSpeed::Auto, Some(-6.5), &th()), FanRelay::High);
        assert_eq!(select_fan(FanSpeed::High, Some(0.0), &th()), FanRelay::High);
        assert_eq!(select_fan(FanSpeed::Low, None, &th()), FanRelay::Low);
    }

    #[test]
    fn invalid_thresholds() {
        assert!(Thresholds::new(3.0, 3.0, 6.0).is_err());
        assert!(Thresholds::new(0.0, 0.1, 6.0).is_err());
        assert!(Thresholds::new(3.0, 0.25, f64::NAN).is_err());
        assert!(Thresholds::new(4.0, 0.5, 6.0).is_ok());
    }

    fn any_state() -> impl Strategy<Value = RunState> {
        prop_oneof![
            Just(RunState::Disabled),
            Just(RunState::Idle),
            Just(RunState::Heating),
            Just(RunState::Cooling),
            Just(RunState::FanOnly),
            Just(RunState::Transition),
            Just(RunState::Shutdown),
        ]
    }

    fn any_mode() -> impl Strategy<Value = Mode> {
        (0i64..4).prop_map(Mode::from_code)
    }

    proptest! {
        #[test]
        fn resting_states_never_jump_directly(
            state in any_state(),
            mode in any_mode(),
            enabled in any::<bool>(),
            current in proptest::option::of(40.0f64..110.0),
            desired in 55.0f64..90.0,
        ) {
            let i = ControlInputs { run_state: state, enabled, mode, current, desired };
            let d = decide(&i, &Thresholds::default());

            // A sequence is launched exactly when parking in Transition.
            prop_assert_eq!(d.sequence.is_some(), d.next == RunState::Transition && state != RunState::Transition);

            let equipment = |s: RunState| matches!(s, RunState::Idle | RunState::Heating | RunState::Cooling | RunState::FanOnly);
            if equipment(state) && equipment(d.next) {
                prop_assert_eq!(state, d.next);
            }
            prop_assert!(d.next != RunState::Heating || state == RunState::Heating);
            prop_assert!(d.next != RunState::Cooling || state == RunState::Cooling);
        }
    }
}
