//! Inbound commands from front ends.
//!
//! Every command is one short field write under the shared lock and
//! returns immediately. The control loop picks the change up on its next
//! cycle; commands never touch relays.

use hv_config::SetpointDef;
use hv_controls::{ChartPoint, FanSpeed, Mode};

use crate::events::StatusSnapshot;
use crate::state::SharedSystem;

#[derive(Debug, Clone)]
pub struct CommandHandle {
    shared: SharedSystem,
    setpoint: SetpointDef,
}

impl CommandHandle {
    /// `setpoint` is expected to come from a validated [`hv_config::RigConfig`];
    /// an inverted range still clamps without panicking.
    pub fn new(shared: SharedSystem, setpoint: SetpointDef) -> Self {
        Self { shared, setpoint }
    }

    pub fn enable(&self) {
        self.shared.update(|s| s.enabled = true);
        tracing::info!("system enabled");
    }

    pub fn disable(&self) {
        self.shared.update(|s| s.enabled = false);
        tracing::info!("system disabled");
    }

    /// Set the desired temperature, clamped to the configured range.
    /// Non-finite input is ignored. Returns the setpoint now in effect.
    pub fn set_setpoint(&self, value: f64) -> f64 {
        if !value.is_finite() {
            let current = self.shared.update(|s| s.desired_temperature);
            tracing::warn!(value, current, "ignoring non-finite setpoint");
            return current;
        }
        let clamped = self.setpoint.clamp(value);
        self.shared.update(|s| s.desired_temperature = clamped);
        if clamped != value {
            tracing::warn!(requested = value, applied = clamped, "setpoint clamped");
        }
        tracing::info!(setpoint = clamped, "setpoint changed");
        clamped
    }

    pub fn set_mode(&self, mode: Mode) {
        self.shared.update(|s| s.mode = mode);
        tracing::info!(%mode, "mode changed");
    }

    /// Unknown codes fall back to fan-only.
    pub fn set_mode_code(&self, code: i64) -> Mode {
        let mode = Mode::from_code(code);
        self.set_mode(mode);
        mode
    }

    pub fn set_fan_speed(&self, speed: FanSpeed) {
        self.shared.update(|s| s.fan_speed = speed);
        tracing::info!(%speed, "fan speed changed");
    }

    /// Unknown codes fall back to low.
    pub fn set_fan_speed_code(&self, code: i64) -> FanSpeed {
        let speed = FanSpeed::from_code(code);
        self.set_fan_speed(speed);
        speed
    }

    pub fn status(&self) -> StatusSnapshot {
        self.shared.status()
    }

    /// Chart points at or after `since` (unix seconds), oldest first.
    pub fn history(&self, since: Option<f64>) -> Vec<ChartPoint> {
        self.shared.update(|s| s.chart.since(since))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SampleEvent;
    use crate::state::SystemState;

    fn handle() -> CommandHandle {
        let shared = SharedSystem::new(SystemState::new(75.0, 60, 500).unwrap());
        CommandHandle::new(shared, SetpointDef::default())
    }

    #[test]
    fn enable_and_disable() {
        let cmd = handle();
        cmd.enable();
        assert!(cmd.status().enabled);
        cmd.disable();
        assert!(!cmd.status().enabled);
    }

    #[test]
    fn setpoint_is_clamped() {
        let cmd = handle();
        assert_eq!(cmd.set_setpoint(120.0), 90.0);
        assert_eq!(cmd.set_setpoint(20.0), 55.0);
        assert_eq!(cmd.set_setpoint(68.5), 68.5);
        assert_eq!(cmd.status().desired_temp, 68.5);
    }

    #[test]
    fn inverted_setpoint_range_does_not_panic() {
        let shared = SharedSystem::new(SystemState::new(75.0, 60, 500).unwrap());
        let cmd = CommandHandle::new(
            shared,
            SetpointDef {
                default: 75.0,
                min: 90.0,
                max: 55.0,
            },
        );
        assert_eq!(cmd.set_setpoint(70.0), 55.0);
        assert_eq!(cmd.status().desired_temp, 55.0);
    }

    #[test]
    fn nan_setpoint_is_ignored() {
        let cmd = handle();
        assert_eq!(cmd.set_setpoint(f64::NAN), 75.0);
        assert_eq!(cmd.status().desired_temp, 75.0);
    }

    #[test]
    fn code_fallbacks() {
        let cmd = handle();
        assert_eq!(cmd.set_mode_code(0), Mode::Cool);
        assert_eq!(cmd.set_mode_code(42), Mode::FanOnly);
        assert_eq!(cmd.status().mode, Mode::FanOnly);
        assert_eq!(cmd.set_fan_speed_code(1), FanSpeed::High);
        assert_eq!(cmd.set_fan_speed_code(-7), FanSpeed::Low);
    }

    #[test]
    fn history_filters_by_time() {
        let cmd = handle();
        cmd.shared.update(|s| {
            for i in 0..5 {
                s.record_sample(&SampleEvent {
                    time: 100.0 + i as f64,
                    temperature: 70.0,
                    humidity: 40.0,
                });
            }
        });
        assert_eq!(cmd.history(None).len(), 5);
        let recent = cmd.history(Some(103.0));
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].time, 103.0);
    }
}
