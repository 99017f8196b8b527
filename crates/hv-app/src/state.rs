//! The single shared system record and its lock discipline.
//!
//! All control-relevant fields live in one [`SystemState`] behind one
//! mutex. Access goes through [`SharedSystem::update`] with a synchronous
//! closure, so the lock can never be held across an `.await` or relay I/O.

use std::sync::{Arc, Mutex, PoisonError};

use hv_controls::{
    ChartPoint, ChartSeries, ControlResult, FanSpeed, Mode, RollingBuffer, RunState,
};
use hv_core::round_to;

use crate::events::{FaultEvent, SampleEvent, StatusSnapshot};

#[derive(Debug, Clone, PartialEq)]
pub struct SystemState {
    pub(crate) enabled: bool,
    pub(crate) mode: Mode,
    pub(crate) fan_speed: FanSpeed,
    pub(crate) run_state: RunState,
    pub(crate) desired_temperature: f64,
    pub(crate) current_temperature: Option<f64>,
    pub(crate) instant_temperature: Option<f64>,
    pub(crate) instant_humidity: Option<f64>,
    pub(crate) temperature_history: RollingBuffer,
    pub(crate) humidity_history: RollingBuffer,
    pub(crate) chart: ChartSeries,
    pub(crate) time_to_target_min: Option<f64>,
    pub(crate) fault: Option<FaultEvent>,
}

impl SystemState {
    /// Disabled, idle posture used at process start.
    pub fn new(
        desired_temperature: f64,
        buffer_capacity: usize,
        chart_prune_threshold: usize,
    ) -> ControlResult<Self> {
        Ok(Self {
            enabled: false,
            mode: Mode::default(),
            fan_speed: FanSpeed::default(),
            run_state: RunState::Disabled,
            desired_temperature,
            current_temperature: None,
            instant_temperature: None,
            instant_humidity: None,
            temperature_history: RollingBuffer::new(buffer_capacity)?,
            humidity_history: RollingBuffer::new(buffer_capacity)?,
            chart: ChartSeries::new(chart_prune_threshold),
            time_to_target_min: None,
            fault: None,
        })
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn fan_speed(&self) -> FanSpeed {
        self.fan_speed
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn desired_temperature(&self) -> f64 {
        self.desired_temperature
    }

    pub fn current_temperature(&self) -> Option<f64> {
        self.current_temperature
    }

    pub fn instant_temperature(&self) -> Option<f64> {
        self.instant_temperature
    }

    pub fn instant_humidity(&self) -> Option<f64> {
        self.instant_humidity
    }

    pub fn temperature_history(&self) -> &RollingBuffer {
        &self.temperature_history
    }

    pub fn humidity_history(&self) -> &RollingBuffer {
        &self.humidity_history
    }

    pub fn chart(&self) -> &ChartSeries {
        &self.chart
    }

    pub fn fault(&self) -> Option<&FaultEvent> {
        self.fault.as_ref()
    }

    /// Store one calibrated sample: instant fields, both histories and
    /// the chart (pruned when oversized). This is the sampler's write path.
    pub fn record_sample(&mut self, sample: &SampleEvent) {
        self.instant_temperature = Some(sample.temperature);
        self.instant_humidity = Some(sample.humidity);
        self.temperature_history.write(sample.temperature);
        self.humidity_history.write(sample.humidity);
        self.chart.push(ChartPoint {
            time: sample.time,
            temp: sample.temperature,
            humid: sample.humidity,
        });
        self.chart.prune();
    }

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            current_temp: self.current_temperature.map(|t| round_to(t, 1)),
            desired_temp: round_to(self.desired_temperature, 1),
            mode: self.mode,
            fan_speed: self.fan_speed,
            run_state: self.run_state,
            enabled: self.enabled,
            time_to_target_min: self.time_to_target_min,
            instant_temp: self.instant_temperature,
            instant_humidity: self.instant_humidity,
            fault: self.fault.clone(),
        }
    }
}

/// Cloneable handle to the one lock-guarded [`SystemState`].
#[derive(Debug, Clone)]
pub struct SharedSystem {
    inner: Arc<Mutex<SystemState>>,
}

impl SharedSystem {
    pub fn new(state: SystemState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Run `f` with exclusive access. A poisoned lock is recovered: the
    /// state is plain data and stays usable after a panicking writer.
    pub fn update<R>(&self, f: impl FnOnce(&mut SystemState) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Copy of the whole state.
    pub fn snapshot(&self) -> SystemState {
        self.update(|s| s.clone())
    }

    pub fn status(&self) -> StatusSnapshot {
        self.update(|s| s.status())
    }
}
