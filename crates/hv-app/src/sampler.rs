//! Periodic sensor sampling.
//!
//! The sampler is the only writer of the instant readings, the rolling
//! histories and the chart. The sensor is read outside the lock; only the
//! store happens under it. In the periodic loop the read runs on tokio's
//! blocking pool, so a slow bit-banged sensor never stalls other tasks.

use std::sync::{Arc, Mutex, PoisonError};

use hv_controls::Cadence;
use hv_core::{ensure_finite, ensure_in_range, heat_index_f, to_fahrenheit};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::events::{SampleEvent, unix_now};
use crate::io::{RawReading, SensorDriver, SensorError};
use crate::publish::StatusPublisher;
use crate::state::SharedSystem;

pub struct SensorSampler {
    driver: Arc<Mutex<Box<dyn SensorDriver>>>,
    shared: SharedSystem,
    publisher: Arc<dyn StatusPublisher>,
    cadence: Cadence,
    apply_heat_index: bool,
}

impl SensorSampler {
    pub fn new(
        driver: Box<dyn SensorDriver>,
        shared: SharedSystem,
        publisher: Arc<dyn StatusPublisher>,
        cadence: Cadence,
        apply_heat_index: bool,
    ) -> Self {
        Self {
            driver: Arc::new(Mutex::new(driver)),
            shared,
            publisher,
            cadence,
            apply_heat_index,
        }
    }

    /// Convert a raw reading to °F, optionally as apparent temperature.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::Implausible`] for non-finite temperatures or
    /// humidity outside 0..=100 %.
    pub fn calibrate(&self, raw: RawReading) -> Result<(f64, f64), SensorError> {
        let temp_f = ensure_finite(to_fahrenheit(raw.temperature), "temperature")
            .map_err(|e| SensorError::Implausible(e.to_string()))?;
        let humidity = ensure_in_range(raw.humidity_pct, 0.0, 100.0, "humidity")
            .map_err(|e| SensorError::Implausible(e.to_string()))?;
        let temperature = if self.apply_heat_index {
            heat_index_f(temp_f, humidity)
        } else {
            temp_f
        };
        Ok((temperature, humidity))
    }

    /// Take one reading on the calling thread and store it. On error
    /// nothing is written.
    pub fn sample_once(&mut self) -> Result<SampleEvent, SensorError> {
        let raw = self
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .read()?;
        self.store(raw)
    }

    /// Like [`SensorSampler::sample_once`], with the driver read moved to
    /// the blocking pool.
    pub async fn sample(&mut self) -> Result<SampleEvent, SensorError> {
        let driver = self.driver.clone();
        let raw = tokio::task::spawn_blocking(move || {
            driver.lock().unwrap_or_else(PoisonError::into_inner).read()
        })
        .await
        .map_err(|err| SensorError::Io(format!("sensor read task failed: {err}")))??;
        self.store(raw)
    }

    fn store(&self, raw: RawReading) -> Result<SampleEvent, SensorError> {
        let (temperature, humidity) = self.calibrate(raw)?;
        let sample = SampleEvent {
            time: unix_now(),
            temperature,
            humidity,
        };
        self.shared.update(|s| s.record_sample(&sample));
        self.publisher.publish_sample(&sample);
        Ok(sample)
    }

    /// Sample every period until `shutdown` flips to `true`. Sensor errors
    /// skip the sample and never stop the loop.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.cadence.duration());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(period_s = self.cadence.period_s, "sampler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.sample().await {
                        tracing::warn!(error = %err, "sample skipped");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("sampler stopped");
    }
}
