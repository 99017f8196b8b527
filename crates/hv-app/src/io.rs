//! Boundaries to the relay board, the sensor and the time-series store.
//!
//! Drivers are plain synchronous traits owned by exactly one task at a
//! time. Relay writes must be short; sensor reads may block for seconds and
//! are run on the blocking pool by the sampler.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use hv_controls::Relay;
use hv_core::Temperature;
use hv_results::{CycleRecord, TelemetryStore};
use thiserror::Error;

use crate::error::AppResult;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RelayError {
    #[error("Relay {relay} I/O failed: {message}")]
    Io { relay: Relay, message: String },

    #[error("Relay {relay} blocked by interlock: {reason}")]
    Interlock { relay: Relay, reason: &'static str },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SensorError {
    #[error("Sensor read failed: {0}")]
    Io(String),

    #[error("Implausible sensor reading: {0}")]
    Implausible(String),
}

/// Raw sensor output before calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawReading {
    pub temperature: Temperature,
    /// Relative humidity in percent.
    pub humidity_pct: f64,
}

/// Relay board driver. `set` must be idempotent.
pub trait RelayDriver: Send + Sync {
    fn set(&self, relay: Relay, energized: bool) -> Result<(), RelayError>;
}

/// Temperature/humidity sensor driver. `read` may block (retrying a
/// single-wire bus, for instance).
pub trait SensorDriver: Send {
    fn read(&mut self) -> Result<RawReading, SensorError>;
}

/// Outbound per-cycle record. Delivery is best-effort.
pub trait PersistenceSink: Send + Sync {
    fn record(&self, record: &CycleRecord) -> AppResult<()>;
}

impl PersistenceSink for TelemetryStore {
    fn record(&self, record: &CycleRecord) -> AppResult<()> {
        self.append(record)?;
        Ok(())
    }
}

/// Sink that drops every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PersistenceSink for NullSink {
    fn record(&self, _record: &CycleRecord) -> AppResult<()> {
        Ok(())
    }
}

/// Relay driver wrapper that tracks energized outputs and enforces the
/// equipment interlock:
/// - only one fan relay at a time
/// - compressor or heater only with a fan running
/// - never heating and cooling together
pub struct RelayBank {
    driver: Arc<dyn RelayDriver>,
    energized: Mutex<BTreeSet<Relay>>,
}

impl RelayBank {
    pub fn new(driver: Arc<dyn RelayDriver>) -> Self {
        Self {
            driver,
            energized: Mutex::new(BTreeSet::new()),
        }
    }

    fn tracked(&self) -> std::sync::MutexGuard<'_, BTreeSet<Relay>> {
        self.energized.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_energized(&self, relay: Relay) -> bool {
        self.tracked().contains(&relay)
    }

    pub fn energized(&self) -> Vec<Relay> {
        self.tracked().iter().copied().collect()
    }

    fn check_interlock(&self, relay: Relay) -> Result<(), RelayError> {
        let on = self.tracked();
        let fan_running = on.contains(&Relay::FanLow) || on.contains(&Relay::FanHigh);
        let reason = match relay {
            Relay::FanLow if on.contains(&Relay::FanHigh) => Some("high fan already running"),
            Relay::FanHigh if on.contains(&Relay::FanLow) => Some("low fan already running"),
            Relay::Cooling if on.contains(&Relay::Heating) => Some("heating is energized"),
            Relay::Heating if on.contains(&Relay::Cooling) => Some("cooling is energized"),
            r if r.is_load() && !fan_running => Some("no fan running"),
            _ => None,
        };
        match reason {
            Some(reason) => Err(RelayError::Interlock { relay, reason }),
            None => Ok(()),
        }
    }

    /// Drive one relay. The tracking lock is not held during driver I/O.
    pub fn set(&self, relay: Relay, energized: bool) -> Result<(), RelayError> {
        if energized {
            self.check_interlock(relay)?;
        }
        self.driver.set(relay, energized)?;
        let mut on = self.tracked();
        if energized {
            on.insert(relay);
        } else {
            on.remove(&relay);
        }
        Ok(())
    }

    /// De-energize every relay, ignoring sequencing. Returns the relays
    /// that could not be released.
    pub fn force_safe(&self) -> Vec<Relay> {
        let mut failed = Vec::new();
        for relay in Relay::ALL {
            match self.driver.set(relay, false) {
                Ok(()) => {
                    self.tracked().remove(&relay);
                }
                Err(err) => {
                    tracing::error!(%relay, error = %err, "failed to release relay during safe shutdown");
                    failed.push(relay);
                }
            }
        }
        failed
    }
}
