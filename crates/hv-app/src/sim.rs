//! Simulated room for running the rig without hardware.
//!
//! A single lumped temperature drifts toward ambient and is pushed down by
//! the compressor or up by the heater while their relays are energized.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hv_controls::Relay;
use hv_core::degf;
use tokio::time::Instant;

use crate::io::{RawReading, RelayDriver, RelayError, SensorDriver, SensorError};

/// Room model parameters, °F and seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomParams {
    pub ambient_f: f64,
    pub humidity_pct: f64,
    /// Fraction of the gap to ambient closed per second.
    pub leak_per_s: f64,
    pub cooling_f_per_s: f64,
    pub heating_f_per_s: f64,
}

impl Default for RoomParams {
    fn default() -> Self {
        Self {
            ambient_f: 80.0,
            humidity_pct: 45.0,
            leak_per_s: 0.001,
            cooling_f_per_s: 0.02,
            heating_f_per_s: 0.03,
        }
    }
}

#[derive(Debug)]
struct Room {
    params: RoomParams,
    temperature_f: f64,
    energized: BTreeSet<Relay>,
    last: Instant,
}

impl Room {
    fn advance(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f64();
        self.last = now;

        let p = self.params;
        self.temperature_f += (p.ambient_f - self.temperature_f) * (p.leak_per_s * dt).min(1.0);
        if self.energized.contains(&Relay::Cooling) {
            self.temperature_f -= p.cooling_f_per_s * dt;
        }
        if self.energized.contains(&Relay::Heating) {
            self.temperature_f += p.heating_f_per_s * dt;
        }
    }
}

/// Shared handle to one simulated room.
#[derive(Debug, Clone)]
pub struct SimulatedRoom {
    room: Arc<Mutex<Room>>,
}

impl SimulatedRoom {
    pub fn new(initial_f: f64, params: RoomParams) -> Self {
        Self {
            room: Arc::new(Mutex::new(Room {
                params,
                temperature_f: initial_f,
                energized: BTreeSet::new(),
                last: Instant::now(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Room> {
        self.room.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn temperature_f(&self) -> f64 {
        let mut room = self.lock();
        room.advance();
        room.temperature_f
    }

    pub fn energized(&self) -> Vec<Relay> {
        self.lock().energized.iter().copied().collect()
    }

    pub fn relays(&self) -> SimulatedRelays {
        SimulatedRelays { room: self.clone() }
    }

    pub fn sensor(&self) -> SimulatedSensor {
        SimulatedSensor { room: self.clone() }
    }
}

/// Relay driver that switches the simulated equipment and logs each write.
#[derive(Debug, Clone)]
pub struct SimulatedRelays {
    room: SimulatedRoom,
}

impl RelayDriver for SimulatedRelays {
    fn set(&self, relay: Relay, energized: bool) -> Result<(), RelayError> {
        let mut room = self.room.lock();
        room.advance();
        if energized {
            room.energized.insert(relay);
        } else {
            room.energized.remove(&relay);
        }
        tracing::info!(%relay, energized, "relay write");
        Ok(())
    }
}

/// Sensor reporting the simulated room temperature in °C.
#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    room: SimulatedRoom,
}

impl SensorDriver for SimulatedSensor {
    fn read(&mut self) -> Result<RawReading, SensorError> {
        let mut room = self.room.lock();
        room.advance();
        Ok(RawReading {
            temperature: degf(room.temperature_f),
            humidity_pct: room.params.humidity_pct,
        })
    }
}
