#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use hv_app::{
    CommandHandle, ControlEngine, EngineSettings, NullPublisher, NullSink, RelayBank,
    RelayDriver, RelayError, SampleEvent, SharedSystem, SystemState,
};
use hv_config::SetpointDef;
use hv_controls::Relay;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelayWrite {
    pub relay: Relay,
    pub energized: bool,
    pub at: Instant,
}

/// Relay driver that records every write and can fail on demand.
#[derive(Default)]
pub struct RecordingRelays {
    writes: Mutex<Vec<RelayWrite>>,
    attempts: Mutex<Vec<(Relay, bool)>>,
    on: Mutex<BTreeSet<Relay>>,
    fail_on: Mutex<Option<Relay>>,
    overlap_seen: Mutex<bool>,
}

impl RecordingRelays {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail every attempt to energize `relay`.
    pub fn fail_on(&self, relay: Relay) {
        *self.fail_on.lock().unwrap() = Some(relay);
    }

    pub fn writes(&self) -> Vec<RelayWrite> {
        self.writes.lock().unwrap().clone()
    }

    pub fn attempts(&self, relay: Relay, energized: bool) -> usize {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| **a == (relay, energized))
            .count()
    }

    pub fn first_on(&self, relay: Relay) -> Option<Instant> {
        self.writes()
            .into_iter()
            .find(|w| w.relay == relay && w.energized)
            .map(|w| w.at)
    }

    pub fn energized(&self) -> Vec<Relay> {
        self.on.lock().unwrap().iter().copied().collect()
    }

    /// True if heating and cooling were ever energized together.
    pub fn overlap_seen(&self) -> bool {
        *self.overlap_seen.lock().unwrap()
    }
}

impl RelayDriver for RecordingRelays {
    fn set(&self, relay: Relay, energized: bool) -> Result<(), RelayError> {
        self.attempts.lock().unwrap().push((relay, energized));
        if energized && *self.fail_on.lock().unwrap() == Some(relay) {
            return Err(RelayError::Io {
                relay,
                message: "injected failure".into(),
            });
        }
        let mut on = self.on.lock().unwrap();
        if energized {
            on.insert(relay);
        } else {
            on.remove(&relay);
        }
        if on.contains(&Relay::Heating) && on.contains(&Relay::Cooling) {
            *self.overlap_seen.lock().unwrap() = true;
        }
        self.writes.lock().unwrap().push(RelayWrite {
            relay,
            energized,
            at: Instant::now(),
        });
        Ok(())
    }
}

pub struct Harness {
    pub engine: ControlEngine,
    pub commands: CommandHandle,
    pub shared: SharedSystem,
    pub relays: Arc<RecordingRelays>,
}

pub fn harness() -> Harness {
    let shared = SharedSystem::new(SystemState::new(75.0, 60, 500).unwrap());
    let relays = RecordingRelays::new();
    let engine = ControlEngine::new(
        shared.clone(),
        Arc::new(RelayBank::new(relays.clone())),
        Arc::new(NullPublisher),
        Arc::new(NullSink),
        EngineSettings::default(),
    );
    let commands = CommandHandle::new(shared.clone(), SetpointDef::default());
    Harness {
        engine,
        commands,
        shared,
        relays,
    }
}

/// Fill the whole temperature history so its average is exactly `temp`.
pub fn set_average(shared: &SharedSystem, temp: f64) {
    shared.update(|s| {
        let capacity = s.temperature_history().capacity();
        for _ in 0..capacity {
            s.record_sample(&SampleEvent {
                time: 0.0,
                temperature: temp,
                humidity: 40.0,
            });
        }
    });
}
