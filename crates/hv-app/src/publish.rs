//! Status publishing boundary.
//!
//! Publishing is fire-and-forget: the control loop never waits on a front
//! end, and a publisher with no listeners is not an error.

use tokio::sync::broadcast;

use crate::events::{FaultEvent, RigEvent, SampleEvent, StatusSnapshot};

pub trait StatusPublisher: Send + Sync {
    /// Called once per control cycle.
    fn publish_status(&self, status: &StatusSnapshot);

    /// Called once per control cycle once a smoothed temperature exists.
    fn publish_heartbeat(&self, _temp: f64) {}

    /// Called once per sensor sample.
    fn publish_sample(&self, sample: &SampleEvent);

    /// Called when a relay sequence faults.
    fn publish_fault(&self, _fault: &FaultEvent) {}
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPublisher;

impl StatusPublisher for NullPublisher {
    fn publish_status(&self, _status: &StatusSnapshot) {}
    fn publish_sample(&self, _sample: &SampleEvent) {}
}

/// Writes events to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingPublisher;

impl StatusPublisher for TracingPublisher {
    fn publish_status(&self, status: &StatusSnapshot) {
        tracing::info!(
            current = ?status.current_temp,
            desired = status.desired_temp,
            mode = %status.mode,
            state = %status.run_state,
            enabled = status.enabled,
            eta_min = ?status.time_to_target_min,
            humidity = ?status.instant_humidity,
            "status"
        );
    }

    fn publish_heartbeat(&self, temp: f64) {
        tracing::trace!(temp, "heartbeat");
    }

    fn publish_sample(&self, sample: &SampleEvent) {
        tracing::debug!(
            temperature = sample.temperature,
            humidity = sample.humidity,
            "sample"
        );
    }

    fn publish_fault(&self, fault: &FaultEvent) {
        tracing::error!(sequence = %fault.sequence, message = %fault.message, "equipment fault");
    }
}

/// Fans events out to any number of subscribers (socket sessions, tests).
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    tx: broadcast::Sender<RigEvent>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RigEvent> {
        self.tx.subscribe()
    }

    fn send(&self, event: RigEvent) {
        // No receivers is fine.
        let _ = self.tx.send(event);
    }
}

impl StatusPublisher for BroadcastPublisher {
    fn publish_status(&self, status: &StatusSnapshot) {
        self.send(RigEvent::Status(status.clone()));
    }

    fn publish_heartbeat(&self, temp: f64) {
        self.send(RigEvent::Heartbeat { temp });
    }

    fn publish_sample(&self, sample: &SampleEvent) {
        self.send(RigEvent::Sample(*sample));
    }

    fn publish_fault(&self, fault: &FaultEvent) {
        self.send(RigEvent::Fault(fault.clone()));
    }
}
