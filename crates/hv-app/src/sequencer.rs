//! Relay sequence execution.
//!
//! A sequence runs as its own task so dwells never block the control loop.
//! The task never touches [`SystemState`](crate::SystemState): it reports a
//! [`SequenceOutcome`] on a channel and the control loop applies it under
//! the lock.

use std::sync::Arc;

use hv_controls::{FanRelay, RunState, SequenceKind, SequencePlan, SequenceStep};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::io::{RelayBank, RelayError};

/// How a sequence ended.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceOutcome {
    pub kind: SequenceKind,
    pub fan: FanRelay,
    /// Resting state on success. On error the remaining steps were skipped.
    pub result: Result<RunState, RelayError>,
}

/// Execute every step of `plan` in order, stopping at the first relay
/// failure.
pub async fn run_sequence(plan: &SequencePlan, relays: &RelayBank) -> Result<RunState, RelayError> {
    tracing::info!(sequence = %plan.kind, steps = plan.steps.len(), "sequence started");
    for step in &plan.steps {
        match *step {
            SequenceStep::Energize(relay) => {
                relays.set(relay, true)?;
                tracing::debug!(%relay, "relay on");
            }
            SequenceStep::DeEnergize(relay) => {
                relays.set(relay, false)?;
                tracing::debug!(%relay, "relay off");
            }
            SequenceStep::Dwell(duration) => {
                tracing::debug!(secs = duration.as_secs_f64(), "dwell");
                tokio::time::sleep(duration).await;
            }
        }
    }
    tracing::info!(sequence = %plan.kind, "sequence complete");
    Ok(plan.final_state())
}

/// Run `plan` on a new task and report the outcome on `outcomes`.
pub fn spawn_sequence(
    plan: SequencePlan,
    relays: Arc<RelayBank>,
    outcomes: mpsc::UnboundedSender<SequenceOutcome>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = run_sequence(&plan, &relays).await;
        let outcome = SequenceOutcome {
            kind: plan.kind,
            fan: plan.fan,
            result,
        };
        if outcomes.send(outcome).is_err() {
            tracing::warn!(sequence = %plan.kind, "control loop gone, sequence outcome dropped");
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use hv_controls::{Relay, SequenceTiming};
    use tokio::time::Instant;

    use super::*;
    use crate::io::RelayDriver;

    #[derive(Default)]
    struct Log {
        writes: Mutex<Vec<(Relay, bool, Instant)>>,
        fail_on: Option<Relay>,
    }

    impl RelayDriver for Log {
        fn set(&self, relay: Relay, energized: bool) -> Result<(), RelayError> {
            if energized && self.fail_on == Some(relay) {
                return Err(RelayError::Io {
                    relay,
                    message: "stuck".into(),
                });
            }
            self.writes
                .lock()
                .unwrap()
                .push((relay, energized, Instant::now()));
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn start_cooling_waits_for_lead_in() {
        let log = Arc::new(Log::default());
        let bank = RelayBank::new(log.clone());
        let timing = SequenceTiming::default();
        let plan = SequencePlan::new(SequenceKind::StartCooling, FanRelay::Low, &timing);

        let start = Instant::now();
        let result = run_sequence(&plan, &bank).await;
        assert_eq!(result, Ok(RunState::Cooling));

        let writes = log.writes.lock().unwrap();
        let (_, _, fan_at) = writes.iter().find(|w| w.0 == Relay::FanLow).unwrap();
        let (_, _, cool_at) = writes.iter().find(|w| w.0 == Relay::Cooling).unwrap();
        assert_eq!(*fan_at, start);
        assert!(*cool_at - *fan_at >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_stops_remaining_steps() {
        let log = Arc::new(Log {
            fail_on: Some(Relay::ReversingValve),
            ..Log::default()
        });
        let bank = RelayBank::new(log.clone());
        let plan = SequencePlan::new(
            SequenceKind::StartCooling,
            FanRelay::High,
            &SequenceTiming::default(),
        );

        let result = run_sequence(&plan, &bank).await;
        assert!(matches!(result, Err(RelayError::Io { relay: Relay::ReversingValve, .. })));
        assert!(!bank.is_energized(Relay::Cooling));
        assert!(bank.is_energized(Relay::FanHigh));
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_sequence_reports_outcome() {
        let bank = Arc::new(RelayBank::new(Arc::new(Log::default())));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let plan = SequencePlan::new(
            SequenceKind::StartFan,
            FanRelay::Low,
            &SequenceTiming::default(),
        );

        spawn_sequence(plan, bank.clone(), tx).await.unwrap();
        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.kind, SequenceKind::StartFan);
        assert_eq!(outcome.result, Ok(RunState::FanOnly));
        assert!(bank.is_energized(Relay::FanLow));
    }
}
