//! The control loop.
//!
//! Each cycle reads the smoothed temperature, runs the rate estimator and
//! the decision table under the shared lock, then (with the lock released)
//! publishes status, records the cycle and launches at most one relay
//! sequence.

use std::sync::Arc;

use hv_config::RigConfig;
use hv_controls::{
    Cadence, ControlInputs, Decision, FanRelay, RateEstimator, RatePolicy, RunState,
    SequenceKind, SequencePlan, SequenceTiming, Thresholds, decide, select_fan,
};
use hv_results::CycleRecord;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::AppResult;
use crate::events::{FaultEvent, StatusSnapshot, unix_now};
use crate::io::{PersistenceSink, RelayBank};
use crate::publish::StatusPublisher;
use crate::sequencer::{SequenceOutcome, spawn_sequence};
use crate::state::SharedSystem;

/// Validated control-loop parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub cadence: Cadence,
    pub thresholds: Thresholds,
    pub rate_policy: RatePolicy,
    pub timing: SequenceTiming,
}

impl Default for EngineSettings {
    fn default() -> Self {
        let rate_policy = RatePolicy::default();
        Self {
            cadence: Cadence {
                period_s: rate_policy.nominal_period_s,
            },
            thresholds: Thresholds::default(),
            rate_policy,
            timing: SequenceTiming::default(),
        }
    }
}

impl EngineSettings {
    pub fn from_config(config: &RigConfig) -> AppResult<Self> {
        Ok(Self {
            cadence: config.control.cadence()?,
            thresholds: config.control.thresholds()?,
            rate_policy: config.control.rate_policy()?,
            timing: config.sequencing.timing()?,
        })
    }
}

/// What one control cycle did.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub previous: RunState,
    pub next: RunState,
    pub launched: Option<SequenceKind>,
    pub status: StatusSnapshot,
}

enum Wake {
    Tick,
    Outcome(SequenceOutcome),
    Idle,
    Stop,
}

pub struct ControlEngine {
    shared: SharedSystem,
    relays: Arc<RelayBank>,
    publisher: Arc<dyn StatusPublisher>,
    sink: Arc<dyn PersistenceSink>,
    settings: EngineSettings,
    estimator: RateEstimator,
    started: Instant,
    /// Fan energized by the last start sequence, released by the next stop.
    active_fan: Option<FanRelay>,
    in_flight: Option<(SequenceKind, JoinHandle<()>)>,
    outcomes_tx: mpsc::UnboundedSender<SequenceOutcome>,
    outcomes_rx: mpsc::UnboundedReceiver<SequenceOutcome>,
}

impl ControlEngine {
    pub fn new(
        shared: SharedSystem,
        relays: Arc<RelayBank>,
        publisher: Arc<dyn StatusPublisher>,
        sink: Arc<dyn PersistenceSink>,
        settings: EngineSettings,
    ) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        Self {
            shared,
            relays,
            publisher,
            sink,
            estimator: RateEstimator::new(settings.rate_policy),
            settings,
            started: Instant::now(),
            active_fan: None,
            in_flight: None,
            outcomes_tx,
            outcomes_rx,
        }
    }

    pub fn shared(&self) -> &SharedSystem {
        &self.shared
    }

    pub fn relays(&self) -> &Arc<RelayBank> {
        &self.relays
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Sequence currently running, if any.
    pub fn in_flight(&self) -> Option<SequenceKind> {
        self.in_flight.as_ref().map(|(kind, _)| *kind)
    }

    /// Run one control cycle.
    pub fn cycle(&mut self) -> CycleReport {
        let now_s = self.started.elapsed().as_secs_f64();
        let thresholds = self.settings.thresholds;
        let busy = self.in_flight.is_some();
        let estimator = &mut self.estimator;

        let (previous, decision, diff, fan_speed, status) = self.shared.update(|s| {
            let average = s.temperature_history.average();
            s.current_temperature = average;
            s.time_to_target_min = average.map(|avg| {
                estimator
                    .update(avg, now_s, s.desired_temperature)
                    .time_to_target_min
            });

            let inputs = ControlInputs {
                run_state: s.run_state,
                enabled: s.enabled,
                mode: s.mode,
                current: s.current_temperature,
                desired: s.desired_temperature,
            };
            let mut decision = decide(&inputs, &thresholds);
            if busy && decision.sequence.is_some() {
                decision = Decision {
                    next: inputs.run_state,
                    sequence: None,
                };
            }
            s.run_state = decision.next;
            (inputs.run_state, decision, inputs.diff(), s.fan_speed, s.status())
        });

        if decision.changed(previous) {
            tracing::info!(from = %previous, to = %decision.next, "run state changed");
        }
        tracing::debug!(
            current = ?status.current_temp,
            desired = status.desired_temp,
            state = %status.run_state,
            "control cycle"
        );

        if let Some(kind) = decision.sequence {
            let fan = if kind.is_start() {
                select_fan(fan_speed, diff, &thresholds)
            } else {
                self.active_fan.unwrap_or(FanRelay::Low)
            };
            self.launch(kind, fan);
        }

        self.publisher.publish_status(&status);
        if let Some(temp) = status.current_temp {
            self.publisher.publish_heartbeat(temp);
        }
        let record = CycleRecord::now(
            status.instant_temp,
            status.desired_temp,
            status.instant_humidity,
            status.run_state.code(),
        );
        if let Err(err) = self.sink.record(&record) {
            tracing::warn!(error = %err, "failed to persist cycle record");
        }

        CycleReport {
            previous,
            next: decision.next,
            launched: decision.sequence,
            status,
        }
    }

    fn launch(&mut self, kind: SequenceKind, fan: FanRelay) {
        if kind.is_start() {
            self.active_fan = Some(fan);
        }
        let plan = SequencePlan::new(kind, fan, &self.settings.timing);
        tracing::info!(sequence = %kind, ?fan, dwell_s = plan.total_dwell().as_secs_f64(), "launching sequence");
        let handle = spawn_sequence(plan, self.relays.clone(), self.outcomes_tx.clone());
        self.in_flight = Some((kind, handle));
    }

    /// Apply a finished sequence. Success moves `Transition` to the
    /// sequence's resting state; failure leaves `Transition` in place and
    /// raises a fault.
    pub fn apply_outcome(&mut self, outcome: SequenceOutcome) {
        if self.in_flight() == Some(outcome.kind) {
            self.in_flight = None;
        }
        match outcome.result {
            Ok(resting) => {
                let previous = self.shared.update(|s| {
                    let previous = s.run_state;
                    if previous == RunState::Transition {
                        s.run_state = resting;
                    }
                    s.fault = None;
                    previous
                });
                if !outcome.kind.is_start() {
                    self.active_fan = None;
                }
                if previous == RunState::Transition {
                    tracing::info!(sequence = %outcome.kind, to = %resting, "run state changed");
                }
            }
            Err(err) => {
                let fault = FaultEvent {
                    sequence: outcome.kind,
                    message: err.to_string(),
                    time: unix_now(),
                };
                tracing::error!(sequence = %outcome.kind, error = %err, "sequence failed, holding in transition");
                let stored = fault.clone();
                self.shared.update(|s| s.fault = Some(stored));
                self.publisher.publish_fault(&fault);
            }
        }
    }

    /// Wait for the in-flight sequence (if any) and apply its outcome.
    pub async fn settle(&mut self) {
        if self.in_flight.is_none() {
            return;
        }
        if let Some(outcome) = self.outcomes_rx.recv().await {
            self.apply_outcome(outcome);
        }
    }

    /// Cycle every control period until `shutdown` flips to `true`, then
    /// force every relay safe.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.settings.cadence.duration());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(period_s = self.settings.cadence.period_s, "control loop started");

        loop {
            let wake = tokio::select! {
                _ = ticker.tick() => Wake::Tick,
                Some(outcome) = self.outcomes_rx.recv() => Wake::Outcome(outcome),
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        Wake::Stop
                    } else {
                        Wake::Idle
                    }
                }
            };
            match wake {
                Wake::Tick => {
                    self.cycle();
                }
                Wake::Outcome(outcome) => self.apply_outcome(outcome),
                Wake::Idle => {}
                Wake::Stop => break,
            }
        }
        self.shutdown();
    }

    /// Abort any in-flight sequence and de-energize every relay.
    pub fn shutdown(&mut self) {
        if let Some((kind, handle)) = self.in_flight.take() {
            tracing::warn!(sequence = %kind, "aborting in-flight sequence");
            handle.abort();
        }
        let failed = self.relays.force_safe();
        self.active_fan = None;
        self.shared.update(|s| s.run_state = RunState::Disabled);
        if failed.is_empty() {
            tracing::info!("all relays released");
        } else {
            tracing::error!(?failed, "relays could not be released");
        }
    }
}
