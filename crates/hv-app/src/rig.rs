//! Rig assembly: builds shared state from configuration and starts the
//! sampler and control loop tasks.

use std::sync::Arc;

use hv_config::RigConfig;
use hv_results::TelemetryStore;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::commands::CommandHandle;
use crate::engine::{ControlEngine, EngineSettings};
use crate::error::AppResult;
use crate::io::{NullSink, PersistenceSink, RelayBank, RelayDriver, SensorDriver};
use crate::publish::StatusPublisher;
use crate::sampler::SensorSampler;
use crate::state::{SharedSystem, SystemState};

/// Hardware and outbound boundaries for one rig.
pub struct RigDrivers {
    pub relays: Arc<dyn RelayDriver>,
    pub sensor: Box<dyn SensorDriver>,
    pub publisher: Arc<dyn StatusPublisher>,
    pub sink: Arc<dyn PersistenceSink>,
}

/// Persistence sink named by the configuration, or [`NullSink`].
pub fn sink_from_config(config: &RigConfig) -> AppResult<Arc<dyn PersistenceSink>> {
    match &config.persistence {
        Some(def) => Ok(Arc::new(TelemetryStore::open(&def.path)?)),
        None => Ok(Arc::new(NullSink)),
    }
}

/// Running rig. Dropping it without [`RigHandle::shutdown`] leaves relays
/// in whatever state the last sequence left them.
pub struct RigHandle {
    commands: CommandHandle,
    relays: Arc<RelayBank>,
    shutdown_tx: watch::Sender<bool>,
    engine: JoinHandle<()>,
    sampler: JoinHandle<()>,
}

impl RigHandle {
    pub fn commands(&self) -> &CommandHandle {
        &self.commands
    }

    pub fn relays(&self) -> &Arc<RelayBank> {
        &self.relays
    }

    /// Stop both loops and wait for the control loop to force relays safe.
    pub async fn shutdown(self) -> AppResult<()> {
        tracing::info!("shutting down rig");
        let _ = self.shutdown_tx.send(true);
        self.sampler.await?;
        self.engine.await?;
        Ok(())
    }
}

/// Validate settings, take a first sample and spawn the sampler and
/// control loop. Must be called inside a tokio runtime.
pub fn start_rig(config: &RigConfig, drivers: RigDrivers) -> AppResult<RigHandle> {
    let settings = EngineSettings::from_config(config)?;
    let sampling = &config.sampling;
    let shared = SharedSystem::new(SystemState::new(
        config.setpoint.default,
        sampling.buffer_capacity,
        sampling.chart_prune_threshold,
    )?);

    let mut sampler = SensorSampler::new(
        drivers.sensor,
        shared.clone(),
        drivers.publisher.clone(),
        sampling.cadence()?,
        sampling.apply_heat_index,
    );
    if let Err(err) = sampler.sample_once() {
        tracing::warn!(error = %err, "initial sample failed");
    }

    let relays = Arc::new(RelayBank::new(drivers.relays));
    let engine = ControlEngine::new(
        shared.clone(),
        relays.clone(),
        drivers.publisher,
        drivers.sink,
        settings,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sampler = tokio::spawn(sampler.run(shutdown_rx.clone()));
    let engine = tokio::spawn(engine.run(shutdown_rx));
    tracing::info!(rig = %config.name, "rig started");

    Ok(RigHandle {
        commands: CommandHandle::new(shared, config.setpoint.clone()),
        relays,
        shutdown_tx,
        engine,
        sampler,
    })
}
