//! Runtime service layer for the HVAC rig.
//!
//! This crate wires the pure control domain (`hv-controls`) to hardware and
//! front ends. It owns the single shared [`SystemState`], the periodic
//! sensor sampler, the control loop and the relay sequencer task, and the
//! command handle front ends use to change intent.

pub mod commands;
pub mod engine;
pub mod error;
pub mod events;
pub mod io;
pub mod publish;
pub mod rig;
pub mod sampler;
pub mod sequencer;
pub mod sim;
pub mod state;

// Re-export key types for convenience
pub use commands::CommandHandle;
pub use engine::{ControlEngine, CycleReport, EngineSettings};
pub use error::{AppError, AppResult};
pub use events::{FaultEvent, RigEvent, SampleEvent, StatusSnapshot};
pub use io::{
    NullSink, PersistenceSink, RawReading, RelayBank, RelayDriver, RelayError, SensorDriver,
    SensorError,
};
pub use publish::{BroadcastPublisher, NullPublisher, StatusPublisher, TracingPublisher};
pub use rig::{RigDrivers, RigHandle, sink_from_config, start_rig};
pub use sampler::SensorSampler;
pub use sequencer::{SequenceOutcome, run_sequence, spawn_sequence};
pub use sim::{RoomParams, SimulatedRelays, SimulatedRoom, SimulatedSensor};
pub use state::{SharedSystem, SystemState};
