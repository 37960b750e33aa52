//! Disk initializer, phase hooks and run loop for the drift engine.
//!
//! [`initialize()`] turns a [`DiskConfig`] into the standard field tree;
//! [`Simulation`] wraps a tree with an integration pipeline, `pre_step` /
//! `post_step` hooks and a snapshot writer, and runs it through the
//! snapshot schedule of a [`RunConfig`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod cancel;
pub mod config;
pub mod disk;
pub mod grid;
pub mod hooks;
pub mod metrics;
pub mod schedule;
pub mod simulation;

pub use cancel::CancelToken;
pub use config::{
    ConfigError, DiskConfig, DustConfig, GasConfig, GridConfig, RunConfig, StarConfig,
    WriterConfig,
};
pub use disk::{bulk_consumers, initialize, radial_velocity_update, vertical_consumers};
pub use grid::Grid;
pub use hooks::{BoundaryPin, Phase, PhaseHook, PhaseHooks};
pub use metrics::{RunOutcome, RunSummary, StepMetrics};
pub use schedule::SnapshotSchedule;
pub use simulation::{RunError, SimState, Simulation};
