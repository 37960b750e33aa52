//! Drift: a reactive field-dependency engine for dust and gas evolution in
//! protoplanetary disks.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all drift sub-crates. For most users, adding `drift` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use drift::prelude::*;
//! use drift::frame::ndarray::ArrayD;
//!
//! let disk = DiskConfig {
//!     grid: GridConfig { radial_cells: 16, ..GridConfig::default() },
//!     ..DiskConfig::default()
//! };
//! let mut frame = initialize(&disk)?;
//!
//! // a loss term, recomputed with the rest of the dust group
//! let shape = frame.get(layout::DUST_SIGMA)?.shape().to_vec();
//! frame.add_field("dust", "dSigma", ArrayD::zeros(shape), "Loss rate [g/cm²/s]")?;
//! frame.set_updater(
//!     "dust.dSigma",
//!     Updater::computed(|f| Ok(f.get(layout::DUST_SIGMA)? * -1e-12)),
//! )?;
//! frame.append_to_chain("dust", "dSigma")?;
//!
//! let run = RunConfig { snapshots: vec![1e10, 2e10], verbosity: 0, ..RunConfig::default() };
//! let mut sim = Simulation::new(frame, run)?;
//! sim.pipeline_mut().push(
//!     FieldPath::parse(layout::DUST_SIGMA)?,
//!     ExplicitEuler::new("loss", "dust.dSigma")?.max_relative_change(0.1),
//! );
//! sim.set_writer(Box::new(MemorySink::new()));
//!
//! let summary = sim.run()?;
//! assert_eq!(summary.outcome, RunOutcome::Completed);
//! assert_eq!(summary.snapshots, 3);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `drift-core` | IDs, paths, constants, standard layout, errors |
//! | [`frame`] | `drift-frame` | Field/group store and update graph |
//! | [`integrator`] | `drift-integrator` | Scheme trait and integration pipeline |
//! | [`schemes`] | `drift-schemes` | Reference explicit and implicit schemes |
//! | [`snapshot`] | `drift-snapshot` | Snapshot records, writer, reader, hashing |
//! | [`backreaction`] | `drift-backreaction` | Back-reaction coefficient contract and wiring |
//! | [`engine`] | `drift-engine` | Configuration, disk initializer, hooks, run loop |
//! | [`logging`] | | `tracing-subscriber` setup |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod logging;

/// Core types, constants and errors (`drift-core`).
///
/// [`types::layout`] names every field of the standard tree.
pub use drift_core as types;

/// Field/group store and update graph (`drift-frame`).
///
/// Re-exports `ndarray` as [`frame::ndarray`].
pub use drift_frame as frame;

/// Scheme trait and integration pipeline (`drift-integrator`).
pub use drift_integrator as integrator;

/// Reference integration schemes (`drift-schemes`).
pub use drift_schemes as schemes;

/// Snapshot persistence (`drift-snapshot`).
///
/// [`snapshot::DirectoryWriter`] writes each record atomically;
/// [`snapshot::DirectoryReader`] loads them back for restarts.
pub use drift_snapshot as snapshot;

/// Back-reaction coefficient models and wiring (`drift-backreaction`).
pub use drift_backreaction as backreaction;

/// Configuration, disk initializer, phase hooks and run loop (`drift-engine`).
pub use drift_engine as engine;

/// Common imports for typical drift usage.
///
/// ```rust
/// use drift::prelude::*;
/// ```
pub mod prelude {
    // Core
    pub use drift_core::{layout, Constants, ErrorKind, FieldPath, InstructionId, SnapshotIndex};

    // Errors
    pub use drift_core::{ComputeError, FrameError, NumericalError, SchemeError, UpdateError};

    // Store
    pub use drift_frame::{Domain, Frame, GroupHook, Updater};

    // Pipeline
    pub use drift_integrator::{AdvanceContext, Method, Pipeline, PipelineError, Scheme};
    pub use drift_schemes::{ExplicitEuler, ImplicitRelaxation};

    // Persistence
    pub use drift_snapshot::{
        DirectoryReader, DirectoryWriter, MemorySink, SnapshotRecord, SnapshotSink, WriteError,
    };

    // Back-reaction
    pub use drift_backreaction::{
        setup_backreaction, Backreaction, BulkModel, Structure, Uncoupled, VerticalModel,
    };

    // Engine
    pub use drift_engine::{
        initialize, BoundaryPin, CancelToken, ConfigError, DiskConfig, GridConfig, Phase,
        RunConfig, RunError, RunOutcome, RunSummary, SimState, Simulation, StepMetrics,
        WriterConfig,
    };
}
