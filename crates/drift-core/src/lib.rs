//! Core types for the drift disk-evolution engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other drift crate: node and instruction
//! identifiers, dotted field paths, the immutable physical constants,
//! the names of the standard field tree, and the error taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod constants;
pub mod error;
pub mod id;
pub mod layout;
pub mod path;

pub use constants::Constants;
pub use error::{
    ComputeError, ErrorKind, FrameError, NumericalError, SchemeError, UpdateError,
};
pub use id::{InstructionId, NodeId, Shape, SnapshotIndex};
pub use path::FieldPath;
