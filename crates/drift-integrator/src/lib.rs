//! Integration schemes and the instruction pipeline.
//!
//! A [`Scheme`] advances one target field by `dt`. The [`Pipeline`] holds
//! an ordered list of [`Instruction`]s, each pairing a target with a
//! scheme, addressed by a stable [`InstructionId`](drift_core::InstructionId)
//! so that removals never shift the meaning of later edits.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod context;
pub mod pipeline;
pub mod scheme;

pub use context::AdvanceContext;
pub use pipeline::{Instruction, InstructionTiming, Pipeline, PipelineError};
pub use scheme::{Method, Scheme};
