//! Dust-to-gas momentum back-reaction.
//!
//! The closed-form coefficient physics is supplied by the caller through
//! [`BulkModel`] or [`VerticalModel`]. This crate fixes the contract
//! (inputs, output shapes, packing into the `AB` field) and wires the
//! coefficients into the update graph with [`setup_backreaction`], so
//! that every consumer reads a single freshly computed `(A, B)` pair.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod coefficients;
pub mod inputs;
pub mod model;
pub mod setup;

pub use coefficients::{BulkCoefficients, VerticalCoefficients};
pub use inputs::BackreactionInputs;
pub use model::{BulkModel, Uncoupled, VerticalModel};
pub use setup::{setup_backreaction, Backreaction, BackreactionError, Consumers, Structure};
