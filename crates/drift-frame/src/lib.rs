//! Hierarchical field store and update graph.
//!
//! A [`Frame`] is an arena of named nodes addressed by dotted path. Leaf
//! nodes are [`Field`]s holding an n-dimensional `f64` array of fixed shape;
//! inner nodes are [`Group`]s holding an ordered set of children and an
//! explicit update chain.
//!
//! # Update graph
//!
//! [`Frame::update()`] walks the root chain left to right. Group entries
//! recurse (running the group's systole and diastole hooks around its own
//! chain); field entries with an [`Updater::Computed`] function are
//! recomputed from the current state and shape-checked. Fields that are
//! [`Updater::Frozen`] keep their last assigned value. A field that is not
//! listed in any chain is never recomputed.
//!
//! There is no cycle detection and no automatic invalidation: a field read
//! before its upstream is recomputed in the same pass sees the old value.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod check;
pub mod clamp;
pub mod field;
pub mod frame;
pub mod group;
mod update;

pub use check::check_values;
pub use clamp::{clamp_to_floor, FLOOR_FRACTION};
pub use field::{Domain, Field, UpdateFn, Updater};
pub use frame::Frame;
pub use group::{Group, GroupHook};

pub use ndarray;
