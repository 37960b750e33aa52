//! Snapshot persistence for drift runs.
//!
//! A snapshot is the full field tree at one time, captured as a
//! [`SnapshotRecord`] and handed to a [`SnapshotSink`].
//!
//! # Architecture
//!
//! - [`DirectoryWriter`] persists records as `data<index:04>.json` files
//! - [`DirectoryReader`] lists and loads them back
//! - [`MemorySink`] keeps records in memory for tests and embedding
//! - [`state_hash`] and [`SnapshotRecord::hash`] give an FNV-1a digest
//!   for bit-for-bit comparisons
//!
//! Writes go through a temporary file that is renamed into place, so a
//! failed write never leaves a partial snapshot behind.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod hash;
pub mod reader;
pub mod record;
pub mod sink;
pub mod writer;

pub use error::WriteError;
pub use hash::state_hash;
pub use reader::DirectoryReader;
pub use record::{FieldRecord, SnapshotRecord};
pub use sink::{MemorySink, SnapshotSink};
pub use writer::{snapshot_file_name, DirectoryWriter};
