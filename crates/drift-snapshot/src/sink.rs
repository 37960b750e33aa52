//! The [`SnapshotSink`] trait and an in-memory sink.

use crate::error::WriteError;
use crate::record::SnapshotRecord;

/// Destination for snapshot records.
///
/// Writing is a blocking call on the run loop; nothing else proceeds
/// while a snapshot is being persisted.
pub trait SnapshotSink: Send {
    /// Ready the destination before the first write of a run.
    fn prepare(&mut self) -> Result<(), WriteError>;

    /// Persist one record. Either the whole record is stored or none of it.
    fn write(&mut self, record: &SnapshotRecord) -> Result<(), WriteError>;

    /// Number of records persisted so far.
    fn written(&self) -> usize;
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<SnapshotRecord>,
}

impl MemorySink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records in write order.
    pub fn records(&self) -> &[SnapshotRecord] {
        &self.records
    }

    /// The most recent record.
    pub fn last(&self) -> Option<&SnapshotRecord> {
        self.records.last()
    }
}

impl SnapshotSink for MemorySink {
    fn prepare(&mut self) -> Result<(), WriteError> {
        self.records.clear();
        Ok(())
    }

    fn write(&mut self, record: &SnapshotRecord) -> Result<(), WriteError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn written(&self) -> usize {
        self.records.len()
    }
}
