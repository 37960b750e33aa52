//! A snapshot sink that stays readable after being handed to a simulation.

use std::sync::{Arc, Mutex, PoisonError};

use drift_snapshot::{SnapshotRecord, SnapshotSink, WriteError};

/// Clones share one record list, so a test keeps a handle while the
/// simulation owns the boxed sink.
#[derive(Clone, Debug, Default)]
pub struct SharedSink {
    records: Arc<Mutex<Vec<SnapshotRecord>>>,
}

impl SharedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record written so far, in write order.
    pub fn records(&self) -> Vec<SnapshotRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `(index, time)` of every record.
    pub fn stamps(&self) -> Vec<(u32, f64)> {
        self.records()
            .iter()
            .map(|r| (r.snapshot_index().0, r.time))
            .collect()
    }
}

impl SnapshotSink for SharedSink {
    fn prepare(&mut self) -> Result<(), WriteError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }

    fn write(&mut self, record: &SnapshotRecord) -> Result<(), WriteError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    fn written(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
