//! Reading snapshots back from a directory.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::WriteError;
use crate::record::SnapshotRecord;
use crate::writer::{snapshot_file_name, snapshot_files};

/// Lists and loads the snapshots of one output directory.
#[derive(Debug, Clone)]
pub struct DirectoryReader {
    datadir: PathBuf,
}

impl DirectoryReader {
    /// Open an existing output directory.
    pub fn open(datadir: impl Into<PathBuf>) -> Result<Self, WriteError> {
        let datadir = datadir.into();
        if !datadir.is_dir() {
            return Err(WriteError::io(
                &datadir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            ));
        }
        Ok(Self { datadir })
    }

    /// The output directory.
    pub fn datadir(&self) -> &Path {
        &self.datadir
    }

    /// Snapshot indices present, in increasing order.
    pub fn indices(&self) -> Result<Vec<u32>, WriteError> {
        let mut out: Vec<u32> = snapshot_files(&self.datadir)?
            .into_iter()
            .filter_map(|(index, _)| index)
            .collect();
        out.sort_unstable();
        Ok(out)
    }

    /// Number of snapshots present.
    pub fn len(&self) -> Result<usize, WriteError> {
        Ok(self.indices()?.len())
    }

    /// Load one snapshot and check its internal consistency.
    pub fn load(&self, index: u32) -> Result<SnapshotRecord, WriteError> {
        let path = self.datadir.join(snapshot_file_name(index));
        let file = File::open(&path).map_err(|e| WriteError::io(&path, e))?;
        let record: SnapshotRecord =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| WriteError::Serialization {
                path: path.clone(),
                source,
            })?;
        if record.index != index {
            return Err(WriteError::Malformed {
                path,
                detail: format!("file holds index {}", record.index),
            });
        }
        if let Some(field) = record.first_inconsistent() {
            return Err(WriteError::Malformed {
                detail: format!(
                    "field '{}' has {} values for shape {:?}",
                    field.path,
                    field.data.len(),
                    field.shape
                ),
                path,
            });
        }
        Ok(record)
    }

    /// Load every snapshot in index order.
    pub fn load_all(&self) -> Result<Vec<SnapshotRecord>, WriteError> {
        self.indices()?.into_iter().map(|i| self.load(i)).collect()
    }

    /// The snapshot with the highest index, if any.
    pub fn latest(&self) -> Result<Option<SnapshotRecord>, WriteError> {
        match self.indices()?.last() {
            Some(&index) => self.load(index).map(Some),
            None => Ok(None),
        }
    }
}
