//! Error types for snapshot persistence.

use std::io;
use std::path::PathBuf;

use drift_core::ErrorKind;
use thiserror::Error;

/// Errors raised while preparing, writing or reading snapshots.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The filesystem refused an operation.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// The output directory already holds snapshots and overwrite is off.
    #[error("output directory {} already holds {count} snapshot(s); enable overwrite to replace them", path.display())]
    DirectoryPopulated {
        /// The output directory.
        path: PathBuf,
        /// Number of existing snapshot files.
        count: usize,
    },
    /// A record could not be encoded or decoded.
    #[error("serialization error at {}: {source}", path.display())]
    Serialization {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// A decoded record is internally inconsistent.
    #[error("malformed snapshot {}: {detail}", path.display())]
    Malformed {
        /// The file involved.
        path: PathBuf,
        /// What is wrong with it.
        detail: String,
    },
}

impl WriteError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Io
    }
}
