//! Error types for the drift engine.
//!
//! Organized by layer: field-tree access ([`FrameError`]), value
//! validation ([`NumericalError`]), updater output ([`ComputeError`]),
//! update-graph evaluation ([`UpdateError`]) and scheme execution
//! ([`SchemeError`]). Every error maps onto one [`ErrorKind`].

use thiserror::Error;

/// Coarse error classification shared by every layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid grid, initial-condition or run parameter. Raised at INIT.
    Configuration,
    /// A required field is missing or has the wrong shape.
    Dependency,
    /// A value became non-finite or physically impossible.
    Numerical,
    /// The snapshot writer could not persist state.
    Io,
}

/// Errors from field-tree access and mutation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The path is syntactically invalid.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The offending path.
        path: String,
        /// What is wrong with it.
        reason: String,
    },
    /// Nothing exists at the path.
    #[error("no field or group at '{path}'")]
    PathNotFound {
        /// The missing path.
        path: String,
    },
    /// The path names a group where a field was expected.
    #[error("'{path}' is a group, not a field")]
    NotAField {
        /// The offending path.
        path: String,
    },
    /// The path names a field where a group was expected.
    #[error("'{path}' is a field, not a group")]
    NotAGroup {
        /// The offending path.
        path: String,
    },
    /// A child with this name already exists in the group.
    #[error("group '{group}' already contains '{name}'")]
    DuplicateName {
        /// The parent group.
        group: String,
        /// The clashing child name.
        name: String,
    },
    /// A replacement value does not match the field's declared shape.
    #[error("shape mismatch for '{path}': expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// The field being assigned.
        path: String,
        /// The declared shape.
        expected: Vec<usize>,
        /// The shape of the rejected value.
        found: Vec<usize>,
    },
    /// An update-chain entry does not resolve to a descendant of its group.
    #[error("update chain of '{group}' references unknown child '{entry}'")]
    UnknownChainEntry {
        /// The group whose chain was being set.
        group: String,
        /// The unresolved entry.
        entry: String,
    },
}

impl FrameError {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Dependency
    }
}

/// A field holds values the engine cannot continue from.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum NumericalError {
    /// NaN or infinity.
    #[error("non-finite value in '{path}' at flat index {index}")]
    NonFinite {
        /// The field containing the value.
        path: String,
        /// Flat (row-major) index of the first offending entry.
        index: usize,
    },
    /// A negative entry in a field declared non-negative.
    #[error("negative value {value} in '{path}' at flat index {index}")]
    Negative {
        /// The field containing the value.
        path: String,
        /// Flat (row-major) index of the first offending entry.
        index: usize,
        /// The offending value.
        value: f64,
    },
}

impl NumericalError {
    /// The field the error refers to.
    pub fn path(&self) -> &str {
        match self {
            Self::NonFinite { path, .. } | Self::Negative { path, .. } => path,
        }
    }
}

/// Failure returned by an updater function.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ComputeError {
    /// An upstream field could not be read.
    #[error(transparent)]
    Frame(#[from] FrameError),
    /// The updater rejected its inputs.
    #[error("{0}")]
    Invalid(String),
}

/// Errors raised while evaluating update chains or phase hooks.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum UpdateError {
    /// An updater could not read its inputs, or returned a value of the
    /// wrong shape.
    #[error("updating '{field}': {source}")]
    Dependency {
        /// The field being recomputed.
        field: String,
        /// The underlying access error.
        #[source]
        source: FrameError,
    },
    /// A direct tree access (typically from a hook) failed.
    #[error(transparent)]
    Frame(#[from] FrameError),
    /// A recomputed value failed validation.
    #[error(transparent)]
    Numerical(#[from] NumericalError),
    /// An updater reported a domain-specific failure.
    #[error("updating '{field}': {reason}")]
    Failed {
        /// The field being recomputed.
        field: String,
        /// Reason given by the updater.
        reason: String,
    },
}

impl UpdateError {
    /// Wrap an updater failure with the path of the field being recomputed.
    pub fn from_compute(field: &str, err: ComputeError) -> Self {
        match err {
            ComputeError::Frame(source) => Self::Dependency {
                field: field.to_string(),
                source,
            },
            ComputeError::Invalid(reason) => Self::Failed {
                field: field.to_string(),
                reason,
            },
        }
    }

    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Dependency { .. } | Self::Frame(_) => ErrorKind::Dependency,
            Self::Numerical(_) | Self::Failed { .. } => ErrorKind::Numerical,
        }
    }
}

/// Errors returned by an integration scheme's `advance()`.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SchemeError {
    /// A field the scheme reads or writes is unavailable.
    #[error(transparent)]
    Frame(#[from] FrameError),
    /// Re-deriving dependent fields inside the scheme failed.
    #[error(transparent)]
    Update(#[from] UpdateError),
    /// The advanced state failed validation.
    #[error(transparent)]
    Numerical(#[from] NumericalError),
    /// The scheme itself failed (e.g. a solver did not converge).
    #[error("scheme failed: {reason}")]
    Failed {
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl SchemeError {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Frame(e) => e.kind(),
            Self::Update(e) => e.kind(),
            Self::Numerical(_) | Self::Failed { .. } => ErrorKind::Numerical,
        }
    }
}
