//! Fields: named arrays with an optional recomputation function.

use std::fmt;
use std::sync::Arc;

use drift_core::{ComputeError, FrameError};
use ndarray::ArrayD;

use crate::frame::Frame;

/// A recomputation function: a pure function of the current frame.
///
/// Updaters must not keep hidden state between calls; calling
/// [`Frame::update()`] twice without intervening mutation must produce
/// identical values.
pub type UpdateFn = Arc<dyn Fn(&Frame) -> Result<ArrayD<f64>, ComputeError> + Send + Sync>;

/// How a field obtains its value during an update pass.
#[derive(Clone, Default)]
pub enum Updater {
    /// Recompute from the current state whenever the field is visited.
    Computed(UpdateFn),
    /// Keep the last explicitly assigned value.
    #[default]
    Frozen,
}

impl Updater {
    /// Wrap a closure as a computed updater.
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Frame) -> Result<ArrayD<f64>, ComputeError> + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(f))
    }

    /// Whether this is [`Updater::Frozen`].
    pub fn is_frozen(&self) -> bool {
        matches!(self, Self::Frozen)
    }
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Computed(_) => write!(f, "Computed(..)"),
            Self::Frozen => write!(f, "Frozen"),
        }
    }
}

/// Admissible value range of a field, checked after every recomputation
/// and every integration instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Domain {
    /// Any finite value.
    #[default]
    Real,
    /// Finite and `>= 0` (densities, temperatures).
    NonNegative,
}

/// A named n-dimensional value owned by its parent group.
#[derive(Clone, Debug)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) value: ArrayD<f64>,
    pub(crate) description: String,
    pub(crate) updater: Updater,
    pub(crate) domain: Domain,
}

impl Field {
    pub(crate) fn new(name: &str, value: ArrayD<f64>, description: &str) -> Self {
        Self {
            name: name.to_string(),
            value,
            description: description.to_string(),
            updater: Updater::Frozen,
            domain: Domain::Real,
        }
    }

    /// Name within the parent group.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value.
    pub fn value(&self) -> &ArrayD<f64> {
        &self.value
    }

    /// Declared shape, fixed at creation.
    pub fn shape(&self) -> &[usize] {
        self.value.shape()
    }

    /// Free-form description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Current updater.
    pub fn updater(&self) -> &Updater {
        &self.updater
    }

    /// Whether the field keeps its value across update passes.
    pub fn is_frozen(&self) -> bool {
        self.updater.is_frozen()
    }

    /// Admissible value range.
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Replace the value, rejecting a shape change.
    pub(crate) fn assign(&mut self, path: &str, value: ArrayD<f64>) -> Result<(), FrameError> {
        if value.shape() != self.value.shape() {
            return Err(FrameError::ShapeMismatch {
                path: path.to_string(),
                expected: self.value.shape().to_vec(),
                found: value.shape().to_vec(),
            });
        }
        self.value = value;
        Ok(())
    }
}
