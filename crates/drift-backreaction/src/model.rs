//! Coefficient model traits.
//!
//! Implementors own the closed-form physics. Both traits are implemented
//! for plain closures of the matching signature.

use drift_core::ComputeError;

use crate::coefficients::{BulkCoefficients, VerticalCoefficients};
use crate::inputs::BackreactionInputs;

/// Aggregates all species into one `(A, B)` pair per radius, assuming a
/// vertically uniform dust-to-gas ratio.
pub trait BulkModel: Send + Sync {
    /// Compute the coefficients for the current state.
    fn coefficients(&self, inputs: &BackreactionInputs) -> Result<BulkCoefficients, ComputeError>;
}

/// Accounts for settling-stratified dust: one pair per radius and
/// species, plus the pair used for gas terms.
pub trait VerticalModel: Send + Sync {
    /// Compute the coefficients for the current state.
    fn coefficients(&self, inputs: &BackreactionInputs) -> Result<VerticalCoefficients, ComputeError>;
}

impl<F> BulkModel for F
where
    F: Fn(&BackreactionInputs) -> Result<BulkCoefficients, ComputeError> + Send + Sync,
{
    fn coefficients(&self, inputs: &BackreactionInputs) -> Result<BulkCoefficients, ComputeError> {
        self(inputs)
    }
}

impl<F> VerticalModel for F
where
    F: Fn(&BackreactionInputs) -> Result<VerticalCoefficients, ComputeError> + Send + Sync,
{
    fn coefficients(&self, inputs: &BackreactionInputs) -> Result<VerticalCoefficients, ComputeError> {
        self(inputs)
    }
}

/// The dust-free limit (`A = 1`, `B = 0`) regardless of the dust state.
#[derive(Clone, Copy, Debug, Default)]
pub struct Uncoupled;

impl BulkModel for Uncoupled {
    fn coefficients(&self, inputs: &BackreactionInputs) -> Result<BulkCoefficients, ComputeError> {
        Ok(BulkCoefficients::uncoupled(inputs.nr()))
    }
}

impl VerticalModel for Uncoupled {
    fn coefficients(&self, inputs: &BackreactionInputs) -> Result<VerticalCoefficients, ComputeError> {
        Ok(VerticalCoefficients::uncoupled(inputs.nr(), inputs.nm()))
    }
}
