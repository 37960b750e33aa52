//! The [`Scheme`] trait and [`Method`] enum.
//!
//! Schemes are stateless operators that advance a single target field in
//! place. The discretization itself belongs to the implementor; the
//! pipeline only fixes the calling contract.

use drift_core::{FieldPath, SchemeError};
use drift_frame::Frame;

use crate::context::AdvanceContext;

/// Time-stepping family of a scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// Forward (explicit) time stepping.
    Explicit,
    /// Backward (implicit) time stepping.
    Implicit,
}

/// An external advance function for one physical subsystem.
///
/// # Contract
///
/// - `advance()` mutates only the target field, plus any fields it must
///   re-derive for the state to stay consistent for the next instruction.
/// - `&self`: schemes are stateless; everything persistent lives in the
///   frame.
/// - `reads()` is consulted once at validation, not per step.
///
/// # Examples
///
/// ```
/// use drift_core::SchemeError;
/// use drift_integrator::{AdvanceContext, Method, Scheme};
///
/// struct Decay(f64);
///
/// impl Scheme for Decay {
///     fn name(&self) -> &str { "decay" }
///     fn method(&self) -> Method { Method::Explicit }
///     fn advance(&self, ctx: &mut AdvanceContext<'_>) -> Result<(), SchemeError> {
///         let factor = 1.0 - self.0 * ctx.dt();
///         ctx.target_mut()?.mapv_inplace(|v| v * factor);
///         Ok(())
///     }
/// }
///
/// assert_eq!(Decay(0.5).method(), Method::Explicit);
/// ```
pub trait Scheme: Send + 'static {
    /// Human-readable name for error reporting and logging.
    fn name(&self) -> &str;

    /// Time-stepping family.
    fn method(&self) -> Method;

    /// Fields this scheme reads besides its target.
    ///
    /// Default: none.
    fn reads(&self) -> Vec<FieldPath> {
        Vec::new()
    }

    /// Largest stable step for the current state (e.g. a CFL limit).
    ///
    /// Return `None` to impose no constraint.
    fn max_dt(&self, _frame: &Frame, _target: &FieldPath) -> Option<f64> {
        None
    }

    /// Advance the target field by `ctx.dt()`.
    fn advance(&self, ctx: &mut AdvanceContext<'_>) -> Result<(), SchemeError>;
}
