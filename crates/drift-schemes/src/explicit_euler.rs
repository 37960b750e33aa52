//! Forward Euler from a derivative field.
//!
//! # Semantics
//!
//! - Reads the derivative field (same shape as the target, or
//!   broadcastable to it).
//! - Writes `y + dt * dydt` into the target.
//! - With [`ExplicitEuler::max_relative_change`], limits `dt` so that no
//!   entry changes by more than the given fraction of its magnitude.
//!
//! ```
//! use drift_schemes::ExplicitEuler;
//! use drift_integrator::{Method, Scheme};
//!
//! let s = ExplicitEuler::new("gas", "gas.dSigma").unwrap().max_relative_change(0.1);
//! assert_eq!(s.method(), Method::Explicit);
//! ```

use drift_core::{FieldPath, FrameError, SchemeError};
use drift_frame::ndarray::Zip;
use drift_frame::Frame;
use drift_integrator::{AdvanceContext, Method, Scheme};

/// Explicit first-order step from a derivative field.
#[derive(Debug)]
pub struct ExplicitEuler {
    name: String,
    derivative: FieldPath,
    max_change: Option<f64>,
}

impl ExplicitEuler {
    /// Create a scheme reading the time derivative from `derivative`.
    pub fn new(name: impl Into<String>, derivative: &str) -> Result<Self, FrameError> {
        Ok(Self {
            name: name.into(),
            derivative: FieldPath::parse(derivative)?,
            max_change: None,
        })
    }

    /// Limit each step to a relative change of `fraction` per entry.
    pub fn max_relative_change(mut self, fraction: f64) -> Self {
        self.max_change = Some(fraction);
        self
    }
}

impl Scheme for ExplicitEuler {
    fn name(&self) -> &str {
        &self.name
    }

    fn method(&self) -> Method {
        Method::Explicit
    }

    fn reads(&self) -> Vec<FieldPath> {
        vec![self.derivative.clone()]
    }

    fn max_dt(&self, frame: &Frame, target: &FieldPath) -> Option<f64> {
        let fraction = self.max_change?;
        let y = frame.get(target.as_str()).ok()?;
        let dydt = frame.get(self.derivative.as_str()).ok()?;
        let dydt = dydt.broadcast(y.raw_dim())?;
        let mut limit = f64::INFINITY;
        Zip::from(y).and(&dydt).for_each(|&y, &d| {
            if d != 0.0 && y != 0.0 {
                limit = limit.min(fraction * y.abs() / d.abs());
            }
        });
        limit.is_finite().then_some(limit)
    }

    fn advance(&self, ctx: &mut AdvanceContext<'_>) -> Result<(), SchemeError> {
        let dt = ctx.dt();
        let dydt = ctx.frame().get(self.derivative.as_str())?.clone();
        let mut y = ctx.target_mut()?;
        let dydt = dydt
            .broadcast(y.raw_dim())
            .ok_or_else(|| FrameError::ShapeMismatch {
                path: self.derivative.as_str().to_string(),
                expected: y.shape().to_vec(),
                found: dydt.shape().to_vec(),
            })?;
        Zip::from(&mut y).and(&dydt).for_each(|y, &d| *y += dt * d);
        Ok(())
    }
}
