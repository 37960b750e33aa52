//! Backward Euler relaxation toward an equilibrium.
//!
//! Solves `dy/dt = (y_eq - y) / tau` implicitly:
//! `y' = (y + dt * y_eq / tau) / (1 + dt / tau)`. Stable for every
//! `dt > 0`, so the scheme imposes no step limit.

use drift_core::{FieldPath, FrameError, SchemeError};
use drift_frame::ndarray::Zip;
use drift_integrator::{AdvanceContext, Method, Scheme};

/// Implicit relaxation of the target toward `equilibrium` on `timescale`.
#[derive(Debug)]
pub struct ImplicitRelaxation {
    name: String,
    equilibrium: FieldPath,
    timescale: FieldPath,
}

impl ImplicitRelaxation {
    /// Create a scheme reading the equilibrium and timescale fields.
    pub fn new(name: impl Into<String>, equilibrium: &str, timescale: &str) -> Result<Self, FrameError> {
        Ok(Self {
            name: name.into(),
            equilibrium: FieldPath::parse(equilibrium)?,
            timescale: FieldPath::parse(timescale)?,
        })
    }
}

impl Scheme for ImplicitRelaxation {
    fn name(&self) -> &str {
        &self.name
    }

    fn method(&self) -> Method {
        Method::Implicit
    }

    fn reads(&self) -> Vec<FieldPath> {
        vec![self.equilibrium.clone(), self.timescale.clone()]
    }

    fn advance(&self, ctx: &mut AdvanceContext<'_>) -> Result<(), SchemeError> {
        let dt = ctx.dt();
        let eq = ctx.frame().get(self.equilibrium.as_str())?.clone();
        let tau = ctx.frame().get(self.timescale.as_str())?.clone();
        if let Some(bad) = tau.iter().find(|t| !(**t > 0.0)) {
            return Err(SchemeError::Failed {
                reason: format!("timescale '{}' must be positive, found {bad}", self.timescale),
            });
        }

        let mut y = ctx.target_mut()?;
        let mismatch = |path: &FieldPath, found: &[usize], expected: &[usize]| FrameError::ShapeMismatch {
            path: path.as_str().to_string(),
            expected: expected.to_vec(),
            found: found.to_vec(),
        };
        let dim = y.raw_dim();
        let eq_b = eq
            .broadcast(dim.clone())
            .ok_or_else(|| mismatch(&self.equilibrium, eq.shape(), y.shape()))?;
        let tau_b = tau
            .broadcast(dim)
            .ok_or_else(|| mismatch(&self.timescale, tau.shape(), y.shape()))?;
        Zip::from(&mut y)
            .and(&eq_b)
            .and(&tau_b)
            .for_each(|y, &e, &t| *y = (*y + dt * e / t) / (1.0 + dt / t));
        Ok(())
    }
}
