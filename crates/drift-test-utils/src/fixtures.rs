//! Reusable scheme test fixtures.
//!
//! - [`IdentityScheme`]: leaves its target unchanged.
//! - [`ConstScheme`]: writes a constant value.
//! - [`ScaleScheme`]: exponential growth, optionally interior cells only.
//! - [`FailingScheme`]: fails deterministically after N calls.
//! - [`NanScheme`]: injects a NaN after N calls.

use std::sync::atomic::{AtomicUsize, Ordering};

use drift_core::SchemeError;
use drift_frame::ndarray::{Axis, Slice};
use drift_integrator::{AdvanceContext, Method, Scheme};

/// Leaves the target untouched.
///
/// Useful when a run needs one enabled instruction but nothing may change.
pub struct IdentityScheme {
    pub name: String,
}

impl IdentityScheme {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Scheme for IdentityScheme {
    fn name(&self) -> &str {
        &self.name
    }

    fn method(&self) -> Method {
        Method::Explicit
    }

    fn advance(&self, _ctx: &mut AdvanceContext<'_>) -> Result<(), SchemeError> {
        Ok(())
    }
}

/// Writes a constant value to every entry of the target.
pub struct ConstScheme {
    pub name: String,
    pub value: f64,
}

impl ConstScheme {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl Scheme for ConstScheme {
    fn name(&self) -> &str {
        &self.name
    }

    fn method(&self) -> Method {
        Method::Explicit
    }

    fn advance(&self, ctx: &mut AdvanceContext<'_>) -> Result<(), SchemeError> {
        ctx.target_mut()?.fill(self.value);
        Ok(())
    }
}

/// Multiplies the target by `1 + rate * dt` each step.
///
/// With [`interior`](ScaleScheme::interior) set, the first and last `k`
/// entries along axis 0 are left alone, as a transport scheme with fixed
/// boundary cells would.
pub struct ScaleScheme {
    pub name: String,
    pub rate: f64,
    pub boundary: usize,
}

impl ScaleScheme {
    pub fn new(name: impl Into<String>, rate: f64) -> Self {
        Self {
            name: name.into(),
            rate,
            boundary: 0,
        }
    }

    /// Skip `k` cells at each end of axis 0.
    pub fn interior(mut self, k: usize) -> Self {
        self.boundary = k;
        self
    }
}

impl Scheme for ScaleScheme {
    fn name(&self) -> &str {
        &self.name
    }

    fn method(&self) -> Method {
        Method::Explicit
    }

    fn advance(&self, ctx: &mut AdvanceContext<'_>) -> Result<(), SchemeError> {
        let factor = 1.0 + self.rate * ctx.dt();
        let k = self.boundary;
        let mut target = ctx.target_mut()?;
        if target.ndim() == 0 {
            target.mapv_inplace(|v| v * factor);
            return Ok(());
        }
        let n = target.len_of(Axis(0));
        if n <= 2 * k {
            return Ok(());
        }
        target
            .slice_axis_mut(Axis(0), Slice::from(k..n - k))
            .mapv_inplace(|v| v * factor);
        Ok(())
    }
}

/// Succeeds `succeed_count` times (writing the call index), then fails.
///
/// Uses `AtomicUsize` for the call counter so it satisfies `Send`.
pub struct FailingScheme {
    pub name: String,
    pub succeed_count: usize,
    call_count: AtomicUsize,
}

impl FailingScheme {
    pub fn new(name: impl Into<String>, succeed_count: usize) -> Self {
        Self {
            name: name.into(),
            succeed_count,
            call_count: AtomicUsize::new(0),
        }
    }

    /// How many times `advance()` has been called.
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Scheme for FailingScheme {
    fn name(&self) -> &str {
        &self.name
    }

    fn method(&self) -> Method {
        Method::Implicit
    }

    fn advance(&self, ctx: &mut AdvanceContext<'_>) -> Result<(), SchemeError> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed);
        if n >= self.succeed_count {
            return Err(SchemeError::Failed {
                reason: format!(
                    "deliberate failure after {} successful calls",
                    self.succeed_count
                ),
            });
        }
        ctx.target_mut()?.fill(n as f64);
        Ok(())
    }
}

/// Leaves the target alone `clean_steps` times, then writes a NaN into
/// its first entry.
pub struct NanScheme {
    pub name: String,
    pub clean_steps: usize,
    call_count: AtomicUsize,
}

impl NanScheme {
    pub fn new(name: impl Into<String>, clean_steps: usize) -> Self {
        Self {
            name: name.into(),
            clean_steps,
            call_count: AtomicUsize::new(0),
        }
    }
}

impl Scheme for NanScheme {
    fn name(&self) -> &str {
        &self.name
    }

    fn method(&self) -> Method {
        Method::Explicit
    }

    fn advance(&self, ctx: &mut AdvanceContext<'_>) -> Result<(), SchemeError> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed);
        if n >= self.clean_steps {
            if let Some(first) = ctx.target_mut()?.iter_mut().next() {
                *first = f64::NAN;
            }
        }
        Ok(())
    }
}
