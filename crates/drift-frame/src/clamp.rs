//! Floor clamping of sub-floor densities.
//!
//! Clamping is a recoverable policy, not an error: an entry at or below
//! its floor is raised to `FLOOR_FRACTION * floor`, anything above the
//! floor is left untouched.

use drift_core::FrameError;
use ndarray::{ArrayViewD, ArrayViewMutD, Zip};

/// Fraction of the floor a clamped entry is set to.
pub const FLOOR_FRACTION: f64 = 0.1;

/// Clamp `values` against `floor`, broadcasting the floor if needed.
///
/// Returns the number of entries changed.
pub fn clamp_to_floor(
    path: &str,
    values: ArrayViewMutD<'_, f64>,
    floor: ArrayViewD<'_, f64>,
) -> Result<usize, FrameError> {
    let floor = floor
        .broadcast(values.raw_dim())
        .ok_or_else(|| FrameError::ShapeMismatch {
            path: path.to_string(),
            expected: values.shape().to_vec(),
            found: floor.shape().to_vec(),
        })?;
    let mut changed = 0;
    Zip::from(values).and(&floor).for_each(|v, &f| {
        if *v <= f {
            *v = FLOOR_FRACTION * f;
            changed += 1;
        }
    });
    Ok(changed)
}
