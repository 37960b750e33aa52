//! Post-update value validation.

use drift_core::NumericalError;
use ndarray::ArrayViewD;

use crate::field::Domain;

/// Check every entry of `values` against `domain`.
///
/// Reports the first offending entry in row-major order.
pub fn check_values(path: &str, values: ArrayViewD<'_, f64>, domain: Domain) -> Result<(), NumericalError> {
    for (index, &v) in values.iter().enumerate() {
        if !v.is_finite() {
            return Err(NumericalError::NonFinite {
                path: path.to_string(),
                index,
            });
        }
        if domain == Domain::NonNegative && v < 0.0 {
            return Err(NumericalError::Negative {
                path: path.to_string(),
                index,
                value: v,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn finite_values_pass() {
        let a = arr2(&[[1.0, -2.0], [0.0, 3.0]]).into_dyn();
        assert!(check_values("x", a.view(), Domain::Real).is_ok());
    }

    #[test]
    fn nan_reported_with_flat_index() {
        let a = arr2(&[[1.0, 2.0], [f64::NAN, 3.0]]).into_dyn();
        assert_eq!(
            check_values("dust.Sigma", a.view(), Domain::Real),
            Err(NumericalError::NonFinite {
                path: "dust.Sigma".into(),
                index: 2
            })
        );
    }

    #[test]
    fn negative_only_fails_non_negative_domain() {
        let a = arr2(&[[1.0, -0.5]]).into_dyn();
        assert!(check_values("gas.v.rad", a.view(), Domain::Real).is_ok());
        let err = check_values("gas.Sigma", a.view(), Domain::NonNegative).unwrap_err();
        assert_eq!(err.path(), "gas.Sigma");
        assert!(matches!(err, NumericalError::Negative { index: 1, .. }));
    }

    #[test]
    fn infinity_and_negative_zero() {
        let a = arr2(&[[-0.0, f64::INFINITY]]).into_dyn();
        let err = check_values("x", a.view(), Domain::NonNegative).unwrap_err();
        assert!(matches!(err, NumericalError::NonFinite { index: 1, .. }));
    }
}
