//! Coefficient pairs and their packing into the `AB` field.
//!
//! The bulk model packs into `(2, Nr)`: row 0 is `A`, row 1 is `B`. The
//! vertical-structure model packs into `(2 (Nm + 1), Nr)` with rows
//! `[A_0 .. A_{Nm-1}, A_gas, B_0 .. B_{Nm-1}, B_gas]`.

use drift_core::ComputeError;
use drift_frame::ndarray::{s, Array1, Array2, ArrayView2, Axis};

/// One `(A, B)` pair per radius.
#[derive(Clone, Debug, PartialEq)]
pub struct BulkCoefficients {
    /// Coefficient A (`Nr`).
    pub a: Array1<f64>,
    /// Coefficient B (`Nr`).
    pub b: Array1<f64>,
}

impl BulkCoefficients {
    /// The dust-free limit: `A = 1`, `B = 0`.
    pub fn uncoupled(nr: usize) -> Self {
        Self {
            a: Array1::ones(nr),
            b: Array1::zeros(nr),
        }
    }

    /// Pack into the `(2, Nr)` layout.
    pub fn pack(&self, nr: usize) -> Result<Array2<f64>, ComputeError> {
        check_len("A", self.a.len(), nr)?;
        check_len("B", self.b.len(), nr)?;
        let mut ab = Array2::zeros((2, nr));
        ab.row_mut(0).assign(&self.a);
        ab.row_mut(1).assign(&self.b);
        Ok(ab)
    }

    /// Inverse of [`pack`](Self::pack). `ab` must have exactly two rows.
    pub fn unpack(ab: ArrayView2<'_, f64>) -> Result<Self, ComputeError> {
        let rows = ab.nrows();
        if rows != 2 {
            return Err(ComputeError::Invalid(format!(
                "bulk AB has {rows} rows, expected 2"
            )));
        }
        Ok(Self {
            a: ab.row(0).to_owned(),
            b: ab.row(1).to_owned(),
        })
    }
}

/// One `(A, B)` pair per radius and species, plus the pair used for
/// gas-affecting terms.
#[derive(Clone, Debug, PartialEq)]
pub struct VerticalCoefficients {
    /// Per-species coefficient A (`Nr × Nm`).
    pub a: Array2<f64>,
    /// Per-species coefficient B (`Nr × Nm`).
    pub b: Array2<f64>,
    /// Gas coefficient A (`Nr`).
    pub gas_a: Array1<f64>,
    /// Gas coefficient B (`Nr`).
    pub gas_b: Array1<f64>,
}

impl VerticalCoefficients {
    /// The dust-free limit: every `A = 1`, every `B = 0`.
    pub fn uncoupled(nr: usize, nm: usize) -> Self {
        Self {
            a: Array2::ones((nr, nm)),
            b: Array2::zeros((nr, nm)),
            gas_a: Array1::ones(nr),
            gas_b: Array1::zeros(nr),
        }
    }

    /// Pack into the `(2 (Nm + 1), Nr)` layout.
    pub fn pack(&self, nr: usize, nm: usize) -> Result<Array2<f64>, ComputeError> {
        check_dim("A", self.a.dim(), (nr, nm))?;
        check_dim("B", self.b.dim(), (nr, nm))?;
        check_len("gas A", self.gas_a.len(), nr)?;
        check_len("gas B", self.gas_b.len(), nr)?;
        let mut ab = Array2::zeros((2 * (nm + 1), nr));
        ab.slice_mut(s![0..nm, ..]).assign(&self.a.t());
        ab.row_mut(nm).assign(&self.gas_a);
        ab.slice_mut(s![nm + 1..2 * nm + 1, ..]).assign(&self.b.t());
        ab.row_mut(2 * nm + 1).assign(&self.gas_b);
        Ok(ab)
    }

    /// Inverse of [`pack`](Self::pack). `ab` must have a nonzero even
    /// number of rows.
    pub fn unpack(ab: ArrayView2<'_, f64>) -> Result<Self, ComputeError> {
        let rows = ab.len_of(Axis(0));
        if rows < 2 || rows % 2 != 0 {
            return Err(ComputeError::Invalid(format!(
                "vertical AB has {rows} rows, expected 2 (Nm + 1)"
            )));
        }
        let nm = rows / 2 - 1;
        Ok(Self {
            a: ab.slice(s![0..nm, ..]).t().to_owned(),
            b: ab.slice(s![nm + 1..2 * nm + 1, ..]).t().to_owned(),
            gas_a: ab.row(nm).to_owned(),
            gas_b: ab.row(2 * nm + 1).to_owned(),
        })
    }
}

fn check_len(what: &str, found: usize, nr: usize) -> Result<(), ComputeError> {
    if found == nr {
        Ok(())
    } else {
        Err(ComputeError::Invalid(format!(
            "back-reaction coefficient {what} has {found} entries, expected {nr}"
        )))
    }
}

fn check_dim(what: &str, found: (usize, usize), expected: (usize, usize)) -> Result<(), ComputeError> {
    if found == expected {
        Ok(())
    } else {
        Err(ComputeError::Invalid(format!(
            "back-reaction coefficient {what} has shape {found:?}, expected {expected:?}"
        )))
    }
}
