//! Gas and dust state handed to a coefficient model.

use drift_core::{layout, ComputeError, FrameError};
use drift_frame::ndarray::{Array1, Array2, Ix1, Ix2};
use drift_frame::Frame;

/// Per-radius gas state and per-radius, per-species dust state.
#[derive(Clone, Debug, PartialEq)]
pub struct BackreactionInputs {
    /// Gas surface density (`Nr`).
    pub gas_sigma: Array1<f64>,
    /// Gas sound speed (`Nr`).
    pub gas_cs: Array1<f64>,
    /// Gas kinematic viscosity (`Nr`).
    pub gas_nu: Array1<f64>,
    /// Dust surface density (`Nr × Nm`).
    pub dust_sigma: Array2<f64>,
    /// Stokes number (`Nr × Nm`).
    pub dust_stokes: Array2<f64>,
}

fn mismatch(path: &str, expected: Vec<usize>, found: &[usize]) -> ComputeError {
    ComputeError::Frame(FrameError::ShapeMismatch {
        path: path.to_string(),
        expected,
        found: found.to_vec(),
    })
}

fn vector(frame: &Frame, path: &str, nr: usize) -> Result<Array1<f64>, ComputeError> {
    let value = frame.get(path)?;
    match value.view().into_dimensionality::<Ix1>() {
        Ok(v) if v.len() == nr => Ok(v.to_owned()),
        _ => Err(mismatch(path, vec![nr], value.shape())),
    }
}

fn matrix(frame: &Frame, path: &str, nr: usize) -> Result<Array2<f64>, ComputeError> {
    let value = frame.get(path)?;
    match value.view().into_dimensionality::<Ix2>() {
        Ok(v) if v.nrows() == nr => Ok(v.to_owned()),
        _ => Err(mismatch(path, vec![nr, 0], value.shape())),
    }
}

impl BackreactionInputs {
    /// Read the inputs from the standard field tree.
    pub fn gather(frame: &Frame) -> Result<Self, ComputeError> {
        let nr = frame.get(layout::GAS_SIGMA)?.len();
        let inputs = Self {
            gas_sigma: vector(frame, layout::GAS_SIGMA, nr)?,
            gas_cs: vector(frame, layout::GAS_CS, nr)?,
            gas_nu: vector(frame, layout::GAS_NU, nr)?,
            dust_sigma: matrix(frame, layout::DUST_SIGMA, nr)?,
            dust_stokes: matrix(frame, layout::DUST_ST, nr)?,
        };
        if inputs.dust_stokes.dim() != inputs.dust_sigma.dim() {
            return Err(mismatch(
                layout::DUST_ST,
                inputs.dust_sigma.shape().to_vec(),
                inputs.dust_stokes.shape(),
            ));
        }
        Ok(inputs)
    }

    /// Number of radial cells.
    pub fn nr(&self) -> usize {
        self.gas_sigma.len()
    }

    /// Number of dust species.
    pub fn nm(&self) -> usize {
        self.dust_sigma.ncols()
    }

    /// Local vertically integrated dust-to-gas ratio (`Nr`).
    pub fn dust_to_gas(&self) -> Array1<f64> {
        let dust = self.dust_sigma.sum_axis(drift_frame::ndarray::Axis(1));
        dust / &self.gas_sigma
    }
}
