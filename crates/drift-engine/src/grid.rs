//! Logarithmic radial and mass grids.

use drift_core::Constants;
use drift_frame::ndarray::{s, Array1, Zip};

use crate::config::GridConfig;

/// Radial cell edges, centers and annulus areas, plus the particle mass grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    /// Cell edges \[cm\] (`Nr + 1`).
    pub ri: Array1<f64>,
    /// Cell centers \[cm\] (`Nr`), the midpoints of the edges.
    pub r: Array1<f64>,
    /// Annulus area of each cell \[cm²\] (`Nr`).
    pub area: Array1<f64>,
    /// Particle masses \[g\] (`Nm`).
    pub m: Array1<f64>,
}

impl Grid {
    /// Build the grids from a validated configuration.
    pub fn new(config: &GridConfig, constants: &Constants) -> Self {
        let au = constants.au;
        let ri = Array1::logspace(
            10.0,
            (config.rmin * au).log10(),
            (config.rmax * au).log10(),
            config.radial_cells + 1,
        );
        let r = Zip::from(ri.slice(s![..-1]))
            .and(ri.slice(s![1..]))
            .map_collect(|&lo, &hi| 0.5 * (lo + hi));
        let area = Zip::from(ri.slice(s![..-1]))
            .and(ri.slice(s![1..]))
            .map_collect(|&lo, &hi| std::f64::consts::PI * (hi * hi - lo * lo));
        let m = Array1::logspace(
            10.0,
            config.mmin.log10(),
            config.mmax.log10(),
            mass_bins(config),
        );
        Self { ri, r, area, m }
    }

    /// Number of radial cells.
    pub fn nr(&self) -> usize {
        self.r.len()
    }

    /// Number of mass bins.
    pub fn nm(&self) -> usize {
        self.m.len()
    }
}

/// `Nm = ⌊bins_per_decade · log10(mmax / mmin)⌋ + 1`.
pub fn mass_bins(config: &GridConfig) -> usize {
    let decades = config.mmax.log10() - config.mmin.log10();
    // whole decades must not lose a bin to rounding in log10
    (config.mass_bins_per_decade as f64 * decades + 1e-9).floor() as usize + 1
}
