//! Disk and run configuration, validation, and error types.
//!
//! [`DiskConfig`] is the input of [`initialize()`](crate::initialize);
//! [`RunConfig`] configures the run loop and the snapshot writer. Both
//! deserialize with `serde` (every key is optional and falls back to its
//! default) and are checked by `validate()` at INIT, before any field is
//! built or any file is touched.

use std::path::PathBuf;

use drift_core::{Constants, ErrorKind, FrameError, UpdateError};
use drift_integrator::PipelineError;
use serde::Deserialize;
use thiserror::Error;

/// Largest exponent of the gas taper `exp(-(r/rc)^(2-γ))` accepted at
/// `rmax`.
const MAX_TAPER_EXPONENT: f64 = 600.0;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while validating configuration or building the disk.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A key holds a value outside its accepted range.
    #[error("{key} = {value} is out of range (expected {expected})")]
    OutOfRange {
        /// Dotted key name.
        key: &'static str,
        /// The rejected value.
        value: f64,
        /// The accepted range.
        expected: &'static str,
    },
    /// A lower bound is not below its upper bound.
    #[error("{min_key} ({min}) must be smaller than {max_key} ({max})")]
    InvertedRange {
        /// Key of the lower bound.
        min_key: &'static str,
        /// Key of the upper bound.
        max_key: &'static str,
        /// Lower bound value.
        min: f64,
        /// Upper bound value.
        max: f64,
    },
    /// The snapshot times are unusable.
    #[error("invalid snapshot schedule: {reason}")]
    InvalidSchedule {
        /// What is wrong with the schedule.
        reason: String,
    },
    /// Integration pipeline validation failed.
    #[error("pipeline: {0}")]
    Pipeline(#[from] PipelineError),
    /// Building the field tree failed.
    #[error("field tree: {0}")]
    Frame(#[from] FrameError),
    /// The initial update pass failed.
    #[error("initial update: {0}")]
    Update(#[from] UpdateError),
}

impl ConfigError {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Pipeline(e) => e.kind(),
            Self::Frame(e) => e.kind(),
            Self::Update(e) => e.kind(),
            _ => ErrorKind::Configuration,
        }
    }
}

fn positive(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            key,
            value,
            expected: "> 0",
        })
    }
}

fn ordered(min_key: &'static str, min: f64, max_key: &'static str, max: f64) -> Result<(), ConfigError> {
    if min < max {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange {
            min_key,
            max_key,
            min,
            max,
        })
    }
}

// ── Disk ───────────────────────────────────────────────────────────

/// Central star.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StarConfig {
    /// Stellar mass \[M_sun\]. Default: 1.
    pub mass: f64,
}

impl Default for StarConfig {
    fn default() -> Self {
        Self { mass: 1.0 }
    }
}

/// Gas disk.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GasConfig {
    /// Disk gas mass \[M_star\]. Default: 0.05.
    pub disk_mass: f64,
    /// Characteristic radius of the self-similar profile \[au\]. Default: 60.
    pub characteristic_radius: f64,
    /// Viscosity power-law index γ, in `[0, 2)`. Default: 1.
    pub viscosity_index: f64,
    /// Turbulence parameter α, in `(0, 1]`. Default: 1e-3.
    pub alpha: f64,
    /// Mean molecular weight \[m_p\]. Default: 2.3.
    pub mean_molecular_weight: f64,
    /// Midplane temperature at 1 au \[K\]. Default: 280.
    pub temperature_1au: f64,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            disk_mass: 0.05,
            characteristic_radius: 60.0,
            viscosity_index: 1.0,
            alpha: 1.0e-3,
            mean_molecular_weight: 2.3,
            temperature_1au: 280.0,
        }
    }
}

/// Dust population.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DustConfig {
    /// Initial vertically integrated dust-to-gas ratio, in `(0, 10]`. Default: 0.01.
    pub dust_to_gas_ratio: f64,
    /// Fragmentation velocity \[cm/s\]. Default: 100.
    pub fragmentation_velocity: f64,
    /// Surface density floor \[g/cm²\]. Default: 1e-50.
    pub sigma_floor: f64,
    /// Largest initial grain size \[cm\]. Default: 1e-4.
    pub initial_max_size: f64,
    /// Grain material density \[g/cm³\]. Default: 1.67.
    pub material_density: f64,
}

impl Default for DustConfig {
    fn default() -> Self {
        Self {
            dust_to_gas_ratio: 0.01,
            fragmentation_velocity: 100.0,
            sigma_floor: 1.0e-50,
            initial_max_size: 1.0e-4,
            material_density: 1.67,
        }
    }
}

/// Radial and mass grids.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Number of radial cells, at least 4. Default: 100.
    pub radial_cells: usize,
    /// Inner edge \[au\]. Default: 1.
    pub rmin: f64,
    /// Outer edge \[au\]. Default: 1000.
    pub rmax: f64,
    /// Mass bins per decade, at least 1. Default: 7.
    pub mass_bins_per_decade: usize,
    /// Smallest particle mass \[g\]. Default: 1e-12.
    pub mmin: f64,
    /// Largest particle mass \[g\]. Default: 1e5.
    pub mmax: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            radial_cells: 100,
            rmin: 1.0,
            rmax: 1000.0,
            mass_bins_per_decade: 7,
            mmin: 1.0e-12,
            mmax: 1.0e5,
        }
    }
}

/// Everything [`initialize()`](crate::initialize) needs to build the disk.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiskConfig {
    /// Central star.
    pub star: StarConfig,
    /// Gas disk.
    pub gas: GasConfig,
    /// Dust population.
    pub dust: DustConfig,
    /// Grids.
    pub grid: GridConfig,
    /// Physical constants. Not deserialized.
    #[serde(skip)]
    pub constants: Constants,
}

impl DiskConfig {
    /// Check every key against its accepted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("star.mass", self.star.mass)?;

        let gas = &self.gas;
        positive("gas.disk_mass", gas.disk_mass)?;
        positive("gas.characteristic_radius", gas.characteristic_radius)?;
        if !(0.0..2.0).contains(&gas.viscosity_index) {
            return Err(ConfigError::OutOfRange {
                key: "gas.viscosity_index",
                value: gas.viscosity_index,
                expected: "[0, 2)",
            });
        }
        if !(gas.alpha > 0.0 && gas.alpha <= 1.0) {
            return Err(ConfigError::OutOfRange {
                key: "gas.alpha",
                value: gas.alpha,
                expected: "(0, 1]",
            });
        }
        positive("gas.mean_molecular_weight", gas.mean_molecular_weight)?;
        positive("gas.temperature_1au", gas.temperature_1au)?;

        let dust = &self.dust;
        if !(dust.dust_to_gas_ratio > 0.0 && dust.dust_to_gas_ratio <= 10.0) {
            return Err(ConfigError::OutOfRange {
                key: "dust.dust_to_gas_ratio",
                value: dust.dust_to_gas_ratio,
                expected: "(0, 10]",
            });
        }
        positive("dust.fragmentation_velocity", dust.fragmentation_velocity)?;
        positive("dust.sigma_floor", dust.sigma_floor)?;
        positive("dust.initial_max_size", dust.initial_max_size)?;
        positive("dust.material_density", dust.material_density)?;

        let grid = &self.grid;
        if grid.radial_cells < 4 {
            return Err(ConfigError::OutOfRange {
                key: "grid.radial_cells",
                value: grid.radial_cells as f64,
                expected: ">= 4",
            });
        }
        positive("grid.rmin", grid.rmin)?;
        positive("grid.rmax", grid.rmax)?;
        ordered("grid.rmin", grid.rmin, "grid.rmax", grid.rmax)?;
        // the outermost gas density must stay far from f64 underflow
        let taper = (grid.rmax / gas.characteristic_radius).powf(2.0 - gas.viscosity_index);
        if !(taper <= MAX_TAPER_EXPONENT) {
            return Err(ConfigError::OutOfRange {
                key: "grid.rmax",
                value: grid.rmax,
                expected: "(rmax / characteristic_radius)^(2 - viscosity_index) <= 600",
            });
        }
        if grid.mass_bins_per_decade < 1 {
            return Err(ConfigError::OutOfRange {
                key: "grid.mass_bins_per_decade",
                value: 0.0,
                expected: ">= 1",
            });
        }
        positive("grid.mmin", grid.mmin)?;
        positive("grid.mmax", grid.mmax)?;
        ordered("grid.mmin", grid.mmin, "grid.mmax", grid.mmax)?;
        Ok(())
    }
}

// ── Run ────────────────────────────────────────────────────────────

/// Snapshot output directory.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WriterConfig {
    /// Output directory. Default: `data`.
    pub datadir: PathBuf,
    /// Replace existing snapshots instead of refusing to start. Default: false.
    pub overwrite: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            datadir: PathBuf::from("data"),
            overwrite: false,
        }
    }
}

/// Run-loop configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Upper bound on the timestep \[s\]. `None` leaves the step to the
    /// schemes and the snapshot schedule.
    pub max_dt: Option<f64>,
    /// Snapshot times \[s\], strictly increasing and after t = 0.
    /// Default: 21 log-spaced times from 1e3 to 1e5 years.
    pub snapshots: Vec<f64>,
    /// Snapshot writer.
    pub writer: WriterConfig,
    /// Diagnostic granularity: 0 quiet, 1 per snapshot, 2 per step,
    /// 3 per instruction. Default: 1.
    pub verbosity: u8,
}

impl Default for RunConfig {
    fn default() -> Self {
        let year = Constants::CGS.year;
        let snapshots = (0..21)
            .map(|i| 10f64.powf(3.0 + 2.0 * i as f64 / 20.0) * year)
            .collect();
        Self {
            max_dt: None,
            snapshots,
            writer: WriterConfig::default(),
            verbosity: 1,
        }
    }
}

impl RunConfig {
    /// Check the timestep bound and the snapshot schedule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(max_dt) = self.max_dt {
            positive("max_dt", max_dt)?;
        }
        crate::schedule::check_times(&self.snapshots, 0.0)
    }
}
