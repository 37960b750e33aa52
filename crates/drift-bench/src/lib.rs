//! Benchmark profiles and utilities for the drift disk engine.
//!
//! Provides pre-built [`DiskConfig`] profiles for benchmarking:
//!
//! - [`reference_profile`]: 100 radial cells × 120 mass bins (the default grid)
//! - [`stress_profile`]: 400 radial cells × 120 mass bins
//! - [`reference_simulation`]: a disk with viscous gas loss and
//!   dust relaxation, writing to a [`DiscardSink`]

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use drift_core::{layout, FieldPath, FrameError};
use drift_engine::{initialize, ConfigError, DiskConfig, GridConfig, RunConfig, Simulation};
use drift_frame::ndarray::{ArrayD, Axis};
use drift_frame::{Frame, Updater};
use drift_schemes::{ExplicitEuler, ImplicitRelaxation};
use drift_snapshot::{SnapshotRecord, SnapshotSink, WriteError};

/// The default disk: 100 radial cells, 7 mass bins per decade over 17 decades.
pub fn reference_profile() -> DiskConfig {
    DiskConfig::default()
}

/// Same disk as [`reference_profile`] at four times the radial resolution.
pub fn stress_profile() -> DiskConfig {
    DiskConfig {
        grid: GridConfig {
            radial_cells: 400,
            ..GridConfig::default()
        },
        ..DiskConfig::default()
    }
}

/// Sink that counts records and keeps none of them.
#[derive(Debug, Default)]
pub struct DiscardSink {
    written: usize,
}

impl SnapshotSink for DiscardSink {
    fn prepare(&mut self) -> Result<(), WriteError> {
        self.written = 0;
        Ok(())
    }

    fn write(&mut self, _record: &SnapshotRecord) -> Result<(), WriteError> {
        self.written += 1;
        Ok(())
    }

    fn written(&self) -> usize {
        self.written
    }
}

/// Add `gas.dSigma = -Sigma nu / r²` to the gas chain and the frozen
/// `dust.SigmaEq` / `dust.tgrow` relaxation inputs.
pub fn add_reference_sources(frame: &mut Frame) -> Result<(), FrameError> {
    let nr = frame.get(layout::GAS_SIGMA)?.len();
    frame.add_field(layout::GAS, "dSigma", ArrayD::zeros(vec![nr]), "Viscous loss rate [g/cm²/s]")?;
    frame.set_updater(
        "gas.dSigma",
        Updater::computed(|f| {
            let sigma = f.get(layout::GAS_SIGMA)?;
            let nu = f.get(layout::GAS_NU)?;
            let r = f.get(layout::GRID_R)?;
            Ok(-(sigma * nu) / &r.mapv(|r| r * r))
        }),
    )?;
    frame.append_to_chain(layout::GAS, "dSigma")?;

    let equilibrium = frame.get(layout::DUST_SIGMA)?.mapv(|s| 0.5 * s);
    frame.add_field(layout::DUST, "SigmaEq", equilibrium, "Relaxation target [g/cm²]")?;
    let tgrow = frame
        .get(layout::GAS_OMEGA)?
        .mapv(|w| 100.0 / w)
        .insert_axis(Axis(1));
    frame.add_field(layout::DUST, "tgrow", tgrow, "Relaxation timescale [s]")?;
    Ok(())
}

/// A simulation on `disk` with the reference sources and a two-instruction
/// pipeline, quiet and writing to a [`DiscardSink`].
pub fn reference_simulation(disk: &DiskConfig, snapshots: Vec<f64>) -> Result<Simulation, ConfigError> {
    let mut frame = initialize(disk)?;
    add_reference_sources(&mut frame)?;
    frame.update()?;

    let run = RunConfig {
        snapshots,
        verbosity: 0,
        ..RunConfig::default()
    };
    let mut sim = Simulation::new(frame, run)?;
    sim.set_writer(Box::new(DiscardSink::default()));
    let pipeline = sim.pipeline_mut();
    pipeline.push(
        FieldPath::parse(layout::GAS_SIGMA)?,
        ExplicitEuler::new("viscous", "gas.dSigma")?.max_relative_change(0.05),
    );
    pipeline.push(
        FieldPath::parse(layout::DUST_SIGMA)?,
        ImplicitRelaxation::new("coagulation", "dust.SigmaEq", "dust.tgrow")?,
    );
    Ok(sim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_profile_passes_validation() {
        reference_profile().validate().unwrap();
        stress_profile().validate().unwrap();
    }

    #[test]
    fn stress_profile_has_four_times_the_cells() {
        let reference = initialize(&reference_profile()).unwrap();
        let stress = initialize(&stress_profile()).unwrap();
        let cells = |f: &Frame| f.get(layout::DUST_SIGMA).unwrap().len();
        assert_eq!(cells(&stress), 4 * cells(&reference));
    }

    #[test]
    fn reference_simulation_runs_to_completion() {
        let small = DiskConfig {
            grid: GridConfig {
                radial_cells: 8,
                rmin: 1.0,
                rmax: 100.0,
                mass_bins_per_decade: 1,
                mmin: 1.0e-12,
                mmax: 1.0,
            },
            ..DiskConfig::default()
        };
        let year = small.constants.year;
        let mut sim = reference_simulation(&small, vec![10.0 * year, 20.0 * year]).unwrap();
        let summary = sim.run().unwrap();
        assert_eq!(summary.snapshots, 3);
        assert!(summary.steps >= 2);
        assert!(sim
            .frame()
            .get("gas.dSigma")
            .unwrap()
            .iter()
            .all(|&v| v < 0.0));
    }
}
