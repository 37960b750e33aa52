//! Two-phase run: dust build-up on a frozen gas disk, then joint evolution.
//!
//! The build-up phase grows the dust toward a distribution shifted one
//! mass bin up while the gas is held fixed (no gas instruction). Its last
//! snapshot is read back from disk and handed to a fresh simulation as the
//! initial dust, where the gas also decays viscously.
//!
//! Run with `RUST_LOG=debug` for per-step diagnostics.

use std::error::Error;

use drift::frame::ndarray::{s, Array2, Axis, Ix2};
use drift::logging;
use drift::prelude::*;

const YEAR: f64 = Constants::CGS.year;

fn disk() -> DiskConfig {
    DiskConfig {
        grid: GridConfig {
            radial_cells: 40,
            rmin: 1.0,
            rmax: 300.0,
            mass_bins_per_decade: 3,
            mmin: 1.0e-12,
            mmax: 1.0e3,
        },
        ..DiskConfig::default()
    }
}

fn run(datadir: &str, snapshots: Vec<f64>) -> RunConfig {
    RunConfig {
        snapshots,
        writer: WriterConfig {
            datadir: std::env::temp_dir().join(datadir),
            overwrite: true,
        },
        verbosity: 1,
        ..RunConfig::default()
    }
}

/// Add a frozen growth target and timescale to the dust group.
fn add_growth(frame: &mut Frame) -> Result<(), Box<dyn Error>> {
    let sigma = frame
        .get(layout::DUST_SIGMA)?
        .view()
        .into_dimensionality::<Ix2>()?
        .to_owned();
    let mut target = Array2::zeros(sigma.raw_dim());
    target.slice_mut(s![.., 1..]).assign(&sigma.slice(s![.., ..-1]));
    frame.add_field(layout::DUST, "SigmaEq", target.into_dyn(), "Growth target [g/cm²]")?;

    let tgrow = frame
        .get(layout::GAS_OMEGA)?
        .mapv(|w| 100.0 / w)
        .insert_axis(Axis(1));
    frame.add_field(layout::DUST, "tgrow", tgrow, "Growth timescale [s]")?;
    Ok(())
}

fn build_up() -> Result<SnapshotRecord, Box<dyn Error>> {
    let mut frame = initialize(&disk())?;
    add_growth(&mut frame)?;

    let config = run("drift-buildup", vec![1e2 * YEAR, 3e2 * YEAR, 1e3 * YEAR]);
    let datadir = config.writer.datadir.clone();
    let mut sim = Simulation::new(frame, config)?;
    sim.pipeline_mut().push(
        FieldPath::parse(layout::DUST_SIGMA)?,
        ImplicitRelaxation::new("coagulation", "dust.SigmaEq", "dust.tgrow")?,
    );
    let summary = sim.run()?;
    tracing::info!(steps = summary.steps, snapshots = summary.snapshots, "build-up done");

    let last = DirectoryReader::open(&datadir)?
        .latest()?
        .ok_or("build-up wrote no snapshot")?;
    Ok(last)
}

fn evolve(handoff: &SnapshotRecord) -> Result<RunSummary, Box<dyn Error>> {
    let mut frame = initialize(&disk())?;
    add_growth(&mut frame)?;

    let shape = frame.get(layout::GAS_SIGMA)?.shape().to_vec();
    frame.add_field(
        layout::GAS,
        "dSigma",
        drift::frame::ndarray::ArrayD::zeros(shape),
        "Viscous loss rate [g/cm²/s]",
    )?;
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

    let snapshots = (1..=5).map(|i| i as f64 * 2e3 * YEAR).collect();
    let mut sim = Simulation::new(frame, run("drift-evolve", snapshots))?;
    let dust = handoff
        .field(layout::DUST_SIGMA)
        .ok_or("hand-off snapshot has no dust")?;
    let clamped = sim.set_initial_dust(dust)?;
    tracing::info!(clamped, "initial dust set");

    let pipeline = sim.pipeline_mut();
    pipeline.push(
        FieldPath::parse(layout::GAS_SIGMA)?,
        ExplicitEuler::new("viscous", "gas.dSigma")?.max_relative_change(0.05),
    );
    pipeline.push(
        FieldPath::parse(layout::DUST_SIGMA)?,
        ImplicitRelaxation::new("coagulation", "dust.SigmaEq", "dust.tgrow")?,
    );
    Ok(sim.run()?)
}

fn main() -> Result<(), Box<dyn Error>> {
    logging::init(1);
    let handoff = build_up()?;
    let summary = evolve(&handoff)?;
    tracing::info!(
        steps = summary.steps,
        snapshots = summary.snapshots,
        time_yr = summary.final_time / YEAR,
        "evolve done"
    );
    Ok(())
}
