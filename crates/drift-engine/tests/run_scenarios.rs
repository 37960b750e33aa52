//! End-to-end run scenarios on the standard disk.
//!
//! Each test builds a small disk, wires a fixture pipeline and checks one
//! observable property of complete runs: pipeline removal, boundary
//! pinning, mass conservation, and the build-up → evolve hand-off.

use std::sync::{Arc, Mutex};

use drift_core::{layout, SchemeError, UpdateError};
use drift_engine::{
    BoundaryPin, DiskConfig, GridConfig, RunConfig, SimState, Simulation, WriterConfig,
};
use drift_frame::ndarray::{ArrayD, Axis, Ix2};
use drift_frame::{Frame, Updater};
use drift_integrator::{AdvanceContext, Method, Scheme};
use drift_snapshot::{state_hash, DirectoryReader, SnapshotRecord};
use drift_test_utils::{path, IdentityScheme, ScaleScheme, SharedSink};

fn small() -> DiskConfig {
    DiskConfig {
        grid: GridConfig {
            radial_cells: 8,
            rmin: 1.0,
            rmax: 100.0,
            mass_bins_per_decade: 1,
            mmin: 1.0e-12,
            mmax: 1.0,
        },
        ..DiskConfig::default()
    }
}

fn run_config(snapshots: Vec<f64>) -> RunConfig {
    RunConfig {
        snapshots,
        verbosity: 0,
        ..RunConfig::default()
    }
}

fn with_sink(mut sim: Simulation) -> (Simulation, SharedSink) {
    let sink = SharedSink::new();
    sim.set_writer(Box::new(sink.clone()));
    (sim, sink)
}

fn bits(a: &ArrayD<f64>) -> Vec<u64> {
    a.iter().map(|v| v.to_bits()).collect()
}

fn dust_mass(record: &SnapshotRecord) -> f64 {
    let sigma = record
        .field(layout::DUST_SIGMA)
        .unwrap()
        .into_dimensionality::<Ix2>()
        .unwrap();
    let area = record.field(layout::GRID_AREA).unwrap();
    sigma
        .axis_iter(Axis(0))
        .zip(area.iter())
        .map(|(row, a)| row.sum() * a)
        .sum()
}

// ── Pipeline removal ───────────────────────────────────────────────

#[test]
fn removed_gas_instruction_freezes_gas_fields() {
    let sim = Simulation::from_config(&small(), run_config(vec![1.0, 2.0, 3.0, 4.0])).unwrap();
    let (mut sim, sink) = with_sink(sim);
    let gas = sim
        .pipeline_mut()
        .push(path(layout::GAS_SIGMA), ScaleScheme::new("gas", 0.1));
    sim.pipeline_mut()
        .push(path(layout::DUST_SIGMA), ScaleScheme::new("dust", 0.2));
    sim.pipeline_mut().remove(gas).unwrap();

    let gas_before = sim.frame().get(layout::GAS_SIGMA).unwrap().clone();
    let pressure_before = sim.frame().get(layout::GAS_P).unwrap().clone();
    let dust_before = sim.frame().get(layout::DUST_SIGMA).unwrap().clone();
    let summary = sim.run().unwrap();
    assert_eq!(summary.steps, 4);

    for record in sink.records() {
        assert_eq!(bits(&record.field(layout::GAS_SIGMA).unwrap()), bits(&gas_before));
        assert_eq!(bits(&record.field(layout::GAS_P).unwrap()), bits(&pressure_before));
    }
    assert_ne!(sim.frame().get(layout::DUST_SIGMA).unwrap(), &dust_before);
}

#[test]
fn disabled_instruction_can_be_re_enabled() {
    let sim = Simulation::from_config(&small(), run_config(vec![1.0])).unwrap();
    let (mut sim, _sink) = with_sink(sim);
    let gas = sim
        .pipeline_mut()
        .push(path(layout::GAS_SIGMA), ScaleScheme::new("gas", 0.1));
    sim.pipeline_mut()
        .push(path(layout::DUST_SIGMA), IdentityScheme::new("dust"));
    sim.pipeline_mut().set_enabled(gas, false).unwrap();
    let before = sim.frame().get(layout::GAS_SIGMA).unwrap().clone();
    sim.run().unwrap();
    assert_eq!(sim.frame().get(layout::GAS_SIGMA).unwrap(), &before);

    sim.pipeline_mut().set_enabled(gas, true).unwrap();
    sim.schedule_snapshots(&[2.0]).unwrap();
    sim.run().unwrap();
    let after = sim.frame().get(layout::GAS_SIGMA).unwrap();
    assert_eq!(after[[3]], before[[3]] * (1.0 + 0.1 * 1.0));
}

// ── Boundary pinning ───────────────────────────────────────────────

#[test]
fn pinned_edges_hold_for_the_whole_run() {
    let sim = Simulation::from_config(&small(), run_config(vec![1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();
    let (mut sim, sink) = with_sink(sim);
    // both schemes write every cell, edges included
    sim.pipeline_mut()
        .push(path(layout::GAS_SIGMA), ScaleScheme::new("gas", 0.1));
    sim.pipeline_mut()
        .push(path(layout::DUST_SIGMA), ScaleScheme::new("dust", 0.3));

    // references differ from the initial state so the pin is observable
    let gas_ref = sim.frame().get(layout::GAS_SIGMA).unwrap() * 2.0;
    let dust_ref = sim.frame().get(layout::DUST_SIGMA).unwrap() * 3.0;
    let pin = BoundaryPin::new()
        .pin(layout::GAS_SIGMA, gas_ref.clone())
        .pin(layout::DUST_SIGMA, dust_ref.clone())
        .rederive(layout::GAS_P)
        .rederive(layout::DUST_ST)
        .rederive(layout::DUST_V)
        .rederive(layout::GAS_V);
    sim.set_boundary_pin(Some(pin));

    fn edges(a: &ArrayD<f64>) -> (ArrayD<f64>, ArrayD<f64>) {
        let n = a.len_of(Axis(0));
        (
            a.slice_axis(Axis(0), (0..2).into()).to_owned(),
            a.slice_axis(Axis(0), (n - 2..n).into()).to_owned(),
        )
    }

    let checks = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&checks);
    let (gas_edges, dust_edges) = (edges(&gas_ref), edges(&dust_ref));
    sim.set_post_step(Box::new(move |f: &mut Frame| -> Result<(), UpdateError> {
        let ok = edges(f.get(layout::GAS_SIGMA)?) == gas_edges
            && edges(f.get(layout::DUST_SIGMA)?) == dust_edges;
        seen.lock().unwrap().push(ok);
        Ok(())
    }));

    let initial_interior = sim.frame().get(layout::GAS_SIGMA).unwrap()[[3]];
    let summary = sim.run().unwrap();
    let checks = checks.lock().unwrap();
    assert_eq!(checks.len() as u64, summary.steps);
    assert!(checks.iter().all(|&ok| ok));
    assert_ne!(sim.frame().get(layout::GAS_SIGMA).unwrap()[[3]], initial_interior);

    // every snapshot after the first was taken with the edges pinned
    for record in &sink.records()[1..] {
        assert_eq!(edges(&record.field(layout::GAS_SIGMA).unwrap()), edges(&gas_ref));
        assert_eq!(edges(&record.field(layout::DUST_SIGMA).unwrap()), edges(&dust_ref));
    }
}

#[test]
fn pin_without_rederive_leaves_pressure_stale() {
    let pinned_pressure = |rederive: bool| {
        let mut frame = drift_engine::initialize(&small()).unwrap();
        let gas_ref = frame.get(layout::GAS_SIGMA).unwrap() * 2.0;
        let mut pin = BoundaryPin::new().pin(layout::GAS_SIGMA, gas_ref);
        if rederive {
            pin = pin.rederive(layout::GAS_P);
        }
        pin.apply(&mut frame).unwrap();
        let after_hook = frame.get(layout::GAS_P).unwrap().clone();
        frame.update_path(layout::GAS_P).unwrap();
        (after_hook, frame.get(layout::GAS_P).unwrap().clone())
    };

    let (hooked, refreshed) = pinned_pressure(true);
    assert_eq!(hooked, refreshed);
    let (hooked, refreshed) = pinned_pressure(false);
    assert_ne!(hooked, refreshed);
    assert_eq!(hooked[[3]], refreshed[[3]]);
}

// ── Conservation ───────────────────────────────────────────────────

/// Moves `rate · dt` of each mass bin into the next one, cell by cell.
/// Redistributes mass between species and never across radii.
struct BinShift {
    rate: f64,
}

impl Scheme for BinShift {
    fn name(&self) -> &str {
        "coagulation"
    }

    fn method(&self) -> Method {
        Method::Explicit
    }

    fn advance(&self, ctx: &mut AdvanceContext<'_>) -> Result<(), SchemeError> {
        let fraction = self.rate * ctx.dt();
        let mut sigma = ctx.target_mut()?;
        for mut row in sigma.axis_iter_mut(Axis(0)) {
            for j in 0..row.len() - 1 {
                let moved = row[[j]] * fraction;
                row[[j]] -= moved;
                row[[j + 1]] += moved;
            }
        }
        Ok(())
    }
}

#[test]
fn dust_mass_is_conserved_without_transport() {
    let sim = Simulation::from_config(&small(), run_config(vec![1.0, 10.0, 100.0])).unwrap();
    let (mut sim, sink) = with_sink(sim);
    let advection = sim
        .pipeline_mut()
        .push(path(layout::DUST_SIGMA), ScaleScheme::new("advection", 0.5));
    sim.pipeline_mut().set_enabled(advection, false).unwrap();
    sim.pipeline_mut()
        .push(path(layout::DUST_SIGMA), BinShift { rate: 0.004 });
    sim.pipeline_mut()
        .push(path(layout::GAS_SIGMA), IdentityScheme::new("gas"));
    sim.run().unwrap();

    let records = sink.records();
    let initial = dust_mass(&records[0]);
    let last = records.last().unwrap();
    assert_eq!(last.time, 100.0);
    assert!(initial > 0.0);
    // the dust did evolve, only between bins
    assert_ne!(
        bits(&last.field(layout::DUST_SIGMA).unwrap()),
        bits(&records[0].field(layout::DUST_SIGMA).unwrap())
    );
    assert!((dust_mass(last) / initial - 1.0).abs() < 1e-12);
}

// ── Build-up → evolve ──────────────────────────────────────────────

#[test]
fn build_up_hands_off_its_final_dust_bit_for_bit() {
    let dir = tempfile::tempdir().unwrap();
    let datadir = dir.path().join("buildup");

    let mut build_up = Simulation::from_config(
        &small(),
        RunConfig {
            writer: WriterConfig {
                datadir: datadir.clone(),
                overwrite: false,
            },
            ..run_config(vec![1.0, 2.0, 3.0])
        },
    )
    .unwrap();
    build_up.frame_mut().freeze(layout::DUST_V_RAD).unwrap();
    build_up.frame_mut().fill(layout::DUST_V_RAD, 0.0).unwrap();
    let gas = build_up
        .pipeline_mut()
        .push(path(layout::GAS_SIGMA), ScaleScheme::new("gas", 0.1));
    build_up
        .pipeline_mut()
        .push(path(layout::DUST_SIGMA), ScaleScheme::new("coagulation", 0.5));
    build_up.pipeline_mut().remove(gas).unwrap();
    build_up.run().unwrap();
    assert_eq!(build_up.state(), SimState::Done);

    let reader = DirectoryReader::open(&datadir).unwrap();
    assert_eq!(reader.indices().unwrap(), vec![0, 1, 2, 3]);
    let first = reader.load(0).unwrap();
    let last = reader.latest().unwrap().unwrap();
    assert_eq!(
        bits(&last.field(layout::GAS_SIGMA).unwrap()),
        bits(&first.field(layout::GAS_SIGMA).unwrap())
    );
    assert!(last
        .field(layout::DUST_V_RAD)
        .unwrap()
        .iter()
        .all(|&v| v == 0.0));

    let handed_off = last.field(layout::DUST_SIGMA).unwrap();
    let floor = last.field(layout::DUST_SIGMA_FLOOR).unwrap();
    let mut expected = handed_off.clone();
    drift_frame::clamp_to_floor(layout::DUST_SIGMA, expected.view_mut(), floor.view()).unwrap();

    let evolve = Simulation::from_config(&small(), run_config(vec![1.0])).unwrap();
    let (mut evolve, sink) = with_sink(evolve);
    evolve
        .pipeline_mut()
        .push(path(layout::GAS_SIGMA), ScaleScheme::new("gas", 0.1));
    evolve
        .pipeline_mut()
        .push(path(layout::DUST_SIGMA), ScaleScheme::new("coagulation", 0.5));
    let clamped = evolve.set_initial_dust(handed_off).unwrap();
    // the grains that started above the maximum size sat at a tenth of the
    // floor and grew by 1.5³ < 10, so they are clamped again
    assert!(clamped > 0);
    evolve.run().unwrap();

    let start = &sink.records()[0];
    assert_eq!(start.index, 0);
    assert_eq!(bits(&start.field(layout::DUST_SIGMA).unwrap()), bits(&expected));
}

// ── Chains ─────────────────────────────────────────────────────────

#[test]
fn new_field_is_recomputed_only_once_chained() {
    let mut frame = drift_engine::initialize(&small()).unwrap();
    frame
        .add_field(layout::DUST, "H", ArrayD::zeros(vec![8]), "Scale height [cm]")
        .unwrap();
    frame
        .set_updater(
            "dust.H",
            Updater::computed(|f| Ok(f.get(layout::GAS_CS)? / f.get(layout::GAS_OMEGA)?)),
        )
        .unwrap();
    frame.update().unwrap();
    assert!(frame.get("dust.H").unwrap().iter().all(|&v| v == 0.0));

    frame.append_to_chain(layout::DUST, "H").unwrap();
    frame.update().unwrap();
    assert!(frame.get("dust.H").unwrap().iter().all(|&v| v > 0.0));
}

#[test]
fn reordered_dust_velocities_read_stale_drift() {
    let heavier_star = |frame: &mut Frame| {
        let mass = frame.scalar(layout::STAR_MASS).unwrap();
        frame.fill(layout::STAR_MASS, 2.0 * mass).unwrap();
    };

    let mut standard = drift_engine::initialize(&small()).unwrap();
    heavier_star(&mut standard);
    standard.update().unwrap();
    let settled = state_hash(&standard);
    standard.update().unwrap();
    assert_eq!(state_hash(&standard), settled);

    let mut reordered = drift_engine::initialize(&small()).unwrap();
    reordered.set_chain(layout::DUST_V, &["rad", "driftmax"]).unwrap();
    heavier_star(&mut reordered);
    reordered.update().unwrap();
    let stale = reordered.get(layout::DUST_V_RAD).unwrap().clone();
    reordered.update().unwrap();
    let fresh = reordered.get(layout::DUST_V_RAD).unwrap().clone();
    assert_ne!(stale, fresh);
    assert_eq!(&fresh, standard.get(layout::DUST_V_RAD).unwrap());
}
