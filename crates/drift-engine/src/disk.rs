//! The standard disk field tree.
//!
//! [`initialize()`] turns a [`DiskConfig`] into a fully wired [`Frame`]:
//!
//! ```text
//! t                        0-d time (frozen, advanced by the run loop)
//! star.M
//! grid.{ri, r, A, m}
//! gas.{Sigma, T, OmegaK, cs, alpha, nu, P, v.{visc, rad}}
//! dust.{a, rhos, Sigma, SigmaFloor, St, D, v.{frag, driftmax, rad}, backreaction.{A, B}}
//! ```
//!
//! Derived fields get pure updaters; grids, material properties and the
//! dust-free coefficients `A = 1`, `B = 0` are frozen.

use std::f64::consts::PI;
use std::sync::Arc;

use drift_backreaction::Consumers;
use drift_core::{layout, ComputeError, Constants, FrameError};
use drift_frame::ndarray::{Array1, Array2, ArrayD, ArrayView1, ArrayView2, Axis, Ix1, Ix2, IxDyn, Zip};
use drift_frame::{Domain, Frame, GroupHook, Updater};
use tracing::info;

use crate::config::{ConfigError, DiskConfig};
use crate::grid::Grid;

// ── Field access ───────────────────────────────────────────────────

fn shape_error(path: &str, expected: Vec<usize>, found: &[usize]) -> ComputeError {
    ComputeError::Frame(FrameError::ShapeMismatch {
        path: path.to_string(),
        expected,
        found: found.to_vec(),
    })
}

fn vector<'a>(frame: &'a Frame, path: &str) -> Result<ArrayView1<'a, f64>, ComputeError> {
    let value = frame.get(path)?;
    value
        .view()
        .into_dimensionality::<Ix1>()
        .map_err(|_| shape_error(path, vec![0], value.shape()))
}

fn matrix<'a>(frame: &'a Frame, path: &str) -> Result<ArrayView2<'a, f64>, ComputeError> {
    let value = frame.get(path)?;
    value
        .view()
        .into_dimensionality::<Ix2>()
        .map_err(|_| shape_error(path, vec![0, 0], value.shape()))
}

/// Central differences inside, one-sided at both ends.
fn gradient(y: ArrayView1<'_, f64>, x: ArrayView1<'_, f64>) -> Array1<f64> {
    let n = y.len();
    let mut out = Array1::zeros(n);
    if n < 2 {
        return out;
    }
    out[0] = (y[1] - y[0]) / (x[1] - x[0]);
    out[n - 1] = (y[n - 1] - y[n - 2]) / (x[n - 1] - x[n - 2]);
    for i in 1..n - 1 {
        out[i] = (y[i + 1] - y[i - 1]) / (x[i + 1] - x[i - 1]);
    }
    out
}

// ── Gas updaters ───────────────────────────────────────────────────

fn temperature(t_1au: f64, au: f64) -> Updater {
    Updater::computed(move |f| {
        let r = vector(f, layout::GRID_R)?;
        Ok(r.mapv(|r| t_1au * (r / au).powf(-0.5)).into_dyn())
    })
}

fn kepler_frequency(g: f64) -> Updater {
    Updater::computed(move |f| {
        let mass = f.scalar(layout::STAR_MASS)?;
        let r = vector(f, layout::GRID_R)?;
        Ok(r.mapv(|r| (g * mass / (r * r * r)).sqrt()).into_dyn())
    })
}

fn sound_speed(k_b: f64, mu_mp: f64) -> Updater {
    Updater::computed(move |f| {
        let t = vector(f, layout::GAS_T)?;
        Ok(t.mapv(|t| (k_b * t / mu_mp).sqrt()).into_dyn())
    })
}

fn viscosity() -> Updater {
    Updater::computed(|f| {
        let alpha = vector(f, layout::GAS_ALPHA)?;
        let cs = vector(f, layout::GAS_CS)?;
        let omega = vector(f, layout::GAS_OMEGA)?;
        Ok(Zip::from(&alpha)
            .and(&cs)
            .and(&omega)
            .map_collect(|&a, &c, &w| a * c * c / w)
            .into_dyn())
    })
}

fn pressure() -> Updater {
    Updater::computed(|f| {
        let sigma = vector(f, layout::GAS_SIGMA)?;
        let cs = vector(f, layout::GAS_CS)?;
        let omega = vector(f, layout::GAS_OMEGA)?;
        let norm = (2.0 * PI).sqrt();
        Ok(Zip::from(&sigma)
            .and(&cs)
            .and(&omega)
            .map_collect(|&s, &c, &w| s * c * w / norm)
            .into_dyn())
    })
}

/// `v = -3 / (Σ √r) · d(ν Σ √r)/dr`.
fn viscous_velocity() -> Updater {
    Updater::computed(|f| {
        let r = vector(f, layout::GRID_R)?;
        let sigma = vector(f, layout::GAS_SIGMA)?;
        let nu = vector(f, layout::GAS_NU)?;
        let sqrt_r = r.mapv(f64::sqrt);
        let torque = &nu * &sigma * &sqrt_r;
        let dtorque = gradient(torque.view(), r);
        Ok(Zip::from(&dtorque)
            .and(&sigma)
            .and(&sqrt_r)
            .map_collect(|&d, &s, &q| -3.0 * d / (s * q))
            .into_dyn())
    })
}

// ── Dust updaters ──────────────────────────────────────────────────

/// Epstein drag in the midplane: `St = π/2 · a ρs / Σ_gas`.
fn stokes_number() -> Updater {
    Updater::computed(|f| {
        let a = matrix(f, layout::DUST_A)?;
        let rhos = matrix(f, layout::DUST_RHOS)?;
        let sigma = vector(f, layout::GAS_SIGMA)?;
        let st = &a * &rhos * (0.5 * PI) / &sigma.insert_axis(Axis(1));
        Ok(st.into_dyn())
    })
}

/// `0.5 · cs² / (Ω r) · dlnP/dlnr`.
fn max_drift_velocity() -> Updater {
    Updater::computed(|f| {
        let r = vector(f, layout::GRID_R)?;
        let cs = vector(f, layout::GAS_CS)?;
        let omega = vector(f, layout::GAS_OMEGA)?;
        let p = vector(f, layout::GAS_P)?;
        let dlnp = gradient(p.mapv(f64::ln).view(), r.mapv(f64::ln).view());
        let mut v = Zip::from(&cs)
            .and(&omega)
            .and(&r)
            .map_collect(|&c, &w, &r| 0.5 * c * c / (w * r));
        v *= &dlnp;
        Ok(v.into_dyn())
    })
}

// ── Coefficient consumers ──────────────────────────────────────────

/// Gas velocity under back-reaction: `A · v_visc + 2B · v_driftmax`.
fn gas_velocity(f: &Frame) -> Result<Array1<f64>, ComputeError> {
    let a = vector(f, layout::BACKREACTION_A)?;
    let b = vector(f, layout::BACKREACTION_B)?;
    let visc = vector(f, layout::GAS_V_VISC)?;
    let drift = vector(f, layout::DUST_V_DRIFTMAX)?;
    Ok(Zip::from(&a)
        .and(&b)
        .and(&visc)
        .and(&drift)
        .map_collect(|&a, &b, &v, &d| a * v + 2.0 * b * d))
}

/// Per-species coefficient: `per_species` when `vertical`, else the bulk
/// `bulk` vector broadcast across the mass bins.
fn species_coefficient(
    f: &Frame,
    vertical: bool,
    bulk: &str,
    per_species: &str,
) -> Result<Array2<f64>, ComputeError> {
    let st = matrix(f, layout::DUST_ST)?;
    if vertical {
        let c = matrix(f, per_species)?;
        if c.dim() != st.dim() {
            return Err(shape_error(per_species, st.shape().to_vec(), c.shape()));
        }
        return Ok(c.to_owned());
    }
    let c = vector(f, bulk)?;
    c.insert_axis(Axis(1))
        .broadcast(st.raw_dim())
        .map(|v| v.to_owned())
        .ok_or_else(|| shape_error(bulk, vec![st.nrows()], c.shape()))
}

fn species_a(f: &Frame, vertical: bool) -> Result<Array2<f64>, ComputeError> {
    species_coefficient(
        f,
        vertical,
        layout::BACKREACTION_A,
        layout::BACKREACTION_A_VERTICAL,
    )
}

fn species_b(f: &Frame, vertical: bool) -> Result<Array2<f64>, ComputeError> {
    species_coefficient(
        f,
        vertical,
        layout::BACKREACTION_B,
        layout::BACKREACTION_B_VERTICAL,
    )
}

/// `(A_i · 2 St · v_driftmax + v_gas,i) / (1 + St²)`, where each species
/// sees the gas velocity `A_i · v_visc + 2 B_i · v_driftmax` of its own
/// pair. With the bulk pair this is the gas velocity of the disk.
fn dust_velocity(vertical: bool) -> Updater {
    Updater::computed(move |f| {
        let st = matrix(f, layout::DUST_ST)?;
        let a = species_a(f, vertical)?;
        let b = species_b(f, vertical)?;
        let drift = vector(f, layout::DUST_V_DRIFTMAX)?.insert_axis(Axis(1));
        let visc = vector(f, layout::GAS_V_VISC)?.insert_axis(Axis(1));
        let gas = &a * &visc + &b * &drift * 2.0;
        let coupled = &a * &st * 2.0 * &drift + &gas;
        Ok((coupled / st.mapv(|s| 1.0 + s * s)).into_dyn())
    })
}

fn dust_diffusivity(vertical: bool) -> Updater {
    Updater::computed(move |f| {
        let st = matrix(f, layout::DUST_ST)?;
        let a = species_a(f, vertical)?;
        let nu = vector(f, layout::GAS_NU)?.insert_axis(Axis(1));
        Ok((a * &nu / st.mapv(|s| 1.0 + s * s)).into_dyn())
    })
}

fn consumers(vertical: bool) -> Consumers {
    Consumers {
        gas_velocity: Updater::computed(|f| Ok(gas_velocity(f)?.into_dyn())),
        dust_velocity: dust_velocity(vertical),
        dust_diffusivity: dust_diffusivity(vertical),
    }
}

/// Drag-limited velocities and diffusivity reading the bulk `(A, B)` pair.
///
/// These are the updaters [`initialize()`] installs.
pub fn bulk_consumers() -> Consumers {
    consumers(false)
}

/// Consumers for the vertical-structure variant: dust terms read
/// `A_vertical`/`B_vertical`, gas terms read the gas pair in `A`/`B`.
pub fn vertical_consumers() -> Consumers {
    consumers(true)
}

/// `dust.v` diastole hook re-deriving both radial velocities, so they
/// are refreshed together whenever the dust velocities are.
pub fn radial_velocity_update() -> GroupHook {
    Arc::new(|f: &mut Frame| {
        f.update_path(layout::GAS_V_RAD)?;
        f.update_path(layout::DUST_V_RAD)
    })
}

// ── Initial conditions ─────────────────────────────────────────────

/// Self-similar profile normalised to `disk_mass` over the annulus areas.
fn gas_profile(grid: &Grid, config: &DiskConfig) -> Array1<f64> {
    let c = &config.constants;
    let rc = config.gas.characteristic_radius * c.au;
    let gamma = config.gas.viscosity_index;
    let shape = grid
        .r
        .mapv(|r| (r / rc).powf(-gamma) * (-(r / rc).powf(2.0 - gamma)).exp());
    let mass = config.gas.disk_mass * config.star.mass * c.m_sun;
    let norm = mass / (&shape * &grid.area).sum();
    shape * norm
}

/// Grain radius of each mass bin for material density `rhos`.
fn grain_sizes(m: &Array1<f64>, rhos: f64) -> Array1<f64> {
    m.mapv(|m| (3.0 * m / (4.0 * PI * rhos)).cbrt())
}

/// MRN mass fractions per bin (`∝ a^½`) up to `a_max`.
fn mrn_weights(sizes: &Array1<f64>, a_max: f64) -> Array1<f64> {
    let mut w = sizes.mapv(|a| if a <= a_max { a.sqrt() } else { 0.0 });
    let total = w.sum();
    if total > 0.0 {
        w /= total;
    } else if let Some(first) = w.first_mut() {
        *first = 1.0;
    }
    w
}

// ── Tree ───────────────────────────────────────────────────────────

fn filled(shape: &[usize], value: f64) -> ArrayD<f64> {
    ArrayD::from_elem(IxDyn(shape), value)
}

/// Build the standard tree for `config`.
///
/// Validates the configuration, lays out the grids, fills the initial gas
/// and dust surface densities (dust floor-clamped), installs the
/// standard updaters with their chains and runs one full update.
pub fn initialize(config: &DiskConfig) -> Result<Frame, ConfigError> {
    config.validate()?;
    let c: Constants = config.constants;
    let grid = Grid::new(&config.grid, &c);
    let (nr, nm) = (grid.nr(), grid.nm());
    let species = [nr, nm];

    let mut f = Frame::new();
    f.add_field("", "t", filled(&[], 0.0), "Time [s]")?;

    f.add_group("", "star", "Central star")?;
    f.add_field("star", "M", filled(&[], config.star.mass * c.m_sun), "Stellar mass [g]")?;

    f.add_group("", "grid", "Radial and mass grids")?;
    f.add_field("grid", "ri", grid.ri.clone().into_dyn(), "Radial cell edges [cm]")?;
    f.add_field("grid", "r", grid.r.clone().into_dyn(), "Radial cell centers [cm]")?;
    f.add_field("grid", "A", grid.area.clone().into_dyn(), "Radial annulus areas [cm²]")?;
    f.add_field("grid", "m", grid.m.clone().into_dyn(), "Particle masses [g]")?;

    // ── gas ──
    let sigma_gas = gas_profile(&grid, config);
    f.add_group("", "gas", "Gas quantities")?;
    f.add_field("gas", "Sigma", sigma_gas.clone().into_dyn(), "Surface density [g/cm²]")?;
    f.add_field("gas", "T", filled(&[nr], 0.0), "Midplane temperature [K]")?;
    f.add_field("gas", "OmegaK", filled(&[nr], 0.0), "Keplerian frequency [1/s]")?;
    f.add_field("gas", "cs", filled(&[nr], 0.0), "Isothermal sound speed [cm/s]")?;
    f.add_field("gas", "alpha", filled(&[nr], config.gas.alpha), "Turbulence parameter")?;
    f.add_field("gas", "nu", filled(&[nr], 0.0), "Kinematic viscosity [cm²/s]")?;
    f.add_field("gas", "P", filled(&[nr], 0.0), "Midplane pressure [g/cm/s²]")?;
    f.add_group("gas", "v", "Gas velocities")?;
    f.add_field("gas.v", "visc", filled(&[nr], 0.0), "Viscous velocity [cm/s]")?;
    f.add_field("gas.v", "rad", filled(&[nr], 0.0), "Radial velocity [cm/s]")?;

    f.set_updater(layout::GAS_T, temperature(config.gas.temperature_1au, c.au))?;
    f.set_updater(layout::GAS_OMEGA, kepler_frequency(c.g))?;
    f.set_updater(
        layout::GAS_CS,
        sound_speed(c.k_b, config.gas.mean_molecular_weight * c.m_p),
    )?;
    f.set_updater(layout::GAS_NU, viscosity())?;
    f.set_updater(layout::GAS_P, pressure())?;
    f.set_updater(layout::GAS_V_VISC, viscous_velocity())?;

    // ── dust ──
    let sizes = grain_sizes(&grid.m, config.dust.material_density);
    let weights = mrn_weights(&sizes, config.dust.initial_max_size);
    let sigma_dust = Array2::from_shape_fn((nr, nm), |(i, j)| {
        config.dust.dust_to_gas_ratio * sigma_gas[i] * weights[j]
    });
    let a = sizes
        .insert_axis(Axis(0))
        .broadcast((nr, nm))
        .map(|v| v.to_owned())
        .ok_or_else(|| FrameError::ShapeMismatch {
            path: layout::DUST_A.to_string(),
            expected: species.to_vec(),
            found: vec![1, nm],
        })?;

    f.add_group("", "dust", "Dust quantities")?;
    f.add_field("dust", "a", a.into_dyn(), "Particle size [cm]")?;
    f.add_field("dust", "rhos", filled(&species, config.dust.material_density), "Material density [g/cm³]")?;
    f.add_field("dust", "Sigma", sigma_dust.into_dyn(), "Surface density per mass bin [g/cm²]")?;
    f.add_field("dust", "SigmaFloor", filled(&species, config.dust.sigma_floor), "Floor value of surface density [g/cm²]")?;
    f.add_field("dust", "St", filled(&species, 0.0), "Stokes number")?;
    f.add_field("dust", "D", filled(&species, 0.0), "Diffusivity [cm²/s]")?;
    f.add_group("dust", "v", "Dust velocities")?;
    f.add_field("dust.v", "frag", filled(&[nr], config.dust.fragmentation_velocity), "Fragmentation velocity [cm/s]")?;
    f.add_field("dust.v", "driftmax", filled(&[nr], 0.0), "Maximum drift velocity [cm/s]")?;
    f.add_field("dust.v", "rad", filled(&species, 0.0), "Radial velocity [cm/s]")?;
    f.add_group("dust", "backreaction", "Backreaction coefficients")?;
    f.add_field("dust.backreaction", "A", filled(&[nr], 1.0), "Pull factor")?;
    f.add_field("dust.backreaction", "B", filled(&[nr], 0.0), "Push factor")?;
    let clamped = f.clamp_to_floor(layout::DUST_SIGMA, layout::DUST_SIGMA_FLOOR)?;

    f.set_updater(layout::DUST_ST, stokes_number())?;
    f.set_updater(layout::DUST_V_DRIFTMAX, max_drift_velocity())?;
    let standard = bulk_consumers();
    f.set_updater(layout::GAS_V_RAD, standard.gas_velocity)?;
    f.set_updater(layout::DUST_V_RAD, standard.dust_velocity)?;
    f.set_updater(layout::DUST_D, standard.dust_diffusivity)?;

    for path in [
        layout::GAS_SIGMA,
        layout::GAS_T,
        layout::GAS_OMEGA,
        layout::GAS_CS,
        layout::GAS_NU,
        layout::GAS_P,
        layout::DUST_A,
        layout::DUST_SIGMA,
        layout::DUST_ST,
        layout::DUST_D,
    ] {
        f.set_domain(path, Domain::NonNegative)?;
    }

    // ── chains ──
    // dust velocities read the viscous velocity, so it is refreshed with
    // the gas state ahead of the dust group
    f.set_chain(layout::GAS, &["T", "OmegaK", "cs", "nu", "P", "v.visc"])?;
    f.set_chain(layout::GAS_V, &["visc", "rad"])?;
    f.set_chain(layout::BACKREACTION, &["A", "B"])?;
    f.set_chain(layout::DUST_V, &["driftmax", "rad"])?;
    f.set_chain(layout::DUST, &["St", "backreaction", "D", "v"])?;
    f.set_chain("", &["grid", "gas", "dust", "gas.v"])?;

    f.update()?;
    info!(nr, nm, clamped, "disk initialized");
    Ok(f)
}
