//! Paths of the standard disk field tree.
//!
//! The initializer in `drift-engine` builds this tree; the back-reaction
//! wiring and the reference hooks address fields through these names.

/// Simulation time (0-d).
pub const TIME: &str = "t";

/// Stellar mass.
pub const STAR_MASS: &str = "star.M";

/// Radial cell edges (`Nr + 1`).
pub const GRID_RI: &str = "grid.ri";
/// Radial cell centers (`Nr`).
pub const GRID_R: &str = "grid.r";
/// Annulus area of each radial cell (`Nr`).
pub const GRID_AREA: &str = "grid.A";
/// Mass grid (`Nm`).
pub const GRID_M: &str = "grid.m";

/// Gas group.
pub const GAS: &str = "gas";
/// Gas surface density (`Nr`).
pub const GAS_SIGMA: &str = "gas.Sigma";
/// Gas temperature (`Nr`).
pub const GAS_T: &str = "gas.T";
/// Keplerian angular frequency (`Nr`).
pub const GAS_OMEGA: &str = "gas.OmegaK";
/// Isothermal sound speed (`Nr`).
pub const GAS_CS: &str = "gas.cs";
/// Turbulence parameter (`Nr`).
pub const GAS_ALPHA: &str = "gas.alpha";
/// Kinematic viscosity (`Nr`).
pub const GAS_NU: &str = "gas.nu";
/// Midplane pressure (`Nr`).
pub const GAS_P: &str = "gas.P";
/// Gas velocity group.
pub const GAS_V: &str = "gas.v";
/// Viscous gas velocity (`Nr`).
pub const GAS_V_VISC: &str = "gas.v.visc";
/// Radial gas velocity (`Nr`).
pub const GAS_V_RAD: &str = "gas.v.rad";

/// Dust group.
pub const DUST: &str = "dust";
/// Grain size per radius and species (`Nr × Nm`).
pub const DUST_A: &str = "dust.a";
/// Grain material density (`Nr × Nm`).
pub const DUST_RHOS: &str = "dust.rhos";
/// Dust surface density per radius and species (`Nr × Nm`).
pub const DUST_SIGMA: &str = "dust.Sigma";
/// Dust surface density floor (`Nr × Nm`).
pub const DUST_SIGMA_FLOOR: &str = "dust.SigmaFloor";
/// Stokes number per radius and species (`Nr × Nm`).
pub const DUST_ST: &str = "dust.St";
/// Dust radial diffusivity (`Nr × Nm`).
pub const DUST_D: &str = "dust.D";
/// Dust velocity group.
pub const DUST_V: &str = "dust.v";
/// Fragmentation velocity (`Nr`).
pub const DUST_V_FRAG: &str = "dust.v.frag";
/// Maximum drift velocity (`Nr`).
pub const DUST_V_DRIFTMAX: &str = "dust.v.driftmax";
/// Radial dust velocity (`Nr × Nm`).
pub const DUST_V_RAD: &str = "dust.v.rad";

/// Back-reaction group.
pub const BACKREACTION: &str = "dust.backreaction";
/// Packed back-reaction coefficients.
pub const BACKREACTION_AB: &str = "dust.backreaction.AB";
/// Back-reaction coefficient A (`Nr`).
pub const BACKREACTION_A: &str = "dust.backreaction.A";
/// Back-reaction coefficient B (`Nr`).
pub const BACKREACTION_B: &str = "dust.backreaction.B";
/// Per-species coefficient A with vertical settling (`Nr × Nm`).
pub const BACKREACTION_A_VERTICAL: &str = "dust.backreaction.A_vertical";
/// Per-species coefficient B with vertical settling (`Nr × Nm`).
pub const BACKREACTION_B_VERTICAL: &str = "dust.backreaction.B_vertical";
