//! Reference integration schemes.
//!
//! Generic, physics-free schemes for wiring pipelines and testing:
//!
//! - [`ExplicitEuler`]: `y += dt * dy/dt` from a derivative field, with an
//!   optional relative-change step limit.
//! - [`ImplicitRelaxation`]: backward Euler for relaxation toward an
//!   equilibrium field on a timescale field; unconditionally stable.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod explicit_euler;
pub mod implicit_relaxation;

pub use explicit_euler::ExplicitEuler;
pub use implicit_relaxation::ImplicitRelaxation;
