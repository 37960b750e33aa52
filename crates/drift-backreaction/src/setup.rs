//! Wiring the back-reaction coefficients into the update graph.

use std::sync::Arc;

use drift_core::{layout, ComputeError, ErrorKind, FrameError, UpdateError};
use drift_frame::ndarray::{s, Array2, ArrayD, Axis, Ix2};
use drift_frame::{Frame, GroupHook, Updater};
use thiserror::Error;
use tracing::debug;

use crate::inputs::BackreactionInputs;
use crate::model::{BulkModel, VerticalModel};

/// Which coefficient model drives the `AB` field.
#[derive(Clone)]
pub enum Structure {
    /// One pair per radius.
    Bulk(Arc<dyn BulkModel>),
    /// One pair per radius and species, plus a gas pair.
    Vertical(Arc<dyn VerticalModel>),
}

impl Structure {
    fn is_vertical(&self) -> bool {
        matches!(self, Self::Vertical(_))
    }
}

/// Updaters installed on the three coefficient consumers.
#[derive(Clone, Debug)]
pub struct Consumers {
    /// Radial gas velocity (`gas.v.rad`).
    pub gas_velocity: Updater,
    /// Radial dust velocity per species (`dust.v.rad`).
    pub dust_velocity: Updater,
    /// Dust diffusivity (`dust.D`).
    pub dust_diffusivity: Updater,
}

/// Everything [`setup_backreaction`] installs.
#[derive(Clone)]
pub struct Backreaction {
    /// Coefficient model.
    pub structure: Structure,
    /// Consumer updaters.
    pub consumers: Consumers,
    /// Optional `dust.v` diastole hook re-deriving the radial velocities.
    pub velocity_update: Option<GroupHook>,
}

/// Errors from [`setup_backreaction`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum BackreactionError {
    /// The tree lacks a required node, or a node has the wrong kind.
    #[error(transparent)]
    Frame(#[from] FrameError),
    /// The initial update after wiring failed.
    #[error(transparent)]
    Update(#[from] UpdateError),
    /// A field that must be recomputed is not reachable from the root chain.
    #[error("'{path}' is not scheduled by any update chain")]
    NotScheduled {
        /// The unscheduled field.
        path: String,
    },
    /// A consumer is last recomputed before the coefficients are.
    #[error("'{field}' is recomputed before '{coefficients}'; it would read stale coefficients")]
    Ordering {
        /// The consumer.
        field: String,
        /// The coefficient field it depends on.
        coefficients: String,
    },
}

impl BackreactionError {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Update(e) => e.kind(),
            _ => ErrorKind::Dependency,
        }
    }
}

fn ab_matrix(frame: &Frame) -> Result<Array2<f64>, ComputeError> {
    let ab = frame.get(layout::BACKREACTION_AB)?;
    ab.view()
        .into_dimensionality::<Ix2>()
        .map(|v| v.to_owned())
        .map_err(|_| {
            ComputeError::Frame(FrameError::ShapeMismatch {
                path: layout::BACKREACTION_AB.to_string(),
                expected: vec![0, 0],
                found: ab.shape().to_vec(),
            })
        })
}

fn row_updater(row: impl Fn(usize) -> usize + Send + Sync + 'static) -> Updater {
    Updater::computed(move |frame| {
        let ab = ab_matrix(frame)?;
        let k = row(ab.nrows());
        if k >= ab.nrows() {
            return Err(ComputeError::Invalid(format!(
                "AB has {} rows, row {k} requested",
                ab.nrows()
            )));
        }
        Ok(ab.index_axis(Axis(0), k).to_owned().into_dyn())
    })
}

fn block_updater(first_row: impl Fn(usize) -> usize + Send + Sync + 'static) -> Updater {
    Updater::computed(move |frame| {
        let ab = ab_matrix(frame)?;
        let nm = (ab.nrows() / 2).saturating_sub(1);
        let start = first_row(nm);
        let block = ab.slice(s![start..start + nm, ..]);
        Ok(block.t().to_owned().into_dyn())
    })
}

/// Add the back-reaction coefficients to a standard tree and route them
/// to their consumers.
///
/// Installs, in order:
///
/// 1. `dust.backreaction.AB` (plus `A_vertical`/`B_vertical` for the
///    vertical variant) holding the dust-free limit.
/// 2. The chain `["AB", "A", "B"(, "A_vertical", "B_vertical")]` on
///    `dust.backreaction`.
/// 3. The model on `AB` and extraction updaters on the coefficient fields.
/// 4. The consumer updaters on `gas.v.rad`, `dust.v.rad` and `dust.D`.
/// 5. The optional `dust.v` diastole hook.
///
/// It then checks that `AB` is recomputed before any coefficient field
/// and consumer, and finishes with a full [`Frame::update()`].
///
/// The wiring is built on a copy of `frame` that replaces it only once
/// every step succeeded, so on error `frame` is left as it was and the
/// call can be retried.
pub fn setup_backreaction(frame: &mut Frame, config: Backreaction) -> Result<(), BackreactionError> {
    let mut wired = frame.clone();
    wire(&mut wired, config)?;
    *frame = wired;
    Ok(())
}

fn wire(frame: &mut Frame, config: Backreaction) -> Result<(), BackreactionError> {
    frame.group(layout::BACKREACTION)?;
    let nr = frame.get(layout::GRID_R)?.len();
    let dust_shape = frame.get(layout::DUST_SIGMA)?.shape().to_vec();
    let nm = match dust_shape.as_slice() {
        &[rows, nm] if rows == nr => nm,
        _ => {
            return Err(FrameError::ShapeMismatch {
                path: layout::DUST_SIGMA.to_string(),
                expected: vec![nr, 0],
                found: dust_shape,
            }
            .into())
        }
    };
    let vertical = config.structure.is_vertical();

    // ── Fields and chain ──
    if vertical {
        frame.add_field(
            layout::BACKREACTION,
            "AB",
            ArrayD::ones(vec![2 * (nm + 1), nr]),
            "Backreaction coefficients (joint, internal)",
        )?;
        frame.add_field(
            layout::BACKREACTION,
            "A_vertical",
            ArrayD::ones(vec![nr, nm]),
            "Backreaction coefficient A, considering dust vertical settling",
        )?;
        frame.add_field(
            layout::BACKREACTION,
            "B_vertical",
            ArrayD::zeros(vec![nr, nm]),
            "Backreaction coefficient B, considering dust vertical settling",
        )?;
        frame.set_chain(layout::BACKREACTION, &["AB", "A", "B", "A_vertical", "B_vertical"])?;
    } else {
        let mut ab = ArrayD::zeros(vec![2, nr]);
        ab.index_axis_mut(Axis(0), 0).fill(1.0);
        frame.add_field(
            layout::BACKREACTION,
            "AB",
            ab,
            "Backreaction coefficients (joint, internal)",
        )?;
        frame.set_chain(layout::BACKREACTION, &["AB", "A", "B"])?;
    }

    // ── Coefficient updaters ──
    match config.structure {
        Structure::Bulk(model) => {
            frame.set_updater(
                layout::BACKREACTION_AB,
                Updater::computed(move |frame| {
                    let inputs = BackreactionInputs::gather(frame)?;
                    let packed = model.coefficients(&inputs)?.pack(inputs.nr())?;
                    Ok(packed.into_dyn())
                }),
            )?;
            frame.set_updater(layout::BACKREACTION_A, row_updater(|_| 0))?;
            frame.set_updater(layout::BACKREACTION_B, row_updater(|_| 1))?;
        }
        Structure::Vertical(model) => {
            frame.set_updater(
                layout::BACKREACTION_AB,
                Updater::computed(move |frame| {
                    let inputs = BackreactionInputs::gather(frame)?;
                    let packed = model
                        .coefficients(&inputs)?
                        .pack(inputs.nr(), inputs.nm())?;
                    Ok(packed.into_dyn())
                }),
            )?;
            // gas rows follow each block of Nm species rows
            frame.set_updater(layout::BACKREACTION_A, row_updater(|rows| rows / 2 - 1))?;
            frame.set_updater(layout::BACKREACTION_B, row_updater(|rows| rows - 1))?;
            frame.set_updater(layout::BACKREACTION_A_VERTICAL, block_updater(|_| 0))?;
            frame.set_updater(layout::BACKREACTION_B_VERTICAL, block_updater(|nm| nm + 1))?;
        }
    }

    // ── Consumers ──
    frame.set_updater(layout::GAS_V_RAD, config.consumers.gas_velocity)?;
    frame.set_updater(layout::DUST_V_RAD, config.consumers.dust_velocity)?;
    frame.set_updater(layout::DUST_D, config.consumers.dust_diffusivity)?;
    if let Some(hook) = config.velocity_update {
        frame.set_diastole(layout::DUST_V, Some(hook))?;
    }

    let mut downstream = vec![layout::BACKREACTION_A, layout::BACKREACTION_B];
    if vertical {
        downstream.extend([layout::BACKREACTION_A_VERTICAL, layout::BACKREACTION_B_VERTICAL]);
    }
    downstream.extend([layout::GAS_V_RAD, layout::DUST_V_RAD, layout::DUST_D]);
    check_ordering(frame, layout::BACKREACTION_AB, &downstream)?;

    debug!(nr, nm, vertical, "back-reaction wired");
    frame.update()?;
    Ok(())
}

/// Require every entry of `downstream` to be last visited after the last
/// visit of `source` in the root evaluation order.
fn check_ordering(frame: &Frame, source: &str, downstream: &[&str]) -> Result<(), BackreactionError> {
    let order = frame.evaluation_order();
    let last_visit = |path: &str| order.iter().rposition(|p| p.as_str() == path);
    let source_at = last_visit(source).ok_or_else(|| BackreactionError::NotScheduled {
        path: source.to_string(),
    })?;
    for &field in downstream {
        match last_visit(field) {
            None => {
                return Err(BackreactionError::NotScheduled {
                    path: field.to_string(),
                })
            }
            Some(at) if at < source_at => {
                return Err(BackreactionError::Ordering {
                    field: field.to_string(),
                    coefficients: source.to_string(),
                })
            }
            Some(_) => {}
        }
    }
    Ok(())
}
