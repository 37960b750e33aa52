//! Phase hooks run around the integration pipeline.
//!
//! [`PhaseHooks`] holds the two single-assignment slots. [`BoundaryPin`]
//! overrides the boundary cells of some fields, then re-derives everything
//! that depends on them. Installed with
//! [`Simulation::set_boundary_pin`](crate::Simulation::set_boundary_pin)
//! it runs on both sides of the pipeline, so schemes that write the edges
//! cannot move them. As a plain `pre_step` hook it only fixes the state
//! the schemes read.

use std::fmt;

use drift_core::{FrameError, UpdateError};
use drift_frame::ndarray::{ArrayD, Axis, Slice};
use drift_frame::Frame;

/// A hook operating on the whole field tree.
pub type PhaseHook = Box<dyn FnMut(&mut Frame) -> Result<(), UpdateError> + Send>;

/// Which hook slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Before the integration pipeline.
    PreStep,
    /// After the pipeline and the root update pass.
    PostStep,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreStep => write!(f, "pre_step"),
            Self::PostStep => write!(f, "post_step"),
        }
    }
}

/// The `pre_step` and `post_step` slots. Both default to no-ops.
#[derive(Default)]
pub struct PhaseHooks {
    pre_step: Option<PhaseHook>,
    post_step: Option<PhaseHook>,
}

impl PhaseHooks {
    /// Install `hook` in the `phase` slot, discarding any previous one.
    pub fn set(&mut self, phase: Phase, hook: PhaseHook) {
        *self.slot(phase) = Some(hook);
    }

    /// Empty the `phase` slot.
    pub fn clear(&mut self, phase: Phase) {
        *self.slot(phase) = None;
    }

    /// Whether the `phase` slot holds a hook.
    pub fn is_set(&self, phase: Phase) -> bool {
        match phase {
            Phase::PreStep => self.pre_step.is_some(),
            Phase::PostStep => self.post_step.is_some(),
        }
    }

    /// Invoke the hook in `phase`, if any.
    pub fn run(&mut self, phase: Phase, frame: &mut Frame) -> Result<(), UpdateError> {
        match self.slot(phase) {
            Some(hook) => hook(frame),
            None => Ok(()),
        }
    }

    fn slot(&mut self, phase: Phase) -> &mut Option<PhaseHook> {
        match phase {
            Phase::PreStep => &mut self.pre_step,
            Phase::PostStep => &mut self.post_step,
        }
    }
}

impl fmt::Debug for PhaseHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseHooks")
            .field("pre_step", &self.pre_step.is_some())
            .field("post_step", &self.post_step.is_some())
            .finish()
    }
}

// ── BoundaryPin ────────────────────────────────────────────────────

/// Pins the first and last `cells` entries along axis 0 of some fields to
/// reference profiles, then refreshes the listed dependents in order.
///
/// The engine performs no invalidation, so every field derived from a
/// pinned one (fluxes, velocities, Stokes numbers) must be listed as a
/// dependent; otherwise it keeps values computed from the unpinned state.
///
/// ```
/// use drift_engine::BoundaryPin;
/// use drift_frame::ndarray::{arr1, ArrayD};
/// use drift_frame::Frame;
///
/// let mut frame = Frame::new();
/// frame.add_field("", "Sigma", ArrayD::zeros(vec![6]), "").unwrap();
/// let pin = BoundaryPin::new().pin("Sigma", arr1(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).into_dyn());
/// pin.apply(&mut frame).unwrap();
/// assert_eq!(frame.get("Sigma").unwrap().as_slice().unwrap(), &[1.0, 2.0, 0.0, 0.0, 5.0, 6.0]);
/// ```
#[derive(Clone, Debug)]
pub struct BoundaryPin {
    cells: usize,
    pinned: Vec<(String, ArrayD<f64>)>,
    dependents: Vec<String>,
}

impl Default for BoundaryPin {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundaryPin {
    /// Pins two cells at each edge.
    pub fn new() -> Self {
        Self {
            cells: 2,
            pinned: Vec::new(),
            dependents: Vec::new(),
        }
    }

    /// Number of cells pinned at each edge.
    pub fn cells(mut self, cells: usize) -> Self {
        self.cells = cells;
        self
    }

    /// Pin `path` to `reference`, which must have the field's shape.
    pub fn pin(mut self, path: &str, reference: ArrayD<f64>) -> Self {
        self.pinned.push((path.to_string(), reference));
        self
    }

    /// Pin `path` to its current value.
    pub fn pin_current(self, frame: &Frame, path: &str) -> Result<Self, FrameError> {
        let reference = frame.get(path)?.clone();
        Ok(self.pin(path, reference))
    }

    /// Refresh `path` (a field or a group) after pinning.
    pub fn rederive(mut self, path: &str) -> Self {
        self.dependents.push(path.to_string());
        self
    }

    /// Overwrite the boundary cells, then refresh the dependents.
    pub fn apply(&self, frame: &mut Frame) -> Result<(), UpdateError> {
        for (path, reference) in &self.pinned {
            let mut value = frame.value_mut(path)?;
            if value.shape() != reference.shape() {
                return Err(FrameError::ShapeMismatch {
                    path: path.clone(),
                    expected: value.shape().to_vec(),
                    found: reference.shape().to_vec(),
                }
                .into());
            }
            if value.ndim() == 0 {
                continue;
            }
            let n = value.len_of(Axis(0));
            let k = self.cells.min(n);
            for range in [0..k, n - k..n] {
                let slice = Slice::from(range);
                value
                    .slice_axis_mut(Axis(0), slice)
                    .assign(&reference.slice_axis(Axis(0), slice));
            }
        }
        for path in &self.dependents {
            frame.update_path(path)?;
        }
        Ok(())
    }

    /// Box this pin as a phase hook. Edges written by the pipeline stay
    /// unpinned until the next step.
    pub fn into_hook(self) -> PhaseHook {
        Box::new(move |frame: &mut Frame| self.apply(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_frame::ndarray::{arr1, arr2};
    use drift_frame::Updater;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn frame() -> Frame {
        let mut f = Frame::new();
        f.add_field("", "Sigma", ArrayD::from_elem(vec![6], 9.0), "").unwrap();
        f.add_field("", "twice", ArrayD::zeros(vec![6]), "").unwrap();
        f.set_updater("twice", Updater::computed(|f| Ok(f.get("Sigma")? * 2.0)))
            .unwrap();
        f
    }

    #[test]
    fn slots_are_single_assignment() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut hooks = PhaseHooks::default();
        let mut f = Frame::new();
        assert!(hooks.run(Phase::PreStep, &mut f).is_ok());

        let first = Arc::clone(&calls);
        hooks.set(
            Phase::PreStep,
            Box::new(move |_: &mut Frame| -> Result<(), UpdateError> {
                first.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );
        let second = Arc::clone(&calls);
        hooks.set(
            Phase::PreStep,
            Box::new(move |_: &mut Frame| -> Result<(), UpdateError> {
                second.fetch_add(10, Ordering::SeqCst);
                Ok(())
            }),
        );
        hooks.run(Phase::PreStep, &mut f).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 10);
        assert!(!hooks.is_set(Phase::PostStep));
        hooks.clear(Phase::PreStep);
        assert!(!hooks.is_set(Phase::PreStep));
    }

    #[test]
    fn pin_overrides_edges_and_rederives() {
        let mut f = frame();
        let reference = arr1(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).into_dyn();
        let pin = BoundaryPin::new().pin("Sigma", reference).rederive("twice");
        pin.apply(&mut f).unwrap();
        assert_eq!(
            f.get("Sigma").unwrap().as_slice().unwrap(),
            &[1.0, 2.0, 9.0, 9.0, 5.0, 6.0]
        );
        assert_eq!(
            f.get("twice").unwrap().as_slice().unwrap(),
            &[2.0, 4.0, 18.0, 18.0, 10.0, 12.0]
        );
    }

    #[test]
    fn pin_applies_to_every_species() {
        let mut f = Frame::new();
        f.add_field("", "dust", ArrayD::zeros(vec![5, 2]), "").unwrap();
        let reference = arr2(&[[1.0, 1.5], [2.0, 2.5], [3.0, 3.5], [4.0, 4.5], [5.0, 5.5]]).into_dyn();
        BoundaryPin::new().cells(1).pin("dust", reference).apply(&mut f).unwrap();
        let d = f.get("dust").unwrap();
        assert_eq!(d[[0, 1]], 1.5);
        assert_eq!(d[[2, 0]], 0.0);
        assert_eq!(d[[4, 0]], 5.0);
    }

    #[test]
    fn wide_pin_covers_the_whole_field() {
        let mut f = frame();
        BoundaryPin::new()
            .cells(10)
            .pin("Sigma", ArrayD::from_elem(vec![6], 1.0))
            .apply(&mut f)
            .unwrap();
        assert!(f.get("Sigma").unwrap().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn reference_shape_is_checked() {
        let mut f = frame();
        let err = BoundaryPin::new()
            .pin("Sigma", ArrayD::zeros(vec![4]))
            .apply(&mut f)
            .unwrap_err();
        assert!(matches!(err, UpdateError::Frame(FrameError::ShapeMismatch { .. })));
    }

    #[test]
    fn pin_current_keeps_initial_edges() {
        let mut f = frame();
        let pin = BoundaryPin::new().pin_current(&f, "Sigma").unwrap();
        f.fill("Sigma", 0.0).unwrap();
        let mut hook = pin.into_hook();
        hook(&mut f).unwrap();
        assert_eq!(
            f.get("Sigma").unwrap().as_slice().unwrap(),
            &[9.0, 9.0, 0.0, 0.0, 9.0, 9.0]
        );
    }
}
