//! Execution context passed to schemes.

use drift_core::{FieldPath, FrameError};
use drift_frame::ndarray::{ArrayD, ArrayViewMutD};
use drift_frame::Frame;

/// Everything a scheme sees while advancing its target.
///
/// The frame is handed over mutably; by convention a scheme writes only
/// its target and the fields it documents as re-derived.
pub struct AdvanceContext<'a> {
    frame: &'a mut Frame,
    target: &'a FieldPath,
    time: f64,
    dt: f64,
}

impl<'a> AdvanceContext<'a> {
    /// Construct a new context.
    ///
    /// Typically called by the pipeline, not by schemes directly.
    pub fn new(frame: &'a mut Frame, target: &'a FieldPath, time: f64, dt: f64) -> Self {
        Self {
            frame,
            target,
            time,
            dt,
        }
    }

    /// Read access to the whole state.
    pub fn frame(&self) -> &Frame {
        self.frame
    }

    /// Write access to the whole state.
    pub fn frame_mut(&mut self) -> &mut Frame {
        self.frame
    }

    /// The field being advanced.
    pub fn target(&self) -> &FieldPath {
        self.target
    }

    /// Current value of the target.
    pub fn target_value(&self) -> Result<&ArrayD<f64>, FrameError> {
        self.frame.get(self.target.as_str())
    }

    /// In-place view of the target.
    pub fn target_mut(&mut self) -> Result<ArrayViewMutD<'_, f64>, FrameError> {
        self.frame.value_mut(self.target.as_str())
    }

    /// Replace the target value (shape-checked).
    pub fn set_target(&mut self, value: ArrayD<f64>) -> Result<(), FrameError> {
        self.frame.set(self.target.as_str(), value)
    }

    /// Simulation time at the start of the step.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Step length.
    pub fn dt(&self) -> f64 {
        self.dt
    }
}
