//! The run loop.
//!
//! [`Simulation`] owns the field tree, the integration pipeline, the two
//! phase hooks and the snapshot writer, and drives them through the
//! `Init → Running → Done` state machine. Any scheme, updater, hook or
//! writer failure moves it to `Fatal`, leaving every previously written
//! snapshot untouched.
//!
//! # Step order
//!
//! `pre_step → pin → run_step(dt) → t += dt → pin → update() → post_step →
//! snapshot if due → cancellation check`. The step is the smallest of the
//! configured `max_dt`, every scheme's `max_dt` and the time left to the
//! next scheduled snapshot, so snapshots land exactly on their times. A
//! step too small to advance `t` aborts the run.
//!
//! The `pin` stages run only when a [`BoundaryPin`] is installed. The
//! second one restores the edges after the schemes have written them, so
//! the root update and `post_step` see the pinned profile.

use std::cmp::Ordering;
use std::fmt;
use std::time::Instant;

use drift_core::{layout, ErrorKind, SnapshotIndex, UpdateError};
use drift_frame::ndarray::ArrayD;
use drift_frame::Frame;
use drift_integrator::{Pipeline, PipelineError};
use drift_snapshot::{DirectoryWriter, SnapshotRecord, SnapshotSink, WriteError};
use thiserror::Error;
use tracing::{debug, error, info, trace};

use crate::cancel::CancelToken;
use crate::config::{ConfigError, DiskConfig, RunConfig};
use crate::hooks::{BoundaryPin, Phase, PhaseHook, PhaseHooks};
use crate::metrics::{RunOutcome, RunSummary, StepMetrics};
use crate::schedule::SnapshotSchedule;

// Fails to compile if any part of the simulation is !Send.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<Simulation>();
    }
};

// ── State ──────────────────────────────────────────────────────────

/// Run loop state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimState {
    /// Configured, nothing run yet.
    Init,
    /// Inside `run()`.
    Running,
    /// Every scheduled time was reached. New times may be scheduled.
    Done,
    /// Stopped at a step boundary by the cancel token. Resumable.
    Interrupted,
    /// Aborted by an error. Terminal.
    Fatal,
}

impl fmt::Display for SimState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Running => "running",
            Self::Done => "done",
            Self::Interrupted => "interrupted",
            Self::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

// ── RunError ───────────────────────────────────────────────────────

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum RunError {
    /// Invalid configuration, detected before the first step.
    #[error("configuration: {0}")]
    Configuration(#[from] ConfigError),
    /// An updater failed during an update pass.
    #[error("update: {0}")]
    Update(#[from] UpdateError),
    /// A phase hook failed.
    #[error("{phase} hook: {source}")]
    Hook {
        /// The failing slot.
        phase: Phase,
        /// The underlying error.
        #[source]
        source: UpdateError,
    },
    /// The boundary pin could not be applied.
    #[error("boundary pin: {source}")]
    Boundary {
        /// The underlying error.
        #[source]
        source: UpdateError,
    },
    /// The step was too small to advance the simulation time.
    #[error("step dt={dt} does not advance t={time}")]
    TimeStalled {
        /// Simulation time at the start of the step.
        time: f64,
        /// The limited step.
        dt: f64,
    },
    /// An instruction failed or left its target invalid.
    #[error("pipeline: {0}")]
    Instruction(#[from] PipelineError),
    /// The snapshot writer failed.
    #[error("snapshot: {0}")]
    Io(#[from] WriteError),
    /// The operation is not allowed in the current state.
    #[error("cannot {action} in state {state}")]
    InvalidState {
        /// The current state.
        state: SimState,
        /// What was attempted.
        action: &'static str,
    },
}

impl RunError {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(e) => e.kind(),
            Self::Update(e) | Self::Hook { source: e, .. } | Self::Boundary { source: e } => {
                e.kind()
            }
            Self::TimeStalled { .. } => ErrorKind::Numerical,
            Self::Instruction(e) => e.kind(),
            Self::Io(e) => e.kind(),
            Self::InvalidState { .. } => ErrorKind::Configuration,
        }
    }
}

// ── Simulation ─────────────────────────────────────────────────────

/// A configured simulation: field tree, pipeline, hooks and writer.
pub struct Simulation {
    frame: Frame,
    pipeline: Pipeline,
    hooks: PhaseHooks,
    boundary: Option<BoundaryPin>,
    writer: Box<dyn SnapshotSink>,
    schedule: SnapshotSchedule,
    max_dt: Option<f64>,
    verbosity: u8,
    cancel: CancelToken,
    state: SimState,
    time: f64,
    next_index: SnapshotIndex,
    steps: u64,
    last_metrics: Option<StepMetrics>,
}

impl Simulation {
    /// Wrap an initialized field tree.
    ///
    /// The tree must hold a 0-d time field `t`; every snapshot time must
    /// lie after its current value. The writer is a [`DirectoryWriter`]
    /// over `config.writer`; nothing is touched on disk until `run()`.
    pub fn new(frame: Frame, config: RunConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let time = frame.scalar(layout::TIME)?;
        crate::schedule::check_times(&config.snapshots, time)?;
        let writer = DirectoryWriter::new(config.writer.datadir, config.writer.overwrite);
        Ok(Self {
            frame,
            pipeline: Pipeline::new(),
            hooks: PhaseHooks::default(),
            boundary: None,
            writer: Box::new(writer),
            schedule: SnapshotSchedule::new(config.snapshots)?,
            max_dt: config.max_dt,
            verbosity: config.verbosity,
            cancel: CancelToken::new(),
            state: SimState::Init,
            time,
            next_index: SnapshotIndex(0),
            steps: 0,
            last_metrics: None,
        })
    }

    /// Build the standard disk with [`initialize()`](crate::initialize)
    /// and wrap it. The pipeline starts empty.
    pub fn from_config(disk: &DiskConfig, run: RunConfig) -> Result<Self, ConfigError> {
        Self::new(crate::initialize(disk)?, run)
    }

    // ── Accessors ───────────────────────────────────────────────

    /// The field tree.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// The field tree, for reconfiguring chains and updaters.
    pub fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    /// The integration pipeline.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// The integration pipeline, for adding or removing instructions.
    pub fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    /// Replace the snapshot writer. Takes effect at the next `run()`;
    /// only a first run prepares the writer.
    pub fn set_writer(&mut self, writer: Box<dyn SnapshotSink>) {
        self.writer = writer;
    }

    /// Install the `pre_step` hook.
    pub fn set_pre_step(&mut self, hook: PhaseHook) {
        self.hooks.set(Phase::PreStep, hook);
    }

    /// Install the `post_step` hook.
    pub fn set_post_step(&mut self, hook: PhaseHook) {
        self.hooks.set(Phase::PostStep, hook);
    }

    /// Install `pin`, applied before and after the pipeline on every step.
    /// `None` removes it.
    pub fn set_boundary_pin(&mut self, pin: Option<BoundaryPin>) {
        self.boundary = pin;
    }

    /// Reset `phase` to the no-op default.
    pub fn clear_hook(&mut self, phase: Phase) {
        self.hooks.clear(phase);
    }

    /// A handle that stops the run at the next step boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Current state.
    pub fn state(&self) -> SimState {
        self.state
    }

    /// Steps taken over every run.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Metrics of the most recent step.
    pub fn last_metrics(&self) -> Option<&StepMetrics> {
        self.last_metrics.as_ref()
    }

    /// The snapshot schedule.
    pub fn schedule(&self) -> &SnapshotSchedule {
        &self.schedule
    }

    /// Schedule more snapshot times after the last one, e.g. to continue a
    /// finished run.
    pub fn schedule_snapshots(&mut self, times: &[f64]) -> Result<(), ConfigError> {
        self.schedule.extend(times)
    }

    /// Run a full update pass.
    pub fn update(&mut self) -> Result<(), UpdateError> {
        self.frame.update()
    }

    /// Replace the dust surface density before the first run, floor-clamp
    /// it and refresh the tree. Returns the number of clamped entries.
    pub fn set_initial_dust(&mut self, values: ArrayD<f64>) -> Result<usize, RunError> {
        if self.state != SimState::Init {
            return Err(RunError::InvalidState {
                state: self.state,
                action: "set the initial dust density",
            });
        }
        self.frame
            .set(layout::DUST_SIGMA, values)
            .map_err(UpdateError::from)?;
        let clamped = self
            .frame
            .clamp_to_floor(layout::DUST_SIGMA, layout::DUST_SIGMA_FLOOR)
            .map_err(UpdateError::from)?;
        self.frame.update()?;
        Ok(clamped)
    }

    // ── Run loop ────────────────────────────────────────────────

    /// Run until the last scheduled time, or until cancelled.
    ///
    /// The first call validates the pipeline, prepares the writer and
    /// writes snapshot 0 (the state before any step). Later calls resume
    /// from `Done` or `Interrupted`; a `Fatal` simulation cannot run.
    pub fn run(&mut self) -> Result<RunSummary, RunError> {
        match self.state {
            SimState::Init | SimState::Done | SimState::Interrupted => {}
            state => {
                return Err(RunError::InvalidState { state, action: "run" });
            }
        }
        match self.run_inner() {
            Ok(summary) => Ok(summary),
            Err(e) => {
                self.state = SimState::Fatal;
                error!(kind = ?e.kind(), time = self.time, error = %e, "run aborted");
                Err(e)
            }
        }
    }

    fn run_inner(&mut self) -> Result<RunSummary, RunError> {
        let first = self.state == SimState::Init;
        if first {
            self.pipeline
                .validate(&self.frame)
                .map_err(ConfigError::Pipeline)?;
            self.writer.prepare()?;
        }
        let written_before = self.writer.written();
        let steps_before = self.steps;
        if first {
            self.frame.update()?;
            self.write_snapshot()?;
        }

        self.state = SimState::Running;
        if self.verbosity >= 1 {
            info!(
                time = self.time,
                remaining = self.schedule.remaining(),
                instructions = self.pipeline.enabled_count(),
                "run started"
            );
        }

        let mut outcome = RunOutcome::Completed;
        while let Some(next) = self.schedule.next_time() {
            self.step(next)?;
            if self.cancel.is_cancelled() {
                outcome = RunOutcome::Interrupted;
                break;
            }
        }

        self.state = match outcome {
            RunOutcome::Completed => SimState::Done,
            RunOutcome::Interrupted => SimState::Interrupted,
        };
        let summary = RunSummary {
            outcome,
            steps: self.steps - steps_before,
            snapshots: self.writer.written().saturating_sub(written_before),
            final_time: self.time,
            last_step: self.last_metrics.clone(),
        };
        if self.verbosity >= 1 {
            info!(
                state = %self.state,
                steps = summary.steps,
                snapshots = summary.snapshots,
                time = summary.final_time,
                "run returned"
            );
        }
        Ok(summary)
    }

    /// One step toward the snapshot time `next`.
    fn step(&mut self, next: f64) -> Result<(), RunError> {
        let start = Instant::now();
        let mut metrics = StepMetrics::default();

        let mut dt = next - self.time;
        let mut lands = true;
        let limits = [self.max_dt, self.pipeline.max_dt(&self.frame)?];
        for limit in limits.into_iter().flatten() {
            if limit < dt {
                dt = limit;
                lands = false;
            }
        }
        // zero, negative or below the resolution of t
        let advanced = (self.time + dt).partial_cmp(&self.time) == Some(Ordering::Greater);
        if !lands && !advanced {
            return Err(RunError::TimeStalled {
                time: self.time,
                dt,
            });
        }

        let t = Instant::now();
        self.hooks
            .run(Phase::PreStep, &mut self.frame)
            .map_err(|source| RunError::Hook {
                phase: Phase::PreStep,
                source,
            })?;
        metrics.pre_step_us = t.elapsed().as_micros() as u64;

        let mut boundary_us = self.apply_boundary()?;

        let t = Instant::now();
        let timings = self.pipeline.run_step(&mut self.frame, self.time, dt)?;
        metrics.pipeline_us = t.elapsed().as_micros() as u64;
        metrics.instruction_us = timings
            .into_iter()
            .map(|timing| (timing.name, timing.elapsed_us))
            .collect();

        // landing on the scheduled time exactly keeps snapshot times free
        // of accumulated rounding
        self.time = if lands { next } else { self.time + dt };
        self.frame
            .fill(layout::TIME, self.time)
            .map_err(UpdateError::from)?;

        boundary_us += self.apply_boundary()?;
        metrics.boundary_us = boundary_us;

        let t = Instant::now();
        self.frame.update()?;
        metrics.update_us = t.elapsed().as_micros() as u64;

        let t = Instant::now();
        self.hooks
            .run(Phase::PostStep, &mut self.frame)
            .map_err(|source| RunError::Hook {
                phase: Phase::PostStep,
                source,
            })?;
        metrics.post_step_us = t.elapsed().as_micros() as u64;

        if self.schedule.is_due(self.time) {
            let t = Instant::now();
            self.write_snapshot()?;
            self.schedule.advance();
            metrics.snapshot_us = t.elapsed().as_micros() as u64;
        }

        self.steps += 1;
        metrics.total_us = start.elapsed().as_micros() as u64;
        if self.verbosity >= 2 {
            debug!(
                step = self.steps,
                time = self.time,
                dt,
                total_us = metrics.total_us,
                "step"
            );
        }
        if self.verbosity >= 3 {
            for (name, elapsed_us) in &metrics.instruction_us {
                trace!(step = self.steps, instruction = %name, elapsed_us, "instruction");
            }
        }
        self.last_metrics = Some(metrics);
        Ok(())
    }

    /// Apply the boundary pin, if any. Returns the elapsed microseconds.
    fn apply_boundary(&mut self) -> Result<u64, RunError> {
        let Some(pin) = &self.boundary else {
            return Ok(0);
        };
        let t = Instant::now();
        pin.apply(&mut self.frame)
            .map_err(|source| RunError::Boundary { source })?;
        Ok(t.elapsed().as_micros() as u64)
    }

    fn write_snapshot(&mut self) -> Result<(), RunError> {
        let record = SnapshotRecord::capture(self.next_index, self.time, &self.frame);
        self.writer.write(&record)?;
        if self.verbosity >= 1 {
            info!(index = %self.next_index, time = self.time, "snapshot written");
        }
        self.next_index = self.next_index.next();
        Ok(())
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("state", &self.state)
            .field("time", &self.time)
            .field("steps", &self.steps)
            .field("next_index", &self.next_index)
            .field("instructions", &self.pipeline.len())
            .field("hooks", &self.hooks)
            .field("boundary", &self.boundary.is_some())
            .field("snapshots_written", &self.writer.written())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_core::SchemeError;
    use drift_integrator::{AdvanceContext, Method, Scheme};
    use drift_test_utils::{line_frame, path, FailingScheme, IdentityScheme, SharedSink};
    use std::sync::{Arc, Mutex};

    struct Clock;

    impl Scheme for Clock {
        fn name(&self) -> &str {
            "clock"
        }

        fn method(&self) -> Method {
            Method::Explicit
        }

        fn advance(&self, ctx: &mut AdvanceContext<'_>) -> Result<(), SchemeError> {
            let dt = ctx.dt();
            ctx.target_mut()?.mapv_inplace(|v| v + dt);
            Ok(())
        }
    }

    fn config(snapshots: Vec<f64>, max_dt: Option<f64>) -> RunConfig {
        RunConfig {
            max_dt,
            snapshots,
            verbosity: 0,
            ..RunConfig::default()
        }
    }

    fn sim(snapshots: Vec<f64>, max_dt: Option<f64>) -> (Simulation, SharedSink) {
        let mut frame = line_frame(&["y"], 3, 0.0);
        frame
            .add_field("", "t", ArrayD::zeros(vec![]), "time")
            .unwrap();
        let mut s = Simulation::new(frame, config(snapshots, max_dt)).unwrap();
        s.pipeline_mut().push(path("y"), Clock);
        let sink = SharedSink::new();
        s.set_writer(Box::new(sink.clone()));
        (s, sink)
    }

    #[test]
    fn steps_land_on_snapshot_times() {
        let (mut s, sink) = sim(vec![1.0, 2.5], Some(1.0));
        let summary = s.run().unwrap();
        assert_eq!(summary.outcome, RunOutcome::Completed);
        assert_eq!(summary.steps, 3);
        assert_eq!(summary.snapshots, 3);
        assert_eq!(summary.final_time, 2.5);
        assert_eq!(s.state(), SimState::Done);
        assert_eq!(sink.stamps(), vec![(0, 0.0), (1, 1.0), (2, 2.5)]);
        assert_eq!(s.frame().scalar("t").unwrap(), 2.5);
        assert!(s.last_metrics().is_some());
    }

    #[test]
    fn snapshot_zero_is_the_initial_state() {
        let (mut s, sink) = sim(vec![1.0], None);
        s.run().unwrap();
        let records = sink.records();
        assert_eq!(records[0].field("y").unwrap().sum(), 0.0);
        assert_eq!(records[1].field("y").unwrap().sum(), 3.0);
    }

    #[test]
    fn finished_run_continues_with_new_times() {
        let (mut s, sink) = sim(vec![1.0], None);
        s.run().unwrap();
        s.schedule_snapshots(&[2.0, 3.0]).unwrap();
        let summary = s.run().unwrap();
        assert_eq!(summary.steps, 2);
        assert_eq!(summary.snapshots, 2);
        assert_eq!(sink.stamps().last(), Some(&(3, 3.0)));
    }

    #[test]
    fn hooks_run_once_per_step() {
        let (mut s, _sink) = sim(vec![1.0, 2.0, 3.0], None);
        let log = Arc::new(Mutex::new(Vec::new()));
        let pre = Arc::clone(&log);
        s.set_pre_step(Box::new(move |_: &mut Frame| -> Result<(), UpdateError> {
            pre.lock().unwrap().push("pre");
            Ok(())
        }));
        let post = Arc::clone(&log);
        s.set_post_step(Box::new(move |f: &mut Frame| -> Result<(), UpdateError> {
            // time is already advanced when post_step runs
            assert!(f.scalar("t")? > 0.0);
            post.lock().unwrap().push("post");
            Ok(())
        }));
        s.run().unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["pre", "post", "pre", "post", "pre", "post"]
        );
    }

    #[test]
    fn cancel_interrupts_at_a_step_boundary() {
        let (mut s, sink) = sim(vec![1.0, 2.0, 3.0], None);
        let token = s.cancel_token();
        s.set_post_step(Box::new(move |_: &mut Frame| -> Result<(), UpdateError> {
            token.cancel();
            Ok(())
        }));
        let summary = s.run().unwrap();
        assert_eq!(summary.outcome, RunOutcome::Interrupted);
        assert_eq!(summary.steps, 1);
        assert_eq!(s.state(), SimState::Interrupted);

        s.clear_hook(Phase::PostStep);
        s.cancel_token().reset();
        let summary = s.run().unwrap();
        assert_eq!(summary.outcome, RunOutcome::Completed);
        assert_eq!(summary.steps, 2);
        assert_eq!(sink.stamps().len(), 4);
    }

    #[test]
    fn write_conflict_fails_before_any_snapshot() {
        let (mut s, sink) = sim(vec![1.0, 2.0, 3.0], None);
        s.pipeline_mut().push(path("y"), IdentityScheme::new("noop"));
        let err = s.run().unwrap_err();
        assert!(matches!(
            err,
            RunError::Configuration(ConfigError::Pipeline(PipelineError::WriteConflict { .. }))
        ));
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(s.state(), SimState::Fatal);
        assert!(sink.stamps().is_empty());
    }

    #[test]
    fn scheme_failure_keeps_earlier_snapshots() {
        let mut frame = line_frame(&["y"], 3, 0.0);
        frame
            .add_field("", "t", ArrayD::zeros(vec![]), "time")
            .unwrap();
        let mut s = Simulation::new(frame, config(vec![1.0, 2.0, 3.0], None)).unwrap();
        s.pipeline_mut().push(path("y"), FailingScheme::new("flaky", 1));
        let sink = SharedSink::new();
        s.set_writer(Box::new(sink.clone()));

        let err = s.run().unwrap_err();
        assert!(matches!(err, RunError::Instruction(PipelineError::InstructionFailed { .. })));
        assert_eq!(s.state(), SimState::Fatal);
        assert_eq!(sink.stamps(), vec![(0, 0.0), (1, 1.0)]);

        let again = s.run().unwrap_err();
        assert!(matches!(
            again,
            RunError::InvalidState {
                state: SimState::Fatal,
                ..
            }
        ));
    }

    #[test]
    fn hook_errors_name_their_phase() {
        let (mut s, _sink) = sim(vec![1.0], None);
        s.set_pre_step(Box::new(|f: &mut Frame| -> Result<(), UpdateError> {
            f.update_path("missing")
        }));
        let err = s.run().unwrap_err();
        assert!(matches!(
            err,
            RunError::Hook {
                phase: Phase::PreStep,
                ..
            }
        ));
        assert!(err.to_string().starts_with("pre_step hook"));
    }

    #[test]
    fn scheme_limit_shortens_the_step() {
        struct Slow;
        impl Scheme for Slow {
            fn name(&self) -> &str {
                "slow"
            }
            fn method(&self) -> Method {
                Method::Explicit
            }
            fn max_dt(&self, _frame: &Frame, _target: &drift_core::FieldPath) -> Option<f64> {
                Some(0.25)
            }
            fn advance(&self, _ctx: &mut AdvanceContext<'_>) -> Result<(), SchemeError> {
                Ok(())
            }
        }
        let mut frame = line_frame(&["y", "z"], 3, 0.0);
        frame
            .add_field("", "t", ArrayD::zeros(vec![]), "time")
            .unwrap();
        let mut s = Simulation::new(frame, config(vec![1.0], Some(0.5))).unwrap();
        s.pipeline_mut().push(path("y"), Clock);
        s.pipeline_mut().push(path("z"), Slow);
        s.set_writer(Box::new(SharedSink::new()));
        let summary = s.run().unwrap();
        assert_eq!(summary.steps, 4);
        assert_eq!(s.time(), 1.0);
    }

    #[test]
    fn pin_restores_edges_written_by_the_pipeline() {
        let mut frame = line_frame(&["y"], 6, 1.0);
        frame
            .add_field("", "t", ArrayD::zeros(vec![]), "time")
            .unwrap();
        let pin = BoundaryPin::new().pin_current(&frame, "y").unwrap();
        let mut s = Simulation::new(frame, config(vec![1.0, 2.0], None)).unwrap();
        s.pipeline_mut().push(path("y"), Clock);
        s.set_boundary_pin(Some(pin));
        let sink = SharedSink::new();
        s.set_writer(Box::new(sink.clone()));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        s.set_post_step(Box::new(move |f: &mut Frame| -> Result<(), UpdateError> {
            log.lock().unwrap().push(f.get("y")?[[0]]);
            Ok(())
        }));
        s.run().unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![1.0, 1.0]);
        let last = sink.records().pop().unwrap();
        assert_eq!(
            last.field("y").unwrap().as_slice().unwrap(),
            &[1.0, 1.0, 3.0, 3.0, 1.0, 1.0]
        );
        assert!(s.last_metrics().is_some());
    }

    #[test]
    fn pin_failure_is_fatal() {
        let (mut s, _sink) = sim(vec![1.0], None);
        s.set_boundary_pin(Some(BoundaryPin::new().pin("y", ArrayD::zeros(vec![4]))));
        let err = s.run().unwrap_err();
        assert!(matches!(err, RunError::Boundary { .. }));
        assert_eq!(err.kind(), ErrorKind::Dependency);
        assert_eq!(s.state(), SimState::Fatal);
    }

    #[test]
    fn step_below_time_resolution_aborts() {
        struct Tiny;
        impl Scheme for Tiny {
            fn name(&self) -> &str {
                "tiny"
            }
            fn method(&self) -> Method {
                Method::Explicit
            }
            fn max_dt(&self, _frame: &Frame, _target: &drift_core::FieldPath) -> Option<f64> {
                Some(1e-20)
            }
            fn advance(&self, _ctx: &mut AdvanceContext<'_>) -> Result<(), SchemeError> {
                Ok(())
            }
        }
        let mut frame = line_frame(&["y"], 3, 0.0);
        frame
            .add_field("", "t", ArrayD::from_elem(vec![], 1.0), "time")
            .unwrap();
        let mut s = Simulation::new(frame, config(vec![2.0], None)).unwrap();
        s.pipeline_mut().push(path("y"), Tiny);
        let sink = SharedSink::new();
        s.set_writer(Box::new(sink.clone()));

        let err = s.run().unwrap_err();
        assert!(matches!(err, RunError::TimeStalled { time, .. } if time == 1.0));
        assert_eq!(err.kind(), ErrorKind::Numerical);
        assert_eq!(s.state(), SimState::Fatal);
        assert_eq!(s.time(), 1.0);
        assert_eq!(s.steps(), 0);
        assert_eq!(sink.stamps(), vec![(0, 1.0)]);
    }

    #[test]
    fn new_requires_a_time_field() {
        let frame = line_frame(&["y"], 3, 0.0);
        let err = Simulation::new(frame, config(vec![1.0], None)).unwrap_err();
        assert!(matches!(err, ConfigError::Frame(_)));
    }

    #[test]
    fn initial_dust_only_before_the_first_run() {
        let (mut s, _sink) = sim(vec![1.0], None);
        s.run().unwrap();
        let err = s.set_initial_dust(ArrayD::zeros(vec![3])).unwrap_err();
        assert!(matches!(err, RunError::InvalidState { state: SimState::Done, .. }));
    }
}
