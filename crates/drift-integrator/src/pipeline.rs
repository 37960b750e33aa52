//! The ordered instruction pipeline.
//!
//! [`Pipeline::validate`] runs once at INIT to reject structural errors;
//! [`Pipeline::run_step`] advances every enabled instruction in order and
//! checks each target's values before the next instruction reads them.

use std::time::Instant;

use drift_core::{ErrorKind, FieldPath, InstructionId, SchemeError};
use drift_frame::{check_values, Frame};
use indexmap::IndexMap;
use thiserror::Error;
use tracing::trace;

use crate::context::AdvanceContext;
use crate::scheme::{Method, Scheme};

// ── Instructions ───────────────────────────────────────────────────

/// One pipeline entry: a target field advanced by a scheme.
pub struct Instruction {
    id: InstructionId,
    target: FieldPath,
    scheme: Box<dyn Scheme>,
    enabled: bool,
}

impl Instruction {
    /// Stable identifier.
    pub fn id(&self) -> InstructionId {
        self.id
    }

    /// The field this instruction advances.
    pub fn target(&self) -> &FieldPath {
        &self.target
    }

    /// The scheme's name.
    pub fn name(&self) -> &str {
        self.scheme.name()
    }

    /// The scheme's time-stepping family.
    pub fn method(&self) -> Method {
        self.scheme.method()
    }

    /// The advance scheme.
    pub fn scheme(&self) -> &dyn Scheme {
        self.scheme.as_ref()
    }

    /// Whether `run_step` executes this instruction.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl std::fmt::Debug for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instruction")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("scheme", &self.scheme.name())
            .field("method", &self.scheme.method())
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Wall-clock time spent in one instruction during a step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstructionTiming {
    /// The instruction.
    pub id: InstructionId,
    /// Its scheme's name.
    pub name: String,
    /// Duration in microseconds.
    pub elapsed_us: u64,
}

// ── Errors ─────────────────────────────────────────────────────────

/// Errors from pipeline validation and execution.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum PipelineError {
    /// Nothing would advance.
    #[error("pipeline has no enabled instruction")]
    NoEnabledInstruction,

    /// An instruction targets a field that does not exist.
    #[error("instruction '{instruction}' targets undefined field '{target}'")]
    UndefinedTarget {
        /// Scheme name of the instruction.
        instruction: String,
        /// The missing target.
        target: String,
    },

    /// A scheme reads a field that does not exist.
    #[error("instruction '{instruction}' reads undefined field '{input}'")]
    UndefinedInput {
        /// Scheme name of the instruction.
        instruction: String,
        /// The missing input.
        input: String,
    },

    /// Two enabled instructions advance the same field.
    #[error("field '{target}' is advanced by both '{first}' and '{second}'")]
    WriteConflict {
        /// The contested field.
        target: String,
        /// The earlier instruction.
        first: String,
        /// The later instruction.
        second: String,
    },

    /// No instruction carries this id.
    #[error("no instruction with id {id}")]
    UnknownInstruction {
        /// The requested id.
        id: InstructionId,
    },

    /// A scheme's `max_dt()` returned a non-finite or non-positive value.
    #[error("instruction '{instruction}' returned invalid max_dt: {value} (must be finite and positive)")]
    InvalidMaxDt {
        /// Scheme name of the instruction.
        instruction: String,
        /// The invalid value.
        value: f64,
    },

    /// The requested step is not a valid timestep.
    #[error("dt must be finite and positive, got {value}")]
    InvalidDt {
        /// The invalid dt.
        value: f64,
    },

    /// An instruction's scheme failed, or left its target invalid.
    #[error("instruction {id} '{name}' failed: {source}")]
    InstructionFailed {
        /// The failing instruction.
        id: InstructionId,
        /// Its scheme's name.
        name: String,
        /// The underlying error.
        #[source]
        source: SchemeError,
    },
}

impl PipelineError {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InstructionFailed { source, .. } => source.kind(),
            Self::UndefinedTarget { .. } | Self::UndefinedInput { .. } => ErrorKind::Dependency,
            _ => ErrorKind::Configuration,
        }
    }
}

// ── Pipeline ───────────────────────────────────────────────────────

/// Ordered list of instructions. Order is advance order within a step.
#[derive(Debug, Default)]
pub struct Pipeline {
    instructions: Vec<Instruction>,
    next_id: u64,
}

impl Pipeline {
    /// An empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    fn issue(&mut self, target: FieldPath, scheme: Box<dyn Scheme>) -> Instruction {
        let id = InstructionId(self.next_id);
        self.next_id += 1;
        Instruction {
            id,
            target,
            scheme,
            enabled: true,
        }
    }

    fn position(&self, id: InstructionId) -> Result<usize, PipelineError> {
        self.instructions
            .iter()
            .position(|i| i.id == id)
            .ok_or(PipelineError::UnknownInstruction { id })
    }

    /// Append an enabled instruction.
    pub fn push<S: Scheme>(&mut self, target: FieldPath, scheme: S) -> InstructionId {
        let instruction = self.issue(target, Box::new(scheme));
        let id = instruction.id;
        self.instructions.push(instruction);
        id
    }

    /// Insert an enabled instruction immediately before `before`.
    pub fn insert_before<S: Scheme>(
        &mut self,
        before: InstructionId,
        target: FieldPath,
        scheme: S,
    ) -> Result<InstructionId, PipelineError> {
        let at = self.position(before)?;
        let instruction = self.issue(target, Box::new(scheme));
        let id = instruction.id;
        self.instructions.insert(at, instruction);
        Ok(id)
    }

    /// Remove an instruction permanently. Its target is never advanced
    /// again by this pipeline.
    pub fn remove(&mut self, id: InstructionId) -> Result<Instruction, PipelineError> {
        let at = self.position(id)?;
        Ok(self.instructions.remove(at))
    }

    /// Enable or disable an instruction without removing it.
    pub fn set_enabled(&mut self, id: InstructionId, enabled: bool) -> Result<(), PipelineError> {
        let at = self.position(id)?;
        self.instructions[at].enabled = enabled;
        Ok(())
    }

    /// First instruction advancing `target`.
    pub fn find(&self, target: &str) -> Option<InstructionId> {
        self.instructions
            .iter()
            .find(|i| i.target.as_str() == target)
            .map(|i| i.id)
    }

    /// Look up an instruction.
    pub fn get(&self, id: InstructionId) -> Option<&Instruction> {
        self.instructions.iter().find(|i| i.id == id)
    }

    /// Instructions in advance order.
    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter()
    }

    /// Number of instructions, enabled or not.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the pipeline holds no instruction.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Number of enabled instructions.
    pub fn enabled_count(&self) -> usize {
        self.instructions.iter().filter(|i| i.enabled).count()
    }

    fn enabled(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter().filter(|i| i.enabled)
    }

    /// Check the enabled instructions against a frame.
    ///
    /// Checks performed:
    ///
    /// 1. At least one instruction is enabled.
    /// 2. Every target exists and is a field.
    /// 3. Every declared input exists.
    /// 4. No two enabled instructions advance the same field.
    /// 5. Every scheme's current `max_dt` is valid.
    pub fn validate(&self, frame: &Frame) -> Result<(), PipelineError> {
        if self.enabled_count() == 0 {
            return Err(PipelineError::NoEnabledInstruction);
        }

        for inst in self.enabled() {
            if frame.field(inst.target.as_str()).is_err() {
                return Err(PipelineError::UndefinedTarget {
                    instruction: inst.name().to_string(),
                    target: inst.target.as_str().to_string(),
                });
            }
            for input in inst.scheme.reads() {
                if !frame.contains(input.as_str()) {
                    return Err(PipelineError::UndefinedInput {
                        instruction: inst.name().to_string(),
                        input: input.as_str().to_string(),
                    });
                }
            }
        }

        let mut writers: IndexMap<&str, &str> = IndexMap::new();
        for inst in self.enabled() {
            if let Some(first) = writers.insert(inst.target.as_str(), inst.name()) {
                return Err(PipelineError::WriteConflict {
                    target: inst.target.as_str().to_string(),
                    first: first.to_string(),
                    second: inst.name().to_string(),
                });
            }
        }

        self.max_dt(frame).map(|_| ())
    }

    /// Tightest `max_dt` over the enabled instructions, if any imposes one.
    pub fn max_dt(&self, frame: &Frame) -> Result<Option<f64>, PipelineError> {
        let mut tightest: Option<f64> = None;
        for inst in self.enabled() {
            if let Some(max) = inst.scheme.max_dt(frame, &inst.target) {
                if !max.is_finite() || max <= 0.0 {
                    return Err(PipelineError::InvalidMaxDt {
                        instruction: inst.name().to_string(),
                        value: max,
                    });
                }
                tightest = Some(tightest.map_or(max, |t| t.min(max)));
            }
        }
        Ok(tightest)
    }

    /// Advance every enabled instruction by `dt`, in order.
    ///
    /// Aborts at the first failure; instructions before it have already
    /// mutated the frame.
    pub fn run_step(
        &self,
        frame: &mut Frame,
        time: f64,
        dt: f64,
    ) -> Result<Vec<InstructionTiming>, PipelineError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(PipelineError::InvalidDt { value: dt });
        }
        let mut timings = Vec::with_capacity(self.instructions.len());
        for inst in self.enabled() {
            let start = Instant::now();
            let failed = |source: SchemeError| PipelineError::InstructionFailed {
                id: inst.id,
                name: inst.name().to_string(),
                source,
            };

            let mut ctx = AdvanceContext::new(frame, &inst.target, time, dt);
            inst.scheme.advance(&mut ctx).map_err(failed)?;

            let field = frame
                .field(inst.target.as_str())
                .map_err(|e| failed(e.into()))?;
            check_values(inst.target.as_str(), field.value().view(), field.domain())
                .map_err(|e| failed(e.into()))?;

            let elapsed_us = start.elapsed().as_micros() as u64;
            trace!(instruction = %inst.id, name = inst.name(), elapsed_us, "advanced");
            timings.push(InstructionTiming {
                id: inst.id,
                name: inst.name().to_string(),
                elapsed_us,
            });
        }
        Ok(timings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_core::NumericalError;
    use drift_frame::ndarray::{arr1, ArrayD, IxDyn};
    use drift_frame::Domain;

    // ── Test schemes ───────────────────────────────────────────

    /// Adds `dt` to every entry of the target.
    struct AddDt;
    impl Scheme for AddDt {
        fn name(&self) -> &str {
            "AddDt"
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

    /// Copies field `y` into the target.
    struct CopyY;
    impl Scheme for CopyY {
        fn name(&self) -> &str {
            "CopyY"
        }
        fn method(&self) -> Method {
            Method::Implicit
        }
        fn reads(&self) -> Vec<FieldPath> {
            vec![FieldPath::parse("y").unwrap()]
        }
        fn advance(&self, ctx: &mut AdvanceContext<'_>) -> Result<(), SchemeError> {
            let y = ctx.frame().get("y")?.clone();
            ctx.set_target(y)?;
            Ok(())
        }
    }

    /// Declares a fixed `max_dt`.
    struct Limited(f64);
    impl Scheme for Limited {
        fn name(&self) -> &str {
            "Limited"
        }
        fn method(&self) -> Method {
            Method::Explicit
        }
        fn max_dt(&self, _frame: &Frame, _target: &FieldPath) -> Option<f64> {
            Some(self.0)
        }
        fn advance(&self, _ctx: &mut AdvanceContext<'_>) -> Result<(), SchemeError> {
            Ok(())
        }
    }

    /// Writes -1 into the target.
    struct Negate;
    impl Scheme for Negate {
        fn name(&self) -> &str {
            "Negate"
        }
        fn method(&self) -> Method {
            Method::Explicit
        }
        fn advance(&self, ctx: &mut AdvanceContext<'_>) -> Result<(), SchemeError> {
            ctx.target_mut()?.fill(-1.0);
            Ok(())
        }
    }

    fn path(s: &str) -> FieldPath {
        FieldPath::parse(s).unwrap()
    }

    fn frame() -> Frame {
        let mut f = Frame::new();
        f.add_field("", "y", arr1(&[1.0, 2.0]).into_dyn(), "").unwrap();
        f.add_field("", "z", ArrayD::zeros(IxDyn(&[2])), "").unwrap();
        f
    }

    // ── Editing ────────────────────────────────────────────────

    #[test]
    fn ids_are_stable_across_removal() {
        let mut p = Pipeline::new();
        let a = p.push(path("y"), AddDt);
        let b = p.push(path("z"), AddDt);
        let c = p.push(path("y"), Limited(1.0));
        p.remove(a).unwrap();
        // removing `a` does not change what `c` refers to
        assert_eq!(p.remove(c).unwrap().name(), "Limited");
        assert_eq!(p.len(), 1);
        assert_eq!(p.iter().next().unwrap().id(), b);
        assert_eq!(
            p.remove(a).unwrap_err(),
            PipelineError::UnknownInstruction { id: a }
        );
    }

    #[test]
    fn ids_never_reused() {
        let mut p = Pipeline::new();
        let a = p.push(path("y"), AddDt);
        p.remove(a).unwrap();
        let b = p.push(path("y"), AddDt);
        assert_ne!(a, b);
    }

    #[test]
    fn insert_before_places_instruction() {
        let mut p = Pipeline::new();
        let a = p.push(path("y"), AddDt);
        let b = p.insert_before(a, path("z"), CopyY).unwrap();
        let order: Vec<_> = p.iter().map(Instruction::id).collect();
        assert_eq!(order, vec![b, a]);
        assert_eq!(p.find("z"), Some(b));
        assert_eq!(p.find("missing"), None);
    }

    // ── Validation ─────────────────────────────────────────────

    #[test]
    fn all_disabled_fails_validation() {
        let mut p = Pipeline::new();
        let a = p.push(path("y"), AddDt);
        p.set_enabled(a, false).unwrap();
        assert_eq!(p.validate(&frame()), Err(PipelineError::NoEnabledInstruction));
        assert_eq!(Pipeline::new().validate(&frame()), Err(PipelineError::NoEnabledInstruction));
    }

    #[test]
    fn undefined_target_and_input() {
        let mut f = Frame::new();
        f.add_field("", "z", ArrayD::zeros(IxDyn(&[2])), "").unwrap();
        let mut p = Pipeline::new();
        p.push(path("z"), CopyY);
        assert!(matches!(p.validate(&f), Err(PipelineError::UndefinedInput { .. })));

        let mut p = Pipeline::new();
        p.push(path("missing"), AddDt);
        let err = p.validate(&f).unwrap_err();
        assert!(matches!(err, PipelineError::UndefinedTarget { .. }));
        assert_eq!(err.kind(), ErrorKind::Dependency);
    }

    #[test]
    fn group_target_rejected() {
        let mut f = frame();
        f.add_group("", "gas", "").unwrap();
        let mut p = Pipeline::new();
        p.push(path("gas"), AddDt);
        assert!(matches!(p.validate(&f), Err(PipelineError::UndefinedTarget { .. })));
    }

    #[test]
    fn write_conflict_only_between_enabled() {
        let mut p = Pipeline::new();
        p.push(path("y"), AddDt);
        let second = p.push(path("y"), Limited(1.0));
        assert!(matches!(
            p.validate(&frame()),
            Err(PipelineError::WriteConflict { ref first, .. }) if first == "AddDt"
        ));
        p.set_enabled(second, false).unwrap();
        assert!(p.validate(&frame()).is_ok());
    }

    #[test]
    fn max_dt_is_tightest_and_validated() {
        let mut p = Pipeline::new();
        p.push(path("y"), Limited(2.0));
        p.push(path("z"), Limited(0.5));
        assert_eq!(p.max_dt(&frame()).unwrap(), Some(0.5));

        let mut bad = Pipeline::new();
        bad.push(path("y"), Limited(f64::NAN));
        assert!(matches!(bad.validate(&frame()), Err(PipelineError::InvalidMaxDt { .. })));

        let mut none = Pipeline::new();
        none.push(path("y"), AddDt);
        assert_eq!(none.max_dt(&frame()).unwrap(), None);
    }

    // ── Execution ──────────────────────────────────────────────

    #[test]
    fn run_step_executes_in_order() {
        let mut f = frame();
        let mut p = Pipeline::new();
        p.push(path("y"), AddDt);
        p.push(path("z"), CopyY);
        let timings = p.run_step(&mut f, 0.0, 0.5).unwrap();
        // z copies y after y was advanced
        assert_eq!(f.get("z").unwrap().as_slice().unwrap(), &[1.5, 2.5]);
        assert_eq!(timings.len(), 2);
        assert_eq!(timings[1].name, "CopyY");
    }

    #[test]
    fn disabled_instruction_leaves_target_untouched() {
        let mut f = frame();
        let mut p = Pipeline::new();
        let a = p.push(path("y"), AddDt);
        p.push(path("z"), AddDt);
        p.set_enabled(a, false).unwrap();
        p.run_step(&mut f, 0.0, 1.0).unwrap();
        assert_eq!(f.get("y").unwrap().as_slice().unwrap(), &[1.0, 2.0]);
        assert_eq!(f.get("z").unwrap().as_slice().unwrap(), &[1.0, 1.0]);
    }

    #[test]
    fn invalid_dt_rejected() {
        let mut f = frame();
        let mut p = Pipeline::new();
        p.push(path("y"), AddDt);
        for dt in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                p.run_step(&mut f, 0.0, dt),
                Err(PipelineError::InvalidDt { .. })
            ));
        }
    }

    #[test]
    fn negative_target_in_non_negative_domain_fails() {
        let mut f = frame();
        f.set_domain("y", Domain::NonNegative).unwrap();
        let mut p = Pipeline::new();
        let id = p.push(path("y"), Negate);
        p.push(path("z"), AddDt);
        let err = p.run_step(&mut f, 0.0, 1.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Numerical);
        match err {
            PipelineError::InstructionFailed { id: failed, source, .. } => {
                assert_eq!(failed, id);
                assert!(matches!(source, SchemeError::Numerical(NumericalError::Negative { .. })));
            }
            other => panic!("unexpected error: {other}"),
        }
        // aborted before the second instruction ran
        assert_eq!(f.get("z").unwrap().as_slice().unwrap(), &[0.0, 0.0]);
    }
}
