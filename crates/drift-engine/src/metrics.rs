//! Per-step performance metrics and the run summary.
//!
//! [`StepMetrics`] captures the phase timings of a single step;
//! [`RunSummary`] is what [`Simulation::run()`](crate::Simulation::run)
//! reports when it returns.

/// Timing data collected during a single step.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepMetrics {
    /// Wall-clock time for the entire step.
    pub total_us: u64,
    /// Time spent in the `pre_step` hook.
    pub pre_step_us: u64,
    /// Time spent applying the boundary pin, before and after integration.
    pub boundary_us: u64,
    /// Time spent in the integration pipeline.
    pub pipeline_us: u64,
    /// Per-instruction execution times: `(scheme name, microseconds)`.
    pub instruction_us: Vec<(String, u64)>,
    /// Time spent in the root update pass after integration.
    pub update_us: u64,
    /// Time spent in the `post_step` hook.
    pub post_step_us: u64,
    /// Time spent persisting a snapshot, if one was due.
    pub snapshot_us: u64,
}

/// How a call to `run()` ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every scheduled snapshot time was reached.
    Completed,
    /// The cancel token was set; the run can be resumed.
    Interrupted,
}

/// Totals for one call to `run()`.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Steps taken.
    pub steps: u64,
    /// Snapshots written, including snapshot 0 on the first run.
    pub snapshots: usize,
    /// Simulation time when the run returned.
    pub final_time: f64,
    /// Metrics of the last step, if any.
    pub last_step: Option<StepMetrics>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = StepMetrics::default();
        assert_eq!(m.total_us, 0);
        assert_eq!(m.pre_step_us, 0);
        assert_eq!(m.boundary_us, 0);
        assert_eq!(m.pipeline_us, 0);
        assert!(m.instruction_us.is_empty());
        assert_eq!(m.update_us, 0);
        assert_eq!(m.post_step_us, 0);
        assert_eq!(m.snapshot_us, 0);
    }

    #[test]
    fn instruction_timings_keep_order() {
        let m = StepMetrics {
            instruction_us: vec![("dust".to_string(), 50), ("gas".to_string(), 30)],
            ..StepMetrics::default()
        };
        assert_eq!(m.instruction_us[0].0, "dust");
        assert_eq!(m.instruction_us[1].1, 30);
    }
}
