//! Scheduled snapshot times.

use crate::config::ConfigError;

/// Require `times` to be non-empty, finite and strictly increasing, with
/// every entry after `after`.
pub(crate) fn check_times(times: &[f64], after: f64) -> Result<(), ConfigError> {
    let invalid = |reason: String| Err(ConfigError::InvalidSchedule { reason });
    let Some(&first) = times.first() else {
        return invalid("no snapshot times".to_string());
    };
    if !first.is_finite() || first <= after {
        return invalid(format!("first snapshot time {first} is not after {after}"));
    }
    for pair in times.windows(2) {
        if !pair[1].is_finite() || pair[1] <= pair[0] {
            return invalid(format!(
                "snapshot times must increase strictly, found {} after {}",
                pair[1], pair[0]
            ));
        }
    }
    Ok(())
}

/// Ordered snapshot times with a cursor on the next one due.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SnapshotSchedule {
    times: Vec<f64>,
    next: usize,
}

impl SnapshotSchedule {
    /// A schedule over `times`, all after t = 0.
    pub fn new(times: Vec<f64>) -> Result<Self, ConfigError> {
        check_times(&times, 0.0)?;
        Ok(Self { times, next: 0 })
    }

    /// Append later times. They must follow the last scheduled time.
    pub fn extend(&mut self, times: &[f64]) -> Result<(), ConfigError> {
        let last = self.times.last().copied().unwrap_or(0.0);
        check_times(times, last)?;
        self.times.extend_from_slice(times);
        Ok(())
    }

    /// Every scheduled time.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// The next time not yet reached.
    pub fn next_time(&self) -> Option<f64> {
        self.times.get(self.next).copied()
    }

    /// The last scheduled time, i.e. the end of the run.
    pub fn end_time(&self) -> Option<f64> {
        self.times.last().copied()
    }

    /// Number of times not yet reached.
    pub fn remaining(&self) -> usize {
        self.times.len() - self.next
    }

    /// Whether `time` has reached the next scheduled time.
    pub fn is_due(&self, time: f64) -> bool {
        self.next_time().is_some_and(|t| time >= t)
    }

    /// Move the cursor past the next time.
    pub fn advance(&mut self) {
        if self.next < self.times.len() {
            self.next += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_walks_the_times() {
        let mut s = SnapshotSchedule::new(vec![1.0, 2.0, 4.0]).unwrap();
        assert_eq!(s.next_time(), Some(1.0));
        assert!(!s.is_due(0.5));
        assert!(s.is_due(1.0));
        s.advance();
        assert_eq!(s.next_time(), Some(2.0));
        assert_eq!(s.remaining(), 2);
        s.advance();
        s.advance();
        s.advance();
        assert_eq!(s.next_time(), None);
        assert!(!s.is_due(10.0));
        assert_eq!(s.end_time(), Some(4.0));
    }

    #[test]
    fn rejects_bad_schedules() {
        assert!(SnapshotSchedule::new(vec![]).is_err());
        assert!(SnapshotSchedule::new(vec![0.0, 1.0]).is_err());
        assert!(SnapshotSchedule::new(vec![1.0, 1.0]).is_err());
        assert!(SnapshotSchedule::new(vec![1.0, f64::INFINITY]).is_err());
    }

    #[test]
    fn extend_requires_later_times() {
        let mut s = SnapshotSchedule::new(vec![1.0, 2.0]).unwrap();
        assert!(s.extend(&[1.5]).is_err());
        s.extend(&[3.0, 5.0]).unwrap();
        assert_eq!(s.times(), &[1.0, 2.0, 3.0, 5.0]);
    }
}
