//! Progress snapshots emitted while a dispatch is running.

use std::fmt;
use std::time::Duration;

/// A point-in-time view of dispatch progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Results collected so far.
    pub completed: usize,
    /// Number of tasks dispatched.
    pub total: usize,
    /// Wall-clock time since dispatch started.
    pub elapsed: Duration,
    /// Set only on the final snapshot, once every task has finished.
    pub finished: bool,
}

impl Progress {
    /// Percentage of tasks accounted for, 0-100.
    ///
    /// Intermediate snapshots count collected results only; the final
    /// snapshot always reads 100.
    pub fn percentage(&self) -> f64 {
        if self.finished || self.total == 0 {
            return 100.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scan progress: {:.1}%, elapsed: {}",
            self.percentage(),
            format_elapsed(self.elapsed)
        )
    }
}

/// Format a duration as `H:MM:SS`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        let progress = Progress {
            completed: 1,
            total: 8,
            elapsed: Duration::from_secs(10),
            finished: false,
        };
        assert_eq!(progress.percentage(), 12.5);
        assert_eq!(
            progress.to_string(),
            "scan progress: 12.5%, elapsed: 0:00:10"
        );

        let done = Progress {
            completed: 6,
            finished: true,
            ..progress
        };
        assert_eq!(done.percentage(), 100.0);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(999)), "0:00:00");
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "1:02:05");
        assert_eq!(format_elapsed(Duration::from_secs(36000)), "10:00:00");
    }
}
