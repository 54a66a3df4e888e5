//! Run summary for the polling loop.
//!
//! Collected once when the loop exits and rendered either as a plain-text
//! table or as JSON for external tooling.

use serde::Serialize;
use std::fmt::Write as _;
use std::time::Duration;
use timed_task::Tickable;

/// Why the polling loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Configured run time elapsed.
    RunFor,
    /// Poll limit reached.
    MaxPolls,
    /// A task missed its deadline and `stop_on_error` was set.
    DeadlineMiss,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::RunFor => write!(f, "run_for"),
            StopReason::MaxPolls => write!(f, "max_polls"),
            StopReason::DeadlineMiss => write!(f, "deadline_miss"),
        }
    }
}

/// Final counters for one task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSummary {
    /// Task name.
    pub name: String,
    /// Number of fires.
    pub fires: u64,
    /// Number of deadline misses.
    pub misses: u64,
    /// Largest overshoot in microseconds.
    pub max_overshoot_us: u32,
    /// Mean overshoot in microseconds.
    pub mean_overshoot_us: Option<u64>,
    /// Error flag at exit.
    pub error: bool,
}

impl TaskSummary {
    /// Snapshot a task's counters.
    pub fn from_task<T: Tickable + ?Sized>(task: &T) -> Self {
        let stats = task.stats();
        Self {
            name: task.name().to_owned(),
            fires: stats.fires,
            misses: stats.misses,
            max_overshoot_us: stats.max_overshoot_us,
            mean_overshoot_us: stats.mean_overshoot_us(),
            error: task.has_error(),
        }
    }
}

/// Summary of a complete run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Loop passes completed.
    pub polls: u64,
    /// Wall time spent in the loop.
    #[serde(serialize_with = "serialize_micros")]
    pub elapsed: Duration,
    /// Times the microsecond counter wrapped during the run.
    pub clock_wraps: u32,
    /// Why the loop ended.
    pub stop_reason: StopReason,
    /// Per-task counters in polling order.
    pub tasks: Vec<TaskSummary>,
}

fn serialize_micros<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
}

impl RunSummary {
    /// Whether any task ended with its error flag set.
    #[must_use]
    pub fn any_error(&self) -> bool {
        self.tasks.iter().any(|t| t.error)
    }

    /// Render as a plain-text table.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "polls: {}  elapsed: {}  clock wraps: {}  stopped by: {}",
            self.polls,
            humantime::format_duration(self.elapsed),
            self.clock_wraps,
            self.stop_reason
        );
        let _ = writeln!(
            out,
            "{:<16} {:>10} {:>8} {:>12} {:>12} {:>6}",
            "task", "fires", "misses", "max_over_us", "mean_over_us", "error"
        );
        for task in &self.tasks {
            let mean = task
                .mean_overshoot_us
                .map_or_else(|| "-".to_string(), |m| m.to_string());
            let _ = writeln!(
                out,
                "{:<16} {:>10} {:>8} {:>12} {:>12} {:>6}",
                task.name, task.fires, task.misses, task.max_overshoot_us, mean, task.error
            );
        }
        out
    }

    /// Render as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
