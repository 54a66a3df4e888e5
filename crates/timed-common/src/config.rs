//! Configuration structures for timed tasks and the polling runner.
//!
//! Supports TOML deserialization with sensible defaults. Durations are written
//! in humantime form (`"500ms"`, `"2s"`, `"250us"`).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::error::{TaskError, TaskResult};
use crate::units::{duration_to_micros, HALF_RANGE_MICROS};

/// Where a task's reference instant moves to when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RebasePolicy {
    /// Rebase to the poll instant that fired. Late polls push every later fire back,
    /// so lateness accumulates as drift.
    #[default]
    ActualFire,
    /// Rebase to the ideal instant (`last + period`). Late polls are caught up by
    /// firing on consecutive polls, keeping the schedule phase-locked.
    Scheduled,
}

impl std::fmt::Display for RebasePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RebasePolicy::ActualFire => write!(f, "actual_fire"),
            RebasePolicy::Scheduled => write!(f, "scheduled"),
        }
    }
}

/// Configuration for a single timed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Name used in logs and reports.
    pub name: String,

    /// Interval between fires. Zero fires on every poll.
    #[serde(with = "humantime_serde")]
    pub period: Duration,

    /// Tolerated overshoot past the due instant. `None` disables deadline checking.
    #[serde(
        with = "humantime_serde_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,

    /// Rebase policy applied on fire.
    pub policy: RebasePolicy,

    /// Simulated work duration (busy wait) used by the runner.
    #[serde(with = "humantime_serde")]
    pub work: Duration,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            name: String::from("task"),
            period: Duration::ZERO,
            timeout: None,
            policy: RebasePolicy::default(),
            work: Duration::ZERO,
        }
    }
}

impl TaskConfig {
    /// Create a task configuration with the given name and period.
    #[must_use]
    pub fn new(name: impl Into<String>, period: Duration) -> Self {
        Self {
            name: name.into(),
            period,
            ..Self::default()
        }
    }

    /// Set the deadline timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the rebase policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RebasePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the simulated work duration.
    #[must_use]
    pub fn with_work(mut self, work: Duration) -> Self {
        self.work = work;
        self
    }

    /// Period in microseconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the period does not fit in the 32-bit counter.
    pub fn period_micros(&self) -> TaskResult<u32> {
        duration_to_micros(self.period)
    }

    /// Timeout in microseconds, if configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout does not fit in the 32-bit counter.
    pub fn timeout_micros(&self) -> TaskResult<Option<u32>> {
        self.timeout.map(duration_to_micros).transpose()
    }

    /// Check the configuration against the counter limits.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidConfig`] if the name is empty or the period
    /// exceeds the half-range of the counter, or a conversion error if a duration
    /// does not fit in 32 bits.
    pub fn validate(&self) -> TaskResult<()> {
        if self.name.trim().is_empty() {
            return Err(TaskError::InvalidConfig("task name is empty".into()));
        }
        let period = self.period_micros()?;
        if period > HALF_RANGE_MICROS {
            return Err(TaskError::InvalidConfig(format!(
                "task '{}': period {}us exceeds half the counter range ({}us)",
                self.name, period, HALF_RANGE_MICROS
            )));
        }
        self.timeout_micros()?;
        Ok(())
    }
}

/// Top-level configuration for the polling runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// How long to run the polling loop. Zero runs until another limit ends it.
    #[serde(with = "humantime_serde")]
    pub run_for: Duration,

    /// Interval between periodic status reports. Zero disables them.
    #[serde(with = "humantime_serde")]
    pub report_interval: Duration,

    /// Stop the loop as soon as any task records a deadline miss.
    pub stop_on_error: bool,

    /// Starting value of the microsecond counter.
    pub clock_offset_us: u32,

    /// Tasks polled by the loop, in polling order.
    pub tasks: Vec<TaskConfig>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            run_for: Duration::from_secs(10),
            report_interval: Duration::from_secs(2),
            stop_on_error: false,
            clock_offset_us: 0,
            tasks: vec![
                TaskConfig::new("blink", Duration::from_millis(500))
                    .with_work(Duration::from_micros(50)),
                TaskConfig::new("sample", Duration::from_millis(1))
                    .with_timeout(Duration::from_micros(500))
                    .with_work(Duration::from_micros(20)),
            ],
        }
    }
}

impl RunnerConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config = Self::from_toml(&content)?;
        debug!(path = %path.display(), tasks = config.tasks.len(), "Runner config parsed");
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Serialize configuration to TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate every task and reject duplicate names.
    ///
    /// # Errors
    ///
    /// Returns the first task error found.
    pub fn validate(&self) -> TaskResult<()> {
        let mut seen = HashSet::new();
        for task in &self.tasks {
            task.validate()?;
            if !seen.insert(task.name.as_str()) {
                return Err(TaskError::InvalidConfig(format!(
                    "duplicate task name '{}'",
                    task.name
                )));
            }
        }
        Ok(())
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

/// Same as [`humantime_serde`] for optional durations.
mod humantime_serde_opt {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => super::humantime_serde::serialize(d, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        s.map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
