//! The timed task primitive.
//!
//! A task keeps a period, the counter value it last fired at, an optional timeout
//! and a sticky error flag. Each poll computes
//!
//! ```text
//! elapsed = now - (last + period)      (wrapping u32, read as i32)
//! ```
//!
//! and fires when `elapsed >= 0`. A fire with `elapsed >= timeout` latches the
//! error flag. Because only the wrapping difference is used, the schedule keeps
//! working across counter wraparound as long as a task is polled within
//! [`HALF_RANGE_MICROS`](timed_common::units::HALF_RANGE_MICROS) of its due instant.
//!
//! # Timing Diagram
//!
//! ```text
//!            period             period
//!       |<------------->|<------------------->|
//! poll  x    x    x    x|x    x    x    x    x|x
//! fire  F               F                    F
//!       ^last           ^last (rebased)      ^ overshoot = elapsed
//! ```

use std::borrow::Cow;
use std::time::Duration;

use timed_common::clock::ClockSource;
use timed_common::config::{RebasePolicy, TaskConfig};
use timed_common::error::TaskResult;
use timed_common::metrics::FireStats;
use timed_common::units::{
    duration_to_micros, hz_to_micros, micros_to_millis_ceil, micros_to_seconds_ceil,
    millis_to_micros, seconds_to_micros, wrapping_elapsed, MICROS_PER_SECOND,
};
use tracing::{debug, trace, warn};

/// Outcome of a poll that fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fire {
    /// Counter value at the fire.
    pub now: u32,
    /// How far past the due instant the fire happened, in microseconds.
    pub elapsed: u32,
    /// Whether `elapsed` reached the configured timeout.
    pub deadline_missed: bool,
}

/// Cooperative timed task driven by a free-running microsecond clock.
///
/// The task never runs on its own. The caller polls it with [`tick`](Self::tick)
/// (or [`poll`](Self::poll)) from its main loop; the work passed to `tick` runs
/// at most once per call and only when the period has elapsed.
///
/// # Example
///
/// ```
/// use timed_common::clock::ManualClock;
/// use timed_task::TimedTask;
///
/// let clock = ManualClock::new(1_000);
/// let mut task = TimedTask::new(&clock);
/// task.set_millis(5).unwrap();
/// assert_eq!(task.micros(), 5_000);
///
/// clock.advance(4_999);
/// assert!(task.poll().is_none());
///
/// clock.advance(1);
/// let fire = task.poll().unwrap();
/// assert_eq!(fire.elapsed, 0);
/// ```
#[derive(Debug, Clone)]
pub struct TimedTask<C> {
    /// Counter source.
    clock: C,
    /// Name used in log records.
    name: Cow<'static, str>,
    /// Interval between fires in microseconds.
    period: u32,
    /// Counter value of the last fire or reconfiguration.
    last: u32,
    /// Tolerated overshoot in microseconds.
    timeout: Option<u32>,
    /// Sticky deadline-miss flag.
    error: bool,
    /// Where `last` moves to on fire.
    policy: RebasePolicy,
    /// Fire counters.
    stats: FireStats,
}

impl<C: ClockSource> TimedTask<C> {
    /// Create a task with a zero period, so it fires on the first poll.
    pub fn new(clock: C) -> Self {
        Self::with_period(clock, 0)
    }

    /// Create a task with a period in microseconds, measured from now.
    pub fn with_period(clock: C, period_us: u32) -> Self {
        let last = clock.now_micros();
        Self {
            clock,
            name: Cow::Borrowed("task"),
            period: period_us,
            last,
            timeout: None,
            error: false,
            policy: RebasePolicy::default(),
            stats: FireStats::new(),
        }
    }

    /// Create a task from a configuration entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn from_config(clock: C, config: &TaskConfig) -> TaskResult<Self> {
        config.validate()?;
        let mut task = Self::with_period(clock, config.period_micros()?)
            .with_name(config.name.clone());
        task.timeout = config.timeout_micros()?;
        task.policy = config.policy;
        Ok(task)
    }

    /// Set the name used in log records.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Task name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Borrow the clock source.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Check the clock and fire if due, without running any work.
    ///
    /// Returns `None` and leaves the task untouched when the period has not
    /// elapsed. Otherwise updates the error flag, rebases the schedule and
    /// returns the fire details.
    pub fn poll(&mut self) -> Option<Fire> {
        let now = self.clock.now_micros();
        let due = self.last.wrapping_add(self.period);
        let elapsed = wrapping_elapsed(now, due);
        if elapsed < 0 {
            return None;
        }
        let elapsed = elapsed.unsigned_abs();

        let deadline_missed = self.timeout.is_some_and(|timeout| elapsed >= timeout);
        if deadline_missed {
            self.error = true;
            warn!(
                task = %self.name,
                elapsed_us = elapsed,
                timeout_us = self.timeout.unwrap_or_default(),
                "Deadline missed"
            );
        }

        self.last = match self.policy {
            RebasePolicy::Scheduled if self.period > 0 => due,
            _ => now,
        };
        self.stats.record(elapsed, deadline_missed);
        trace!(task = %self.name, now, elapsed_us = elapsed, "Task fired");

        Some(Fire {
            now,
            elapsed,
            deadline_missed,
        })
    }

    /// Check the clock and run `work` once if the period has elapsed.
    pub fn tick<F: FnOnce()>(&mut self, work: F) -> Option<Fire> {
        let fire = self.poll()?;
        work();
        Some(fire)
    }

    /// Rebase the schedule to now without changing the period.
    pub fn restart(&mut self) {
        self.last = self.clock.now_micros();
    }

    /// Set the period in microseconds and rebase the schedule to now.
    pub fn set_micros(&mut self, period_us: u32) {
        self.period = period_us;
        self.last = self.clock.now_micros();
        debug!(task = %self.name, period_us, "Period set");
    }

    /// Set the period in milliseconds and rebase the schedule to now.
    ///
    /// # Errors
    ///
    /// Returns an error if the period overflows the 32-bit counter; the task is
    /// left unchanged.
    pub fn set_millis(&mut self, period_ms: u32) -> TaskResult<()> {
        self.set_micros(millis_to_micros(period_ms)?);
        Ok(())
    }

    /// Set the period in seconds and rebase the schedule to now.
    ///
    /// # Errors
    ///
    /// Returns an error if the period overflows the 32-bit counter; the task is
    /// left unchanged.
    pub fn set_seconds(&mut self, period_s: u32) -> TaskResult<()> {
        self.set_micros(seconds_to_micros(period_s)?);
        Ok(())
    }

    /// Set the period from a frequency (`1_000_000 / hz` microseconds, truncated)
    /// and rebase the schedule to now.
    ///
    /// # Errors
    ///
    /// Returns an error for non-finite or non-positive frequencies, or when the
    /// period overflows the counter; the task is left unchanged.
    pub fn set_hz(&mut self, hz: f64) -> TaskResult<()> {
        self.set_micros(hz_to_micros(hz)?);
        Ok(())
    }

    /// Set the period from a [`Duration`] and rebase the schedule to now.
    ///
    /// # Errors
    ///
    /// Returns an error if the duration overflows the counter; the task is left
    /// unchanged.
    pub fn set_period(&mut self, period: Duration) -> TaskResult<()> {
        self.set_micros(duration_to_micros(period)?);
        Ok(())
    }

    /// Period in microseconds.
    #[must_use]
    pub fn micros(&self) -> u32 {
        self.period
    }

    /// Period in milliseconds, rounded up.
    #[must_use]
    pub fn millis(&self) -> u32 {
        micros_to_millis_ceil(self.period)
    }

    /// Period in seconds, rounded up.
    #[must_use]
    pub fn seconds(&self) -> u32 {
        micros_to_seconds_ceil(self.period)
    }

    /// Coarse frequency: `1 / ceil(period in seconds)`.
    ///
    /// Every period up to one second reads back as 1 Hz. Use
    /// [`hz_exact`](Self::hz_exact) for the real rate. A zero period reads as
    /// infinity.
    #[must_use]
    pub fn hz(&self) -> f64 {
        if self.period == 0 {
            return f64::INFINITY;
        }
        1.0 / f64::from(self.seconds())
    }

    /// Frequency without rounding: `1_000_000 / period`.
    #[must_use]
    pub fn hz_exact(&self) -> f64 {
        if self.period == 0 {
            return f64::INFINITY;
        }
        f64::from(MICROS_PER_SECOND) / f64::from(self.period)
    }

    /// Period as a [`Duration`].
    #[must_use]
    pub fn period(&self) -> Duration {
        Duration::from_micros(u64::from(self.period))
    }

    /// Set the tolerated overshoot in microseconds. `None` disables deadline checks.
    pub fn set_timeout(&mut self, timeout_us: Option<u32>) {
        self.timeout = timeout_us;
    }

    /// Tolerated overshoot in microseconds.
    #[must_use]
    pub fn timeout(&self) -> Option<u32> {
        self.timeout
    }

    /// Set or clear the error flag directly.
    pub fn set_error(&mut self, error: bool) {
        self.error = error;
    }

    /// Clear the error flag.
    pub fn reset_error(&mut self) {
        self.set_error(false);
    }

    /// Whether a deadline was missed since the last reset.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error
    }

    /// Set the rebase policy.
    pub fn set_policy(&mut self, policy: RebasePolicy) {
        self.policy = policy;
    }

    /// Rebase policy.
    #[must_use]
    pub fn policy(&self) -> RebasePolicy {
        self.policy
    }

    /// Fire counters.
    #[must_use]
    pub fn stats(&self) -> &FireStats {
        &self.stats
    }

    /// Clear the fire counters. The error flag is not touched.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Counter value of the last fire or reconfiguration.
    #[must_use]
    pub fn last_fire(&self) -> u32 {
        self.last
    }

    /// Counter value at which the next fire becomes due.
    #[must_use]
    pub fn next_due(&self) -> u32 {
        self.last.wrapping_add(self.period)
    }

    /// Microseconds until the next fire is due, zero if already due.
    pub fn remaining(&self) -> u32 {
        let elapsed = wrapping_elapsed(self.clock.now_micros(), self.next_due());
        if elapsed >= 0 {
            0
        } else {
            elapsed.unsigned_abs()
        }
    }
}
