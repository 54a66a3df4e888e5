//! Fire statistics for timed tasks.
//!
//! Counters only; updating them is constant time and allocation free so they
//! can live inside a task that is polled from a tight main loop.

use serde::{Deserialize, Serialize};

/// Running counters describing how a task has been firing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireStats {
    /// Number of fires.
    pub fires: u64,
    /// Number of fires that exceeded the configured timeout.
    pub misses: u64,
    /// Overshoot of the most recent fire in microseconds.
    pub last_overshoot_us: u32,
    /// Largest overshoot seen in microseconds.
    pub max_overshoot_us: u32,
    /// Sum of all overshoots, for the mean.
    overshoot_sum_us: u64,
}

impl FireStats {
    /// Create empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one fire with its overshoot past the due instant.
    pub fn record(&mut self, overshoot_us: u32, missed: bool) {
        self.fires = self.fires.saturating_add(1);
        if missed {
            self.misses = self.misses.saturating_add(1);
        }
        self.last_overshoot_us = overshoot_us;
        self.max_overshoot_us = self.max_overshoot_us.max(overshoot_us);
        self.overshoot_sum_us = self.overshoot_sum_us.saturating_add(u64::from(overshoot_us));
    }

    /// Mean overshoot in microseconds, `None` before the first fire.
    #[must_use]
    pub fn mean_overshoot_us(&self) -> Option<u64> {
        if self.fires > 0 {
            Some(self.overshoot_sum_us / self.fires)
        } else {
            None
        }
    }

    /// Fraction of fires that missed their deadline (0.0 to 1.0).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn miss_ratio(&self) -> f64 {
        if self.fires == 0 {
            0.0
        } else {
            self.misses as f64 / self.fires as f64
        }
    }

    /// Clear all counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
