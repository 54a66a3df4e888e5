//! Common utilities for integration tests.
//!
//! Provides helpers for:
//! - Simulating a main loop that polls tasks at a fixed poll interval
//! - Recording fire instants for later assertions

#![allow(dead_code)] // Not every helper is used by every test module

use std::cell::RefCell;
use timed_common::clock::{ClockSource, ManualClock};
use timed_task::{Fire, TimedTask};

/// Fire instants recorded during a simulated run.
#[derive(Debug, Default)]
pub struct FireLog {
    /// Counter values at which work ran.
    pub instants: RefCell<Vec<u32>>,
}

impl FireLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one fire.
    pub fn record(&self, now: u32) {
        self.instants.borrow_mut().push(now);
    }

    /// Number of fires recorded.
    pub fn count(&self) -> usize {
        self.instants.borrow().len()
    }

    /// Gaps between consecutive fires.
    pub fn intervals(&self) -> Vec<u32> {
        self.instants
            .borrow()
            .windows(2)
            .map(|w| w[1].wrapping_sub(w[0]))
            .collect()
    }
}

/// Poll `task` every `step` microseconds for `steps` iterations, logging fires.
///
/// Returns every fire reported by the task.
pub fn run_loop(
    clock: &ManualClock,
    task: &mut TimedTask<&ManualClock>,
    log: &FireLog,
    step: u32,
    steps: usize,
) -> Vec<Fire> {
    let mut fires = Vec::new();
    for _ in 0..steps {
        clock.advance(step);
        if let Some(fire) = task.tick(|| log.record(clock.now_micros())) {
            fires.push(fire);
        }
    }
    fires
}
