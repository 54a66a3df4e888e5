//! The polling main loop.
//!
//! Builds one [`PeriodicTask`] per configured task and polls them in order until
//! a stop condition is reached:
//! 1. `run_for` wall time elapsed
//! 2. `max_polls` passes completed
//! 3. a deadline miss with `stop_on_error` set

use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use timed_common::clock::ClockSource;
use timed_common::config::RunnerConfig;
use timed_task::{PeriodicTask, TaskGroup, TimedTask};
use tracing::{debug, info, warn};

use crate::report::{RunSummary, StopReason, TaskSummary};

/// Spin for `duration` to stand in for real work.
fn busy_wait(duration: Duration) {
    if duration.is_zero() {
        return;
    }
    let start = Instant::now();
    while start.elapsed() < duration {
        std::hint::spin_loop();
    }
}

/// Build the task group described by `config`, all sharing `clock`.
pub fn build_group<'a, C: ClockSource>(
    clock: &'a C,
    config: &RunnerConfig,
) -> Result<TaskGroup<'a>> {
    config.validate().context("Invalid task configuration")?;

    let mut group = TaskGroup::new();
    for task_config in &config.tasks {
        let task = TimedTask::from_config(clock, task_config)
            .with_context(|| format!("Failed to create task '{}'", task_config.name))?;
        let work = task_config.work;
        info!(
            task = %task_config.name,
            period_us = task.micros(),
            timeout_us = ?task.timeout(),
            policy = %task.policy(),
            work_us = work.as_micros(),
            "Task configured"
        );
        group.push(PeriodicTask::new(task, move || busy_wait(work)));
    }
    Ok(group)
}

/// Run the polling loop. `max_polls` of zero means no pass limit.
pub fn run<C: ClockSource>(clock: &C, config: &RunnerConfig, max_polls: u64) -> Result<RunSummary> {
    let mut group = build_group(clock, config)?;
    if group.is_empty() {
        warn!("No tasks configured, nothing to poll");
    }

    let start = Instant::now();
    let mut last_report = start;
    let mut polls = 0u64;
    let mut wraps = 0u32;
    let mut previous = clock.now_micros();

    info!(
        tasks = group.len(),
        run_for = %humantime::format_duration(config.run_for),
        max_polls,
        clock_start_us = previous,
        "Entering polling loop"
    );

    let stop_reason = loop {
        group.tick_all();
        polls += 1;

        let now = clock.now_micros();
        if now < previous {
            wraps += 1;
            info!(from = previous, to = now, "Clock counter wrapped");
        }
        previous = now;

        if config.stop_on_error && group.any_error() {
            warn!(polls, "Deadline miss recorded, stopping");
            break StopReason::DeadlineMiss;
        }
        if max_polls > 0 && polls >= max_polls {
            debug!(polls, "Poll limit reached");
            break StopReason::MaxPolls;
        }
        if !config.run_for.is_zero() && start.elapsed() >= config.run_for {
            debug!(polls, "Run time elapsed");
            break StopReason::RunFor;
        }

        // Periodic status logging
        if !config.report_interval.is_zero() && last_report.elapsed() >= config.report_interval {
            last_report = Instant::now();
            for task in group.iter() {
                let stats = task.stats();
                info!(
                    task = task.name(),
                    fires = stats.fires,
                    misses = stats.misses,
                    max_overshoot_us = stats.max_overshoot_us,
                    error = task.has_error(),
                    "Periodic status"
                );
            }
        }
    };

    Ok(RunSummary {
        polls,
        elapsed: start.elapsed(),
        clock_wraps: wraps,
        stop_reason,
        tasks: group.iter().map(TaskSummary::from_task).collect(),
    })
}
