//! Scheduling acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - A task never fires before its period has elapsed
//! - Each poll fires at most once
//! - Several tasks polled from one loop fire independently, in polling order
//! - Reconfiguration restarts the schedule from the reconfiguration instant
//! - The scheduled rebase policy keeps the long-run rate locked to the period

use std::cell::RefCell;
use timed_common::clock::{ClockSource, ManualClock};
use timed_task::{PeriodicTask, RebasePolicy, TaskGroup, TimedTask};

use super::common::{run_loop, FireLog};

const MS: u32 = 1_000;

#[test]
fn test_fires_on_exact_period_grid() {
    let clock = ManualClock::new(0);
    let mut task = TimedTask::with_period(&clock, 10 * MS);
    let log = FireLog::new();

    let fires = run_loop(&clock, &mut task, &log, MS, 100);

    assert_eq!(fires.len(), 10);
    assert!(fires.iter().all(|f| f.elapsed == 0));
    assert!(log.intervals().iter().all(|&gap| gap == 10 * MS));
}

#[test]
fn test_coarse_polling_drifts_with_actual_fire_policy() {
    let clock = ManualClock::new(0);
    let mut task = TimedTask::with_period(&clock, 10 * MS);
    let log = FireLog::new();

    // Polls every 3ms: first poll past each due instant is up to 2ms late
    run_loop(&clock, &mut task, &log, 3 * MS, 100);

    // Every fire waits a full period after the late fire before it
    assert_eq!(log.count(), 25);
    assert!(log.intervals().iter().all(|&gap| gap == 12 * MS));
}

#[test]
fn test_coarse_polling_stays_locked_with_scheduled_policy() {
    let clock = ManualClock::new(0);
    let mut task = TimedTask::with_period(&clock, 10 * MS);
    task.set_policy(RebasePolicy::Scheduled);
    let log = FireLog::new();

    let fires = run_loop(&clock, &mut task, &log, 3 * MS, 100);

    // One fire per 10ms slot over 300ms
    assert_eq!(log.count(), 30);
    assert!(fires.iter().all(|f| f.elapsed < 3 * MS));
    assert_eq!(task.next_due(), 310 * MS);
}

#[test]
fn test_independent_tasks_in_one_loop() {
    let clock = ManualClock::new(0);
    let fired = RefCell::new(Vec::new());

    let mut group = TaskGroup::new();
    for (name, period) in [("fast", MS), ("medium", 10 * MS), ("slow", 250 * MS)] {
        let fired = &fired;
        group.push(PeriodicTask::new(
            TimedTask::with_period(&clock, period).with_name(name),
            move || fired.borrow_mut().push(name),
        ));
    }

    for _ in 0..10_000 {
        clock.advance(100);
        group.tick_all();
    }

    let counts: Vec<u64> = group.iter().map(|task| task.stats().fires).collect();
    assert_eq!(counts, [1000, 100, 4]);
    assert!(!group.any_error());

    // When several are due on the same pass they fire in insertion order
    drop(group);
    let fired = fired.into_inner();
    let slow_index = fired.iter().position(|&n| n == "slow").unwrap();
    assert_eq!(fired[slow_index - 2..=slow_index], ["fast", "medium", "slow"]);
}

#[test]
fn test_reconfiguration_rebases_schedule() {
    let clock = ManualClock::new(0);
    let mut task = TimedTask::with_period(&clock, 10 * MS);
    let log = FireLog::new();

    run_loop(&clock, &mut task, &log, MS, 7);
    task.set_millis(10).unwrap();
    assert_eq!(task.last_fire(), 7 * MS);

    // Old schedule would fire at 10ms; the new one fires at 17ms
    let fires = run_loop(&clock, &mut task, &log, MS, 10);
    assert_eq!(fires.len(), 1);
    assert_eq!(fires[0].now, 17 * MS);
}

#[test]
fn test_period_change_takes_effect_next_check() {
    let clock = ManualClock::new(0);
    let mut task = TimedTask::with_period(&clock, 10 * MS);

    clock.advance(10 * MS);
    assert!(task.poll().is_some());

    task.set_hz(500.0).unwrap();
    assert_eq!(task.micros(), 2 * MS);
    clock.advance(2 * MS);
    assert_eq!(task.poll().map(|f| f.now), Some(clock.now_micros()));
}
