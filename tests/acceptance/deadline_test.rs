//! Deadline-miss acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - Fires within the timeout never set the error flag
//! - A single stalled poll past the timeout latches the error flag
//! - The flag survives later on-time fires and only `reset_error` clears it
//! - A task with a latched error keeps firing
//! - Without a timeout, lateness is never reported

use timed_common::clock::ManualClock;
use timed_task::TimedTask;

use super::common::{run_loop, FireLog};

const MS: u32 = 1_000;

#[test]
fn test_jitter_within_timeout_is_not_an_error() {
    let clock = ManualClock::new(0);
    let mut task = TimedTask::with_period(&clock, MS);
    task.set_timeout(Some(200));
    let log = FireLog::new();

    // 150us polling lands every fire 50us late
    let fires = run_loop(&clock, &mut task, &log, 150, 1_000);

    assert!(!fires.is_empty());
    assert!(fires.iter().all(|f| f.elapsed == 50 && !f.deadline_missed));
    assert!(!task.has_error());
    assert_eq!(task.stats().max_overshoot_us, 50);
}

#[test]
fn test_stall_latches_error_until_reset() {
    let clock = ManualClock::new(0);
    let mut task = TimedTask::with_period(&clock, MS);
    task.set_timeout(Some(200));
    let log = FireLog::new();

    run_loop(&clock, &mut task, &log, 100, 50);
    assert!(!task.has_error());

    // Main loop stalls for 1.5ms on something else
    let fires = run_loop(&clock, &mut task, &log, 1_500, 1);
    assert_eq!(fires.len(), 1);
    assert!(fires[0].deadline_missed);
    assert!(fires[0].elapsed >= 200);
    assert!(task.has_error());

    // Back on time: keeps firing, flag stays set
    let before = log.count();
    let fires = run_loop(&clock, &mut task, &log, 100, 50);
    assert_eq!(log.count() - before, fires.len());
    assert_eq!(fires.len(), 5);
    assert!(fires.iter().all(|f| !f.deadline_missed));
    assert!(task.has_error());
    assert_eq!(task.stats().misses, 1);

    task.reset_error();
    assert!(!task.has_error());
}

#[test]
fn test_overshoot_equal_to_timeout_is_a_miss() {
    let clock = ManualClock::new(0);
    let mut task = TimedTask::with_period(&clock, 10 * MS);
    task.set_timeout(Some(MS));

    clock.advance(11 * MS);
    let fire = task.poll().unwrap();
    assert_eq!(fire.elapsed, MS);
    assert!(fire.deadline_missed);
}

#[test]
fn test_disabled_timeout_never_reports() {
    let clock = ManualClock::new(0);
    let mut task = TimedTask::with_period(&clock, MS);
    task.set_timeout(Some(10));
    task.set_timeout(None);
    let log = FireLog::new();

    run_loop(&clock, &mut task, &log, 60 * MS, 100);

    assert_eq!(log.count(), 100);
    assert!(!task.has_error());
    assert_eq!(task.stats().misses, 0);
    assert_eq!(task.stats().max_overshoot_us, 59 * MS);
}

#[test]
fn test_manual_error_flag_is_sticky_too() {
    let clock = ManualClock::new(0);
    let mut task = TimedTask::with_period(&clock, MS);
    task.set_timeout(Some(500));
    task.set_error(true);
    let log = FireLog::new();

    run_loop(&clock, &mut task, &log, MS, 10);
    assert_eq!(log.count(), 10);
    assert!(task.has_error());
}
