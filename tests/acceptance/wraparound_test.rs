//! Counter wraparound acceptance tests.
//!
//! The microsecond counter is 32 bits wide and wraps every ~71.6 minutes.
//!
//! # Acceptance Criteria
//!
//! - Fire intervals are unaffected when the counter wraps between fires
//! - A task due just after the wrap fires exactly once when polled after it
//! - Deadline checks stay correct across the wrap
//! - Lateness beyond half the counter range is indistinguishable from "not due"

use timed_common::clock::{ClockSource, ManualClock};
use timed_common::units::HALF_RANGE_MICROS;
use timed_task::{RebasePolicy, TimedTask};

use super::common::{run_loop, FireLog};

const MS: u32 = 1_000;

#[test]
fn test_intervals_continue_across_wrap() {
    let clock = ManualClock::new(u32::MAX - 5 * MS + 1);
    let mut task = TimedTask::with_period(&clock, MS);
    let log = FireLog::new();

    let fires = run_loop(&clock, &mut task, &log, 100, 100);

    assert_eq!(fires.len(), 10);
    assert!(log.intervals().iter().all(|&gap| gap == MS));
    // Some fires before the wrap, some after
    let instants = log.instants.borrow();
    assert!(instants.iter().any(|&t| t > u32::MAX - 5 * MS));
    assert!(instants.iter().any(|&t| t < 5 * MS));
}

#[test]
fn test_due_after_wrap_fires_once() {
    let clock = ManualClock::new(u32::MAX - 99);
    let mut task = TimedTask::with_period(&clock, 300);
    let mut runs = 0;

    // 50us before the wrap: not due
    clock.advance(50);
    assert!(task.tick(|| runs += 1).is_none());

    // Counter now numerically smaller than the last fire, still not due
    clock.advance(100);
    assert!(clock.now_micros() < task.last_fire());
    assert!(task.tick(|| runs += 1).is_none());

    // Past the due instant on the far side of the wrap
    clock.advance(170);
    let fire = task.tick(|| runs += 1).unwrap();
    assert_eq!(fire.elapsed, 20);
    assert!(task.tick(|| runs += 1).is_none());
    assert_eq!(runs, 1);
}

#[test]
fn test_timeout_across_wrap() {
    let clock = ManualClock::new(u32::MAX - 499);
    let mut task = TimedTask::with_period(&clock, 400);
    task.set_timeout(Some(150));

    clock.advance(549);
    assert_eq!(clock.now_micros(), 49);
    let fire = task.poll().unwrap();
    assert_eq!(fire.elapsed, 149);
    assert!(!task.has_error());

    clock.advance(550);
    let fire = task.poll().unwrap();
    assert_eq!(fire.elapsed, 150);
    assert!(task.has_error());
}

#[test]
fn test_scheduled_policy_across_wrap() {
    let clock = ManualClock::new(u32::MAX - 2_499);
    let mut task = TimedTask::with_period(&clock, MS);
    task.set_policy(RebasePolicy::Scheduled);
    let log = FireLog::new();

    // Polls every 700us across the wrap
    run_loop(&clock, &mut task, &log, 700, 10);

    // 7ms elapsed: one fire per 1ms slot
    assert_eq!(log.count(), 7);
    assert_eq!(task.next_due(), (u32::MAX - 2_499).wrapping_add(8 * MS));
}

#[test]
fn test_half_range_limit() {
    let clock = ManualClock::new(u32::MAX - 10);
    let mut task = TimedTask::with_period(&clock, MS);
    let due = task.next_due();

    // Exactly half the range late: still recognised as due
    clock.set(due.wrapping_add(HALF_RANGE_MICROS));
    let fire = task.poll().unwrap();
    assert_eq!(fire.elapsed, HALF_RANGE_MICROS);

    // One microsecond more reads as "due in the future"
    task.restart();
    let due = task.next_due();
    clock.set(due.wrapping_add(HALF_RANGE_MICROS + 1));
    assert!(task.poll().is_none());
}

#[test]
fn test_longest_usable_period_across_wrap() {
    let clock = ManualClock::new(u32::MAX - 10);
    let mut task = TimedTask::with_period(&clock, HALF_RANGE_MICROS);

    clock.advance(HALF_RANGE_MICROS - 1);
    assert!(task.poll().is_none());
    clock.advance(1);
    assert_eq!(task.poll().map(|f| f.elapsed), Some(0));
}
