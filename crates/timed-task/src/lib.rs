//! Cooperative timed tasks for poll-driven main loops.
//!
//! A [`TimedTask`] answers one question each time it is polled: has my interval
//! elapsed on the free-running clock? When it has, the task fires, rebases its
//! schedule and runs the caller's work exactly once. There is no preemption and
//! no background execution; several tasks share a CPU only by being polled in
//! sequence from the same loop.
//!
//! - **Tasks** ([`task`]): [`TimedTask`], the elapsed-time check with deadline bookkeeping
//! - **Periodic** ([`periodic`]): [`PeriodicTask`] bundles a task with its [`Work`],
//!   [`TaskGroup`] polls several of them in order
//!
//! # Example
//!
//! ```
//! use timed_common::clock::ManualClock;
//! use timed_task::TimedTask;
//!
//! let clock = ManualClock::new(0);
//! let mut blink = TimedTask::with_period(&clock, 500_000);
//! blink.set_timeout(Some(1_000));
//!
//! let mut toggles = 0;
//!
//! // Not yet due
//! clock.advance(499_999);
//! assert!(blink.tick(|| toggles += 1).is_none());
//!
//! // Due: fires once and rebases
//! clock.advance(1);
//! assert!(blink.tick(|| toggles += 1).is_some());
//! assert_eq!(toggles, 1);
//!
//! // Polled far too late: still fires, error flag latches
//! clock.advance(502_000);
//! blink.tick(|| toggles += 1);
//! assert!(blink.has_error());
//! ```

pub mod periodic;
pub mod task;

// Re-export main types for convenience
pub use periodic::{PeriodicTask, TaskGroup, Tickable, Work};
pub use task::{Fire, TimedTask};
pub use timed_common::config::RebasePolicy;
