//! Tasks bundled with their work, and groups of them polled from one loop.

use timed_common::clock::ClockSource;
use timed_common::metrics::FireStats;
use tracing::debug;

use crate::task::{Fire, TimedTask};

/// Work run by a task when it fires.
///
/// Implemented for every `FnMut()`, so closures can be used directly.
pub trait Work {
    /// Run the work once.
    fn run(&mut self);
}

impl<F: FnMut()> Work for F {
    #[inline]
    fn run(&mut self) {
        self();
    }
}

/// A [`TimedTask`] that owns the work it runs.
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use timed_common::clock::ManualClock;
/// use timed_task::{PeriodicTask, TimedTask};
///
/// let clock = ManualClock::new(0);
/// let count = Cell::new(0);
/// let mut task = PeriodicTask::new(
///     TimedTask::with_period(&clock, 100),
///     || count.set(count.get() + 1),
/// );
///
/// clock.advance(100);
/// assert!(task.tick().is_some());
/// assert_eq!(count.get(), 1);
/// ```
#[derive(Debug)]
pub struct PeriodicTask<C, W> {
    task: TimedTask<C>,
    work: W,
}

impl<C: ClockSource, W: Work> PeriodicTask<C, W> {
    /// Bundle a task with its work.
    pub fn new(task: TimedTask<C>, work: W) -> Self {
        Self { task, work }
    }

    /// Poll the task and run the work if it fired.
    pub fn tick(&mut self) -> Option<Fire> {
        let fire = self.task.poll()?;
        self.work.run();
        Some(fire)
    }

    /// Borrow the timing state.
    pub fn task(&self) -> &TimedTask<C> {
        &self.task
    }

    /// Mutably borrow the timing state, e.g. to change the period.
    pub fn task_mut(&mut self) -> &mut TimedTask<C> {
        &mut self.task
    }

    /// Borrow the work.
    pub fn work(&self) -> &W {
        &self.work
    }

    /// Split into the task and its work.
    pub fn into_parts(self) -> (TimedTask<C>, W) {
        (self.task, self.work)
    }
}

/// Object-safe view of a task with work, so different task types can share a loop.
pub trait Tickable {
    /// Poll once, running the work if due.
    fn tick(&mut self) -> Option<Fire>;
    /// Task name.
    fn name(&self) -> &str;
    /// Whether a deadline was missed since the last reset.
    fn has_error(&self) -> bool;
    /// Clear the error flag.
    fn reset_error(&mut self);
    /// Fire counters.
    fn stats(&self) -> &FireStats;
}

impl<C: ClockSource, W: Work> Tickable for PeriodicTask<C, W> {
    fn tick(&mut self) -> Option<Fire> {
        PeriodicTask::tick(self)
    }

    fn name(&self) -> &str {
        self.task.name()
    }

    fn has_error(&self) -> bool {
        self.task.has_error()
    }

    fn reset_error(&mut self) {
        self.task.reset_error();
    }

    fn stats(&self) -> &FireStats {
        self.task.stats()
    }
}

/// Tasks polled in insertion order, one pass per [`tick_all`](Self::tick_all).
///
/// Each task is independent: the group adds no ordering beyond the pass order
/// and shares no state between tasks.
#[derive(Default)]
pub struct TaskGroup<'a> {
    tasks: Vec<Box<dyn Tickable + 'a>>,
}

impl<'a> TaskGroup<'a> {
    /// Create an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Append a task; it is polled after every task already in the group.
    pub fn push<T: Tickable + 'a>(&mut self, task: T) {
        debug!(task = task.name(), position = self.tasks.len(), "Task added");
        self.tasks.push(Box::new(task));
    }

    /// Poll every task once in order. Returns how many fired.
    pub fn tick_all(&mut self) -> usize {
        self.tasks
            .iter_mut()
            .filter_map(|task| task.tick())
            .count()
    }

    /// Whether any task has its error flag set.
    #[must_use]
    pub fn any_error(&self) -> bool {
        self.tasks.iter().any(|task| task.has_error())
    }

    /// Clear the error flag on every task.
    pub fn reset_errors(&mut self) {
        for task in &mut self.tasks {
            task.reset_error();
        }
    }

    /// Iterate over the tasks in polling order.
    pub fn iter(&self) -> impl Iterator<Item = &(dyn Tickable + 'a)> {
        self.tasks.iter().map(|task| &**task)
    }

    /// Number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
