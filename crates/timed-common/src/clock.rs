//! Clock sources for timed tasks.
//!
//! A clock source is a free-running microsecond counter that wraps at `u32::MAX`,
//! the same shape as the `micros()` counter found on most microcontroller HALs.
//! Readings are only ever compared with wrapping arithmetic, so the absolute value
//! carries no meaning beyond "now, modulo 2^32 microseconds".

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// A free-running microsecond counter.
///
/// Implementations must never move backwards except when the counter wraps
/// from `u32::MAX` to zero.
pub trait ClockSource {
    /// Current counter value in microseconds.
    fn now_micros(&self) -> u32;
}

impl<C: ClockSource + ?Sized> ClockSource for &C {
    #[inline]
    fn now_micros(&self) -> u32 {
        (**self).now_micros()
    }
}

impl<C: ClockSource + ?Sized> ClockSource for Rc<C> {
    #[inline]
    fn now_micros(&self) -> u32 {
        (**self).now_micros()
    }
}

impl<C: ClockSource + ?Sized> ClockSource for Box<C> {
    #[inline]
    fn now_micros(&self) -> u32 {
        (**self).now_micros()
    }
}

/// Adapter turning any `Fn() -> u32` into a clock source.
///
/// Useful for wrapping a HAL function such as `micros`.
///
/// # Example
///
/// ```
/// use timed_common::clock::{ClockSource, FnClock};
///
/// let clock = FnClock(|| 42);
/// assert_eq!(clock.now_micros(), 42);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FnClock<F>(pub F);

impl<F: Fn() -> u32> ClockSource for FnClock<F> {
    #[inline]
    fn now_micros(&self) -> u32 {
        (self.0)()
    }
}

/// Manually driven clock for tests and simulation.
///
/// Time only moves when [`set`](Self::set) or [`advance`](Self::advance) is called.
/// Tasks borrow it (`&ManualClock` is a [`ClockSource`]), so one clock can drive
/// several tasks in the same loop.
///
/// # Example
///
/// ```
/// use timed_common::clock::{ClockSource, ManualClock};
///
/// let clock = ManualClock::new(u32::MAX - 5);
/// clock.advance(10);
/// assert_eq!(clock.now_micros(), 4);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u32>,
}

impl ManualClock {
    /// Create a clock reading `start` microseconds.
    #[must_use]
    pub fn new(start: u32) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Jump to an absolute counter value.
    pub fn set(&self, micros: u32) {
        self.now.set(micros);
    }

    /// Move forward by `micros`, wrapping at the counter range.
    pub fn advance(&self, micros: u32) {
        self.now.set(self.now.get().wrapping_add(micros));
    }
}

impl ClockSource for ManualClock {
    #[inline]
    fn now_micros(&self) -> u32 {
        self.now.get()
    }
}

/// Host monotonic clock truncated to a wrapping 32-bit microsecond counter.
///
/// The counter starts at `offset` when the clock is created. Starting close to
/// `u32::MAX` makes the wrap happen within seconds instead of after ~71 minutes.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
    offset: u32,
}

impl MonotonicClock {
    /// Create a clock whose counter starts at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::with_offset(0)
    }

    /// Create a clock whose counter starts at `offset`.
    #[must_use]
    pub fn with_offset(offset: u32) -> Self {
        Self {
            origin: Instant::now(),
            offset,
        }
    }

    /// Starting counter value.
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.offset
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for MonotonicClock {
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn now_micros(&self) -> u32 {
        // Truncation is the wrap.
        let elapsed = self.origin.elapsed().as_micros() as u32;
        self.offset.wrapping_add(elapsed)
    }
}
