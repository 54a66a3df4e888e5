//! Time unit constants and conversions.
//!
//! All periods are `u32` microseconds. Conversions into microseconds are checked
//! because the counter is only 32 bits wide: 4295 seconds is already out of range.
//! Conversions out of microseconds round up to the next whole unit.

use std::time::Duration;

use crate::error::{TaskError, TaskResult};

/// Microseconds per millisecond.
pub const MICROS_PER_MILLI: u32 = 1_000;

/// Microseconds per second.
pub const MICROS_PER_SECOND: u32 = 1_000_000;

/// Largest interval the wrapping comparison can tell apart from "not yet".
///
/// A task polled more than this long after its due instant looks like it is due
/// in the future instead.
pub const HALF_RANGE_MICROS: u32 = i32::MAX as u32;

/// Convert milliseconds to microseconds.
///
/// # Errors
///
/// Returns [`TaskError::PeriodOverflow`] if the result does not fit in `u32`.
pub fn millis_to_micros(millis: u32) -> TaskResult<u32> {
    millis
        .checked_mul(MICROS_PER_MILLI)
        .ok_or(TaskError::PeriodOverflow {
            value: u64::from(millis),
            unit: "ms",
        })
}

/// Convert seconds to microseconds.
///
/// # Errors
///
/// Returns [`TaskError::PeriodOverflow`] if the result does not fit in `u32`.
pub fn seconds_to_micros(seconds: u32) -> TaskResult<u32> {
    seconds
        .checked_mul(MICROS_PER_SECOND)
        .ok_or(TaskError::PeriodOverflow {
            value: u64::from(seconds),
            unit: "s",
        })
}

/// Convert a frequency in Hz to a period in microseconds (`1_000_000 / hz`, truncated).
///
/// # Errors
///
/// Returns [`TaskError::InvalidFrequency`] for non-finite or non-positive input and
/// [`TaskError::PeriodOverflow`] when the period does not fit in `u32`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn hz_to_micros(hz: f64) -> TaskResult<u32> {
    if !hz.is_finite() || hz <= 0.0 {
        return Err(TaskError::InvalidFrequency(hz));
    }
    let period = f64::from(MICROS_PER_SECOND) / hz;
    if period > f64::from(u32::MAX) {
        return Err(TaskError::PeriodOverflow {
            value: period as u64,
            unit: "us",
        });
    }
    Ok(period as u32)
}

/// Convert a [`Duration`] to whole microseconds.
///
/// # Errors
///
/// Returns [`TaskError::PeriodOverflow`] if the duration does not fit in `u32`.
pub fn duration_to_micros(duration: Duration) -> TaskResult<u32> {
    let micros = duration.as_micros();
    u32::try_from(micros).map_err(|_| TaskError::PeriodOverflow {
        value: u64::try_from(micros).unwrap_or(u64::MAX),
        unit: "us",
    })
}

/// Microseconds to milliseconds, rounded up.
#[must_use]
pub fn micros_to_millis_ceil(micros: u32) -> u32 {
    micros.div_ceil(MICROS_PER_MILLI)
}

/// Microseconds to seconds, rounded up.
#[must_use]
pub fn micros_to_seconds_ceil(micros: u32) -> u32 {
    micros.div_ceil(MICROS_PER_SECOND)
}

/// Signed distance from `target` to `now` on the wrapping counter.
///
/// Negative means `target` is still in the future. Correct as long as the real
/// distance stays within [`HALF_RANGE_MICROS`].
#[inline]
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn wrapping_elapsed(now: u32, target: u32) -> i32 {
    now.wrapping_sub(target) as i32
}
