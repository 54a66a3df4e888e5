use thiserror::Error;

/// Errors raised while configuring a timed task.
///
/// Polling never fails; a missed deadline is reported through the task's error
/// flag, not through this type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TaskError {
    /// Requested period does not fit in the 32-bit microsecond counter.
    #[error("period overflow: {value}{unit} does not fit in a 32-bit microsecond counter")]
    PeriodOverflow {
        /// Requested value in the caller's unit.
        value: u64,
        /// Unit of `value`.
        unit: &'static str,
    },

    /// Frequency is zero, negative, or not finite.
    #[error("invalid frequency: {0} Hz")]
    InvalidFrequency(f64),

    /// Task configuration rejected.
    #[error("invalid task configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience type alias for task configuration operations.
pub type TaskResult<T> = Result<T, TaskError>;
