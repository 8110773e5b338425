//! Error types for almanac-engine operations.

use thiserror::Error;

/// Failure kinds for engine operations.
///
/// Every fallible operation returns exactly one of these kinds; there is no
/// silent fallback for a condition classified here as a hard failure. The
/// engine never formats user-facing prose — adapters translate kinds into
/// whatever the surface needs.
#[derive(Error, Debug)]
pub enum AlmanacError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Ambiguous date: {0}")]
    AmbiguousDate(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid weekday: {0}")]
    InvalidWeekday(String),

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Missing days count: {0}")]
    MissingDaysCount(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
}

pub type Result<T> = std::result::Result<T, AlmanacError>;
