//! Error types for meeting-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The base end of a recurring schedule is not strictly after its start.
    #[error("Invalid duration: base end must be after base start")]
    InvalidDuration,

    /// Neither the rule nor the caller supplied an upper bound for expansion.
    #[error("Unbounded window: expansion requires a rule end date or a range end")]
    UnboundedWindow,

    /// A frequency other than daily/weekly reached the engine.
    #[error("Invalid frequency: {0:?}")]
    InvalidFrequency(String),

    #[error("Invalid interval: start must be before end")]
    InvalidInterval,

    #[error("Invalid period kind: {0:?}")]
    InvalidPeriod(String),

    #[error("Invalid UTC offset: {0:?}")]
    InvalidOffset(String),

    /// An RRULE could not be imported.
    #[error("Invalid RRULE: {0}")]
    InvalidRule(String),

    /// Calendar arithmetic left the representable date range.
    #[error("Date out of range")]
    OutOfRange,
}

pub type Result<T> = std::result::Result<T, EngineError>;
