use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::contract::model::{ClockTimeParseError, TimeRange};
use crate::domain::time::Granularity;

/// Domain-specific errors using thiserror
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid clock time '{input}': expected zero-padded HH:mm")]
    InvalidClockTime { input: String },

    #[error("Invalid interval {range}: start must be before end")]
    InvalidInterval { range: TimeRange },

    #[error("Interval {range} violates {policy} granularity: {message}")]
    Granularity {
        range: TimeRange,
        policy: Granularity,
        message: String,
    },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Interval {candidate} overlaps {existing}")]
    Overlap {
        candidate: TimeRange,
        existing: TimeRange,
    },

    #[error("No schedule for owner {owner_id} on {date}")]
    ScheduleNotFound { owner_id: Uuid, date: NaiveDate },

    #[error("No interval matches {range}")]
    RangeNotFound { range: TimeRange },

    #[error("Conflict on {range}: {reason}")]
    Conflict { range: TimeRange, reason: String },

    #[error("Schedule for owner {owner_id} on {date} was modified concurrently")]
    ConcurrentModification { owner_id: Uuid, date: NaiveDate },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl DomainError {
    pub fn invalid_interval(range: TimeRange) -> Self {
        Self::InvalidInterval { range }
    }

    pub fn granularity(range: TimeRange, policy: Granularity, message: impl Into<String>) -> Self {
        Self::Granularity {
            range,
            policy,
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn overlap(candidate: TimeRange, existing: TimeRange) -> Self {
        Self::Overlap {
            candidate,
            existing,
        }
    }

    pub fn schedule_not_found(owner_id: Uuid, date: NaiveDate) -> Self {
        Self::ScheduleNotFound { owner_id, date }
    }

    pub fn range_not_found(range: TimeRange) -> Self {
        Self::RangeNotFound { range }
    }

    pub fn conflict(range: TimeRange, reason: impl Into<String>) -> Self {
        Self::Conflict {
            range,
            reason: reason.into(),
        }
    }

    pub fn concurrent_modification(owner_id: Uuid, date: NaiveDate) -> Self {
        Self::ConcurrentModification { owner_id, date }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

impl From<ClockTimeParseError> for DomainError {
    fn from(e: ClockTimeParseError) -> Self {
        Self::InvalidClockTime { input: e.input }
    }
}
