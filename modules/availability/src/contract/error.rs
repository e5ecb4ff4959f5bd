use thiserror::Error;

/// Coarse failure classes a transport layer maps to its own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    ClientInput,
    MissingResource,
    StateConflict,
    Internal,
}

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityError {
    #[error("Format error: {message}")]
    Format { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Overlap: {message}")]
    Overlap { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Internal error")]
    Internal,
}

impl AvailabilityError {
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn overlap(message: impl Into<String>) -> Self {
        Self::Overlap {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Format { .. } | Self::Validation { .. } | Self::Overlap { .. } => {
                ErrorClass::ClientInput
            }
            Self::NotFound { .. } => ErrorClass::MissingResource,
            Self::Conflict { .. } => ErrorClass::StateConflict,
            Self::Internal => ErrorClass::Internal,
        }
    }
}

impl From<crate::domain::error::DomainError> for AvailabilityError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        let message = domain_error.to_string();
        match domain_error {
            InvalidClockTime { .. } => Self::format(message),
            InvalidInterval { .. } | Granularity { .. } | Validation { .. } => {
                Self::validation(message)
            }
            Overlap { .. } => Self::overlap(message),
            ScheduleNotFound { .. } | RangeNotFound { .. } => Self::not_found(message),
            Conflict { .. } | ConcurrentModification { .. } => Self::conflict(message),
            Storage { .. } => Self::internal(),
        }
    }
}

impl From<crate::contract::model::ClockTimeParseError> for AvailabilityError {
    fn from(e: crate::contract::model::ClockTimeParseError) -> Self {
        Self::format(e.to_string())
    }
}
