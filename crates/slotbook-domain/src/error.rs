use crate::booking::{Actor, BookingStatus};

/// Validation and state-machine failures raised by domain types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("duration must be between 1 and 8 hours, got {0}")]
    InvalidDuration(u8),
    #[error("hourly rate must be a positive amount")]
    InvalidRate,
    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
    #[error("unknown role {0:?}")]
    UnknownRole(String),
    #[error("unknown booking status {0:?}")]
    UnknownStatus(String),
    #[error("cannot move a booking from {from} to {to}")]
    IllegalTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    #[error("{actor} may not move a booking to {to}")]
    NotPermitted { actor: Actor, to: BookingStatus },
}

impl DomainError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "MISSING_FIELD",
            Self::InvalidDuration(_) => "INVALID_DURATION",
            Self::InvalidRate => "INVALID_RATE",
            Self::InvalidRating(_) => "INVALID_RATING",
            Self::UnknownRole(_) => "UNKNOWN_ROLE",
            Self::UnknownStatus(_) => "UNKNOWN_STATUS",
            Self::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
            Self::NotPermitted { .. } => "NOT_PERMITTED",
        }
    }
}
