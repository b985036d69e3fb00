//! Engine-level errors surfaced to callers.

use chrono::NaiveDate;

use crate::db::RepositoryError;
use crate::models::EventId;

pub type SchedulingResult<T> = Result<T, SchedulingError>;

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    /// Missing or contradictory fields on a request.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The candidate collides with an existing booking or rule.
    #[error("Schedule conflict: {message}")]
    ScheduleConflict {
        message: String,
        conflicting_event: Option<EventId>,
        day: Option<NaiveDate>,
    },

    /// A referenced instructor, class, event or enrolment does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Store failure, propagated unchanged for the caller to retry.
    #[error(transparent)]
    Repository(RepositoryError),
}

impl SchedulingError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(
        message: impl Into<String>,
        conflicting_event: Option<EventId>,
        day: Option<NaiveDate>,
    ) -> Self {
        Self::ScheduleConflict {
            message: message.into(),
            conflicting_event,
            day,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ScheduleConflict { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Repository(e) if e.is_retryable())
    }
}

impl From<RepositoryError> for SchedulingError {
    fn from(err: RepositoryError) -> Self {
        if err.is_not_found() {
            SchedulingError::NotFound(err.message().to_string())
        } else {
            SchedulingError::Repository(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_not_found_maps_to_not_found() {
        let err: SchedulingError = RepositoryError::not_found("Training class 9 not found").into();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: Training class 9 not found");
    }

    #[test]
    fn test_connection_errors_stay_retryable() {
        let err: SchedulingError = RepositoryError::connection("store offline").into();
        assert!(err.is_retryable());
        assert!(!err.is_conflict());
    }
}
