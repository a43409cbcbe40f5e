//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::RegistrationNotFound
            | Self::SessionNotFound
            | Self::BranchNotFound
            | Self::TrainerNotFound
            | Self::PackageNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict (capacity, overlap, stale state, concurrent writes)
            Self::AlreadyExists
            | Self::SessionFull
            | Self::SessionStarted
            | Self::SlotOverlap
            | Self::ScheduleConflict
            | Self::RegistrationVersionConflict
            | Self::PaymentConflict => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied | Self::NotParticipant | Self::OwnerRequired => {
                StatusCode::FORBIDDEN
            }

            // 422 Unprocessable Entity (business rule refused)
            Self::DowngradeNotAllowed
            | Self::StepNotAllowed
            | Self::RegistrationCompleted
            | Self::RegistrationSuperseded
            | Self::BranchNotConfirmed
            | Self::WorkflowNotComplete
            | Self::BranchInactive
            | Self::ParticipantLimitExceeded => StatusCode::UNPROCESSABLE_ENTITY,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::NetworkError | Self::TimeoutError | Self::SystemBusy => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            // 500 Internal Server Error
            Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::StorageFull
            | Self::StorageCorrupted => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status() {
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::RegistrationNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCode::BranchNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_conflict_status() {
        assert_eq!(ErrorCode::SessionFull.http_status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::SlotOverlap.http_status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::ScheduleConflict.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::RegistrationVersionConflict.http_status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_forbidden_status() {
        assert_eq!(
            ErrorCode::NotParticipant.http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ErrorCode::OwnerRequired.http_status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_unprocessable_status() {
        assert_eq!(
            ErrorCode::DowngradeNotAllowed.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::StepNotAllowed.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_transient_status() {
        assert_eq!(
            ErrorCode::SystemBusy.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ErrorCode::TimeoutError.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ErrorCode::StorageCorrupted.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_bad_request_status() {
        assert_eq!(
            ErrorCode::ValidationFailed.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::SessionCountMismatch.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::TrainerNotCandidate.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::EmptySelection.http_status(),
            StatusCode::BAD_REQUEST
        );
    }
}
