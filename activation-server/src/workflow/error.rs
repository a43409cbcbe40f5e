use shared::workflow::{Role, Step, WorkflowEvent};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::scheduling::SchedulingError;
use crate::storage::StorageError;
use crate::utils::{AppError, ErrorCode};

/// Workflow errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Registration not found: {0}")]
    RegistrationNotFound(String),

    #[error("Actor {actor_id} is not a participant of registration {registration_id}")]
    NotParticipant {
        registration_id: String,
        actor_id: String,
    },

    #[error("Only the owner can {0}")]
    OwnerRequired(&'static str),

    #[error("Registration {0} was superseded")]
    Superseded(String),

    #[error("Registration {0} is already completed")]
    RegistrationCompleted(String),

    #[error("{event} is not allowed for the {role} at step {step}")]
    StepNotAllowed {
        role: Role,
        step: Step,
        event: WorkflowEvent,
    },

    #[error("Branch has not been confirmed yet")]
    BranchNotConfirmed,

    #[error("Branch not found: {0}")]
    BranchNotFound(String),

    #[error("Branch is not active: {0}")]
    BranchInactive(String),

    #[error("Trainer not found: {0}")]
    TrainerNotFound(String),

    #[error("Trainer {0} does not match the preferences")]
    TrainerNotCandidate(String),

    #[error("Workflow is at step {0}, not completed")]
    NotComplete(Step),

    #[error(transparent)]
    Scheduling(#[from] SchedulingError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        let message = err.to_string();
        match err {
            WorkflowError::RegistrationNotFound(id) => {
                AppError::with_message(ErrorCode::RegistrationNotFound, message).with_detail("registrationId", id)
            }
            WorkflowError::NotParticipant { .. } => AppError::with_message(ErrorCode::NotParticipant, message),
            WorkflowError::OwnerRequired(_) => AppError::with_message(ErrorCode::OwnerRequired, message),
            WorkflowError::Superseded(_) => AppError::with_message(ErrorCode::RegistrationSuperseded, message),
            WorkflowError::RegistrationCompleted(_) => {
                AppError::with_message(ErrorCode::RegistrationCompleted, message)
            }
            WorkflowError::StepNotAllowed { step, .. } => {
                AppError::with_message(ErrorCode::StepNotAllowed, message).with_detail("step", step.as_str())
            }
            WorkflowError::BranchNotConfirmed => AppError::with_message(ErrorCode::BranchNotConfirmed, message),
            WorkflowError::BranchNotFound(id) => {
                AppError::with_message(ErrorCode::BranchNotFound, message).with_detail("branchId", id)
            }
            WorkflowError::BranchInactive(id) => {
                AppError::with_message(ErrorCode::BranchInactive, message).with_detail("branchId", id)
            }
            WorkflowError::TrainerNotFound(id) => {
                AppError::with_message(ErrorCode::TrainerNotFound, message).with_detail("trainerId", id)
            }
            WorkflowError::TrainerNotCandidate(id) => {
                AppError::with_message(ErrorCode::TrainerNotCandidate, message).with_detail("trainerId", id)
            }
            WorkflowError::NotComplete(step) => {
                AppError::with_message(ErrorCode::WorkflowNotComplete, message).with_detail("step", step.as_str())
            }
            WorkflowError::Scheduling(e) => e.into(),
            WorkflowError::Storage(e) => e.into(),
            WorkflowError::Catalog(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let err: AppError = WorkflowError::StepNotAllowed {
            role: Role::Partner,
            step: Step::SelectTrainer,
            event: WorkflowEvent::CommitSchedule,
        }
        .into();
        assert_eq!(err.code, ErrorCode::StepNotAllowed);
        assert_eq!(err.http_status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            err.message,
            "commitSchedule is not allowed for the partner at step selectTrainer"
        );

        let err: AppError = WorkflowError::OwnerRequired("change the branch").into();
        assert_eq!(err.http_status(), StatusCode::FORBIDDEN);

        let err: AppError = WorkflowError::RegistrationNotFound("r-9".into()).into();
        assert_eq!(err.http_status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_transient_storage_error() {
        let err: AppError = WorkflowError::Storage(StorageError::Commit(redb::CommitError::Storage(
            redb::StorageError::Io(std::io::Error::other("device busy")),
        )))
        .into();
        assert_eq!(err.code, ErrorCode::SystemBusy);
        assert_eq!(err.http_status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
