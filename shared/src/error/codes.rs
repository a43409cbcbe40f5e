//! Unified error codes for the activation service
//!
//! Error codes are shared by the server, the web client and the mobile app.
//! They are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Workflow errors
//! - 4xxx: Schedule / session errors
//! - 5xxx: Payment / proration errors
//! - 6xxx: Catalog errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// Actor identity missing from the request
    NotAuthenticated = 1001,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Actor is neither owner nor partner of the registration
    NotParticipant = 2002,
    /// Operation reserved for the package owner
    OwnerRequired = 2003,

    // ==================== 3xxx: Workflow ====================
    /// Registration not found
    RegistrationNotFound = 3001,
    /// Operation not allowed at the actor's current step
    StepNotAllowed = 3002,
    /// Registration has already completed the workflow
    RegistrationCompleted = 3003,
    /// Registration was superseded by an upgrade
    RegistrationSuperseded = 3004,
    /// Branch has not been confirmed yet
    BranchNotConfirmed = 3005,
    /// Trainer is not in the current candidate list
    TrainerNotCandidate = 3006,
    /// Registration was modified concurrently
    RegistrationVersionConflict = 3007,
    /// Workflow not ready for finalization
    WorkflowNotComplete = 3008,

    // ==================== 4xxx: Schedule ====================
    /// Session not found
    SessionNotFound = 4001,
    /// Session has no seat left
    SessionFull = 4002,
    /// Session has already started
    SessionStarted = 4003,
    /// Two sessions share a time slot on the same day
    SlotOverlap = 4004,
    /// Session does not fit inside a time slot
    SessionOutsideSlot = 4005,
    /// Schedule commit conflicted, see details
    ScheduleConflict = 4006,
    /// Selection size does not match the weekly plan
    SessionCountMismatch = 4007,
    /// Selection is empty
    EmptySelection = 4008,
    /// Session belongs to another branch or trainer
    SessionNotEligible = 4009,

    // ==================== 5xxx: Payment ====================
    /// Downgrades and same-price switches are refused
    DowngradeNotAllowed = 5001,
    /// Payment amount is invalid
    PaymentInvalidAmount = 5002,
    /// Payment record conflicts with an existing registration
    PaymentConflict = 5003,
    /// Package does not allow that many participants
    ParticipantLimitExceeded = 5004,

    // ==================== 6xxx: Catalog ====================
    /// Branch not found
    BranchNotFound = 6001,
    /// Branch is not active
    BranchInactive = 6002,
    /// Trainer not found
    TrainerNotFound = 6101,
    /// Package not found
    PackageNotFound = 6201,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Collaborator service unreachable
    NetworkError = 9003,
    /// Operation timed out
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,

    // ==================== 94xx: Storage ====================
    /// Storage full
    StorageFull = 9401,
    /// Storage corrupted
    StorageCorrupted = 9403,
    /// System busy (transient storage failure)
    SystemBusy = 9404,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Whether the client may retry the exact same call
    #[inline]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorCode::NetworkError | ErrorCode::TimeoutError | ErrorCode::SystemBusy
        )
    }

    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "Actor is not authenticated",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::NotParticipant => "Actor does not participate in this registration",
            ErrorCode::OwnerRequired => "Only the package owner can do this",

            // Workflow
            ErrorCode::RegistrationNotFound => "Registration not found",
            ErrorCode::StepNotAllowed => "Operation not allowed at the current step",
            ErrorCode::RegistrationCompleted => "Registration workflow is already completed",
            ErrorCode::RegistrationSuperseded => "Registration was superseded by another package",
            ErrorCode::BranchNotConfirmed => "Branch has not been confirmed",
            ErrorCode::TrainerNotCandidate => "Trainer is not available for these preferences",
            ErrorCode::RegistrationVersionConflict => "Registration was modified concurrently",
            ErrorCode::WorkflowNotComplete => "Workflow has not reached completion",

            // Schedule
            ErrorCode::SessionNotFound => "Session not found",
            ErrorCode::SessionFull => "Session is full",
            ErrorCode::SessionStarted => "Session has already started",
            ErrorCode::SlotOverlap => "Two sessions overlap in the same time slot",
            ErrorCode::SessionOutsideSlot => "Session does not fit a time slot",
            ErrorCode::ScheduleConflict => "Schedule could not be committed",
            ErrorCode::SessionCountMismatch => "Number of sessions does not match the weekly plan",
            ErrorCode::EmptySelection => "No session selected",
            ErrorCode::SessionNotEligible => "Session is not eligible for this registration",

            // Payment
            ErrorCode::DowngradeNotAllowed => "New package must be more expensive than the current one",
            ErrorCode::PaymentInvalidAmount => "Invalid payment amount",
            ErrorCode::PaymentConflict => "Payment conflicts with an existing registration",
            ErrorCode::ParticipantLimitExceeded => "Package does not allow that many participants",

            // Catalog
            ErrorCode::BranchNotFound => "Branch not found",
            ErrorCode::BranchInactive => "Branch is not active",
            ErrorCode::TrainerNotFound => "Trainer not found",
            ErrorCode::PackageNotFound => "Package not found",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",

            // Storage
            ErrorCode::StorageFull => "Storage full (disk space insufficient)",
            ErrorCode::StorageCorrupted => "Storage corrupted (data file damaged)",
            ErrorCode::SystemBusy => "System busy, please retry later",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::NotParticipant),
            2003 => Ok(ErrorCode::OwnerRequired),

            // Workflow
            3001 => Ok(ErrorCode::RegistrationNotFound),
            3002 => Ok(ErrorCode::StepNotAllowed),
            3003 => Ok(ErrorCode::RegistrationCompleted),
            3004 => Ok(ErrorCode::RegistrationSuperseded),
            3005 => Ok(ErrorCode::BranchNotConfirmed),
            3006 => Ok(ErrorCode::TrainerNotCandidate),
            3007 => Ok(ErrorCode::RegistrationVersionConflict),
            3008 => Ok(ErrorCode::WorkflowNotComplete),

            // Schedule
            4001 => Ok(ErrorCode::SessionNotFound),
            4002 => Ok(ErrorCode::SessionFull),
            4003 => Ok(ErrorCode::SessionStarted),
            4004 => Ok(ErrorCode::SlotOverlap),
            4005 => Ok(ErrorCode::SessionOutsideSlot),
            4006 => Ok(ErrorCode::ScheduleConflict),
            4007 => Ok(ErrorCode::SessionCountMismatch),
            4008 => Ok(ErrorCode::EmptySelection),
            4009 => Ok(ErrorCode::SessionNotEligible),

            // Payment
            5001 => Ok(ErrorCode::DowngradeNotAllowed),
            5002 => Ok(ErrorCode::PaymentInvalidAmount),
            5003 => Ok(ErrorCode::PaymentConflict),
            5004 => Ok(ErrorCode::ParticipantLimitExceeded),

            // Catalog
            6001 => Ok(ErrorCode::BranchNotFound),
            6002 => Ok(ErrorCode::BranchInactive),
            6101 => Ok(ErrorCode::TrainerNotFound),
            6201 => Ok(ErrorCode::PackageNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            // Storage
            9401 => Ok(ErrorCode::StorageFull),
            9403 => Ok(ErrorCode::StorageCorrupted),
            9404 => Ok(ErrorCode::SystemBusy),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
