//! Scheduling core
//!
//! - [`slots`]: fixed daily slot grid
//! - [`registry`]: sessions, occupancy and read-time labels
//! - [`matcher`]: trainer candidates for a set of preferences
//! - [`builder`]: validated, all-or-nothing schedule commits

pub mod builder;
pub mod matcher;
pub mod registry;
pub mod slots;

pub use builder::{CommitContext, CommitOutcome, ScheduleBuilder};
pub use matcher::{MatchQuery, TrainerMatcher};
pub use registry::SessionRegistry;

use serde::Serialize;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::storage::StorageError;

/// Why a selected session cannot be committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictReason {
    /// Submitted date, time or trainer differ from the stored session
    Stale,
    /// Another selected or committed session occupies the same day and slot
    Overlap,
    /// Seat already held under this registration
    AlreadyReserved,
    Full,
    Started,
    OutsideSlot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConflict {
    pub session_id: String,
    pub reason: ConflictReason,
}

impl SessionConflict {
    pub fn new(session_id: impl Into<String>, reason: ConflictReason) -> Self {
        Self {
            session_id: session_id.into(),
            reason,
        }
    }
}

#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("No sessions selected")]
    EmptySelection,

    #[error("Expected {expected} sessions per week, got {got}")]
    CountMismatch { expected: u8, got: usize },

    #[error("Session selected more than once: {0}")]
    DuplicateSession(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session {session_id} cannot be booked: {reason}")]
    NotEligible { session_id: String, reason: String },

    #[error("{} selected session(s) unavailable", .0.len())]
    Conflict(Vec<SessionConflict>),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl SchedulingError {
    pub fn conflict(session_id: impl Into<String>, reason: ConflictReason) -> Self {
        Self::Conflict(vec![SessionConflict::new(session_id, reason)])
    }
}
