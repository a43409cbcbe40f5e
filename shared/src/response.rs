//! Response payloads of the activation API

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Branch, Registration, Reservation, Session, SessionStatus, Trainer};
use crate::workflow::{Role, Step};

/// Session as presented to a client, with read-time labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    #[serde(flatten)]
    pub session: Session,
    pub slot_id: u8,
    pub status: SessionStatus,
    pub seats_left: u32,
    /// Future start and a free seat
    pub registrable: bool,
}

/// Committed reservation joined with its session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub role: Role,
    pub actor_id: String,
    pub session: SessionView,
}

/// Step-specific data prefetched by `GET /api/workflow-status/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CandidateData {
    /// selectBranch: branches the owner can pick
    Branches { branches: Vec<Branch> },
    /// selectTrainer: the confirmed branch and its trainers
    Trainers {
        branch: Branch,
        trainers: Vec<Trainer>,
    },
    /// createSchedule: the selected trainer and the sessions on offer
    Sessions {
        trainer: Trainer,
        sessions: Vec<SessionView>,
    },
    /// completed: the committed schedule
    Schedule { entries: Vec<ScheduleEntry> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStatus {
    /// Registration-level step
    pub step: Step,
    pub role: Role,
    /// Step of the calling actor
    pub actor_step: Step,
    pub is_owner: bool,
    pub has_partner: bool,
    pub owner_done: bool,
    pub partner_done: bool,
    pub registration: Registration,
    pub candidate_data: CandidateData,
}

/// Result of a schedule commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleCommitResult {
    pub registration_id: String,
    pub role: Role,
    pub actor_step: Step,
    pub registration_step: Step,
    pub reservations: Vec<Reservation>,
    /// True when the same selection was already committed
    pub already_committed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteWorkflowResult {
    pub registration_id: String,
    pub activated_at: DateTime<Utc>,
    /// False on a repeated call
    pub newly_activated: bool,
}

/// Residual value of the current package and the upgrade charge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProrationResult {
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub upgrade_amount: Decimal,
    pub is_expired: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeQuote {
    pub registration_id: String,
    pub current_package_id: String,
    pub new_package_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub new_package_price: Decimal,
    #[serde(flatten)]
    pub proration: ProrationResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIngestResult {
    pub registration: Registration,
    /// False when the record was already ingested
    pub created: bool,
    /// Registration soft-closed by this purchase
    pub superseded: Option<String>,
    pub superseded_end_date: Option<NaiveDate>,
}
