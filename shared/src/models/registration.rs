//! Registration Model
//!
//! One registration per paid package purchase. Created when the payment
//! completion record arrives and then mutated by each workflow step.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::workflow::{Role, WorkflowState};

/// A preferred training window: a slot of the daily grid, optionally pinned
/// to one weekday. Without a weekday the slot matches on any day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PreferredWindow {
    #[validate(range(min = 1, max = 8))]
    pub slot_id: u8,
    #[serde(default)]
    pub weekday: Option<Weekday>,
}

/// Per-actor schedule plan captured at trainer selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePlan {
    pub preferred_windows: Vec<PreferredWindow>,
    pub sessions_per_week: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: String,
    pub package_id: String,
    /// Null until the owner confirms a branch
    pub branch_id: Option<String>,
    /// Owner's trainer
    pub trainer_id: Option<String>,
    pub partner_trainer_id: Option<String>,
    pub workflow: WorkflowState,
    pub owner_id: String,
    pub partner_id: Option<String>,
    pub start_date: NaiveDate,
    /// Always start + package term, unless superseded
    pub end_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub payment_amount: Decimal,
    pub owner_plan: Option<SchedulePlan>,
    pub partner_plan: Option<SchedulePlan>,
    pub activated_at: Option<DateTime<Utc>>,
    /// Id of the registration that replaced this one on upgrade
    pub superseded_by: Option<String>,
    /// Optimistic concurrency counter
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    /// Role of the actor on this registration, None if not a participant
    pub fn role_of(&self, actor_id: &str) -> Option<Role> {
        if self.owner_id == actor_id {
            Some(Role::Owner)
        } else if self.partner_id.as_deref() == Some(actor_id) {
            Some(Role::Partner)
        } else {
            None
        }
    }

    pub fn actor_of(&self, role: Role) -> Option<&str> {
        match role {
            Role::Owner => Some(self.owner_id.as_str()),
            Role::Partner => self.partner_id.as_deref(),
        }
    }

    pub fn trainer_for(&self, role: Role) -> Option<&str> {
        match role {
            Role::Owner => self.trainer_id.as_deref(),
            Role::Partner => self.partner_trainer_id.as_deref(),
        }
    }

    pub fn set_trainer(&mut self, role: Role, trainer_id: String) {
        match role {
            Role::Owner => self.trainer_id = Some(trainer_id),
            Role::Partner => self.partner_trainer_id = Some(trainer_id),
        }
    }

    pub fn plan_for(&self, role: Role) -> Option<&SchedulePlan> {
        match role {
            Role::Owner => self.owner_plan.as_ref(),
            Role::Partner => self.partner_plan.as_ref(),
        }
    }

    pub fn set_plan(&mut self, role: Role, plan: SchedulePlan) {
        match role {
            Role::Owner => self.owner_plan = Some(plan),
            Role::Partner => self.partner_plan = Some(plan),
        }
    }

    pub fn is_superseded(&self) -> bool {
        self.superseded_by.is_some()
    }
}
