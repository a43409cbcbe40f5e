//! Activation workflow state
//!
//! A registration moves through `selectBranch → selectTrainer →
//! createSchedule → completed`. The owner walks the whole path, an invited
//! partner starts at `selectTrainer`. Each actor has its own cursor; the
//! registration-level step is derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow step, ordered by progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    SelectBranch,
    SelectTrainer,
    CreateSchedule,
    Completed,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::SelectBranch => "selectBranch",
            Step::SelectTrainer => "selectTrainer",
            Step::CreateSchedule => "createSchedule",
            Step::Completed => "completed",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actor role on a registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The paying member
    Owner,
    /// Invited participant on a shared package
    Partner,
}

impl Role {
    /// First step of this role's path
    pub fn entry_step(&self) -> Step {
        match self {
            Role::Owner => Step::SelectBranch,
            Role::Partner => Step::SelectTrainer,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Partner => "partner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events accepted by the workflow transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowEvent {
    ConfirmBranch,
    SelectTrainer,
    CommitSchedule,
}

impl fmt::Display for WorkflowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowEvent::ConfirmBranch => "confirmBranch",
            WorkflowEvent::SelectTrainer => "selectTrainer",
            WorkflowEvent::CommitSchedule => "commitSchedule",
        };
        f.write_str(s)
    }
}

/// Persisted workflow state of a registration
///
/// `step`, `owner_done` and `partner_done` are derived from the per-actor
/// cursors and refreshed by [`WorkflowState::set_step`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    pub step: Step,
    pub owner_done: bool,
    pub partner_done: bool,
    pub owner_step: Step,
    /// None when the package has no partner
    pub partner_step: Option<Step>,
}

impl WorkflowState {
    pub fn new(has_partner: bool) -> Self {
        let mut state = Self {
            step: Step::SelectBranch,
            owner_done: false,
            partner_done: false,
            owner_step: Role::Owner.entry_step(),
            partner_step: has_partner.then(|| Role::Partner.entry_step()),
        };
        state.refresh();
        state
    }

    pub fn has_partner(&self) -> bool {
        self.partner_step.is_some()
    }

    /// Current step of one actor; None for a partner on a single package
    pub fn step_of(&self, role: Role) -> Option<Step> {
        match role {
            Role::Owner => Some(self.owner_step),
            Role::Partner => self.partner_step,
        }
    }

    /// Move one actor's cursor and recompute the derived fields
    pub fn set_step(&mut self, role: Role, step: Step) {
        match role {
            Role::Owner => self.owner_step = step,
            Role::Partner => {
                if self.partner_step.is_some() {
                    self.partner_step = Some(step);
                }
            }
        }
        self.refresh();
    }

    pub fn is_completed(&self) -> bool {
        self.step == Step::Completed
    }

    fn refresh(&mut self) {
        self.owner_done = self.owner_step == Step::Completed;
        self.partner_done = self.partner_step == Some(Step::Completed);
        // and-join: completed only once every participating actor is done,
        // otherwise the least advanced cursor
        self.step = match self.partner_step {
            Some(partner) => self.owner_step.min(partner),
            None => self.owner_step,
        };
    }
}
