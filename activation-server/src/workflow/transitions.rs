//! Workflow transition table
//!
//! `(step, role, event) → next step`, kept as data. A pair missing from the
//! table is an invalid actor-for-step combination.
//!
//! Branch confirmation never moves an actor backwards by itself: the rewind
//! after a branch change comes from releasing the affected schedules.

use shared::workflow::{Role, Step, WorkflowEvent};

use Role::{Owner, Partner};
use Step::{Completed, CreateSchedule, SelectBranch, SelectTrainer};

const TRANSITIONS: &[(Step, Role, WorkflowEvent, Step)] = &[
    // Branch: first confirmation advances, later ones keep the step
    (SelectBranch, Owner, WorkflowEvent::ConfirmBranch, SelectTrainer),
    (SelectTrainer, Owner, WorkflowEvent::ConfirmBranch, SelectTrainer),
    (CreateSchedule, Owner, WorkflowEvent::ConfirmBranch, CreateSchedule),
    (Completed, Owner, WorkflowEvent::ConfirmBranch, Completed),
    // Trainer: may be re-picked until the schedule is committed
    (SelectTrainer, Owner, WorkflowEvent::SelectTrainer, CreateSchedule),
    (CreateSchedule, Owner, WorkflowEvent::SelectTrainer, CreateSchedule),
    (SelectTrainer, Partner, WorkflowEvent::SelectTrainer, CreateSchedule),
    (CreateSchedule, Partner, WorkflowEvent::SelectTrainer, CreateSchedule),
    // Schedule
    (CreateSchedule, Owner, WorkflowEvent::CommitSchedule, Completed),
    (CreateSchedule, Partner, WorkflowEvent::CommitSchedule, Completed),
];

pub fn next_step(step: Step, role: Role, event: WorkflowEvent) -> Option<Step> {
    TRANSITIONS
        .iter()
        .find(|(s, r, e, _)| *s == step && *r == role && *e == event)
        .map(|(_, _, _, next)| *next)
}
