//! WorkflowService - drives a registration through its activation steps
//!
//! # Operation Flow
//!
//! ```text
//! mutating operation(registration_id, actor_id, ...)
//!     ├─ 1. Acquire per-registration lock
//!     ├─ 2. Load registration, resolve actor role
//!     ├─ 3. Reject superseded registrations
//!     ├─ 4. Look up (step, role, event) in the transition table
//!     ├─ 5. Validate against catalog / matcher / builder
//!     ├─ 6. Save with optimistic version check
//!     └─ 7. Broadcast activation signal (completeWorkflow only)
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use shared::models::{Registration, SchedulePlan, Trainer};
use shared::request::{GenerateScheduleRequest, MatchTrainersRequest, SelectTrainerRequest};
use shared::response::{
    CandidateData, CompleteWorkflowResult, ScheduleCommitResult, ScheduleEntry, WorkflowStatus,
};
use shared::types::Page;
use shared::workflow::{Role, Step, WorkflowEvent};
use tokio::sync::{Mutex, OwnedMutexGuard, broadcast};

use super::error::{WorkflowError, WorkflowResult};
use super::transitions::next_step;
use crate::catalog::Catalog;
use crate::clock::SharedClock;
use crate::scheduling::{CommitContext, MatchQuery, ScheduleBuilder, SessionRegistry, TrainerMatcher};
use crate::storage::ActivationStorage;

/// Activation signal broadcast channel capacity
const SIGNAL_CHANNEL_CAPACITY: usize = 1024;

/// Emitted once per registration when the workflow is finalized
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationSignal {
    pub registration_id: String,
    pub package_id: String,
    pub owner_id: String,
    pub partner_id: Option<String>,
    pub activated_at: DateTime<Utc>,
}

/// One async mutex per registration id
#[derive(Debug, Default)]
struct RegistrationLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl RegistrationLocks {
    async fn acquire(&self, registration_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(registration_id.to_string())
            .or_default()
            .clone();
        lock.lock_owned().await
    }
}

pub struct WorkflowService {
    storage: ActivationStorage,
    catalog: Arc<dyn Catalog>,
    registry: SessionRegistry,
    matcher: TrainerMatcher,
    builder: ScheduleBuilder,
    clock: SharedClock,
    locks: RegistrationLocks,
    signal_tx: broadcast::Sender<ActivationSignal>,
}

impl std::fmt::Debug for WorkflowService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowService")
            .field("storage", &"<ActivationStorage>")
            .field("signal_tx", &"<broadcast::Sender>")
            .finish()
    }
}

impl WorkflowService {
    pub fn new(storage: ActivationStorage, catalog: Arc<dyn Catalog>, registry: SessionRegistry) -> Self {
        let (signal_tx, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);
        let clock = registry.clock().clone();
        Self {
            matcher: TrainerMatcher::new(catalog.clone(), registry.clone()),
            builder: ScheduleBuilder::new(registry.clone()),
            storage,
            catalog,
            registry,
            clock,
            locks: RegistrationLocks::default(),
            signal_tx,
        }
    }

    /// Subscribe to activation signals
    pub fn subscribe(&self) -> broadcast::Receiver<ActivationSignal> {
        self.signal_tx.subscribe()
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    // ========== Read operations ==========

    /// Current step, role flags and the data the actor needs at that step
    pub async fn get_status(&self, registration_id: &str, actor_id: &str) -> WorkflowResult<WorkflowStatus> {
        let registration = self.load(registration_id)?;
        let role = participant(&registration, actor_id)?;
        let actor_step = actor_step(&registration, role);

        let candidate_data = match actor_step {
            Step::SelectBranch => CandidateData::Branches {
                branches: self.catalog.active_branches().await?,
            },
            Step::SelectTrainer => match &registration.branch_id {
                Some(branch_id) => {
                    let branch = self
                        .catalog
                        .branch(branch_id)
                        .await?
                        .ok_or_else(|| WorkflowError::BranchNotFound(branch_id.clone()))?;
                    let trainers = self.catalog.trainers_at_branch(branch_id).await?;
                    CandidateData::Trainers { branch, trainers }
                }
                // Partner waiting for the owner to pick a branch
                None => CandidateData::Branches { branches: Vec::new() },
            },
            Step::CreateSchedule => {
                let branch_id = registration
                    .branch_id
                    .as_deref()
                    .ok_or(WorkflowError::BranchNotConfirmed)?;
                let trainer = self.selected_trainer(&registration, role).await?;
                let sessions = self.registry.open_sessions(branch_id, &trainer.id)?;
                CandidateData::Sessions { trainer, sessions }
            }
            Step::Completed => CandidateData::Schedule {
                entries: self.schedule_entries(&registration)?,
            },
        };

        Ok(WorkflowStatus {
            step: registration.workflow.step,
            role,
            actor_step,
            is_owner: role == Role::Owner,
            has_partner: registration.workflow.has_partner(),
            owner_done: registration.workflow.owner_done,
            partner_done: registration.workflow.partner_done,
            registration,
            candidate_data,
        })
    }

    /// Committed schedule of the registration, both actors, in time order
    pub async fn schedule(&self, registration_id: &str, actor_id: &str) -> WorkflowResult<Vec<ScheduleEntry>> {
        let registration = self.load(registration_id)?;
        participant(&registration, actor_id)?;
        self.schedule_entries(&registration)
    }

    /// Trainer candidates for the caller's preferences at the confirmed branch
    pub async fn match_trainers(
        &self,
        registration_id: &str,
        actor_id: &str,
        request: &MatchTrainersRequest,
        page: u32,
        page_size: u32,
    ) -> WorkflowResult<Page<Trainer>> {
        let registration = self.load(registration_id)?;
        participant(&registration, actor_id)?;
        let branch_id = registration
            .branch_id
            .as_deref()
            .ok_or(WorkflowError::BranchNotConfirmed)?;

        let query = MatchQuery {
            branch_id,
            preferred_windows: &request.preferred_windows,
            sessions_per_week: request.sessions_per_week,
        };
        Ok(self.matcher.match_page(query, page, page_size).await?)
    }

    // ========== Mutating operations ==========

    /// Confirm or change the branch (owner only)
    ///
    /// Changing the branch releases every seat committed at the old branch;
    /// actors whose schedule was released go back to `createSchedule`.
    /// Trainer selections are kept.
    pub async fn confirm_branch(
        &self,
        registration_id: &str,
        actor_id: &str,
        branch_id: &str,
    ) -> WorkflowResult<Registration> {
        let _guard = self.locks.acquire(registration_id).await;
        let mut registration = self.load(registration_id)?;
        let role = participant(&registration, actor_id)?;
        if role != Role::Owner {
            return Err(WorkflowError::OwnerRequired("change the branch"));
        }
        ensure_mutable(&registration)?;
        if registration.workflow.is_completed() {
            return Err(WorkflowError::RegistrationCompleted(registration.id));
        }

        let next = transition(&registration, role, WorkflowEvent::ConfirmBranch)?;

        let branch = self
            .catalog
            .branch(branch_id)
            .await?
            .ok_or_else(|| WorkflowError::BranchNotFound(branch_id.to_string()))?;
        if !branch.active {
            return Err(WorkflowError::BranchInactive(branch.id));
        }

        if registration.branch_id.as_deref() == Some(branch.id.as_str()) {
            return Ok(registration);
        }

        registration.workflow.set_step(Role::Owner, next);
        let Some(old_branch) = registration.branch_id.replace(branch.id.clone()) else {
            return self.save(registration);
        };

        // Seats at the old branch go back in the same transaction as the save
        let held = self.builder.held_at_branch(&registration.id, &old_branch)?;
        let affected: HashSet<Role> = held.iter().map(|r| r.role).collect();
        for role in affected {
            if actor_step(&registration, role) == Step::Completed {
                registration.workflow.set_step(role, Step::CreateSchedule);
            }
        }
        let session_ids: Vec<String> = held.into_iter().map(|r| r.session_id).collect();

        registration.updated_at = self.clock.now();
        let (saved, released) = self
            .storage
            .save_registration_releasing(&registration, &session_ids)?;
        tracing::info!(
            registration_id = %saved.id,
            from = %old_branch,
            to = %branch.id,
            released = released.len(),
            "Branch changed, seats at the old branch released"
        );
        Ok(saved)
    }

    /// Pick a trainer for the calling actor
    pub async fn select_trainer(
        &self,
        registration_id: &str,
        actor_id: &str,
        request: &SelectTrainerRequest,
    ) -> WorkflowResult<Registration> {
        let _guard = self.locks.acquire(registration_id).await;
        let mut registration = self.load(registration_id)?;
        let role = participant(&registration, actor_id)?;
        ensure_mutable(&registration)?;

        let next = transition(&registration, role, WorkflowEvent::SelectTrainer)?;
        let branch_id = registration
            .branch_id
            .clone()
            .ok_or(WorkflowError::BranchNotConfirmed)?;

        if self.catalog.trainer(&request.trainer_id).await?.is_none() {
            return Err(WorkflowError::TrainerNotFound(request.trainer_id.clone()));
        }

        let query = MatchQuery {
            branch_id: &branch_id,
            preferred_windows: &request.preferred_windows,
            sessions_per_week: request.sessions_per_week,
        };
        if !self.matcher.is_candidate(&request.trainer_id, query).await? {
            tracing::info!(
                registration_id = %registration.id,
                trainer_id = %request.trainer_id,
                "Trainer is not a current candidate"
            );
            return Err(WorkflowError::TrainerNotCandidate(request.trainer_id.clone()));
        }

        registration.set_trainer(role, request.trainer_id.clone());
        registration.set_plan(
            role,
            SchedulePlan {
                preferred_windows: request.preferred_windows.clone(),
                sessions_per_week: request.sessions_per_week,
            },
        );
        registration.workflow.set_step(role, next);
        self.save(registration)
    }

    /// Commit the calling actor's weekly schedule
    pub async fn generate_schedule(
        &self,
        registration_id: &str,
        actor_id: &str,
        request: &GenerateScheduleRequest,
    ) -> WorkflowResult<ScheduleCommitResult> {
        let _guard = self.locks.acquire(registration_id).await;
        let mut registration = self.load(registration_id)?;
        let role = participant(&registration, actor_id)?;
        ensure_mutable(&registration)?;

        // Resubmission after success
        if actor_step(&registration, role) == Step::Completed {
            if let Some(reservations) =
                self.builder
                    .committed_selection(&registration.id, role, &request.sessions)?
            {
                return Ok(ScheduleCommitResult {
                    registration_id: registration.id,
                    role,
                    actor_step: Step::Completed,
                    registration_step: registration.workflow.step,
                    reservations,
                    already_committed: true,
                });
            }
        }

        let next = transition(&registration, role, WorkflowEvent::CommitSchedule)?;
        let branch_id = registration
            .branch_id
            .clone()
            .ok_or(WorkflowError::BranchNotConfirmed)?;
        let (trainer_id, plan) = match (registration.trainer_for(role), registration.plan_for(role)) {
            (Some(trainer), Some(plan)) => (trainer.to_string(), plan.clone()),
            _ => {
                return Err(WorkflowError::StepNotAllowed {
                    role,
                    step: actor_step(&registration, role),
                    event: WorkflowEvent::CommitSchedule,
                });
            }
        };

        let ctx = CommitContext {
            registration_id: &registration.id,
            role,
            actor_id,
            branch_id: &branch_id,
            trainer_id: &trainer_id,
            sessions_per_week: plan.sessions_per_week,
        };
        let outcome = self.builder.commit(ctx, &request.sessions)?;

        registration.workflow.set_step(role, next);
        let saved = match self.save(registration) {
            Ok(saved) => saved,
            Err(e) => {
                if !outcome.already_committed {
                    for reservation in &outcome.reservations {
                        if let Err(release_err) =
                            self.registry.release(registration_id, &reservation.session_id)
                        {
                            tracing::error!(
                                registration_id = %registration_id,
                                session_id = %reservation.session_id,
                                error = %release_err,
                                "Failed to release seat after save failure"
                            );
                        }
                    }
                }
                return Err(e);
            }
        };

        if saved.workflow.is_completed() {
            tracing::info!(registration_id = %saved.id, "All participants scheduled");
        }

        Ok(ScheduleCommitResult {
            registration_id: saved.id,
            role,
            actor_step: next,
            registration_step: saved.workflow.step,
            reservations: outcome.reservations,
            already_committed: outcome.already_committed,
        })
    }

    /// Finalize the activation; repeated calls return the first activation
    pub async fn complete_workflow(
        &self,
        registration_id: &str,
        actor_id: &str,
    ) -> WorkflowResult<CompleteWorkflowResult> {
        let _guard = self.locks.acquire(registration_id).await;
        let mut registration = self.load(registration_id)?;
        participant(&registration, actor_id)?;
        ensure_mutable(&registration)?;

        if !registration.workflow.is_completed() {
            return Err(WorkflowError::NotComplete(registration.workflow.step));
        }
        if let Some(activated_at) = registration.activated_at {
            return Ok(CompleteWorkflowResult {
                registration_id: registration.id,
                activated_at,
                newly_activated: false,
            });
        }

        let activated_at = self.clock.now();
        registration.activated_at = Some(activated_at);
        let saved = self.save(registration)?;

        let signal = ActivationSignal {
            registration_id: saved.id.clone(),
            package_id: saved.package_id.clone(),
            owner_id: saved.owner_id.clone(),
            partner_id: saved.partner_id.clone(),
            activated_at,
        };
        if self.signal_tx.send(signal).is_err() {
            tracing::debug!("Activation signal dropped: no active receivers");
        }
        tracing::info!(registration_id = %saved.id, "Package activated");

        Ok(CompleteWorkflowResult {
            registration_id: saved.id,
            activated_at,
            newly_activated: true,
        })
    }

    // ========== Helpers ==========

    fn load(&self, registration_id: &str) -> WorkflowResult<Registration> {
        self.storage
            .get_registration(registration_id)?
            .ok_or_else(|| WorkflowError::RegistrationNotFound(registration_id.to_string()))
    }

    fn save(&self, mut registration: Registration) -> WorkflowResult<Registration> {
        registration.updated_at = self.clock.now();
        Ok(self.storage.save_registration(&registration)?)
    }

    async fn selected_trainer(&self, registration: &Registration, role: Role) -> WorkflowResult<Trainer> {
        let trainer_id = registration
            .trainer_for(role)
            .ok_or(WorkflowError::StepNotAllowed {
                role,
                step: Step::CreateSchedule,
                event: WorkflowEvent::CommitSchedule,
            })?;
        self.catalog
            .trainer(trainer_id)
            .await?
            .ok_or_else(|| WorkflowError::TrainerNotFound(trainer_id.to_string()))
    }

    fn schedule_entries(&self, registration: &Registration) -> WorkflowResult<Vec<ScheduleEntry>> {
        let now = self.registry.now_local();
        let mut entries = Vec::new();
        for reservation in self.registry.reservations_for(&registration.id)? {
            let Some(session) = self.registry.get(&reservation.session_id)? else {
                tracing::warn!(
                    registration_id = %registration.id,
                    session_id = %reservation.session_id,
                    "Reserved session no longer exists"
                );
                continue;
            };
            if let Some(view) = self.registry.view_at(session, now) {
                entries.push(ScheduleEntry {
                    role: reservation.role,
                    actor_id: reservation.actor_id,
                    session: view,
                });
            }
        }
        entries.sort_by(|a, b| {
            (a.session.session.starts_at(), &a.session.session.id)
                .cmp(&(b.session.session.starts_at(), &b.session.session.id))
        });
        Ok(entries)
    }
}

fn participant(registration: &Registration, actor_id: &str) -> WorkflowResult<Role> {
    registration
        .role_of(actor_id)
        .ok_or_else(|| WorkflowError::NotParticipant {
            registration_id: registration.id.clone(),
            actor_id: actor_id.to_string(),
        })
}

fn actor_step(registration: &Registration, role: Role) -> Step {
    registration
        .workflow
        .step_of(role)
        .unwrap_or_else(|| role.entry_step())
}

fn ensure_mutable(registration: &Registration) -> WorkflowResult<()> {
    if registration.is_superseded() {
        return Err(WorkflowError::Superseded(registration.id.clone()));
    }
    Ok(())
}

fn transition(registration: &Registration, role: Role, event: WorkflowEvent) -> WorkflowResult<Step> {
    let step = actor_step(registration, role);
    next_step(step, role, event).ok_or(WorkflowError::StepNotAllowed { role, step, event })
}
