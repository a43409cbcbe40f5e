//! Payment completion intake
//!
//! The payment platform reports a completed purchase; this is where a
//! registration is born. Ingestion is idempotent per registration id. An
//! upgrade purchase names the registration it replaces, which is soft-closed
//! in the same write transaction: its end date moves to the new start date
//! and it records its successor.

use std::sync::Arc;

use chrono::Duration;
use rust_decimal::Decimal;
use shared::models::Registration;
use shared::request::PaymentCompletedRequest;
use shared::response::PaymentIngestResult;
use shared::workflow::WorkflowState;

use crate::catalog::Catalog;
use crate::clock::SharedClock;
use crate::storage::ActivationStorage;
use crate::utils::{AppError, AppResult, ErrorCode};

#[derive(Debug, Clone)]
pub struct PaymentIntake {
    storage: ActivationStorage,
    catalog: Arc<dyn Catalog>,
    clock: SharedClock,
}

impl PaymentIntake {
    pub fn new(storage: ActivationStorage, catalog: Arc<dyn Catalog>, clock: SharedClock) -> Self {
        Self {
            storage,
            catalog,
            clock,
        }
    }

    pub async fn ingest(&self, record: &PaymentCompletedRequest) -> AppResult<PaymentIngestResult> {
        if let Some(existing) = self.storage.get_registration(&record.registration_id)? {
            return self.replay(existing, record);
        }

        if record.amount < Decimal::ZERO {
            return Err(AppError::with_message(
                ErrorCode::PaymentInvalidAmount,
                format!("Negative payment amount: {}", record.amount),
            ));
        }

        let package = self
            .catalog
            .package(&record.package_id)
            .await?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::PackageNotFound,
                    format!("Package not found: {}", record.package_id),
                )
            })?;

        let mut others: Vec<&str> = Vec::new();
        for id in &record.participant_ids {
            if id != &record.payer_id && !others.contains(&id.as_str()) {
                others.push(id);
            }
        }
        let participants = others.len() + 1;
        if participants > package.max_participants as usize {
            return Err(AppError::with_message(
                ErrorCode::ParticipantLimitExceeded,
                format!(
                    "Package {} allows {} participant(s), got {}",
                    package.id, package.max_participants, participants
                ),
            )
            .with_detail("maxParticipants", package.max_participants));
        }
        let partner_id = package
            .is_shared()
            .then(|| others.first().map(|id| id.to_string()))
            .flatten();

        let now = self.clock.now();
        let registration = Registration {
            id: record.registration_id.clone(),
            package_id: package.id.clone(),
            branch_id: None,
            trainer_id: None,
            partner_trainer_id: None,
            workflow: WorkflowState::new(partner_id.is_some()),
            owner_id: record.payer_id.clone(),
            partner_id,
            start_date: record.start_date,
            end_date: record.start_date + Duration::days(i64::from(package.term_days)),
            payment_amount: record.amount,
            owner_plan: None,
            partner_plan: None,
            activated_at: None,
            superseded_by: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        let txn = self.storage.begin_write()?;
        // A concurrent delivery may have committed since the first lookup
        if let Some(existing) = self.storage.get_registration_txn(&txn, &registration.id)? {
            drop(txn);
            return self.replay(existing, record);
        }
        let mut superseded = None;
        if let Some(old_id) = &record.supersedes {
            let mut old = self
                .storage
                .get_registration_txn(&txn, old_id)?
                .ok_or_else(|| {
                    AppError::with_message(
                        ErrorCode::RegistrationNotFound,
                        format!("Superseded registration not found: {old_id}"),
                    )
                })?;
            if old.owner_id != record.payer_id {
                return Err(AppError::with_message(
                    ErrorCode::OwnerRequired,
                    "Only the paying member of the replaced registration can upgrade it",
                ));
            }
            if let Some(successor) = &old.superseded_by {
                return Err(AppError::with_message(
                    ErrorCode::PaymentConflict,
                    format!("Registration {old_id} was already superseded by {successor}"),
                ));
            }

            old.end_date = record.start_date.min(old.end_date);
            old.superseded_by = Some(registration.id.clone());
            old.version += 1;
            old.updated_at = now;
            self.storage.put_registration_txn(&txn, &old)?;
            superseded = Some(old);
        }
        self.storage.put_registration_txn(&txn, &registration)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;

        tracing::info!(
            registration_id = %registration.id,
            package_id = %registration.package_id,
            owner_id = %registration.owner_id,
            partner_id = ?registration.partner_id,
            supersedes = ?record.supersedes,
            "Registration created from payment"
        );

        Ok(PaymentIngestResult {
            registration,
            created: true,
            superseded_end_date: superseded.as_ref().map(|old| old.end_date),
            superseded: superseded.map(|old| old.id),
        })
    }

    /// A record delivered twice: accept when it describes the same purchase
    fn replay(&self, existing: Registration, record: &PaymentCompletedRequest) -> AppResult<PaymentIngestResult> {
        if existing.package_id != record.package_id || existing.owner_id != record.payer_id {
            return Err(AppError::with_message(
                ErrorCode::PaymentConflict,
                format!(
                    "Registration {} already exists for another purchase",
                    existing.id
                ),
            ));
        }
        tracing::debug!(registration_id = %existing.id, "Payment record already ingested");

        let superseded_end_date = match &record.supersedes {
            Some(old_id) => self.storage.get_registration(old_id)?.map(|old| old.end_date),
            None => None,
        };
        Ok(PaymentIngestResult {
            registration: existing,
            created: false,
            superseded: record.supersedes.clone(),
            superseded_end_date,
        })
    }
}
