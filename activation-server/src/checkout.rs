//! Checkout-time upgrade quotes
//!
//! Prices an upgrade of an active registration to a more expensive
//! package. Downgrades are refused before any computation.

use std::sync::Arc;

use chrono_tz::Tz;
use shared::request::UpgradeQuoteRequest;
use shared::response::UpgradeQuote;
use shared::workflow::Role;

use crate::catalog::Catalog;
use crate::clock::SharedClock;
use crate::proration::{ProrationInput, compute_upgrade};
use crate::storage::ActivationStorage;
use crate::utils::{AppError, AppResult, ErrorCode, time};

#[derive(Debug, Clone)]
pub struct CheckoutService {
    storage: ActivationStorage,
    catalog: Arc<dyn Catalog>,
    clock: SharedClock,
    tz: Tz,
}

impl CheckoutService {
    pub fn new(storage: ActivationStorage, catalog: Arc<dyn Catalog>, clock: SharedClock, tz: Tz) -> Self {
        Self {
            storage,
            catalog,
            clock,
            tz,
        }
    }

    pub async fn upgrade_quote(&self, actor_id: &str, request: &UpgradeQuoteRequest) -> AppResult<UpgradeQuote> {
        let registration = self
            .storage
            .get_registration(&request.registration_id)?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::RegistrationNotFound,
                    format!("Registration not found: {}", request.registration_id),
                )
            })?;

        match registration.role_of(actor_id) {
            Some(Role::Owner) => {}
            Some(Role::Partner) => {
                return Err(AppError::with_message(
                    ErrorCode::OwnerRequired,
                    "Only the paying member can upgrade the package",
                ));
            }
            None => return Err(AppError::new(ErrorCode::NotParticipant)),
        }
        if registration.is_superseded() {
            return Err(AppError::new(ErrorCode::RegistrationSuperseded));
        }

        let current = self
            .catalog
            .package(&registration.package_id)
            .await?
            .ok_or_else(|| package_not_found(&registration.package_id))?;
        let target = self
            .catalog
            .package(&request.new_package_id)
            .await?
            .ok_or_else(|| package_not_found(&request.new_package_id))?;

        if target.price <= current.price {
            tracing::info!(
                registration_id = %registration.id,
                current_package = %current.id,
                new_package = %target.id,
                "Downgrade refused at checkout"
            );
            return Err(AppError::with_message(
                ErrorCode::DowngradeNotAllowed,
                format!(
                    "Package {} is not more expensive than the current package {}",
                    target.id, current.id
                ),
            ));
        }

        let input = ProrationInput {
            start_date: Some(registration.start_date),
            end_date: Some(registration.end_date),
            term_days: current.term_days,
            price_paid: registration.payment_amount,
            new_package_price: target.price,
        };
        let proration = compute_upgrade(&input, time::to_local(self.clock.now(), self.tz));

        Ok(UpgradeQuote {
            registration_id: registration.id,
            current_package_id: current.id,
            new_package_id: target.id,
            new_package_price: target.price,
            proration,
        })
    }
}

fn package_not_found(id: &str) -> AppError {
    AppError::with_message(ErrorCode::PackageNotFound, format!("Package not found: {id}"))
}
