//! Checkout API Handlers

use axum::{Json, extract::State};
use shared::request::UpgradeQuoteRequest;
use shared::response::UpgradeQuote;

use crate::api::Actor;
use crate::core::ServerState;
use crate::utils::AppResult;
use crate::utils::validation::validate_request;

/// POST /api/checkout/upgrade-quote - 计算升级差价
pub async fn upgrade_quote(
    State(state): State<ServerState>,
    actor: Actor,
    Json(payload): Json<UpgradeQuoteRequest>,
) -> AppResult<Json<UpgradeQuote>> {
    validate_request(&payload)?;
    let quote = state.checkout.upgrade_quote(actor.id(), &payload).await?;
    Ok(Json(quote))
}
