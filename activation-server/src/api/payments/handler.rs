//! Payment API Handlers

use axum::{Json, extract::State, http::StatusCode};
use shared::request::PaymentCompletedRequest;
use shared::response::PaymentIngestResult;

use crate::core::ServerState;
use crate::utils::AppResult;
use crate::utils::validation::validate_request;

/// POST /api/payments/completed - 导入支付完成记录
///
/// 首次导入返回 201，重复导入返回 200 和已有注册
pub async fn completed(
    State(state): State<ServerState>,
    Json(payload): Json<PaymentCompletedRequest>,
) -> AppResult<(StatusCode, Json<PaymentIngestResult>)> {
    validate_request(&payload)?;
    let result = state.payments.ingest(&payload).await?;

    let status = if result.created {
        tracing::info!(
            registration_id = %result.registration.id,
            package_id = %result.registration.package_id,
            superseded = ?result.superseded,
            "Payment ingested"
        );
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(result)))
}
