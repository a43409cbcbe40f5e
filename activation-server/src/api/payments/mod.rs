//! Payment API 模块
//!
//! 支付平台回调，按 registrationId 幂等

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/payments", routes())
}

fn routes() -> Router<ServerState> {
    Router::new().route("/completed", post(handler::completed))
}
