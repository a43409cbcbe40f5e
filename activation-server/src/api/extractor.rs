//! Actor Extractor
//!
//! Reads the caller identity forwarded by the gateway

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::AppError;
use crate::core::ServerState;
use crate::security_log;
use crate::utils::validation::{MAX_ID_LEN, validate_required_text};

/// Header carrying the authenticated user id
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Calling user
///
/// Authentication happens upstream; this service only authorizes by
/// comparing the id against the registration's participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub String);

impl Actor {
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl FromRequestParts<ServerState> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Check if already extracted
        if let Some(actor) = parts.extensions.get::<Actor>() {
            return Ok(actor.clone());
        }

        let header = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim);

        let actor_id = match header {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                security_log!("WARN", "auth_missing", uri = format!("{:?}", parts.uri));
                return Err(AppError::not_authenticated());
            }
        };
        validate_required_text(&actor_id, ACTOR_HEADER, MAX_ID_LEN)?;

        let actor = Actor(actor_id);
        parts.extensions.insert(actor.clone());
        Ok(actor)
    }
}
