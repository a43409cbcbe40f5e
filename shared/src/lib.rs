//! Shared types for the gym activation service
//!
//! Domain models, workflow state, request/response payloads and the unified
//! error system used by the server and its API clients.

pub mod error;
pub mod models;
pub mod request;
pub mod response;
pub mod types;
pub mod workflow;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use workflow::{Role, Step, WorkflowEvent, WorkflowState};
