//! Activation workflow
//!
//! Role-aware state machine over [`shared::workflow::WorkflowState`]:
//! transition table in [`transitions`], orchestration in [`WorkflowService`].

mod error;
mod service;
pub mod transitions;

pub use error::{WorkflowError, WorkflowResult};
pub use service::{ActivationSignal, WorkflowService};
