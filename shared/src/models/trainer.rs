//! Trainer Model

use serde::{Deserialize, Serialize};

/// Personal trainer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trainer {
    pub id: String,
    pub name: String,
    /// Branches the trainer operates at
    #[serde(default)]
    pub branch_ids: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Trainer {
    /// Whether the trainer is active and operates at the branch
    pub fn works_at(&self, branch_id: &str) -> bool {
        self.active && self.branch_ids.iter().any(|b| b == branch_id)
    }
}
