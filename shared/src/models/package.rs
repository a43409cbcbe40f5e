//! Package Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Membership package as sold by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Membership term in days
    pub term_days: u32,
    /// 1 for personal packages, 2 for shared ones
    #[serde(default = "default_max_participants")]
    pub max_participants: u32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_max_participants() -> u32 {
    1
}

fn default_active() -> bool {
    true
}

impl Package {
    pub fn is_shared(&self) -> bool {
        self.max_participants >= 2
    }
}
