//! Reservation Model
//!
//! Link between a registration and a session seat. Written in the same
//! storage transaction as the seat claim.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflow::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub registration_id: String,
    pub session_id: String,
    pub role: Role,
    pub actor_id: String,
    pub branch_id: String,
    pub trainer_id: String,
    pub date: NaiveDate,
    pub slot_id: u8,
    pub reserved_at: DateTime<Utc>,
}

impl Reservation {
    /// (date, slot) pair used for the one-session-per-slot-per-day rule
    pub fn slot_key(&self) -> (NaiveDate, u8) {
        (self.date, self.slot_id)
    }
}
