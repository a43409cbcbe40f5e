//! Request bodies of the activation API

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::PreferredWindow;

/// Weekly session count bounds
pub const MIN_SESSIONS_PER_WEEK: u8 = 2;
pub const MAX_SESSIONS_PER_WEEK: u8 = 6;

/// PUT /api/registration/{id}/branch
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmBranchRequest {
    #[validate(length(min = 1, max = 64))]
    pub branch_id: String,
}

/// POST /api/select-trainer/{id}
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SelectTrainerRequest {
    #[validate(length(min = 1, max = 64))]
    pub trainer_id: String,
    #[validate(nested)]
    pub preferred_windows: Vec<PreferredWindow>,
    #[validate(range(min = 2, max = 6))]
    pub sessions_per_week: u8,
}

/// POST /api/match-trainers/{id}
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MatchTrainersRequest {
    #[validate(nested)]
    pub preferred_windows: Vec<PreferredWindow>,
    #[validate(range(min = 2, max = 6))]
    pub sessions_per_week: u8,
}

/// One session of a schedule selection, echoed back with the details the
/// client saw so stale selections can be detected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SessionSelection {
    #[validate(length(min = 1, max = 64))]
    pub session_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[validate(length(min = 1, max = 64))]
    pub trainer_id: String,
}

/// POST /api/generate-schedule/{id}
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateScheduleRequest {
    #[validate(nested)]
    pub sessions: Vec<SessionSelection>,
}

/// POST /api/payments/completed
///
/// Payment completion record reported by the payment platform.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCompletedRequest {
    #[validate(length(min = 1, max = 64))]
    pub registration_id: String,
    #[validate(length(min = 1, max = 64))]
    pub package_id: String,
    #[validate(length(min = 1, max = 64))]
    pub payer_id: String,
    /// Every participant, payer included or not
    #[serde(default)]
    pub participant_ids: Vec<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub start_date: NaiveDate,
    /// Registration replaced by this purchase (upgrade path)
    #[serde(default)]
    pub supersedes: Option<String>,
}

/// POST /api/checkout/upgrade-quote
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeQuoteRequest {
    #[validate(length(min = 1, max = 64))]
    pub registration_id: String,
    #[validate(length(min = 1, max = 64))]
    pub new_package_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_trainer_validation() {
        let json = r#"{
            "trainerId": "t-1",
            "preferredWindows": [{"slotId": 2, "weekday": "Mon"}],
            "sessionsPerWeek": 2
        }"#;
        let req: SelectTrainerRequest = serde_json::from_str(json).unwrap();
        assert!(req.validate().is_ok());

        let mut too_many = req.clone();
        too_many.sessions_per_week = 7;
        assert!(too_many.validate().is_err());

        let mut bad_slot = req;
        bad_slot.preferred_windows[0].slot_id = 0;
        assert!(bad_slot.validate().is_err());
    }

    #[test]
    fn test_generate_schedule_deserialize() {
        let json = r#"{"sessions": [{
            "sessionId": "s-1",
            "date": "2026-03-02",
            "startTime": "08:00:00",
            "endTime": "10:00:00",
            "trainerId": "t-1"
        }]}"#;
        let req: GenerateScheduleRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.sessions.len(), 1);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_payment_amount_as_number() {
        let json = r#"{
            "registrationId": "r-1",
            "packageId": "p-1",
            "payerId": "u-1",
            "amount": 3000000,
            "startDate": "2026-03-01"
        }"#;
        let req: PaymentCompletedRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.amount, Decimal::new(3_000_000, 0));
        assert!(req.participant_ids.is_empty());
        assert!(req.supersedes.is_none());
    }
}
