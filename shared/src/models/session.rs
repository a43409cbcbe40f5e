//! Session Model
//!
//! A bookable training session: one trainer, one branch, a time window that
//! lies inside exactly one slot of the daily grid, and a seat capacity.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub branch_id: String,
    pub trainer_id: String,
    /// Local date in the business timezone
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity_max: u32,
    #[serde(default)]
    pub capacity_used: u32,
    /// Weekly template the external scheduler generated this session from
    #[serde(default)]
    pub template_id: Option<String>,
    /// Bumped on every seat claim or release
    #[serde(default)]
    pub version: u64,
}

impl Session {
    pub fn seats_left(&self) -> u32 {
        self.capacity_max.saturating_sub(self.capacity_used)
    }

    pub fn has_free_seat(&self) -> bool {
        self.capacity_used < self.capacity_max
    }

    /// Local start instant (business timezone, naive)
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    /// Local end instant (business timezone, naive)
    pub fn ends_at(&self) -> NaiveDateTime {
        self.date.and_time(self.end_time)
    }
}

/// Read-time urgency label, never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Upcoming,
    StartingSoon,
    Ongoing,
    Finished,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(used: u32, max: u32) -> Session {
        Session {
            id: "s-1".into(),
            branch_id: "b-1".into(),
            trainer_id: "t-1".into(),
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            capacity_max: max,
            capacity_used: used,
            template_id: None,
            version: 0,
        }
    }

    #[test]
    fn test_seats() {
        assert_eq!(session(1, 3).seats_left(), 2);
        assert!(session(2, 3).has_free_seat());
        assert!(!session(3, 3).has_free_seat());
        assert_eq!(session(5, 3).seats_left(), 0);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{
            "id": "s-9",
            "branchId": "b-1",
            "trainerId": "t-1",
            "date": "2026-03-02",
            "startTime": "08:00:00",
            "endTime": "10:00:00",
            "capacityMax": 4
        }"#;
        let s: Session = serde_json::from_str(json).unwrap();
        assert_eq!(s.capacity_used, 0);
        assert_eq!(s.version, 0);
        assert_eq!(s.starts_at().to_string(), "2026-03-02 08:00:00");
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::StartingSoon).unwrap(),
            "\"starting_soon\""
        );
    }
}
