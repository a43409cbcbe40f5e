//! Session registry
//!
//! Read side of the bookable sessions plus the guarded seat operations.
//! Urgency labels are derived from the injected clock on every read and
//! never stored.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use shared::models::{Reservation, Session, SessionStatus};
use shared::response::SessionView;

use super::slots;
use crate::clock::SharedClock;
use crate::storage::{ActivationStorage, ClaimOutcome, SeatClaim, StorageResult};
use crate::utils::time;

#[derive(Debug, Clone)]
pub struct SessionRegistry {
    storage: ActivationStorage,
    clock: SharedClock,
    tz: Tz,
    starting_soon: Duration,
}

/// Urgency label of a session at `now` (business-local time)
pub fn status_at(session: &Session, now: NaiveDateTime, starting_soon: Duration) -> SessionStatus {
    let start = session.starts_at();
    if now < start - starting_soon {
        SessionStatus::Upcoming
    } else if now < start {
        SessionStatus::StartingSoon
    } else if now < session.ends_at() {
        SessionStatus::Ongoing
    } else {
        SessionStatus::Finished
    }
}

/// Start strictly after `now` and a free seat
pub fn is_registrable_at(session: &Session, now: NaiveDateTime) -> bool {
    session.starts_at() > now && session.has_free_seat()
}

impl SessionRegistry {
    pub fn new(storage: ActivationStorage, clock: SharedClock, tz: Tz, starting_soon: Duration) -> Self {
        Self {
            storage,
            clock,
            tz,
            starting_soon,
        }
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Current business-local time
    pub fn now_local(&self) -> NaiveDateTime {
        time::to_local(self.clock.now(), self.tz)
    }

    pub fn today(&self) -> NaiveDate {
        time::local_today(self.clock.now(), self.tz)
    }

    /// Today through the end of next week
    pub fn look_ahead(&self) -> (NaiveDate, NaiveDate) {
        let today = self.today();
        (today, time::end_of_next_week(today))
    }

    pub fn status_of(&self, session: &Session) -> SessionStatus {
        status_at(session, self.now_local(), self.starting_soon)
    }

    pub fn is_registrable(&self, session: &Session) -> bool {
        is_registrable_at(session, self.now_local())
    }

    /// Labelled view; None for a session outside the slot grid
    pub fn view_at(&self, session: Session, now: NaiveDateTime) -> Option<SessionView> {
        let slot_id = slots::slot_of(&session)?;
        Some(SessionView {
            slot_id,
            status: status_at(&session, now, self.starting_soon),
            seats_left: session.seats_left(),
            registrable: is_registrable_at(&session, now),
            session,
        })
    }

    pub fn view(&self, session: Session) -> Option<SessionView> {
        self.view_at(session, self.now_local())
    }

    pub fn get(&self, session_id: &str) -> StorageResult<Option<Session>> {
        self.storage.get_session(session_id)
    }

    pub fn sessions_at_branch(
        &self,
        branch_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StorageResult<Vec<Session>> {
        self.storage.sessions_at_branch(branch_id, from, to)
    }

    /// Sessions of one trainer at a branch during the look-ahead window that
    /// have not finished yet, labelled
    pub fn open_sessions(&self, branch_id: &str, trainer_id: &str) -> StorageResult<Vec<SessionView>> {
        let (from, to) = self.look_ahead();
        let now = self.now_local();
        Ok(self
            .storage
            .sessions_at_branch(branch_id, from, to)?
            .into_iter()
            .filter(|s| s.trainer_id == trainer_id)
            .filter_map(|s| self.view_at(s, now))
            .filter(|v| v.status != SessionStatus::Finished)
            .collect())
    }

    pub fn claim(&self, claim: &SeatClaim<'_>, now: NaiveDateTime) -> StorageResult<ClaimOutcome> {
        self.storage.claim_seat(claim, now)
    }

    pub fn release(&self, registration_id: &str, session_id: &str) -> StorageResult<bool> {
        self.storage.release_seat(registration_id, session_id)
    }

    pub fn reservations_for(&self, registration_id: &str) -> StorageResult<Vec<Reservation>> {
        self.storage.reservations_for(registration_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{NaiveTime, TimeZone, Utc};
    use std::sync::Arc;

    fn session(date: NaiveDate, start: u32, used: u32, max: u32) -> Session {
        Session {
            id: format!("s-{date}-{start}"),
            branch_id: "b-1".into(),
            trainer_id: "t-1".into(),
            date,
            start_time: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(start + 2, 0, 0).unwrap(),
            capacity_max: max,
            capacity_used: used,
            template_id: None,
            version: 0,
        }
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_status_boundaries() {
        let s = session(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(), 8, 0, 3);
        let soon = Duration::minutes(60);
        assert_eq!(status_at(&s, at(6, 59), soon), SessionStatus::Upcoming);
        assert_eq!(status_at(&s, at(7, 0), soon), SessionStatus::StartingSoon);
        assert_eq!(status_at(&s, at(8, 0), soon), SessionStatus::Ongoing);
        assert_eq!(status_at(&s, at(9, 59), soon), SessionStatus::Ongoing);
        assert_eq!(status_at(&s, at(10, 0), soon), SessionStatus::Finished);
    }

    #[test]
    fn test_registrable() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert!(is_registrable_at(&session(date, 8, 2, 3), at(7, 59)));
        // Start must be strictly in the future
        assert!(!is_registrable_at(&session(date, 8, 0, 3), at(8, 0)));
        assert!(!is_registrable_at(&session(date, 8, 3, 3), at(7, 0)));
    }

    #[test]
    fn test_open_sessions_use_clock_and_timezone() {
        let storage = ActivationStorage::open_in_memory().unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        for s in [
            session(monday, 8, 0, 3),
            session(monday, 17, 0, 3),
            session(NaiveDate::from_ymd_opt(2026, 3, 20).unwrap(), 8, 0, 3),
        ] {
            storage.upsert_session(&s).unwrap();
        }

        // 03:30 UTC = 10:30 in Asia/Ho_Chi_Minh: the 08:00 session is over
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 2, 3, 30, 0).unwrap()));
        let registry = SessionRegistry::new(
            storage,
            clock.clone(),
            "Asia/Ho_Chi_Minh".parse().unwrap(),
            Duration::minutes(60),
        );

        assert_eq!(registry.look_ahead().1, NaiveDate::from_ymd_opt(2026, 3, 15).unwrap());
        let open = registry.open_sessions("b-1", "t-1").unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].slot_id, 6);
        assert_eq!(open[0].status, SessionStatus::Upcoming);
        assert!(open[0].registrable);

        // 16:30 local
        clock.advance(Duration::hours(6));
        let open = registry.open_sessions("b-1", "t-1").unwrap();
        assert_eq!(open[0].status, SessionStatus::StartingSoon);
    }
}
