//! Schedule builder
//!
//! Turns a selection into committed reservations. Every check runs before
//! the first seat is claimed; claims then happen one by one and a failure
//! releases the seats already claimed by the batch, so a commit is
//! all-or-nothing.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use shared::models::{Reservation, Session};
use shared::request::SessionSelection;
use shared::workflow::Role;

use super::registry::{SessionRegistry, is_registrable_at};
use super::{ConflictReason, SchedulingError, SessionConflict, slots};
use crate::storage::{ClaimOutcome, SeatClaim};

/// Who commits, and what the commit must match
#[derive(Debug, Clone, Copy)]
pub struct CommitContext<'a> {
    pub registration_id: &'a str,
    pub role: Role,
    pub actor_id: &'a str,
    pub branch_id: &'a str,
    pub trainer_id: &'a str,
    pub sessions_per_week: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub reservations: Vec<Reservation>,
    /// The same set was already committed by this actor; nothing changed
    pub already_committed: bool,
}

#[derive(Debug, Clone)]
pub struct ScheduleBuilder {
    registry: SessionRegistry,
}

impl ScheduleBuilder {
    pub fn new(registry: SessionRegistry) -> Self {
        Self { registry }
    }

    /// Reservations of this actor when they cover exactly `selection`
    pub fn committed_selection(
        &self,
        registration_id: &str,
        role: Role,
        selection: &[SessionSelection],
    ) -> Result<Option<Vec<Reservation>>, SchedulingError> {
        if selection.is_empty() {
            return Ok(None);
        }
        let mine: Vec<Reservation> = self
            .registry
            .reservations_for(registration_id)?
            .into_iter()
            .filter(|r| r.role == role)
            .collect();

        let held: HashSet<&str> = mine.iter().map(|r| r.session_id.as_str()).collect();
        let wanted: HashSet<&str> = selection.iter().map(|s| s.session_id.as_str()).collect();
        Ok((held == wanted && mine.len() == selection.len()).then_some(mine))
    }

    /// Validate and commit a weekly selection for one actor
    pub fn commit(
        &self,
        ctx: CommitContext<'_>,
        selection: &[SessionSelection],
    ) -> Result<CommitOutcome, SchedulingError> {
        if selection.is_empty() {
            return Err(SchedulingError::EmptySelection);
        }

        if let Some(reservations) = self.committed_selection(ctx.registration_id, ctx.role, selection)? {
            tracing::info!(
                registration_id = %ctx.registration_id,
                role = %ctx.role,
                sessions = reservations.len(),
                "Schedule already committed, returning existing reservations"
            );
            return Ok(CommitOutcome {
                reservations,
                already_committed: true,
            });
        }

        if selection.len() != usize::from(ctx.sessions_per_week) {
            return Err(SchedulingError::CountMismatch {
                expected: ctx.sessions_per_week,
                got: selection.len(),
            });
        }

        let mut seen = HashSet::new();
        for item in selection {
            if !seen.insert(item.session_id.as_str()) {
                return Err(SchedulingError::DuplicateSession(item.session_id.clone()));
            }
        }

        let mut sessions = Vec::with_capacity(selection.len());
        for item in selection {
            let session = self
                .registry
                .get(&item.session_id)?
                .ok_or_else(|| SchedulingError::SessionNotFound(item.session_id.clone()))?;
            sessions.push(session);
        }

        let now = self.registry.now_local();
        let slotted = validate_selection(&ctx, selection, &sessions)?;
        let existing = self.registry.reservations_for(ctx.registration_id)?;
        check_overlap(&slotted, &existing)?;
        check_registrable(&sessions, now)?;

        let reserved_at = self.registry.clock().now();
        let mut claimed: Vec<Reservation> = Vec::with_capacity(slotted.len());
        for (session, slot_id) in &slotted {
            let claim = SeatClaim {
                registration_id: ctx.registration_id,
                session_id: &session.id,
                role: ctx.role,
                actor_id: ctx.actor_id,
                slot_id: *slot_id,
                reserved_at,
            };
            let rejected = match self.registry.claim(&claim, now) {
                Ok(ClaimOutcome::Claimed(reservation)) => {
                    claimed.push(reservation);
                    continue;
                }
                Ok(ClaimOutcome::AlreadyHeld(_)) => Ok(ConflictReason::AlreadyReserved),
                Ok(ClaimOutcome::Full) => Ok(ConflictReason::Full),
                Ok(ClaimOutcome::Started) => Ok(ConflictReason::Started),
                Err(e) => Err(e),
            };

            self.rollback(ctx.registration_id, &claimed);
            let failure = match rejected {
                Ok(ConflictReason::AlreadyReserved) => {
                    SchedulingError::conflict(&session.id, ConflictReason::AlreadyReserved)
                }
                Ok(reason) => self.unavailable(&slotted, session, reason),
                Err(e) => SchedulingError::Storage(e),
            };
            tracing::warn!(
                registration_id = %ctx.registration_id,
                session_id = %session.id,
                rolled_back = claimed.len(),
                error = %failure,
                "Schedule commit failed, claimed seats released"
            );
            return Err(failure);
        }

        tracing::info!(
            registration_id = %ctx.registration_id,
            role = %ctx.role,
            actor_id = %ctx.actor_id,
            sessions = claimed.len(),
            "Schedule committed"
        );
        Ok(CommitOutcome {
            reservations: claimed,
            already_committed: false,
        })
    }

    /// Seats held under the registration at `branch_id`
    pub fn held_at_branch(
        &self,
        registration_id: &str,
        branch_id: &str,
    ) -> Result<Vec<Reservation>, SchedulingError> {
        Ok(self
            .registry
            .reservations_for(registration_id)?
            .into_iter()
            .filter(|reservation| reservation.branch_id == branch_id)
            .collect())
    }

    /// Failing session first, then other selected sessions that are no
    /// longer registrable. Called after rollback.
    fn unavailable(
        &self,
        slotted: &[(Session, u8)],
        failed: &Session,
        reason: ConflictReason,
    ) -> SchedulingError {
        let mut conflicts = vec![SessionConflict::new(&failed.id, reason)];
        let now = self.registry.now_local();
        for (session, _) in slotted {
            if session.id == failed.id {
                continue;
            }
            if let Ok(Some(current)) = self.registry.get(&session.id) {
                if !is_registrable_at(&current, now) {
                    let reason = if current.has_free_seat() {
                        ConflictReason::Started
                    } else {
                        ConflictReason::Full
                    };
                    conflicts.push(SessionConflict::new(&session.id, reason));
                }
            }
        }
        SchedulingError::Conflict(conflicts)
    }

    fn rollback(&self, registration_id: &str, claimed: &[Reservation]) {
        for reservation in claimed {
            if let Err(e) = self.registry.release(registration_id, &reservation.session_id) {
                tracing::error!(
                    registration_id = %registration_id,
                    session_id = %reservation.session_id,
                    error = %e,
                    "Failed to release seat during rollback"
                );
            }
        }
    }
}

/// Stale-state, slot and eligibility checks; returns each session with its slot
fn validate_selection(
    ctx: &CommitContext<'_>,
    selection: &[SessionSelection],
    sessions: &[Session],
) -> Result<Vec<(Session, u8)>, SchedulingError> {
    let stale: Vec<SessionConflict> = selection
        .iter()
        .zip(sessions)
        .filter(|(item, session)| {
            item.date != session.date
                || item.start_time != session.start_time
                || item.end_time != session.end_time
                || item.trainer_id != session.trainer_id
        })
        .map(|(item, _)| SessionConflict::new(&item.session_id, ConflictReason::Stale))
        .collect();
    if !stale.is_empty() {
        return Err(SchedulingError::Conflict(stale));
    }

    let mut slotted = Vec::with_capacity(sessions.len());
    for session in sessions {
        let slot_id = slots::slot_of(session)
            .ok_or_else(|| SchedulingError::conflict(&session.id, ConflictReason::OutsideSlot))?;
        if session.branch_id != ctx.branch_id {
            return Err(SchedulingError::NotEligible {
                session_id: session.id.clone(),
                reason: format!("session is not at branch {}", ctx.branch_id),
            });
        }
        if session.trainer_id != ctx.trainer_id {
            return Err(SchedulingError::NotEligible {
                session_id: session.id.clone(),
                reason: format!("session is not with trainer {}", ctx.trainer_id),
            });
        }
        slotted.push((session.clone(), slot_id));
    }
    Ok(slotted)
}

/// One session per slot per day per registration, within the batch and
/// against what is already committed
fn check_overlap(slotted: &[(Session, u8)], existing: &[Reservation]) -> Result<(), SchedulingError> {
    let mut taken: HashMap<(NaiveDate, u8), &str> = existing
        .iter()
        .map(|r| (r.slot_key(), r.session_id.as_str()))
        .collect();

    let mut conflicts = Vec::new();
    for (session, slot_id) in slotted {
        let key = (session.date, *slot_id);
        if let Some(holder) = taken.get(&key) {
            let reason = if *holder == session.id {
                ConflictReason::AlreadyReserved
            } else {
                ConflictReason::Overlap
            };
            conflicts.push(SessionConflict::new(&session.id, reason));
        } else {
            taken.insert(key, &session.id);
        }
    }

    if conflicts.is_empty() {
        Ok(())
    } else {
        Err(SchedulingError::Conflict(conflicts))
    }
}

fn check_registrable(sessions: &[Session], now: NaiveDateTime) -> Result<(), SchedulingError> {
    let conflicts: Vec<SessionConflict> = sessions
        .iter()
        .filter(|s| !is_registrable_at(s, now))
        .map(|s| {
            let reason = if s.starts_at() <= now {
                ConflictReason::Started
            } else {
                ConflictReason::Full
            };
            SessionConflict::new(&s.id, reason)
        })
        .collect();
    if conflicts.is_empty() {
        Ok(())
    } else {
        Err(SchedulingError::Conflict(conflicts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::ActivationStorage;
    use chrono::{Duration, NaiveTime, TimeZone, Utc};
    use std::sync::Arc;

    const REG: &str = "r-1";

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn session(id: &str, trainer: &str, date: NaiveDate, start: u32, capacity: u32) -> Session {
        Session {
            id: id.into(),
            branch_id: "b-1".into(),
            trainer_id: trainer.into(),
            date,
            start_time: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(start + 2, 0, 0).unwrap(),
            capacity_max: capacity,
            capacity_used: 0,
            template_id: None,
            version: 0,
        }
    }

    fn pick(s: &Session) -> SessionSelection {
        SessionSelection {
            session_id: s.id.clone(),
            date: s.date,
            start_time: s.start_time,
            end_time: s.end_time,
            trainer_id: s.trainer_id.clone(),
        }
    }

    fn ctx<'a>(role: Role, actor_id: &'a str, trainer_id: &'a str) -> CommitContext<'a> {
        CommitContext {
            registration_id: REG,
            role,
            actor_id,
            branch_id: "b-1",
            trainer_id,
            sessions_per_week: 2,
        }
    }

    struct Fixture {
        storage: ActivationStorage,
        builder: ScheduleBuilder,
        clock: Arc<ManualClock>,
        mon: Session,
        wed: Session,
        t2_mon: Session,
        t2_fri: Session,
    }

    /// Sunday 2026-03-01 12:00 local
    fn fixture() -> Fixture {
        let storage = ActivationStorage::open_in_memory().unwrap();
        let mon = session("s-mon", "t-1", monday(), 8, 3);
        let wed = session("s-wed", "t-1", monday() + Duration::days(2), 8, 3);
        let t2_mon = session("s-t2-mon", "t-2", monday(), 8, 3);
        let t2_fri = session("s-t2-fri", "t-2", monday() + Duration::days(4), 17, 1);
        for s in [&mon, &wed, &t2_mon, &t2_fri] {
            storage.upsert_session(s).unwrap();
        }
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 5, 0, 0).unwrap()));
        let registry = SessionRegistry::new(
            storage.clone(),
            clock.clone(),
            "Asia/Ho_Chi_Minh".parse().unwrap(),
            Duration::minutes(60),
        );
        Fixture {
            storage,
            builder: ScheduleBuilder::new(registry),
            clock,
            mon,
            wed,
            t2_mon,
            t2_fri,
        }
    }

    fn used(storage: &ActivationStorage, id: &str) -> u32 {
        storage.get_session(id).unwrap().unwrap().capacity_used
    }

    fn conflict_ids(err: SchedulingError) -> Vec<(String, ConflictReason)> {
        match err {
            SchedulingError::Conflict(conflicts) => conflicts
                .into_iter()
                .map(|c| (c.session_id, c.reason))
                .collect(),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_commit_claims_every_seat() {
        let f = fixture();
        let outcome = f
            .builder
            .commit(ctx(Role::Owner, "u-owner", "t-1"), &[pick(&f.mon), pick(&f.wed)])
            .unwrap();

        assert!(!outcome.already_committed);
        assert_eq!(outcome.reservations.len(), 2);
        assert!(outcome.reservations.iter().all(|r| r.slot_id == 2 && r.role == Role::Owner));
        assert_eq!(used(&f.storage, "s-mon"), 1);
        assert_eq!(used(&f.storage, "s-wed"), 1);
    }

    #[test]
    fn test_resubmit_is_noop() {
        let f = fixture();
        let selection = [pick(&f.mon), pick(&f.wed)];
        f.builder
            .commit(ctx(Role::Owner, "u-owner", "t-1"), &selection)
            .unwrap();

        // Order does not matter
        let again = f
            .builder
            .commit(ctx(Role::Owner, "u-owner", "t-1"), &[pick(&f.wed), pick(&f.mon)])
            .unwrap();
        assert!(again.already_committed);
        assert_eq!(again.reservations.len(), 2);
        assert_eq!(used(&f.storage, "s-mon"), 1);
    }

    #[test]
    fn test_overlap_with_other_actor_rejected() {
        let f = fixture();
        f.builder
            .commit(ctx(Role::Owner, "u-owner", "t-1"), &[pick(&f.mon), pick(&f.wed)])
            .unwrap();

        let err = f
            .builder
            .commit(
                ctx(Role::Partner, "u-partner", "t-2"),
                &[pick(&f.t2_mon), pick(&f.t2_fri)],
            )
            .unwrap_err();
        assert_eq!(
            conflict_ids(err),
            vec![("s-t2-mon".to_string(), ConflictReason::Overlap)]
        );
        // Nothing claimed for the partner
        assert_eq!(used(&f.storage, "s-t2-mon"), 0);
        assert_eq!(used(&f.storage, "s-t2-fri"), 0);
    }

    #[test]
    fn test_batch_overlap_rejected() {
        let f = fixture();
        let mut other = session("s-mon-b", "t-1", monday(), 9, 3);
        other.end_time = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        f.storage.upsert_session(&other).unwrap();

        let err = f
            .builder
            .commit(ctx(Role::Owner, "u-owner", "t-1"), &[pick(&f.mon), pick(&other)])
            .unwrap_err();
        assert_eq!(
            conflict_ids(err),
            vec![("s-mon-b".to_string(), ConflictReason::Overlap)]
        );
    }

    #[test]
    fn test_selection_shape_checks() {
        let f = fixture();
        let owner = ctx(Role::Owner, "u-owner", "t-1");

        assert!(matches!(
            f.builder.commit(owner, &[]),
            Err(SchedulingError::EmptySelection)
        ));
        assert!(matches!(
            f.builder.commit(owner, &[pick(&f.mon)]),
            Err(SchedulingError::CountMismatch { expected: 2, got: 1 })
        ));
        assert!(matches!(
            f.builder.commit(owner, &[pick(&f.mon), pick(&f.mon)]),
            Err(SchedulingError::DuplicateSession(_))
        ));

        let mut ghost = pick(&f.mon);
        ghost.session_id = "s-ghost".into();
        assert!(matches!(
            f.builder.commit(owner, &[pick(&f.mon), ghost]),
            Err(SchedulingError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_stale_and_ineligible_selection() {
        let f = fixture();
        let owner = ctx(Role::Owner, "u-owner", "t-1");

        let mut moved = pick(&f.wed);
        moved.start_time = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let err = f.builder.commit(owner, &[pick(&f.mon), moved]).unwrap_err();
        assert_eq!(
            conflict_ids(err),
            vec![("s-wed".to_string(), ConflictReason::Stale)]
        );

        // Session with another trainer
        let err = f
            .builder
            .commit(owner, &[pick(&f.mon), pick(&f.t2_fri)])
            .unwrap_err();
        assert!(matches!(err, SchedulingError::NotEligible { .. }));
    }

    #[test]
    fn test_unregistrable_sessions_reported() {
        let f = fixture();
        // Fill the single Friday seat from another registration
        let claim = SeatClaim {
            registration_id: "r-other",
            session_id: "s-t2-fri",
            role: Role::Owner,
            actor_id: "u-x",
            slot_id: 6,
            reserved_at: Utc::now(),
        };
        f.storage
            .claim_seat(&claim, monday().and_hms_opt(0, 0, 0).unwrap())
            .unwrap();

        let err = f
            .builder
            .commit(
                ctx(Role::Partner, "u-partner", "t-2"),
                &[pick(&f.t2_mon), pick(&f.t2_fri)],
            )
            .unwrap_err();
        assert_eq!(
            conflict_ids(err),
            vec![("s-t2-fri".to_string(), ConflictReason::Full)]
        );

        // Monday 08:00 local has passed
        f.clock.set(Utc.with_ymd_and_hms(2026, 3, 2, 1, 30, 0).unwrap());
        let err = f
            .builder
            .commit(ctx(Role::Owner, "u-owner", "t-1"), &[pick(&f.mon), pick(&f.wed)])
            .unwrap_err();
        assert_eq!(
            conflict_ids(err),
            vec![("s-mon".to_string(), ConflictReason::Started)]
        );
        assert_eq!(used(&f.storage, "s-wed"), 0);
    }

    #[test]
    fn test_held_at_branch() {
        let f = fixture();
        f.builder
            .commit(ctx(Role::Owner, "u-owner", "t-1"), &[pick(&f.mon), pick(&f.wed)])
            .unwrap();

        let held = f.builder.held_at_branch(REG, "b-1").unwrap();
        assert_eq!(held.len(), 2);
        assert!(held.iter().all(|r| r.role == Role::Owner));
        // Listing does not give seats back
        assert_eq!(used(&f.storage, "s-mon"), 1);
        assert!(f.builder.held_at_branch(REG, "b-2").unwrap().is_empty());
    }
}
