//! redb-based storage layer for registrations, sessions and seat reservations
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `registrations` | `registration_id` | `Registration` | Workflow state per purchase |
//! | `sessions` | `session_id` | `Session` | Bookable sessions and occupancy |
//! | `reservations` | `(registration_id, session_id)` | `Reservation` | Claimed seats |
//! | `branches` | `branch_id` | `Branch` | Catalog mirror |
//! | `trainers` | `trainer_id` | `Trainer` | Catalog mirror |
//! | `packages` | `package_id` | `Package` | Catalog mirror |
//!
//! Values are JSON-serialized. A seat claim updates `sessions` and
//! `reservations` in one write transaction; redb serializes writers, so the
//! capacity guard and the increment cannot interleave.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::models::{Branch, Package, Registration, Reservation, Session, Trainer};
use shared::workflow::Role;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Table for registrations: key = registration_id, value = JSON-serialized Registration
const REGISTRATIONS_TABLE: JsonTable = TableDefinition::new("registrations");

/// Table for sessions: key = session_id, value = JSON-serialized Session
const SESSIONS_TABLE: JsonTable = TableDefinition::new("sessions");

/// Table for reservations: key = (registration_id, session_id), value = JSON-serialized Reservation
const RESERVATIONS_TABLE: TableDefinition<(&str, &str), &[u8]> =
    TableDefinition::new("reservations");

const BRANCHES_TABLE: JsonTable = TableDefinition::new("branches");
const TRAINERS_TABLE: JsonTable = TableDefinition::new("trainers");
const PACKAGES_TABLE: JsonTable = TableDefinition::new("packages");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Registration not found: {0}")]
    RegistrationNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Registration {id} was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict { id: String, expected: u64, found: u64 },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Seat claim request for one session
#[derive(Debug, Clone)]
pub struct SeatClaim<'a> {
    pub registration_id: &'a str,
    pub session_id: &'a str,
    pub role: Role,
    pub actor_id: &'a str,
    pub slot_id: u8,
    pub reserved_at: DateTime<Utc>,
}

/// Outcome of a guarded seat claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Seat taken, capacity incremented
    Claimed(Reservation),
    /// The registration already holds this seat; nothing changed
    AlreadyHeld(Reservation),
    /// No seat left
    Full,
    /// Session start is not after the claim instant
    Started,
}

/// Activation storage backed by redb
#[derive(Clone)]
pub struct ActivationStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for ActivationStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivationStorage").finish_non_exhaustive()
    }
}

impl ActivationStorage {
    /// Open or create the database at the given path
    ///
    /// redb commits are durable once `commit()` returns (copy-on-write with
    /// atomic pointer swap), so a crash never leaves a half-claimed seat.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init_tables(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init_tables(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    fn init_tables(db: &Database) -> StorageResult<()> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(REGISTRATIONS_TABLE)?;
            let _ = write_txn.open_table(SESSIONS_TABLE)?;
            let _ = write_txn.open_table(RESERVATIONS_TABLE)?;
            let _ = write_txn.open_table(BRANCHES_TABLE)?;
            let _ = write_txn.open_table(TRAINERS_TABLE)?;
            let _ = write_txn.open_table(PACKAGES_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Generic JSON helpers ==========

    fn get_json<T: DeserializeOwned>(&self, table: JsonTable, key: &str) -> StorageResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        match table.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn get_json_txn<T: DeserializeOwned>(
        txn: &WriteTransaction,
        table: JsonTable,
        key: &str,
    ) -> StorageResult<Option<T>> {
        let table = txn.open_table(table)?;
        match table.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn put_json_txn<T: Serialize>(
        txn: &WriteTransaction,
        table: JsonTable,
        key: &str,
        value: &T,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(table)?;
        let bytes = serde_json::to_vec(value)?;
        table.insert(key, bytes.as_slice())?;
        Ok(())
    }

    fn put_json<T: Serialize>(&self, table: JsonTable, key: &str, value: &T) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        Self::put_json_txn(&txn, table, key, value)?;
        txn.commit()?;
        Ok(())
    }

    fn list_json<T: DeserializeOwned>(&self, table: JsonTable) -> StorageResult<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        let mut items = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            items.push(serde_json::from_slice(value.value())?);
        }
        Ok(items)
    }

    // ========== Registration Operations ==========

    pub fn get_registration(&self, id: &str) -> StorageResult<Option<Registration>> {
        self.get_json(REGISTRATIONS_TABLE, id)
    }

    /// Get a registration (within transaction)
    pub fn get_registration_txn(
        &self,
        txn: &WriteTransaction,
        id: &str,
    ) -> StorageResult<Option<Registration>> {
        Self::get_json_txn(txn, REGISTRATIONS_TABLE, id)
    }

    /// Store a registration as-is (within transaction, no version check)
    pub fn put_registration_txn(
        &self,
        txn: &WriteTransaction,
        registration: &Registration,
    ) -> StorageResult<()> {
        Self::put_json_txn(txn, REGISTRATIONS_TABLE, &registration.id, registration)
    }

    /// Save a registration with an optimistic version check
    ///
    /// The stored version must equal `registration.version`; the saved copy
    /// carries `version + 1` and is returned.
    pub fn save_registration(&self, registration: &Registration) -> StorageResult<Registration> {
        let txn = self.db.begin_write()?;
        let saved = Self::save_registration_txn(&txn, registration)?;
        txn.commit()?;
        Ok(saved)
    }

    /// Release the given seats of a registration and save it, all in one
    /// write transaction
    ///
    /// A version conflict aborts the transaction, so no seat is released.
    /// Returns the saved registration and the reservations actually removed.
    pub fn save_registration_releasing(
        &self,
        registration: &Registration,
        session_ids: &[String],
    ) -> StorageResult<(Registration, Vec<Reservation>)> {
        let txn = self.db.begin_write()?;
        let mut released = Vec::with_capacity(session_ids.len());
        for session_id in session_ids {
            if let Some(reservation) = Self::release_seat_txn(&txn, &registration.id, session_id)? {
                released.push(reservation);
            }
        }
        let saved = Self::save_registration_txn(&txn, registration)?;
        txn.commit()?;
        Ok((saved, released))
    }

    fn save_registration_txn(txn: &WriteTransaction, registration: &Registration) -> StorageResult<Registration> {
        let current: Registration = Self::get_json_txn(txn, REGISTRATIONS_TABLE, &registration.id)?
            .ok_or_else(|| StorageError::RegistrationNotFound(registration.id.clone()))?;
        if current.version != registration.version {
            return Err(StorageError::VersionConflict {
                id: registration.id.clone(),
                expected: registration.version,
                found: current.version,
            });
        }

        let mut saved = registration.clone();
        saved.version += 1;
        Self::put_json_txn(txn, REGISTRATIONS_TABLE, &saved.id, &saved)?;
        Ok(saved)
    }

    // ========== Session Operations ==========

    pub fn get_session(&self, id: &str) -> StorageResult<Option<Session>> {
        self.get_json(SESSIONS_TABLE, id)
    }

    /// Insert or update a session published by the external scheduler
    ///
    /// Occupancy and version of an existing session are kept; only the
    /// descriptive fields and `capacity_max` are replaced.
    pub fn upsert_session(&self, session: &Session) -> StorageResult<Session> {
        let txn = self.db.begin_write()?;
        let existing: Option<Session> = Self::get_json_txn(&txn, SESSIONS_TABLE, &session.id)?;
        let stored = match existing {
            Some(current) => Session {
                capacity_used: current.capacity_used,
                version: current.version + 1,
                ..session.clone()
            },
            None => session.clone(),
        };
        Self::put_json_txn(&txn, SESSIONS_TABLE, &stored.id, &stored)?;
        txn.commit()?;
        Ok(stored)
    }

    /// Sessions of a branch whose date lies in `from..=to`, ordered by start
    pub fn sessions_at_branch(
        &self,
        branch_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StorageResult<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .list_json::<Session>(SESSIONS_TABLE)?
            .into_iter()
            .filter(|s| s.branch_id == branch_id && s.date >= from && s.date <= to)
            .collect();
        sessions.sort_by(|a, b| {
            (a.date, a.start_time, &a.id).cmp(&(b.date, b.start_time, &b.id))
        });
        Ok(sessions)
    }

    // ========== Seat Operations ==========

    /// Guarded check-and-increment of a session's occupancy
    ///
    /// Runs in a single write transaction: the reservation row and the
    /// capacity increment are committed together or not at all.
    pub fn claim_seat(&self, claim: &SeatClaim<'_>, now_local: NaiveDateTime) -> StorageResult<ClaimOutcome> {
        let txn = self.db.begin_write()?;
        let outcome = {
            let mut reservations = txn.open_table(RESERVATIONS_TABLE)?;
            let key = (claim.registration_id, claim.session_id);
            let held: Option<Reservation> = match reservations.get(key)? {
                Some(value) => Some(serde_json::from_slice(value.value())?),
                None => None,
            };

            if let Some(reservation) = held {
                ClaimOutcome::AlreadyHeld(reservation)
            } else {
                let mut session: Session =
                    Self::get_json_txn(&txn, SESSIONS_TABLE, claim.session_id)?
                        .ok_or_else(|| StorageError::SessionNotFound(claim.session_id.to_string()))?;

                if session.starts_at() <= now_local {
                    ClaimOutcome::Started
                } else if !session.has_free_seat() {
                    ClaimOutcome::Full
                } else {
                    session.capacity_used += 1;
                    session.version += 1;
                    Self::put_json_txn(&txn, SESSIONS_TABLE, &session.id, &session)?;

                    let reservation = Reservation {
                        registration_id: claim.registration_id.to_string(),
                        session_id: claim.session_id.to_string(),
                        role: claim.role,
                        actor_id: claim.actor_id.to_string(),
                        branch_id: session.branch_id.clone(),
                        trainer_id: session.trainer_id.clone(),
                        date: session.date,
                        slot_id: claim.slot_id,
                        reserved_at: claim.reserved_at,
                    };
                    let bytes = serde_json::to_vec(&reservation)?;
                    reservations.insert(key, bytes.as_slice())?;
                    ClaimOutcome::Claimed(reservation)
                }
            }
        };

        match outcome {
            ClaimOutcome::Claimed(_) => txn.commit()?,
            _ => txn.abort()?,
        }
        Ok(outcome)
    }

    /// Release a seat held by a registration
    ///
    /// Returns false when no reservation existed.
    pub fn release_seat(&self, registration_id: &str, session_id: &str) -> StorageResult<bool> {
        let txn = self.db.begin_write()?;
        let released = Self::release_seat_txn(&txn, registration_id, session_id)?;
        txn.commit()?;
        Ok(released.is_some())
    }

    /// Remove one reservation and give its seat back (within transaction)
    fn release_seat_txn(
        txn: &WriteTransaction,
        registration_id: &str,
        session_id: &str,
    ) -> StorageResult<Option<Reservation>> {
        let removed: Option<Reservation> = {
            let mut reservations = txn.open_table(RESERVATIONS_TABLE)?;
            match reservations.remove((registration_id, session_id))? {
                Some(value) => Some(serde_json::from_slice(value.value())?),
                None => None,
            }
        };
        if removed.is_some() {
            let session: Option<Session> = Self::get_json_txn(txn, SESSIONS_TABLE, session_id)?;
            if let Some(mut session) = session {
                session.capacity_used = session.capacity_used.saturating_sub(1);
                session.version += 1;
                Self::put_json_txn(txn, SESSIONS_TABLE, &session.id, &session)?;
            }
        }
        Ok(removed)
    }

    /// All reservations of one registration (both actors), ordered by session id
    pub fn reservations_for(&self, registration_id: &str) -> StorageResult<Vec<Reservation>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESERVATIONS_TABLE)?;

        let mut reservations = Vec::new();
        for result in table.range((registration_id, "")..)? {
            let (key, value) = result?;
            if key.value().0 != registration_id {
                break;
            }
            reservations.push(serde_json::from_slice(value.value())?);
        }
        Ok(reservations)
    }

    // ========== Catalog Mirror ==========

    pub fn put_branch(&self, branch: &Branch) -> StorageResult<()> {
        self.put_json(BRANCHES_TABLE, &branch.id, branch)
    }

    pub fn get_branch(&self, id: &str) -> StorageResult<Option<Branch>> {
        self.get_json(BRANCHES_TABLE, id)
    }

    pub fn list_branches(&self) -> StorageResult<Vec<Branch>> {
        self.list_json(BRANCHES_TABLE)
    }

    pub fn put_trainer(&self, trainer: &Trainer) -> StorageResult<()> {
        self.put_json(TRAINERS_TABLE, &trainer.id, trainer)
    }

    pub fn get_trainer(&self, id: &str) -> StorageResult<Option<Trainer>> {
        self.get_json(TRAINERS_TABLE, id)
    }

    pub fn list_trainers(&self) -> StorageResult<Vec<Trainer>> {
        self.list_json(TRAINERS_TABLE)
    }

    pub fn put_package(&self, package: &Package) -> StorageResult<()> {
        self.put_json(PACKAGES_TABLE, &package.id, package)
    }

    pub fn get_package(&self, id: &str) -> StorageResult<Option<Package>> {
        self.get_json(PACKAGES_TABLE, id)
    }

    // ========== Statistics ==========

    /// Get storage statistics (also used as the health check)
    pub fn get_stats(&self) -> StorageResult<StorageStats> {
        let read_txn = self.db.begin_read()?;

        let registrations = read_txn.open_table(REGISTRATIONS_TABLE)?;
        let sessions = read_txn.open_table(SESSIONS_TABLE)?;
        let reservations = read_txn.open_table(RESERVATIONS_TABLE)?;

        Ok(StorageStats {
            registration_count: registrations.len()?,
            session_count: sessions.len()?,
            reservation_count: reservations.len()?,
        })
    }
}

/// Storage statistics
#[derive(Debug, Clone, Serialize)]
pub struct StorageStats {
    pub registration_count: u64,
    pub session_count: u64,
    pub reservation_count: u64,
}
