//! Catalog seed loading
//!
//! The platform publishes branches, trainers, packages and the sessions
//! generated by its weekly scheduler as one JSON document. Loading it is an
//! upsert: session occupancy already recorded here is preserved.

use std::path::Path;

use serde::Deserialize;
use shared::models::{Branch, Package, Session, Trainer};
use thiserror::Error;

use crate::scheduling::slots;
use crate::storage::{ActivationStorage, StorageError};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSeed {
    #[serde(default)]
    pub branches: Vec<Branch>,
    #[serde(default)]
    pub trainers: Vec<Trainer>,
    #[serde(default)]
    pub packages: Vec<Package>,
    #[serde(default)]
    pub sessions: Vec<Session>,
}

/// Counts of records written by [`CatalogSeed::apply`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub branches: usize,
    pub trainers: usize,
    pub packages: usize,
    pub sessions: usize,
    /// Sessions rejected because their window does not fit a slot
    pub skipped_sessions: usize,
}

impl CatalogSeed {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn apply(&self, storage: &ActivationStorage) -> Result<SeedReport, SeedError> {
        let mut report = SeedReport::default();

        for branch in &self.branches {
            storage.put_branch(branch)?;
            report.branches += 1;
        }
        for trainer in &self.trainers {
            storage.put_trainer(trainer)?;
            report.trainers += 1;
        }
        for package in &self.packages {
            storage.put_package(package)?;
            report.packages += 1;
        }
        for session in &self.sessions {
            if slots::slot_of(session).is_none() || session.capacity_max == 0 {
                tracing::warn!(
                    session_id = %session.id,
                    start = %session.start_time,
                    end = %session.end_time,
                    "Skipping session outside the slot grid"
                );
                report.skipped_sessions += 1;
                continue;
            }
            storage.upsert_session(session)?;
            report.sessions += 1;
        }

        tracing::info!(
            branches = report.branches,
            trainers = report.trainers,
            packages = report.packages,
            sessions = report.sessions,
            skipped = report.skipped_sessions,
            "Catalog seed applied"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"{
        "branches": [{"id": "b-1", "name": "District 1"}],
        "trainers": [{"id": "t-1", "name": "Linh", "branchIds": ["b-1"]}],
        "packages": [{"id": "p-1", "name": "Monthly", "price": 3000000, "termDays": 30}],
        "sessions": [
            {"id": "s-1", "branchId": "b-1", "trainerId": "t-1", "date": "2026-03-02",
             "startTime": "08:00:00", "endTime": "10:00:00", "capacityMax": 3},
            {"id": "s-bad", "branchId": "b-1", "trainerId": "t-1", "date": "2026-03-02",
             "startTime": "11:00:00", "endTime": "13:00:00", "capacityMax": 3}
        ]
    }"#;

    #[test]
    fn test_apply_seed() {
        let storage = ActivationStorage::open_in_memory().unwrap();
        let seed: CatalogSeed = serde_json::from_str(SEED).unwrap();
        let report = seed.apply(&storage).unwrap();

        assert_eq!(report.branches, 1);
        assert_eq!(report.sessions, 1);
        assert_eq!(report.skipped_sessions, 1);
        assert!(storage.get_session("s-bad").unwrap().is_none());

        let package = storage.get_package("p-1").unwrap().unwrap();
        assert_eq!(package.max_participants, 1);
        assert!(storage.get_branch("b-1").unwrap().unwrap().active);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, SEED).unwrap();

        let seed = CatalogSeed::from_file(&path).unwrap();
        assert_eq!(seed.sessions.len(), 2);

        let missing = CatalogSeed::from_file(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(SeedError::Io(_))));
    }
}
