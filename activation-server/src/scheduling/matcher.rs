//! Trainer matcher
//!
//! A trainer is a candidate for a set of preferences when, during the
//! look-ahead window, it
//!
//! 1. operates at the branch,
//! 2. has a registrable session inside every preferred window,
//! 3. offers registrable sessions on at least `sessions_per_week` distinct
//!    (date, slot) pairs.
//!
//! Candidates are ordered by trainer id so pagination is deterministic.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use shared::models::{PreferredWindow, Trainer};
use shared::types::Page;

use super::registry::{SessionRegistry, is_registrable_at};
use super::{SchedulingError, slots};
use crate::catalog::Catalog;

/// Preferences the candidates are matched against
#[derive(Debug, Clone, Copy)]
pub struct MatchQuery<'a> {
    pub branch_id: &'a str,
    pub preferred_windows: &'a [PreferredWindow],
    pub sessions_per_week: u8,
}

#[derive(Debug, Clone)]
pub struct TrainerMatcher {
    catalog: Arc<dyn Catalog>,
    registry: SessionRegistry,
}

impl TrainerMatcher {
    pub fn new(catalog: Arc<dyn Catalog>, registry: SessionRegistry) -> Self {
        Self { catalog, registry }
    }

    /// All candidates, ordered by trainer id
    pub async fn match_trainers(&self, query: MatchQuery<'_>) -> Result<Vec<Trainer>, SchedulingError> {
        if query.preferred_windows.is_empty() {
            return Ok(Vec::new());
        }

        let trainers = self.catalog.trainers_at_branch(query.branch_id).await?;
        if trainers.is_empty() {
            return Ok(Vec::new());
        }

        let (from, to) = self.registry.look_ahead();
        let now = self.registry.now_local();
        let sessions = self.registry.sessions_at_branch(query.branch_id, from, to)?;

        // (date, slot) pairs with a registrable session, per trainer
        let mut open: HashMap<&str, HashSet<(NaiveDate, u8)>> = HashMap::new();
        for session in sessions.iter().filter(|s| is_registrable_at(s, now)) {
            if let Some(slot_id) = slots::slot_of(session) {
                open.entry(session.trainer_id.as_str())
                    .or_default()
                    .insert((session.date, slot_id));
            }
        }

        let mut candidates: Vec<Trainer> = trainers
            .into_iter()
            .filter(|t| t.works_at(query.branch_id))
            .filter(|t| {
                open.get(t.id.as_str())
                    .is_some_and(|pairs| satisfies(pairs, &query))
            })
            .collect();
        candidates.sort_by(|a, b| a.id.cmp(&b.id));

        tracing::debug!(
            branch_id = %query.branch_id,
            windows = query.preferred_windows.len(),
            sessions_per_week = query.sessions_per_week,
            candidates = candidates.len(),
            "Matched trainers"
        );
        Ok(candidates)
    }

    pub async fn match_page(
        &self,
        query: MatchQuery<'_>,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Trainer>, SchedulingError> {
        let all = self.match_trainers(query).await?;
        Ok(Page::slice(all, page, page_size))
    }

    pub async fn is_candidate(&self, trainer_id: &str, query: MatchQuery<'_>) -> Result<bool, SchedulingError> {
        Ok(self
            .match_trainers(query)
            .await?
            .iter()
            .any(|t| t.id == trainer_id))
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }
}

fn satisfies(pairs: &HashSet<(NaiveDate, u8)>, query: &MatchQuery<'_>) -> bool {
    let every_window_hit = query.preferred_windows.iter().all(|window| {
        pairs
            .iter()
            .any(|(date, slot_id)| slots::matches_window(*date, *slot_id, window))
    });
    every_window_hit && pairs.len() >= usize::from(query.sessions_per_week)
}
