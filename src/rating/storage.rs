//! Persistence interface and implementations
//!
//! The pipeline depends only on the narrow [`RatingRepository`] trait: stored
//! contest records in, rating records and history rows out. Every write is an
//! idempotent replace so a full replay converges to the same state.

use crate::error::RatingError;
use crate::types::{ContestRecord, HistoryEntry, RatingState, WrestlerName};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// Keyed-row store behind the rating pipeline
#[cfg_attr(test, mockall::automock)]
pub trait RatingRepository: Send + Sync {
    /// Stored contest records, in sequence order
    fn read_ordered_outcomes(&self) -> crate::error::Result<Vec<ContestRecord>>;

    /// Store newly classified contest records, replacing any with the same sequence
    fn insert_outcomes(&self, records: Vec<ContestRecord>) -> crate::error::Result<()>;

    /// Sequence number the next ingested contest should take
    fn next_sequence(&self) -> crate::error::Result<u64>;

    /// Insert or replace a wrestler's rating record
    fn upsert_rating(&self, state: RatingState) -> crate::error::Result<()>;

    /// Append rows to the history log
    fn append_history(&self, entries: Vec<HistoryEntry>) -> crate::error::Result<()>;

    /// Drop the whole history log before a replay
    fn clear_history(&self) -> crate::error::Result<()>;

    /// Drop every rating record before a replay
    fn clear_ratings(&self) -> crate::error::Result<()>;

    /// Get a wrestler's rating record
    fn get_rating(&self, name: &str) -> crate::error::Result<Option<RatingState>>;

    /// Get every rating record
    fn get_all_ratings(&self) -> crate::error::Result<Vec<RatingState>>;

    /// Make the writes since the last commit durable
    fn commit(&self) -> crate::error::Result<()> {
        Ok(())
    }
}

fn lock_failed(which: &str) -> RatingError {
    RatingError::InternalError {
        message: format!("Failed to acquire {} lock", which),
    }
}

/// In-memory repository
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    outcomes: RwLock<Vec<ContestRecord>>,
    ratings: RwLock<HashMap<WrestlerName, RatingState>>,
    history: RwLock<Vec<HistoryEntry>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the history log
    pub fn history(&self) -> crate::error::Result<Vec<HistoryEntry>> {
        let history = self
            .history
            .read()
            .map_err(|_| lock_failed("history read"))?;
        Ok(history.clone())
    }

    pub fn outcome_count(&self) -> crate::error::Result<usize> {
        let outcomes = self
            .outcomes
            .read()
            .map_err(|_| lock_failed("outcomes read"))?;
        Ok(outcomes.len())
    }
}

impl RatingRepository for InMemoryRepository {
    fn read_ordered_outcomes(&self) -> crate::error::Result<Vec<ContestRecord>> {
        let outcomes = self
            .outcomes
            .read()
            .map_err(|_| lock_failed("outcomes read"))?;
        Ok(outcomes.clone())
    }

    fn insert_outcomes(&self, records: Vec<ContestRecord>) -> crate::error::Result<()> {
        let mut outcomes = self
            .outcomes
            .write()
            .map_err(|_| lock_failed("outcomes write"))?;

        for record in records {
            match outcomes.binary_search_by_key(&record.sequence, |r| r.sequence) {
                Ok(idx) => outcomes[idx] = record,
                Err(idx) => outcomes.insert(idx, record),
            }
        }
        Ok(())
    }

    fn next_sequence(&self) -> crate::error::Result<u64> {
        let outcomes = self
            .outcomes
            .read()
            .map_err(|_| lock_failed("outcomes read"))?;
        Ok(outcomes.last().map_or(0, |r| r.sequence + 1))
    }

    fn upsert_rating(&self, state: RatingState) -> crate::error::Result<()> {
        let mut ratings = self
            .ratings
            .write()
            .map_err(|_| lock_failed("ratings write"))?;
        ratings.insert(state.name.clone(), state);
        Ok(())
    }

    fn append_history(&self, entries: Vec<HistoryEntry>) -> crate::error::Result<()> {
        let mut history = self
            .history
            .write()
            .map_err(|_| lock_failed("history write"))?;
        history.extend(entries);
        Ok(())
    }

    fn clear_history(&self) -> crate::error::Result<()> {
        let mut history = self
            .history
            .write()
            .map_err(|_| lock_failed("history write"))?;
        history.clear();
        Ok(())
    }

    fn clear_ratings(&self) -> crate::error::Result<()> {
        let mut ratings = self
            .ratings
            .write()
            .map_err(|_| lock_failed("ratings write"))?;
        ratings.clear();
        Ok(())
    }

    fn get_rating(&self, name: &str) -> crate::error::Result<Option<RatingState>> {
        let ratings = self
            .ratings
            .read()
            .map_err(|_| lock_failed("ratings read"))?;
        Ok(ratings.get(name).cloned())
    }

    fn get_all_ratings(&self) -> crate::error::Result<Vec<RatingState>> {
        let ratings = self
            .ratings
            .read()
            .map_err(|_| lock_failed("ratings read"))?;
        let mut all: Vec<RatingState> = ratings.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }
}

/// Operations a [`MockRepository`] can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOp {
    Read,
    Insert,
    Upsert,
    Append,
    Clear,
    Commit,
}

impl RepositoryOp {
    pub fn label(&self) -> &'static str {
        match self {
            RepositoryOp::Read => "read",
            RepositoryOp::Insert => "insert",
            RepositoryOp::Upsert => "upsert",
            RepositoryOp::Append => "append",
            RepositoryOp::Clear => "clear",
            RepositoryOp::Commit => "commit",
        }
    }
}

/// Recording repository for testing
///
/// Stores like [`InMemoryRepository`], records every call and fails the
/// operations it has been told to fail.
#[derive(Debug, Default)]
pub struct MockRepository {
    inner: InMemoryRepository,
    calls: RwLock<Vec<RepositoryOp>>,
    failing: RwLock<HashSet<RepositoryOp>>,
    failing_names: RwLock<HashSet<WrestlerName>>,
}

impl MockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all calls made (for testing)
    pub fn get_calls(&self) -> Vec<RepositoryOp> {
        self.calls
            .read()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Clear recorded calls (for testing)
    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.calls.write() {
            calls.clear();
        }
    }

    /// Make every later call of `op` fail
    pub fn fail_operation(&self, op: RepositoryOp) {
        if let Ok(mut failing) = self.failing.write() {
            failing.insert(op);
        }
    }

    /// Make upserts of one wrestler's record fail
    pub fn fail_upserts_for(&self, name: &str) {
        if let Ok(mut names) = self.failing_names.write() {
            names.insert(name.to_string());
        }
    }

    /// Stop failing every operation
    pub fn recover(&self) {
        if let Ok(mut failing) = self.failing.write() {
            failing.clear();
        }
        if let Ok(mut names) = self.failing_names.write() {
            names.clear();
        }
    }

    /// Preset contest records for testing
    pub fn preset_outcomes(&self, records: Vec<ContestRecord>) -> crate::error::Result<()> {
        self.inner.insert_outcomes(records)
    }

    pub fn history(&self) -> crate::error::Result<Vec<HistoryEntry>> {
        self.inner.history()
    }

    fn record(&self, op: RepositoryOp) -> crate::error::Result<()> {
        if let Ok(mut calls) = self.calls.write() {
            calls.push(op);
        }

        let failing = self
            .failing
            .read()
            .map_err(|_| lock_failed("failure set read"))?;
        if !failing.contains(&op) {
            return Ok(());
        }

        let message = format!("injected {} failure", op.label());
        let err = match op {
            RepositoryOp::Read | RepositoryOp::Clear => RatingError::StorageUnavailable { message },
            _ => RatingError::PersistenceFailed { message },
        };
        Err(err.into())
    }
}

impl RatingRepository for MockRepository {
    fn read_ordered_outcomes(&self) -> crate::error::Result<Vec<ContestRecord>> {
        self.record(RepositoryOp::Read)?;
        self.inner.read_ordered_outcomes()
    }

    fn insert_outcomes(&self, records: Vec<ContestRecord>) -> crate::error::Result<()> {
        self.record(RepositoryOp::Insert)?;
        self.inner.insert_outcomes(records)
    }

    fn next_sequence(&self) -> crate::error::Result<u64> {
        self.inner.next_sequence()
    }

    fn upsert_rating(&self, state: RatingState) -> crate::error::Result<()> {
        self.record(RepositoryOp::Upsert)?;
        let blocked = self
            .failing_names
            .read()
            .map_err(|_| lock_failed("failure set read"))?
            .contains(&state.name);
        if blocked {
            return Err(RatingError::PersistenceFailed {
                message: format!("injected upsert failure for {}", state.name),
            }
            .into());
        }
        self.inner.upsert_rating(state)
    }

    fn append_history(&self, entries: Vec<HistoryEntry>) -> crate::error::Result<()> {
        self.record(RepositoryOp::Append)?;
        self.inner.append_history(entries)
    }

    fn clear_history(&self) -> crate::error::Result<()> {
        self.record(RepositoryOp::Clear)?;
        self.inner.clear_history()
    }

    fn clear_ratings(&self) -> crate::error::Result<()> {
        self.record(RepositoryOp::Clear)?;
        self.inner.clear_ratings()
    }

    fn get_rating(&self, name: &str) -> crate::error::Result<Option<RatingState>> {
        self.record(RepositoryOp::Read)?;
        self.inner.get_rating(name)
    }

    fn get_all_ratings(&self) -> crate::error::Result<Vec<RatingState>> {
        self.record(RepositoryOp::Read)?;
        self.inner.get_all_ratings()
    }

    fn commit(&self) -> crate::error::Result<()> {
        self.record(RepositoryOp::Commit)
    }
}
