//! Full rating recompute
//!
//! A replay clears derived state, reads every stored contest, orders them and
//! folds them from an empty book. Writes go out one round group at a time.
//! A failed write never stops the fold, but the run then ends with
//! [`RatingError::ReplayIncomplete`] so the stored state is not trusted.

use crate::error::RatingError;
use crate::metrics::MetricsCollector;
use crate::ordering::order;
use crate::rating::{FoldSummary, RatingBook, RatingEngine, RatingRepository};
use crate::types::HistoryEntry;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Result of a completed replay
#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub book: RatingBook,
    pub summary: FoldSummary,
    pub history_entries: usize,
    pub round_groups: usize,
    pub duration: Duration,
}

/// Recomputes every rating from the stored contests
pub struct ReplayService {
    repository: Arc<dyn RatingRepository>,
    engine: RatingEngine,
    metrics: Arc<MetricsCollector>,
}

impl ReplayService {
    pub fn new(
        repository: Arc<dyn RatingRepository>,
        engine: RatingEngine,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            repository,
            engine,
            metrics,
        }
    }

    fn unavailable(&self, operation: &str, err: anyhow::Error) -> anyhow::Error {
        error!("Storage unavailable during {}: {}", operation, err);
        self.metrics.record_persistence_failure(operation);
        RatingError::StorageUnavailable {
            message: format!("{} failed: {}", operation, err),
        }
        .into()
    }

    /// Run a full replay
    pub fn replay(&self) -> crate::error::Result<ReplayReport> {
        let timer = self.metrics.start_timer();

        self.repository
            .clear_history()
            .map_err(|e| self.unavailable("clear", e))?;
        self.repository
            .clear_ratings()
            .map_err(|e| self.unavailable("clear", e))?;
        let records = self
            .repository
            .read_ordered_outcomes()
            .map_err(|e| self.unavailable("read", e))?;

        let stream = order(records);
        info!("Replaying {} contests", stream.len());

        let mut fold = self.engine.start(RatingBook::new());
        let mut failed_writes = 0usize;
        let mut history_entries = 0usize;
        let mut round_groups = 0usize;

        for group in stream.round_groups() {
            round_groups += 1;
            let mut entries: Vec<HistoryEntry> = Vec::new();
            let mut seen = HashSet::new();
            let mut touched = Vec::new();

            for contest in group {
                let rows = fold.apply(contest);
                if rows.is_empty() {
                    continue;
                }
                self.metrics
                    .record_contest_folded(contest.record.outcome.decision_kind.label(), rows.len());
                for row in &rows {
                    if seen.insert(row.name.clone()) {
                        touched.push(row.name.clone());
                    }
                }
                entries.extend(rows);
            }

            for name in &touched {
                let Some(state) = fold.book().get(name) else {
                    continue;
                };
                if let Err(e) = self.repository.upsert_rating(state.clone()) {
                    warn!("Failed to store rating for {}: {}", name, e);
                    self.metrics.record_persistence_failure("upsert");
                    failed_writes += 1;
                }
            }

            if !entries.is_empty() {
                let count = entries.len();
                match self.repository.append_history(entries) {
                    Ok(()) => history_entries += count,
                    Err(e) => {
                        warn!("Failed to append {} history rows: {}", count, e);
                        self.metrics.record_persistence_failure("append");
                        failed_writes += 1;
                    }
                }
            }

            if let Err(e) = self.repository.commit() {
                warn!("Failed to commit round group {}: {}", round_groups, e);
                self.metrics.record_persistence_failure("commit");
                failed_writes += 1;
            }

            debug!(
                "Round group {} folded: {} wrestlers touched",
                round_groups,
                touched.len()
            );
        }

        let duration = timer.stop();
        self.metrics.record_replay_duration(duration);
        let summary = fold.summary();

        if failed_writes > 0 {
            error!(
                "Replay finished with {} failed writes; stored ratings are not authoritative",
                failed_writes
            );
            return Err(RatingError::ReplayIncomplete { failed_writes }.into());
        }

        info!(
            "Replay complete: {} rated, {} walkovers, {} byes, {} skipped, {} history rows in {:.2}ms",
            summary.rated,
            summary.walkovers,
            summary.byes,
            summary.skipped,
            history_entries,
            duration.as_secs_f64() * 1000.0
        );

        Ok(ReplayReport {
            book: fold.into_book(),
            summary,
            history_entries,
            round_groups,
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::storage::MockRatingRepository;
    use crate::rating::{MockRepository, RepositoryOp};
    use crate::types::{ContestRecord, DecisionKind, Outcome};
    use chrono::NaiveDate;
    use mockall::Sequence;

    fn contest(sequence: u64, round: &str, winner: &str, loser: &str) -> ContestRecord {
        ContestRecord {
            sequence,
            event_id: "e1".to_string(),
            event_date: NaiveDate::from_ymd_opt(2024, 1, 6),
            outcome: Outcome {
                round_label: Some(round.to_string()),
                winner_name: Some(winner.to_string()),
                loser_name: Some(loser.to_string()),
                decision_kind: DecisionKind::Decision,
                winner_points: Some(5),
                loser_points: Some(2),
                ..Default::default()
            },
        }
    }

    fn service(repo: Arc<dyn RatingRepository>) -> (ReplayService, Arc<MetricsCollector>) {
        let metrics = Arc::new(MetricsCollector::new().unwrap());
        (
            ReplayService::new(repo, RatingEngine::default(), metrics.clone()),
            metrics,
        )
    }

    #[test]
    fn test_replay_is_idempotent() {
        let repo = Arc::new(MockRepository::new());
        repo.preset_outcomes(vec![
            contest(0, "Round 1", "A", "B"),
            contest(1, "Round 1", "C", "D"),
            contest(2, "Round 2", "A", "C"),
        ])
        .unwrap();
        let (replay, _) = service(repo.clone());

        let first = replay.replay().unwrap();
        let first_history = repo.history().unwrap();
        let second = replay.replay().unwrap();

        assert_eq!(first.book, second.book);
        assert_eq!(first_history, repo.history().unwrap());
        assert_eq!(first_history.len(), 6);
        assert_eq!(second.round_groups, 2);
        assert_eq!(repo.get_all_ratings().unwrap().len(), 4);
    }

    #[test]
    fn test_writes_per_round_group() {
        let repo = Arc::new(MockRepository::new());
        repo.preset_outcomes(vec![
            contest(0, "Round 1", "A", "B"),
            contest(1, "Round 2", "A", "C"),
        ])
        .unwrap();
        repo.clear_calls();
        let (replay, _) = service(repo.clone());
        replay.replay().unwrap();

        use RepositoryOp::*;
        assert_eq!(
            repo.get_calls(),
            vec![
                Clear, Clear, Read, Upsert, Upsert, Append, Commit, Upsert, Upsert, Append, Commit
            ]
        );
    }

    #[test]
    fn test_write_failure_continues_then_reports() {
        let repo = Arc::new(MockRepository::new());
        repo.preset_outcomes(vec![
            contest(0, "Round 1", "A", "B"),
            contest(1, "Round 2", "C", "D"),
        ])
        .unwrap();
        repo.fail_upserts_for("B");
        let (replay, metrics) = service(repo.clone());

        let err = replay.replay().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RatingError>(),
            Some(RatingError::ReplayIncomplete { failed_writes: 1 })
        ));
        // the later round was still folded and written
        assert!(repo.get_rating("D").unwrap().is_some());
        assert_eq!(repo.history().unwrap().len(), 4);
        assert_eq!(
            metrics
                .persistence()
                .persistence_failures_total
                .with_label_values(&["upsert"])
                .get(),
            1
        );
    }

    #[test]
    fn test_read_failure_aborts() {
        let mut repo = MockRatingRepository::new();
        let mut seq = Sequence::new();
        repo.expect_clear_history()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        repo.expect_clear_ratings()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        repo.expect_read_ordered_outcomes()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(anyhow::anyhow!("connection refused")));
        repo.expect_upsert_rating().never();
        repo.expect_append_history().never();

        let (replay, _) = service(Arc::new(repo));
        let err = replay.replay().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RatingError>(),
            Some(RatingError::StorageUnavailable { .. })
        ));
    }

    #[test]
    fn test_clear_failure_aborts_before_read() {
        let mut repo = MockRatingRepository::new();
        repo.expect_clear_history()
            .times(1)
            .returning(|| Err(anyhow::anyhow!("locked")));
        repo.expect_read_ordered_outcomes().never();

        let (replay, metrics) = service(Arc::new(repo));
        assert!(replay.replay().is_err());
        assert_eq!(
            metrics
                .persistence()
                .persistence_failures_total
                .with_label_values(&["clear"])
                .get(),
            1
        );
    }

    #[test]
    fn test_empty_store() {
        let repo = Arc::new(MockRepository::new());
        let (replay, _) = service(repo);
        let report = replay.replay().unwrap();
        assert!(report.book.is_empty());
        assert_eq!(report.round_groups, 0);
        assert_eq!(report.summary.total(), 0);
    }
}
