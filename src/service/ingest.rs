//! Contest ingestion
//!
//! Classifies raw contest lines, tags them with their event context and the
//! next sequence numbers, and stores them through the repository.

use crate::classifier::classify_traced;
use crate::error::RatingError;
use crate::metrics::MetricsCollector;
use crate::rating::RatingRepository;
use crate::types::{ContestRecord, RawContest};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What one ingestion batch did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub ingested: usize,
    /// Lines no rule recognised; stored anyway as partial outcomes
    pub unparsed: usize,
    pub first_sequence: u64,
}

/// Classifies and stores raw contests
pub struct ContestIngestor {
    repository: Arc<dyn RatingRepository>,
    metrics: Arc<MetricsCollector>,
}

impl ContestIngestor {
    pub fn new(repository: Arc<dyn RatingRepository>, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            repository,
            metrics,
        }
    }

    /// Classify a batch without storing it, numbering from `first_sequence`
    pub fn classify_batch(
        &self,
        raws: impl IntoIterator<Item = RawContest>,
        first_sequence: u64,
    ) -> (Vec<ContestRecord>, IngestReport) {
        let mut report = IngestReport {
            first_sequence,
            ..Default::default()
        };
        let mut records = Vec::new();

        for (sequence, raw) in (first_sequence..).zip(raws) {
            let classification = classify_traced(&raw.text);
            self.metrics.record_classification(classification.rule);
            if !classification.is_recognised() {
                warn!(
                    "Unparsed contest line in event {}: '{}'",
                    raw.event_id, raw.text
                );
                report.unparsed += 1;
            }

            let mut outcome = classification.outcome;
            if outcome.weight_class.is_none() {
                outcome.weight_class = raw.weight_class;
            }
            debug!(
                "Contest {} of event {} classified as {}",
                sequence, raw.event_id, outcome.decision_kind
            );

            records.push(ContestRecord {
                sequence,
                event_id: raw.event_id,
                event_date: raw.event_date,
                outcome,
            });
        }

        report.ingested = records.len();
        (records, report)
    }

    /// Classify a batch and store it
    pub fn ingest(&self, raws: impl IntoIterator<Item = RawContest>) -> crate::error::Result<IngestReport> {
        let first_sequence = self.repository.next_sequence().map_err(|e| {
            error!("Failed to read the next sequence number: {}", e);
            self.metrics.record_persistence_failure("read");
            RatingError::StorageUnavailable {
                message: e.to_string(),
            }
        })?;

        let (records, report) = self.classify_batch(raws, first_sequence);
        if records.is_empty() {
            return Ok(report);
        }

        self.repository.insert_outcomes(records).map_err(|e| {
            error!("Failed to store {} contest records: {}", report.ingested, e);
            self.metrics.record_persistence_failure("insert");
            RatingError::PersistenceFailed {
                message: e.to_string(),
            }
        })?;

        info!(
            "Ingested {} contests ({} unparsed) starting at sequence {}",
            report.ingested, report.unparsed, report.first_sequence
        );
        Ok(report)
    }
}
