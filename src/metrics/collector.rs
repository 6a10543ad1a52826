//! Metrics collection using Prometheus
//!
//! Counters for classification, the rating fold and persistence, plus the
//! replay duration histogram.

use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the rating pipeline
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Classification metrics
    classifier_metrics: ClassifierMetrics,

    /// Rating fold metrics
    rating_metrics: RatingMetrics,

    /// Persistence boundary metrics
    persistence_metrics: PersistenceMetrics,
}

/// Classification metrics
#[derive(Clone)]
pub struct ClassifierMetrics {
    /// Outcomes classified, by the rule that recognised them
    pub outcomes_classified_total: IntCounterVec,

    /// Lines no rule recognised
    pub unparsed_lines_total: IntCounter,
}

/// Rating fold metrics
#[derive(Clone)]
pub struct RatingMetrics {
    /// Contests folded, by decision kind
    pub contests_folded_total: IntCounterVec,

    /// History rows produced
    pub history_entries_total: IntCounter,

    /// Full replay duration
    pub replay_duration_seconds: Histogram,
}

/// Persistence boundary metrics
#[derive(Clone)]
pub struct PersistenceMetrics {
    /// Failed repository calls, by operation
    pub persistence_failures_total: IntCounterVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let classifier_metrics = ClassifierMetrics::new(&registry)?;
        let rating_metrics = RatingMetrics::new(&registry)?;
        let persistence_metrics = PersistenceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            classifier_metrics,
            rating_metrics,
            persistence_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn classifier(&self) -> &ClassifierMetrics {
        &self.classifier_metrics
    }

    pub fn rating(&self) -> &RatingMetrics {
        &self.rating_metrics
    }

    pub fn persistence(&self) -> &PersistenceMetrics {
        &self.persistence_metrics
    }

    /// Record one classified line; `rule` is `None` when nothing matched
    pub fn record_classification(&self, rule: Option<&str>) {
        match rule {
            Some(rule) => self
                .classifier_metrics
                .outcomes_classified_total
                .with_label_values(&[rule])
                .inc(),
            None => self.classifier_metrics.unparsed_lines_total.inc(),
        }
    }

    /// Record one folded contest and the history rows it produced
    pub fn record_contest_folded(&self, kind: &str, history_entries: usize) {
        self.rating_metrics
            .contests_folded_total
            .with_label_values(&[kind])
            .inc();
        self.rating_metrics
            .history_entries_total
            .inc_by(history_entries as u64);
    }

    /// Record a failed repository call
    pub fn record_persistence_failure(&self, operation: &str) {
        self.persistence_metrics
            .persistence_failures_total
            .with_label_values(&[operation])
            .inc();
    }

    /// Record how long a full replay took
    pub fn record_replay_duration(&self, duration: Duration) {
        self.rating_metrics
            .replay_duration_seconds
            .observe(duration.as_secs_f64());
    }

    /// Render every registered metric in the text exposition format
    pub fn gather_text(&self) -> Result<String> {
        let metric_families = self.registry.gather();
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ClassifierMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let outcomes_classified_total = IntCounterVec::new(
            Opts::new(
                "wrestling_elo_outcomes_classified_total",
                "Outcomes classified by rule",
            ),
            &["rule"],
        )?;
        registry.register(Box::new(outcomes_classified_total.clone()))?;

        let unparsed_lines_total = IntCounter::new(
            "wrestling_elo_unparsed_lines_total",
            "Contest lines no rule recognised",
        )?;
        registry.register(Box::new(unparsed_lines_total.clone()))?;

        Ok(Self {
            outcomes_classified_total,
            unparsed_lines_total,
        })
    }
}

impl RatingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let contests_folded_total = IntCounterVec::new(
            Opts::new(
                "wrestling_elo_contests_folded_total",
                "Contests folded into ratings by decision kind",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(contests_folded_total.clone()))?;

        let history_entries_total = IntCounter::new(
            "wrestling_elo_history_entries_total",
            "History rows produced by the fold",
        )?;
        registry.register(Box::new(history_entries_total.clone()))?;

        let replay_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "wrestling_elo_replay_duration_seconds",
                "Full replay duration in seconds",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0]),
        )?;
        registry.register(Box::new(replay_duration_seconds.clone()))?;

        Ok(Self {
            contests_folded_total,
            history_entries_total,
            replay_duration_seconds,
        })
    }
}

impl PersistenceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let persistence_failures_total = IntCounterVec::new(
            Opts::new(
                "wrestling_elo_persistence_failures_total",
                "Failed repository calls by operation",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(persistence_failures_total.clone()))?;

        Ok(Self {
            persistence_failures_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        let _classifier = collector.classifier();
        let _rating = collector.rating();
        let _persistence = collector.persistence();
    }

    #[test]
    fn test_classification_counts() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_classification(Some("won_by"));
        collector.record_classification(Some("won_by"));
        collector.record_classification(None);

        let classified = &collector.classifier().outcomes_classified_total;
        assert_eq!(classified.with_label_values(&["won_by"]).get(), 2);
        assert_eq!(collector.classifier().unparsed_lines_total.get(), 1);
    }

    #[test]
    fn test_fold_and_failure_counts() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_contest_folded("fall", 2);
        collector.record_contest_folded("bye", 1);
        collector.record_persistence_failure("upsert");
        collector.record_replay_duration(Duration::from_millis(20));

        assert_eq!(collector.rating().history_entries_total.get(), 3);
        assert_eq!(
            collector
                .persistence()
                .persistence_failures_total
                .with_label_values(&["upsert"])
                .get(),
            1
        );
        assert_eq!(collector.rating().replay_duration_seconds.get_sample_count(), 1);
    }

    #[test]
    fn test_gather_text() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        collector.record_classification(Some("over"));

        let text = collector.gather_text().unwrap();
        assert!(text.contains("wrestling_elo_outcomes_classified_total{rule=\"over\"} 1"));
        assert!(text.contains("wrestling_elo_unparsed_lines_total 0"));
    }

    #[test]
    fn test_metrics_timer() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        let timer = collector.start_timer();

        std::thread::sleep(Duration::from_millis(10));
        let duration = timer.elapsed();

        assert!(duration >= Duration::from_millis(10));

        let final_duration = timer.stop();
        assert!(final_duration >= Duration::from_millis(10));
    }
}
