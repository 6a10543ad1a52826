//! Metrics for the rating pipeline
//!
//! Prometheus counters and histograms covering classification, the rating
//! fold and the persistence boundary.

pub mod collector;

pub use collector::{
    ClassifierMetrics, MetricsCollector, MetricsTimer, PersistenceMetrics, RatingMetrics,
};
