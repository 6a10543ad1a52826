//! Service layer for the rating pipeline
//!
//! Ingestion of raw contest lines and the full rating replay, both talking to
//! storage only through the repository interface.

pub mod ingest;
pub mod replay;

pub use ingest::{ContestIngestor, IngestReport};
pub use replay::{ReplayReport, ReplayService};
