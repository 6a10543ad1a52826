//! Wrestling Elo - result-line classification and rating replay
//!
//! This crate turns free-text wrestling result lines into structured outcomes,
//! orders them by event and round, and folds them into per-wrestler Elo
//! ratings with a full audit trail.

pub mod classifier;
pub mod config;
pub mod error;
pub mod metrics;
pub mod ordering;
pub mod rating;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{RatingError, Result};
pub use types::*;

// Re-export key components
pub use classifier::{classify, classify_traced, Classification};
pub use ordering::{order, MatchStream, SequencedContest};
pub use rating::{RatingBook, RatingEngine, RatingRepository};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
