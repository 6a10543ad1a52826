//! Elo rating engine
//!
//! This module provides the K-factor model, inactivity cooldown, the
//! sequential fold over an ordered contest stream and the persistence
//! interface it writes through.

pub mod book;
pub mod cooldown;
pub mod engine;
pub mod kfactor;
pub mod storage;

// Re-export commonly used types
pub use book::RatingBook;
pub use cooldown::{apply_cooldown, cooldown_between};
pub use engine::{FoldSummary, RatingEngine, RatingFold};
pub use kfactor::{close_loss_credit, expected_score, k_factor};
pub use storage::{InMemoryRepository, MockRepository, RatingRepository, RepositoryOp};
