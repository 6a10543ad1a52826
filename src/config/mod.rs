//! Configuration management
//!
//! Application settings and rating engine constants, loadable from TOML files
//! and environment variables.

pub mod app;
pub mod rating;

pub use app::{validate_config, AppConfig, ServiceSettings};
pub use rating::{
    CloseLossSettings, CooldownSettings, ExpectedOutcomeSettings, KindMultipliers,
    MarginSettings, QuicknessSettings, RatingConfig,
};
