//! Rating engine configuration
//!
//! Every constant of the K-factor, close-loss credit and cooldown lives
//! here so a replay is fully described by its input stream and this struct.

use crate::error::RatingError;
use serde::{Deserialize, Serialize};

/// Complete rating engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Rating assigned to a wrestler on first appearance
    pub initial_rating: f64,
    /// Base K before any multiplier
    pub base_k: f64,
    pub kind: KindMultipliers,
    pub margin: MarginSettings,
    pub quickness: QuicknessSettings,
    pub expected: ExpectedOutcomeSettings,
    pub close_loss: CloseLossSettings,
    pub cooldown: CooldownSettings,
}

/// Multiplier per decision tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindMultipliers {
    pub fall: f64,
    /// Forfeits, defaults and disqualifications
    pub forfeit: f64,
    /// Tech falls, major decisions and overtime wins
    pub dominant: f64,
    pub decision: f64,
    pub unknown: f64,
}

/// Margin-of-victory scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginSettings {
    pub decision_per_point: f64,
    pub decision_cap: f64,
    pub dominant_per_point: f64,
    pub dominant_cap: f64,
}

/// Bonus for early falls, interpolated over the reference window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuicknessSettings {
    pub reference_seconds: u32,
    /// Bonus for a fall at 0:00; shrinks linearly to zero at the reference time
    pub max_bonus: f64,
}

/// Breakpoints of the expected-outcome multiplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectedOutcomeSettings {
    /// Winner expectations at or above this are damped
    pub favorite_threshold: f64,
    pub favorite_slope: f64,
    pub favorite_floor: f64,
    /// Winner expectations at or below this are amplified
    pub upset_threshold: f64,
    pub upset_slope: f64,
    /// Below this the amplification steepens towards `upset_cap` at zero
    pub big_upset_threshold: f64,
    pub upset_cap: f64,
}

/// Partial credit for an underdog that lost narrowly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloseLossSettings {
    pub enabled: bool,
    pub max_credit: f64,
    /// Margins at or beyond this earn nothing
    pub margin_window: f64,
    /// Rating gap that earns the full gap factor
    pub gap_scale: f64,
    /// Final scaling applied to the computed credit
    pub damping: f64,
}

/// Convergence towards the baseline during inactivity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownSettings {
    pub enabled: bool,
    pub threshold_days: i64,
    pub rate_per_day: f64,
    pub floor: f64,
    pub baseline: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            initial_rating: 1000.0,
            base_k: 48.0,
            kind: KindMultipliers::default(),
            margin: MarginSettings::default(),
            quickness: QuicknessSettings::default(),
            expected: ExpectedOutcomeSettings::default(),
            close_loss: CloseLossSettings::default(),
            cooldown: CooldownSettings::default(),
        }
    }
}

impl Default for KindMultipliers {
    fn default() -> Self {
        Self {
            fall: 1.75,
            forfeit: 1.75,
            dominant: 1.30,
            decision: 1.00,
            unknown: 1.00,
        }
    }
}

impl Default for MarginSettings {
    fn default() -> Self {
        Self {
            decision_per_point: 0.04,
            decision_cap: 0.50,
            dominant_per_point: 0.05,
            dominant_cap: 0.60,
        }
    }
}

impl Default for QuicknessSettings {
    fn default() -> Self {
        Self {
            reference_seconds: 180, // one regulation period
            max_bonus: 0.30,
        }
    }
}

impl Default for ExpectedOutcomeSettings {
    fn default() -> Self {
        Self {
            favorite_threshold: 0.80,
            favorite_slope: 3.5,
            favorite_floor: 0.30,
            upset_threshold: 0.40,
            upset_slope: 1.5,
            big_upset_threshold: 0.25,
            upset_cap: 2.5,
        }
    }
}

impl Default for CloseLossSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_credit: 0.25,
            margin_window: 2.0,
            gap_scale: 400.0,
            damping: 0.5,
        }
    }
}

impl Default for CooldownSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_days: 90,
            rate_per_day: 0.01 / 90.0, // 1% per 90 days
            floor: 800.0,
            baseline: 1000.0,
        }
    }
}

fn invalid(message: &str) -> anyhow::Error {
    RatingError::ConfigurationError {
        message: message.to_string(),
    }
    .into()
}

impl RatingConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> crate::error::Result<()> {
        if !(self.initial_rating.is_finite() && self.initial_rating > 0.0) {
            return Err(invalid("Initial rating must be positive"));
        }
        if !(self.base_k.is_finite() && self.base_k > 0.0) {
            return Err(invalid("Base K must be positive"));
        }

        let kinds = [
            self.kind.fall,
            self.kind.forfeit,
            self.kind.dominant,
            self.kind.decision,
            self.kind.unknown,
        ];
        if kinds.iter().any(|m| !(m.is_finite() && *m > 0.0)) {
            return Err(invalid("Decision kind multipliers must be positive"));
        }

        let margins = [
            self.margin.decision_per_point,
            self.margin.decision_cap,
            self.margin.dominant_per_point,
            self.margin.dominant_cap,
        ];
        if margins.iter().any(|m| *m < 0.0) {
            return Err(invalid("Margin settings must be non-negative"));
        }

        if self.quickness.reference_seconds == 0 {
            return Err(invalid("Fall reference window must be greater than 0"));
        }
        if self.quickness.max_bonus < 0.0 {
            return Err(invalid("Fall quickness bonus must be non-negative"));
        }

        let e = &self.expected;
        if !(0.0 < e.big_upset_threshold
            && e.big_upset_threshold <= e.upset_threshold
            && e.upset_threshold < e.favorite_threshold
            && e.favorite_threshold < 1.0)
        {
            return Err(invalid(
                "Expected-outcome thresholds must satisfy 0 < big upset <= upset < favorite < 1",
            ));
        }
        if e.favorite_floor <= 0.0 || e.favorite_floor > 1.0 {
            return Err(invalid("Favorite floor must be in (0, 1]"));
        }
        if e.upset_slope < 0.0 || e.favorite_slope < 0.0 {
            return Err(invalid("Expected-outcome slopes must be non-negative"));
        }
        let at_big_upset = 1.0 + e.upset_slope * (e.upset_threshold - e.big_upset_threshold);
        if e.upset_cap < at_big_upset {
            return Err(invalid("Upset cap must not be below the upset ramp"));
        }

        let c = &self.close_loss;
        if !(0.0..=0.5).contains(&c.max_credit) {
            return Err(invalid("Close-loss credit must be in [0, 0.5]"));
        }
        if c.margin_window <= 0.0 || c.gap_scale <= 0.0 {
            return Err(invalid("Close-loss window and gap scale must be positive"));
        }
        if !(0.0..=1.0).contains(&c.damping) {
            return Err(invalid("Close-loss damping must be in [0, 1]"));
        }

        let cd = &self.cooldown;
        if cd.threshold_days < 0 {
            return Err(invalid("Cooldown threshold must be non-negative"));
        }
        if cd.rate_per_day < 0.0 {
            return Err(invalid("Cooldown rate must be non-negative"));
        }
        if cd.floor > cd.baseline {
            return Err(invalid("Cooldown floor must not exceed the baseline"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RatingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_k() {
        let config = RatingConfig {
            base_k: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_floor_above_baseline() {
        let mut config = RatingConfig::default();
        config.cooldown.floor = 1200.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unordered_thresholds() {
        let mut config = RatingConfig::default();
        config.expected.upset_threshold = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RatingConfig = toml::from_str(
            r#"
            base_k = 32.0

            [cooldown]
            threshold_days = 120
            "#,
        )
        .unwrap();

        assert_eq!(config.base_k, 32.0);
        assert_eq!(config.cooldown.threshold_days, 120);
        assert_eq!(config.cooldown.baseline, 1000.0);
        assert_eq!(config.kind.fall, 1.75);
    }
}
