//! Inactivity cooldown
//!
//! A wrestler idle for longer than the threshold drifts towards the baseline
//! in proportion to the excess idle days. The drift never pushes a rating
//! below the floor and never crosses the baseline.

use crate::config::CooldownSettings;
use crate::utils::days_between;
use chrono::NaiveDate;

/// Rating after an idle spell of `idle_days`
pub fn apply_cooldown(rating: f64, idle_days: i64, settings: &CooldownSettings) -> f64 {
    if !settings.enabled || idle_days <= settings.threshold_days {
        return rating;
    }

    let excess = (idle_days - settings.threshold_days) as f64;
    let factor = (1.0 - settings.rate_per_day * excess).clamp(0.0, 1.0);
    let converged = settings.baseline + (rating - settings.baseline) * factor;

    // Ratings already under the floor stay where they are
    converged.max(settings.floor.min(rating))
}

/// Cooldown between the last contest and `current`, if both dates are known
pub fn cooldown_between(
    rating: f64,
    last_match: Option<NaiveDate>,
    current: Option<NaiveDate>,
    settings: &CooldownSettings,
) -> f64 {
    match (last_match, current) {
        (Some(last), Some(now)) => apply_cooldown(rating, days_between(last, now), settings),
        _ => rating,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CooldownSettings {
        CooldownSettings::default()
    }

    #[test]
    fn test_within_threshold_is_untouched() {
        assert_eq!(apply_cooldown(1200.0, 0, &settings()), 1200.0);
        assert_eq!(apply_cooldown(1200.0, 90, &settings()), 1200.0);
    }

    #[test]
    fn test_decays_towards_baseline() {
        // 180 idle days: 90 excess days, 1% of the distance
        let decayed = apply_cooldown(1200.0, 180, &settings());
        assert!((decayed - 1198.0).abs() < 1e-9);

        let below = apply_cooldown(900.0, 180, &settings());
        assert!((below - 901.0).abs() < 1e-9);
    }

    #[test]
    fn test_never_crosses_baseline() {
        let decayed = apply_cooldown(1200.0, 90 + 100_000, &settings());
        assert_eq!(decayed, 1000.0);
    }

    #[test]
    fn test_floor_holds() {
        let s = CooldownSettings {
            baseline: 700.0,
            floor: 800.0,
            ..settings()
        };
        assert_eq!(apply_cooldown(850.0, 90 + 100_000, &s), 800.0);
        // already below the floor: never lifted to it
        assert_eq!(apply_cooldown(750.0, 90 + 100_000, &s), 750.0);
    }

    #[test]
    fn test_disabled() {
        let s = CooldownSettings {
            enabled: false,
            ..settings()
        };
        assert_eq!(apply_cooldown(1500.0, 10_000, &s), 1500.0);
    }

    #[test]
    fn test_missing_dates() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1);
        assert_eq!(cooldown_between(1200.0, None, day, &settings()), 1200.0);
        assert_eq!(cooldown_between(1200.0, day, None, &settings()), 1200.0);
    }
}
