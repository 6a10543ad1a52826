//! Composite K-factor and close-loss credit
//!
//! K is the base multiplied by four independent factors: decision tier,
//! margin of victory, fall quickness and expected outcome.

use crate::config::RatingConfig;
use crate::types::{DecisionKind, KFactorBreakdown, Outcome};
use skillratings::elo::{expected_score as elo_expected, EloRating};

/// Probability that `rating` beats `opponent` on the logistic curve
pub fn expected_score(rating: f64, opponent: f64) -> f64 {
    let (expected, _) = elo_expected(
        &EloRating { rating },
        &EloRating { rating: opponent },
    );
    expected
}

/// Decision tier multiplier
pub fn kind_multiplier(kind: &DecisionKind, config: &RatingConfig) -> f64 {
    let k = &config.kind;
    match kind {
        DecisionKind::Fall => k.fall,
        DecisionKind::Forfeit | DecisionKind::Disqualification => k.forfeit,
        DecisionKind::TechFall | DecisionKind::MajorDecision | DecisionKind::Overtime => {
            k.dominant
        }
        DecisionKind::Decision => k.decision,
        DecisionKind::Bye | DecisionKind::DoubleForfeit | DecisionKind::Unknown(_) => k.unknown,
    }
}

/// Margin-of-victory multiplier; falls and forfeits ignore the score
pub fn margin_multiplier(kind: &DecisionKind, margin: Option<u32>, config: &RatingConfig) -> f64 {
    let Some(margin) = margin else {
        return 1.0;
    };
    let m = &config.margin;
    let points = margin as f64;
    match kind {
        DecisionKind::TechFall | DecisionKind::MajorDecision | DecisionKind::Overtime => {
            1.0 + (m.dominant_per_point * points).min(m.dominant_cap)
        }
        DecisionKind::Decision => 1.0 + (m.decision_per_point * points).min(m.decision_cap),
        _ => 1.0,
    }
}

/// Bonus for early falls, linear from `max_bonus` at 0:00 to none at the reference
pub fn quickness_multiplier(
    kind: &DecisionKind,
    fall_seconds: Option<u32>,
    config: &RatingConfig,
) -> f64 {
    match (kind, fall_seconds) {
        (DecisionKind::Fall, Some(seconds)) => {
            let q = &config.quickness;
            let remaining = 1.0 - seconds as f64 / q.reference_seconds as f64;
            1.0 + q.max_bonus * remaining.clamp(0.0, 1.0)
        }
        _ => 1.0,
    }
}

/// Damp lopsided wins, amplify upsets
///
/// Continuous in the winner's expectation: flat at 1.0 between the upset and
/// favorite thresholds, a gentle ramp below the upset threshold that steepens
/// below the big-upset threshold to reach the cap at zero.
pub fn expected_multiplier(expected_winner: f64, config: &RatingConfig) -> f64 {
    let e = &config.expected;
    let ea = expected_winner.clamp(0.0, 1.0);

    if ea >= e.favorite_threshold {
        (1.0 - e.favorite_slope * (ea - e.favorite_threshold)).max(e.favorite_floor)
    } else if ea > e.upset_threshold {
        1.0
    } else if ea > e.big_upset_threshold {
        1.0 + e.upset_slope * (e.upset_threshold - ea)
    } else {
        let at_big = 1.0 + e.upset_slope * (e.upset_threshold - e.big_upset_threshold);
        let depth = (e.big_upset_threshold - ea) / e.big_upset_threshold;
        (at_big + (e.upset_cap - at_big) * depth).min(e.upset_cap)
    }
}

/// Full K-factor for a rated contest
pub fn k_factor(outcome: &Outcome, expected_winner: f64, config: &RatingConfig) -> KFactorBreakdown {
    let kind = &outcome.decision_kind;
    let kind_mult = kind_multiplier(kind, config);
    let margin_mult = if *kind == DecisionKind::Fall {
        1.0
    } else {
        margin_multiplier(kind, outcome.margin(), config)
    };
    let quick_mult = quickness_multiplier(kind, outcome.fall_seconds, config);
    let expected_mult = expected_multiplier(expected_winner, config);

    KFactorBreakdown {
        base: config.base_k,
        kind_mult,
        margin_mult,
        quick_mult,
        expected_mult,
        applied: config.base_k * kind_mult * margin_mult * quick_mult * expected_mult,
    }
}

/// Actual-score credit for an underdog who lost narrowly to a higher-rated winner
///
/// `winner_pre` and `loser_pre` are the ratings after cooldown. Returns zero for
/// falls, forfeits, disqualifications and tech falls, and whenever the loser
/// was not the lower-rated side.
pub fn close_loss_credit(
    outcome: &Outcome,
    winner_pre: f64,
    loser_pre: f64,
    config: &RatingConfig,
) -> f64 {
    let c = &config.close_loss;
    if !c.enabled {
        return 0.0;
    }
    let kind = &outcome.decision_kind;
    if matches!(
        kind,
        DecisionKind::Fall
            | DecisionKind::Forfeit
            | DecisionKind::Disqualification
            | DecisionKind::TechFall
    ) {
        return 0.0;
    }

    let gap = winner_pre - loser_pre;
    if gap <= 0.0 {
        return 0.0;
    }

    let closeness = if *kind == DecisionKind::Overtime {
        1.0
    } else {
        match outcome.margin() {
            Some(margin) => ((c.margin_window - margin as f64) / c.margin_window).clamp(0.0, 1.0),
            None => 0.0,
        }
    };
    if closeness <= 0.0 {
        return 0.0;
    }

    let gap_factor = (gap / c.gap_scale).clamp(0.0, 1.0);
    (c.max_credit * closeness * gap_factor).min(c.max_credit) * c.damping
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(kind: DecisionKind, score: Option<(u32, u32)>, fall: Option<u32>) -> Outcome {
        Outcome {
            decision_kind: kind,
            winner_points: score.map(|s| s.0),
            loser_points: score.map(|s| s.1),
            fall_seconds: fall,
            ..Default::default()
        }
    }

    #[test]
    fn test_expected_score_is_logistic() {
        assert!((expected_score(1000.0, 1000.0) - 0.5).abs() < 1e-12);
        let favored = expected_score(1400.0, 1000.0);
        assert!((favored - 10.0 / 11.0).abs() < 1e-9);
        assert!((favored + expected_score(1000.0, 1400.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_kind_tiers() {
        let config = RatingConfig::default();
        assert_eq!(kind_multiplier(&DecisionKind::Fall, &config), 1.75);
        assert_eq!(kind_multiplier(&DecisionKind::Disqualification, &config), 1.75);
        assert_eq!(kind_multiplier(&DecisionKind::Overtime, &config), 1.30);
        assert_eq!(kind_multiplier(&DecisionKind::Decision, &config), 1.0);
        assert_eq!(kind_multiplier(&DecisionKind::Unknown("x".into()), &config), 1.0);
    }

    #[test]
    fn test_margin_is_capped() {
        let config = RatingConfig::default();
        let dec = margin_multiplier(&DecisionKind::Decision, Some(5), &config);
        assert!((dec - 1.2).abs() < 1e-12);
        let dec_cap = margin_multiplier(&DecisionKind::Decision, Some(40), &config);
        assert!((dec_cap - 1.5).abs() < 1e-12);
        let tf_cap = margin_multiplier(&DecisionKind::TechFall, Some(17), &config);
        assert!((tf_cap - 1.6).abs() < 1e-12);
        assert_eq!(margin_multiplier(&DecisionKind::Decision, None, &config), 1.0);
    }

    #[test]
    fn test_quicker_fall_weighs_more() {
        let config = RatingConfig::default();
        let fast = quickness_multiplier(&DecisionKind::Fall, Some(30), &config);
        let slow = quickness_multiplier(&DecisionKind::Fall, Some(170), &config);
        assert!(fast > slow);
        assert_eq!(quickness_multiplier(&DecisionKind::Fall, Some(300), &config), 1.0);
        assert!((quickness_multiplier(&DecisionKind::Fall, Some(0), &config) - 1.3).abs() < 1e-12);
        assert_eq!(quickness_multiplier(&DecisionKind::Decision, Some(30), &config), 1.0);
    }

    #[test]
    fn test_expected_multiplier_shape() {
        let config = RatingConfig::default();
        assert_eq!(expected_multiplier(0.5, &config), 1.0);
        assert!((expected_multiplier(0.9, &config) - 0.65).abs() < 1e-12);
        assert_eq!(expected_multiplier(1.0, &config), 0.30);
        assert!((expected_multiplier(0.3, &config) - 1.15).abs() < 1e-12);
        assert!((expected_multiplier(0.0, &config) - 2.5).abs() < 1e-12);

        // no jump at the big-upset threshold
        let above = expected_multiplier(0.25 + 1e-9, &config);
        let below = expected_multiplier(0.25 - 1e-9, &config);
        assert!((above - below).abs() < 1e-6);
    }

    #[test]
    fn test_fall_ignores_margin() {
        let config = RatingConfig::default();
        let mut fall = outcome(DecisionKind::Fall, None, Some(180));
        fall.winner_points = Some(10);
        fall.loser_points = Some(0);
        let k = k_factor(&fall, 0.5, &config);
        assert_eq!(k.margin_mult, 1.0);
        assert!((k.applied - 48.0 * 1.75).abs() < 1e-9);
    }

    #[test]
    fn test_k_factor_product() {
        let config = RatingConfig::default();
        let dec = outcome(DecisionKind::Decision, Some((7, 2)), None);
        let k = k_factor(&dec, 0.5, &config);
        assert!((k.applied - 48.0 * 1.2).abs() < 1e-9);
        assert_eq!(k.base, 48.0);
    }

    #[test]
    fn test_close_loss_credit() {
        let config = RatingConfig::default();
        let one_point = outcome(DecisionKind::Decision, Some((3, 2)), None);
        // half closeness, full gap: 0.25 * 0.5 * 1.0, damped by half
        let credit = close_loss_credit(&one_point, 1400.0, 1000.0, &config);
        assert!((credit - 0.0625).abs() < 1e-12);

        // underdog won: nothing
        assert_eq!(close_loss_credit(&one_point, 1000.0, 1400.0, &config), 0.0);

        let overtime = outcome(DecisionKind::Overtime, Some((3, 1)), None);
        let ot = close_loss_credit(&overtime, 1200.0, 1000.0, &config);
        assert!((ot - 0.0625).abs() < 1e-12);

        let blowout = outcome(DecisionKind::Decision, Some((8, 2)), None);
        assert_eq!(close_loss_credit(&blowout, 1400.0, 1000.0, &config), 0.0);

        let fall = outcome(DecisionKind::Fall, None, Some(60));
        assert_eq!(close_loss_credit(&fall, 1400.0, 1000.0, &config), 0.0);
    }
}
