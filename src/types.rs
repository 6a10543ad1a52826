//! Common types used throughout the rating pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Canonical competitor name, the key of every rating record
pub type WrestlerName = String;

/// How a contest was decided
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "code")]
pub enum DecisionKind {
    Bye,
    DoubleForfeit,
    Forfeit,
    Disqualification,
    Decision,
    MajorDecision,
    TechFall,
    Fall,
    /// Sudden victory, tiebreaker periods and ultimate tiebreaker
    Overtime,
    /// Anything the lookup tables do not know, carrying the raw phrase or code
    Unknown(String),
}

impl DecisionKind {
    /// Contests that never happened and must not move ratings
    pub fn is_no_contest(&self) -> bool {
        matches!(self, DecisionKind::Bye | DecisionKind::DoubleForfeit)
    }

    /// Short stable label, used for metrics and logs
    pub fn label(&self) -> &'static str {
        match self {
            DecisionKind::Bye => "bye",
            DecisionKind::DoubleForfeit => "double_forfeit",
            DecisionKind::Forfeit => "forfeit",
            DecisionKind::Disqualification => "disqualification",
            DecisionKind::Decision => "decision",
            DecisionKind::MajorDecision => "major_decision",
            DecisionKind::TechFall => "tech_fall",
            DecisionKind::Fall => "fall",
            DecisionKind::Overtime => "overtime",
            DecisionKind::Unknown(_) => "unknown",
        }
    }
}

impl Default for DecisionKind {
    fn default() -> Self {
        DecisionKind::Unknown(String::new())
    }
}

impl std::fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionKind::Unknown(raw) if !raw.is_empty() => write!(f, "unknown ({})", raw),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// Structured result of classifying one contest line
///
/// Points are either both present or both absent, and never coexist with
/// `fall_seconds`. Byes carry no points and no fall time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub weight_class: Option<String>,
    pub round_label: Option<String>,
    pub winner_name: Option<String>,
    pub winner_team: Option<String>,
    pub loser_name: Option<String>,
    pub loser_team: Option<String>,
    pub decision_kind: DecisionKind,
    /// Raw short code as printed, e.g. "TF-1.5" or "SV-1"
    pub decision_code: Option<String>,
    pub winner_points: Option<u32>,
    pub loser_points: Option<u32>,
    pub fall_seconds: Option<u32>,
    pub is_bye: bool,
}

impl Outcome {
    /// Point differential when a score was recorded
    pub fn margin(&self) -> Option<u32> {
        match (self.winner_points, self.loser_points) {
            (Some(w), Some(l)) => Some(w.saturating_sub(l)),
            _ => None,
        }
    }

    /// Whether the classifier recovered at least a winner
    pub fn is_parsed(&self) -> bool {
        self.winner_name.is_some()
    }

    /// Drop everything that only makes sense for a contested bout
    pub(crate) fn mark_bye(&mut self, kind: DecisionKind, code: &str) {
        self.decision_kind = kind;
        self.decision_code = Some(code.to_string());
        self.is_bye = true;
        self.clear_result();
    }

    pub(crate) fn clear_result(&mut self) {
        self.winner_points = None;
        self.loser_points = None;
        self.fall_seconds = None;
    }
}

/// One contest line as handed over by the scraper, before classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawContest {
    pub event_id: String,
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
    #[serde(default)]
    pub weight_class: Option<String>,
    pub text: String,
}

/// A classified outcome tagged with its event context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestRecord {
    /// Assigned at classification time; the final tie-break between contests
    pub sequence: u64,
    pub event_id: String,
    pub event_date: Option<NaiveDate>,
    pub outcome: Outcome,
}

/// Side of a contest a history row describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Winner,
    Loser,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Winner => write!(f, "W"),
            Role::Loser => write!(f, "L"),
        }
    }
}

/// Running rating record for one wrestler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingState {
    pub name: WrestlerName,
    pub rating: f64,
    pub matches_played: u32,
    pub wins: u32,
    pub wins_by_fall: u32,
    pub losses: u32,
    pub losses_by_fall: u32,
    pub disqualifications: u32,
    pub best_rating: Option<f64>,
    pub best_rating_date: Option<NaiveDate>,
    pub last_match_date: Option<NaiveDate>,
    pub last_event_id: Option<String>,
    pub last_team: Option<String>,
    pub last_opponent: Option<String>,
    pub last_adjustment: f64,
    pub opponent_rating_sum: f64,
    pub opponent_count: u32,
}

impl RatingState {
    /// Create a fresh record at the given starting rating
    pub fn new(name: impl Into<WrestlerName>, initial_rating: f64) -> Self {
        Self {
            name: name.into(),
            rating: initial_rating,
            matches_played: 0,
            wins: 0,
            wins_by_fall: 0,
            losses: 0,
            losses_by_fall: 0,
            disqualifications: 0,
            best_rating: None,
            best_rating_date: None,
            last_match_date: None,
            last_event_id: None,
            last_team: None,
            last_opponent: None,
            last_adjustment: 0.0,
            opponent_rating_sum: 0.0,
            opponent_count: 0,
        }
    }

    /// Mean pre-contest rating of rated opponents
    pub fn opponent_average(&self) -> Option<f64> {
        if self.opponent_count == 0 {
            None
        } else {
            Some(self.opponent_rating_sum / self.opponent_count as f64)
        }
    }

    /// Record a new peak if the current rating beats the previous one
    pub(crate) fn note_peak(&mut self, date: Option<NaiveDate>) {
        if self.best_rating.map_or(true, |best| self.rating > best) {
            self.best_rating = Some(self.rating);
            self.best_rating_date = date;
        }
    }
}

/// The multipliers that made up one contest's K-factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KFactorBreakdown {
    pub base: f64,
    pub kind_mult: f64,
    pub margin_mult: f64,
    pub quick_mult: f64,
    pub expected_mult: f64,
    /// Product of the base and every multiplier
    pub applied: f64,
}

impl KFactorBreakdown {
    /// Breakdown for contests that never move ratings
    pub fn neutral() -> Self {
        Self {
            base: 0.0,
            kind_mult: 1.0,
            margin_mult: 1.0,
            quick_mult: 1.0,
            expected_mult: 1.0,
            applied: 0.0,
        }
    }
}

/// Audit row for one participant of one contest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Position in the fold, strictly increasing across a replay
    pub sequence: u64,
    pub contest_sequence: u64,
    pub role: Role,
    pub name: WrestlerName,
    pub team: Option<String>,
    pub event_id: String,
    pub event_date: Option<NaiveDate>,
    pub weight_class: Option<String>,
    pub round_label: Option<String>,
    pub round_rank: u32,
    pub opponent_name: Option<String>,
    pub opponent_team: Option<String>,
    pub opponent_pre_rating: Option<f64>,
    pub opponent_post_rating: Option<f64>,
    pub pre_rating: f64,
    pub post_rating: f64,
    pub adjustment: f64,
    pub expected_score: f64,
    pub k_factor: KFactorBreakdown,
    pub decision_kind: DecisionKind,
    pub decision_code: Option<String>,
    pub margin: Option<u32>,
    pub fall_seconds: Option<u32>,
    pub is_bye: bool,
    /// Matches this wrestler had played before this contest
    pub previous_matches: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin_requires_both_scores() {
        let mut outcome = Outcome {
            winner_points: Some(7),
            loser_points: Some(2),
            ..Default::default()
        };
        assert_eq!(outcome.margin(), Some(5));

        outcome.loser_points = None;
        assert_eq!(outcome.margin(), None);
    }

    #[test]
    fn test_mark_bye_clears_result() {
        let mut outcome = Outcome {
            winner_points: Some(3),
            loser_points: Some(1),
            fall_seconds: None,
            ..Default::default()
        };
        outcome.mark_bye(DecisionKind::Bye, "Bye");

        assert!(outcome.is_bye);
        assert_eq!(outcome.decision_code.as_deref(), Some("Bye"));
        assert!(outcome.winner_points.is_none());
        assert!(outcome.loser_points.is_none());
    }

    #[test]
    fn test_peak_only_moves_up() {
        let mut state = RatingState::new("Jane Doe", 1000.0);
        let day = NaiveDate::from_ymd_opt(2024, 1, 6);
        state.note_peak(day);
        assert_eq!(state.best_rating, Some(1000.0));

        state.rating = 990.0;
        state.note_peak(NaiveDate::from_ymd_opt(2024, 1, 13));
        assert_eq!(state.best_rating, Some(1000.0));
        assert_eq!(state.best_rating_date, day);
    }

    #[test]
    fn test_opponent_average() {
        let mut state = RatingState::new("Jane Doe", 1000.0);
        assert!(state.opponent_average().is_none());

        state.opponent_rating_sum = 2100.0;
        state.opponent_count = 2;
        assert_eq!(state.opponent_average(), Some(1050.0));
    }

    #[test]
    fn test_no_contest_kinds() {
        assert!(DecisionKind::Bye.is_no_contest());
        assert!(DecisionKind::DoubleForfeit.is_no_contest());
        assert!(!DecisionKind::Forfeit.is_no_contest());
        assert_eq!(DecisionKind::Unknown("rt".into()).to_string(), "unknown (rt)");
    }
}
