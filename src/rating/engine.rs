//! Sequential rating fold
//!
//! Ratings are path-dependent: the fold must see contests in stream order and
//! always starts from the book it is handed. It never fails; contests it cannot
//! rate are skipped with a warning.

use crate::config::RatingConfig;
use crate::ordering::{MatchStream, SequencedContest};
use crate::rating::book::RatingBook;
use crate::rating::cooldown::cooldown_between;
use crate::rating::kfactor::{close_loss_credit, expected_score, k_factor};
use crate::types::{DecisionKind, HistoryEntry, KFactorBreakdown, RatingState, Role};
use chrono::NaiveDate;
use tracing::{debug, warn};

/// Counts of what a fold did with each contest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FoldSummary {
    /// Contests between two rated wrestlers
    pub rated: usize,
    /// Wins with no opponent on record, rated against a phantom opponent
    pub walkovers: usize,
    pub byes: usize,
    pub skipped: usize,
}

impl FoldSummary {
    pub fn total(&self) -> usize {
        self.rated + self.walkovers + self.byes + self.skipped
    }
}

/// Rating engine holding the validated configuration
#[derive(Debug, Clone, Default)]
pub struct RatingEngine {
    config: RatingConfig,
}

impl RatingEngine {
    /// Create a new engine; the configuration is validated first
    pub fn new(config: RatingConfig) -> crate::error::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    /// Begin an incremental fold over `initial`
    pub fn start(&self, initial: RatingBook) -> RatingFold<'_> {
        RatingFold {
            config: &self.config,
            book: initial,
            next_sequence: 0,
            summary: FoldSummary::default(),
        }
    }

    /// Fold a whole stream, returning the final book and the audit trail
    pub fn fold(&self, stream: &MatchStream, initial: RatingBook) -> (RatingBook, Vec<HistoryEntry>) {
        let mut fold = self.start(initial);
        let mut history = Vec::with_capacity(stream.len() * 2);
        for contest in stream {
            history.extend(fold.apply(contest));
        }
        (fold.into_book(), history)
    }
}

/// One participant's view of a contest, for history rows
struct Side<'a> {
    name: &'a str,
    team: Option<&'a str>,
    pre: f64,
    post: f64,
    previous_matches: u32,
}

/// An in-progress fold; apply contests one at a time in stream order
#[derive(Debug)]
pub struct RatingFold<'e> {
    config: &'e RatingConfig,
    book: RatingBook,
    next_sequence: u64,
    summary: FoldSummary,
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl<'e> RatingFold<'e> {
    pub fn book(&self) -> &RatingBook {
        &self.book
    }

    pub fn summary(&self) -> FoldSummary {
        self.summary
    }

    pub fn into_book(self) -> RatingBook {
        self.book
    }

    /// Apply one contest, returning the history rows it produced
    ///
    /// Skipped contests produce no rows.
    pub fn apply(&mut self, contest: &SequencedContest) -> Vec<HistoryEntry> {
        let outcome = &contest.record.outcome;
        let Some(winner) = present(outcome.winner_name.as_ref()) else {
            warn!(
                "Skipping contest {} of event {}: no winner",
                contest.record.sequence, contest.record.event_id
            );
            self.summary.skipped += 1;
            return Vec::new();
        };
        let loser = present(outcome.loser_name.as_ref());

        if loser == Some(winner) {
            warn!(
                "Skipping contest {} of event {}: {} listed on both sides",
                contest.record.sequence, contest.record.event_id, winner
            );
            self.summary.skipped += 1;
            return Vec::new();
        }

        if outcome.is_bye || outcome.decision_kind.is_no_contest() {
            self.summary.byes += 1;
            return self.apply_bye(contest, winner, loser);
        }

        match loser {
            Some(loser) => {
                self.summary.rated += 1;
                self.apply_rated(contest, winner, loser)
            }
            None => {
                self.summary.walkovers += 1;
                self.apply_walkover(contest, winner)
            }
        }
    }

    fn apply_rated(&mut self, contest: &SequencedContest, winner: &str, loser: &str) -> Vec<HistoryEntry> {
        let config = self.config;
        let record = &contest.record;
        let outcome = &record.outcome;
        let date = record.event_date;

        let wi = self.book.get_or_create(winner, config.initial_rating);
        let li = self.book.get_or_create(loser, config.initial_rating);
        let (w, l) = self.book.pair_mut(wi, li);
        cool_down(w, date, config);
        cool_down(l, date, config);

        let (w_pre, l_pre) = (w.rating, l.rating);
        let (w_prev, l_prev) = (w.matches_played, l.matches_played);

        let expected = expected_score(w_pre, l_pre);
        let k = k_factor(outcome, expected, config);
        let credit = close_loss_credit(outcome, w_pre, l_pre, config);
        let delta = k.applied * (1.0 - credit - expected);

        let is_fall = outcome.decision_kind == DecisionKind::Fall;
        let is_dq = outcome.decision_kind == DecisionKind::Disqualification;
        let winner_team = present(outcome.winner_team.as_ref());
        let loser_team = present(outcome.loser_team.as_ref());

        w.rating = w_pre + delta;
        l.rating = l_pre - delta;

        w.wins += 1;
        l.losses += 1;
        if is_fall {
            w.wins_by_fall += 1;
            l.losses_by_fall += 1;
        }
        if is_dq {
            w.disqualifications += 1;
            l.disqualifications += 1;
        }
        w.opponent_rating_sum += l_pre;
        w.opponent_count += 1;
        l.opponent_rating_sum += w_pre;
        l.opponent_count += 1;

        touch(w, record.event_id.as_str(), date, winner_team, Some(loser), delta);
        touch(l, record.event_id.as_str(), date, loser_team, Some(winner), -delta);

        debug!(
            "{} over {} ({}): expected {:.3}, K {:.2}, credit {:.3}, delta {:+.2}",
            winner, loser, outcome.decision_kind, expected, k.applied, credit, delta
        );

        let winner_side = Side {
            name: winner,
            team: winner_team,
            pre: w_pre,
            post: w_pre + delta,
            previous_matches: w_prev,
        };
        let loser_side = Side {
            name: loser,
            team: loser_team,
            pre: l_pre,
            post: l_pre - delta,
            previous_matches: l_prev,
        };
        vec![
            self.entry(contest, Role::Winner, &winner_side, Some(&loser_side), expected, k),
            self.entry(contest, Role::Loser, &loser_side, Some(&winner_side), 1.0 - expected, k),
        ]
    }

    /// A forfeit or default with nobody on the other side
    ///
    /// The winner is rated against an unrecorded opponent at the initial
    /// rating; no record is created for that opponent.
    fn apply_walkover(&mut self, contest: &SequencedContest, winner: &str) -> Vec<HistoryEntry> {
        let config = self.config;
        let record = &contest.record;
        let outcome = &record.outcome;
        let date = record.event_date;
        let phantom = config.initial_rating;

        let wi = self.book.get_or_create(winner, config.initial_rating);
        let w = self.book.state_mut(wi);
        cool_down(w, date, config);

        let w_pre = w.rating;
        let w_prev = w.matches_played;
        let expected = expected_score(w_pre, phantom);
        let k = k_factor(outcome, expected, config);
        let credit = close_loss_credit(outcome, w_pre, phantom, config);
        let delta = k.applied * (1.0 - credit - expected);

        let winner_team = present(outcome.winner_team.as_ref());
        w.rating = w_pre + delta;
        w.wins += 1;
        if outcome.decision_kind == DecisionKind::Disqualification {
            w.disqualifications += 1;
        }
        touch(w, record.event_id.as_str(), date, winner_team, None, delta);

        debug!(
            "{} by {} with no opponent: K {:.2}, delta {:+.2}",
            winner, outcome.decision_kind, k.applied, delta
        );

        let side = Side {
            name: winner,
            team: winner_team,
            pre: w_pre,
            post: w_pre + delta,
            previous_matches: w_prev,
        };
        let mut entry = self.entry(contest, Role::Winner, &side, None, expected, k);
        entry.opponent_pre_rating = Some(phantom);
        entry.opponent_post_rating = Some(phantom);
        vec![entry]
    }

    /// Byes and double forfeits: counted as appearances, no rating change
    ///
    /// Inactivity cooldown still applies before the appearance is recorded.
    fn apply_bye(
        &mut self,
        contest: &SequencedContest,
        winner: &str,
        loser: Option<&str>,
    ) -> Vec<HistoryEntry> {
        let config = self.config;
        let record = &contest.record;
        let outcome = &record.outcome;
        let date = record.event_date;
        let winner_team = present(outcome.winner_team.as_ref());
        let loser_team = present(outcome.loser_team.as_ref());

        let wi = self.book.get_or_create(winner, config.initial_rating);
        let li = loser.map(|name| self.book.get_or_create(name, config.initial_rating));

        // the bye moves last_match_date, so any pending decay lands first
        cool_down(self.book.state_mut(wi), date, config);
        if let Some(idx) = li {
            cool_down(self.book.state_mut(idx), date, config);
        }

        let w_state = self.book.state(wi);
        let winner_side = Side {
            name: winner,
            team: winner_team,
            pre: w_state.rating,
            post: w_state.rating,
            previous_matches: w_state.matches_played,
        };
        let loser_side = li.zip(loser).map(|(idx, name)| {
            let state = self.book.state(idx);
            Side {
                name,
                team: loser_team,
                pre: state.rating,
                post: state.rating,
                previous_matches: state.matches_played,
            }
        });

        let expected = match &loser_side {
            Some(l) => expected_score(winner_side.pre, l.pre),
            None => 1.0,
        };

        let w = self.book.state_mut(wi);
        w.matches_played += 1;
        stamp(w, record.event_id.as_str(), date, winner_team, loser);
        if let Some(idx) = li {
            let l = self.book.state_mut(idx);
            l.matches_played += 1;
            stamp(l, record.event_id.as_str(), date, loser_team, Some(winner));
        }

        debug!(
            "{} ({}) recorded without rating change",
            outcome.decision_kind,
            loser.map_or_else(|| winner.to_string(), |l| format!("{} / {}", winner, l))
        );

        let neutral = KFactorBreakdown::neutral();
        let mut entries = vec![self.entry(
            contest,
            Role::Winner,
            &winner_side,
            loser_side.as_ref(),
            expected,
            neutral,
        )];
        if let Some(l) = &loser_side {
            entries.push(self.entry(contest, Role::Loser, l, Some(&winner_side), 1.0 - expected, neutral));
        }
        entries
    }

    fn entry(
        &mut self,
        contest: &SequencedContest,
        role: Role,
        me: &Side<'_>,
        opponent: Option<&Side<'_>>,
        expected: f64,
        k: KFactorBreakdown,
    ) -> HistoryEntry {
        self.next_sequence += 1;
        let record = &contest.record;
        let outcome = &record.outcome;
        HistoryEntry {
            sequence: self.next_sequence,
            contest_sequence: record.sequence,
            role,
            name: me.name.to_string(),
            team: me.team.map(str::to_string),
            event_id: record.event_id.clone(),
            event_date: record.event_date,
            weight_class: outcome.weight_class.clone(),
            round_label: outcome.round_label.clone(),
            round_rank: contest.round_rank,
            opponent_name: opponent.map(|o| o.name.to_string()),
            opponent_team: opponent.and_then(|o| o.team.map(str::to_string)),
            opponent_pre_rating: opponent.map(|o| o.pre),
            opponent_post_rating: opponent.map(|o| o.post),
            pre_rating: me.pre,
            post_rating: me.post,
            adjustment: me.post - me.pre,
            expected_score: expected,
            k_factor: k,
            decision_kind: outcome.decision_kind.clone(),
            decision_code: outcome.decision_code.clone(),
            margin: outcome.margin(),
            fall_seconds: outcome.fall_seconds,
            is_bye: outcome.is_bye || outcome.decision_kind.is_no_contest(),
            previous_matches: me.previous_matches,
        }
    }
}

fn cool_down(state: &mut RatingState, date: Option<NaiveDate>, config: &RatingConfig) {
    let cooled = cooldown_between(state.rating, state.last_match_date, date, &config.cooldown);
    if cooled != state.rating {
        debug!(
            "Cooldown applied to {}: {:.1} -> {:.1}",
            state.name, state.rating, cooled
        );
        state.rating = cooled;
    }
}

/// Bookkeeping shared by every contest a wrestler appears in
fn stamp(
    state: &mut RatingState,
    event_id: &str,
    date: Option<NaiveDate>,
    team: Option<&str>,
    opponent: Option<&str>,
) {
    if date.is_some() {
        state.last_match_date = date;
    }
    state.last_event_id = Some(event_id.to_string());
    if let Some(team) = team {
        state.last_team = Some(team.to_string());
    }
    state.last_opponent = opponent.map(str::to_string);
    state.last_adjustment = 0.0;
    state.note_peak(date);
}

/// Bookkeeping for a rated appearance
fn touch(
    state: &mut RatingState,
    event_id: &str,
    date: Option<NaiveDate>,
    team: Option<&str>,
    opponent: Option<&str>,
    adjustment: f64,
) {
    state.matches_played += 1;
    stamp(state, event_id, date, team, opponent);
    state.last_adjustment = adjustment;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::order;
    use crate::types::{ContestRecord, Outcome};

    fn day(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 1, d)
    }

    fn contest(
        sequence: u64,
        date: Option<NaiveDate>,
        winner: &str,
        loser: Option<&str>,
        kind: DecisionKind,
        score: Option<(u32, u32)>,
    ) -> ContestRecord {
        ContestRecord {
            sequence,
            event_id: "e1".to_string(),
            event_date: date,
            outcome: Outcome {
                round_label: Some(format!("Round {}", sequence + 1)),
                winner_name: Some(winner.to_string()),
                winner_team: Some("Team A".to_string()),
                loser_name: loser.map(str::to_string),
                loser_team: loser.map(|_| "Team B".to_string()),
                is_bye: kind.is_no_contest(),
                decision_kind: kind,
                winner_points: score.map(|s| s.0),
                loser_points: score.map(|s| s.1),
                ..Default::default()
            },
        }
    }

    fn fold(records: Vec<ContestRecord>) -> (RatingBook, Vec<HistoryEntry>) {
        RatingEngine::default().fold(&order(records), RatingBook::new())
    }

    #[test]
    fn test_even_decision() {
        let (book, history) = fold(vec![contest(
            0,
            day(6),
            "A",
            Some("B"),
            DecisionKind::Decision,
            Some((7, 2)),
        )]);

        let a = book.get("A").unwrap();
        let b = book.get("B").unwrap();
        // 48 * (1 + 0.04 * 5) * (1 - 0.5)
        assert!((a.rating - 1028.8).abs() < 1e-9);
        assert!((b.rating - 971.2).abs() < 1e-9);
        assert_eq!((a.wins, b.losses), (1, 1));
        assert_eq!((a.matches_played, b.matches_played), (1, 1));

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::Winner);
        assert!((history[0].expected_score - 0.5).abs() < 1e-12);
        assert!((history[0].adjustment + history[1].adjustment).abs() < 1e-9);
        assert_eq!(history[0].opponent_name.as_deref(), Some("B"));
        assert_eq!(history[1].opponent_pre_rating, Some(1000.0));
    }

    #[test]
    fn test_fall_counters_and_peaks() {
        let (book, _) = fold(vec![
            contest(0, day(6), "A", Some("B"), DecisionKind::Fall, None),
            contest(1, day(6), "B", Some("A"), DecisionKind::Decision, Some((3, 2))),
        ]);
        let a = book.get("A").unwrap();
        let b = book.get("B").unwrap();
        assert_eq!((a.wins_by_fall, b.losses_by_fall), (1, 1));
        assert_eq!((a.wins, a.losses), (1, 1));
        assert!(a.best_rating.unwrap() > a.rating);
        // peaks are post-contest maxima, never the starting rating
        assert!(b.best_rating.unwrap() < 1000.0);
        assert_eq!(b.best_rating, Some(b.rating));
        assert_eq!(a.opponent_count, 2);
    }

    #[test]
    fn test_bye_is_neutral() {
        let (book, history) = fold(vec![
            contest(0, day(6), "A", Some("B"), DecisionKind::Bye, None),
            contest(1, day(6), "C", None, DecisionKind::Bye, None),
        ]);
        for name in ["A", "B", "C"] {
            let state = book.get(name).unwrap();
            assert_eq!(state.rating, 1000.0);
            assert_eq!(state.matches_played, 1);
            assert_eq!(state.wins + state.losses, 0);
        }
        assert_eq!(history.len(), 3);
        assert!(history.iter().all(|h| h.is_bye && h.adjustment == 0.0));
    }

    #[test]
    fn test_bye_after_layoff_keeps_cooldown() {
        let mut ann = RatingState::new("Ann", 1400.0);
        ann.last_match_date = NaiveDate::from_ymd_opt(2023, 1, 1);
        let initial = RatingBook::from_states(vec![ann]);

        let mut bout = contest(1, NaiveDate::from_ymd_opt(2024, 1, 10), "Ann", Some("Bea"), DecisionKind::Decision, Some((3, 1)));
        bout.event_id = "e2".into();
        let mut bye = contest(0, NaiveDate::from_ymd_opt(2024, 1, 10), "Ann", None, DecisionKind::Bye, None);
        bye.event_id = "e1".into();

        let engine = RatingEngine::default();
        let (_, direct) = engine.fold(&order(vec![bout.clone()]), initial.clone());
        let (book, history) = engine.fold(&order(vec![bye, bout]), initial);

        let cooled = direct[0].pre_rating;
        assert!(cooled < 1400.0);
        // the bye carries the decayed rating and changes nothing itself
        assert_eq!(history[0].pre_rating, cooled);
        assert_eq!(history[0].post_rating, cooled);
        assert_eq!(history[0].adjustment, 0.0);
        let rated = history.iter().find(|h| h.event_id == "e2" && h.role == Role::Winner).unwrap();
        assert_eq!(rated.pre_rating, cooled);
        assert_eq!(book.get("Ann").unwrap().matches_played, 2);
    }

    #[test]
    fn test_walkover_credits_winner_only() {
        let (book, history) = fold(vec![contest(
            0,
            day(6),
            "A",
            None,
            DecisionKind::Forfeit,
            None,
        )]);
        assert_eq!(book.len(), 1);
        let a = book.get("A").unwrap();
        assert!((a.rating - (1000.0 + 48.0 * 1.75 * 0.5)).abs() < 1e-9);
        assert_eq!(a.wins, 1);
        assert_eq!(history.len(), 1);
        assert!(history[0].opponent_name.is_none());
        assert!(!history[0].is_bye);
    }

    #[test]
    fn test_skips_unusable_contests() {
        let engine = RatingEngine::default();
        let stream = order(vec![
            contest(0, day(6), "A", Some("A"), DecisionKind::Decision, Some((3, 1))),
            ContestRecord {
                sequence: 1,
                event_id: "e1".into(),
                event_date: day(6),
                outcome: Outcome::default(),
            },
        ]);
        let mut fold = engine.start(RatingBook::new());
        let produced: usize = stream.iter().map(|c| fold.apply(c).len()).sum();
        assert_eq!(produced, 0);
        assert_eq!(fold.summary().skipped, 2);
        assert!(fold.book().is_empty());
    }

    #[test]
    fn test_cooldown_before_contest() {
        let mut later = contest(1, NaiveDate::from_ymd_opt(2024, 10, 1), "A", Some("C"), DecisionKind::Decision, Some((3, 1)));
        later.event_id = "e2".into();
        let (_, history) = fold(vec![
            contest(0, day(6), "A", Some("B"), DecisionKind::Fall, None),
            later,
        ]);

        let after_first = history[0].post_rating;
        let second = history
            .iter()
            .find(|h| h.event_id == "e2" && h.role == Role::Winner)
            .unwrap();
        assert!(second.pre_rating < after_first);
        assert!(second.pre_rating > 1000.0);
        assert_eq!(second.previous_matches, 1);
    }

    #[test]
    fn test_close_loss_credit_shrinks_underdog_loss() {
        let engine = RatingEngine::default();
        let initial = RatingBook::from_states(vec![
            RatingState::new("Fav", 1400.0),
            RatingState::new("Dog", 1000.0),
        ]);
        let close = order(vec![contest(0, day(6), "Fav", Some("Dog"), DecisionKind::Decision, Some((3, 2)))]);
        let wide = order(vec![contest(0, day(6), "Fav", Some("Dog"), DecisionKind::Decision, Some((9, 2)))]);

        let (close_book, close_history) = engine.fold(&close, initial.clone());
        let (_, wide_history) = engine.fold(&wide, initial);

        // the underdog loses less after a one-point loss
        assert!(close_history[1].adjustment < 0.0);
        assert!(close_history[1].adjustment > wide_history[1].adjustment);
        assert!((close_history[0].adjustment + close_history[1].adjustment).abs() < 1e-9);
        let total = close_book.get("Fav").unwrap().rating + close_book.get("Dog").unwrap().rating;
        assert!((total - 2400.0).abs() < 1e-9);
    }

    #[test]
    fn test_history_sequence_is_monotonic() {
        let (_, history) = fold(vec![
            contest(0, day(6), "A", Some("B"), DecisionKind::Decision, Some((3, 1))),
            contest(1, day(6), "C", None, DecisionKind::Bye, None),
            contest(2, day(6), "B", Some("C"), DecisionKind::MajorDecision, Some((12, 3))),
        ]);
        assert!(history.windows(2).all(|w| w[0].sequence < w[1].sequence));
        assert_eq!(history.len(), 5);
    }
}
