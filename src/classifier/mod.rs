//! Match outcome classification
//!
//! Turns one flattened contest line into a structured [`Outcome`]. The
//! classifier is total: a line no rule understands yields a partial outcome
//! with empty fields instead of an error, so one bad line never aborts a round.

mod alias;
mod decision;
pub mod normalizer;
mod participant;
mod rules;

pub use alias::{normalize_name, normalize_team, title_case};
pub use decision::{kind_from_code, kind_from_detail, kind_from_phrase, resolve_kind};
pub use normalizer::{normalize, split_round_prefix};

use crate::types::{DecisionKind, Outcome};
use tracing::debug;

/// A classified line together with the rule that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub outcome: Outcome,
    /// `None` when no rule recognised the line
    pub rule: Option<&'static str>,
}

impl Classification {
    pub fn is_recognised(&self) -> bool {
        self.rule.is_some()
    }
}

/// Classify one contest line
pub fn classify(text: &str) -> Outcome {
    classify_traced(text).outcome
}

/// Classify one contest line and report which rule fired
pub fn classify_traced(text: &str) -> Classification {
    let normalized = normalize(text);
    let (round_label, rest) = split_round_prefix(&normalized);
    let lowered = rest.to_lowercase();

    let matched = rules::RULES
        .iter()
        .filter(|rule| (rule.applies)(&lowered))
        .find_map(|rule| (rule.extract)(rest).map(|outcome| (rule.name, outcome)));

    let (rule, mut outcome) = match matched {
        Some((name, outcome)) => (Some(name), outcome),
        None => (None, Outcome::default()),
    };
    outcome.round_label = round_label;

    reconcile_placeholders(&mut outcome);
    canonicalize(&mut outcome);

    debug!(
        rule = rule.unwrap_or("none"),
        kind = %outcome.decision_kind,
        winner = outcome.winner_name.as_deref().unwrap_or(""),
        "Classified contest line"
    );

    Classification { outcome, rule }
}

fn is_empty_placeholder(name: &str) -> bool {
    matches!(name.trim(), "" | "()" | "[]" | "{}")
}

fn is_unattached_unknown(name: Option<&str>, team: Option<&str>) -> bool {
    name.is_some_and(|n| n.trim().eq_ignore_ascii_case("unknown"))
        && team.is_some_and(|t| t.trim().eq_ignore_ascii_case("unattached"))
}

fn is_absent_token(name: Option<&str>) -> bool {
    name.is_some_and(|n| {
        let n = n.trim().to_lowercase();
        n.contains("forfeit") || n == "bye"
    })
}

/// Rewrite sentinel participants
///
/// An empty loser is a forfeit win that still counts. An "Unknown
/// (Unattached)" side or two absent sides make the contest a bye.
fn reconcile_placeholders(outcome: &mut Outcome) {
    if !outcome.is_bye && outcome.loser_name.as_deref().is_some_and(is_empty_placeholder) {
        outcome.decision_kind = DecisionKind::Forfeit;
        outcome.decision_code = Some("For.".to_string());
        outcome.loser_name = None;
        outcome.loser_team = None;
        outcome.clear_result();
        return;
    }

    let winner_unknown =
        is_unattached_unknown(outcome.winner_name.as_deref(), outcome.winner_team.as_deref());
    let loser_unknown =
        is_unattached_unknown(outcome.loser_name.as_deref(), outcome.loser_team.as_deref());
    if winner_unknown || loser_unknown {
        if winner_unknown {
            outcome.winner_name = outcome.loser_name.take();
            outcome.winner_team = outcome.loser_team.take();
        }
        outcome.loser_name = None;
        outcome.loser_team = None;
        outcome.mark_bye(DecisionKind::Bye, "Bye");
        return;
    }

    if is_absent_token(outcome.winner_name.as_deref())
        && is_absent_token(outcome.loser_name.as_deref())
    {
        outcome.winner_name = None;
        outcome.winner_team = None;
        outcome.loser_name = None;
        outcome.loser_team = None;
        outcome.mark_bye(DecisionKind::DoubleForfeit, "DFF");
    }
}

/// Apply the alias tables; empty results become absent
fn canonicalize(outcome: &mut Outcome) {
    let name = |raw: Option<String>| raw.map(|n| normalize_name(&n)).filter(|n| !n.is_empty());
    let team = |raw: Option<String>| raw.map(|t| normalize_team(&t)).filter(|t| !t.is_empty());

    outcome.winner_name = name(outcome.winner_name.take());
    outcome.loser_name = name(outcome.loser_name.take());
    outcome.winner_team = team(outcome.winner_team.take());
    outcome.loser_team = team(outcome.loser_team.take());
}
