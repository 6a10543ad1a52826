//! Ordered grammar rules for contest lines
//!
//! Rules are tried top to bottom and the first extractor that returns an
//! outcome wins. Keeping precedence in one table makes overlapping phrasings
//! ("won by ... over", "won over", bare "over") explicit.

use super::decision::resolve_kind;
use super::participant::{parse_last_group, parse_team_like_group};
use crate::types::{DecisionKind, Outcome};
use crate::utils::{parse_clock, parse_score};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// One grammar rule
pub(crate) struct Rule {
    /// Stable identifier, used for metrics and tracing
    pub name: &'static str,
    /// Cheap trigger test on the lowercased line
    pub applies: fn(&str) -> bool,
    /// Structured extraction on the original line
    pub extract: fn(&str) -> Option<Outcome>,
}

pub(crate) static RULES: &[Rule] = &[
    Rule {
        name: "score_row",
        applies: always,
        extract: score_row,
    },
    Rule {
        name: "double_forfeit",
        applies: is_double_forfeit,
        extract: double_forfeit,
    },
    Rule {
        name: "double_no_contest",
        applies: mentions_double_code,
        extract: double_no_contest,
    },
    Rule {
        name: "received_bye",
        applies: mentions_bye,
        extract: received_bye,
    },
    Rule {
        name: "undecided",
        applies: mentions_vs,
        extract: undecided,
    },
    Rule {
        name: "won_in_by",
        applies: mentions_won_in_by,
        extract: won_in_by,
    },
    Rule {
        name: "won_in",
        applies: mentions_won_in,
        extract: won_in,
    },
    Rule {
        name: "won_by",
        applies: mentions_won_by,
        extract: won_by,
    },
    Rule {
        name: "won_by_empty_forfeit",
        applies: mentions_won_by_forfeit,
        extract: won_by_empty_forfeit,
    },
    Rule {
        name: "won_by_pattern",
        applies: mentions_won_by,
        extract: won_by_pattern,
    },
    Rule {
        name: "over",
        applies: mentions_bare_over,
        extract: over,
    },
    Rule {
        name: "over_pattern",
        applies: mentions_bare_over,
        extract: over_pattern,
    },
    Rule {
        name: "won_over",
        applies: mentions_won_over,
        extract: won_over,
    },
    Rule {
        name: "won_over_pattern",
        applies: mentions_won_over,
        extract: won_over_pattern,
    },
    Rule {
        name: "won_by_minimal",
        applies: mentions_won_by,
        extract: won_by_minimal,
    },
];

// Winner with optional record, up to the verb
const WIN: &str = r"^(?P<win>.+?)\s+\((?P<wteam>.*?)\)(?:\s+\d+-\d+)?\s+";
// Loser with optional record
const LOSE: &str = r"(?P<lose>.+?)\s+\((?P<lteam>.*?)\)(?:\s+\d+-\d+)?";
// "(Code [(Detail)] [m:ss] [score|(score)])"
const PAREN_TAIL: &str = r"\((?P<pcode>[A-Za-z0-9][A-Za-z0-9. -]*?)(?:\s+\((?P<pdetail>[^()]+)\))?(?:\s+(?P<ptime>\d+:\d+))?(?:\s+\((?P<pnscore>\d+-\d+)\)|\s+(?P<pscore>\d+-\d+))?\)";
// "Code [(Detail)] [score|m:ss]"
const BARE_TAIL: &str = r"(?P<bcode>[A-Za-z0-9.-]+)(?:\s+\((?P<bdetail>[^()]+)\))?(?:\s+(?P<bscore>\d+-\d+)|\s+(?P<btime>\d+:\d+))?";

fn pattern(source: &str) -> Regex {
    Regex::new(&format!("(?i){}", source)).unwrap()
}

static RE_SCORE_ROW: LazyLock<Regex> = LazyLock::new(|| pattern(r"^-?\d+\.?\d*$"));
static RE_SCORE_PREFIX: LazyLock<Regex> = LazyLock::new(|| pattern(r"^\d+-\d+"));

static RE_DOUBLE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"^(?P<a>.+?) \((?P<ateam>.*?)\)(?:\s+\d+-\d+)?\s+and\s+(?P<b>.+?) \((?P<bteam>.*?)\)(?:\s+\d+-\d+)?\s+(?:\((?P<code>DFF|DDQ)\)|(?P<code2>DFF|DDQ))$",
    )
});

static RE_BYE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"^(?P<win>.+?) \((?P<wteam>.*?)\)(?:\s+\d+-\d+)?\s+received a bye")
});

static RE_VS: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"^(?P<a>.+?)\s+\((?P<ateam>.*?)\)(?:\s+\d+-\d+)?\s+vs\s+(?P<b>.+?)\s+\((?P<bteam>.*?)\)(?:\s+\d+-\d+)?",
    )
});

static RE_WON_IN_BY: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(
        r"{WIN}won in\s+(?P<code>[A-Za-z0-9-]+)\s+by\s+(?P<dtype>.+?)\s+over\s+(?P<lose>.+?)\s+\((?P<lteam>[^)]+)\)(?:\s+\d+-\d+)?\s*(?:{PAREN_TAIL}|(?P<score>\d+-\d+))?$"
    ))
});

static RE_WON_IN: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(
        r"{WIN}won in\s+(?P<dtype>.+?)\s+over\s+{LOSE}\s+(?:{PAREN_TAIL}|{BARE_TAIL})$"
    ))
});

static RE_TAIL: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"^(?:{PAREN_TAIL}|{BARE_TAIL})$")));

static RE_PAREN_TAIL: LazyLock<Regex> = LazyLock::new(|| pattern(&format!(r"^{PAREN_TAIL}$")));

static RE_WON_BY_EMPTY_FORFEIT: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(
        r"{WIN}won by\s+forfeit\s+over\s+\(\)\s*(?P<code>[A-Za-z0-9.]+)?$"
    ))
});

static RE_WON_BY: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(
        r"{WIN}won by\s+(?P<dtype>.+?)\s+over\s+{LOSE}\s+(?:{PAREN_TAIL}|{BARE_TAIL})$"
    ))
});

static RE_OVER_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"^(?P<bcode>[A-Za-z0-9-]+)(?:\s+\((?P<bdetail>[^)]+)\))?(?:\s+(?P<num>\d+-\d+|\d+:\d+))?")
});

static RE_OVER: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(
        r"{WIN}over\s+{LOSE}\s+(?P<bcode>[A-Za-z0-9-]+)(?:\s+(?P<bscore>\d+-\d+)|\s+(?P<btime>\d+:\d+))?"
    ))
});

static RE_WON_OVER_TAIL: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^(?P<bcode>\S+)(?:\s+(?P<num>\d+-\d+|\d+:\d+))?"));

static RE_WON_OVER: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(
        r"{WIN}won over\s+{LOSE}\s+(?P<bcode>\S+)(?:\s+(?P<bscore>\d+-\d+)|\s+(?P<btime>\d+:\d+))?"
    ))
});

static RE_WON_BY_MINIMAL: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(r"{WIN}won by\s+(?P<dtype>.+?)\s+over\s+{LOSE}"))
});

/// Decision code and the numbers printed after the loser
#[derive(Debug, Default, Clone, Copy)]
struct Tail<'t> {
    code: Option<&'t str>,
    detail: Option<&'t str>,
    score: Option<&'t str>,
    time: Option<&'t str>,
}

impl<'t> Tail<'t> {
    /// Split a "5-3" or "2:15" token
    fn with_number(mut self, token: Option<&'t str>) -> Self {
        match token {
            Some(t) if t.contains(':') => self.time = Some(t),
            Some(t) => self.score = Some(t),
            None => {}
        }
        self
    }
}

fn group<'t>(caps: &Captures<'t>, name: &str) -> Option<&'t str> {
    caps.name(name).map(|m| m.as_str())
}

/// Read a tail out of captures holding the paren or bare alternatives
///
/// A bare code that is really a score ("12-3") is rejected.
fn tail_from<'t>(caps: &Captures<'t>) -> Option<Tail<'t>> {
    if let Some(code) = group(caps, "pcode") {
        return Some(Tail {
            code: Some(code),
            detail: group(caps, "pdetail"),
            score: group(caps, "pnscore").or_else(|| group(caps, "pscore")),
            time: group(caps, "ptime"),
        });
    }

    let code = group(caps, "bcode");
    if code.is_some_and(|c| RE_SCORE_PREFIX.is_match(c)) {
        return None;
    }
    Some(Tail {
        code,
        detail: group(caps, "bdetail"),
        score: group(caps, "bscore"),
        time: group(caps, "btime"),
    })
}

fn parse_tail(text: &str) -> Option<Tail<'_>> {
    tail_from(&RE_TAIL.captures(text)?)
}

fn side(name: &str, team: &str) -> (Option<String>, Option<String>) {
    (Some(name.trim().to_string()), Some(team.trim().to_string()))
}

/// Build a contested outcome and settle its score or fall time
fn contest(
    winner: (&str, &str),
    loser: Option<(&str, &str)>,
    phrase: Option<&str>,
    tail: Tail<'_>,
) -> Outcome {
    let (winner_name, winner_team) = side(winner.0, winner.1);
    let (loser_name, loser_team) = loser.map_or((None, None), |(n, t)| side(n, t));

    let mut outcome = Outcome {
        winner_name,
        winner_team,
        loser_name,
        loser_team,
        decision_kind: resolve_kind(phrase, tail.detail, tail.code),
        decision_code: tail.code.map(|c| c.trim().to_string()),
        ..Default::default()
    };
    settle_result(&mut outcome, tail.score, tail.time);
    outcome
}

/// A time is kept only for falls; otherwise the score pair is used
fn settle_result(outcome: &mut Outcome, score: Option<&str>, time: Option<&str>) {
    if outcome.decision_kind.is_no_contest() {
        outcome.is_bye = true;
        outcome.clear_result();
        return;
    }

    if outcome.decision_kind == DecisionKind::Fall {
        if let Some(seconds) = time.and_then(parse_clock) {
            outcome.fall_seconds = Some(seconds);
            return;
        }
    }

    if let Some((winner, loser)) = score.and_then(parse_score) {
        outcome.winner_points = Some(winner);
        outcome.loser_points = Some(loser);
    }
}

fn bye(
    kind: DecisionKind,
    code: &str,
    winner: Option<(&str, &str)>,
    loser: Option<(&str, &str)>,
) -> Outcome {
    let (winner_name, winner_team) = winner.map_or((None, None), |(n, t)| side(n, t));
    let (loser_name, loser_team) = loser.map_or((None, None), |(n, t)| side(n, t));
    let mut outcome = Outcome {
        winner_name,
        winner_team,
        loser_name,
        loser_team,
        ..Default::default()
    };
    outcome.mark_bye(kind, code);
    outcome
}

fn winner_of<'t>(caps: &Captures<'t>) -> Option<(&'t str, &'t str)> {
    Some((group(caps, "win")?, group(caps, "wteam")?))
}

fn loser_of<'t>(caps: &Captures<'t>) -> Option<(&'t str, &'t str)> {
    Some((group(caps, "lose")?, group(caps, "lteam")?))
}

// Triggers

fn always(_: &str) -> bool {
    true
}

fn is_double_forfeit(lowered: &str) -> bool {
    lowered.trim() == "double forfeit"
}

fn mentions_double_code(lowered: &str) -> bool {
    lowered.contains("dff") || lowered.contains("ddq")
}

fn mentions_bye(lowered: &str) -> bool {
    lowered.contains("received a bye")
}

fn mentions_vs(lowered: &str) -> bool {
    lowered.contains(" vs ")
}

fn mentions_won_in_by(lowered: &str) -> bool {
    lowered.contains(" won in ") && lowered.contains(" by ")
}

fn mentions_won_in(lowered: &str) -> bool {
    lowered.contains(" won in ")
}

fn mentions_won_by(lowered: &str) -> bool {
    lowered.contains(" won by ") && lowered.contains(" over ")
}

fn mentions_won_by_forfeit(lowered: &str) -> bool {
    mentions_won_by(lowered) && lowered.contains("forfeit")
}

fn mentions_bare_over(lowered: &str) -> bool {
    lowered.contains(" over ") && !lowered.contains(" won over ")
}

fn mentions_won_over(lowered: &str) -> bool {
    lowered.contains(" won over ")
}

// Extractors

/// Dual-meet team score adjustment such as "72.0" or "-3.0"
fn score_row(text: &str) -> Option<Outcome> {
    RE_SCORE_ROW
        .is_match(text.trim())
        .then(|| bye(DecisionKind::Bye, "SCORE", None, None))
}

fn double_forfeit(_: &str) -> Option<Outcome> {
    Some(bye(DecisionKind::DoubleForfeit, "DFF", None, None))
}

/// "A (T) and B (T) DFF", both participants kept
fn double_no_contest(text: &str) -> Option<Outcome> {
    let caps = RE_DOUBLE.captures(text)?;
    let code = group(&caps, "code").or_else(|| group(&caps, "code2"))?;
    Some(bye(
        DecisionKind::Bye,
        &code.to_uppercase(),
        Some((group(&caps, "a")?, group(&caps, "ateam")?)),
        Some((group(&caps, "b")?, group(&caps, "bteam")?)),
    ))
}

fn received_bye(text: &str) -> Option<Outcome> {
    let winner = RE_BYE.captures(text).and_then(|caps| winner_of(&caps));
    Some(bye(DecisionKind::Bye, "Bye", winner, None))
}

/// "A (T) vs B (T)" is scheduled but undecided
fn undecided(text: &str) -> Option<Outcome> {
    let caps = RE_VS.captures(text)?;
    Some(bye(
        DecisionKind::Bye,
        "Bye",
        Some((group(&caps, "a")?, group(&caps, "ateam")?)),
        Some((group(&caps, "b")?, group(&caps, "bteam")?)),
    ))
}

/// "won in SV-1 by fall over ...": code from the "in" clause, kind from "by"
fn won_in_by(text: &str) -> Option<Outcome> {
    let caps = RE_WON_IN_BY.captures(text)?;
    let tail = Tail {
        code: group(&caps, "code"),
        detail: group(&caps, "pdetail"),
        score: group(&caps, "pnscore")
            .or_else(|| group(&caps, "pscore"))
            .or_else(|| group(&caps, "score")),
        time: group(&caps, "ptime"),
    };
    Some(contest(
        winner_of(&caps)?,
        loser_of(&caps),
        group(&caps, "dtype"),
        tail,
    ))
}

fn won_in(text: &str) -> Option<Outcome> {
    let caps = RE_WON_IN.captures(text)?;
    let tail = tail_from(&caps)?;
    Some(contest(
        winner_of(&caps)?,
        loser_of(&caps),
        group(&caps, "dtype"),
        tail,
    ))
}

/// "won by <kind> over" with names that carry their own parenthetical asides
fn won_by(text: &str) -> Option<Outcome> {
    const VERB: &str = " won by ";
    const OVER: &str = " over ";

    let lowered = text.to_ascii_lowercase();
    let at = lowered.find(VERB).filter(|at| *at > 0)?;
    let winner = parse_last_group(&text[..at])?;

    let after_verb = &text[at + VERB.len()..];
    let over_at = lowered[at + VERB.len()..]
        .find(OVER)
        .filter(|at| *at > 0)?;
    let phrase = after_verb[..over_at].trim();

    let after_over = after_verb[over_at + OVER.len()..].trim_start();
    let mut loser = parse_last_group(after_over)?;
    let mut remaining = after_over[loser.end..].trim_start();

    // With no record after the team, a parenthesised code is itself the last group
    if remaining.is_empty() && RE_PAREN_TAIL.is_match(&format!("({})", loser.team)) {
        if let Some(inner) = parse_last_group(&loser.name) {
            let rest = after_over[inner.end..].trim_start();
            if rest.starts_with('(') && parse_tail(rest).is_some() {
                loser = inner;
                remaining = rest;
            }
        }
    }

    let tail = if remaining.is_empty() {
        Tail::default()
    } else {
        parse_tail(remaining)?
    };

    Some(contest(
        (winner.name.as_str(), winner.team.as_str()),
        Some((loser.name.as_str(), loser.team.as_str())),
        Some(phrase),
        tail,
    ))
}

/// "won by forfeit over () FF"
fn won_by_empty_forfeit(text: &str) -> Option<Outcome> {
    let caps = RE_WON_BY_EMPTY_FORFEIT.captures(text)?;
    let tail = Tail {
        code: Some(group(&caps, "code").unwrap_or("For.")),
        ..Default::default()
    };
    Some(contest(winner_of(&caps)?, None, Some("forfeit"), tail))
}

fn won_by_pattern(text: &str) -> Option<Outcome> {
    let caps = RE_WON_BY.captures(text)?;
    let tail = tail_from(&caps)?;
    Some(contest(
        winner_of(&caps)?,
        loser_of(&caps),
        group(&caps, "dtype"),
        tail,
    ))
}

/// Shared shape of the "over" and "won over" phrasings
fn team_like_contest(text: &str, verb: &str, tail_pattern: &Regex) -> Option<Outcome> {
    let lowered = text.to_ascii_lowercase();
    let at = lowered.find(verb).filter(|at| *at > 0)?;
    let winner = parse_team_like_group(&text[..at])?;

    let after_verb = text[at + verb.len()..].trim_start();
    let loser = parse_team_like_group(after_verb)?;
    let remaining = after_verb[loser.end..].trim_start();

    let caps = tail_pattern.captures(remaining)?;
    let tail = Tail {
        code: group(&caps, "bcode"),
        detail: group(&caps, "bdetail"),
        ..Default::default()
    }
    .with_number(group(&caps, "num"));

    Some(contest(
        (winner.name.as_str(), winner.team.as_str()),
        Some((loser.name.as_str(), loser.team.as_str())),
        None,
        tail,
    ))
}

/// "A (T) over B (T) TB-2 (Fall) 0:00", the simplified dual-meet phrasing
fn over(text: &str) -> Option<Outcome> {
    team_like_contest(text, " over ", &RE_OVER_TAIL)
}

fn over_pattern(text: &str) -> Option<Outcome> {
    let caps = RE_OVER.captures(text)?;
    let tail = tail_from(&caps)?;
    Some(contest(winner_of(&caps)?, loser_of(&caps), None, tail))
}

/// "A (T) won over B (T) MD 10-2", no decision phrase
fn won_over(text: &str) -> Option<Outcome> {
    team_like_contest(text, " won over ", &RE_WON_OVER_TAIL)
}

fn won_over_pattern(text: &str) -> Option<Outcome> {
    let caps = RE_WON_OVER.captures(text)?;
    let tail = tail_from(&caps)?;
    Some(contest(winner_of(&caps)?, loser_of(&caps), None, tail))
}

/// Names and phrase only, when no code or score can be read
fn won_by_minimal(text: &str) -> Option<Outcome> {
    let caps = RE_WON_BY_MINIMAL.captures(text)?;
    Some(contest(
        winner_of(&caps)?,
        loser_of(&caps),
        group(&caps, "dtype"),
        Tail::default(),
    ))
}
