//! Heuristic rank of a free-text round label within an event

use regex::Regex;
use std::sync::LazyLock;

/// Rank for contests that carry no round label
pub const MISSING_LABEL_RANK: u32 = 50;
/// Rank for labels no keyword or number recognises
pub const UNRECOGNISED_RANK: u32 = 60;
/// Numbered rounds never reach the quarterfinals
const MAX_NUMBERED_RANK: u32 = 79;

/// Checked in order; the first keyword contained in the label wins, so
/// "quarter" and "semi" come before "final".
const KEYWORD_RANKS: &[(&str, u32)] = &[
    ("pigtail", 5),
    ("prelim", 10),
    ("quarter", 80),
    ("consolation", 85),
    ("semi", 90),
    ("final", 100),
    ("championship", 100),
    ("place", 110),
];

static RE_NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\br(?:ound)?\s*(\d+)\b").unwrap());

/// Rank of a round label; lower runs earlier
pub fn round_rank(label: Option<&str>) -> u32 {
    let Some(label) = label.map(str::trim).filter(|l| !l.is_empty()) else {
        return MISSING_LABEL_RANK;
    };
    let lowered = label.to_lowercase();

    if let Some((_, rank)) = KEYWORD_RANKS.iter().find(|(k, _)| lowered.contains(k)) {
        return *rank;
    }

    RE_NUMBERED
        .captures(&lowered)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .map(|n| n.saturating_mul(10).saturating_add(10).min(MAX_NUMBERED_RANK))
        .unwrap_or(UNRECOGNISED_RANK)
}
