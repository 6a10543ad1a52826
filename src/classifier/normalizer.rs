//! Text cleanup applied to every contest line before classification

use crate::utils::collapse_whitespace;
use regex::{NoExpand, Regex};
use std::sync::LazyLock;

/// Hand-verified literal corrections for lines the grammar cannot recover on
/// its own. Applied in order, case-insensitively.
static KNOWN_CORRECTIONS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![(
        Regex::new(r"(?i)Keyvon\s*\(\s*kj\s*\)\s*Riley").unwrap(),
        "Keyvon Riley",
    )]
});

/// Words that mark a leading "<label> - " as a round label rather than part
/// of a hyphenated name.
const ROUND_KEYWORDS: &[&str] = &[
    "round", "place", "champ", "semi", "quarter", "final", "cons", "prelim", "pigtail",
];

/// Clean a raw contest line
///
/// Non-breaking spaces become spaces, zero-width characters are dropped,
/// known corrections are applied and whitespace runs are collapsed.
pub fn normalize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{feff}'))
        .map(|c| if c == '\u{a0}' { ' ' } else { c })
        .collect();

    let corrected = KNOWN_CORRECTIONS
        .iter()
        .fold(cleaned, |text, (pattern, replacement)| {
            pattern.replace_all(&text, NoExpand(replacement)).into_owned()
        });

    collapse_whitespace(&corrected)
}

/// Split a leading round label such as "Champ. Round 1 - " from the line
///
/// Only the first " - " is considered, and only when the label carries a
/// round keyword and no parenthesis, so "Jadin Sampson - Johnson (Team)" is
/// left intact.
pub fn split_round_prefix(text: &str) -> (Option<String>, &str) {
    let Some((label, rest)) = text.split_once(" - ") else {
        return (None, text);
    };

    let lowered = label.to_lowercase();
    let is_round = !label.contains('(') && ROUND_KEYWORDS.iter().any(|k| lowered.contains(k));

    if is_round {
        (Some(label.trim().to_string()), rest)
    } else {
        (None, text)
    }
}
