//! Canonical competitor and team names
//!
//! Names are keys of the rating book, so the same raw spelling must always
//! resolve to the same canonical string. Rules are ordered: a later rule may
//! deliberately rewrite what an earlier one produced.

use crate::utils::collapse_whitespace;
use regex::{NoExpand, Regex};
use std::sync::LazyLock;

/// One ordered case-insensitive substitution
struct AliasRule {
    pattern: Regex,
    replacement: &'static str,
}

fn compile(rules: &[(&str, &'static str)]) -> Vec<AliasRule> {
    rules
        .iter()
        .map(|(pattern, replacement)| AliasRule {
            pattern: Regex::new(&format!("(?i){}", pattern)).unwrap(),
            replacement,
        })
        .collect()
}

static NAME_RULES: LazyLock<Vec<AliasRule>> = LazyLock::new(|| {
    compile(&[
        (r"\bKeyvon\s*\(\s*kj\s*\)\s*Riley\b", "Keyvon Riley"),
        (r"\bBlaise\s+McNeil{1,2}\b", "Blaise McNeil"),
        (r"\bMat{1,2}eo\s+Corsini\b", "Matteo Corsini"),
        (r"\bCarter\s+Van[\s-]?Dyk\b", "Carter Van-Dyk"),
        (r"\bChaley\s+P[ia]{2}-Bedell\b", "Chaley Pai-Bedell"),
        (r"\bBlake\s+Rosenbaum\s+\(correct\)", "Blake Rosenbaum"),
        // "John Doe-Forfeit" and friends
        (r"-\s*(?:Forfeit|Forfiet|Bye|DFF|DDQ|Unknown)\b", ""),
    ])
});

static TEAM_RULES: LazyLock<Vec<AliasRule>> = LazyLock::new(|| {
    compile(&[
        (r"\bAlexandria\s+Junior\s+Titans\b", "Alexandria"),
        (r"\bAnnandale\s+Mat\s+Rats\b", "Annandale"),
        (r"\bBraddock\s+Wrestling\s+Club\b", "Braddock"),
        (r"\bE9\s*Wrestling\b", "E9"),
        (r"\bE9\b", "E9 Wrestling"),
        (r"\bFauquier\s+Wrestling\b", "Fauquier"),
        (r"\bFort\s*Belvoir\b", "Fort Belvoir"),
        (r"\bFranconia\s+Wrestling\s+Club\b", "Franconia"),
        (r"\bGunston\s+Wrestling\s+Club\b", "Gunston"),
        (r"\bHerndon\s*Hawks\b", "Herndon Hawks"),
        (r"\bKing\s*George\b", "King George"),
        (r"\bKing\s+George\s+Wrestling\s+Club\b", "King George"),
        // Restores the full club name the first rule shortened
        (r"\bAlexandria\b", "Alexandria Junior Titans"),
        (r"\bMcLean\s+Lions?\s+Wrestling\b", "McLean"),
        (r"\bMount\s+Vernon\s+Youth\s+Wrestling\b", "Mt Vernon"),
        (r"\bMount\s*Vernon\b", "Mt Vernon"),
        (r"\bPit\s*Bull\b", "Pit Bull"),
        (r"\bPrince\s+William\s+County\s+Wrestling\s+Club\b", "Prince William"),
        (r"\bPrince\s+William\s+Wrestling\s+Club\b", "Prince William"),
        (r"\bPrinceWilliam\b", "Prince William"),
        (r"\bRangers\b", "Ranger Wrestling Club"),
        (r"\bScanlan\s+Wrestling\s+Academy\b", "Scanlan"),
        (r"\bScanlon\s+Wrestling\b", "Scanlan"),
        (r"\bSmyrna\s+Wrestling\b", "Smyrna"),
        (r"\bSouth\s+County\s+Athletic\s+Association\b", "South County"),
        (r"\bSouthCounty\b", "South County"),
        (r"\bVienna\s+Youth\s+Inc\b", "Vienna"),
        (r"\bVikings?\s+Wrestling\s+Club\b", "Vikings"),
        (r"\bWild\s*Buffalos\b", "Wild Buffalos"),
    ])
});

fn apply(rules: &[AliasRule], value: String) -> String {
    rules.iter().fold(value, |out, rule| {
        rule.pattern
            .replace_all(&out, NoExpand(rule.replacement))
            .into_owned()
    })
}

/// Capitalise the first letter of every alphabetic run and lowercase the rest
///
/// "anthony o'BRIEN-smith" becomes "Anthony O'Brien-Smith".
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_alpha = false;
    for c in raw.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Canonical form of a competitor name
///
/// Title-cases, removes digits, applies the name aliases and collapses the
/// whitespace left behind by removals.
pub fn normalize_name(raw: &str) -> String {
    let titled = title_case(raw);
    let without_digits: String = titled.chars().filter(|c| !c.is_ascii_digit()).collect();
    collapse_whitespace(&apply(&NAME_RULES, without_digits))
}

/// Canonical form of a team name
pub fn normalize_team(raw: &str) -> String {
    apply(&TEAM_RULES, raw.to_string()).trim().to_string()
}
