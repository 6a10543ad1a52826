//! Utility functions shared by the classifier and the rating engine

use chrono::NaiveDate;

/// Parse a bout clock such as "2:15" into seconds
///
/// A bare number is taken as seconds. Anything malformed yields `None`.
pub fn parse_clock(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    match raw.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: u32 = minutes.trim().parse().ok()?;
            let seconds: u32 = seconds.trim().parse().ok()?;
            if seconds >= 60 {
                return None;
            }
            minutes.checked_mul(60)?.checked_add(seconds)
        }
        None => raw.parse().ok(),
    }
}

/// Parse a "winner-loser" score such as "12-3"
pub fn parse_score(raw: &str) -> Option<(u32, u32)> {
    let (winner, loser) = raw.trim().split_once('-')?;
    Some((winner.trim().parse().ok()?, loser.trim().parse().ok()?))
}

/// Whole days from `earlier` to `later` (negative if out of order)
pub fn days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

/// Collapse runs of whitespace into single spaces and trim
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
