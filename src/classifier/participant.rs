//! "Name (Team) [record]" splitting for names that carry their own asides
//!
//! A name such as "Bilegt (Billy) Arslan (Mclean) 17-21" holds two balanced
//! parenthetical groups; only one of them is the team.

use regex::Regex;
use std::sync::LazyLock;

static RE_RECORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+-\d+").unwrap());
static RE_RECORD_SKIP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+-\d+\s*").unwrap());

/// A competitor split out of a contest line
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Participant {
    pub name: String,
    pub team: String,
    /// Byte offset just past the team group and any trailing record
    pub end: usize,
}

/// A balanced parenthetical group, `start` at '(' and `end` past ')'
#[derive(Debug, Clone, Copy)]
struct Group {
    start: usize,
    end: usize,
}

impl Group {
    fn content<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start + 1..self.end - 1]
    }
}

/// Find the ')' that closes the '(' at `start`
fn balanced_group(text: &str, start: usize) -> Option<Group> {
    let mut depth = 0usize;
    for (offset, byte) in text.as_bytes()[start..].iter().enumerate() {
        match byte {
            b'(' => depth += 1,
            b')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(Group {
                        start,
                        end: start + offset + 1,
                    });
                }
            }
            _ => {}
        }
    }
    None
}

/// Every top-level balanced group, left to right
fn groups(text: &str) -> Vec<Group> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes[pos] == b'(' {
            if let Some(group) = balanced_group(text, pos) {
                found.push(group);
                pos = group.end;
                continue;
            }
        }
        pos += 1;
    }
    found
}

fn followed_by_record(text: &str, group: Group) -> bool {
    RE_RECORD.is_match(text[group.end..].trim_start())
}

fn participant(text: &str, team: Group) -> Option<Participant> {
    let name = text[..team.start].trim();
    if name.is_empty() {
        return None;
    }

    let after = &text[team.end..];
    let trimmed = after.trim_start();
    let mut end = team.end + (after.len() - trimmed.len());
    match RE_RECORD_SKIP.find(trimmed) {
        Some(record) => end += record.end(),
        None => end = team.end,
    }

    Some(Participant {
        name: name.to_string(),
        team: team.content(text).to_string(),
        end,
    })
}

/// Team is the last balanced group, stopping early at one followed by a record
pub(crate) fn parse_last_group(text: &str) -> Option<Participant> {
    let mut chosen = None;
    for group in groups(text) {
        chosen = Some(group);
        if followed_by_record(text, group) {
            break;
        }
    }
    participant(text, chosen?)
}

/// How team-like a parenthetical group looks
fn team_score(text: &str, group: Group) -> i32 {
    let content = group.content(text);
    let lowered = content.to_lowercase();
    let single_word = !content.trim().contains(' ');
    let length = content.chars().count();
    let mut score = 0;

    if followed_by_record(text, group) {
        score += 100;
    }
    if lowered.contains(" hs") || lowered.ends_with("hs") {
        score += 50;
    }
    if lowered.contains("high school") {
        score += 50;
    }
    if single_word {
        score -= 30;
    } else {
        score += 30;
    }
    if length > 10 {
        score += 20;
    }
    if length <= 8 {
        score -= 20;
    }

    // A nickname sits between name parts
    let mid_text = group.start > 0 && group.start < text.len() - group.end;
    if mid_text {
        let before = text[..group.start].trim();
        if !before.is_empty() && !before.ends_with(')') {
            score -= 25;
        }
    }

    score
}

/// Team is the most team-like group; ties go to the later group
///
/// Used for phrasings where a decision detail such as "TB-2 (Fall)" can
/// follow the loser, so the last group is not necessarily the team.
pub(crate) fn parse_team_like_group(text: &str) -> Option<Participant> {
    let best = groups(text)
        .into_iter()
        .map(|group| (team_score(text, group), group.start, group))
        .max_by_key(|(score, start, _)| (*score, *start))?;
    participant(text, best.2)
}
