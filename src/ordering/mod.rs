//! Match stream ordering
//!
//! Ratings are path-dependent, so contests must be folded in one total,
//! reproducible order: event date (missing dates last), event id, round rank,
//! then the sequence number assigned at classification time.

pub mod round;

pub use round::round_rank;

use crate::types::ContestRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A contest record with its computed round rank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencedContest {
    pub record: ContestRecord,
    pub round_rank: u32,
}

impl SequencedContest {
    pub fn new(record: ContestRecord) -> Self {
        let round_rank = round_rank(record.outcome.round_label.as_deref());
        Self { record, round_rank }
    }

    /// Contests sharing this key are folded and committed together
    pub fn group_key(&self) -> (Option<NaiveDate>, &str, u32) {
        (
            self.record.event_date,
            self.record.event_id.as_str(),
            self.round_rank,
        )
    }
}

fn compare(a: &SequencedContest, b: &SequencedContest) -> Ordering {
    let date_key = |c: &SequencedContest| (c.record.event_date.is_none(), c.record.event_date);
    date_key(a)
        .cmp(&date_key(b))
        .then_with(|| a.record.event_id.cmp(&b.record.event_id))
        .then_with(|| a.round_rank.cmp(&b.round_rank))
        .then_with(|| a.record.sequence.cmp(&b.record.sequence))
}

/// Totally ordered contests, ready for the rating fold
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchStream {
    contests: Vec<SequencedContest>,
}

impl MatchStream {
    pub fn len(&self) -> usize {
        self.contests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contests.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SequencedContest> {
        self.contests.iter()
    }

    /// Consecutive runs of contests from the same event round
    pub fn round_groups(&self) -> impl Iterator<Item = &[SequencedContest]> {
        self.contests
            .chunk_by(|a, b| a.group_key() == b.group_key())
    }

    pub fn into_inner(self) -> Vec<SequencedContest> {
        self.contests
    }
}

impl<'a> IntoIterator for &'a MatchStream {
    type Item = &'a SequencedContest;
    type IntoIter = std::slice::Iter<'a, SequencedContest>;

    fn into_iter(self) -> Self::IntoIter {
        self.contests.iter()
    }
}

/// Order classified contests for folding
pub fn order(records: impl IntoIterator<Item = ContestRecord>) -> MatchStream {
    let mut contests: Vec<SequencedContest> =
        records.into_iter().map(SequencedContest::new).collect();
    contests.sort_by(compare);
    MatchStream { contests }
}
