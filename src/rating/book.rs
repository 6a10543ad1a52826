//! Arena of rating records keyed by canonical wrestler name

use crate::types::{RatingState, WrestlerName};
use std::collections::HashMap;

/// Dense rating records with a name index
///
/// Records are created lazily on first appearance and never removed; a full
/// replay starts from an empty book instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingBook {
    index: HashMap<WrestlerName, usize>,
    states: Vec<RatingState>,
}

impl RatingBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a book from previously computed records
    pub fn from_states(states: impl IntoIterator<Item = RatingState>) -> Self {
        let mut book = Self::new();
        for state in states {
            match book.index.get(&state.name) {
                Some(&idx) => book.states[idx] = state,
                None => {
                    book.index.insert(state.name.clone(), book.states.len());
                    book.states.push(state);
                }
            }
        }
        book
    }

    /// Index of the record for `name`, creating it at `initial_rating` if absent
    pub fn get_or_create(&mut self, name: &str, initial_rating: f64) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.states.len();
        self.states.push(RatingState::new(name, initial_rating));
        self.index.insert(name.to_string(), idx);
        idx
    }

    pub fn get(&self, name: &str) -> Option<&RatingState> {
        self.index.get(name).map(|&idx| &self.states[idx])
    }

    pub fn rating(&self, name: &str) -> Option<f64> {
        self.get(name).map(|s| s.rating)
    }

    pub(crate) fn state(&self, idx: usize) -> &RatingState {
        &self.states[idx]
    }

    pub(crate) fn state_mut(&mut self, idx: usize) -> &mut RatingState {
        &mut self.states[idx]
    }

    /// Mutable access to two distinct records at once
    pub(crate) fn pair_mut(&mut self, a: usize, b: usize) -> (&mut RatingState, &mut RatingState) {
        assert_ne!(a, b, "pair_mut needs two distinct records");
        if a < b {
            let (left, right) = self.states.split_at_mut(b);
            (&mut left[a], &mut right[0])
        } else {
            let (left, right) = self.states.split_at_mut(a);
            (&mut right[0], &mut left[b])
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Records in order of first appearance
    pub fn iter(&self) -> std::slice::Iter<'_, RatingState> {
        self.states.iter()
    }

    pub fn into_states(self) -> Vec<RatingState> {
        self.states
    }

    /// Records sorted by rating, highest first; ties by name
    pub fn leaderboard(&self) -> Vec<&RatingState> {
        let mut ranked: Vec<&RatingState> = self.states.iter().collect();
        ranked.sort_by(|a, b| {
            b.rating
                .partial_cmp(&a.rating)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });
        ranked
    }
}

impl From<HashMap<WrestlerName, RatingState>> for RatingBook {
    fn from(map: HashMap<WrestlerName, RatingState>) -> Self {
        let mut states: Vec<RatingState> = map
            .into_iter()
            .map(|(name, mut state)| {
                state.name = name;
                state
            })
            .collect();
        // HashMap order is random; keep the arena layout reproducible
        states.sort_by(|a, b| a.name.cmp(&b.name));
        Self::from_states(states)
    }
}

impl From<RatingBook> for HashMap<WrestlerName, RatingState> {
    fn from(book: RatingBook) -> Self {
        book.states
            .into_iter()
            .map(|state| (state.name.clone(), state))
            .collect()
    }
}
