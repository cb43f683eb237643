//! Session cache of the personal number directory.

use report_types::PersonalNumber;
use std::collections::BTreeSet;

/// Valid personal numbers as fetched once for a page session.
///
/// Used for membership checks only; never refreshed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySnapshot {
    numbers: BTreeSet<PersonalNumber>,
}

impl DirectorySnapshot {
    pub fn new(numbers: impl IntoIterator<Item = PersonalNumber>) -> Self {
        Self {
            numbers: numbers.into_iter().collect(),
        }
    }

    /// Exact textual match against the entered value.
    pub fn contains(&self, entered: &str) -> bool {
        self.numbers
            .contains(&PersonalNumber::from_input(entered.to_string()))
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }
}

impl FromIterator<u64> for DirectorySnapshot {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(PersonalNumber::from))
    }
}

/// Where the session's directory load stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryState {
    Pending,
    Ready(DirectorySnapshot),
    /// Terminal for the session; carries the diagnostic.
    Unavailable(String),
}

impl DirectoryState {
    pub fn snapshot(&self) -> Option<&DirectorySnapshot> {
        match self {
            DirectoryState::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, DirectoryState::Pending)
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, DirectoryState::Unavailable(_))
    }
}
