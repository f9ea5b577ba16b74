//! Word analysis primitives
//!
//! This module holds the pure, lock-free half of the pipeline:
//!
//! - `validate`: input checks applied before anything is tokenized
//! - `grouping`: splits a sentence into duplicate-free groups of words
//! - `distance`: edit distance and top-K ranking against a dictionary snapshot
//!
//! Nothing here touches the client channel or mutates the dictionary; the
//! coordinator composes these pieces with its turn protocol.

pub mod distance;
pub mod grouping;
pub mod validate;

use std::fmt;

pub use distance::{distance, rank};
pub use grouping::group_words;
pub use validate::validate_input;

/// Default number of ranked matches reported per word
pub const DEFAULT_TOP_K: usize = 5;

/// A single word of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// Lower-cased word text
    pub text: String,
    /// Index of the group this word belongs to (0-based)
    pub group_index: usize,
    /// Flattened position across all groups (1-based)
    pub sequence_id: usize,
}

/// Ordered run of words with no duplicate text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub index: usize,
    pub words: Vec<Word>,
}

impl Group {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Word texts in append order
    pub fn texts(&self) -> Vec<&str> {
        self.words.iter().map(|w| w.text.as_str()).collect()
    }
}

/// One dictionary entry with its distance to the query word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub entry: String,
    pub distance: usize,
}

impl fmt::Display for RankedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.entry, self.distance)
    }
}

/// Ranked nearest matches for one word
///
/// `ranked` is sorted ascending by `(distance, entry)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub word: Word,
    pub ranked: Vec<RankedEntry>,
}

impl MatchResult {
    /// Closest dictionary entry, if the dictionary was non-empty
    pub fn best(&self) -> Option<&RankedEntry> {
        self.ranked.first()
    }

    /// The word itself is in the dictionary
    pub fn is_exact(&self) -> bool {
        self.best().map_or(false, |best| best.distance == 0)
    }
}
