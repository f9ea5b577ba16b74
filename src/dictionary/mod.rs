//! Dictionary store
//!
//! The in-memory set of known words shared by every worker of a request.
//!
//! # Snapshots
//!
//! Workers rank their word against a `DictionarySnapshot`, a point-in-time view
//! taken without holding the coordinator's exclusive region. The store keeps
//! its words behind an `Arc` and inserts copy-on-write, so taking a snapshot
//! is a reference-count bump and an existing snapshot never observes a later
//! insert.
//!
//! # Persistence
//!
//! The store itself never touches disk. A `DictionaryBackend` loads the words
//! before each request and saves them after it (see `backend`).

pub mod backend;

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

pub use backend::{DictionaryBackend, FileBackend, MemoryBackend};

/// Read-only, isolated view of the dictionary
#[derive(Debug, Clone, Default)]
pub struct DictionarySnapshot {
    words: Arc<BTreeSet<String>>,
}

impl DictionarySnapshot {
    /// Build a snapshot directly from words (normalized to lower case)
    pub fn from_words<I>(words: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            words: Arc::new(words.into_iter().map(|w| normalize(&w)).collect()),
        }
    }

    /// Entries in ascending order
    pub fn entries(&self) -> &BTreeSet<String> {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&normalize(word))
    }
}

/// Mutable, session-lived set of known words
#[derive(Debug, Default)]
pub struct DictionaryStore {
    words: RwLock<Arc<BTreeSet<String>>>,
}

impl DictionaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `words` (normalized, deduplicated)
    pub fn from_words<I>(words: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let store = Self::new();
        store.replace(words);
        store
    }

    /// Point-in-time copy for ranking
    pub fn snapshot(&self) -> DictionarySnapshot {
        let words = self.words.read().unwrap_or_else(PoisonError::into_inner);
        DictionarySnapshot {
            words: Arc::clone(&*words),
        }
    }

    /// Insert a word, case-folded
    ///
    /// Returns `true` if the word was not present before. Inserting an existing
    /// word leaves the store unchanged.
    pub fn insert(&self, word: &str) -> bool {
        let word = normalize(word);
        let mut words = self.words.write().unwrap_or_else(PoisonError::into_inner);
        if words.contains(&word) {
            return false;
        }
        Arc::make_mut(&mut *words).insert(word)
    }

    /// Number of distinct words
    pub fn count(&self) -> usize {
        self.words.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&normalize(word))
    }

    /// Replace the whole content, e.g. after reloading from the backend
    pub fn replace<I>(&self, words: I)
    where
        I: IntoIterator<Item = String>,
    {
        let fresh: BTreeSet<String> = words
            .into_iter()
            .map(|w| normalize(&w))
            .filter(|w| !w.is_empty())
            .collect();
        *self.words.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(fresh);
    }

    /// All words in ascending order, as written back to storage
    pub fn sorted_words(&self) -> Vec<String> {
        self.snapshot().entries().iter().cloned().collect()
    }
}

/// Dictionary entries are lower-cased and stripped of surrounding whitespace
fn normalize(word: &str) -> String {
    word.trim().to_lowercase()
}
