//! Dictionary persistence backends
//!
//! A backend is the external store behind the `DictionaryStore`. The session
//! loads from it before every request and saves to it after a request that
//! ran to completion.
//!
//! # Backends
//!
//! - **File**: one word per line, written sorted and replaced atomically
//! - **Memory**: shared in-process list, used by tests and embedders

use crate::Result;
use anyhow::Context;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tempfile::NamedTempFile;

/// External storage for dictionary words
pub trait DictionaryBackend: Send + Sync {
    /// Load every stored word
    fn load(&self) -> Result<Vec<String>>;

    /// Replace the stored words with `words` (already sorted)
    fn save(&self, words: &[String]) -> Result<()>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}

/// Plain-text dictionary file
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DictionaryBackend for FileBackend {
    fn load(&self) -> Result<Vec<String>> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read dictionary: {}", self.path.display()))?;

        Ok(parse_word_list(&content))
    }

    fn save(&self, words: &[String]) -> Result<()> {
        let parent_dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        // Write next to the target so the final rename stays on one filesystem
        let temp_file = NamedTempFile::new_in(parent_dir)
            .with_context(|| format!("Failed to create temp file in {}", parent_dir.display()))?;

        {
            let mut writer = BufWriter::new(temp_file.as_file());
            for word in words {
                writeln!(writer, "{}", word).context("Failed to write dictionary entry")?;
            }
            writer.flush().context("Failed to flush dictionary")?;
        }

        temp_file
            .persist(&self.path)
            .with_context(|| format!("Failed to replace dictionary: {}", self.path.display()))?;

        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory backend
///
/// Clones share the same word list, so a test can keep one handle and
/// inspect what a session saved through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    words: Arc<Mutex<Vec<String>>>,
    saves: Arc<Mutex<usize>>,
}

impl MemoryBackend {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: Arc::new(Mutex::new(words.into_iter().map(Into::into).collect())),
            saves: Arc::new(Mutex::new(0)),
        }
    }

    /// Current stored words
    pub fn words(&self) -> Vec<String> {
        self.words.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of completed saves
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DictionaryBackend for MemoryBackend {
    fn load(&self) -> Result<Vec<String>> {
        Ok(self.words())
    }

    fn save(&self, words: &[String]) -> Result<()> {
        *self.words.lock().unwrap_or_else(PoisonError::into_inner) = words.to_vec();
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Parse a word-per-line list: trims, lower-cases, skips blank lines
pub fn parse_word_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_word_list() {
        let words = parse_word_list("Hello\r\nworld\n\n  Apple  \n");
        assert_eq!(words, vec!["hello", "world", "apple"]);
    }

    #[test]
    fn test_file_backend_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dict.txt");
        fs::write(&path, "beta\nAlpha\n").unwrap();

        let backend = FileBackend::new(&path);
        assert_eq!(backend.load().unwrap(), vec!["beta", "alpha"]);

        let sorted = vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()];
        backend.save(&sorted).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "alpha\nbeta\ngamma\n");
    }

    #[test]
    fn test_file_backend_missing_file() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path().join("missing.txt"));
        let err = backend.load().unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read dictionary"));
    }

    #[test]
    fn test_memory_backend_shares_state() {
        let backend = MemoryBackend::new(["one", "two"]);
        let handle = backend.clone();

        backend.save(&["three".to_string()]).unwrap();

        assert_eq!(handle.words(), vec!["three"]);
        assert_eq!(handle.save_count(), 1);
    }
}
