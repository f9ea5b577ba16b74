//! Output assembly
//!
//! Builds the `OUTPUT:` line of a request from resolved words, and (optionally)
//! records a JSON summary of each request (see `json`).

pub mod json;

use crate::error::AnalysisError;

/// Default maximum output length in characters
pub const OUTPUT_CHARACTER_LIMIT: usize = 200;

/// Accumulates resolved words into the response line
///
/// Words are appended in the order the coordinator hands them over, which is
/// ascending sequence id. The buffer grows freely; the limit is only checked
/// by `finish`, so an over-long output never loses resolved words.
#[derive(Debug, Clone)]
pub struct OutputAssembler {
    buffer: String,
    words: usize,
    limit: usize,
}

impl OutputAssembler {
    pub fn new(limit: usize) -> Self {
        Self {
            buffer: String::new(),
            words: 0,
            limit,
        }
    }

    /// Append a resolved word, space-separated after the first
    pub fn push(&mut self, word: &str) {
        if self.words > 0 {
            self.buffer.push(' ');
        }
        self.buffer.push_str(word);
        self.words += 1;
    }

    /// Output so far
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Number of words appended
    pub fn word_count(&self) -> usize {
        self.words
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.buffer.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn exceeds_limit(&self) -> bool {
        self.len() > self.limit
    }

    /// Final output line, or `OutputTooLong` carrying it
    pub fn finish(self) -> Result<String, AnalysisError> {
        let length = self.len();
        if length > self.limit {
            return Err(AnalysisError::OutputTooLong {
                length,
                limit: self.limit,
                output: self.buffer,
            });
        }
        Ok(self.buffer)
    }
}
