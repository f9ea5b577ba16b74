//! Request error taxonomy
//!
//! Every failure the word-resolution pipeline can report is an `AnalysisError`.
//! Variants that reach the client render (via `Display`) as the exact text the
//! line protocol sends, so callers can write `error.to_string()` on the channel.
//!
//! # Propagation
//!
//! - Validation failures (`InputEmpty`, `InputTooLong`, `InvalidCharacter`) abort
//!   the request before any worker starts; the session continues.
//! - `ClientDisconnected` / `ClientTimeout` end the request and the session.
//! - `OutputTooLong` is raised after all words are resolved and carries the
//!   assembled output.
//! - `MalformedConfirmation` is retried in place and never leaves the worker.

use thiserror::Error;

/// Errors raised while resolving a request
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Error: Input is empty.")]
    InputEmpty,

    #[error("Error: Input exceeds INPUT_CHARACTER_LIMIT characters.")]
    InputTooLong {
        /// Characters received
        length: usize,
        /// Configured input limit
        limit: usize,
    },

    #[error("Invalid character is found")]
    InvalidCharacter {
        /// First offending character
        found: char,
    },

    #[error("Error: Ouput exceeds OUTPUT_CHARACTER_LIMIT characters.")]
    OutputTooLong {
        /// Length of the assembled output in characters
        length: usize,
        /// Configured output limit
        limit: usize,
        /// The assembled output, kept so resolved words are not lost
        output: String,
    },

    #[error("client disconnected")]
    ClientDisconnected,

    #[error("client did not answer within the read timeout")]
    ClientTimeout,

    #[error("Error: Dictionary is unavailable.")]
    DictionaryUnavailable {
        /// Description of the backend failure
        reason: String,
    },

    #[error("Error: Dictionary is unavailable.")]
    DictionaryTooSmall {
        /// Entries needed for a full match list
        required: usize,
        /// Entries actually loaded
        found: usize,
    },

    #[error("malformed confirmation answer: {0:?}")]
    MalformedConfirmation(String),

    #[error("request aborted by an earlier word")]
    RequestAborted,

    #[error("word worker panicked")]
    WorkerPanicked,
}

impl AnalysisError {
    /// Validation failures are reported and the session goes on
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InputEmpty | Self::InputTooLong { .. } | Self::InvalidCharacter { .. }
        )
    }

    /// Errors that end the whole session, not just the current request
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::ClientDisconnected
                | Self::ClientTimeout
                | Self::DictionaryUnavailable { .. }
                | Self::DictionaryTooSmall { .. }
                | Self::RequestAborted
                | Self::WorkerPanicked
        )
    }

    /// Errors caused by the client channel going away
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::ClientDisconnected | Self::ClientTimeout)
    }
}
