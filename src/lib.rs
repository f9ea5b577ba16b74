//! TextPulse - Text Analysis Server
//!
//! TextPulse reads a sentence from a client, finds the closest dictionary
//! entries for every word, and lets the client confirm unknown words into
//! the dictionary, answering strictly in input order while the words are
//! resolved concurrently.
//!
//! # Architecture
//!
//! - **Analysis**: input validation, duplicate-free grouping, Levenshtein top-K ranking
//! - **Coordinator**: one worker thread per word, admitted to the client in sequence order
//! - **Dictionary**: copy-on-write word store with file and in-memory backends
//! - **Session**: per-client request loop over a line-oriented channel
//! - **Service**: tokio TCP listener, one client at a time

pub mod analysis;
pub mod config;
pub mod coordinator;
pub mod dictionary;
pub mod error;
pub mod output;
pub mod protocol;
pub mod service;
pub mod session;
pub mod util;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::OrderedCoordinator;
pub use dictionary::{DictionaryBackend, DictionaryStore};
pub use error::AnalysisError;
pub use session::{ClientChannel, Session};

/// Result type used throughout TextPulse
pub type Result<T> = anyhow::Result<T>;
