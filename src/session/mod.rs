//! Client session
//!
//! A session is one client conversation: greeting, then any number of
//! requests until the client declines to continue or goes away.
//!
//! # Request Cycle
//!
//! ```text
//! reload dictionary ─> prompt ─> read ─> validate ─> group_words
//!        │                                              │
//!        │                                   OrderedCoordinator::run
//!        │                                              │
//!        │             INPUT / OUTPUT (or output error) <┘
//!        │                        │
//!        └──── clear screen <─ y ─┤ save dictionary, ask to continue
//!                                 └─ otherwise: goodbye
//! ```
//!
//! Validation errors are reported and the session goes on to the
//! continuation prompt. A lost client ends the session quietly; an
//! unavailable dictionary is reported and ends it.

pub mod channel;
pub mod mock;

pub use channel::{ClientChannel, LineChannel};

use crate::analysis::{group_words, validate_input};
use crate::config::LimitsConfig;
use crate::coordinator::OrderedCoordinator;
use crate::dictionary::{DictionaryBackend, DictionaryStore};
use crate::error::AnalysisError;
use crate::output::json::{RequestSummary, SummaryWriter};
use crate::protocol;
use chrono::Utc;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};

/// Summary sink shared by consecutive sessions
pub type SharedSummaryWriter = Arc<Mutex<SummaryWriter>>;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The client answered anything but `y` to the continuation prompt
    Declined,
    /// The connection closed or failed
    Disconnected,
    /// The client did not answer within the read timeout
    TimedOut,
    /// The dictionary could not be loaded, saved, or was too small
    DictionaryUnavailable,
    /// A worker failed in a way that left the request unusable
    Failed,
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEnd::Declined => write!(f, "declined"),
            SessionEnd::Disconnected => write!(f, "disconnected"),
            SessionEnd::TimedOut => write!(f, "timed out"),
            SessionEnd::DictionaryUnavailable => write!(f, "dictionary unavailable"),
            SessionEnd::Failed => write!(f, "failed"),
        }
    }
}

/// What a finished session did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub session: u64,
    /// Requests started, including rejected and interrupted ones
    pub requests: u64,
    /// Requests that produced an `OUTPUT` line
    pub completed: u64,
    pub words_added: usize,
    pub end: SessionEnd,
}

/// One client conversation
pub struct Session {
    id: u64,
    backend: Arc<dyn DictionaryBackend>,
    dictionary: DictionaryStore,
    limits: LimitsConfig,
    summaries: Option<SharedSummaryWriter>,
}

impl Session {
    pub fn new(id: u64, backend: Arc<dyn DictionaryBackend>, limits: LimitsConfig) -> Self {
        Self {
            id,
            backend,
            dictionary: DictionaryStore::new(),
            limits,
            summaries: None,
        }
    }

    /// Record a JSON summary of every completed request
    pub fn with_summaries(mut self, writer: SharedSummaryWriter) -> Self {
        self.summaries = Some(writer);
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Serve the client until the session ends
    pub fn run(&mut self, channel: &mut dyn ClientChannel) -> SessionReport {
        let mut report = SessionReport {
            session: self.id,
            requests: 0,
            completed: 0,
            words_added: 0,
            end: SessionEnd::Declined,
        };

        info!(session = self.id, dictionary = %self.backend.describe(), "Session started");

        report.end = match self.serve(channel, &mut report) {
            Ok(end) => end,
            Err(err) => self.end_on_error(channel, err),
        };

        info!(
            session = self.id,
            requests = report.requests,
            completed = report.completed,
            words_added = report.words_added,
            end = %report.end,
            "Session finished"
        );

        report
    }

    fn serve(
        &mut self,
        channel: &mut dyn ClientChannel,
        report: &mut SessionReport,
    ) -> Result<SessionEnd, AnalysisError> {
        channel.send_line("")?;
        channel.send_line(protocol::GREETING)?;

        loop {
            report.requests += 1;
            if let Err(err) = self.serve_request(channel, report) {
                if !err.is_validation() {
                    return Err(err);
                }
                info!(session = self.id, request = report.requests, error = ?err, "Input rejected");
                channel.send_line(&err.to_string())?;
            }

            channel.send_line("")?;
            channel.send_prompt(protocol::CONTINUE_PROMPT)?;
            let answer = channel.read_line()?;

            if !answer.eq_ignore_ascii_case("y") {
                channel.send_line("")?;
                channel.send_line(protocol::NO_MORE_INPUT)?;
                send_farewell(channel)?;
                return Ok(SessionEnd::Declined);
            }

            channel.send_prompt(protocol::CLEAR_SCREEN)?;
        }
    }

    fn serve_request(
        &mut self,
        channel: &mut dyn ClientChannel,
        report: &mut SessionReport,
    ) -> Result<(), AnalysisError> {
        self.reload_dictionary()?;

        channel.send_line("")?;
        channel.send_line(protocol::INPUT_PROMPT)?;
        let input = channel.read_line()?;

        validate_input(&input, self.limits.input_chars)?;
        let groups = group_words(&input)?;
        debug!(
            session = self.id,
            request = report.requests,
            groups = groups.len(),
            "Input grouped"
        );

        let resolution = OrderedCoordinator::new(
            channel,
            &self.dictionary,
            self.limits.top_k,
            self.limits.output_chars,
        )
        .run(&groups)?;

        let words = resolution.output.word_count();

        channel.send_line("")?;
        channel.send_line(&protocol::input_line(&input))?;

        let (output, output_too_long) = match resolution.output.finish() {
            Ok(output) => {
                channel.send_line(&protocol::output_line(&output))?;
                report.completed += 1;
                (output, false)
            }
            Err(err) => {
                let output = match &err {
                    AnalysisError::OutputTooLong { output, .. } => output.clone(),
                    _ => return Err(err),
                };
                warn!(session = self.id, request = report.requests, error = ?err, "Output rejected");
                channel.send_line(&err.to_string())?;
                (output, true)
            }
        };

        // Confirmed words stay in the dictionary even when the output was rejected
        self.save_dictionary()?;
        report.words_added += resolution.words_added.len();

        self.record(RequestSummary {
            timestamp: Utc::now(),
            session: self.id,
            request: report.requests,
            input,
            output,
            words,
            groups: groups.len(),
            words_added: resolution.words_added,
            output_too_long,
        });

        Ok(())
    }

    fn reload_dictionary(&self) -> Result<(), AnalysisError> {
        let words = self.backend.load().map_err(|e| {
            error!(session = self.id, dictionary = %self.backend.describe(), error = %format!("{:#}", e), "Failed to load dictionary");
            AnalysisError::DictionaryUnavailable {
                reason: format!("{:#}", e),
            }
        })?;

        self.dictionary.replace(words);

        let found = self.dictionary.count();
        if found < self.limits.top_k {
            error!(session = self.id, found, required = self.limits.top_k, "Dictionary too small");
            return Err(AnalysisError::DictionaryTooSmall {
                required: self.limits.top_k,
                found,
            });
        }

        debug!(session = self.id, words = found, "Dictionary loaded");
        Ok(())
    }

    fn save_dictionary(&self) -> Result<(), AnalysisError> {
        self.backend
            .save(&self.dictionary.sorted_words())
            .map_err(|e| {
                error!(session = self.id, dictionary = %self.backend.describe(), error = %format!("{:#}", e), "Failed to save dictionary");
                AnalysisError::DictionaryUnavailable {
                    reason: format!("{:#}", e),
                }
            })
    }

    fn record(&self, summary: RequestSummary) {
        let Some(ref writer) = self.summaries else {
            return;
        };

        let mut writer = writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writer.write(&summary) {
            warn!(path = %writer.path().display(), error = %format!("{:#}", e), "Failed to write request summary");
        }
    }

    fn end_on_error(&self, channel: &mut dyn ClientChannel, err: AnalysisError) -> SessionEnd {
        match err {
            AnalysisError::ClientTimeout => {
                info!(session = self.id, "Client timed out");
                let _ = send_farewell(channel);
                SessionEnd::TimedOut
            }
            _ if err.is_disconnect() => {
                info!(session = self.id, "Client disconnected");
                SessionEnd::Disconnected
            }
            AnalysisError::DictionaryUnavailable { .. } | AnalysisError::DictionaryTooSmall { .. } => {
                let _ = channel
                    .send_line("")
                    .and_then(|_| channel.send_line(&err.to_string()))
                    .and_then(|_| send_farewell(channel));
                SessionEnd::DictionaryUnavailable
            }
            other => {
                if other.is_terminal() {
                    error!(session = self.id, error = %other, "Request aborted");
                } else {
                    error!(session = self.id, error = %other, "Request failed");
                }
                SessionEnd::Failed
            }
        }
    }
}

fn send_farewell(channel: &mut dyn ClientChannel) -> Result<(), AnalysisError> {
    channel.send_line("")?;
    channel.send_line(protocol::FAREWELL)
}
