//! Word worker
//!
//! One worker resolves one word. Its lifecycle:
//!
//! ```text
//! Computing ──> AwaitingTurn ──> Reporting ──────────────────────> Resolved
//!                                    │                    ^
//!                                    v                    │
//!                            AwaitingConfirmation ────────┘
//! ```
//!
//! - **Computing**: rank the word against a dictionary snapshot; runs fully
//!   in parallel with the other workers of the group
//! - **AwaitingTurn**: block on the turn gate until `turn == sequence_id`
//! - **Reporting**: send the word header, the match list and membership
//! - **AwaitingConfirmation**: the word is unknown; ask the client whether to
//!   add it, re-prompting on anything but `y`, `n` or an empty answer
//! - **Resolved**: the word (or its best match) is appended to the output
//!
//! Any channel error aborts the request: the worker marks the gate aborted
//! and releases its turn, and every later worker leaves as soon as it is
//! admitted. A panic while ranking is caught; the worker still waits for its
//! turn, then aborts with `WorkerPanicked`.

use super::{Exclusive, OrderedCoordinator};
use crate::analysis::{MatchResult, Word};
use crate::error::AnalysisError;
use crate::protocol;
use crate::session::ClientChannel;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, trace, warn};

/// Worker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Computing,
    AwaitingTurn,
    Reporting,
    AwaitingConfirmation,
    Resolved,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Computing => write!(f, "computing"),
            WorkerState::AwaitingTurn => write!(f, "awaiting-turn"),
            WorkerState::Reporting => write!(f, "reporting"),
            WorkerState::AwaitingConfirmation => write!(f, "awaiting-confirmation"),
            WorkerState::Resolved => write!(f, "resolved"),
        }
    }
}

/// Client answer to "add this word to the dictionary?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// `y`: insert the word and keep it in the output
    Add,
    /// `n` or empty: replace the word with its best match
    Decline,
}

impl Confirmation {
    /// Parse an answer line, case-insensitively
    pub fn parse(answer: &str) -> Result<Self, AnalysisError> {
        match answer.to_lowercase().as_str() {
            "y" => Ok(Confirmation::Add),
            "" | "n" => Ok(Confirmation::Decline),
            _ => Err(AnalysisError::MalformedConfirmation(answer.to_string())),
        }
    }
}

/// Resolves a single word through the coordinator's turn protocol
pub(crate) struct WordWorker<'w> {
    word: &'w Word,
    state: WorkerState,
}

impl<'w> WordWorker<'w> {
    pub(crate) fn new(word: &'w Word) -> Self {
        Self {
            word,
            state: WorkerState::Computing,
        }
    }

    pub(crate) fn state(&self) -> WorkerState {
        self.state
    }

    pub(crate) fn run(mut self, coordinator: &OrderedCoordinator<'_>) -> Result<(), AnalysisError> {
        let snapshot = coordinator.dictionary().snapshot();
        let ranked = panic::catch_unwind(AssertUnwindSafe(|| {
            coordinator
                .ranker()
                .rank(self.word, &snapshot, coordinator.top_k())
        }));
        drop(snapshot);

        // The ticket must be taken even if ranking failed, or later words wait forever
        self.transition(WorkerState::AwaitingTurn);
        let mut turn = coordinator.gate().wait_for(self.word.sequence_id);

        if turn.is_aborted() {
            debug!(seq = self.word.sequence_id, "Request aborted, skipping word");
            return Err(AnalysisError::RequestAborted);
        }

        let matches = match ranked {
            Ok(matches) => matches,
            Err(_) => {
                error!(seq = self.word.sequence_id, word = %self.word.text, "Ranking panicked, aborting request");
                turn.abort();
                return Err(AnalysisError::WorkerPanicked);
            }
        };

        self.transition(WorkerState::Reporting);
        let result = self.report(&mut turn, coordinator, &matches);

        match &result {
            Ok(()) => self.transition(WorkerState::Resolved),
            Err(err) => {
                warn!(
                    seq = self.word.sequence_id,
                    word = %self.word.text,
                    state = %self.state(),
                    error = %err,
                    "Word failed, aborting request"
                );
                turn.abort();
            }
        }

        result
    }

    fn report(
        &mut self,
        exclusive: &mut Exclusive<'_>,
        coordinator: &OrderedCoordinator<'_>,
        matches: &MatchResult,
    ) -> Result<(), AnalysisError> {
        let word = self.word;
        let channel = &mut *exclusive.channel;

        channel.send_line("")?;
        channel.send_line(&protocol::word_header(word.sequence_id, &word.text))?;
        channel.send_line(&protocol::matches_line(&matches.ranked))?;

        if matches.is_exact() {
            channel.send_line(&protocol::present_line(&word.text))?;
            exclusive.output.push(&word.text);
            return Ok(());
        }

        channel.send_line(&protocol::not_present_line(&word.text))?;
        self.transition(WorkerState::AwaitingConfirmation);
        let answer = confirm(channel)?;
        self.transition(WorkerState::Reporting);

        match answer {
            Confirmation::Add => {
                if coordinator.dictionary().insert(&word.text) {
                    debug!(word = %word.text, "Added to dictionary");
                    exclusive.words_added.push(word.text.clone());
                }
                exclusive.output.push(&word.text);
            }
            Confirmation::Decline => {
                // An empty dictionary has no best match; keep the word as typed
                let replacement = matches
                    .best()
                    .map_or(word.text.as_str(), |best| best.entry.as_str());
                exclusive.output.push(replacement);
            }
        }

        Ok(())
    }

    fn transition(&mut self, next: WorkerState) {
        trace!(seq = self.word.sequence_id, from = %self.state, to = %next, "Worker state");
        self.state = next;
    }
}

/// Prompt until the client gives a well-formed answer
fn confirm(channel: &mut dyn ClientChannel) -> Result<Confirmation, AnalysisError> {
    channel.send_prompt(protocol::CONFIRM_PROMPT)?;

    loop {
        let answer = channel.read_line()?;
        match Confirmation::parse(&answer) {
            Ok(confirmation) => return Ok(confirmation),
            Err(err) => {
                debug!(error = %err, "Re-prompting");
                channel.send_prompt(protocol::RETRY_PROMPT)?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mock::ScriptedChannel;

    #[test]
    fn test_parse_confirmation() {
        assert_eq!(Confirmation::parse("y").unwrap(), Confirmation::Add);
        assert_eq!(Confirmation::parse("Y").unwrap(), Confirmation::Add);
        assert_eq!(Confirmation::parse("n").unwrap(), Confirmation::Decline);
        assert_eq!(Confirmation::parse("N").unwrap(), Confirmation::Decline);
        assert_eq!(Confirmation::parse("").unwrap(), Confirmation::Decline);
        assert!(matches!(
            Confirmation::parse("yes"),
            Err(AnalysisError::MalformedConfirmation(_))
        ));
        assert!(matches!(
            Confirmation::parse(" y "),
            Err(AnalysisError::MalformedConfirmation(_))
        ));
        assert!(matches!(
            Confirmation::parse(" "),
            Err(AnalysisError::MalformedConfirmation(_))
        ));
    }

    #[test]
    fn test_confirm_retries_until_valid() {
        let mut channel = ScriptedChannel::new(["maybe", "yes", "Y"]);
        assert_eq!(confirm(&mut channel).unwrap(), Confirmation::Add);
        assert_eq!(
            channel.prompts(),
            vec![
                protocol::CONFIRM_PROMPT,
                protocol::RETRY_PROMPT,
                protocol::RETRY_PROMPT
            ]
        );
    }

    #[test]
    fn test_confirm_disconnect() {
        let mut channel = ScriptedChannel::new(["what"]);
        assert!(matches!(confirm(&mut channel), Err(AnalysisError::ClientDisconnected)));
    }

    #[test]
    fn test_initial_state() {
        let word = Word {
            text: "hello".to_string(),
            group_index: 0,
            sequence_id: 1,
        };
        assert_eq!(WordWorker::new(&word).state(), WorkerState::Computing);
    }
}
