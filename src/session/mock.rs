//! Scripted client channel for testing
//!
//! `ScriptedChannel` plays back a fixed list of client replies and records
//! everything the server sends. Once the replies run out, reads fail with
//! `ClientDisconnected`, which is exactly what a closed socket looks like.
//!
//! # Example
//!
//! ```
//! use textpulse::session::mock::ScriptedChannel;
//! use textpulse::session::ClientChannel;
//!
//! let mut channel = ScriptedChannel::new(["y"]);
//! channel.send_line("WORD 01: helo").unwrap();
//! assert_eq!(channel.read_line().unwrap(), "y");
//! assert!(channel.read_line().is_err());
//! assert_eq!(channel.lines(), vec!["WORD 01: helo"]);
//! ```

use super::channel::ClientChannel;
use crate::error::AnalysisError;
use crate::protocol;
use std::collections::VecDeque;

/// One message written by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Line(String),
    Prompt(String),
}

/// In-memory client that answers from a script
#[derive(Debug, Default)]
pub struct ScriptedChannel {
    replies: VecDeque<String>,
    transcript: Vec<Sent>,
    reads: usize,
    timeout_at_end: bool,
}

impl ScriptedChannel {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
            reads: 0,
            timeout_at_end: false,
        }
    }

    /// Fail reads past the script with `ClientTimeout` instead of a disconnect
    pub fn with_timeout_at_end(mut self) -> Self {
        self.timeout_at_end = true;
        self
    }

    /// Queue another reply after the scripted ones
    pub fn push_reply(&mut self, reply: impl Into<String>) {
        self.replies.push_back(reply.into());
    }

    /// Everything sent so far, in order
    pub fn transcript(&self) -> &[Sent] {
        &self.transcript
    }

    /// Full lines sent so far (prompts excluded)
    pub fn lines(&self) -> Vec<&str> {
        self.transcript
            .iter()
            .filter_map(|sent| match sent {
                Sent::Line(line) => Some(line.as_str()),
                Sent::Prompt(_) => None,
            })
            .collect()
    }

    /// Prompts sent so far
    pub fn prompts(&self) -> Vec<&str> {
        self.transcript
            .iter()
            .filter_map(|sent| match sent {
                Sent::Prompt(prompt) => Some(prompt.as_str()),
                Sent::Line(_) => None,
            })
            .collect()
    }

    /// `(sequence_id, word)` of every `WORD NN:` header, in emission order
    pub fn word_headers(&self) -> Vec<(usize, String)> {
        self.lines()
            .into_iter()
            .filter_map(protocol::parse_word_header)
            .map(|(id, word)| (id, word.to_string()))
            .collect()
    }

    /// The first line starting with `prefix`
    pub fn line_starting_with(&self, prefix: &str) -> Option<&str> {
        self.lines().into_iter().find(|line| line.starts_with(prefix))
    }

    /// Number of reads served, including the failing one at end of script
    pub fn reads(&self) -> usize {
        self.reads
    }

    pub fn remaining_replies(&self) -> usize {
        self.replies.len()
    }
}

impl ClientChannel for ScriptedChannel {
    fn send_line(&mut self, line: &str) -> Result<(), AnalysisError> {
        self.transcript.push(Sent::Line(line.to_string()));
        Ok(())
    }

    fn send_prompt(&mut self, prompt: &str) -> Result<(), AnalysisError> {
        self.transcript.push(Sent::Prompt(prompt.to_string()));
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, AnalysisError> {
        self.reads += 1;
        match self.replies.pop_front() {
            Some(reply) => Ok(reply),
            None if self.timeout_at_end => Err(AnalysisError::ClientTimeout),
            None => Err(AnalysisError::ClientDisconnected),
        }
    }
}
