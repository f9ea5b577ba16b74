//! Line protocol
//!
//! The server and its client exchange plain text lines over one persistent
//! connection. Every message below is sent as its own line, except the
//! prompts that wait for an answer on the same line (`*_PROMPT`), which are
//! sent without a terminator.
//!
//! # Request Flow
//!
//! ```text
//! Server                                          Client
//!   |-- Please enter your input string: --------->|
//!   |<------------------------------ helo world --|
//!   |-- WORD 01: helo ---------------------------->|
//!   |-- MATCHES: hello (1), help (1), ... ------->|
//!   |-- WORD helo is not present in dictionary -->|
//!   |-- Do you want to add ... (y/N): ----------->|
//!   |<--------------------------------------- n --|
//!   |-- WORD 02: world --------------------------->|
//!   |   ...                                        |
//!   |-- INPUT: helo world ------------------------>|
//!   |-- OUTPUT: hello world ---------------------->|
//!   |-- Would you like to enter another input? --->|
//! ```

use crate::analysis::RankedEntry;

pub const GREETING: &str = "Hello, this is Text Analysis Server!";
pub const INPUT_PROMPT: &str = "Please enter your input string:";
pub const CONFIRM_PROMPT: &str = "Do you want to add this word to dictionary? (y/N):";
pub const RETRY_PROMPT: &str = "Wrong Input Please Enter Again (y/N):";
pub const CONTINUE_PROMPT: &str = "Would you like to enter another input?(y|Y):";
pub const NO_MORE_INPUT: &str = "No other input will be received";
pub const FAREWELL: &str = "Thank you for using Text Analysis Server! Good Bye!";

/// ANSI sequence that homes the cursor and clears the terminal
pub const CLEAR_SCREEN: &str = "\x1b[H\x1b[J";

/// `WORD 01: hello`
pub fn word_header(sequence_id: usize, word: &str) -> String {
    format!("WORD {:02}: {}", sequence_id, word)
}

/// `MATCHES: hello (0), cello (1), ...`
pub fn matches_line(ranked: &[RankedEntry]) -> String {
    let entries: Vec<String> = ranked.iter().map(ToString::to_string).collect();
    format!("MATCHES: {}", entries.join(", "))
}

pub fn present_line(word: &str) -> String {
    format!("WORD {} is present in dictionary", word)
}

pub fn not_present_line(word: &str) -> String {
    format!("WORD {} is not present in dictionary", word)
}

pub fn input_line(input: &str) -> String {
    format!("INPUT: {}", input)
}

pub fn output_line(output: &str) -> String {
    format!("OUTPUT: {}", output)
}

/// Parse the sequence id out of a `WORD NN: word` header
///
/// Returns `None` for any other line, including the membership lines that
/// also start with `WORD`.
pub fn parse_word_header(line: &str) -> Option<(usize, &str)> {
    let rest = line.strip_prefix("WORD ")?;
    let (id, word) = rest.split_once(": ")?;
    let id = id.parse().ok()?;
    Some((id, word))
}
