//! Input validation
//!
//! Applied to the raw request line before tokenization. Checks run in a fixed
//! order: length, emptiness, then character set. Hyphens are allowed so that
//! compounds such as `well-known` stay a single word.

use crate::error::AnalysisError;

/// Default maximum input length in characters
pub const INPUT_CHARACTER_LIMIT: usize = 100;

/// Validate a request line
///
/// `line` must already have its line terminator removed.
pub fn validate_input(line: &str, limit: usize) -> Result<(), AnalysisError> {
    let length = line.chars().count();
    if length > limit {
        return Err(AnalysisError::InputTooLong { length, limit });
    }

    if line.is_empty() {
        return Err(AnalysisError::InputEmpty);
    }

    if let Some(found) = line.chars().find(|&c| !is_allowed(c)) {
        return Err(AnalysisError::InvalidCharacter { found });
    }

    Ok(())
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphabetic() || c == ' ' || c == '-'
}
