//! Sentence grouping
//!
//! Splits a validated sentence into groups so that no group contains the same
//! word twice. A repeated word closes the current group and starts the next
//! one, which lets a later occurrence see a dictionary addition confirmed for
//! an earlier one.
//!
//! ```text
//! hello ege abdullah ege hello hello
//!
//! group 0: hello(1) ege(2) abdullah(3)
//! group 1: ege(4) hello(5)
//! group 2: hello(6)
//! ```
//!
//! Sequence ids follow the flattened group-then-word order shown above.

use super::{Group, Word};
use crate::error::AnalysisError;
use std::collections::HashSet;

/// Split `input` on whitespace into duplicate-free groups
///
/// Tokens are lower-cased, so duplicates are detected case-insensitively.
/// Returns `InputEmpty` when the input holds no tokens at all.
pub fn group_words(input: &str) -> Result<Vec<Group>, AnalysisError> {
    let mut groups: Vec<Group> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for token in input.split_whitespace() {
        let token = token.to_lowercase();
        if seen.contains(&token) {
            close_group(&mut groups, std::mem::take(&mut current));
            seen.clear();
        }
        seen.insert(token.clone());
        current.push(token);
    }

    if !current.is_empty() {
        close_group(&mut groups, current);
    }

    if groups.is_empty() {
        return Err(AnalysisError::InputEmpty);
    }

    Ok(groups)
}

/// Append a finished group, numbering its words after the previous groups
fn close_group(groups: &mut Vec<Group>, texts: Vec<String>) {
    let index = groups.len();
    let first_id = groups.iter().map(Group::len).sum::<usize>() + 1;

    let words = texts
        .into_iter()
        .enumerate()
        .map(|(offset, text)| Word {
            text,
            group_index: index,
            sequence_id: first_id + offset,
        })
        .collect();

    groups.push(Group { index, words });
}

/// Total number of words across all groups
pub fn word_count(groups: &[Group]) -> usize {
    groups.iter().map(Group::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_words_split_groups() {
        let groups = group_words("hello ege abdullah ege hello hello").unwrap();

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].texts(), vec!["hello", "ege", "abdullah"]);
        assert_eq!(groups[1].texts(), vec!["ege", "hello"]);
        assert_eq!(groups[2].texts(), vec!["hello"]);

        let ids: Vec<usize> = groups
            .iter()
            .flat_map(|g| g.words.iter().map(|w| w.sequence_id))
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);

        for group in &groups {
            assert!(group.words.iter().all(|w| w.group_index == group.index));
        }
    }

    #[test]
    fn test_single_group_without_duplicates() {
        let groups = group_words("the quick brown fox").unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 4);
        assert_eq!(word_count(&groups), 4);
    }

    #[test]
    fn test_duplicates_are_case_insensitive() {
        let groups = group_words("Hello HELLO").unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].texts(), vec!["hello"]);
        assert_eq!(groups[1].texts(), vec!["hello"]);
    }

    #[test]
    fn test_groups_are_duplicate_free() {
        let groups = group_words("a b a c b a d a a").unwrap();
        for group in &groups {
            let unique: HashSet<&str> = group.texts().into_iter().collect();
            assert_eq!(unique.len(), group.len());
        }
        assert_eq!(word_count(&groups), 9);
    }

    #[test]
    fn test_extra_whitespace_ignored() {
        let groups = group_words("  one   two  ").unwrap();
        assert_eq!(groups[0].texts(), vec!["one", "two"]);
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        assert!(matches!(group_words("    "), Err(AnalysisError::InputEmpty)));
        assert!(matches!(group_words(""), Err(AnalysisError::InputEmpty)));
    }

    #[test]
    fn test_hyphenated_word_is_one_token() {
        let groups = group_words("well-known well").unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].texts(), vec!["well-known", "well"]);
    }
}
