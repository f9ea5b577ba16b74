//! Edit distance and ranking
//!
//! `distance` is the classic Levenshtein distance (unit-cost insert, delete,
//! substitute). The dynamic programming table is evaluated one row at a time,
//! keeping only the previous and current rows.
//!
//! `rank` scores a word against every entry of a dictionary snapshot in
//! parallel and keeps the `k` closest entries ordered by `(distance, entry)`.

use super::{MatchResult, RankedEntry, Word};
use crate::dictionary::DictionarySnapshot;
use rayon::prelude::*;
use std::cmp::Ordering;

/// Levenshtein distance between `a` and `b`, over characters
pub fn distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    // Iterate rows over the longer string so the rows stay short
    let (rows, cols) = if a.len() >= b.len() { (&a, &b) } else { (&b, &a) };
    let n = cols.len();

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0; n + 1];

    for (i, &rc) in rows.iter().enumerate() {
        curr[0] = i + 1;
        for j in 1..=n {
            curr[j] = if rc == cols[j - 1] {
                prev[j - 1]
            } else {
                1 + prev[j].min(curr[j - 1]).min(prev[j - 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Ranking order: distance first, then entry text
pub fn compare_ranked(a: &RankedEntry, b: &RankedEntry) -> Ordering {
    a.distance
        .cmp(&b.distance)
        .then_with(|| a.entry.cmp(&b.entry))
}

/// Rank the `k` closest snapshot entries to `word`
///
/// The snapshot must hold at least `k` entries for a full list; the loader
/// enforces this for the server. With fewer entries every entry is returned.
pub fn rank(word: &Word, snapshot: &DictionarySnapshot, k: usize) -> MatchResult {
    let mut ranked: Vec<RankedEntry> = snapshot
        .entries()
        .par_iter()
        .map(|entry| RankedEntry {
            distance: distance(&word.text, entry),
            entry: entry.clone(),
        })
        .collect();

    ranked.par_sort_unstable_by(compare_ranked);
    ranked.truncate(k);

    MatchResult {
        word: word.clone(),
        ranked,
    }
}
