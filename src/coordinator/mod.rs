//! Ordered coordinator
//!
//! Resolves the words of one request concurrently while keeping everything
//! the client sees in input order.
//!
//! # Architecture
//!
//! ```text
//! OrderedCoordinator::run(groups)
//!   for each group:
//!     ├─ spawn one scoped thread per word ──> WordWorker::run
//!     │     ├─ rank (parallel, no lock)
//!     │     └─ TurnGate::wait_for(sequence_id)
//!     │           └─ report / confirm / append output   (exclusive)
//!     └─ join all workers (barrier before the next group)
//! ```
//!
//! Ranking overlaps freely; the exclusive region (client channel, output
//! assembler, dictionary inserts) is entered strictly by ascending sequence
//! id. Groups never contain a word twice, and the barrier between groups
//! makes a word confirmed in one group visible to every later group.
//!
//! # Failure
//!
//! The first worker that fails aborts the request through the gate. Later
//! workers still take their turn, see the abort and return
//! `RequestAborted`. `run` reports the root cause, not the aborts.

pub mod turn;
pub mod worker;

pub use turn::{Turn, TurnGate};
pub use worker::{Confirmation, WorkerState};

use crate::analysis::{self, Group, MatchResult, Word};
use crate::dictionary::{DictionarySnapshot, DictionaryStore};
use crate::error::AnalysisError;
use crate::output::OutputAssembler;
use crate::session::ClientChannel;
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;
use tracing::{debug, error, warn};
use worker::WordWorker;

type WorkerResult = Result<(), AnalysisError>;

/// Ranks a word against a dictionary snapshot
///
/// Called concurrently from every worker of a group, outside the exclusive
/// region.
pub trait Ranker: Send + Sync {
    fn rank(&self, word: &Word, snapshot: &DictionarySnapshot, k: usize) -> MatchResult;
}

/// Levenshtein top-K ranking
#[derive(Debug, Clone, Copy, Default)]
pub struct EditDistanceRanker;

impl Ranker for EditDistanceRanker {
    fn rank(&self, word: &Word, snapshot: &DictionarySnapshot, k: usize) -> MatchResult {
        analysis::rank(word, snapshot, k)
    }
}

static EDIT_DISTANCE: EditDistanceRanker = EditDistanceRanker;

/// State only the worker holding the turn may touch
pub struct Exclusive<'c> {
    pub(crate) channel: &'c mut dyn ClientChannel,
    pub(crate) output: OutputAssembler,
    pub(crate) words_added: Vec<String>,
}

/// Result of a fully resolved request
#[derive(Debug)]
pub struct Resolution {
    /// Resolved words in input order; `finish` applies the output limit
    pub output: OutputAssembler,
    /// Words the client confirmed into the dictionary, in order
    pub words_added: Vec<String>,
}

/// Runs the workers of one request
pub struct OrderedCoordinator<'a> {
    gate: TurnGate<Exclusive<'a>>,
    dictionary: &'a DictionaryStore,
    ranker: &'a dyn Ranker,
    top_k: usize,
}

impl<'a> OrderedCoordinator<'a> {
    pub fn new(
        channel: &'a mut dyn ClientChannel,
        dictionary: &'a DictionaryStore,
        top_k: usize,
        output_limit: usize,
    ) -> Self {
        let exclusive = Exclusive {
            channel,
            output: OutputAssembler::new(output_limit),
            words_added: Vec::new(),
        };

        Self {
            gate: TurnGate::new(1, exclusive),
            dictionary,
            ranker: &EDIT_DISTANCE,
            top_k,
        }
    }

    /// Replace the ranking strategy
    pub fn with_ranker(mut self, ranker: &'a dyn Ranker) -> Self {
        self.ranker = ranker;
        self
    }

    /// Resolve every group in order
    ///
    /// Sequence ids must run 1, 2, 3, ... across the groups, as produced by
    /// `group_words`.
    pub fn run(self, groups: &[Group]) -> Result<Resolution, AnalysisError> {
        let start = Instant::now();

        for group in groups {
            self.run_group(group)?;
        }

        let exclusive = self.gate.into_inner();
        debug!(
            groups = groups.len(),
            words = exclusive.output.word_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Request resolved"
        );

        Ok(Resolution {
            output: exclusive.output,
            words_added: exclusive.words_added,
        })
    }

    fn run_group(&self, group: &Group) -> WorkerResult {
        debug!(group = group.index, words = group.len(), "Resolving group");

        let outcomes: Vec<WorkerResult> = thread::scope(|scope| {
            let mut slots = Vec::with_capacity(group.len());

            for word in &group.words {
                let spawned = thread::Builder::new()
                    .name(format!("word-{:02}", word.sequence_id))
                    .spawn_scoped(scope, move || WordWorker::new(word).run(self));

                match spawned {
                    Ok(handle) => slots.push(Slot::Running(handle)),
                    Err(e) => {
                        // Earlier words are already running, so resolving this
                        // one inline cannot block on a ticket that never comes
                        warn!(seq = word.sequence_id, error = %e, "Failed to spawn worker, resolving inline");
                        slots.push(Slot::Finished(WordWorker::new(word).run(self)));
                    }
                }
            }

            slots.into_iter().map(Slot::join).collect()
        });

        match first_failure(outcomes) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub(crate) fn gate(&self) -> &TurnGate<Exclusive<'a>> {
        &self.gate
    }

    pub(crate) fn dictionary(&self) -> &DictionaryStore {
        self.dictionary
    }

    pub(crate) fn ranker(&self) -> &dyn Ranker {
        self.ranker
    }

    pub(crate) fn top_k(&self) -> usize {
        self.top_k
    }
}

enum Slot<'scope> {
    Running(ScopedJoinHandle<'scope, WorkerResult>),
    Finished(WorkerResult),
}

impl Slot<'_> {
    fn join(self) -> WorkerResult {
        match self {
            Slot::Running(handle) => handle.join().unwrap_or_else(|_| {
                error!("Word worker panicked");
                Err(AnalysisError::WorkerPanicked)
            }),
            Slot::Finished(result) => result,
        }
    }
}

/// Root cause of a failed group: the first error that is not an abort
fn first_failure(outcomes: Vec<WorkerResult>) -> Option<AnalysisError> {
    let mut aborted = None;

    for outcome in outcomes {
        match outcome {
            Ok(()) => {}
            Err(AnalysisError::RequestAborted) => {
                aborted.get_or_insert(AnalysisError::RequestAborted);
            }
            Err(err) => return Some(err),
        }
    }

    aborted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::group_words;
    use crate::session::mock::ScriptedChannel;
    use rand::Rng;
    use std::time::Duration;

    const TOP_K: usize = 5;

    fn store() -> DictionaryStore {
        DictionaryStore::from_words(
            [
                "hello", "world", "help", "hall", "cello", "yellow", "the", "quick", "brown",
                "fox", "jumps", "over", "lazy", "dog",
            ]
            .into_iter()
            .map(String::from),
        )
    }

    fn resolve(
        input: &str,
        channel: &mut ScriptedChannel,
        dictionary: &DictionaryStore,
    ) -> Result<Resolution, AnalysisError> {
        let groups = group_words(input).unwrap();
        OrderedCoordinator::new(channel, dictionary, TOP_K, 200).run(&groups)
    }

    /// Sleeps a random amount before ranking, so workers finish out of order
    struct JitterRanker;

    impl Ranker for JitterRanker {
        fn rank(&self, word: &Word, snapshot: &DictionarySnapshot, k: usize) -> MatchResult {
            let delay = rand::thread_rng().gen_range(0..20);
            thread::sleep(Duration::from_millis(delay));
            analysis::rank(word, snapshot, k)
        }
    }

    struct PanickingRanker {
        target: &'static str,
    }

    impl Ranker for PanickingRanker {
        fn rank(&self, word: &Word, snapshot: &DictionarySnapshot, k: usize) -> MatchResult {
            if word.text == self.target {
                panic!("ranker failure");
            }
            analysis::rank(word, snapshot, k)
        }
    }

    #[test]
    fn test_headers_follow_input_order() {
        let dictionary = store();
        let input = "the quick brown fox jumps over the lazy dog";
        let groups = group_words(input).unwrap();

        for _ in 0..5 {
            let mut channel = ScriptedChannel::new(Vec::<String>::new());
            let resolution = OrderedCoordinator::new(&mut channel, &dictionary, TOP_K, 200)
                .with_ranker(&JitterRanker)
                .run(&groups)
                .unwrap();

            let ids: Vec<usize> = channel.word_headers().into_iter().map(|(id, _)| id).collect();
            assert_eq!(ids, (1..=9).collect::<Vec<_>>());
            assert_eq!(resolution.output.finish().unwrap(), input);
        }
    }

    #[test]
    fn test_exact_word_reported_present() {
        let dictionary = store();
        let mut channel = ScriptedChannel::new(Vec::<String>::new());
        let resolution = resolve("hello", &mut channel, &dictionary).unwrap();

        assert_eq!(
            channel.lines(),
            vec![
                "",
                "WORD 01: hello",
                "MATCHES: hello (0), cello (1), hall (2), help (2), yellow (2)",
                "WORD hello is present in dictionary",
            ]
        );
        assert!(channel.prompts().is_empty());
        assert_eq!(resolution.output.finish().unwrap(), "hello");
    }

    #[test]
    fn test_decline_uses_best_match() {
        let dictionary = store();
        let mut channel = ScriptedChannel::new(["n"]);
        let resolution = resolve("helo", &mut channel, &dictionary).unwrap();

        assert_eq!(resolution.output.finish().unwrap(), "hello");
        assert!(resolution.words_added.is_empty());
        assert!(!dictionary.contains("helo"));
    }

    #[test]
    fn test_empty_answer_declines() {
        let dictionary = store();
        let mut channel = ScriptedChannel::new([""]);
        let resolution = resolve("wrld", &mut channel, &dictionary).unwrap();
        assert_eq!(resolution.output.finish().unwrap(), "world");
    }

    #[test]
    fn test_malformed_answer_is_retried() {
        let dictionary = store();
        let mut channel = ScriptedChannel::new(["maybe", "Y"]);
        let resolution = resolve("helo", &mut channel, &dictionary).unwrap();

        assert_eq!(
            channel.prompts(),
            vec![crate::protocol::CONFIRM_PROMPT, crate::protocol::RETRY_PROMPT]
        );
        assert_eq!(resolution.output.finish().unwrap(), "helo");
        assert_eq!(resolution.words_added, vec!["helo"]);
    }

    #[test]
    fn test_confirmed_word_visible_to_later_group() {
        let dictionary = store();
        // Groups: [helo, world] [helo]
        let mut channel = ScriptedChannel::new(["y"]);
        let resolution = resolve("helo world helo", &mut channel, &dictionary).unwrap();

        assert_eq!(resolution.output.finish().unwrap(), "helo world helo");
        assert_eq!(resolution.words_added, vec!["helo"]);
        assert!(dictionary.contains("helo"));

        // Only the first occurrence asked; the second saw distance 0
        assert_eq!(channel.prompts().len(), 1);
        let present: Vec<&str> = channel
            .lines()
            .into_iter()
            .filter(|line| *line == "WORD helo is present in dictionary")
            .collect();
        assert_eq!(present.len(), 1);
        assert_eq!(
            channel.word_headers(),
            vec![
                (1, "helo".to_string()),
                (2, "world".to_string()),
                (3, "helo".to_string())
            ]
        );
    }

    #[test]
    fn test_disconnect_aborts_without_deadlock() {
        let dictionary = store();
        let mut channel = ScriptedChannel::new(Vec::<String>::new());
        let result = resolve("helo wrld abc hello", &mut channel, &dictionary);

        assert!(matches!(result, Err(AnalysisError::ClientDisconnected)));
        // Nothing reported after the failing word
        assert_eq!(channel.word_headers(), vec![(1, "helo".to_string())]);
    }

    #[test]
    fn test_disconnect_in_later_group() {
        let dictionary = store();
        // Groups: [hello, world] [hello, helo]
        let mut channel = ScriptedChannel::new(Vec::<String>::new());
        let result = resolve("hello world hello helo", &mut channel, &dictionary);

        assert!(matches!(result, Err(AnalysisError::ClientDisconnected)));
        assert_eq!(channel.word_headers().len(), 4);
    }

    #[test]
    fn test_panicking_worker_reported() {
        let dictionary = store();
        let ranker = PanickingRanker { target: "brown" };
        let groups = group_words("the quick brown fox").unwrap();
        let mut channel = ScriptedChannel::new(Vec::<String>::new());

        let result = OrderedCoordinator::new(&mut channel, &dictionary, TOP_K, 200)
            .with_ranker(&ranker)
            .run(&groups);

        assert!(matches!(result, Err(AnalysisError::WorkerPanicked)));
    }

    #[test]
    fn test_output_limit_checked_after_resolution() {
        let dictionary = store();
        let groups = group_words("the quick brown fox").unwrap();
        let mut channel = ScriptedChannel::new(Vec::<String>::new());

        let resolution = OrderedCoordinator::new(&mut channel, &dictionary, TOP_K, 10)
            .run(&groups)
            .unwrap();

        assert_eq!(channel.word_headers().len(), 4);
        match resolution.output.finish() {
            Err(AnalysisError::OutputTooLong { output, .. }) => {
                assert_eq!(output, "the quick brown fox")
            }
            other => panic!("expected OutputTooLong, got {:?}", other),
        }
    }

    #[test]
    fn test_first_failure_prefers_root_cause() {
        let outcomes = vec![
            Ok(()),
            Err(AnalysisError::ClientTimeout),
            Err(AnalysisError::RequestAborted),
        ];
        assert!(matches!(first_failure(outcomes), Some(AnalysisError::ClientTimeout)));

        let outcomes = vec![Ok(()), Err(AnalysisError::RequestAborted)];
        assert!(matches!(first_failure(outcomes), Some(AnalysisError::RequestAborted)));

        assert!(first_failure(vec![Ok(()), Ok(())]).is_none());
    }
}
