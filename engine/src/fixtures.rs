//! Canned traces for tests and benchmarks
//!
//! `play_first_candidate` stands in for a real solver: it opens with a fixed
//! word and then always guesses the alphabetically first answer still
//! consistent with the feedback so far. The choice depends only on the
//! feedback history, so traces built from it never conflict.

use crate::error::{LookupError, Result};
use crate::feedback::feedback;
use crate::oracle::{Oracle, Step, Trace, TraceMap};
use crate::word::Word;

/// Small answer list with plenty of shared letters.
pub const ANSWERS: &[&str] = &[
    "abide", "adore", "alert", "arose", "baker", "brave", "crane", "crate", "drake", "eerie",
    "flame", "grace", "hello", "irate", "later", "llama", "mason", "oater", "orate", "pious",
    "rated", "react", "roate", "sassy", "slate", "spear", "speed", "stare", "taker", "these",
    "trace", "water",
];

/// `ANSWERS` as packed words
pub fn answer_words() -> Vec<Word> {
    ANSWERS.iter().filter_map(|s| Word::parse(s).ok()).collect()
}

/// Play out `target` against `answers`, opening with `start`.
pub fn play_first_candidate(start: Word, target: Word, answers: &[Word]) -> Trace {
    let mut candidates: Vec<Word> = answers.to_vec();
    candidates.sort();
    candidates.dedup();

    let mut trace = Trace::new();
    let mut guess = start;
    loop {
        let fb = feedback(guess, target);
        trace.push(Step { guess, feedback: fb });
        if fb.is_solved() {
            return trace;
        }
        candidates.retain(|&c| c != guess && feedback(guess, c) == fb);
        match candidates.first() {
            Some(&next) => guess = next,
            // target missing from the answer list
            None => return trace,
        }
    }
}

/// Traces for every answer, opening with `start`.
pub fn first_candidate_traces(start: Word, answers: &[Word]) -> TraceMap {
    answers
        .iter()
        .map(|&t| (t, play_first_candidate(start, t, answers)))
        .collect()
}

/// An oracle answering from a fixed trace map
pub fn canned_oracle(traces: &TraceMap) -> impl Oracle + '_ {
    move |target: Word| -> Result<Trace> {
        traces
            .get(&target)
            .cloned()
            .ok_or_else(|| LookupError::oracle(target, "no canned trace"))
    }
}
