//! Error types shared by table construction and inspection.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookupError {
    /// Input is not exactly five lowercase ASCII letters.
    #[error("invalid word {0:?}: expected 5 lowercase ASCII letters")]
    InvalidWord(String),

    #[error("invalid feedback code {0}: expected 0..=242")]
    InvalidFeedback(u16),

    #[error("invalid depth {0}: expected 1..={max}", max = crate::MAX_DEPTH)]
    InvalidDepth(u32),

    /// The external solver failed or produced an unusable trace.
    /// Fatal to the whole generation run.
    #[error("oracle failed for '{target}': {reason}")]
    OracleFailure { target: String, reason: String },

    /// Two traces reached the same branch but chose different guesses.
    #[error(
        "determinism conflict at prefix {prefix:?} fb={feedback}: \
         existing guess '{existing}', '{target}' wants '{candidate}'"
    )]
    DeterminismConflict {
        prefix: Vec<u8>,
        feedback: u8,
        existing: String,
        candidate: String,
        target: String,
    },

    #[error("format error: {0}")]
    FormatError(String),

    #[error("table too large: offset {0} does not fit in u32")]
    TableTooLarge(usize),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl LookupError {
    pub(crate) fn oracle(target: impl ToString, reason: impl Into<String>) -> Self {
        LookupError::OracleFailure {
            target: target.to_string(),
            reason: reason.into(),
        }
    }

    pub fn format(msg: impl Into<String>) -> Self {
        LookupError::FormatError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, LookupError>;
