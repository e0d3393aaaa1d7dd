//! Error taxonomy for the fault-localization engine.
//!
//! Load-side errors (malformed spectra, unreadable files) are fatal and
//! surface to the caller. `Executor` is the one recoverable kind: the
//! session drops the offending candidate and keeps going.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while loading spectra or executing candidate tests.
#[derive(Error, Debug)]
pub enum AveriaError {
    #[error("spectrum has no elements")]
    EmptyElements,

    #[error("spectrum has no tests")]
    NoTests,

    #[error("coverage matrix has {actual} rows but the spectrum has {expected} tests")]
    RowCountMismatch { expected: usize, actual: usize },

    #[error("coverage matrix row {row} has {actual} columns but the spectrum has {expected} elements")]
    ColumnCountMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate element id: {0}")]
    DuplicateElement(String),

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {what} at line {line}: {detail}")]
    Parse {
        what: &'static str,
        line: usize,
        detail: String,
    },

    #[error("test executor failed for '{test}': {reason}")]
    Executor { test: String, reason: String },
}

impl AveriaError {
    /// Whether the session loop may continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AveriaError::Executor { .. })
    }
}
