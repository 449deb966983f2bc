//! Comparison error taxonomy.
//!
//! Per-run errors (everything except `ShapeMismatch` and `NoValidRuns`) are
//! caught at the run boundary in lenient sessions and turn the run into a
//! missing score. `ShapeMismatch` always aborts the session.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum CompareError {
    #[error("series time ranges do not overlap ({observed_start}..{observed_end} vs {simulated_start}..{simulated_end})")]
    EmptyOverlap {
        observed_start: i64,
        observed_end: i64,
        simulated_start: i64,
        simulated_end: i64,
    },

    #[error("{context} needs at least {required} points, got {actual}")]
    InsufficientData {
        context: String,
        required: usize,
        actual: usize,
    },

    #[error("degenerate range: {0}")]
    DegenerateRange(String),

    #[error("score vectors disagree: {0}")]
    ShapeMismatch(String),

    #[error("timestamp {timestamp} lies outside the simulated range {start}..{end}")]
    OutOfRange { timestamp: i64, start: i64, end: i64 },

    #[error("run has no series for variable '{0}'")]
    MissingVariable(String),

    #[error("metric produced a non-finite score ({0})")]
    NonFiniteScore(String),

    #[error("no run has a valid aggregate score")]
    NoValidRuns,
}

impl CompareError {
    pub(crate) fn insufficient(context: &str, required: usize, actual: usize) -> Self {
        Self::InsufficientData {
            context: context.to_string(),
            required,
            actual,
        }
    }

    /// Whether this error invalidates the whole session rather than one run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ShapeMismatch(_) | Self::NoValidRuns)
    }
}
