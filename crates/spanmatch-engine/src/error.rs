//! Correlation-specific error types.

use thiserror::Error;

/// Errors that can occur during rule construction or an engine run.
///
/// Unmatched starts and stops are deliberately *not* errors: real traces are
/// truncated at both ends, so leftover pending state is discarded silently.
#[derive(Debug, Error)]
pub enum CorrelateError {
    /// A name pattern failed to compile.
    #[error("invalid regex pattern: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// A rule was configured with neither a start name pattern nor a start opcode.
    #[error("rule has no start predicate: set a start name pattern or a start opcode")]
    MissingStartMatcher,

    /// A rule was configured with neither a stop name pattern nor a stop opcode.
    #[error("rule has no stop predicate: set a stop name pattern or a stop opcode")]
    MissingStopMatcher,

    /// An event index referred past the end of the input sequence.
    #[error("event index {index} out of bounds for input of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// The input sequence violated the non-decreasing timestamp guarantee.
    #[error("input events are not sorted by start timestamp at index {index}")]
    UnsortedInput { index: usize },
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, CorrelateError>;
