//! Error types for annoscore.

use thiserror::Error;

/// Result type for annoscore operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for annoscore operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Span construction or mutation produced an invalid interval.
    #[error("Invalid span: start {start} > end {end}")]
    InvalidSpan {
        /// Offending start offset.
        start: usize,
        /// Offending end offset.
        end: usize,
    },

    /// An annotation carried no spans where at least one is required.
    #[error("Annotation {0} has no spans")]
    EmptyAnnotation(i64),

    /// Invalid evaluation configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Evaluation failed or an evaluation invariant was violated.
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Parse error (policy names, patterns).
    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Create an invalid-span error.
    pub fn invalid_span(start: usize, end: usize) -> Self {
        Error::InvalidSpan { start, end }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an evaluation error.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Error::Evaluation(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }
}
