//! Error types for title extraction.
//!
//! "No match" outcomes (no PERSON span, no title keyword, empty name) are not
//! errors; they are silent drops inside the pipeline. Errors here are either
//! per-sentence tagging failures (recovered by the runner) or input-contract
//! violations surfaced to the caller.

use thiserror::Error;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for extraction operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The tagging collaborator was unreachable or returned malformed tags.
    #[error("Tagging failed: {0}")]
    Tagging(String),

    /// Invalid input provided (e.g. a source record without a text field).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded or failed validation.
    #[error("Config error: {0}")]
    Config(String),

    /// A grammar definition could not be parsed.
    #[error("Grammar error: {0}")]
    Grammar(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a tagging error.
    pub fn tagging(msg: impl Into<String>) -> Self {
        Error::Tagging(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a grammar error.
    pub fn grammar(msg: impl Into<String>) -> Self {
        Error::Grammar(msg.into())
    }
}
