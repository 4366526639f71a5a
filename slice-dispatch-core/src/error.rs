//! Error types

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Failure raised by a reducer.
///
/// A reducer either returns a whole new state or this error; the store keeps
/// the prior state when it sees one.
#[derive(Debug)]
pub struct ReduceError {
    message: String,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl ReduceError {
    /// Create an error with a message only
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error wrapping an underlying cause
    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ReduceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for ReduceError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn StdError + 'static))
    }
}

/// Errors surfaced to callers of dispatch and the bound tables
#[derive(Error, Debug)]
pub enum Error {
    /// The reducer rejected an action; state was left unchanged
    #[error("reducer rejected action `{action}`: {source}")]
    Reduce {
        action: &'static str,
        #[source]
        source: ReduceError,
    },

    /// No creator or selector is registered under this name
    #[error("`{name}` is not callable")]
    NotCallable { name: String },

    /// The name exists but was invoked with different argument or return types
    #[error("`{name}` was called with the wrong signature, expected `{expected}`")]
    SignatureMismatch { name: String, expected: &'static str },
}

/// Result type for slice operations
pub type Result<T> = std::result::Result<T, Error>;
