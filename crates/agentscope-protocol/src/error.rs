//! Error types for the canonical event contract.

use thiserror::Error;

/// A structurally complete event that breaks a required-field rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// Failure to turn one line of JSON into a valid [`crate::CanonicalEvent`].
#[derive(Debug, Error)]
pub enum EventParseError {
    /// The line is not JSON at all.
    #[error("invalid JSON: {0}")]
    Syntax(#[source] serde_json::Error),
    /// JSON, but the wrong shape: missing field, unknown enum value, bad type.
    #[error("invalid event: {0}")]
    Schema(#[source] serde_json::Error),
    #[error("invalid event: {0}")]
    Invalid(#[from] ValidationError),
}

impl From<serde_json::Error> for EventParseError {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;
        match err.classify() {
            Category::Data => Self::Schema(err),
            Category::Syntax | Category::Eof | Category::Io => Self::Syntax(err),
        }
    }
}
