//! Error types for Homeguard.
//!
//! Only the request validator rejects input. Events the rule table has no
//! specific rule for are not errors; they resolve to the `ignore` verdict.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssessError {
    /// The request is unparsable or lacks a required field.
    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

impl AssessError {
    pub fn malformed(message: impl Into<String>) -> Self {
        AssessError::MalformedInput(message.into())
    }

    /// Stable machine-readable identifier for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AssessError::MalformedInput(_) => "malformed_input",
        }
    }
}

impl From<serde_json::Error> for AssessError {
    fn from(err: serde_json::Error) -> Self {
        AssessError::MalformedInput(format!("invalid JSON: {err}"))
    }
}

pub type AssessResult<T> = Result<T, AssessError>;
