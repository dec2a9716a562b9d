//! Error types for decision evaluation

use thiserror::Error;

/// Decision evaluation errors
#[derive(Debug, Error, Clone)]
pub enum PolicyError {
    /// The external policy evaluator could not be reached
    #[error("Policy fact source unavailable: {reason}")]
    FactSourceUnavailable { reason: String },

    /// The policy evaluator answered with facts that do not parse
    #[error("Invalid policy facts: {reason}")]
    InvalidFacts { reason: String },
}

impl PolicyError {
    /// Whether retrying the whole evaluation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, PolicyError::FactSourceUnavailable { .. })
    }
}

impl From<serde_json::Error> for PolicyError {
    fn from(err: serde_json::Error) -> Self {
        PolicyError::InvalidFacts {
            reason: err.to_string(),
        }
    }
}

/// Result type for policy operations
pub type Result<T> = std::result::Result<T, PolicyError>;
