//! Validation errors raised at the data-model boundary

use thiserror::Error;

/// Errors raised while parsing or validating decision-model values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid deployment status '{0}', expected one of True, False, Unknown")]
    InvalidDeploymentStatus(String),

    #[error("invalid optimization directive '{0}', expected min or max")]
    InvalidDirective(String),

    #[error("invalid weight '{value}': {reason}")]
    InvalidWeight { value: String, reason: String },

    #[error("restriction on '{property}' sets both a value list and a range")]
    AmbiguousRestriction { property: String },

    #[error("invalid resource kind '{0}'")]
    InvalidResourceKind(String),
}
