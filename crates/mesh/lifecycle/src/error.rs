//! Lifecycle error types

use mesh_types::{ResourceKind, ResourceReference};
use thiserror::Error;

/// Resource store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: ResourceKind,
        namespace: String,
        name: String,
    },

    #[error("{kind} {namespace}/{name} already exists")]
    AlreadyExists {
        kind: ResourceKind,
        namespace: String,
        name: String,
    },

    #[error("Conflict updating {kind} {namespace}/{name}: version {expected} is stale")]
    Conflict {
        kind: ResourceKind,
        namespace: String,
        name: String,
        expected: u64,
    },

    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),

    #[error("Resource store unavailable: {0}")]
    Unavailable(String),

    #[error("Resource store timed out: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound { .. } | StoreError::NamespaceNotFound(_)
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::Conflict { .. } | StoreError::AlreadyExists { .. }
        )
    }

    /// Whether retrying the reconciliation attempt may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout(_)) || self.is_conflict()
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Invalid request; never retried automatically
    #[error("Invalid cluster configuration: {0}")]
    Configuration(String),

    /// The referenced resource does not exist
    #[error("Resource not found: {0}")]
    NotFound(ResourceReference),

    /// The resource store failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl LifecycleError {
    pub fn is_transient(&self) -> bool {
        match self {
            LifecycleError::Store(err) => err.is_transient(),
            _ => false,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, LifecycleError>;
