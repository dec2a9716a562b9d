//! Inventory error types

use thiserror::Error;

/// Inventory errors; both variants mean the cluster set is unknown
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Cluster registry unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Malformed cluster record '{record}': {reason}")]
    Malformed { record: String, reason: String },
}

impl InventoryError {
    pub fn malformed(record: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            record: record.into(),
            reason: reason.into(),
        }
    }

    /// A registry outage may clear; a malformed record will not
    pub fn is_transient(&self) -> bool {
        matches!(self, InventoryError::Unavailable { .. })
    }
}

/// Result type for inventory operations
pub type Result<T> = std::result::Result<T, InventoryError>;
