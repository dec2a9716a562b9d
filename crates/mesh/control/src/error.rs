//! Error types for the control plane

use thiserror::Error;

/// Control plane error type
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    /// Policy evaluation failed
    #[error("Policy error: {0}")]
    Policy(#[from] mesh_policy::PolicyError),

    /// Cluster inventory could not be read
    #[error("Inventory error: {0}")]
    Inventory(#[from] mesh_inventory::InventoryError),

    /// Plan resource lifecycle error
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] mesh_lifecycle::LifecycleError),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ControlPlaneError {
    /// Whether the caller should retry the reconciliation later
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Policy(err) => err.is_transient(),
            Self::Inventory(err) => err.is_transient(),
            Self::Lifecycle(err) => err.is_transient(),
            Self::Config(_) | Self::InvalidRequest(_) => false,
        }
    }
}

/// Result type for control plane operations
pub type Result<T> = std::result::Result<T, ControlPlaneError>;
