//! Lifecycle configuration

use serde::{Deserialize, Serialize};

/// Settings shared by both lifecycle contexts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Namespace holding aggregate plans
    pub system_namespace: String,

    /// Prefix of generated per-cluster plan namespaces
    pub namespace_prefix: String,

    /// Extra attempts after a concurrent-modification conflict
    pub conflict_retries: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            system_namespace: "mesh-system".to_string(),
            namespace_prefix: "mesh-".to_string(),
            conflict_retries: 3,
        }
    }
}

impl LifecycleConfig {
    pub fn with_system_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.system_namespace = namespace.into();
        self
    }

    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.conflict_retries = retries;
        self
    }
}
