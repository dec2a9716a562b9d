//! Configuration for the mesh control plane

use mesh_lifecycle::LifecycleConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix, e.g. `MESH_CONFLICT_RETRIES`
pub const ENV_PREFIX: &str = "MESH";

/// Main control plane configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPlaneConfig {
    /// Namespace holding aggregate plans
    #[serde(default = "default_system_namespace")]
    pub system_namespace: String,

    /// Generated-name prefix of per-cluster plan namespaces
    #[serde(default = "default_namespace_prefix")]
    pub namespace_prefix: String,

    /// Retries of create-or-update after a concurrent-modification conflict
    #[serde(default = "default_conflict_retries")]
    pub conflict_retries: u32,

    /// Cluster inventory configuration
    #[serde(default)]
    pub inventory: InventoryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            system_namespace: default_system_namespace(),
            namespace_prefix: default_namespace_prefix(),
            conflict_retries: default_conflict_retries(),
            inventory: InventoryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Cluster inventory configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// TOML cluster registry file, re-read on every listing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level, used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_system_namespace() -> String {
    "mesh-system".to_string()
}

fn default_namespace_prefix() -> String {
    "mesh-".to_string()
}

fn default_conflict_retries() -> u32 {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ControlPlaneConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `MESH_`-prefixed environment variables.
    ///
    /// Nested keys use a double underscore: `MESH_LOGGING__JSON=true`.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        Self::load_from(path, None)
    }

    fn load_from(
        path: Option<&str>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&ControlPlaneConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        builder.build()?.try_deserialize()
    }

    /// Settings handed to the lifecycle contexts
    pub fn lifecycle(&self) -> LifecycleConfig {
        LifecycleConfig {
            system_namespace: self.system_namespace.clone(),
            namespace_prefix: self.namespace_prefix.clone(),
            conflict_retries: self.conflict_retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ControlPlaneConfig::default();
        assert_eq!(config.system_namespace, "mesh-system");
        assert_eq!(config.namespace_prefix, "mesh-");
        assert_eq!(config.conflict_retries, 3);
        assert!(config.inventory.path.is_none());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.lifecycle(), LifecycleConfig::default());
    }

    #[test]
    fn test_load_without_sources_yields_defaults() {
        let config = ControlPlaneConfig::load_from(None, Some(config::Map::new())).unwrap();
        assert_eq!(config, ControlPlaneConfig::default());
    }

    #[test]
    fn test_file_then_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh.toml");
        std::fs::write(
            &path,
            "system_namespace = \"fleet-system\"\nconflict_retries = 5\n\n[inventory]\npath = \"/etc/mesh/clusters.toml\"\n",
        )
        .unwrap();

        let mut env = config::Map::new();
        env.insert("MESH_CONFLICT_RETRIES".to_string(), "7".to_string());
        env.insert("MESH_LOGGING__JSON".to_string(), "true".to_string());

        let config = ControlPlaneConfig::load_from(path.to_str(), Some(env)).unwrap();
        assert_eq!(config.system_namespace, "fleet-system");
        assert_eq!(config.namespace_prefix, "mesh-");
        assert_eq!(config.conflict_retries, 7);
        assert_eq!(
            config.inventory.path,
            Some(PathBuf::from("/etc/mesh/clusters.toml"))
        );
        assert!(config.logging.json);
    }

    #[test]
    fn test_missing_file_is_optional() {
        let config =
            ControlPlaneConfig::load_from(Some("/nonexistent/mesh"), Some(config::Map::new()))
                .unwrap();
        assert_eq!(config.conflict_retries, 3);
    }
}
