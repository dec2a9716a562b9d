//! Cluster registry sources
//!
//! A registry exposes one key-value record per remote cluster with at least
//! the `ClusterName`, `Region` and `Zone` keys.

use crate::error::{InventoryError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::debug;

/// One registry record describing a remote cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterRecord {
    /// Identifier of the record within its registry
    pub id: String,
    pub data: BTreeMap<String, String>,
}

impl ClusterRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }
}

/// External source of cluster records
#[async_trait]
pub trait ClusterRegistry: Send + Sync {
    /// Read the current records; always a fresh read
    async fn records(&self) -> Result<Vec<ClusterRecord>>;
}

/// In-memory registry for development and testing
pub struct InMemoryClusterRegistry {
    records: DashMap<String, ClusterRecord>,
    outage: RwLock<Option<String>>,
}

impl InMemoryClusterRegistry {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            outage: RwLock::new(None),
        }
    }

    /// Add or replace a record
    pub fn register(&self, record: ClusterRecord) {
        self.records.insert(record.id.clone(), record);
    }

    pub fn remove(&self, id: &str) {
        self.records.remove(id);
    }

    /// Simulate an unreachable registry; `None` restores it
    pub async fn set_outage(&self, reason: Option<String>) {
        *self.outage.write().await = reason;
    }
}

impl Default for InMemoryClusterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClusterRegistry for InMemoryClusterRegistry {
    async fn records(&self) -> Result<Vec<ClusterRecord>> {
        if let Some(reason) = self.outage.read().await.as_ref() {
            return Err(InventoryError::Unavailable {
                reason: reason.clone(),
            });
        }
        Ok(self.records.iter().map(|r| r.value().clone()).collect())
    }
}

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(default)]
    clusters: Vec<BTreeMap<String, String>>,
}

/// Registry backed by a TOML file, re-read on every call.
///
/// ```toml
/// [[clusters]]
/// ClusterName = "remote-cluster"
/// Region = "Region-1"
/// Zone = "Zone-1"
/// ```
pub struct FileClusterRegistry {
    path: PathBuf,
}

impl FileClusterRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ClusterRegistry for FileClusterRegistry {
    async fn records(&self) -> Result<Vec<ClusterRecord>> {
        let source = self.path.display().to_string();
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| InventoryError::Unavailable {
                reason: format!("{}: {}", source, e),
            })?;

        let file: RegistryFile = toml::from_str(&contents)
            .map_err(|e| InventoryError::malformed(&source, e.to_string()))?;

        debug!(path = %source, records = file.clusters.len(), "Read cluster registry file");

        Ok(file
            .clusters
            .into_iter()
            .enumerate()
            .map(|(index, data)| ClusterRecord {
                id: format!("{}#{}", source, index),
                data,
            })
            .collect())
    }
}
