//! Cluster manager
//!
//! Turns registry records into the ordered cluster inventory.

use crate::error::{InventoryError, Result};
use crate::registry::{ClusterRecord, ClusterRegistry};
use async_trait::async_trait;
use mesh_types::cluster::{CLUSTER_NAME_KEY, REGION_KEY, ZONE_KEY};
use mesh_types::Cluster;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Read access to the multi-cluster inventory
#[async_trait]
pub trait ClusterManager: Send + Sync {
    /// Current clusters ordered by name.
    ///
    /// Empty when no remote cluster is registered; an error when the
    /// registry cannot be read or is malformed.
    async fn list_clusters(&self) -> Result<Vec<Cluster>>;
}

/// Cluster manager reading a [`ClusterRegistry`] on every call
pub struct RegistryClusterManager {
    registry: Arc<dyn ClusterRegistry>,
}

impl RegistryClusterManager {
    pub fn new(registry: Arc<dyn ClusterRegistry>) -> Self {
        Self { registry }
    }
}

fn required<'a>(record: &'a ClusterRecord, key: &str) -> Result<&'a str> {
    match record.get(key) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(InventoryError::malformed(
            &record.id,
            format!("missing {}", key),
        )),
    }
}

fn parse_record(record: &ClusterRecord) -> Result<Cluster> {
    Ok(Cluster::new(
        required(record, CLUSTER_NAME_KEY)?,
        required(record, REGION_KEY)?,
        required(record, ZONE_KEY)?,
    ))
}

#[async_trait]
impl ClusterManager for RegistryClusterManager {
    async fn list_clusters(&self) -> Result<Vec<Cluster>> {
        let records = self.registry.records().await.map_err(|e| {
            warn!(error = %e, "Cluster registry read failed");
            e
        })?;

        let mut clusters = records.iter().map(parse_record).collect::<Result<Vec<_>>>()?;
        clusters.sort_by(|a, b| a.name.cmp(&b.name));

        let mut seen = BTreeSet::new();
        for cluster in &clusters {
            if !seen.insert(cluster.name.as_str()) {
                return Err(InventoryError::malformed(
                    &cluster.name,
                    "cluster registered more than once",
                ));
            }
        }

        debug!(clusters = clusters.len(), "Listed clusters");
        Ok(clusters)
    }
}
