//! Multi-cluster inventory members

use serde::{Deserialize, Serialize};

/// Registry record key holding the cluster name
pub const CLUSTER_NAME_KEY: &str = "ClusterName";
/// Registry record key holding the cluster region
pub const REGION_KEY: &str = "Region";
/// Registry record key holding the cluster zone
pub const ZONE_KEY: &str = "Zone";

/// Location metadata of a cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterMetadata {
    pub region: String,
    pub zone: String,
}

/// One member of the multi-cluster inventory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    pub metadata: ClusterMetadata,
}

impl Cluster {
    pub fn new(name: impl Into<String>, region: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: ClusterMetadata {
                region: region.into(),
                zone: zone.into(),
            },
        }
    }

    /// Value of a restrictable property (`name`/`cluster`, `region`, `zone`)
    pub fn property(&self, property: &str) -> Option<&str> {
        match property {
            "name" | "cluster" => Some(&self.name),
            "region" => Some(&self.metadata.region),
            "zone" => Some(&self.metadata.zone),
            _ => None,
        }
    }
}
