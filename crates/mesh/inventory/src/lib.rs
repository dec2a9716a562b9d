//! Mesh Inventory - The set of clusters plans may target
//!
//! Cluster membership is external state. Every [`ClusterManager::list_clusters`]
//! call re-reads the [`ClusterRegistry`]; nothing is cached here.
//!
//! - **ClusterRegistry**: Source of per-cluster key-value records
//! - **ClusterManager**: Parses records into [`Cluster`] values
//!
//! An empty registry yields an empty inventory. A registry that cannot be
//! read or holds malformed records yields an error, which callers must treat
//! as "inventory unknown" rather than "no clusters".
//!
//! [`Cluster`]: mesh_types::Cluster

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod error;
pub mod manager;
pub mod registry;

// Re-exports
pub use error::{InventoryError, Result};
pub use manager::{ClusterManager, RegistryClusterManager};
pub use registry::{ClusterRecord, ClusterRegistry, FileClusterRegistry, InMemoryClusterRegistry};
