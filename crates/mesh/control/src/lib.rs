//! # Mesh Control Plane
//!
//! Facade composing the mesh subsystems behind one API:
//!
//! - [`mesh_policy`]: per-capability deployment decisions
//! - [`mesh_inventory`]: the clusters plans may target
//! - [`mesh_lifecycle`]: generated per-cluster and aggregate plans
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//! use mesh_control::{ControlPlaneConfig, MeshControlPlaneBuilder};
//! use mesh_inventory::{InMemoryClusterRegistry, RegistryClusterManager};
//! use mesh_lifecycle::InMemoryResourceStore;
//! use mesh_policy::{PolicyFacts, StaticFactSource};
//! use mesh_types::{BlueprintSpec, OwnerIdentity, ResourceKind};
//!
//! # async fn example() -> mesh_control::Result<()> {
//! let config = ControlPlaneConfig::load(None)?;
//! mesh_control::telemetry::init_tracing(&config.logging);
//!
//! let control_plane = MeshControlPlaneBuilder::new(config)
//!     .with_fact_source(Arc::new(StaticFactSource::new(PolicyFacts::default())))
//!     .with_cluster_manager(Arc::new(RegistryClusterManager::new(Arc::new(
//!         InMemoryClusterRegistry::new(),
//!     ))))
//!     .with_in_memory_store(Arc::new(InMemoryResourceStore::new()))
//!     .build()?;
//!
//! let owner = OwnerIdentity::new("team-a", "notebook");
//! let reference = control_plane.allocate_plan(ResourceKind::Plotter, &owner).await?;
//! let plans = BTreeMap::from([("eu-1".to_string(), BlueprintSpec::new("eu-1"))]);
//! control_plane.apply_plan(&owner, &reference, &plans).await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod builder;
pub mod config;
pub mod control_plane;
pub mod error;
pub mod telemetry;

// Re-exports
pub use builder::MeshControlPlaneBuilder;
pub use config::{ControlPlaneConfig, InventoryConfig, LoggingConfig};
pub use control_plane::MeshControlPlane;
pub use error::{ControlPlaneError, Result};
