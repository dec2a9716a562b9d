//! Mesh Lifecycle - Generated plan resource management
//!
//! Owns the lifecycle of the resources an application's reconciliation
//! generates: per-cluster [`Blueprint`](mesh_types::Blueprint)s and the
//! aggregate [`Plotter`](mesh_types::Plotter). Both kinds are driven
//! through one [`ResourceContext`] contract.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mesh_lifecycle::{create_context, InMemoryResourceStore, LifecycleConfig};
//! use mesh_types::{BlueprintSpec, OwnerIdentity, ResourceKind};
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! # async fn example() -> mesh_lifecycle::Result<()> {
//! let store = Arc::new(InMemoryResourceStore::new());
//! let ctx = create_context(ResourceKind::Plotter, store.clone(), store, &LifecycleConfig::default());
//!
//! let owner = OwnerIdentity::new("team-a", "notebook");
//! let reference = ctx.create_reference(&owner).await?;
//! let plans = BTreeMap::from([("eu-1".to_string(), BlueprintSpec::new("eu-1"))]);
//! ctx.create_or_update(&owner, &reference, &plans).await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod blueprint;
mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod memory;
pub mod plotter;
pub mod store;

pub use blueprint::BlueprintContext;
pub use config::LifecycleConfig;
pub use context::{create_context, ResourceContext};
pub use error::{LifecycleError, Result, StoreError, StoreResult};
pub use memory::InMemoryResourceStore;
pub use plotter::PlotterContext;
pub use store::{NamespaceAllocator, ResourceKey, ResourceStore, StoredResource};
