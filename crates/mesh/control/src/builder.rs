//! Builder for MeshControlPlane

use crate::config::ControlPlaneConfig;
use crate::control_plane::MeshControlPlane;
use crate::error::{ControlPlaneError, Result};
use mesh_inventory::{ClusterManager, FileClusterRegistry, RegistryClusterManager};
use mesh_lifecycle::{create_context, InMemoryResourceStore, NamespaceAllocator, ResourceStore};
use mesh_policy::{DecisionEvaluator, PolicyFactSource};
use mesh_types::ResourceKind;
use std::sync::Arc;
use tracing::info;

/// Builder for constructing a MeshControlPlane with all dependencies
pub struct MeshControlPlaneBuilder {
    config: ControlPlaneConfig,
    fact_source: Option<Arc<dyn PolicyFactSource>>,
    cluster_manager: Option<Arc<dyn ClusterManager>>,
    resource_store: Option<Arc<dyn ResourceStore>>,
    namespace_allocator: Option<Arc<dyn NamespaceAllocator>>,
}

impl MeshControlPlaneBuilder {
    /// Create a builder with no components set
    pub fn new(config: ControlPlaneConfig) -> Self {
        Self {
            config,
            fact_source: None,
            cluster_manager: None,
            resource_store: None,
            namespace_allocator: None,
        }
    }

    /// Set the policy fact source
    pub fn with_fact_source(mut self, source: Arc<dyn PolicyFactSource>) -> Self {
        self.fact_source = Some(source);
        self
    }

    /// Set the cluster manager; overrides `inventory.path`
    pub fn with_cluster_manager(mut self, manager: Arc<dyn ClusterManager>) -> Self {
        self.cluster_manager = Some(manager);
        self
    }

    /// Set the store holding plan resources
    pub fn with_resource_store(mut self, store: Arc<dyn ResourceStore>) -> Self {
        self.resource_store = Some(store);
        self
    }

    /// Set the allocator for per-cluster plan namespaces
    pub fn with_namespace_allocator(mut self, allocator: Arc<dyn NamespaceAllocator>) -> Self {
        self.namespace_allocator = Some(allocator);
        self
    }

    /// Use one in-memory store for both resources and namespaces
    pub fn with_in_memory_store(self, store: Arc<InMemoryResourceStore>) -> Self {
        self.with_resource_store(store.clone())
            .with_namespace_allocator(store)
    }

    /// Build the control plane with all components
    pub fn build(self) -> Result<MeshControlPlane> {
        let fact_source = self
            .fact_source
            .ok_or_else(|| ControlPlaneError::InvalidRequest("fact_source required".into()))?;

        let cluster_manager = match (self.cluster_manager, &self.config.inventory.path) {
            (Some(manager), _) => manager,
            (None, Some(path)) => {
                info!(path = %path.display(), "Using file cluster registry");
                Arc::new(RegistryClusterManager::new(Arc::new(FileClusterRegistry::new(path))))
            }
            (None, None) => {
                return Err(ControlPlaneError::InvalidRequest(
                    "cluster_manager or inventory.path required".into(),
                ))
            }
        };

        let resource_store = self
            .resource_store
            .ok_or_else(|| ControlPlaneError::InvalidRequest("resource_store required".into()))?;
        let namespace_allocator = self.namespace_allocator.ok_or_else(|| {
            ControlPlaneError::InvalidRequest("namespace_allocator required".into())
        })?;

        let lifecycle = self.config.lifecycle();
        let blueprints = create_context(
            ResourceKind::Blueprint,
            resource_store.clone(),
            namespace_allocator.clone(),
            &lifecycle,
        );
        let plotters = create_context(
            ResourceKind::Plotter,
            resource_store,
            namespace_allocator,
            &lifecycle,
        );

        Ok(MeshControlPlane::new(
            self.config,
            DecisionEvaluator::new(fact_source),
            cluster_manager,
            blueprints,
            plotters,
        ))
    }
}
