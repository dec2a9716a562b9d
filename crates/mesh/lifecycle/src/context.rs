//! The lifecycle contract shared by both plan kinds

use crate::blueprint::BlueprintContext;
use crate::config::LifecycleConfig;
use crate::error::Result;
use crate::plotter::PlotterContext;
use crate::store::{NamespaceAllocator, ResourceStore};
use async_trait::async_trait;
use mesh_types::{BlueprintSpec, ObservedState, OwnerIdentity, ResourceKind, ResourceReference};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Lifecycle of the generated plan resources of one kind.
///
/// Plans are keyed by cluster name. Implementations hold no per-call state
/// and may be shared between concurrent reconciliations.
#[async_trait]
pub trait ResourceContext: Send + Sync {
    /// Kind of resource managed by this context
    fn kind(&self) -> ResourceKind;

    /// Produce the identity of the resource owned by an application.
    ///
    /// Does not create the resource itself.
    async fn create_reference(&self, owner: &OwnerIdentity) -> Result<ResourceReference>;

    /// Whether the referenced resource exists.
    ///
    /// False for a missing or incomplete reference and when the lookup
    /// fails for any reason.
    async fn exists(&self, reference: Option<&ResourceReference>) -> bool;

    /// Create the resource from `plans`, or replace the spec and owner
    /// labels of the existing one.
    async fn create_or_update(
        &self,
        owner: &OwnerIdentity,
        reference: &ResourceReference,
        plans: &BTreeMap<String, BlueprintSpec>,
    ) -> Result<()>;

    /// Remove the resource; an already-absent resource is not an error
    async fn delete(&self, reference: &ResourceReference) -> Result<()>;

    /// Last observed state, or the default state for a missing or
    /// incomplete reference.
    async fn get_status(&self, reference: Option<&ResourceReference>) -> Result<ObservedState>;

    /// References of every resource of this kind owned by `owner`
    async fn find_by_owner(&self, owner: &OwnerIdentity) -> Result<Vec<ResourceReference>>;
}

/// Only complete references can address a stored resource
pub(crate) fn complete(reference: Option<&ResourceReference>) -> Option<&ResourceReference> {
    reference.filter(|r| r.is_complete())
}

/// Build the context managing `kind`
pub fn create_context(
    kind: ResourceKind,
    store: Arc<dyn ResourceStore>,
    namespaces: Arc<dyn NamespaceAllocator>,
    config: &LifecycleConfig,
) -> Arc<dyn ResourceContext> {
    match kind {
        ResourceKind::Blueprint => Arc::new(BlueprintContext::new(store, namespaces, config)),
        ResourceKind::Plotter => Arc::new(PlotterContext::new(store, config)),
    }
}
