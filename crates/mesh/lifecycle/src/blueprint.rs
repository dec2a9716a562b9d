//! Per-cluster plan lifecycle
//!
//! Each blueprint lives alone in a namespace generated for it. Deleting the
//! blueprint deletes that namespace too.

use crate::client::PlanClient;
use crate::config::LifecycleConfig;
use crate::context::{complete, ResourceContext};
use crate::error::{LifecycleError, Result};
use crate::store::{NamespaceAllocator, ResourceStore};
use async_trait::async_trait;
use mesh_types::{
    Blueprint, BlueprintSpec, ObservedState, OwnerIdentity, PlanResource, ResourceKind,
    ResourceReference,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Lifecycle context for [`Blueprint`] resources
pub struct BlueprintContext {
    client: PlanClient<Blueprint>,
    namespaces: Arc<dyn NamespaceAllocator>,
    namespace_prefix: String,
}

impl BlueprintContext {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        namespaces: Arc<dyn NamespaceAllocator>,
        config: &LifecycleConfig,
    ) -> Self {
        Self {
            client: PlanClient::new(store, config.conflict_retries),
            namespaces,
            namespace_prefix: config.namespace_prefix.clone(),
        }
    }
}

/// The single plan a blueprint is built from
fn sole_plan(plans: &BTreeMap<String, BlueprintSpec>) -> Result<&BlueprintSpec> {
    match (plans.len(), plans.values().next()) {
        (1, Some(spec)) => Ok(spec),
        (count, _) => Err(LifecycleError::Configuration(format!(
            "a blueprint is built from exactly one cluster plan, got {}",
            count
        ))),
    }
}

#[async_trait]
impl ResourceContext for BlueprintContext {
    fn kind(&self) -> ResourceKind {
        Blueprint::KIND
    }

    /// Allocates a fresh namespace on every call
    async fn create_reference(&self, owner: &OwnerIdentity) -> Result<ResourceReference> {
        let namespace = self
            .namespaces
            .create_with_generated_name(&self.namespace_prefix, owner.labels())
            .await?;
        info!(owner = %owner, namespace = %namespace, "Allocated blueprint namespace");
        Ok(ResourceReference::new(&owner.name, namespace, Blueprint::KIND))
    }

    async fn exists(&self, reference: Option<&ResourceReference>) -> bool {
        match complete(reference) {
            Some(reference) if reference.kind == Blueprint::KIND => self.client.exists(reference).await,
            _ => false,
        }
    }

    async fn create_or_update(
        &self,
        owner: &OwnerIdentity,
        reference: &ResourceReference,
        plans: &BTreeMap<String, BlueprintSpec>,
    ) -> Result<()> {
        PlanClient::<Blueprint>::check_kind(reference)?;
        let spec = sole_plan(plans)?;
        self.client.apply(owner, reference, spec.clone()).await
    }

    async fn delete(&self, reference: &ResourceReference) -> Result<()> {
        PlanClient::<Blueprint>::check_kind(reference)?;
        if !reference.is_complete() {
            debug!(resource = %reference, "Nothing to delete for incomplete reference");
            return Ok(());
        }

        self.client.remove(reference).await?;

        match self.namespaces.delete_namespace(&reference.namespace).await {
            Ok(()) => {
                info!(namespace = %reference.namespace, "Deleted blueprint namespace");
                Ok(())
            }
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn get_status(&self, reference: Option<&ResourceReference>) -> Result<ObservedState> {
        match complete(reference) {
            Some(reference) => {
                PlanClient::<Blueprint>::check_kind(reference)?;
                self.client.observed_state(reference).await
            }
            None => Ok(ObservedState::default()),
        }
    }

    async fn find_by_owner(&self, owner: &OwnerIdentity) -> Result<Vec<ResourceReference>> {
        self.client.owned_by(owner).await
    }
}
