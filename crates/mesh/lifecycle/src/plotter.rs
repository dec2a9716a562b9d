//! Aggregate plan lifecycle

use crate::client::PlanClient;
use crate::config::LifecycleConfig;
use crate::context::{complete, ResourceContext};
use crate::error::{LifecycleError, Result};
use crate::store::ResourceStore;
use async_trait::async_trait;
use mesh_types::{
    BlueprintSpec, ObservedState, OwnerIdentity, PlanResource, Plotter, PlotterSpec, ResourceKind,
    ResourceReference,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Lifecycle context for [`Plotter`] resources.
///
/// Plotters live in the control-plane namespace, named after their owner.
pub struct PlotterContext {
    client: PlanClient<Plotter>,
    system_namespace: String,
}

impl PlotterContext {
    pub fn new(store: Arc<dyn ResourceStore>, config: &LifecycleConfig) -> Self {
        Self {
            client: PlanClient::new(store, config.conflict_retries),
            system_namespace: config.system_namespace.clone(),
        }
    }

    fn resource_name(owner: &OwnerIdentity) -> String {
        format!("{}-{}", owner.name, owner.namespace)
    }
}

#[async_trait]
impl ResourceContext for PlotterContext {
    fn kind(&self) -> ResourceKind {
        Plotter::KIND
    }

    /// Names can collide across owners, so a name already held by another
    /// owner is refused
    async fn create_reference(&self, owner: &OwnerIdentity) -> Result<ResourceReference> {
        let reference = ResourceReference::new(
            Self::resource_name(owner),
            &self.system_namespace,
            Plotter::KIND,
        );
        self.client.check_owner(owner, &reference).await?;
        Ok(reference)
    }

    async fn exists(&self, reference: Option<&ResourceReference>) -> bool {
        match complete(reference) {
            Some(reference) if reference.kind == Plotter::KIND => self.client.exists(reference).await,
            _ => false,
        }
    }

    async fn create_or_update(
        &self,
        owner: &OwnerIdentity,
        reference: &ResourceReference,
        plans: &BTreeMap<String, BlueprintSpec>,
    ) -> Result<()> {
        PlanClient::<Plotter>::check_kind(reference)?;
        if plans.is_empty() {
            return Err(LifecycleError::Configuration(
                "a plotter needs at least one cluster plan".to_string(),
            ));
        }

        let spec = PlotterSpec {
            blueprints: plans.clone(),
        };
        self.client.apply(owner, reference, spec).await
    }

    /// Leaves the control-plane namespace in place
    async fn delete(&self, reference: &ResourceReference) -> Result<()> {
        PlanClient::<Plotter>::check_kind(reference)?;
        if !reference.is_complete() {
            debug!(resource = %reference, "Nothing to delete for incomplete reference");
            return Ok(());
        }
        self.client.remove(reference).await
    }

    async fn get_status(&self, reference: Option<&ResourceReference>) -> Result<ObservedState> {
        match complete(reference) {
            Some(reference) => {
                PlanClient::<Plotter>::check_kind(reference)?;
                self.client.observed_state(reference).await
            }
            None => Ok(ObservedState::default()),
        }
    }

    async fn find_by_owner(&self, owner: &OwnerIdentity) -> Result<Vec<ResourceReference>> {
        self.client.owned_by(owner).await
    }
}
