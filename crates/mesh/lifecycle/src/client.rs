//! Typed access to plan resources over a kind-erased store

use crate::error::{LifecycleError, Result, StoreResult};
use crate::store::{ResourceKey, ResourceStore, StoredResource};
use mesh_types::{ObjectMeta, ObservedState, OwnerIdentity, PlanResource, ResourceReference};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Store client for one plan resource type
pub(crate) struct PlanClient<R> {
    store: Arc<dyn ResourceStore>,
    conflict_retries: u32,
    _resource: PhantomData<fn() -> R>,
}

enum Applied {
    Created,
    Updated,
}

impl<R: PlanResource> PlanClient<R> {
    pub(crate) fn new(store: Arc<dyn ResourceStore>, conflict_retries: u32) -> Self {
        Self {
            store,
            conflict_retries,
            _resource: PhantomData,
        }
    }

    /// Reject references that do not address this resource kind
    pub(crate) fn check_kind(reference: &ResourceReference) -> Result<()> {
        if reference.kind != R::KIND {
            return Err(LifecycleError::Configuration(format!(
                "{} context cannot manage {}",
                R::KIND,
                reference
            )));
        }
        Ok(())
    }

    pub(crate) async fn fetch(&self, reference: &ResourceReference) -> StoreResult<R> {
        self.store.get(&ResourceKey::from(reference)).await?.decode()
    }

    pub(crate) async fn exists(&self, reference: &ResourceReference) -> bool {
        match self.store.get(&ResourceKey::from(reference)).await {
            Ok(_) => true,
            Err(err) => {
                if !err.is_not_found() {
                    debug!(resource = %reference, error = %err, "Existence check failed");
                }
                false
            }
        }
    }

    /// Fail when the resource exists under a different owner's labels
    pub(crate) async fn check_owner(
        &self,
        owner: &OwnerIdentity,
        reference: &ResourceReference,
    ) -> Result<()> {
        match self.fetch(reference).await {
            Ok(existing) => match existing.metadata().owner() {
                Some(current) if &current != owner => {
                    warn!(
                        resource = %reference,
                        owner = %owner,
                        current = %current,
                        "Resource name taken by another owner"
                    );
                    Err(LifecycleError::Configuration(format!(
                        "{} is owned by {}, not {}",
                        reference, current, owner
                    )))
                }
                _ => Ok(()),
            },
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Create the resource or replace its spec and owner labels, retrying
    /// when a concurrent writer changed it in between.
    pub(crate) async fn apply(
        &self,
        owner: &OwnerIdentity,
        reference: &ResourceReference,
        spec: R::Spec,
    ) -> Result<()> {
        let mut attempt = 0;
        loop {
            match self.try_apply(owner, reference, spec.clone()).await {
                Ok(Applied::Created) => {
                    info!(resource = %reference, owner = %owner, "Created plan resource");
                    return Ok(());
                }
                Ok(Applied::Updated) => {
                    info!(resource = %reference, owner = %owner, "Updated plan resource");
                    return Ok(());
                }
                Err(LifecycleError::Store(err)) if err.is_conflict() && attempt < self.conflict_retries => {
                    attempt += 1;
                    debug!(resource = %reference, attempt, error = %err, "Retrying after conflict");
                }
                Err(err) => {
                    warn!(resource = %reference, error = %err, "Failed to apply plan resource");
                    return Err(err);
                }
            }
        }
    }

    async fn try_apply(
        &self,
        owner: &OwnerIdentity,
        reference: &ResourceReference,
        spec: R::Spec,
    ) -> Result<Applied> {
        match self.fetch(reference).await {
            Ok(mut existing) => {
                if let Some(current) = existing.metadata().owner() {
                    if &current != owner {
                        return Err(LifecycleError::Configuration(format!(
                            "{} is owned by {}, not {}",
                            reference, current, owner
                        )));
                    }
                }
                existing.metadata_mut().labels = owner.labels();
                existing.set_spec(spec);
                self.store.update(StoredResource::encode(&existing)?).await?;
                Ok(Applied::Updated)
            }
            Err(err) if err.is_not_found() => {
                let mut metadata = ObjectMeta::new(&reference.name, &reference.namespace);
                metadata.labels = owner.labels();
                let resource = R::new(metadata, spec);
                self.store.create(StoredResource::encode(&resource)?).await?;
                Ok(Applied::Created)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Delete the resource; an absent resource is not an error
    pub(crate) async fn remove(&self, reference: &ResourceReference) -> Result<()> {
        match self.store.delete(&ResourceKey::from(reference)).await {
            Ok(()) => {
                info!(resource = %reference, "Deleted plan resource");
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                warn!(resource = %reference, "Plan resource already absent");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub(crate) async fn observed_state(&self, reference: &ResourceReference) -> Result<ObservedState> {
        match self.fetch(reference).await {
            Ok(resource) => Ok(resource.observed_state().clone()),
            Err(err) if err.is_not_found() => Err(LifecycleError::NotFound(reference.clone())),
            Err(err) => Err(err.into()),
        }
    }

    pub(crate) async fn owned_by(&self, owner: &OwnerIdentity) -> Result<Vec<ResourceReference>> {
        let resources = self.store.list_by_labels(R::KIND, &owner.labels()).await?;
        Ok(resources
            .into_iter()
            .map(|r| ResourceReference::new(r.metadata.name, r.metadata.namespace, R::KIND))
            .collect())
    }
}
