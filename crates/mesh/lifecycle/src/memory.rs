//! In-memory resource store for development and testing.
//!
//! Implements both [`ResourceStore`] and [`NamespaceAllocator`], with
//! monotonically increasing resource versions, cascading namespace
//! deletion and a few fault-injection hooks for tests.

use crate::error::{StoreError, StoreResult};
use crate::store::{NamespaceAllocator, ResourceKey, ResourceStore, StoredResource};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use mesh_types::{ObservedState, ResourceKind};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

const GENERATED_SUFFIX_LEN: usize = 5;

/// In-memory resource store
pub struct InMemoryResourceStore {
    resources: DashMap<ResourceKey, StoredResource>,
    namespaces: DashMap<String, BTreeMap<String, String>>,
    version_sequence: AtomicU64,
    mutations: AtomicU64,
    pending_conflicts: AtomicU32,
    outage: RwLock<Option<String>>,
}

impl InMemoryResourceStore {
    pub fn new() -> Self {
        Self {
            resources: DashMap::new(),
            namespaces: DashMap::new(),
            version_sequence: AtomicU64::new(0),
            mutations: AtomicU64::new(0),
            pending_conflicts: AtomicU32::new(0),
            outage: RwLock::new(None),
        }
    }

    /// Register an existing namespace, such as the control-plane namespace
    pub fn with_namespace(self, name: impl Into<String>) -> Self {
        self.namespaces.insert(name.into(), BTreeMap::new());
        self
    }

    pub fn namespace_exists(&self, name: &str) -> bool {
        self.namespaces.contains_key(name)
    }

    pub fn namespace_labels(&self, name: &str) -> Option<BTreeMap<String, String>> {
        self.namespaces.get(name).map(|labels| labels.clone())
    }

    /// Number of stored resources of every kind
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Number of mutating calls received so far, failed ones included
    pub fn mutation_count(&self) -> u64 {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Make the next `count` updates fail as if a concurrent writer won
    pub fn inject_conflicts(&self, count: u32) {
        self.pending_conflicts.store(count, Ordering::SeqCst);
    }

    /// Simulate an unreachable store; `None` restores it
    pub async fn set_outage(&self, reason: Option<String>) {
        *self.outage.write().await = reason;
    }

    /// Record the status a plan's own reconciliation would report
    pub fn set_observed_state(&self, key: &ResourceKey, state: &ObservedState) -> StoreResult<()> {
        let mut entry = self.resources.get_mut(key).ok_or_else(|| key.not_found())?;
        let status = serde_json::json!({ "observedState": state });
        match &mut entry.body {
            serde_json::Value::Object(fields) => {
                fields.insert("status".to_string(), status);
            }
            body => *body = serde_json::json!({ "status": status }),
        }
        entry.metadata.resource_version = self.next_version();
        Ok(())
    }

    async fn check_available(&self) -> StoreResult<()> {
        match self.outage.read().await.as_ref() {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }

    async fn begin_mutation(&self) -> StoreResult<()> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.check_available().await
    }

    fn next_version(&self) -> u64 {
        self.version_sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn take_injected_conflict(&self) -> bool {
        self.pending_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for InMemoryResourceStore {
    fn default() -> Self {
        Self::new()
    }
}

fn generated_suffix() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(GENERATED_SUFFIX_LEN)
        .collect()
}

#[async_trait]
impl ResourceStore for InMemoryResourceStore {
    async fn get(&self, key: &ResourceKey) -> StoreResult<StoredResource> {
        self.check_available().await?;
        self.resources
            .get(key)
            .map(|r| r.clone())
            .ok_or_else(|| key.not_found())
    }

    async fn create(&self, mut resource: StoredResource) -> StoreResult<StoredResource> {
        self.begin_mutation().await?;
        let key = resource.key();
        match self.resources.entry(key.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists {
                kind: key.kind,
                namespace: key.namespace,
                name: key.name,
            }),
            Entry::Vacant(slot) => {
                resource.metadata.resource_version = self.next_version();
                resource.metadata.creation_timestamp = Some(Utc::now());
                slot.insert(resource.clone());
                debug!(resource = %key, "Created resource");
                Ok(resource)
            }
        }
    }

    async fn update(&self, mut resource: StoredResource) -> StoreResult<StoredResource> {
        self.begin_mutation().await?;
        let key = resource.key();
        let mut stored = self.resources.get_mut(&key).ok_or_else(|| key.not_found())?;

        let expected = resource.metadata.resource_version;
        if self.take_injected_conflict() || stored.metadata.resource_version != expected {
            return Err(StoreError::Conflict {
                kind: key.kind,
                namespace: key.namespace,
                name: key.name,
                expected,
            });
        }

        resource.metadata.resource_version = self.next_version();
        resource.metadata.creation_timestamp = stored.metadata.creation_timestamp;
        *stored = resource.clone();
        debug!(resource = %key, version = resource.metadata.resource_version, "Updated resource");
        Ok(resource)
    }

    async fn delete(&self, key: &ResourceKey) -> StoreResult<()> {
        self.begin_mutation().await?;
        self.resources
            .remove(key)
            .map(|_| debug!(resource = %key, "Deleted resource"))
            .ok_or_else(|| key.not_found())
    }

    async fn list_by_labels(
        &self,
        kind: ResourceKind,
        selector: &BTreeMap<String, String>,
    ) -> StoreResult<Vec<StoredResource>> {
        self.check_available().await?;
        let mut matching: Vec<StoredResource> = self
            .resources
            .iter()
            .filter(|r| r.key().kind == kind && r.value().matches_labels(selector))
            .map(|r| r.value().clone())
            .collect();
        matching.sort_by_key(StoredResource::key);
        Ok(matching)
    }
}

#[async_trait]
impl NamespaceAllocator for InMemoryResourceStore {
    async fn create_with_generated_name(
        &self,
        prefix: &str,
        labels: BTreeMap<String, String>,
    ) -> StoreResult<String> {
        self.begin_mutation().await?;
        loop {
            let name = format!("{}{}", prefix, generated_suffix());
            if let Entry::Vacant(slot) = self.namespaces.entry(name.clone()) {
                slot.insert(labels);
                debug!(namespace = %name, "Created namespace");
                return Ok(name);
            }
        }
    }

    async fn delete_namespace(&self, name: &str) -> StoreResult<()> {
        self.begin_mutation().await?;
        if self.namespaces.remove(name).is_none() {
            return Err(StoreError::NamespaceNotFound(name.to_string()));
        }

        let before = self.resources.len();
        self.resources.retain(|key, _| key.namespace != name);
        debug!(
            namespace = %name,
            cascaded = before.saturating_sub(self.resources.len()),
            "Deleted namespace"
        );
        Ok(())
    }
}
