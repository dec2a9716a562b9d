//! Resource store abstraction
//!
//! The lifecycle contexts only talk to the cluster through these two
//! traits: a versioned object store for plan resources and an allocator
//! for the private namespaces per-cluster plans live in.

use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use mesh_types::{ObjectMeta, PlanResource, ResourceKind, ResourceReference};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Address of a stored resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub kind: ResourceKind,
    pub namespace: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(kind: ResourceKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub(crate) fn not_found(&self) -> StoreError {
        StoreError::NotFound {
            kind: self.kind,
            namespace: self.namespace.clone(),
            name: self.name.clone(),
        }
    }
}

impl From<&ResourceReference> for ResourceKey {
    fn from(reference: &ResourceReference) -> Self {
        Self::new(reference.kind, &reference.namespace, &reference.name)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// Kind-erased resource as held by a store: metadata plus the rest of the
/// document (`spec`, `status`) as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResource {
    pub kind: ResourceKind,
    pub metadata: ObjectMeta,
    pub body: Value,
}

impl StoredResource {
    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.kind, &self.metadata.namespace, &self.metadata.name)
    }

    /// Erase a typed plan resource
    pub fn encode<R: PlanResource>(resource: &R) -> StoreResult<Self> {
        let mut body = serde_json::to_value(resource)?;
        if let Value::Object(fields) = &mut body {
            fields.remove("metadata");
        }
        Ok(Self {
            kind: R::KIND,
            metadata: resource.metadata().clone(),
            body,
        })
    }

    /// Restore a typed plan resource
    pub fn decode<R: PlanResource>(self) -> StoreResult<R> {
        if self.kind != R::KIND {
            return Err(StoreError::Serialization(format!(
                "expected {}, found {}",
                R::KIND,
                self.kind
            )));
        }
        let mut body = match self.body {
            Value::Object(fields) => fields,
            Value::Null => serde_json::Map::new(),
            other => {
                return Err(StoreError::Serialization(format!(
                    "resource body is not an object: {}",
                    other
                )))
            }
        };
        body.insert("metadata".to_string(), serde_json::to_value(&self.metadata)?);
        Ok(serde_json::from_value(Value::Object(body))?)
    }

    /// Whether every selector entry is present in the labels
    pub fn matches_labels(&self, selector: &BTreeMap<String, String>) -> bool {
        selector
            .iter()
            .all(|(key, value)| self.metadata.labels.get(key) == Some(value))
    }
}

/// Versioned storage for plan resources
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn get(&self, key: &ResourceKey) -> StoreResult<StoredResource>;

    /// Create a new resource; fails with `AlreadyExists` if the key is taken
    async fn create(&self, resource: StoredResource) -> StoreResult<StoredResource>;

    /// Replace an existing resource.
    ///
    /// Fails with `Conflict` when `metadata.resource_version` no longer
    /// matches the stored version.
    async fn update(&self, resource: StoredResource) -> StoreResult<StoredResource>;

    async fn delete(&self, key: &ResourceKey) -> StoreResult<()>;

    /// All resources of `kind` carrying every label in `selector`
    async fn list_by_labels(
        &self,
        kind: ResourceKind,
        selector: &BTreeMap<String, String>,
    ) -> StoreResult<Vec<StoredResource>>;
}

/// Namespace management
#[async_trait]
pub trait NamespaceAllocator: Send + Sync {
    /// Create a namespace named `prefix` plus a unique suffix
    async fn create_with_generated_name(
        &self,
        prefix: &str,
        labels: BTreeMap<String, String>,
    ) -> StoreResult<String>;

    /// Delete a namespace and everything in it
    async fn delete_namespace(&self, name: &str) -> StoreResult<()>;
}
