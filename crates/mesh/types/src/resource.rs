//! Identity and metadata of generated plan resources

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Label carrying the owning application's name
pub const OWNER_NAME_LABEL: &str = "app.mesh.io/appName";
/// Label carrying the owning application's namespace
pub const OWNER_NAMESPACE_LABEL: &str = "app.mesh.io/appNamespace";

/// Kind of a generated execution-plan resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Per-cluster plan, one per target cluster in a private namespace
    Blueprint,
    /// Aggregate plan in the control-plane namespace
    Plotter,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Blueprint => write!(f, "Blueprint"),
            ResourceKind::Plotter => write!(f, "Plotter"),
        }
    }
}

impl FromStr for ResourceKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Blueprint" => Ok(ResourceKind::Blueprint),
            "Plotter" => Ok(ResourceKind::Plotter),
            other => Err(ValidationError::InvalidResourceKind(other.to_string())),
        }
    }
}

/// Reference to a generated resource, held by the owning application
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceReference {
    pub name: String,
    pub namespace: String,
    pub kind: ResourceKind,
}

impl ResourceReference {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            kind,
        }
    }

    /// Both name and namespace are populated
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.namespace.is_empty()
    }
}

impl fmt::Display for ResourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// Two-field identity of the application owning a generated resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerIdentity {
    pub namespace: String,
    pub name: String,
}

impl OwnerIdentity {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Labels attached to every generated resource of this owner
    pub fn labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (OWNER_NAMESPACE_LABEL.to_string(), self.namespace.clone()),
            (OWNER_NAME_LABEL.to_string(), self.name.clone()),
        ])
    }

    /// Recover the owner from a label set
    pub fn from_labels(labels: &BTreeMap<String, String>) -> Option<Self> {
        Some(Self {
            namespace: labels.get(OWNER_NAMESPACE_LABEL)?.clone(),
            name: labels.get(OWNER_NAME_LABEL)?.clone(),
        })
    }
}

impl fmt::Display for OwnerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Store-managed metadata of a resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,

    pub namespace: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Optimistic-concurrency token, 0 until the store assigns one
    #[serde(default)]
    pub resource_version: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
}

impl ObjectMeta {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn owner(&self) -> Option<OwnerIdentity> {
        OwnerIdentity::from_labels(&self.labels)
    }
}

/// Last status reported by a generated resource's own reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservedState {
    #[serde(default)]
    pub ready: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data_access_instructions: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl ObservedState {
    pub fn ready() -> Self {
        Self {
            ready: true,
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Default::default()
        }
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}
