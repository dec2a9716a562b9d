//! Generated execution-plan resources
//!
//! A [`Blueprint`] is the execution plan local to one cluster. A
//! [`Plotter`] is the cross-cluster plan that embeds every cluster's
//! blueprint spec, keyed by cluster name.

use crate::ids::Capability;
use crate::resource::{ObjectMeta, ObservedState, ResourceKind};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Chart used to deploy a module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, String>,
}

/// A module instance scheduled by a blueprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintModule {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<Capability>,

    pub chart: ChartSpec,

    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub arguments: serde_json::Value,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub asset_ids: Vec<String>,
}

impl BlueprintModule {
    pub fn new(name: impl Into<String>, chart: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capability: None,
            chart: ChartSpec {
                name: chart.into(),
                values: BTreeMap::new(),
            },
            arguments: serde_json::Value::Null,
            asset_ids: Vec::new(),
        }
    }

    pub fn with_capability(mut self, capability: impl Into<Capability>) -> Self {
        self.capability = Some(capability.into());
        self
    }

    pub fn with_arguments(mut self, arguments: serde_json::Value) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn with_asset(mut self, asset_id: impl Into<String>) -> Self {
        self.asset_ids.push(asset_id.into());
        self
    }
}

/// Execution plan body for a single cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlueprintSpec {
    pub cluster: String,

    #[serde(default)]
    pub modules: BTreeMap<String, BlueprintModule>,
}

impl BlueprintSpec {
    pub fn new(cluster: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            modules: BTreeMap::new(),
        }
    }

    pub fn with_module(mut self, module: BlueprintModule) -> Self {
        self.modules.insert(module.name.clone(), module);
        self
    }
}

/// Status block shared by both plan kinds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStatus {
    #[serde(default)]
    pub observed_state: ObservedState,
}

/// Aggregate plan body: every cluster's blueprint, keyed by cluster name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotterSpec {
    pub blueprints: BTreeMap<String, BlueprintSpec>,
}

/// A generated plan resource as persisted by the resource store
pub trait PlanResource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Body replaced wholesale on every create-or-update
    type Spec: Clone + Send + Sync;

    const KIND: ResourceKind;

    fn new(metadata: ObjectMeta, spec: Self::Spec) -> Self;

    fn metadata(&self) -> &ObjectMeta;

    fn metadata_mut(&mut self) -> &mut ObjectMeta;

    fn set_spec(&mut self, spec: Self::Spec);

    fn observed_state(&self) -> &ObservedState;
}

/// Per-cluster execution plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub metadata: ObjectMeta,
    pub spec: BlueprintSpec,
    #[serde(default)]
    pub status: PlanStatus,
}

impl PlanResource for Blueprint {
    type Spec = BlueprintSpec;

    const KIND: ResourceKind = ResourceKind::Blueprint;

    fn new(metadata: ObjectMeta, spec: BlueprintSpec) -> Self {
        Self {
            metadata,
            spec,
            status: PlanStatus::default(),
        }
    }

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn set_spec(&mut self, spec: BlueprintSpec) {
        self.spec = spec;
    }

    fn observed_state(&self) -> &ObservedState {
        &self.status.observed_state
    }
}

/// Cross-cluster execution plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plotter {
    pub metadata: ObjectMeta,
    pub spec: PlotterSpec,
    #[serde(default)]
    pub status: PlanStatus,
}

impl PlanResource for Plotter {
    type Spec = PlotterSpec;

    const KIND: ResourceKind = ResourceKind::Plotter;

    fn new(metadata: ObjectMeta, spec: PlotterSpec) -> Self {
        Self {
            metadata,
            spec,
            status: PlanStatus::default(),
        }
    }

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn set_spec(&mut self, spec: PlotterSpec) {
        self.spec = spec;
    }

    fn observed_state(&self) -> &ObservedState {
        &self.status.observed_state
    }
}
