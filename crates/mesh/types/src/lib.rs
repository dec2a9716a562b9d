//! Mesh Types - Core types for policy-driven execution plan orchestration
//!
//! Mesh decides, for a data-processing application spanning many clusters,
//! which data-governance capabilities may be deployed and where, then
//! materializes that decision as generated execution-plan resources.
//!
//! ## Key Concepts
//!
//! - **Decision**: Deploy verdict, restrictions and provenance for one capability
//! - **Restrictions**: Cluster, module and storage-account constraints
//! - **OptimizationStrategy**: Ordered attribute objectives with exact weights
//! - **Blueprint**: Per-cluster execution plan
//! - **Plotter**: Aggregate plan embedding every per-cluster plan
//! - **ResourceReference**: Identity of a generated plan resource
//! - **Cluster**: A member of the multi-cluster inventory

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod cluster;
pub mod decision;
pub mod error;
pub mod ids;
pub mod optimization;
pub mod plan;
pub mod resource;
pub mod restriction;

// Re-export main types
pub use cluster::{Cluster, ClusterMetadata};
pub use decision::{
    Decision, DecisionPerCapability, DecisionPolicy, DeploymentStatus, EvaluationOutputStructure,
    RuleDecisionList,
};
pub use error::ValidationError;
pub use ids::{Attribute, Capability};
pub use optimization::{AttributeOptimization, OptimizationDirective, OptimizationStrategy, Weight};
pub use plan::{
    Blueprint, BlueprintModule, BlueprintSpec, ChartSpec, PlanResource, PlanStatus, Plotter,
    PlotterSpec,
};
pub use resource::{ObjectMeta, ObservedState, OwnerIdentity, ResourceKind, ResourceReference};
pub use restriction::{RangeType, Restriction, RestrictionBound, Restrictions};
