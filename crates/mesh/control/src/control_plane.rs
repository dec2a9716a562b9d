//! Main MeshControlPlane implementation
//!
//! The control plane is what an application reconciler talks to: it
//! evaluates policy decisions, reads the cluster inventory and drives the
//! lifecycle of the plan resources generated for the application.

use crate::config::ControlPlaneConfig;
use crate::error::{ControlPlaneError, Result};
use mesh_inventory::ClusterManager;
use mesh_lifecycle::ResourceContext;
use mesh_policy::DecisionEvaluator;
use mesh_types::{
    BlueprintSpec, Capability, Cluster, Decision, EvaluationOutputStructure, ObservedState,
    OwnerIdentity, ResourceKind, ResourceReference,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Unified control plane for policy, inventory and plan lifecycle
pub struct MeshControlPlane {
    config: ControlPlaneConfig,

    evaluator: DecisionEvaluator,

    cluster_manager: Arc<dyn ClusterManager>,

    /// Per-cluster plan lifecycle
    blueprints: Arc<dyn ResourceContext>,

    /// Aggregate plan lifecycle
    plotters: Arc<dyn ResourceContext>,
}

impl MeshControlPlane {
    pub(crate) fn new(
        config: ControlPlaneConfig,
        evaluator: DecisionEvaluator,
        cluster_manager: Arc<dyn ClusterManager>,
        blueprints: Arc<dyn ResourceContext>,
        plotters: Arc<dyn ResourceContext>,
    ) -> Self {
        Self {
            config,
            evaluator,
            cluster_manager,
            blueprints,
            plotters,
        }
    }

    pub fn config(&self) -> &ControlPlaneConfig {
        &self.config
    }

    /// Lifecycle context for `kind`
    pub fn context(&self, kind: ResourceKind) -> &Arc<dyn ResourceContext> {
        match kind {
            ResourceKind::Blueprint => &self.blueprints,
            ResourceKind::Plotter => &self.plotters,
        }
    }

    // ========== Policy ==========

    /// One merged decision per requested capability
    pub async fn evaluate_decisions(
        &self,
        capabilities: &BTreeSet<Capability>,
    ) -> Result<EvaluationOutputStructure> {
        Ok(self.evaluator.evaluate(capabilities).await?)
    }

    // ========== Inventory ==========

    pub async fn list_clusters(&self) -> Result<Vec<Cluster>> {
        Ok(self.cluster_manager.list_clusters().await?)
    }

    /// Clusters `decision` permits deployment on, in name order
    pub async fn eligible_clusters(&self, decision: &Decision) -> Result<Vec<Cluster>> {
        if decision.deploy.is_forbidden() {
            debug!(policy = %decision.policy.id, "Decision forbids deployment");
            return Ok(Vec::new());
        }

        let clusters = self.list_clusters().await?;
        let total = clusters.len();
        let eligible: Vec<Cluster> = clusters
            .into_iter()
            .filter(|cluster| decision.allows_cluster(cluster))
            .collect();

        debug!(total, eligible = eligible.len(), "Filtered clusters by decision");
        Ok(eligible)
    }

    // ========== Plan Lifecycle ==========

    /// Identity of the plan of `kind` owned by `owner`.
    ///
    /// For per-cluster plans this allocates a new namespace on every call.
    #[instrument(skip_all, fields(kind = %kind, owner = %owner))]
    pub async fn allocate_plan(
        &self,
        kind: ResourceKind,
        owner: &OwnerIdentity,
    ) -> Result<ResourceReference> {
        let reference = self.context(kind).create_reference(owner).await?;
        debug!(reference = %reference, "Allocated plan reference");
        Ok(reference)
    }

    /// Write `plans` to the referenced plan resource.
    ///
    /// Every plan must target a cluster currently in the inventory and be
    /// keyed by that cluster's name.
    #[instrument(skip_all, fields(owner = %owner, reference = %reference))]
    pub async fn apply_plan(
        &self,
        owner: &OwnerIdentity,
        reference: &ResourceReference,
        plans: &BTreeMap<String, BlueprintSpec>,
    ) -> Result<()> {
        let known: BTreeSet<String> = self
            .list_clusters()
            .await?
            .into_iter()
            .map(|cluster| cluster.name)
            .collect();

        let unknown: Vec<&str> = plans
            .keys()
            .filter(|cluster| !known.contains(*cluster))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            warn!(clusters = ?unknown, "Plan targets clusters outside the inventory");
            return Err(ControlPlaneError::InvalidRequest(format!(
                "unknown clusters: {}",
                unknown.join(", ")
            )));
        }

        let mislabeled: Vec<&str> = plans
            .iter()
            .filter(|(cluster, spec)| spec.cluster != **cluster)
            .map(|(cluster, _)| cluster.as_str())
            .collect();
        if !mislabeled.is_empty() {
            warn!(clusters = ?mislabeled, "Plan key does not match its target cluster");
            return Err(ControlPlaneError::InvalidRequest(format!(
                "plans keyed by a different cluster than they target: {}",
                mislabeled.join(", ")
            )));
        }

        self.context(reference.kind)
            .create_or_update(owner, reference, plans)
            .await?;

        info!(clusters = plans.len(), "Plan applied");
        Ok(())
    }

    /// Whether the referenced plan exists; never fails
    pub async fn plan_exists(&self, reference: Option<&ResourceReference>) -> bool {
        match reference {
            Some(reference) => self.context(reference.kind).exists(Some(reference)).await,
            None => false,
        }
    }

    /// Observed state of a plan; the default state when there is no plan yet
    pub async fn plan_status(&self, reference: Option<&ResourceReference>) -> Result<ObservedState> {
        match reference {
            Some(reference) => Ok(self.context(reference.kind).get_status(Some(reference)).await?),
            None => Ok(ObservedState::default()),
        }
    }

    /// Every plan of either kind owned by `owner`
    pub async fn owned_plans(&self, owner: &OwnerIdentity) -> Result<Vec<ResourceReference>> {
        let mut references = self.plotters.find_by_owner(owner).await?;
        references.extend(self.blueprints.find_by_owner(owner).await?);
        Ok(references)
    }

    /// Remove the referenced plan; an absent plan is not an error
    #[instrument(skip_all, fields(reference = %reference))]
    pub async fn teardown(&self, reference: &ResourceReference) -> Result<()> {
        self.context(reference.kind).delete(reference).await?;
        info!("Plan torn down");
        Ok(())
    }
}
