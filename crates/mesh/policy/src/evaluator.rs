//! Decision evaluator
//!
//! Merges raw policy facts into exactly one decision per requested
//! capability. The merge is deterministic and independent of the order in
//! which policies produced conflicting deploy statuses.

use crate::error::Result;
use crate::facts::{PolicyFactSource, PolicyFacts};
use mesh_types::{
    Capability, Decision, DecisionPerCapability, DeploymentStatus, EvaluationOutputStructure,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Aggregates policy facts into per-capability decisions
pub struct DecisionEvaluator {
    source: Arc<dyn PolicyFactSource>,
}

impl DecisionEvaluator {
    pub fn new(source: Arc<dyn PolicyFactSource>) -> Self {
        Self { source }
    }

    /// Fetch facts for `capabilities` and merge them.
    ///
    /// Fails as a whole when the fact source is unavailable.
    pub async fn evaluate(
        &self,
        capabilities: &BTreeSet<Capability>,
    ) -> Result<EvaluationOutputStructure> {
        debug!(capabilities = capabilities.len(), "Fetching policy facts");

        let facts = self.source.fetch(capabilities).await.map_err(|e| {
            warn!(error = %e, "Policy fact source failed");
            e
        })?;

        let output = evaluate_facts(capabilities, &facts);

        info!(
            decisions = output.config.len(),
            strategies = output.optimize.len(),
            forbidden = output
                .config
                .iter()
                .filter(|d| d.decision.deploy.is_forbidden())
                .count(),
            "Policy evaluation completed"
        );

        Ok(output)
    }
}

/// Merge `facts` into one decision per capability in `capabilities`.
///
/// Output decisions are listed in capability order. Facts about
/// capabilities that were not requested are ignored.
pub fn evaluate_facts(
    capabilities: &BTreeSet<Capability>,
    facts: &PolicyFacts,
) -> EvaluationOutputStructure {
    for ignored in facts
        .decisions
        .iter()
        .filter(|d| !capabilities.contains(&d.capability))
    {
        debug!(capability = %ignored.capability, "Ignoring fact for unrequested capability");
    }

    let config = capabilities
        .iter()
        .map(|capability| {
            let applicable = facts
                .decisions
                .iter()
                .filter(|d| &d.capability == capability)
                .map(|d| &d.decision);
            DecisionPerCapability::new(capability.clone(), merge_decisions(capability, applicable))
        })
        .collect();

    EvaluationOutputStructure {
        config,
        optimize: facts.optimize.clone(),
    }
}

/// Fold every applicable decision into one.
///
/// The provenance kept is that of the first decision carrying the winning
/// status, or of the decision whose range made the restrictions
/// unsatisfiable.
fn merge_decisions<'a, I>(capability: &Capability, decisions: I) -> Decision
where
    I: IntoIterator<Item = &'a Decision>,
{
    let mut merged = Decision::default();
    let mut unsatisfiable = Vec::new();
    let mut conflict_policy = None;

    for (index, decision) in decisions.into_iter().enumerate() {
        let status = merged.deploy.most_restrictive(decision.deploy);
        if index == 0 || status != merged.deploy {
            merged.policy = decision.policy.clone();
        }
        merged.deploy = status;

        // A policy's own entries are kept as written; merging applies across policies
        let conflicts = if index == 0 {
            merged.deployment_restrictions = decision.deployment_restrictions.clone();
            merged.deployment_restrictions.unsatisfiable()
        } else {
            merged
                .deployment_restrictions
                .merge(&decision.deployment_restrictions)
        };
        if !conflicts.is_empty() && conflict_policy.is_none() {
            conflict_policy = Some(decision.policy.clone());
        }
        unsatisfiable.extend(conflicts);
    }

    if !unsatisfiable.is_empty() {
        warn!(
            capability = %capability,
            properties = ?unsatisfiable,
            "Restriction ranges do not intersect, forbidding capability"
        );
        if !merged.deploy.is_forbidden() {
            if let Some(policy) = conflict_policy {
                merged.policy = policy;
            }
        }
        merged.deploy = DeploymentStatus::Forbid;
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::StaticFactSource;
    use crate::PolicyError;
    use mesh_types::{
        AttributeOptimization, Cluster, DecisionPolicy, OptimizationDirective, OptimizationStrategy,
        RangeType, Restriction, Restrictions,
    };

    fn capabilities(names: &[&str]) -> BTreeSet<Capability> {
        names.iter().map(|n| Capability::new(*n)).collect()
    }

    fn fact(capability: &str, deploy: DeploymentStatus, policy: &str) -> DecisionPerCapability {
        DecisionPerCapability::new(
            capability,
            Decision::new(deploy).with_policy(DecisionPolicy::new(policy)),
        )
    }

    #[test]
    fn test_scenario_require_with_value_union() {
        let facts = PolicyFacts::default()
            .with_decision(DecisionPerCapability::new(
                "read",
                Decision::new(DeploymentStatus::Require)
                    .with_restrictions(
                        Restrictions::default().with_cluster(Restriction::values("cluster", ["eu-1"])),
                    )
                    .with_policy(DecisionPolicy::new("A")),
            ))
            .with_decision(DecisionPerCapability::new(
                "read",
                Decision::new(DeploymentStatus::AllowUnknown)
                    .with_restrictions(
                        Restrictions::default()
                            .with_cluster(Restriction::values("cluster", ["eu-1", "us-1"])),
                    )
                    .with_policy(DecisionPolicy::new("B")),
            ));

        let output = evaluate_facts(&capabilities(&["read"]), &facts);
        let decision = output.decision_for(&Capability::new("read")).unwrap();

        assert_eq!(decision.deploy, DeploymentStatus::Require);
        assert_eq!(
            decision.deployment_restrictions.clusters,
            vec![Restriction::values("cluster", ["eu-1", "us-1"])]
        );
        assert_eq!(decision.policy.id, "A");
    }

    #[test]
    fn test_missing_capability_defaults_to_unknown() {
        let facts = PolicyFacts::default().with_decision(fact("read", DeploymentStatus::Require, "p"));
        let output = evaluate_facts(&capabilities(&["read", "transform"]), &facts);

        assert_eq!(output.config.len(), 2);
        let transform = output.decision_for(&Capability::new("transform")).unwrap();
        assert_eq!(transform.deploy, DeploymentStatus::AllowUnknown);
        assert!(transform.deployment_restrictions.is_empty());
    }

    #[test]
    fn test_forbid_wins_regardless_of_order() {
        let forward = PolicyFacts::default()
            .with_decision(fact("write", DeploymentStatus::Require, "req"))
            .with_decision(fact("write", DeploymentStatus::Forbid, "deny"))
            .with_decision(fact("write", DeploymentStatus::AllowUnknown, "allow"));
        let mut reversed = forward.clone();
        reversed.decisions.reverse();

        for facts in [forward, reversed] {
            let output = evaluate_facts(&capabilities(&["write"]), &facts);
            let decision = output.decision_for(&Capability::new("write")).unwrap();
            assert_eq!(decision.deploy, DeploymentStatus::Forbid);
            assert_eq!(decision.policy.id, "deny");
        }
    }

    #[test]
    fn test_empty_range_intersection_forbids() {
        let low = Restrictions::default()
            .with_storage_account(Restriction::range("size", RangeType::at_most(10)));
        let high = Restrictions::default()
            .with_storage_account(Restriction::range("size", RangeType::at_least(100)));

        let facts = PolicyFacts::default()
            .with_decision(DecisionPerCapability::new(
                "copy",
                Decision::new(DeploymentStatus::Require)
                    .with_restrictions(low)
                    .with_policy(DecisionPolicy::new("low")),
            ))
            .with_decision(DecisionPerCapability::new(
                "copy",
                Decision::new(DeploymentStatus::Require)
                    .with_restrictions(high)
                    .with_policy(DecisionPolicy::new("high")),
            ));

        let output = evaluate_facts(&capabilities(&["copy"]), &facts);
        let decision = output.decision_for(&Capability::new("copy")).unwrap();
        assert_eq!(decision.deploy, DeploymentStatus::Forbid);
        assert_eq!(decision.policy.id, "high");
    }

    #[test]
    fn test_single_policy_restrictions_kept() {
        let restrictions = Restrictions::default()
            .with_cluster(Restriction::values("name", ["eu-1", "us-1"]))
            .with_cluster(Restriction::values("name", ["us-1"]));
        let facts = PolicyFacts::default().with_decision(DecisionPerCapability::new(
            "read",
            Decision::new(DeploymentStatus::Require)
                .with_restrictions(restrictions.clone())
                .with_policy(DecisionPolicy::new("only")),
        ));

        let output = evaluate_facts(&capabilities(&["read"]), &facts);
        let decision = output.decision_for(&Capability::new("read")).unwrap();

        assert_eq!(decision.deploy, DeploymentStatus::Require);
        assert_eq!(decision.deployment_restrictions, restrictions);
        assert!(!decision.allows_cluster(&Cluster::new("eu-1", "eu", "eu-a")));
        assert!(decision.allows_cluster(&Cluster::new("us-1", "us", "us-a")));
    }

    #[test]
    fn test_single_policy_empty_range_forbids() {
        let restrictions = Restrictions::default()
            .with_storage_account(Restriction::range("size", RangeType::between(10, 5)));
        let facts = PolicyFacts::default().with_decision(DecisionPerCapability::new(
            "copy",
            Decision::new(DeploymentStatus::Require)
                .with_restrictions(restrictions)
                .with_policy(DecisionPolicy::new("broken")),
        ));

        let output = evaluate_facts(&capabilities(&["copy"]), &facts);
        let decision = output.decision_for(&Capability::new("copy")).unwrap();
        assert_eq!(decision.deploy, DeploymentStatus::Forbid);
        assert_eq!(decision.policy.id, "broken");
    }

    #[test]
    fn test_unrequested_facts_ignored() {
        let facts = PolicyFacts::default().with_decision(fact("delete", DeploymentStatus::Forbid, "p"));
        let output = evaluate_facts(&capabilities(&["read"]), &facts);
        assert_eq!(output.config.len(), 1);
        assert_eq!(output.config[0].capability, Capability::new("read"));
    }

    #[test]
    fn test_strategies_kept_in_order() {
        let strategy = |id: &str, attribute: &str| OptimizationStrategy {
            strategy: vec![AttributeOptimization::new(attribute, OptimizationDirective::Minimize)],
            policy: DecisionPolicy::new(id),
        };
        let facts = PolicyFacts::default()
            .with_strategy(strategy("first", "cost"))
            .with_strategy(strategy("second", "latency"));

        let output = evaluate_facts(&BTreeSet::new(), &facts);
        let ids: Vec<_> = output.optimize.iter().map(|s| s.policy.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_evaluator_fetches_from_source() {
        let facts = PolicyFacts::default().with_decision(fact("read", DeploymentStatus::Require, "p"));
        let evaluator = DecisionEvaluator::new(Arc::new(StaticFactSource::new(facts)));

        let output = evaluator.evaluate(&capabilities(&["read"])).await.unwrap();
        assert_eq!(output.config[0].decision.deploy, DeploymentStatus::Require);
    }

    #[tokio::test]
    async fn test_evaluator_surfaces_unavailable_source() {
        let evaluator = DecisionEvaluator::new(Arc::new(StaticFactSource::unavailable("timeout")));
        let result = evaluator.evaluate(&capabilities(&["read"])).await;
        assert!(matches!(result, Err(PolicyError::FactSourceUnavailable { .. })));
    }
}
