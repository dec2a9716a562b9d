//! Admin-policy decisions
//!
//! A decision tells the caller whether a capability must, must not, or may
//! be deployed, and under which restrictions.

use crate::cluster::Cluster;
use crate::error::ValidationError;
use crate::ids::Capability;
use crate::optimization::OptimizationStrategy;
use crate::restriction::Restrictions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Deployment verdict for a capability
///
/// Serialized as `True` (require), `False` (forbid) and `Unknown` (allow).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeploymentStatus {
    /// The capability must be deployed
    #[serde(rename = "True")]
    Require,

    /// The capability must not be deployed
    #[serde(rename = "False")]
    Forbid,

    /// The capability may be deployed
    #[default]
    #[serde(rename = "Unknown")]
    AllowUnknown,
}

impl DeploymentStatus {
    /// Precedence when statuses conflict: Forbid > Require > Unknown
    fn restrictiveness(self) -> u8 {
        match self {
            DeploymentStatus::AllowUnknown => 0,
            DeploymentStatus::Require => 1,
            DeploymentStatus::Forbid => 2,
        }
    }

    /// The more restrictive of two statuses
    pub fn most_restrictive(self, other: DeploymentStatus) -> DeploymentStatus {
        if other.restrictiveness() > self.restrictiveness() {
            other
        } else {
            self
        }
    }

    /// Deployment is not permitted
    pub fn is_forbidden(self) -> bool {
        self == DeploymentStatus::Forbid
    }

    /// Deployment is mandatory
    pub fn is_required(self) -> bool {
        self == DeploymentStatus::Require
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentStatus::Require => write!(f, "True"),
            DeploymentStatus::Forbid => write!(f, "False"),
            DeploymentStatus::AllowUnknown => write!(f, "Unknown"),
        }
    }
}

impl FromStr for DeploymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "True" => Ok(DeploymentStatus::Require),
            "False" => Ok(DeploymentStatus::Forbid),
            "Unknown" => Ok(DeploymentStatus::AllowUnknown),
            other => Err(ValidationError::InvalidDeploymentStatus(other.to_string())),
        }
    }
}

/// Provenance of a decision, kept for audit only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionPolicy {
    /// Policy identifier
    #[serde(rename = "ID")]
    pub id: String,

    /// Policy set the policy belongs to
    #[serde(rename = "policySetID", default, skip_serializing_if = "String::is_empty")]
    pub policy_set_id: String,

    /// Human-readable description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Policy version
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

impl DecisionPolicy {
    /// Create provenance for the policy with the given ID
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Set the policy set ID
    pub fn with_policy_set(mut self, policy_set_id: impl Into<String>) -> Self {
        self.policy_set_id = policy_set_id.into();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

/// Outcome of evaluating configuration policies for one capability
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Deployment verdict
    #[serde(default)]
    pub deploy: DeploymentStatus,

    /// Where the capability may be deployed
    #[serde(rename = "restrictions", default)]
    pub deployment_restrictions: Restrictions,

    /// Policy the decision came from
    #[serde(default)]
    pub policy: DecisionPolicy,
}

impl Decision {
    /// Create an unrestricted decision with the given verdict
    pub fn new(deploy: DeploymentStatus) -> Self {
        Self {
            deploy,
            ..Default::default()
        }
    }

    /// Set the deployment restrictions
    pub fn with_restrictions(mut self, restrictions: Restrictions) -> Self {
        self.deployment_restrictions = restrictions;
        self
    }

    /// Set the provenance
    pub fn with_policy(mut self, policy: DecisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Whether the capability may run on `cluster` under this decision
    pub fn allows_cluster(&self, cluster: &Cluster) -> bool {
        !self.deploy.is_forbidden() && self.deployment_restrictions.allows_cluster(cluster)
    }
}

/// A decision bound to the capability it applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionPerCapability {
    /// Capability the decision governs
    pub capability: Capability,
    /// Merged or per-policy decision
    pub decision: Decision,
}

impl DecisionPerCapability {
    /// Bind `decision` to `capability`
    pub fn new(capability: impl Into<Capability>, decision: Decision) -> Self {
        Self {
            capability: capability.into(),
            decision,
        }
    }
}

/// Decisions for every requested capability,
/// e.g. `[{"capability": "read", "decision": {"deploy": "True"}}]`
pub type RuleDecisionList = Vec<DecisionPerCapability>;

/// Full result of one policy evaluation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationOutputStructure {
    /// One decision per requested capability
    pub config: RuleDecisionList,

    /// Placement optimization strategies, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optimize: Vec<OptimizationStrategy>,
}

impl EvaluationOutputStructure {
    /// Decision for a capability, if one was produced
    pub fn decision_for(&self, capability: &Capability) -> Option<&Decision> {
        self.config
            .iter()
            .find(|d| &d.capability == capability)
            .map(|d| &d.decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restriction::Restriction;

    #[test]
    fn test_status_precedence() {
        use DeploymentStatus::*;
        assert_eq!(AllowUnknown.most_restrictive(Require), Require);
        assert_eq!(Require.most_restrictive(AllowUnknown), Require);
        assert_eq!(Require.most_restrictive(Forbid), Forbid);
        assert_eq!(Forbid.most_restrictive(Require), Forbid);
        assert_eq!(AllowUnknown.most_restrictive(AllowUnknown), AllowUnknown);
    }

    #[test]
    fn test_status_predicates() {
        assert!(DeploymentStatus::Require.is_required());
        assert!(!DeploymentStatus::Require.is_forbidden());
        assert!(DeploymentStatus::Forbid.is_forbidden());
        assert!(!DeploymentStatus::AllowUnknown.is_required());
        assert!(!DeploymentStatus::AllowUnknown.is_forbidden());
    }

    #[test]
    fn test_policy_provenance_serialization() {
        let policy = DecisionPolicy::new("residency")
            .with_policy_set("gdpr")
            .with_description("keep data in the EU")
            .with_version("2");
        let json = serde_json::to_value(&policy).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ID": "residency",
                "policySetID": "gdpr",
                "description": "keep data in the EU",
                "version": "2"
            })
        );

        let bare = serde_json::to_value(DecisionPolicy::new("p")).unwrap();
        assert_eq!(bare, serde_json::json!({"ID": "p"}));
    }

    #[test]
    fn test_status_rejects_unknown_literal() {
        assert_eq!("True".parse::<DeploymentStatus>(), Ok(DeploymentStatus::Require));
        assert!("Maybe".parse::<DeploymentStatus>().is_err());

        let parsed: Result<Decision, _> = serde_json::from_str(r#"{"deploy":"yes"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_decision_wire_format() {
        let json = r#"{
            "deploy": "False",
            "restrictions": {"clusters": [{"property": "name", "values": ["eu-1"]}]},
            "policy": {"ID": "p-1", "policySetID": "set-a", "description": "no writes"}
        }"#;
        let decision: Decision = serde_json::from_str(json).unwrap();
        assert_eq!(decision.deploy, DeploymentStatus::Forbid);
        assert_eq!(decision.policy.id, "p-1");
        assert_eq!(decision.policy.policy_set_id, "set-a");
        assert_eq!(decision.deployment_restrictions.clusters.len(), 1);
    }

    #[test]
    fn test_missing_deploy_defaults_to_unknown() {
        let decision: Decision = serde_json::from_str("{}").unwrap();
        assert_eq!(decision.deploy, DeploymentStatus::AllowUnknown);
        assert!(decision.deployment_restrictions.is_empty());
    }

    #[test]
    fn test_forbidden_decision_allows_no_cluster() {
        let cluster = Cluster::new("eu-1", "eu", "eu-a");
        let restrictions =
            Restrictions::default().with_cluster(Restriction::values("name", ["eu-1"]));

        let allowed = Decision::new(DeploymentStatus::Require).with_restrictions(restrictions.clone());
        assert!(allowed.allows_cluster(&cluster));

        let forbidden = Decision::new(DeploymentStatus::Forbid).with_restrictions(restrictions);
        assert!(!forbidden.allows_cluster(&cluster));
    }

    #[test]
    fn test_decision_lookup() {
        let output = EvaluationOutputStructure {
            config: vec![DecisionPerCapability::new(
                "read",
                Decision::new(DeploymentStatus::Require),
            )],
            optimize: vec![],
        };
        assert!(output.decision_for(&Capability::new("read")).is_some());
        assert!(output.decision_for(&Capability::new("write")).is_none());
    }
}
