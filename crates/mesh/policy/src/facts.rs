//! Raw policy facts and the source that produces them

use crate::error::{PolicyError, Result};
use async_trait::async_trait;
use mesh_types::{Capability, DecisionPerCapability, OptimizationStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tokio::sync::RwLock;

/// Unmerged output of the external policy evaluator.
///
/// Shares the wire shape of the merged result but may hold several
/// decisions for one capability, listed in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyFacts {
    #[serde(rename = "config", default)]
    pub decisions: Vec<DecisionPerCapability>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optimize: Vec<OptimizationStrategy>,
}

impl PolicyFacts {
    /// Parse facts from the evaluator's JSON answer, rejecting unknown
    /// enumeration literals and malformed weights or restrictions.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_decision(mut self, decision: DecisionPerCapability) -> Self {
        self.decisions.push(decision);
        self
    }

    pub fn with_strategy(mut self, strategy: OptimizationStrategy) -> Self {
        self.optimize.push(strategy);
        self
    }
}

/// The external policy evaluator
#[async_trait]
pub trait PolicyFactSource: Send + Sync {
    /// Produce facts for the requested capabilities.
    ///
    /// Fails with [`PolicyError::FactSourceUnavailable`] when the evaluator
    /// cannot answer; partial answers are never returned.
    async fn fetch(&self, capabilities: &BTreeSet<Capability>) -> Result<PolicyFacts>;
}

/// Fact source answering from a fixed set of facts
pub struct StaticFactSource {
    facts: RwLock<std::result::Result<PolicyFacts, String>>,
}

impl StaticFactSource {
    pub fn new(facts: PolicyFacts) -> Self {
        Self {
            facts: RwLock::new(Ok(facts)),
        }
    }

    /// A source that is always unavailable
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            facts: RwLock::new(Err(reason.into())),
        }
    }

    /// Replace the facts served from now on
    pub async fn replace(&self, facts: PolicyFacts) {
        *self.facts.write().await = Ok(facts);
    }

    /// Make subsequent fetches fail
    pub async fn set_unavailable(&self, reason: impl Into<String>) {
        *self.facts.write().await = Err(reason.into());
    }
}

#[async_trait]
impl PolicyFactSource for StaticFactSource {
    async fn fetch(&self, _capabilities: &BTreeSet<Capability>) -> Result<PolicyFacts> {
        match &*self.facts.read().await {
            Ok(facts) => Ok(facts.clone()),
            Err(reason) => Err(PolicyError::FactSourceUnavailable {
                reason: reason.clone(),
            }),
        }
    }
}
