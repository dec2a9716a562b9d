//! Optimization strategies
//!
//! Policies may ask the caller to prefer some deployments over others by
//! minimizing or maximizing infrastructure attributes. Objectives are
//! ordered: the first-listed objective wins ties.

use crate::decision::DecisionPolicy;
use crate::error::ValidationError;
use crate::ids::Attribute;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Optimization directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptimizationDirective {
    #[serde(rename = "min")]
    Minimize,
    #[serde(rename = "max")]
    Maximize,
}

impl fmt::Display for OptimizationDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizationDirective::Minimize => write!(f, "min"),
            OptimizationDirective::Maximize => write!(f, "max"),
        }
    }
}

impl FromStr for OptimizationDirective {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "min" => Ok(OptimizationDirective::Minimize),
            "max" => Ok(OptimizationDirective::Maximize),
            other => Err(ValidationError::InvalidDirective(other.to_string())),
        }
    }
}

/// Objective weight in `(0, 1]`, kept as the exact decimal literal the
/// policy author wrote.
///
/// Equality and ordering compare numeric value, so `0.5` equals `0.50`,
/// while serialization reproduces the original text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Weight {
    literal: String,
    /// Integer part, always 0 or 1
    whole: u8,
    /// Fraction digits with trailing zeros removed
    fraction: String,
}

impl Weight {
    pub fn parse(literal: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidWeight {
            value: literal.to_string(),
            reason: reason.to_string(),
        };

        let (whole, fraction) = match literal.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (literal, ""),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected a decimal number"));
        }
        if literal.contains('.') && fraction.is_empty() {
            return Err(invalid("missing digits after the decimal point"));
        }
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected a decimal number"));
        }

        let fraction = fraction.trim_end_matches('0');
        let whole = match whole.trim_start_matches('0') {
            "" => 0,
            "1" => 1,
            _ => return Err(invalid("must not exceed 1")),
        };
        if whole == 1 && !fraction.is_empty() {
            return Err(invalid("must not exceed 1"));
        }
        if whole == 0 && fraction.is_empty() {
            return Err(invalid("must be positive"));
        }

        Ok(Self {
            literal: literal.to_string(),
            whole,
            fraction: fraction.to_string(),
        })
    }

    /// The literal as written
    pub fn as_str(&self) -> &str {
        &self.literal
    }

    /// Approximate value for arithmetic by callers
    pub fn to_f64(&self) -> f64 {
        self.literal.parse().unwrap_or(0.0)
    }
}

impl TryFrom<String> for Weight {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Weight::parse(&value)
    }
}

impl From<Weight> for String {
    fn from(weight: Weight) -> Self {
        weight.literal
    }
}

impl FromStr for Weight {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Weight::parse(s)
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)
    }
}

impl PartialEq for Weight {
    fn eq(&self, other: &Self) -> bool {
        self.whole == other.whole && self.fraction == other.fraction
    }
}

impl Eq for Weight {}

impl Hash for Weight {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.whole.hash(state);
        self.fraction.hash(state);
    }
}

impl Ord for Weight {
    fn cmp(&self, other: &Self) -> Ordering {
        // Trimmed fraction digits compare lexicographically as decimals.
        self.whole
            .cmp(&other.whole)
            .then_with(|| self.fraction.cmp(&other.fraction))
    }
}

impl PartialOrd for Weight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A single optimization objective
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeOptimization {
    pub attribute: Attribute,

    pub directive: OptimizationDirective,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Weight>,
}

impl AttributeOptimization {
    pub fn new(attribute: impl Into<Attribute>, directive: OptimizationDirective) -> Self {
        Self {
            attribute: attribute.into(),
            directive,
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: Weight) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Order two attribute values so that the preferred one sorts first
    fn compare(&self, a: Option<f64>, b: Option<f64>) -> Ordering {
        let (Some(a), Some(b)) = (a, b) else {
            return Ordering::Equal;
        };
        let natural = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        match self.directive {
            OptimizationDirective::Minimize => natural,
            OptimizationDirective::Maximize => natural.reverse(),
        }
    }
}

/// Ordered list of optimization objectives from one policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationStrategy {
    pub strategy: Vec<AttributeOptimization>,
    pub policy: DecisionPolicy,
}

impl OptimizationStrategy {
    /// Compare two candidates by their attribute values.
    ///
    /// `Ordering::Less` means `a` is preferred. Objectives are applied in
    /// list order and the first one that distinguishes the candidates
    /// decides; attributes missing on either side do not distinguish.
    pub fn prefer(&self, a: &BTreeMap<Attribute, f64>, b: &BTreeMap<Attribute, f64>) -> Ordering {
        self.strategy
            .iter()
            .map(|objective| {
                objective.compare(
                    a.get(&objective.attribute).copied(),
                    b.get(&objective.attribute).copied(),
                )
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}
