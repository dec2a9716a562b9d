//! Deployment restrictions
//!
//! A restriction constrains one named property either to an allow-list of
//! string values (satisfied when the actual value is a member) or to an
//! integer range. Restrictions in different categories must all hold;
//! entries for the same property are merged when several policies apply.

use crate::cluster::Cluster;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Integer range bound on a property
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeType {
    /// Lower bound, unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,

    /// Upper bound, unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub exclusive_min: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub exclusive_max: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl RangeType {
    /// Inclusive range `[min, max]`
    pub fn between(min: i64, max: i64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            ..Default::default()
        }
    }

    pub fn at_least(min: i64) -> Self {
        Self {
            min: Some(min),
            ..Default::default()
        }
    }

    pub fn at_most(max: i64) -> Self {
        Self {
            max: Some(max),
            ..Default::default()
        }
    }

    /// Smallest admitted integer
    fn lower(&self) -> Option<i64> {
        self.min.map(|min| {
            if self.exclusive_min {
                min.saturating_add(1)
            } else {
                min
            }
        })
    }

    /// Largest admitted integer
    fn upper(&self) -> Option<i64> {
        self.max.map(|max| {
            if self.exclusive_max {
                max.saturating_sub(1)
            } else {
                max
            }
        })
    }

    /// An exclusive bound at the edge of `i64` admits nothing
    fn bound_overflows(&self) -> bool {
        (self.exclusive_min && self.min == Some(i64::MAX))
            || (self.exclusive_max && self.max == Some(i64::MIN))
    }

    /// Whether no integer satisfies the range
    pub fn is_empty(&self) -> bool {
        if self.bound_overflows() {
            return true;
        }
        match (self.lower(), self.upper()) {
            (Some(lower), Some(upper)) => lower > upper,
            _ => false,
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        !self.bound_overflows()
            && self.lower().map_or(true, |lower| value >= lower)
            && self.upper().map_or(true, |upper| value <= upper)
    }

    /// Intersect two ranges, `None` when the result admits no value
    pub fn intersect(&self, other: &RangeType) -> Option<RangeType> {
        if self.is_empty() || other.is_empty() {
            return None;
        }
        let (min, exclusive_min) = match (self.lower(), other.lower()) {
            (Some(a), Some(b)) if b > a => (other.min, other.exclusive_min),
            (Some(_), _) => (self.min, self.exclusive_min),
            (None, _) => (other.min, other.exclusive_min),
        };
        let (max, exclusive_max) = match (self.upper(), other.upper()) {
            (Some(a), Some(b)) if b < a => (other.max, other.exclusive_max),
            (Some(_), _) => (self.max, self.exclusive_max),
            (None, _) => (other.max, other.exclusive_max),
        };

        let merged = RangeType {
            min,
            max,
            exclusive_min,
            exclusive_max,
        };
        if merged.is_empty() {
            None
        } else {
            Some(merged)
        }
    }
}

/// What a restriction admits for its property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestrictionBound {
    /// Any value
    Unrestricted,
    /// Disjunction over the listed values
    Values(Vec<String>),
    /// Integer range
    Range(RangeType),
}

/// A named property constrained by a value list or a range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RestrictionWire", into = "RestrictionWire")]
pub struct Restriction {
    pub property: String,
    pub bound: RestrictionBound,
}

/// Serialized shape: `{"property", "values"?, "range"?}`
#[derive(Serialize, Deserialize)]
struct RestrictionWire {
    property: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    range: Option<RangeType>,
}

impl TryFrom<RestrictionWire> for Restriction {
    type Error = ValidationError;

    fn try_from(wire: RestrictionWire) -> Result<Self, Self::Error> {
        let bound = match (wire.values.is_empty(), wire.range) {
            (true, None) => RestrictionBound::Unrestricted,
            (false, None) => RestrictionBound::Values(wire.values),
            (true, Some(range)) => RestrictionBound::Range(range),
            (false, Some(_)) => {
                return Err(ValidationError::AmbiguousRestriction {
                    property: wire.property,
                })
            }
        };
        Ok(Self {
            property: wire.property,
            bound,
        })
    }
}

impl From<Restriction> for RestrictionWire {
    fn from(restriction: Restriction) -> Self {
        let (values, range) = match restriction.bound {
            RestrictionBound::Unrestricted => (Vec::new(), None),
            RestrictionBound::Values(values) => (values, None),
            RestrictionBound::Range(range) => (Vec::new(), Some(range)),
        };
        Self {
            property: restriction.property,
            values,
            range,
        }
    }
}

impl Restriction {
    /// Restrict a property to a set of values; an empty list leaves it unrestricted
    pub fn values<I, S>(property: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        let bound = if values.is_empty() {
            RestrictionBound::Unrestricted
        } else {
            RestrictionBound::Values(values)
        };
        Self {
            property: property.into(),
            bound,
        }
    }

    pub fn range(property: impl Into<String>, range: RangeType) -> Self {
        Self {
            property: property.into(),
            bound: RestrictionBound::Range(range),
        }
    }

    pub fn unrestricted(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            bound: RestrictionBound::Unrestricted,
        }
    }

    /// Check an actual property value against this restriction.
    ///
    /// Range restrictions parse the value as an integer; a value that does
    /// not parse does not satisfy the range.
    pub fn is_satisfied_by(&self, value: &str) -> bool {
        match &self.bound {
            RestrictionBound::Unrestricted => true,
            RestrictionBound::Values(values) => values.iter().any(|v| v == value),
            RestrictionBound::Range(range) => value
                .trim()
                .parse::<i64>()
                .map(|v| range.contains(v))
                .unwrap_or(false),
        }
    }

    fn is_range(&self) -> bool {
        matches!(self.bound, RestrictionBound::Range(_))
    }
}

/// Merge `incoming` into a single category's restriction list.
///
/// Value lists for the same property are unioned (an unrestricted entry
/// absorbs any list), ranges for the same property are intersected. Returns
/// the property name when the resulting range admits no value; on an empty
/// intersection the existing range is left untouched.
fn merge_into(list: &mut Vec<Restriction>, incoming: &Restriction) -> Option<String> {
    let wants_range = incoming.is_range();
    let existing = list
        .iter_mut()
        .find(|r| r.property == incoming.property && r.is_range() == wants_range);

    let Some(existing) = existing else {
        list.push(incoming.clone());
        return match &incoming.bound {
            RestrictionBound::Range(range) if range.is_empty() => Some(incoming.property.clone()),
            _ => None,
        };
    };

    match (&mut existing.bound, &incoming.bound) {
        (RestrictionBound::Range(current), RestrictionBound::Range(other)) => {
            match current.intersect(other) {
                Some(merged) => *current = merged,
                None => return Some(incoming.property.clone()),
            }
        }
        (RestrictionBound::Unrestricted, _) => {}
        (bound, RestrictionBound::Unrestricted) => *bound = RestrictionBound::Unrestricted,
        (RestrictionBound::Values(current), RestrictionBound::Values(other)) => {
            for value in other {
                if !current.contains(value) {
                    current.push(value.clone());
                }
            }
        }
        // Range and value-class entries are never paired above.
        _ => {}
    }
    None
}

/// Deployment restrictions on clusters, modules and storage accounts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restrictions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clusters: Vec<Restriction>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<Restriction>,

    #[serde(default, rename = "storageaccounts", skip_serializing_if = "Vec::is_empty")]
    pub storage_accounts: Vec<Restriction>,
}

impl Restrictions {
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty() && self.modules.is_empty() && self.storage_accounts.is_empty()
    }

    pub fn with_cluster(mut self, restriction: Restriction) -> Self {
        self.clusters.push(restriction);
        self
    }

    pub fn with_module(mut self, restriction: Restriction) -> Self {
        self.modules.push(restriction);
        self
    }

    pub fn with_storage_account(mut self, restriction: Restriction) -> Self {
        self.storage_accounts.push(restriction);
        self
    }

    /// Merge another set of restrictions into this one, category by category.
    ///
    /// Returns the properties whose ranges no longer intersect.
    pub fn merge(&mut self, other: &Restrictions) -> Vec<String> {
        let mut unsatisfiable = Vec::new();
        let categories = [
            (&mut self.clusters, &other.clusters),
            (&mut self.modules, &other.modules),
            (&mut self.storage_accounts, &other.storage_accounts),
        ];
        for (mine, theirs) in categories {
            for restriction in theirs {
                if let Some(property) = merge_into(mine, restriction) {
                    unsatisfiable.push(property);
                }
            }
        }
        unsatisfiable
    }

    /// Properties carrying a range that admits no value
    pub fn unsatisfiable(&self) -> Vec<String> {
        self.clusters
            .iter()
            .chain(&self.modules)
            .chain(&self.storage_accounts)
            .filter(|r| matches!(&r.bound, RestrictionBound::Range(range) if range.is_empty()))
            .map(|r| r.property.clone())
            .collect()
    }

    /// Whether every cluster restriction holds for `cluster`.
    ///
    /// A restriction on a property the cluster does not expose only holds
    /// when it is unrestricted.
    pub fn allows_cluster(&self, cluster: &Cluster) -> bool {
        Self::holds(&self.clusters, |property| cluster.property(property))
    }

    /// Whether every module restriction holds for a module's properties
    pub fn allows_module<'a, F>(&self, lookup: F) -> bool
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        Self::holds(&self.modules, lookup)
    }

    /// Whether every storage-account restriction holds for an account's properties
    pub fn allows_storage_account<'a, F>(&self, lookup: F) -> bool
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        Self::holds(&self.storage_accounts, lookup)
    }

    fn holds<'a, F>(restrictions: &[Restriction], lookup: F) -> bool
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        restrictions.iter().all(|r| match lookup(&r.property) {
            Some(value) => r.is_satisfied_by(value),
            None => r.bound == RestrictionBound::Unrestricted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterMetadata;

    #[test]
    fn test_range_intersection() {
        let a = RangeType::between(1, 10);
        let b = RangeType::between(5, 20);
        assert_eq!(a.intersect(&b), Some(RangeType::between(5, 10)));

        let c = RangeType::at_least(11);
        assert_eq!(a.intersect(&c), None);
    }

    #[test]
    fn test_exclusive_bounds_touching_are_empty() {
        let a = RangeType {
            max: Some(5),
            exclusive_max: true,
            ..Default::default()
        };
        let b = RangeType::at_least(5);
        assert!(a.intersect(&b).is_none());

        let c = RangeType::at_least(4);
        let merged = a.intersect(&c).unwrap();
        assert!(merged.contains(4));
        assert!(!merged.contains(5));
    }

    #[test]
    fn test_unbounded_range_contains_everything() {
        let open = RangeType::default();
        assert!(open.contains(i64::MIN));
        assert!(open.contains(i64::MAX));
        assert!(!open.is_empty());
    }

    #[test]
    fn test_value_lists_union() {
        let mut merged = Restrictions::default().with_cluster(Restriction::values("cluster", ["eu-1"]));
        let other = Restrictions::default().with_cluster(Restriction::values("cluster", ["eu-1", "us-1"]));

        assert!(merged.merge(&other).is_empty());
        assert_eq!(
            merged.clusters,
            vec![Restriction::values("cluster", ["eu-1", "us-1"])]
        );
    }

    #[test]
    fn test_unrestricted_absorbs_values() {
        let mut merged = Restrictions::default().with_module(Restriction::values("type", ["plugin"]));
        let other = Restrictions::default().with_module(Restriction::unrestricted("type"));
        merged.merge(&other);
        assert_eq!(merged.modules, vec![Restriction::unrestricted("type")]);
    }

    #[test]
    fn test_empty_range_reported() {
        let mut merged = Restrictions::default()
            .with_storage_account(Restriction::range("capacity", RangeType::at_most(10)));
        let other = Restrictions::default()
            .with_storage_account(Restriction::range("capacity", RangeType::at_least(20)));

        assert_eq!(merged.merge(&other), vec!["capacity".to_string()]);
    }

    #[test]
    fn test_lone_empty_range_reported() {
        let mut merged = Restrictions::default();
        let other = Restrictions::default()
            .with_cluster(Restriction::range("nodes", RangeType::between(5, 1)));
        assert_eq!(merged.merge(&other), vec!["nodes".to_string()]);
    }

    #[test]
    fn test_categories_merge_independently() {
        let mut merged = Restrictions::default().with_cluster(Restriction::values("region", ["a"]));
        let other = Restrictions::default().with_module(Restriction::values("region", ["b"]));
        merged.merge(&other);
        assert_eq!(merged.clusters.len(), 1);
        assert_eq!(merged.modules.len(), 1);
    }

    #[test]
    fn test_restriction_rejects_both_values_and_range() {
        let json = r#"{"property":"x","values":["a"],"range":{"min":1}}"#;
        let parsed: Result<Restriction, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_restriction_wire_shape() {
        let json = r#"{"property":"cluster","values":["eu-1","us-1"]}"#;
        let parsed: Restriction = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, Restriction::values("cluster", ["eu-1", "us-1"]));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), json);

        let bare: Restriction = serde_json::from_str(r#"{"property":"zone"}"#).unwrap();
        assert_eq!(bare.bound, RestrictionBound::Unrestricted);
    }

    #[test]
    fn test_range_satisfaction_parses_integers() {
        let r = Restriction::range("replicas", RangeType::between(1, 3));
        assert!(r.is_satisfied_by("2"));
        assert!(!r.is_satisfied_by("4"));
        assert!(!r.is_satisfied_by("two"));
    }

    #[test]
    fn test_allows_cluster() {
        let cluster = Cluster {
            name: "eu-1".into(),
            metadata: ClusterMetadata {
                region: "eu".into(),
                zone: "eu-a".into(),
            },
        };

        let ok = Restrictions::default()
            .with_cluster(Restriction::values("name", ["eu-1", "us-1"]))
            .with_cluster(Restriction::values("region", ["eu"]));
        assert!(ok.allows_cluster(&cluster));

        let wrong_region = Restrictions::default().with_cluster(Restriction::values("region", ["us"]));
        assert!(!wrong_region.allows_cluster(&cluster));

        let unknown_property =
            Restrictions::default().with_cluster(Restriction::values("tier", ["gold"]));
        assert!(!unknown_property.allows_cluster(&cluster));
    }

    #[test]
    fn test_exclusive_bound_at_integer_limit_is_empty() {
        let above_max = RangeType {
            min: Some(i64::MAX),
            exclusive_min: true,
            ..Default::default()
        };
        assert!(above_max.is_empty());
        assert!(!above_max.contains(i64::MAX));
        assert_eq!(above_max.intersect(&RangeType::default()), None);

        let below_min = RangeType {
            max: Some(i64::MIN),
            exclusive_max: true,
            ..Default::default()
        };
        assert!(below_min.is_empty());
        assert!(!below_min.contains(i64::MIN));

        assert!(RangeType::at_least(i64::MAX).contains(i64::MAX));
    }

    #[test]
    fn test_unsatisfiable_lists_empty_ranges() {
        let restrictions = Restrictions::default()
            .with_cluster(Restriction::values("name", ["eu-1"]))
            .with_module(Restriction::range("replicas", RangeType::between(5, 1)))
            .with_storage_account(Restriction::range("size", RangeType::at_least(1)));
        assert_eq!(restrictions.unsatisfiable(), vec!["replicas".to_string()]);
    }

    #[test]
    fn test_module_and_storage_account_checks() {
        let restrictions = Restrictions::default()
            .with_module(Restriction::values("type", ["copy", "read"]))
            .with_module(Restriction::range("replicas", RangeType::between(1, 3)))
            .with_storage_account(Restriction::values("region", ["eu"]));

        let module = |property: &str| match property {
            "type" => Some("read"),
            "replicas" => Some("2"),
            _ => None,
        };
        assert!(restrictions.allows_module(module));

        let too_many = |property: &str| match property {
            "type" => Some("read"),
            "replicas" => Some("5"),
            _ => None,
        };
        assert!(!restrictions.allows_module(too_many));

        // a module that does not expose a restricted property is rejected
        assert!(!restrictions.allows_module(|property: &str| (property == "type").then_some("copy")));

        assert!(restrictions.allows_storage_account(|property: &str| (property == "region").then_some("eu")));
        assert!(!restrictions.allows_storage_account(|property: &str| (property == "region").then_some("us")));

        // categories are independent: cluster checks ignore module entries
        let cluster = Cluster::new("eu-1", "eu", "eu-a");
        assert!(restrictions.allows_cluster(&cluster));
    }
}
