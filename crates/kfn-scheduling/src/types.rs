//! Core types for scheduling enrichment.
//!
//! This module provides the Kubernetes scheduling structures kfn edits:
//! - [`NodeSelectorRequirement`] / [`NodeSelectorTerm`] / [`NodeSelector`]: node affinity expressions
//! - [`Affinity`]: node affinity plus pod (anti-)affinity
//! - [`Toleration`]: pod-side marker matching node taints
//! - [`NodeSelectorMap`]: the plain label selector map
//! - [`PreemptionMode`]: how a function relates to preemptible nodes
//!
//! All of them are plain values with structural equality. Serialized field
//! names follow the Kubernetes pod spec, and empty or absent fields are omitted.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SchedulingError;

/// Plain label-match map (`nodeSelector`). All entries must match.
pub type NodeSelectorMap = BTreeMap<String, String>;

/// Operator of a node selector requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeSelectorOperator {
    /// Label value is one of `values`.
    In,
    /// Label value is none of `values`.
    NotIn,
    /// Label key is present.
    Exists,
    /// Label key is absent.
    DoesNotExist,
    /// Label value is numerically greater than the single value.
    Gt,
    /// Label value is numerically lower than the single value.
    Lt,
}

impl NodeSelectorOperator {
    /// Returns the Kubernetes spelling of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::In => "In",
            Self::NotIn => "NotIn",
            Self::Exists => "Exists",
            Self::DoesNotExist => "DoesNotExist",
            Self::Gt => "Gt",
            Self::Lt => "Lt",
        }
    }
}

impl fmt::Display for NodeSelectorOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single label match expression.
///
/// Equality is structural and `values` is compared in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSelectorRequirement {
    /// Label key the requirement applies to.
    pub key: String,
    /// Relationship between the key and `values`.
    pub operator: NodeSelectorOperator,
    /// Values compared against the label.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

impl NodeSelectorRequirement {
    /// Creates a requirement.
    #[must_use]
    pub fn new<I, V>(key: impl Into<String>, operator: NodeSelectorOperator, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            key: key.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// An AND of match expressions and match fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSelectorTerm {
    /// Requirements on node labels.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_expressions: Vec<NodeSelectorRequirement>,
    /// Requirements on node fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_fields: Vec<NodeSelectorRequirement>,
}

impl NodeSelectorTerm {
    /// Creates a term holding only label expressions.
    #[must_use]
    pub fn with_expressions(match_expressions: Vec<NodeSelectorRequirement>) -> Self {
        Self {
            match_expressions,
            match_fields: Vec::new(),
        }
    }

    /// Returns true if the term carries neither expressions nor fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.match_expressions.is_empty() && self.match_fields.is_empty()
    }
}

/// An OR across node selector terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSelector {
    /// Terms, at least one of which must match.
    #[serde(default)]
    pub node_selector_terms: Vec<NodeSelectorTerm>,
}

impl NodeSelector {
    /// Creates a selector from terms.
    #[must_use]
    pub const fn new(node_selector_terms: Vec<NodeSelectorTerm>) -> Self {
        Self {
            node_selector_terms,
        }
    }
}

/// A weighted soft node preference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferredSchedulingTerm {
    /// Weight in the range 1-100.
    pub weight: i32,
    /// Term the node should match.
    pub preference: NodeSelectorTerm,
}

/// Node affinity: hard and soft node constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAffinity {
    /// Hard constraint evaluated at scheduling time.
    #[serde(
        rename = "requiredDuringSchedulingIgnoredDuringExecution",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub required: Option<NodeSelector>,
    /// Soft, weighted constraints.
    #[serde(
        rename = "preferredDuringSchedulingIgnoredDuringExecution",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub preferred: Vec<PreferredSchedulingTerm>,
}

impl NodeAffinity {
    /// Creates a node affinity with only a required selector.
    #[must_use]
    pub const fn required(terms: Vec<NodeSelectorTerm>) -> Self {
        Self {
            required: Some(NodeSelector::new(terms)),
            preferred: Vec::new(),
        }
    }

    /// Returns the required terms, or an empty slice.
    #[must_use]
    pub fn required_terms(&self) -> &[NodeSelectorTerm] {
        self.required
            .as_ref()
            .map_or(&[], |selector| selector.node_selector_terms.as_slice())
    }

    /// Returns true if there are no required terms and no preferred terms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.required_terms().is_empty() && self.preferred.is_empty()
    }
}

/// A label selector requirement on pods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelectorRequirement {
    /// Label key.
    pub key: String,
    /// `In`, `NotIn`, `Exists` or `DoesNotExist`.
    pub operator: String,
    /// Values compared against the label.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

/// Selects pods by labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    /// Expression based requirements.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_expressions: Vec<LabelSelectorRequirement>,
    /// Exact label matches.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,
}

/// A pod (anti-)affinity term.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodAffinityTerm {
    /// Pods this term refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<LabelSelector>,
    /// Namespaces the label selector applies to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<String>,
    /// Node label defining co-location.
    pub topology_key: String,
}

/// A weighted soft pod (anti-)affinity term.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedPodAffinityTerm {
    /// Weight in the range 1-100.
    pub weight: i32,
    /// The term itself.
    pub pod_affinity_term: PodAffinityTerm,
}

/// Pod affinity or anti-affinity. The same shape serves both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodAffinity {
    /// Hard terms.
    #[serde(
        rename = "requiredDuringSchedulingIgnoredDuringExecution",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub required: Vec<PodAffinityTerm>,
    /// Soft terms.
    #[serde(
        rename = "preferredDuringSchedulingIgnoredDuringExecution",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub preferred: Vec<WeightedPodAffinityTerm>,
}

impl PodAffinity {
    /// Returns true if there are no terms at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.preferred.is_empty()
    }
}

/// Scheduling affinity of a pod.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Affinity {
    /// Constraints on nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_affinity: Option<NodeAffinity>,
    /// Co-location with other pods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_affinity: Option<PodAffinity>,
    /// Separation from other pods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_anti_affinity: Option<PodAffinity>,
}

impl Affinity {
    /// Creates an affinity holding only node affinity.
    #[must_use]
    pub const fn from_node_affinity(node_affinity: NodeAffinity) -> Self {
        Self {
            node_affinity: Some(node_affinity),
            pod_affinity: None,
            pod_anti_affinity: None,
        }
    }

    /// Returns the required node selector terms, or an empty slice.
    #[must_use]
    pub fn required_terms(&self) -> &[NodeSelectorTerm] {
        self.node_affinity
            .as_ref()
            .map_or(&[], NodeAffinity::required_terms)
    }

    /// Returns true if node affinity, pod affinity and pod anti-affinity are all empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node_affinity.as_ref().is_none_or(NodeAffinity::is_empty)
            && self.pod_affinity.as_ref().is_none_or(PodAffinity::is_empty)
            && self
                .pod_anti_affinity
                .as_ref()
                .is_none_or(PodAffinity::is_empty)
    }
}

/// Toleration operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TolerationOperator {
    /// Matches any value of the key.
    Exists,
    /// Matches only the given value.
    Equal,
}

/// Taint effect a toleration applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaintEffect {
    /// Do not schedule new pods.
    NoSchedule,
    /// Avoid scheduling new pods when possible.
    PreferNoSchedule,
    /// Evict running pods.
    NoExecute,
}

/// Pod-side marker permitting scheduling onto nodes with a matching taint.
///
/// Equality is structural across every field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toleration {
    /// Taint key; empty with `Exists` matches every taint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Relationship between key and value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<TolerationOperator>,
    /// Taint value for `Equal`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Taint effect to match; none matches all effects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<TaintEffect>,
    /// How long a `NoExecute` taint is tolerated before eviction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toleration_seconds: Option<i64>,
}

impl Toleration {
    /// Tolerates any value of `key` for `effect`.
    #[must_use]
    pub fn exists(key: impl Into<String>, effect: TaintEffect) -> Self {
        Self {
            key: Some(key.into()),
            operator: Some(TolerationOperator::Exists),
            value: None,
            effect: Some(effect),
            toleration_seconds: None,
        }
    }

    /// Tolerates `key=value` for `effect`.
    #[must_use]
    pub fn equal(key: impl Into<String>, value: impl Into<String>, effect: TaintEffect) -> Self {
        Self {
            key: Some(key.into()),
            operator: Some(TolerationOperator::Equal),
            value: Some(value.into()),
            effect: Some(effect),
            toleration_seconds: None,
        }
    }

    /// Sets the toleration period.
    #[must_use]
    pub const fn with_toleration_seconds(mut self, seconds: i64) -> Self {
        self.toleration_seconds = Some(seconds);
        self
    }
}

/// Whether and how a function may run on preemptible nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PreemptionMode {
    /// Leave scheduling constraints as they are.
    None,
    /// May run on preemptible nodes.
    Allow,
    /// Must run on preemptible nodes.
    Constrain,
    /// Must not run on preemptible nodes.
    #[default]
    Prevent,
}

impl PreemptionMode {
    /// All modes, in declaration order.
    pub const ALL: [Self; 4] = [Self::None, Self::Allow, Self::Constrain, Self::Prevent];

    /// Returns the lowercase name of the mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Allow => "allow",
            Self::Constrain => "constrain",
            Self::Prevent => "prevent",
        }
    }
}

impl fmt::Display for PreemptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreemptionMode {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| SchedulingError::InvalidPreemptionMode {
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn spot_in() -> NodeSelectorRequirement {
        NodeSelectorRequirement::new("node-type", NodeSelectorOperator::In, ["spot"])
    }

    // ===================
    // PreemptionMode Tests
    // ===================

    #[test_case("none", PreemptionMode::None ; "none")]
    #[test_case("allow", PreemptionMode::Allow ; "allow")]
    #[test_case("constrain", PreemptionMode::Constrain ; "constrain")]
    #[test_case("prevent", PreemptionMode::Prevent ; "prevent")]
    fn preemption_mode_parses(input: &str, expected: PreemptionMode) {
        assert_eq!(input.parse::<PreemptionMode>(), Ok(expected));
        assert_eq!(expected.to_string(), input);
    }

    #[test_case("" ; "empty string")]
    #[test_case("Prevent" ; "wrong case")]
    #[test_case("sometimes" ; "unknown word")]
    #[test_case(" allow" ; "leading space")]
    fn preemption_mode_rejects(input: &str) {
        let err = input.parse::<PreemptionMode>();
        assert_eq!(
            err,
            Err(SchedulingError::InvalidPreemptionMode {
                value: input.to_string()
            })
        );
    }

    #[test]
    fn preemption_mode_default_is_prevent() {
        assert_eq!(PreemptionMode::default(), PreemptionMode::Prevent);
    }

    #[test]
    fn preemption_mode_serde_lowercase() {
        let json = serde_json::to_string(&PreemptionMode::Constrain).expect("serialize");
        assert_eq!(json, "\"constrain\"");
        let mode: PreemptionMode = serde_json::from_str("\"allow\"").expect("deserialize");
        assert_eq!(mode, PreemptionMode::Allow);
    }

    // ===================
    // Equality Tests
    // ===================

    #[test]
    fn requirement_equality_is_structural() {
        assert_eq!(spot_in(), spot_in());
        assert_ne!(
            spot_in(),
            NodeSelectorRequirement::new("node-type", NodeSelectorOperator::NotIn, ["spot"])
        );
    }

    #[test]
    fn requirement_values_are_order_sensitive() {
        let ab = NodeSelectorRequirement::new("k", NodeSelectorOperator::In, ["a", "b"]);
        let ba = NodeSelectorRequirement::new("k", NodeSelectorOperator::In, ["b", "a"]);
        assert_ne!(ab, ba);
    }

    #[test]
    fn term_equality_is_order_sensitive() {
        let other = NodeSelectorRequirement::new("zone", NodeSelectorOperator::Exists, Vec::<String>::new());
        let t1 = NodeSelectorTerm::with_expressions(vec![spot_in(), other.clone()]);
        let t2 = NodeSelectorTerm::with_expressions(vec![other, spot_in()]);
        assert_ne!(t1, t2);
    }

    #[test]
    fn toleration_equality_includes_seconds() {
        let base = Toleration::exists("preempt", TaintEffect::NoExecute);
        assert_eq!(base, Toleration::exists("preempt", TaintEffect::NoExecute));
        assert_ne!(base.clone(), base.with_toleration_seconds(30));
    }

    // ===================
    // Emptiness Tests
    // ===================

    #[test]
    fn node_affinity_with_zero_required_terms_is_empty() {
        assert!(NodeAffinity::required(Vec::new()).is_empty());
        assert!(NodeAffinity::default().is_empty());
        assert!(!NodeAffinity::required(vec![NodeSelectorTerm::with_expressions(vec![spot_in()])]).is_empty());
    }

    #[test]
    fn node_affinity_with_preferred_is_not_empty() {
        let affinity = NodeAffinity {
            required: None,
            preferred: vec![PreferredSchedulingTerm {
                weight: 10,
                preference: NodeSelectorTerm::with_expressions(vec![spot_in()]),
            }],
        };
        assert!(!affinity.is_empty());
    }

    #[test]
    fn affinity_emptiness() {
        assert!(Affinity::default().is_empty());
        assert!(Affinity::from_node_affinity(NodeAffinity::default()).is_empty());

        let with_pod = Affinity {
            pod_anti_affinity: Some(PodAffinity {
                required: vec![PodAffinityTerm {
                    topology_key: "kubernetes.io/hostname".into(),
                    ..PodAffinityTerm::default()
                }],
                preferred: Vec::new(),
            }),
            ..Affinity::default()
        };
        assert!(!with_pod.is_empty());
    }

    // ===================
    // Serialization Tests
    // ===================

    #[test]
    fn affinity_serializes_with_kubernetes_names() {
        let affinity = Affinity::from_node_affinity(NodeAffinity::required(vec![
            NodeSelectorTerm::with_expressions(vec![spot_in()]),
        ]));
        let value = serde_json::to_value(&affinity).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "nodeAffinity": {
                    "requiredDuringSchedulingIgnoredDuringExecution": {
                        "nodeSelectorTerms": [
                            {"matchExpressions": [{"key": "node-type", "operator": "In", "values": ["spot"]}]}
                        ]
                    }
                }
            })
        );
    }

    #[test]
    fn toleration_serialization_omits_absent_fields() {
        let toleration = Toleration::exists("preempt", TaintEffect::NoSchedule);
        let value = serde_json::to_value(&toleration).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({"key": "preempt", "operator": "Exists", "effect": "NoSchedule"})
        );
    }

    #[test]
    fn toleration_deserializes_from_kubernetes_shape() {
        let toleration: Toleration = serde_json::from_str(
            r#"{"key":"spot","operator":"Equal","value":"true","effect":"NoExecute","tolerationSeconds":60}"#,
        )
        .expect("deserialize");
        assert_eq!(
            toleration,
            Toleration::equal("spot", "true", TaintEffect::NoExecute).with_toleration_seconds(60)
        );
    }
}
