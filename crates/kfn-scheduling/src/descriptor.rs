//! Preemptible node descriptor.
//!
//! The cluster configuration describes preemptible nodes through a label
//! selector and the tolerations needed to land on their taints. From those,
//! [`PreemptibleNodeSource`] derives the match expressions and affinity terms
//! the resolver adds and removes. Every call recomputes its result.

use serde::{Deserialize, Serialize};

use crate::types::{
    NodeSelectorMap, NodeSelectorOperator, NodeSelectorRequirement, NodeSelectorTerm,
    PreemptionMode, Toleration,
};

/// Source of preemptible node configuration.
///
/// Implementors supply the raw selector, tolerations and default mode; the
/// derived requirements and terms have default bodies.
pub trait PreemptibleNodeSource {
    /// Tolerations matching the taints of preemptible nodes.
    fn preemptible_tolerations(&self) -> Vec<Toleration>;

    /// Labels identifying preemptible nodes.
    fn preemptible_node_selector(&self) -> NodeSelectorMap;

    /// Mode applied when a spec does not name one.
    fn default_preemption_mode(&self) -> PreemptionMode;

    /// Returns true if any preemptible node configuration exists.
    fn is_preemption_configured(&self) -> bool {
        !self.preemptible_tolerations().is_empty() || !self.preemptible_node_selector().is_empty()
    }

    /// One requirement `{key, operator, [value]}` per selector entry.
    fn preemptible_node_selector_requirements(
        &self,
        operator: NodeSelectorOperator,
    ) -> Vec<NodeSelectorRequirement> {
        self.preemptible_node_selector()
            .into_iter()
            .map(|(key, value)| NodeSelectorRequirement::new(key, operator, [value]))
            .collect()
    }

    /// Terms matching any preemptible node: one term per `In` requirement.
    fn preemptible_affinity_terms(&self) -> Vec<NodeSelectorTerm> {
        self.preemptible_node_selector_requirements(NodeSelectorOperator::In)
            .into_iter()
            .map(|requirement| NodeSelectorTerm::with_expressions(vec![requirement]))
            .collect()
    }

    /// Terms matching only non-preemptible nodes: a single term with every `NotIn` requirement.
    fn preemptible_anti_affinity_terms(&self) -> Vec<NodeSelectorTerm> {
        let requirements = self.preemptible_node_selector_requirements(NodeSelectorOperator::NotIn);
        if requirements.is_empty() {
            return Vec::new();
        }
        vec![NodeSelectorTerm::with_expressions(requirements)]
    }
}

/// Configured preemptible node descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreemptibleNodes {
    /// Labels identifying preemptible nodes.
    #[serde(default)]
    pub node_selector: NodeSelectorMap,
    /// Tolerations for preemptible node taints.
    #[serde(default)]
    pub tolerations: Vec<Toleration>,
    /// Mode used when none is given.
    #[serde(default)]
    pub default_preemption_mode: PreemptionMode,
}

impl PreemptibleNodes {
    /// Creates an unconfigured descriptor with the `prevent` default mode.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a label identifying preemptible nodes.
    #[must_use]
    pub fn with_node_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.node_selector.insert(key.into(), value.into());
        self
    }

    /// Adds a toleration for preemptible node taints.
    #[must_use]
    pub fn with_toleration(mut self, toleration: Toleration) -> Self {
        self.tolerations.push(toleration);
        self
    }

    /// Sets the default preemption mode.
    #[must_use]
    pub const fn with_default_mode(mut self, mode: PreemptionMode) -> Self {
        self.default_preemption_mode = mode;
        self
    }
}

impl PreemptibleNodeSource for PreemptibleNodes {
    fn preemptible_tolerations(&self) -> Vec<Toleration> {
        self.tolerations.clone()
    }

    fn preemptible_node_selector(&self) -> NodeSelectorMap {
        self.node_selector.clone()
    }

    fn default_preemption_mode(&self) -> PreemptionMode {
        self.default_preemption_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaintEffect;

    fn spot_pool() -> PreemptibleNodes {
        PreemptibleNodes::new()
            .with_node_label("node-type", "spot")
            .with_node_label("lifecycle", "preemptible")
    }

    #[test]
    fn unconfigured_by_default() {
        let nodes = PreemptibleNodes::new();
        assert!(!nodes.is_preemption_configured());
        assert_eq!(nodes.default_preemption_mode(), PreemptionMode::Prevent);
        assert!(nodes.preemptible_affinity_terms().is_empty());
        assert!(nodes.preemptible_anti_affinity_terms().is_empty());
    }

    #[test]
    fn configured_by_tolerations_alone() {
        let nodes = PreemptibleNodes::new()
            .with_toleration(Toleration::exists("preempt", TaintEffect::NoSchedule));
        assert!(nodes.is_preemption_configured());
    }

    #[test]
    fn configured_by_selector_alone() {
        assert!(spot_pool().is_preemption_configured());
    }

    #[test]
    fn requirements_follow_selector_order() {
        let requirements = spot_pool().preemptible_node_selector_requirements(NodeSelectorOperator::In);
        assert_eq!(
            requirements,
            vec![
                NodeSelectorRequirement::new("lifecycle", NodeSelectorOperator::In, ["preemptible"]),
                NodeSelectorRequirement::new("node-type", NodeSelectorOperator::In, ["spot"]),
            ]
        );
    }

    #[test]
    fn affinity_terms_are_one_per_label() {
        let terms = spot_pool().preemptible_affinity_terms();
        assert_eq!(terms.len(), 2);
        assert!(terms.iter().all(|t| t.match_expressions.len() == 1));
        assert!(terms
            .iter()
            .all(|t| t.match_expressions[0].operator == NodeSelectorOperator::In));
    }

    #[test]
    fn anti_affinity_is_single_and_term() {
        let terms = spot_pool().preemptible_anti_affinity_terms();
        assert_eq!(
            terms,
            vec![NodeSelectorTerm::with_expressions(vec![
                NodeSelectorRequirement::new("lifecycle", NodeSelectorOperator::NotIn, ["preemptible"]),
                NodeSelectorRequirement::new("node-type", NodeSelectorOperator::NotIn, ["spot"]),
            ])]
        );
    }

    #[test]
    fn deserializes_from_camel_case() {
        let nodes: PreemptibleNodes = serde_json::from_str(
            r#"{
                "nodeSelector": {"node-type": "spot"},
                "tolerations": [{"key": "preempt", "operator": "Exists", "effect": "NoSchedule"}],
                "defaultPreemptionMode": "allow"
            }"#,
        )
        .expect("deserialize");
        assert_eq!(
            nodes,
            PreemptibleNodes::new()
                .with_node_label("node-type", "spot")
                .with_toleration(Toleration::exists("preempt", TaintEffect::NoSchedule))
                .with_default_mode(PreemptionMode::Allow)
        );
    }
}
