//! Serialized function spec input.

use serde::Deserialize;

use crate::descriptor::PreemptibleNodeSource;
use crate::error::Result;
use crate::spec::{PriorityClassPolicy, ResourceSpec};
use crate::types::{Affinity, NodeSelectorMap, Toleration};

/// A resource spec as users write it, before enrichment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpecDocument {
    /// Node to pin the pod to.
    #[serde(default)]
    pub node_name: Option<String>,
    /// Priority class name, checked against the cluster policy.
    #[serde(default)]
    pub priority_class_name: Option<String>,
    /// Labels nodes must carry.
    #[serde(default)]
    pub node_selector: NodeSelectorMap,
    /// User affinity.
    #[serde(default)]
    pub affinity: Option<Affinity>,
    /// User tolerations.
    #[serde(default)]
    pub tolerations: Option<Vec<Toleration>>,
    /// Preemption mode name.
    #[serde(default)]
    pub preemption_mode: Option<String>,
}

impl ResourceSpecDocument {
    /// Builds and enriches the spec, then assigns its priority class.
    ///
    /// A missing priority class name takes the policy default.
    ///
    /// # Errors
    ///
    /// Returns an error if the preemption mode is not recognized or the
    /// priority class is not allowed by `policy`.
    pub fn into_spec<S>(self, source: &S, policy: &PriorityClassPolicy) -> Result<ResourceSpec>
    where
        S: PreemptibleNodeSource + ?Sized,
    {
        let mut builder = ResourceSpec::builder().with_node_selector(self.node_selector);
        if let Some(node_name) = self.node_name {
            builder = builder.with_node_name(node_name);
        }
        if let Some(affinity) = self.affinity {
            builder = builder.with_affinity(affinity);
        }
        if let Some(tolerations) = self.tolerations {
            builder = builder.with_tolerations(tolerations);
        }
        if let Some(mode) = self.preemption_mode {
            builder = builder.with_preemption_mode(mode);
        }
        let mut spec = builder.build(source)?;
        spec.set_priority_class_name(self.priority_class_name.as_deref(), policy)?;
        Ok(spec)
    }
}
