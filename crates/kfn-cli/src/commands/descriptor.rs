//! Descriptor command implementation.

use std::io::Write;

use kfn_scheduling::{
    NodeSelectorMap, NodeSelectorTerm, PreemptibleNodeSource, PreemptionMode, Toleration,
};
use serde::Serialize;

use crate::error::Result;
use crate::output::write_json;

/// Handler for the descriptor command.
pub struct DescriptorCommand<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: PreemptibleNodeSource + ?Sized> DescriptorCommand<'a, S> {
    /// Creates a new descriptor command handler.
    #[must_use]
    pub const fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Executes the descriptor command.
    ///
    /// # Errors
    ///
    /// Returns error if output fails.
    pub fn execute<W: Write>(&self, out: &mut W) -> Result<()> {
        write_json(out, &DescriptorReport::from_source(self.source))
    }
}

/// Everything the resolver derives from the preemptible node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorReport {
    /// Whether any preemptible node configuration exists.
    pub configured: bool,
    /// Preemptible tolerations.
    pub tolerations: Vec<Toleration>,
    /// Preemptible node labels.
    pub node_selector: NodeSelectorMap,
    /// Terms used by `constrain`.
    pub affinity_terms: Vec<NodeSelectorTerm>,
    /// Terms used by `prevent` without tolerations.
    pub anti_affinity_terms: Vec<NodeSelectorTerm>,
    /// Mode used when none is given.
    pub default_preemption_mode: PreemptionMode,
}

impl DescriptorReport {
    /// Snapshots the descriptor of `source`.
    pub fn from_source<S: PreemptibleNodeSource + ?Sized>(source: &S) -> Self {
        Self {
            configured: source.is_preemption_configured(),
            tolerations: source.preemptible_tolerations(),
            node_selector: source.preemptible_node_selector(),
            affinity_terms: source.preemptible_affinity_terms(),
            anti_affinity_terms: source.preemptible_anti_affinity_terms(),
            default_preemption_mode: source.default_preemption_mode(),
        }
    }
}
