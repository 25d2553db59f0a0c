//! Preemption policy resolver.
//!
//! The [`PreemptionResolver`] is responsible for:
//! - Translating a [`PreemptionMode`] into edits of affinity, tolerations and node selector
//! - Removing the artifacts of a previous mode before applying the new one
//! - Leaving constraints unrelated to preemptible nodes alone
//! - Collapsing vacuous structures so repeated enrichment is a no-op
//!
//! | Mode | Tolerations | Affinity | Node selector |
//! |------|-------------|----------|---------------|
//! | `none` | untouched | untouched | untouched |
//! | `prevent` | prune preemptible | prune `In` requirements; anti-affinity when no tolerations are configured | prune preemptible |
//! | `constrain` | merge preemptible | required terms replaced by preemptible terms | untouched |
//! | `allow` | merge preemptible | prune `NotIn` then `In` requirements | prune preemptible |

use tracing::debug;

use crate::affinity::{clear_if_empty, override_required, prune_requirements};
use crate::descriptor::PreemptibleNodeSource;
use crate::node_selector::prune_matching;
use crate::tolerations::{merge_tolerations, prune_tolerations};
use crate::types::{
    Affinity, NodeSelectorMap, NodeSelectorOperator, NodeSelectorRequirement, PreemptionMode,
    Toleration,
};

/// Scoped mutable access to one group of scheduling fields.
///
/// A spec may carry several groups (pod, driver, executor); the resolver is
/// handed one holder per group.
pub trait AffinityHolder {
    /// The group's affinity.
    fn affinity_mut(&mut self) -> &mut Option<Affinity>;

    /// The group's tolerations.
    fn tolerations_mut(&mut self) -> &mut Option<Vec<Toleration>>;

    /// The group's node selector.
    fn node_selector_mut(&mut self) -> &mut NodeSelectorMap;
}

/// Applies preemption modes to scheduling fields.
#[derive(Debug)]
pub struct PreemptionResolver<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: PreemptibleNodeSource + ?Sized> PreemptionResolver<'a, S> {
    /// Creates a resolver reading preemptible node configuration from `source`.
    #[must_use]
    pub const fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Rewrites the holder's fields so they express `mode`.
    ///
    /// Does nothing when the cluster has no preemptible node configuration
    /// or when `mode` is [`PreemptionMode::None`].
    pub fn enrich<H: AffinityHolder + ?Sized>(&self, mode: PreemptionMode, holder: &mut H) {
        if !self.source.is_preemption_configured() {
            debug!(mode = %mode, "Preemptible nodes not configured, skipping enrichment");
            return;
        }

        match mode {
            PreemptionMode::None => {
                debug!("Preemption mode is none, leaving scheduling fields untouched");
                return;
            }
            PreemptionMode::Prevent => self.prevent(holder),
            PreemptionMode::Constrain => self.constrain(holder),
            PreemptionMode::Allow => self.allow(holder),
        }

        let affinity = holder.affinity_mut();
        *affinity = clear_if_empty(affinity.take());

        let tolerations = holder.tolerations_mut();
        if tolerations.as_ref().is_some_and(Vec::is_empty) {
            *tolerations = None;
        }
    }

    fn prevent<H: AffinityHolder + ?Sized>(&self, holder: &mut H) {
        let tolerations = self.source.preemptible_tolerations();
        prune_holder_tolerations(holder, &tolerations);

        let in_requirements = self
            .source
            .preemptible_node_selector_requirements(NodeSelectorOperator::In);
        prune_holder_requirements(holder, &in_requirements);

        prune_holder_node_selector(holder, &self.source.preemptible_node_selector());

        // Tainted preemptible nodes already repel pods without the tolerations.
        if self.source.preemptible_tolerations().is_empty() {
            let terms = self.source.preemptible_anti_affinity_terms();
            debug!(
                terms = terms.len(),
                "No preemptible tolerations configured, requiring anti-affinity"
            );
            let affinity = holder.affinity_mut();
            *affinity = Some(override_required(affinity.take(), terms));
        }
    }

    fn constrain<H: AffinityHolder + ?Sized>(&self, holder: &mut H) {
        merge_holder_tolerations(holder, &self.source.preemptible_tolerations());

        let terms = self.source.preemptible_affinity_terms();
        debug!(terms = terms.len(), "Constraining to preemptible nodes");
        let affinity = holder.affinity_mut();
        *affinity = Some(override_required(affinity.take(), terms));
    }

    fn allow<H: AffinityHolder + ?Sized>(&self, holder: &mut H) {
        let not_in_requirements = self
            .source
            .preemptible_node_selector_requirements(NodeSelectorOperator::NotIn);
        prune_holder_requirements(holder, &not_in_requirements);

        let in_requirements = self
            .source
            .preemptible_node_selector_requirements(NodeSelectorOperator::In);
        prune_holder_requirements(holder, &in_requirements);

        prune_holder_node_selector(holder, &self.source.preemptible_node_selector());

        merge_holder_tolerations(holder, &self.source.preemptible_tolerations());
    }
}

fn prune_holder_requirements<H: AffinityHolder + ?Sized>(
    holder: &mut H,
    requirements: &[NodeSelectorRequirement],
) {
    let affinity = holder.affinity_mut();
    *affinity = prune_requirements(affinity.take(), requirements);
}

fn prune_holder_tolerations<H: AffinityHolder + ?Sized>(holder: &mut H, to_prune: &[Toleration]) {
    let tolerations = holder.tolerations_mut();
    if let Some(existing) = tolerations.take() {
        *tolerations = Some(prune_tolerations(existing, to_prune));
    }
}

fn merge_holder_tolerations<H: AffinityHolder + ?Sized>(holder: &mut H, incoming: &[Toleration]) {
    let tolerations = holder.tolerations_mut();
    *tolerations = Some(merge_tolerations(
        tolerations.take().unwrap_or_default(),
        incoming,
    ));
}

fn prune_holder_node_selector<H: AffinityHolder + ?Sized>(holder: &mut H, to_prune: &NodeSelectorMap) {
    let node_selector = holder.node_selector_mut();
    *node_selector = prune_matching(std::mem::take(node_selector), to_prune);
}
