//! Node affinity term algebra.
//!
//! Node affinity is an OR of terms, each an AND of match expressions. The
//! functions here merge, prune and override the required terms of an
//! [`Affinity`] while leaving unrelated content (preferred terms, pod
//! affinity) alone. Equality between terms and expressions is structural
//! and order-sensitive.

use crate::types::{Affinity, NodeAffinity, NodeSelector, NodeSelectorRequirement, NodeSelectorTerm};

/// Appends `new_terms` to the required selector, skipping terms already present.
///
/// A missing selector becomes one holding exactly `new_terms`. Empty
/// `new_terms` returns `existing` unchanged.
#[must_use]
pub fn merge_terms(
    existing: Option<NodeSelector>,
    new_terms: &[NodeSelectorTerm],
) -> Option<NodeSelector> {
    if new_terms.is_empty() {
        return existing;
    }

    let mut selector = existing.unwrap_or_default();
    for term in new_terms {
        if !selector.node_selector_terms.contains(term) {
            selector.node_selector_terms.push(term.clone());
        }
    }
    Some(selector)
}

/// Removes every expression equal to one in `to_prune` from the required terms.
///
/// A term survives while it still has expressions or match fields. When no
/// term survives and there are no preferred terms, node affinity is dropped.
/// Missing affinity, missing node affinity or an empty `to_prune` are no-ops.
#[must_use]
pub fn prune_requirements(
    affinity: Option<Affinity>,
    to_prune: &[NodeSelectorRequirement],
) -> Option<Affinity> {
    let mut affinity = affinity?;
    if to_prune.is_empty() {
        return Some(affinity);
    }
    let Some(mut node_affinity) = affinity.node_affinity.take() else {
        return Some(affinity);
    };

    let surviving = node_affinity
        .required
        .take()
        .map(|selector| prune_from_terms(selector.node_selector_terms, to_prune))
        .filter(|terms| !terms.is_empty());

    if surviving.is_none() && node_affinity.preferred.is_empty() {
        return Some(affinity);
    }

    node_affinity.required = surviving.map(NodeSelector::new);
    affinity.node_affinity = Some(node_affinity);
    Some(affinity)
}

fn prune_from_terms(
    terms: Vec<NodeSelectorTerm>,
    to_prune: &[NodeSelectorRequirement],
) -> Vec<NodeSelectorTerm> {
    terms
        .into_iter()
        .filter_map(|term| {
            let match_expressions: Vec<_> = term
                .match_expressions
                .into_iter()
                .filter(|expression| !to_prune.contains(expression))
                .collect();
            if match_expressions.is_empty() && term.match_fields.is_empty() {
                None
            } else {
                Some(NodeSelectorTerm {
                    match_expressions,
                    match_fields: term.match_fields,
                })
            }
        })
        .collect()
}

/// Replaces the required selector with exactly `terms`.
///
/// Affinity and node affinity are created when absent; everything else is kept.
#[must_use]
pub fn override_required(affinity: Option<Affinity>, terms: Vec<NodeSelectorTerm>) -> Affinity {
    let mut affinity = affinity.unwrap_or_default();
    affinity
        .node_affinity
        .get_or_insert_with(NodeAffinity::default)
        .required = Some(NodeSelector::new(terms));
    affinity
}

/// Drops vacuous structure and returns `None` if nothing remains.
///
/// A required selector without terms, an empty node affinity and empty pod
/// (anti-)affinity are all removed.
#[must_use]
pub fn clear_if_empty(affinity: Option<Affinity>) -> Option<Affinity> {
    let mut affinity = affinity?;

    if let Some(node_affinity) = affinity.node_affinity.as_mut() {
        if node_affinity
            .required
            .as_ref()
            .is_some_and(|selector| selector.node_selector_terms.is_empty())
        {
            node_affinity.required = None;
        }
    }
    if affinity.node_affinity.as_ref().is_some_and(NodeAffinity::is_empty) {
        affinity.node_affinity = None;
    }
    if affinity.pod_affinity.as_ref().is_some_and(|pod| pod.is_empty()) {
        affinity.pod_affinity = None;
    }
    if affinity
        .pod_anti_affinity
        .as_ref()
        .is_some_and(|pod| pod.is_empty())
    {
        affinity.pod_anti_affinity = None;
    }

    if affinity.is_empty() {
        None
    } else {
        Some(affinity)
    }
}

/// Folds a user supplied affinity into an existing one.
///
/// Required terms are merged with [`merge_terms`], preferred terms are
/// appended unless already present, and pod (anti-)affinity is replaced when
/// `incoming` carries one.
#[must_use]
pub fn merge_affinity(existing: Option<Affinity>, incoming: Affinity) -> Option<Affinity> {
    let Some(mut merged) = existing else {
        return Some(incoming);
    };

    if let Some(incoming_node) = incoming.node_affinity {
        let node_affinity = merged.node_affinity.get_or_insert_with(NodeAffinity::default);
        let incoming_terms = incoming_node
            .required
            .map(|selector| selector.node_selector_terms)
            .unwrap_or_default();
        node_affinity.required = merge_terms(node_affinity.required.take(), &incoming_terms);
        for preferred in incoming_node.preferred {
            if !node_affinity.preferred.contains(&preferred) {
                node_affinity.preferred.push(preferred);
            }
        }
    }
    if incoming.pod_affinity.is_some() {
        merged.pod_affinity = incoming.pod_affinity;
    }
    if incoming.pod_anti_affinity.is_some() {
        merged.pod_anti_affinity = incoming.pod_anti_affinity;
    }

    Some(merged)
}
