//! Toleration set operations.

use crate::types::Toleration;

/// Appends every toleration of `incoming` not already present.
///
/// The result keeps first occurrences in order and never holds two equal
/// tolerations, even when `existing` already repeats one.
#[must_use]
pub fn merge_tolerations(existing: Vec<Toleration>, incoming: &[Toleration]) -> Vec<Toleration> {
    let mut merged: Vec<Toleration> = Vec::with_capacity(existing.len() + incoming.len());
    for toleration in existing.into_iter().chain(incoming.iter().cloned()) {
        if !merged.contains(&toleration) {
            merged.push(toleration);
        }
    }
    merged
}

/// Removes every toleration equal to one in `to_prune`.
#[must_use]
pub fn prune_tolerations(existing: Vec<Toleration>, to_prune: &[Toleration]) -> Vec<Toleration> {
    if to_prune.is_empty() {
        return existing;
    }
    existing
        .into_iter()
        .filter(|toleration| !to_prune.contains(toleration))
        .collect()
}
