//! Node selector map operations.

use crate::types::NodeSelectorMap;

/// Unions two selectors; `high` wins on key conflicts.
#[must_use]
pub fn merge_with_precedence(low: &NodeSelectorMap, high: &NodeSelectorMap) -> NodeSelectorMap {
    let mut merged = low.clone();
    merged.extend(high.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Removes each key of `to_prune` whose value in `existing` is the same.
///
/// Entries of `to_prune` with an empty value are ignored.
#[must_use]
pub fn prune_matching(mut existing: NodeSelectorMap, to_prune: &NodeSelectorMap) -> NodeSelectorMap {
    for (key, value) in to_prune {
        if !value.is_empty() && existing.get(key) == Some(value) {
            existing.remove(key);
        }
    }
    existing
}
