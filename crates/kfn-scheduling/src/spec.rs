//! Resource spec container.
//!
//! [`SchedulingFields`] owns one group of scheduling fields and keeps them
//! consistent with its preemption mode: every mode change and every node
//! selection runs the [`PreemptionResolver`]. [`ResourceSpec`] is the pod
//! level spec of a function; [`DriverExecutorSpec`] carries the separate
//! driver and executor groups of distributed jobs.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::affinity::{clear_if_empty, merge_affinity};
use crate::descriptor::PreemptibleNodeSource;
use crate::error::{Result, SchedulingError};
use crate::node_selector::merge_with_precedence;
use crate::resolver::{AffinityHolder, PreemptionResolver};
use crate::tolerations::merge_tolerations;
use crate::types::{Affinity, NodeSelectorMap, PreemptionMode, Toleration};

/// One group of scheduling fields and the preemption mode they express.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    affinity: Option<Affinity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tolerations: Option<Vec<Toleration>>,
    #[serde(skip_serializing_if = "NodeSelectorMap::is_empty")]
    node_selector: NodeSelectorMap,
    preemption_mode: PreemptionMode,
}

impl SchedulingFields {
    /// Starts building a field group.
    #[must_use]
    pub fn builder() -> SchedulingFieldsBuilder {
        SchedulingFieldsBuilder::default()
    }

    /// Returns the affinity, if any.
    #[must_use]
    pub const fn affinity(&self) -> Option<&Affinity> {
        self.affinity.as_ref()
    }

    /// Returns the tolerations, if any.
    #[must_use]
    pub fn tolerations(&self) -> Option<&[Toleration]> {
        self.tolerations.as_deref()
    }

    /// Returns the node selector.
    #[must_use]
    pub const fn node_selector(&self) -> &NodeSelectorMap {
        &self.node_selector
    }

    /// Returns the preemption mode.
    #[must_use]
    pub const fn preemption_mode(&self) -> PreemptionMode {
        self.preemption_mode
    }

    /// Parses and applies a preemption mode.
    ///
    /// `None` or an empty string selects the source's default mode.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::InvalidPreemptionMode`] for an unknown mode;
    /// the fields are left unchanged.
    pub fn set_preemption_mode<S>(&mut self, mode: Option<&str>, source: &S) -> Result<()>
    where
        S: PreemptibleNodeSource + ?Sized,
    {
        let mode = match mode.filter(|raw| !raw.is_empty()) {
            Some(raw) => raw.parse::<PreemptionMode>()?,
            None => {
                let default = source.default_preemption_mode();
                debug!(
                    default_preemption_mode = %default,
                    "No preemption mode was given, using the default preemption mode"
                );
                default
            }
        };
        self.apply_preemption_mode(mode, source);
        Ok(())
    }

    /// Stores `mode` and enriches the fields for it.
    pub fn apply_preemption_mode<S>(&mut self, mode: PreemptionMode, source: &S)
    where
        S: PreemptibleNodeSource + ?Sized,
    {
        self.preemption_mode = mode;
        PreemptionResolver::new(source).enrich(mode, self);
    }

    /// Folds user node selection into the fields, then re-applies the current mode.
    ///
    /// Existing node selector entries win over incoming ones; affinity and
    /// tolerations are merged without duplicates. Merged affinity or
    /// tolerations that end up empty are cleared even when the mode leaves
    /// the fields alone.
    pub fn set_node_selection<S>(&mut self, selection: NodeSelection, source: &S)
    where
        S: PreemptibleNodeSource + ?Sized,
    {
        if let Some(node_selector) = selection.node_selector {
            self.node_selector = merge_with_precedence(&node_selector, &self.node_selector);
        }
        if let Some(affinity) = selection.affinity {
            self.affinity = clear_if_empty(merge_affinity(self.affinity.take(), affinity));
        }
        if let Some(tolerations) = selection.tolerations {
            let merged =
                merge_tolerations(self.tolerations.take().unwrap_or_default(), &tolerations);
            self.tolerations = (!merged.is_empty()).then_some(merged);
        }
        PreemptionResolver::new(source).enrich(self.preemption_mode, self);
    }
}

impl AffinityHolder for SchedulingFields {
    fn affinity_mut(&mut self) -> &mut Option<Affinity> {
        &mut self.affinity
    }

    fn tolerations_mut(&mut self) -> &mut Option<Vec<Toleration>> {
        &mut self.tolerations
    }

    fn node_selector_mut(&mut self) -> &mut NodeSelectorMap {
        &mut self.node_selector
    }
}

/// Builder for [`SchedulingFields`].
#[derive(Debug, Clone, Default)]
pub struct SchedulingFieldsBuilder {
    affinity: Option<Affinity>,
    tolerations: Option<Vec<Toleration>>,
    node_selector: NodeSelectorMap,
    preemption_mode: Option<String>,
}

impl SchedulingFieldsBuilder {
    /// Sets the user supplied affinity.
    #[must_use]
    pub fn with_affinity(mut self, affinity: Affinity) -> Self {
        self.affinity = Some(affinity);
        self
    }

    /// Sets the user supplied tolerations.
    #[must_use]
    pub fn with_tolerations(mut self, tolerations: Vec<Toleration>) -> Self {
        self.tolerations = Some(tolerations);
        self
    }

    /// Sets the user supplied node selector.
    #[must_use]
    pub fn with_node_selector(mut self, node_selector: NodeSelectorMap) -> Self {
        self.node_selector = node_selector;
        self
    }

    /// Sets the preemption mode by name.
    #[must_use]
    pub fn with_preemption_mode(mut self, mode: impl Into<String>) -> Self {
        self.preemption_mode = Some(mode.into());
        self
    }

    /// Builds the fields and enriches them for the requested (or default) mode.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::InvalidPreemptionMode`] for an unknown mode.
    pub fn build<S>(self, source: &S) -> Result<SchedulingFields>
    where
        S: PreemptibleNodeSource + ?Sized,
    {
        let mut fields = SchedulingFields {
            affinity: self.affinity,
            tolerations: self.tolerations,
            node_selector: self.node_selector,
            preemption_mode: PreemptionMode::default(),
        };
        fields.set_preemption_mode(self.preemption_mode.as_deref(), source)?;
        Ok(fields)
    }
}

/// Node selection requested by a user. Absent parts are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSelection {
    /// Labels nodes must carry.
    pub node_selector: Option<NodeSelectorMap>,
    /// Affinity to merge.
    pub affinity: Option<Affinity>,
    /// Tolerations to merge.
    pub tolerations: Option<Vec<Toleration>>,
}

impl NodeSelection {
    /// Creates an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the node selector.
    #[must_use]
    pub fn with_node_selector(mut self, node_selector: NodeSelectorMap) -> Self {
        self.node_selector = Some(node_selector);
        self
    }

    /// Sets the affinity.
    #[must_use]
    pub fn with_affinity(mut self, affinity: Affinity) -> Self {
        self.affinity = Some(affinity);
        self
    }

    /// Sets the tolerations.
    #[must_use]
    pub fn with_tolerations(mut self, tolerations: Vec<Toleration>) -> Self {
        self.tolerations = Some(tolerations);
        self
    }
}

/// Priority classes a cluster accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityClassPolicy {
    /// Name used when none is given.
    #[serde(default)]
    pub default_name: Option<String>,
    /// Names that may be assigned.
    #[serde(default)]
    pub valid_names: Vec<String>,
}

/// Pod level scheduling spec of a function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    node_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority_class_name: Option<String>,
    #[serde(flatten)]
    scheduling: SchedulingFields,
}

impl ResourceSpec {
    /// Starts building a spec.
    #[must_use]
    pub fn builder() -> ResourceSpecBuilder {
        ResourceSpecBuilder::default()
    }

    /// Returns the node the pod is pinned to, if any.
    #[must_use]
    pub fn node_name(&self) -> Option<&str> {
        self.node_name.as_deref()
    }

    /// Returns the priority class name, if any.
    #[must_use]
    pub fn priority_class_name(&self) -> Option<&str> {
        self.priority_class_name.as_deref()
    }

    /// Returns the pod scheduling fields.
    #[must_use]
    pub const fn scheduling(&self) -> &SchedulingFields {
        &self.scheduling
    }

    /// Returns the affinity, if any.
    #[must_use]
    pub const fn affinity(&self) -> Option<&Affinity> {
        self.scheduling.affinity()
    }

    /// Returns the tolerations, if any.
    #[must_use]
    pub fn tolerations(&self) -> Option<&[Toleration]> {
        self.scheduling.tolerations()
    }

    /// Returns the node selector.
    #[must_use]
    pub const fn node_selector(&self) -> &NodeSelectorMap {
        self.scheduling.node_selector()
    }

    /// Returns the preemption mode.
    #[must_use]
    pub const fn preemption_mode(&self) -> PreemptionMode {
        self.scheduling.preemption_mode()
    }

    /// Parses and applies a preemption mode. See [`SchedulingFields::set_preemption_mode`].
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::InvalidPreemptionMode`] for an unknown mode.
    pub fn set_preemption_mode<S>(&mut self, mode: Option<&str>, source: &S) -> Result<()>
    where
        S: PreemptibleNodeSource + ?Sized,
    {
        self.scheduling.set_preemption_mode(mode, source)
    }

    /// Stores `mode` and enriches the pod fields for it.
    pub fn apply_preemption_mode<S>(&mut self, mode: PreemptionMode, source: &S)
    where
        S: PreemptibleNodeSource + ?Sized,
    {
        self.scheduling.apply_preemption_mode(mode, source);
    }

    /// Pins the pod to a node and folds in node selection.
    pub fn set_node_selection<S>(
        &mut self,
        node_name: Option<&str>,
        selection: NodeSelection,
        source: &S,
    ) where
        S: PreemptibleNodeSource + ?Sized,
    {
        if let Some(node_name) = node_name.filter(|name| !name.is_empty()) {
            self.node_name = Some(node_name.to_string());
        }
        self.scheduling.set_node_selection(selection, source);
    }

    /// Sets the priority class, falling back to the policy default.
    ///
    /// `None` or an empty name selects the default; with no default the name
    /// is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::PriorityClassNotAllowed`] if the name is not
    /// one of the policy's valid names; the spec is left unchanged.
    pub fn set_priority_class_name(
        &mut self,
        name: Option<&str>,
        policy: &PriorityClassPolicy,
    ) -> Result<()> {
        let Some(name) = name
            .filter(|name| !name.is_empty())
            .or(policy.default_name.as_deref())
        else {
            self.priority_class_name = None;
            return Ok(());
        };

        if !policy.valid_names.iter().any(|valid| valid == name) {
            warn!(
                priority_class_name = name,
                valid_priority_class_names = ?policy.valid_names,
                "Priority class name not in available priority class names"
            );
            return Err(SchedulingError::PriorityClassNotAllowed {
                name: name.to_string(),
                valid: policy.valid_names.clone(),
            });
        }

        self.priority_class_name = Some(name.to_string());
        Ok(())
    }
}

/// Builder for [`ResourceSpec`].
#[derive(Debug, Clone, Default)]
pub struct ResourceSpecBuilder {
    node_name: Option<String>,
    scheduling: SchedulingFieldsBuilder,
}

impl ResourceSpecBuilder {
    /// Pins the pod to a node.
    #[must_use]
    pub fn with_node_name(mut self, node_name: impl Into<String>) -> Self {
        self.node_name = Some(node_name.into());
        self
    }

    /// Sets the user supplied affinity.
    #[must_use]
    pub fn with_affinity(mut self, affinity: Affinity) -> Self {
        self.scheduling = self.scheduling.with_affinity(affinity);
        self
    }

    /// Sets the user supplied tolerations.
    #[must_use]
    pub fn with_tolerations(mut self, tolerations: Vec<Toleration>) -> Self {
        self.scheduling = self.scheduling.with_tolerations(tolerations);
        self
    }

    /// Sets the user supplied node selector.
    #[must_use]
    pub fn with_node_selector(mut self, node_selector: NodeSelectorMap) -> Self {
        self.scheduling = self.scheduling.with_node_selector(node_selector);
        self
    }

    /// Sets the preemption mode by name.
    #[must_use]
    pub fn with_preemption_mode(mut self, mode: impl Into<String>) -> Self {
        self.scheduling = self.scheduling.with_preemption_mode(mode);
        self
    }

    /// Builds the spec, enriching it for the requested (or default) mode.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::InvalidPreemptionMode`] for an unknown mode.
    pub fn build<S>(self, source: &S) -> Result<ResourceSpec>
    where
        S: PreemptibleNodeSource + ?Sized,
    {
        Ok(ResourceSpec {
            node_name: self.node_name,
            priority_class_name: None,
            scheduling: self.scheduling.build(source)?,
        })
    }
}

/// Driver and executor scheduling groups of a distributed job.
///
/// Each group has its own preemption mode and is enriched independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriverExecutorSpec {
    /// Scheduling of the driver pod.
    pub driver: SchedulingFields,
    /// Scheduling of the executor pods.
    pub executor: SchedulingFields,
}

impl DriverExecutorSpec {
    /// Creates a spec from two built groups.
    #[must_use]
    pub const fn new(driver: SchedulingFields, executor: SchedulingFields) -> Self {
        Self { driver, executor }
    }
}
