//! Preemption-aware scheduling constraints for kfn function pods.
//!
//! `kfn-scheduling` decides whether a function's pods may, must, or must not
//! land on preemptible (spot) nodes, and rewrites the pod's node affinity,
//! tolerations and node selector to say so.
//!
//! # Preemption Modes
//!
//! | Mode | Tolerations | Required affinity | Node selector |
//! |------|-------------|-------------------|---------------|
//! | `allow` | preemptible added | preemptible terms pruned | preemptible labels pruned |
//! | `constrain` | preemptible added | replaced by preemptible terms | untouched |
//! | `prevent` | preemptible pruned | anti-affinity unless tolerations are configured | preemptible labels pruned |
//! | `none` | untouched | untouched | untouched |
//!
//! Enrichment is idempotent and switching modes never leaves constraints
//! from the previous mode behind. A cluster without preemptible node
//! configuration is never touched.
//!
//! # Example
//!
//! ```rust
//! use kfn_scheduling::{PreemptibleNodes, PreemptionMode, ResourceSpec, TaintEffect, Toleration};
//!
//! let cluster = PreemptibleNodes::new()
//!     .with_node_label("node-type", "spot")
//!     .with_toleration(Toleration::exists("preempt", TaintEffect::NoSchedule));
//!
//! let mut spec = ResourceSpec::builder()
//!     .with_preemption_mode("constrain")
//!     .build(&cluster)?;
//! assert!(spec.affinity().is_some());
//! assert_eq!(spec.tolerations().map(<[Toleration]>::len), Some(1));
//!
//! spec.apply_preemption_mode(PreemptionMode::Allow, &cluster);
//! assert!(spec.affinity().is_none());
//! # Ok::<(), kfn_scheduling::SchedulingError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod affinity;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod node_selector;
pub mod resolver;
pub mod spec;
pub mod tolerations;
pub mod types;

// Re-export main types
pub use descriptor::{PreemptibleNodeSource, PreemptibleNodes};
pub use document::ResourceSpecDocument;
pub use error::{Result, SchedulingError};
pub use resolver::{AffinityHolder, PreemptionResolver};
pub use spec::{
    DriverExecutorSpec, NodeSelection, PriorityClassPolicy, ResourceSpec, ResourceSpecBuilder,
    SchedulingFields, SchedulingFieldsBuilder,
};
pub use types::{
    Affinity, NodeAffinity, NodeSelector, NodeSelectorMap, NodeSelectorOperator,
    NodeSelectorRequirement, NodeSelectorTerm, PreemptionMode, TaintEffect, Toleration,
    TolerationOperator,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::descriptor::{PreemptibleNodeSource, PreemptibleNodes};
    pub use crate::error::{Result, SchedulingError};
    pub use crate::resolver::{AffinityHolder, PreemptionResolver};
    pub use crate::spec::{NodeSelection, PriorityClassPolicy, ResourceSpec, SchedulingFields};
    pub use crate::types::{Affinity, NodeSelectorMap, PreemptionMode, TaintEffect, Toleration};
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    fn cluster() -> PreemptibleNodes {
        PreemptibleNodes::new()
            .with_node_label("node-type", "spot")
            .with_node_label("lifecycle", "preemptible")
            .with_toleration(Toleration::exists("preempt", TaintEffect::NoSchedule))
            .with_toleration(Toleration::equal("spot", "true", TaintEffect::NoExecute))
    }

    #[test]
    fn full_mode_cycle() {
        let cluster = cluster();
        let user_affinity = Affinity::from_node_affinity(NodeAffinity::required(vec![
            NodeSelectorTerm::with_expressions(vec![NodeSelectorRequirement::new(
                "zone",
                NodeSelectorOperator::In,
                ["us-east-1a"],
            )]),
        ]));

        let mut spec = ResourceSpec::builder()
            .with_affinity(user_affinity.clone())
            .with_preemption_mode("allow")
            .build(&cluster)
            .expect("build");
        assert_eq!(spec.affinity(), Some(&user_affinity));
        assert_eq!(spec.tolerations().map(<[Toleration]>::len), Some(2));

        spec.apply_preemption_mode(PreemptionMode::Constrain, &cluster);
        assert_eq!(
            spec.affinity().map(Affinity::required_terms),
            Some(cluster.preemptible_affinity_terms().as_slice())
        );

        // Tainted nodes keep the pod off once the tolerations are gone.
        spec.apply_preemption_mode(PreemptionMode::Prevent, &cluster);
        assert_eq!(spec.tolerations(), None);
        assert_eq!(spec.affinity(), None);

        let untainted = PreemptibleNodes::new().with_node_label("node-type", "spot");
        spec.apply_preemption_mode(PreemptionMode::Prevent, &untainted);
        assert_eq!(
            spec.affinity().map(Affinity::required_terms),
            Some(untainted.preemptible_anti_affinity_terms().as_slice())
        );

        spec.apply_preemption_mode(PreemptionMode::Allow, &cluster);
        assert_eq!(spec.affinity(), None);
        assert_eq!(spec.tolerations().map(<[Toleration]>::len), Some(2));
        assert!(spec.node_selector().is_empty());
    }

    #[test]
    fn spec_survives_json_round_trip_of_input() {
        let document: ResourceSpecDocument = serde_json::from_value(serde_json::json!({
            "preemptionMode": "allow",
            "nodeSelector": {"node-type": "spot", "disk": "ssd"}
        }))
        .expect("parse");
        let spec = document
            .into_spec(&cluster(), &PriorityClassPolicy::default())
            .expect("spec");

        assert_eq!(
            spec.node_selector(),
            &NodeSelectorMap::from([("disk".to_string(), "ssd".to_string())])
        );
        let value = serde_json::to_value(&spec).expect("serialize");
        assert_eq!(value["preemptionMode"], "allow");
        assert_eq!(value["nodeSelector"]["disk"], "ssd");
    }
}
