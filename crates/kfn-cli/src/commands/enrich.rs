//! Enrich command implementation.
//!
//! Reads a resource spec document, applies the cluster's preemption policy
//! and prints the resulting spec.

use std::io::{Read, Write};

use kfn_scheduling::{PreemptibleNodeSource, PriorityClassPolicy, ResourceSpecDocument};
use tracing::debug;

use crate::error::{CliError, Result};
use crate::output::write_json;

/// Handler for the enrich command.
pub struct EnrichCommand<'a, S: ?Sized> {
    source: &'a S,
    policy: &'a PriorityClassPolicy,
}

impl<'a, S: PreemptibleNodeSource + ?Sized> EnrichCommand<'a, S> {
    /// Creates a new enrich command handler.
    #[must_use]
    pub const fn new(source: &'a S, policy: &'a PriorityClassPolicy) -> Self {
        Self { source, policy }
    }

    /// Executes the enrich command.
    ///
    /// # Errors
    ///
    /// Returns error if the input is not a resource spec, the mode is
    /// unknown, the priority class is not allowed, or output fails.
    pub fn execute<R: Read, W: Write>(
        &self,
        input: R,
        out: &mut W,
        mode: Option<&str>,
    ) -> Result<()> {
        let mut document: ResourceSpecDocument =
            serde_json::from_reader(input).map_err(CliError::Input)?;
        if let Some(mode) = mode {
            debug!(
                document_mode = ?document.preemption_mode,
                mode,
                "Overriding preemption mode of the document"
            );
            document.preemption_mode = Some(mode.to_string());
        }

        let spec = document.into_spec(self.source, self.policy)?;
        write_json(out, &spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kfn_scheduling::{PreemptibleNodes, TaintEffect, Toleration};

    fn cluster() -> PreemptibleNodes {
        PreemptibleNodes::new()
            .with_node_label("node-type", "spot")
            .with_toleration(Toleration::exists("preempt", TaintEffect::NoSchedule))
    }

    fn policy() -> PriorityClassPolicy {
        PriorityClassPolicy {
            default_name: Some("standard".into()),
            valid_names: vec!["standard".into(), "urgent".into()],
        }
    }

    fn run(input: &str, mode: Option<&str>) -> Result<serde_json::Value> {
        let cluster = cluster();
        let policy = policy();
        let mut out = Vec::new();
        EnrichCommand::new(&cluster, &policy).execute(input.as_bytes(), &mut out, mode)?;
        Ok(serde_json::from_slice(&out).expect("json output"))
    }

    #[test]
    fn enriches_document_mode() {
        let value = run(r#"{"preemptionMode": "allow"}"#, None).expect("enrich");
        assert_eq!(value["preemptionMode"], "allow");
        assert_eq!(value["tolerations"][0]["key"], "preempt");
        assert!(value.get("affinity").is_none());
    }

    #[test]
    fn mode_flag_overrides_document() {
        let value = run(r#"{"preemptionMode": "allow"}"#, Some("constrain")).expect("enrich");
        assert_eq!(value["preemptionMode"], "constrain");
        assert!(value.get("affinity").is_some());
    }

    #[test]
    fn invalid_json_is_input_error() {
        let err = run("{not json", None).expect_err("invalid input");
        assert!(matches!(err, CliError::Input(_)));
    }

    #[test]
    fn unknown_mode_is_scheduling_error() {
        let err = run("{}", Some("whenever")).expect_err("invalid mode");
        assert!(matches!(err, CliError::Scheduling(_)));
    }

    #[test]
    fn missing_priority_class_takes_default() {
        let value = run("{}", Some("allow")).expect("enrich");
        assert_eq!(value["priorityClassName"], "standard");

        let value = run(r#"{"priorityClassName": "urgent"}"#, None).expect("enrich");
        assert_eq!(value["priorityClassName"], "urgent");
    }

    #[test]
    fn unknown_priority_class_is_scheduling_error() {
        let err = run(r#"{"priorityClassName": "bogus"}"#, None).expect_err("not allowed");
        assert!(matches!(err, CliError::Scheduling(_)));
        assert!(err.to_string().contains("'bogus'"));
    }
}
