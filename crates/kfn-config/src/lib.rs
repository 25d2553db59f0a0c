//! Cluster configuration for kfn.
//!
//! Loads the preemptible node descriptor and the priority class policy from
//! the process environment (base64-encoded JSON, as injected by the platform
//! deployment) or from a plain JSON document.

#![forbid(unsafe_code)]

pub mod error;

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use kfn_scheduling::{
    NodeSelectorMap, PreemptibleNodeSource, PreemptibleNodes, PreemptionMode, PriorityClassPolicy,
    Toleration,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use error::{ConfigError, Result};

/// Base64 JSON object of labels identifying preemptible nodes.
pub const NODE_SELECTOR_VAR: &str = "KFN_PREEMPTIBLE_NODES_NODE_SELECTOR";
/// Base64 JSON array of tolerations for preemptible node taints.
pub const TOLERATIONS_VAR: &str = "KFN_PREEMPTIBLE_NODES_TOLERATIONS";
/// Preemption mode used when a function does not name one.
pub const DEFAULT_PREEMPTION_MODE_VAR: &str = "KFN_DEFAULT_PREEMPTION_MODE";
/// Comma separated priority class names functions may use.
pub const VALID_PRIORITY_CLASS_NAMES_VAR: &str = "KFN_VALID_PRIORITY_CLASS_NAMES";
/// Priority class used when a function does not name one.
pub const DEFAULT_PRIORITY_CLASS_NAME_VAR: &str = "KFN_DEFAULT_PRIORITY_CLASS_NAME";

/// Scheduling related configuration of one cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    /// Preemptible node descriptor.
    #[serde(default)]
    pub preemptible_nodes: PreemptibleNodes,
    /// Priority classes functions may use.
    #[serde(default)]
    pub priority_classes: PriorityClassPolicy,
}

impl ClusterConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let config = Self::from_lookup(|name| std::env::var(name).ok())?;
        debug!("Loaded cluster configuration from environment");
        Ok(config)
    }

    /// Loads configuration through `lookup`, which maps a variable name to its value.
    ///
    /// Missing or blank variables leave the matching setting unconfigured.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let node_selector: NodeSelectorMap = match get(NODE_SELECTOR_VAR) {
            Some(raw) => decode_json(NODE_SELECTOR_VAR, &raw)?,
            None => NodeSelectorMap::new(),
        };
        let tolerations: Vec<Toleration> = match get(TOLERATIONS_VAR) {
            Some(raw) => decode_json(TOLERATIONS_VAR, &raw)?,
            None => Vec::new(),
        };
        let default_preemption_mode = match get(DEFAULT_PREEMPTION_MODE_VAR) {
            Some(raw) => raw
                .parse::<PreemptionMode>()
                .map_err(|_| ConfigError::InvalidPreemptionMode { value: raw })?,
            None => PreemptionMode::default(),
        };

        let valid_names = get(VALID_PRIORITY_CLASS_NAMES_VAR)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let config = Self {
            preemptible_nodes: PreemptibleNodes {
                node_selector,
                tolerations,
                default_preemption_mode,
            },
            priority_classes: PriorityClassPolicy {
                default_name: get(DEFAULT_PRIORITY_CLASS_NAME_VAR),
                valid_names,
            },
        };
        debug!(
            configured = config.is_preemption_configured(),
            node_selector_labels = config.preemptible_nodes.node_selector.len(),
            tolerations = config.preemptible_nodes.tolerations.len(),
            default_preemption_mode = %default_preemption_mode,
            "Loaded cluster configuration"
        );
        Ok(config)
    }

    /// Parses configuration from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        parse_document("document", json)
    }

    /// Reads configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = parse_document(&path.display().to_string(), &json)?;
        debug!(path = %path.display(), "Loaded cluster configuration from file");
        Ok(config)
    }
}

impl PreemptibleNodeSource for ClusterConfig {
    fn preemptible_tolerations(&self) -> Vec<Toleration> {
        self.preemptible_nodes.preemptible_tolerations()
    }

    fn preemptible_node_selector(&self) -> NodeSelectorMap {
        self.preemptible_nodes.preemptible_node_selector()
    }

    fn default_preemption_mode(&self) -> PreemptionMode {
        self.preemptible_nodes.default_preemption_mode()
    }
}

fn parse_document(origin: &str, json: &str) -> Result<ClusterConfig> {
    serde_json::from_str(json).map_err(|source| ConfigError::InvalidJson {
        origin: origin.to_string(),
        source,
    })
}

fn decode_json<T: DeserializeOwned>(variable: &str, raw: &str) -> Result<T> {
    let bytes = STANDARD
        .decode(raw)
        .map_err(|source| ConfigError::InvalidBase64 {
            variable: variable.to_string(),
            source,
        })?;
    serde_json::from_slice(&bytes).map_err(|source| ConfigError::InvalidJson {
        origin: variable.to_string(),
        source,
    })
}
