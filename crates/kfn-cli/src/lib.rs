//! # kfn-cli
//!
//! Command-line interface for kfn scheduling.
//!
//! Provides commands for:
//! - Enriching a function resource spec for a preemption mode
//! - Inspecting the preemptible node descriptor of the cluster
//!
//! Cluster configuration comes from a JSON file given with `--config`, or
//! from the `KFN_*` environment variables otherwise.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

use std::path::Path;

use kfn_config::ClusterConfig;

pub use cli::{Cli, Commands, EnrichArgs};
pub use error::{CliError, Result};

/// Loads cluster configuration from `path`, or from the environment if no path is given.
///
/// # Errors
///
/// Returns an error if the file cannot be read or any value is malformed.
pub fn load_config(path: Option<&Path>) -> Result<ClusterConfig> {
    let config = match path {
        Some(path) => ClusterConfig::from_json_file(path)?,
        None => ClusterConfig::from_env()?,
    };
    Ok(config)
}
