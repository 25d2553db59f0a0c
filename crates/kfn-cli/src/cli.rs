//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// kfn - preemption-aware scheduling for function pods.
#[derive(Parser, Debug, Clone)]
#[command(name = "kfn")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Cluster configuration file (JSON). Falls back to `KFN_*` environment variables.
    #[arg(short, long, global = true, env = "KFN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Enrich a resource spec for its preemption mode.
    Enrich(EnrichArgs),

    /// Show the preemptible node descriptor of the cluster.
    Descriptor,
}

/// Arguments for the enrich command.
#[derive(Args, Debug, Clone, Default)]
pub struct EnrichArgs {
    /// Resource spec document to read, `-` for stdin.
    #[arg(short, long, default_value = "-")]
    pub input: PathBuf,

    /// Preemption mode overriding the one in the document.
    #[arg(short, long)]
    pub mode: Option<String>,
}

impl EnrichArgs {
    /// Returns true if the document is read from stdin.
    #[must_use]
    pub fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }
}
