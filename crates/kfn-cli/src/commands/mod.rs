//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`enrich`] - Resource spec enrichment
//! - [`descriptor`] - Preemptible node descriptor inspection

pub mod descriptor;
pub mod enrich;

pub use descriptor::{DescriptorCommand, DescriptorReport};
pub use enrich::EnrichCommand;
