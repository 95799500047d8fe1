//! modulyx-agent — Query facade tying identifier resolution, network assembly,
//! module partitioning and functional enrichment together.

pub mod config;
pub mod pipeline;

pub use pipeline::{InteractionSet, ModuleAnalysis, QueryReport};
