//! modulyx-common — Shared types, errors, and scoring primitives used across all Modulyx crates.

pub mod error;
pub mod entities;
pub mod confidence;
pub mod config;
pub mod sandbox;

// Re-export commonly used types
pub use config::{PipelineConfig, StringConfig, NetworkConfig, ClusteringConfig, EnrichmentConfig};
pub use entities::{Channel, Edge, EnrichmentResult, EvidenceRecord, ModuleAssignment, PipelineWarning, ReportRow};
pub use error::{ModulyxError, Result};
