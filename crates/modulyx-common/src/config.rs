//! Pipeline configuration for one network-module query.
//!
//! Users can supply YAML, JSON or TOML; every field has a default so a
//! partial file is enough.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::confidence::DEFAULT_PRIOR;
use crate::entities::Channel;
use crate::error::{validate_fdr_threshold, validate_unit_interval, ModulyxError, Result};

/// Complete query configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upstream interaction service
    #[serde(default)]
    pub string: StringConfig,

    /// Evidence combination and edge filtering
    #[serde(default)]
    pub network: NetworkConfig,

    /// Markov clustering and module filtering
    #[serde(default)]
    pub clustering: ClusteringConfig,

    /// Functional enrichment
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

// ── Upstream service ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StringConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// NCBI taxon identifier
    #[serde(default = "default_species")]
    pub species: u32,

    #[serde(default = "default_caller_identity")]
    pub caller_identity: String,
}

fn default_api_url() -> String { "https://version-12-0.string-db.org/api".to_string() }
fn default_species() -> u32 { 7227 }
fn default_caller_identity() -> String { "modulyx".to_string() }

impl Default for StringConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            species: default_species(),
            caller_identity: default_caller_identity(),
        }
    }
}

// ── Network ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Minimum combined score for an edge to be kept
    #[serde(default = "default_confidence")]
    pub confidence: f64,

    /// Prior removed before and reinstated after channel combination
    #[serde(default = "default_prior")]
    pub prior: f64,

    /// Channels left out of the combination entirely
    #[serde(default)]
    pub excluded_channels: HashSet<Channel>,

    /// Multiplier on the upstream pre-filter score (< 1.0 fetches more edges
    /// than the final threshold keeps)
    #[serde(default = "default_prefetch_factor")]
    pub prefetch_factor: f64,
}

fn default_confidence() -> f64 { 0.4 }
fn default_prior() -> f64 { DEFAULT_PRIOR }
fn default_prefetch_factor() -> f64 { 1.0 }

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            confidence: default_confidence(),
            prior: default_prior(),
            excluded_channels: HashSet::new(),
            prefetch_factor: default_prefetch_factor(),
        }
    }
}

// ── Clustering ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    #[serde(default = "default_inflation")]
    pub inflation: f64,

    #[serde(default = "default_expansion")]
    pub expansion: u32,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Entries below this are zeroed after each inflation step
    #[serde(default = "default_pruning_threshold")]
    pub pruning_threshold: f64,

    /// Weight of the self-loop added to every node before iterating
    #[serde(default = "default_self_loop_weight")]
    pub self_loop_weight: f64,

    #[serde(default = "default_min_module_size")]
    pub min_module_size: usize,
}

fn default_inflation() -> f64 { 2.0 }
fn default_expansion() -> u32 { 2 }
fn default_max_iterations() -> usize { 100 }
fn default_pruning_threshold() -> f64 { 0.001 }
fn default_self_loop_weight() -> f64 { 1.0 }
fn default_min_module_size() -> usize { 2 }

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            inflation: default_inflation(),
            expansion: default_expansion(),
            max_iterations: default_max_iterations(),
            pruning_threshold: default_pruning_threshold(),
            self_loop_weight: default_self_loop_weight(),
            min_module_size: default_min_module_size(),
        }
    }
}

// ── Enrichment ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Local reference-annotation table; remote enrichment is used when absent
    pub annotation_file: Option<String>,

    /// Category allow-list applied when loading the annotation table
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    #[serde(default = "default_fdr")]
    pub fdr: f64,

    /// Rows kept per (module, source) in the final report
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_categories() -> Vec<String> {
    vec![
        "Biological Process (Gene Ontology)".to_string(),
        "Reactome Pathways".to_string(),
    ]
}
fn default_fdr() -> f64 { 0.05 }
fn default_top_k() -> usize { 2 }

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            annotation_file: None,
            categories: default_categories(),
            fdr: default_fdr(),
            top_k: default_top_k(),
        }
    }
}

// ── Helper Methods ─────────────────────────────────────────────────────────────

impl PipelineConfig {
    /// Load from a YAML, JSON or TOML file, chosen by extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let config: Self = match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .map_err(|e| ModulyxError::Config(format!("{}: {e}", path.display())))?,
            "json" => serde_json::from_str(&content)?,
            "toml" => toml::from_str(&content)
                .map_err(|e| ModulyxError::Config(format!("{}: {e}", path.display())))?,
            other => {
                return Err(ModulyxError::Config(format!(
                    "unsupported config format '{other}' for {}",
                    path.display()
                )))
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Save to YAML file
    pub fn to_yaml(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| ModulyxError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check every numeric parameter is in range.
    pub fn validate(&self) -> Result<()> {
        validate_unit_interval("confidence", self.network.confidence)?;
        validate_unit_interval("prior", self.network.prior)?;
        validate_fdr_threshold(self.enrichment.fdr)?;

        if self.network.prefetch_factor <= 0.0 || self.network.prefetch_factor > 1.0 {
            return Err(ModulyxError::Config(format!(
                "prefetch_factor must lie in (0, 1], got {}",
                self.network.prefetch_factor
            )));
        }
        if self.clustering.inflation <= 1.0 {
            return Err(ModulyxError::Config(format!(
                "inflation must be greater than 1, got {}",
                self.clustering.inflation
            )));
        }
        if self.clustering.expansion < 2 {
            return Err(ModulyxError::Config("expansion must be at least 2".to_string()));
        }
        if self.enrichment.categories.is_empty() {
            return Err(ModulyxError::Config("at least one enrichment category is required".to_string()));
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
