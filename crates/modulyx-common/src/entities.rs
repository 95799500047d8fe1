//! Core entity types shared by the network, enrichment and upstream crates.
//! These are plain in-memory values; nothing here is persisted.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModulyxError;

// ---------------------------------------------------------------------------
// Evidence channels
// ---------------------------------------------------------------------------

/// One independent evidence source for a protein-pair interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Neighborhood,
    Fusion,
    Phylogenetic,
    Coexpression,
    Experimental,
    Database,
    Textmining,
}

impl Channel {
    /// Every channel, in the order sub-scores are combined.
    pub const ALL: [Channel; 7] = [
        Channel::Neighborhood,
        Channel::Fusion,
        Channel::Phylogenetic,
        Channel::Coexpression,
        Channel::Experimental,
        Channel::Database,
        Channel::Textmining,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Neighborhood => "neighborhood",
            Channel::Fusion       => "fusion",
            Channel::Phylogenetic => "phylogenetic",
            Channel::Coexpression => "coexpression",
            Channel::Experimental => "experimental",
            Channel::Database     => "database",
            Channel::Textmining   => "textmining",
        }
    }

    /// Key used for this channel's sub-score in the interaction feed.
    pub fn wire_key(&self) -> &'static str {
        match self {
            Channel::Neighborhood => "nscore",
            Channel::Fusion       => "fscore",
            Channel::Phylogenetic => "pscore",
            Channel::Coexpression => "ascore",
            Channel::Experimental => "escore",
            Channel::Database     => "dscore",
            Channel::Textmining   => "tscore",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = ModulyxError;

    /// Accepts either the human name ("coexpression") or the wire key ("ascore").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Channel::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == needle || c.wire_key() == needle)
            .ok_or_else(|| ModulyxError::Input(format!("unknown evidence channel: {s}")))
    }
}

// ---------------------------------------------------------------------------
// Interaction evidence and edges
// ---------------------------------------------------------------------------

/// Raw evidence for one protein pair. Missing channels count as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub protein_a: String,
    pub protein_b: String,
    #[serde(default)]
    pub preferred_name_a: Option<String>,
    #[serde(default)]
    pub preferred_name_b: Option<String>,
    #[serde(default)]
    pub scores: HashMap<Channel, f64>,
}

impl EvidenceRecord {
    pub fn new(protein_a: impl Into<String>, protein_b: impl Into<String>) -> Self {
        Self {
            protein_a: protein_a.into(),
            protein_b: protein_b.into(),
            ..Default::default()
        }
    }

    /// Builder-style channel score setter.
    pub fn with_score(mut self, channel: Channel, score: f64) -> Self {
        self.scores.insert(channel, score);
        self
    }

    pub fn score(&self, channel: Channel) -> f64 {
        self.scores.get(&channel).copied().unwrap_or(0.0)
    }

    /// Sub-scores of every channel not in `excluded`, in `Channel::ALL` order.
    pub fn retained_scores(&self, excluded: &HashSet<Channel>) -> Vec<f64> {
        Channel::ALL
            .iter()
            .filter(|c| !excluded.contains(c))
            .map(|&c| self.score(c))
            .collect()
    }

    /// Order-independent key for the protein pair.
    pub fn pair_key(&self) -> (String, String) {
        if self.protein_a <= self.protein_b {
            (self.protein_a.clone(), self.protein_b.clone())
        } else {
            (self.protein_b.clone(), self.protein_a.clone())
        }
    }
}

/// An interaction retained after evidence combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub protein_a: String,
    pub protein_b: String,
    pub combined_score: f64,
}

// ---------------------------------------------------------------------------
// Modules
// ---------------------------------------------------------------------------

/// Canonical node → module assignment, plus the inverse view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleAssignment {
    /// module id → members, in graph node order.
    pub modules: BTreeMap<usize, Vec<String>>,
    /// member → module id.
    pub membership: BTreeMap<String, usize>,
}

impl ModuleAssignment {
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn module_of(&self, protein: &str) -> Option<usize> {
        self.membership.get(protein).copied()
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

/// Outcome of testing one term against one study set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub category: String,
    pub term_id: String,
    pub description: Option<String>,
    pub p_value: f64,
    pub fdr: f64,
    pub overlap_count: usize,
    pub term_size: usize,
    pub study_size: usize,
    /// Study genes after intersection with the background, sorted.
    pub input_genes: Vec<String>,
}

/// Ontology source buckets used when reporting per-module top terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReportSource {
    #[serde(rename = "GOBP")]
    Gobp,
    #[serde(rename = "KEGG")]
    Kegg,
    #[serde(rename = "RCTM")]
    Rctm,
}

impl ReportSource {
    /// Report order.
    pub const ALL: [ReportSource; 3] = [ReportSource::Gobp, ReportSource::Kegg, ReportSource::Rctm];

    /// Bucket a raw category label. Labels matching none of the patterns are not reported.
    pub fn classify(category: &str) -> Option<Self> {
        if category.contains("Process") {
            Some(ReportSource::Gobp)
        } else if category.contains("KEGG") {
            Some(ReportSource::Kegg)
        } else if category.contains("RCTM") || category.contains("Reactome") {
            Some(ReportSource::Rctm)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportSource::Gobp => "GOBP",
            ReportSource::Kegg => "KEGG",
            ReportSource::Rctm => "RCTM",
        }
    }
}

/// An enrichment result tagged with the module it was computed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleEnrichment {
    pub module_id: usize,
    pub module_size: usize,
    pub module_genes: Vec<String>,
    #[serde(flatten)]
    pub result: EnrichmentResult,
}

/// One row of the ranked per-module report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub module_id: usize,
    pub module_size: usize,
    pub source: ReportSource,
    pub module_genes: Vec<String>,
    #[serde(flatten)]
    pub result: EnrichmentResult,
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Non-fatal conditions surfaced to the caller alongside a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    /// No term survived the FDR threshold for this module (including an
    /// empty study set after background intersection).
    NoSignificantTerms { module_id: usize },
    /// More than one raw record for the same unordered pair.
    DuplicateInteraction { protein_a: String, protein_b: String, count: usize },
    /// One query gene resolved to several reference identifiers.
    AmbiguousIdentifier { input: String, identifiers: Vec<String> },
    /// The clustering primitive placed a node in more than one group.
    OverlappingModules { protein: String, kept_module: usize },
}
