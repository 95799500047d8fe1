//! Wire models for the STRING API and their conversion into core entities.

use std::collections::{BTreeMap, HashSet};

use modulyx_common::entities::{Channel, EnrichmentResult, EvidenceRecord, PipelineWarning};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One row of the `json/network` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkEntry {
    #[serde(rename = "stringId_A")]
    pub string_id_a: String,
    #[serde(rename = "stringId_B")]
    pub string_id_b: String,
    #[serde(rename = "preferredName_A", default)]
    pub preferred_name_a: Option<String>,
    #[serde(rename = "preferredName_B", default)]
    pub preferred_name_b: Option<String>,
    /// Upstream combined score; recomputed locally
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub nscore: Option<f64>,
    #[serde(default)]
    pub fscore: Option<f64>,
    #[serde(default)]
    pub pscore: Option<f64>,
    #[serde(default)]
    pub ascore: Option<f64>,
    #[serde(default)]
    pub escore: Option<f64>,
    #[serde(default)]
    pub dscore: Option<f64>,
    #[serde(default)]
    pub tscore: Option<f64>,
}

impl NetworkEntry {
    fn channel_score(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Neighborhood => self.nscore,
            Channel::Fusion       => self.fscore,
            Channel::Phylogenetic => self.pscore,
            Channel::Coexpression => self.ascore,
            Channel::Experimental => self.escore,
            Channel::Database     => self.dscore,
            Channel::Textmining   => self.tscore,
        }
    }
}

impl From<NetworkEntry> for EvidenceRecord {
    fn from(entry: NetworkEntry) -> Self {
        let scores = Channel::ALL
            .iter()
            .filter_map(|&c| entry.channel_score(c).map(|s| (c, s)))
            .collect();
        EvidenceRecord {
            protein_a: entry.string_id_a,
            protein_b: entry.string_id_b,
            preferred_name_a: entry.preferred_name_a,
            preferred_name_b: entry.preferred_name_b,
            scores,
        }
    }
}

/// One row of the `json/enrichment` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEnrichmentRow {
    pub category: String,
    pub term: String,
    #[serde(default)]
    pub description: Option<String>,
    pub number_of_genes: usize,
    pub number_of_genes_in_background: usize,
    #[serde(rename = "inputGenes", default)]
    pub input_genes: Vec<String>,
    pub p_value: f64,
    pub fdr: f64,
}

impl RemoteEnrichmentRow {
    pub fn into_result(self, study_size: usize) -> EnrichmentResult {
        EnrichmentResult {
            category: self.category,
            term_id: self.term,
            description: self.description,
            p_value: self.p_value,
            fdr: self.fdr,
            overlap_count: self.number_of_genes,
            term_size: self.number_of_genes_in_background,
            study_size,
            input_genes: self.input_genes,
        }
    }
}

/// Resolved query genes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentifierMapping {
    /// (input identifier, reference identifier) in response order.
    pub pairs: Vec<(String, String)>,
    /// Distinct reference identifiers, first-seen order.
    pub identifiers: Vec<String>,
    pub warnings: Vec<PipelineWarning>,
}

impl IdentifierMapping {
    /// Parse a `tsv-no-header/get_string_ids` body. Lines with fewer than
    /// three columns are skipped; column 0 is the query, column 2 the id.
    pub fn parse_tsv(body: &str) -> Self {
        let pairs: Vec<(String, String)> = body
            .trim()
            .lines()
            .filter_map(|line| {
                let cols: Vec<&str> = line.split('\t').collect();
                (cols.len() >= 3).then(|| (cols[0].to_string(), cols[2].to_string()))
            })
            .collect();
        Self::from_pairs(pairs)
    }

    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut seen = HashSet::new();
        let identifiers: Vec<String> = pairs
            .iter()
            .filter(|(_, id)| seen.insert(id.clone()))
            .map(|(_, id)| id.clone())
            .collect();

        let mut per_input: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for (input, id) in &pairs {
            per_input.entry(input.as_str()).or_default().push(id.clone());
        }
        let warnings: Vec<PipelineWarning> = per_input
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(input, identifiers)| PipelineWarning::AmbiguousIdentifier {
                input: input.to_string(),
                identifiers,
            })
            .collect();

        if identifiers.len() < pairs.len() {
            warn!(
                "{} identifiers for {} resolved rows; some genes share or split identifiers",
                identifiers.len(),
                pairs.len()
            );
        }

        Self { pairs, identifiers, warnings }
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}
