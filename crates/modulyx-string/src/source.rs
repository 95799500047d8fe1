//! Interaction data sources.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use modulyx_common::entities::{EnrichmentResult, EvidenceRecord};
use modulyx_common::error::{ModulyxError, Result};

use crate::models::{IdentifierMapping, NetworkEntry};

/// Common interface for everything that supplies interaction evidence.
#[async_trait]
pub trait InteractionSource: Send + Sync {
    /// Map query gene names to reference identifiers.
    async fn resolve_identifiers(&self, genes: &[String]) -> Result<IdentifierMapping>;

    /// Raw evidence among `identifiers`, pre-filtered upstream at `required_score`
    /// (on the `[0, 1]` scale).
    async fn interactions(&self, identifiers: &[String], required_score: f64) -> Result<Vec<EvidenceRecord>>;

    /// Enrichment computed by the remote service, kept where `fdr <= fdr_threshold`.
    async fn enrichment(&self, identifiers: &[String], fdr_threshold: f64) -> Result<Vec<EnrichmentResult>>;
}

// ── In-memory source for tests and offline runs ──────────────────────────────

/// Serves a fixed list of records; identifiers resolve to themselves.
#[derive(Debug, Clone, Default)]
pub struct StaticInteractionSource {
    records: Vec<EvidenceRecord>,
}

impl StaticInteractionSource {
    pub fn new(records: Vec<EvidenceRecord>) -> Self {
        Self { records }
    }

    /// Load a saved `json/network` response.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<NetworkEntry> = serde_json::from_str(&content)?;
        Ok(Self::new(entries.into_iter().map(EvidenceRecord::from).collect()))
    }

    pub fn records(&self) -> &[EvidenceRecord] {
        &self.records
    }
}

#[async_trait]
impl InteractionSource for StaticInteractionSource {
    async fn resolve_identifiers(&self, genes: &[String]) -> Result<IdentifierMapping> {
        Ok(IdentifierMapping::from_pairs(
            genes.iter().map(|g| (g.clone(), g.clone())).collect(),
        ))
    }

    async fn interactions(&self, identifiers: &[String], _required_score: f64) -> Result<Vec<EvidenceRecord>> {
        let wanted: HashSet<&str> = identifiers.iter().map(String::as_str).collect();
        Ok(self
            .records
            .iter()
            .filter(|r| wanted.contains(r.protein_a.as_str()) && wanted.contains(r.protein_b.as_str()))
            .cloned()
            .collect())
    }

    async fn enrichment(&self, _identifiers: &[String], _fdr_threshold: f64) -> Result<Vec<EnrichmentResult>> {
        Err(ModulyxError::Upstream(
            "static interaction source has no enrichment service; configure an annotation file".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modulyx_common::entities::Channel;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_static_source_restricts_to_query() {
        let source = StaticInteractionSource::new(vec![
            EvidenceRecord::new("a", "b").with_score(Channel::Database, 0.9),
            EvidenceRecord::new("b", "z").with_score(Channel::Database, 0.9),
        ]);
        let recs = source.interactions(&ids(&["a", "b"]), 0.4).await.unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].protein_b, "b");
    }

    #[tokio::test]
    async fn test_static_source_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.json");
        std::fs::write(
            &path,
            r#"[{"stringId_A": "a", "stringId_B": "b", "escore": 0.8, "tscore": 0.4}]"#,
        )
        .unwrap();
        let source = StaticInteractionSource::from_json_file(&path).unwrap();
        assert_eq!(source.records().len(), 1);
        assert_eq!(source.records()[0].score(Channel::Experimental), 0.8);
    }

    #[tokio::test]
    async fn test_static_source_has_no_remote_enrichment() {
        let source = StaticInteractionSource::default();
        let err = source.enrichment(&ids(&["a"]), 0.05).await.unwrap_err();
        assert!(matches!(err, ModulyxError::Upstream(_)));
    }
}
