//! STRING API client.
//!
//! Endpoints used (all POST, form-encoded):
//!   tsv-no-header/get_string_ids: gene name → STRING identifier
//!   json/network: per-channel interaction evidence
//!   json/enrichment: remote functional enrichment

use async_trait::async_trait;
use modulyx_common::config::StringConfig;
use modulyx_common::entities::{EnrichmentResult, EvidenceRecord};
use modulyx_common::error::{ModulyxError, Result};
use modulyx_common::sandbox::SandboxClient as Client;
use tracing::{debug, info, instrument};

use crate::models::{IdentifierMapping, NetworkEntry, RemoteEnrichmentRow};
use crate::source::InteractionSource;

/// Identifier separator expected by the API.
const ID_SEPARATOR: &str = "\r";

pub struct StringClient {
    client: Client,
    api_url: String,
    species: u32,
    caller_identity: String,
}

impl StringClient {
    pub fn new(cfg: &StringConfig) -> Result<Self> {
        Ok(Self {
            client: Client::new()?,
            api_url: cfg.api_url.trim_end_matches('/').to_string(),
            species: cfg.species,
            caller_identity: cfg.caller_identity.clone(),
        })
    }

    fn endpoint(&self, output_format: &str, method: &str) -> String {
        format!("{}/{}/{}", self.api_url, output_format, method)
    }

    async fn post_form(&self, url: &str, params: &[(&str, String)]) -> Result<String> {
        let resp = self.client.post(url)?.form(params).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ModulyxError::Upstream(format!(
                "{url} returned HTTP {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }
        Ok(body)
    }
}

/// Decode a JSON array body, turning decoding failures into upstream errors.
fn decode_rows<T: serde::de::DeserializeOwned>(method: &str, body: &str) -> Result<Vec<T>> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ModulyxError::Upstream(format!("{method}: malformed JSON: {e}")))?;
    if !value.is_array() {
        return Err(ModulyxError::Upstream(format!("{method}: expected a JSON array, got {value}")));
    }
    serde_json::from_value(value)
        .map_err(|e| ModulyxError::Upstream(format!("{method}: unexpected row shape: {e}")))
}

/// Parse a `json/network` body into evidence records.
pub fn parse_network(body: &str) -> Result<Vec<EvidenceRecord>> {
    let entries: Vec<NetworkEntry> = decode_rows("network", body)?;
    Ok(entries.into_iter().map(EvidenceRecord::from).collect())
}

/// Parse a `json/enrichment` body, keeping rows with `fdr <= fdr_threshold`.
pub fn parse_enrichment(body: &str, study_size: usize, fdr_threshold: f64) -> Result<Vec<EnrichmentResult>> {
    let rows: Vec<RemoteEnrichmentRow> = decode_rows("enrichment", body)?;
    let mut results: Vec<EnrichmentResult> = rows
        .into_iter()
        .filter(|r| r.fdr <= fdr_threshold)
        .map(|r| r.into_result(study_size))
        .collect();
    results.sort_by(|a, b| a.fdr.total_cmp(&b.fdr));
    Ok(results)
}

#[async_trait]
impl InteractionSource for StringClient {
    #[instrument(skip(self, genes), fields(n = genes.len()))]
    async fn resolve_identifiers(&self, genes: &[String]) -> Result<IdentifierMapping> {
        if genes.is_empty() {
            return Err(ModulyxError::Input("no genes supplied".to_string()));
        }
        let params = [
            ("identifiers", genes.join(ID_SEPARATOR)),
            ("species", self.species.to_string()),
            ("echo_query", "1".to_string()),
            ("caller_identity", self.caller_identity.clone()),
        ];
        let body = self
            .post_form(&self.endpoint("tsv-no-header", "get_string_ids"), &params)
            .await?;

        let mapping = IdentifierMapping::parse_tsv(&body);
        if mapping.is_empty() {
            return Err(ModulyxError::Input(
                "No STRING identifiers found for the provided genes".to_string(),
            ));
        }
        info!(
            "Found {} STRING identifiers ({} unique) for {} genes",
            mapping.pairs.len(),
            mapping.identifiers.len(),
            genes.len()
        );
        Ok(mapping)
    }

    #[instrument(skip(self, identifiers), fields(n = identifiers.len()))]
    async fn interactions(&self, identifiers: &[String], required_score: f64) -> Result<Vec<EvidenceRecord>> {
        let params = [
            ("identifiers", identifiers.join(ID_SEPARATOR)),
            ("species", self.species.to_string()),
            ("required_score", format!("{:.0}", required_score * 1000.0)),
            ("caller_identity", self.caller_identity.clone()),
        ];
        let body = self.post_form(&self.endpoint("json", "network"), &params).await?;
        let records = parse_network(&body)?;
        debug!(records = records.len(), "STRING network returned records");
        Ok(records)
    }

    #[instrument(skip(self, identifiers), fields(n = identifiers.len()))]
    async fn enrichment(&self, identifiers: &[String], fdr_threshold: f64) -> Result<Vec<EnrichmentResult>> {
        let params = [
            ("identifiers", identifiers.join(ID_SEPARATOR)),
            ("species", self.species.to_string()),
            ("caller_identity", self.caller_identity.clone()),
        ];
        let body = self.post_form(&self.endpoint("json", "enrichment"), &params).await?;
        parse_enrichment(&body, identifiers.len(), fdr_threshold)
    }
}
