//! `ModuleAnalysis`: one query's lifetime, from gene names to the module report.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use modulyx_common::config::PipelineConfig;
use modulyx_common::entities::{
    Channel, Edge, EnrichmentResult, ModuleAssignment, ModuleEnrichment, PipelineWarning, ReportRow,
};
use modulyx_common::error::{validate_fdr_threshold, validate_unit_interval, ModulyxError, Result};
use modulyx_enrichment::{enrich_modules, load_cached, top_enrichment, AnnotationIndex, ModuleEnrichmentOutcome, StudySetTester};
use modulyx_network::{assemble, partition, InteractionGraph, MarkovClustering, Partition};
use modulyx_string::{IdentifierMapping, InteractionSource};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Edges retained at a confidence level, with degenerate-input warnings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionSet {
    pub edges: Vec<Edge>,
    pub warnings: Vec<PipelineWarning>,
}

/// Everything one end-to-end query produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryReport {
    pub identifiers: Vec<String>,
    pub edges: Vec<Edge>,
    pub modules: ModuleAssignment,
    pub enrichment: Vec<ReportRow>,
    pub warnings: Vec<PipelineWarning>,
}

pub struct ModuleAnalysis {
    config: PipelineConfig,
    source: Arc<dyn InteractionSource>,
    annotations: Option<Arc<AnnotationIndex>>,
    mapping: IdentifierMapping,
}

impl ModuleAnalysis {
    /// Resolve `genes` through `source` and load the annotation table if one
    /// is configured. Fails with an input error when nothing resolves.
    pub async fn new(
        config: PipelineConfig,
        source: Arc<dyn InteractionSource>,
        genes: &[String],
    ) -> Result<Self> {
        config.validate()?;
        if genes.is_empty() {
            return Err(ModulyxError::Input("no genes supplied".to_string()));
        }

        let mapping = source.resolve_identifiers(genes).await?;
        if mapping.is_empty() {
            return Err(ModulyxError::Input(
                "No identifiers found for the provided genes".to_string(),
            ));
        }

        let annotations = match &config.enrichment.annotation_file {
            Some(path) => Some(load_cached(path, &config.enrichment.categories)?),
            None => {
                info!("No annotation file configured; enrichment uses the remote service");
                None
            }
        };

        Ok(Self { config, source, annotations, mapping })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn identifiers(&self) -> &[String] {
        &self.mapping.identifiers
    }

    /// Fetch raw evidence for the query and keep pairs whose recombined score
    /// reaches `confidence` once `exclude` channels are dropped.
    pub async fn get_interactions(
        &self,
        confidence: f64,
        exclude: &HashSet<Channel>,
    ) -> Result<InteractionSet> {
        validate_unit_interval("confidence", confidence)?;

        let required = confidence * self.config.network.prefetch_factor;
        let records = self.source.interactions(&self.mapping.identifiers, required).await?;
        debug!(records = records.len(), required, "Fetched raw interaction evidence");

        let network = assemble(&records, confidence, exclude, self.config.network.prior)?;
        Ok(InteractionSet { edges: network.edges, warnings: network.warnings })
    }

    pub fn build_network(&self, edges: &[Edge]) -> InteractionGraph {
        modulyx_network::build_network(edges)
    }

    /// Markov clustering configured from the `clustering` section.
    pub fn mcl_clustering(&self, graph: &InteractionGraph, inflation: f64, min_size: usize) -> Partition {
        let clusterer = MarkovClustering::from_config(&self.config.clustering);
        partition(graph, &clusterer, inflation, min_size)
    }

    /// Enrichment of a single gene set, against the local table when loaded.
    /// An empty `genes` tests the query's own identifiers.
    pub async fn functional_enrichment(&self, genes: &[String], fdr: f64) -> Result<Vec<EnrichmentResult>> {
        validate_fdr_threshold(fdr)?;
        let genes = if genes.is_empty() { self.identifiers() } else { genes };
        match &self.annotations {
            Some(index) => {
                let study: HashSet<String> = genes.iter().cloned().collect();
                index.enrich(&study, fdr)
            }
            None => self.functional_enrichment_remote(genes, fdr).await,
        }
    }

    /// Enrichment computed by the upstream service.
    pub async fn functional_enrichment_remote(&self, genes: &[String], fdr: f64) -> Result<Vec<EnrichmentResult>> {
        validate_fdr_threshold(fdr)?;
        if genes.is_empty() {
            return Ok(Vec::new());
        }
        self.source.enrichment(genes, fdr).await
    }

    /// Enrichment of every module with at least `min_size` members.
    pub async fn mcl_functional_enrichment(
        &self,
        modules: &BTreeMap<usize, Vec<String>>,
        fdr: f64,
        min_size: usize,
    ) -> Result<ModuleEnrichmentOutcome> {
        validate_fdr_threshold(fdr)?;
        if let Some(index) = &self.annotations {
            return enrich_modules(index.as_ref(), modules, fdr, min_size);
        }

        let mut outcome = ModuleEnrichmentOutcome::default();
        for (&module_id, genes) in modules.iter().filter(|(_, g)| g.len() >= min_size) {
            let results = self.functional_enrichment_remote(genes, fdr).await?;
            if results.is_empty() {
                outcome.warnings.push(PipelineWarning::NoSignificantTerms { module_id });
                continue;
            }
            outcome.rows.extend(results.into_iter().map(|result| ModuleEnrichment {
                module_id,
                module_size: genes.len(),
                module_genes: genes.clone(),
                result,
            }));
        }
        Ok(outcome)
    }

    pub fn get_top_enrichment(&self, rows: &[ModuleEnrichment], top_k: usize) -> Vec<ReportRow> {
        top_enrichment(rows, top_k)
    }

    /// Run the whole data flow with the configured parameters.
    pub async fn run_query(&self) -> Result<QueryReport> {
        let network_cfg = &self.config.network;
        let clustering_cfg = &self.config.clustering;
        let enrichment_cfg = &self.config.enrichment;

        let mut warnings = self.mapping.warnings.clone();

        let interactions = self
            .get_interactions(network_cfg.confidence, &network_cfg.excluded_channels)
            .await?;
        warnings.extend(interactions.warnings);

        let graph = self.build_network(&interactions.edges);
        let partition = self.mcl_clustering(&graph, clustering_cfg.inflation, clustering_cfg.min_module_size);
        warnings.extend(partition.warnings);

        if partition.assignment.is_empty() {
            warn!("No modules of at least {} proteins", clustering_cfg.min_module_size);
        }

        let outcome = self
            .mcl_functional_enrichment(
                &partition.assignment.modules,
                enrichment_cfg.fdr,
                clustering_cfg.min_module_size,
            )
            .await?;
        warnings.extend(outcome.warnings);

        let enrichment = self.get_top_enrichment(&outcome.rows, enrichment_cfg.top_k);
        info!(
            "Query complete: {} edges, {} modules, {} report rows, {} warnings",
            interactions.edges.len(),
            partition.assignment.len(),
            enrichment.len(),
            warnings.len()
        );

        Ok(QueryReport {
            identifiers: self.mapping.identifiers.clone(),
            edges: interactions.edges,
            modules: partition.assignment,
            enrichment,
            warnings,
        })
    }
}
