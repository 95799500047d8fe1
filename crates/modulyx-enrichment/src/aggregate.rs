//! Per-module enrichment and top-K reporting per ontology source.

use std::collections::{BTreeMap, HashSet};

use modulyx_common::entities::{ModuleEnrichment, PipelineWarning, ReportRow, ReportSource};
use modulyx_common::error::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::StudySetTester;

/// Significant terms of every module, plus the modules that produced none.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleEnrichmentOutcome {
    pub rows: Vec<ModuleEnrichment>,
    pub warnings: Vec<PipelineWarning>,
}

/// Final per-module ranked report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateReport {
    pub rows: Vec<ReportRow>,
    pub warnings: Vec<PipelineWarning>,
}

/// Run enrichment once per module with at least `min_module_size` members.
///
/// Modules are tested independently in parallel and joined in module-id order;
/// each module's results keep the engine's fdr ordering.
pub fn enrich_modules(
    tester: &dyn StudySetTester,
    modules: &BTreeMap<usize, Vec<String>>,
    fdr_threshold: f64,
    min_module_size: usize,
) -> Result<ModuleEnrichmentOutcome> {
    let eligible: Vec<(&usize, &Vec<String>)> = modules
        .iter()
        .filter(|(_, genes)| genes.len() >= min_module_size)
        .collect();

    let per_module: Vec<(usize, Vec<ModuleEnrichment>)> = eligible
        .par_iter()
        .map(|&(&module_id, genes)| {
            let study: HashSet<String> = genes.iter().cloned().collect();
            let results = tester.enrich(&study, fdr_threshold)?;
            let rows = results
                .into_iter()
                .map(|result| ModuleEnrichment {
                    module_id,
                    module_size: genes.len(),
                    module_genes: genes.clone(),
                    result,
                })
                .collect();
            Ok((module_id, rows))
        })
        .collect::<Result<_>>()?;

    let mut outcome = ModuleEnrichmentOutcome::default();
    for (module_id, rows) in per_module {
        if rows.is_empty() {
            debug!(module_id, "No significant terms for module");
            outcome.warnings.push(PipelineWarning::NoSignificantTerms { module_id });
            continue;
        }
        outcome.rows.extend(rows);
    }

    info!(
        "Enriched {} of {} modules; {} significant rows",
        eligible.len(),
        modules.len(),
        outcome.rows.len()
    );
    Ok(outcome)
}

/// Keep up to `top_k` lowest-fdr rows per (module, source bucket).
///
/// Output is grouped by module id, then GOBP, KEGG, RCTM. Rows whose category
/// matches no bucket are dropped.
pub fn top_enrichment(rows: &[ModuleEnrichment], top_k: usize) -> Vec<ReportRow> {
    let mut by_module: BTreeMap<usize, Vec<&ModuleEnrichment>> = BTreeMap::new();
    for row in rows {
        by_module.entry(row.module_id).or_default().push(row);
    }

    let mut report = Vec::new();
    for (_, mut group) in by_module {
        group.sort_by(|a, b| a.result.fdr.total_cmp(&b.result.fdr));

        for source in ReportSource::ALL {
            let picked = group
                .iter()
                .filter(|r| ReportSource::classify(&r.result.category) == Some(source))
                .take(top_k)
                .map(|r| ReportRow {
                    module_id: r.module_id,
                    module_size: r.module_size,
                    source,
                    module_genes: r.module_genes.clone(),
                    result: r.result.clone(),
                });
            report.extend(picked);
        }
    }
    report
}

/// Enrich every eligible module and reduce to the top-K report.
pub fn aggregate(
    tester: &dyn StudySetTester,
    modules: &BTreeMap<usize, Vec<String>>,
    fdr_threshold: f64,
    min_module_size: usize,
    top_k: usize,
) -> Result<AggregateReport> {
    let outcome = enrich_modules(tester, modules, fdr_threshold, min_module_size)?;
    Ok(AggregateReport {
        rows: top_enrichment(&outcome.rows, top_k),
        warnings: outcome.warnings,
    })
}
