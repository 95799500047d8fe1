//! Network assembly: evidence combination, confidence filtering, graph construction.

use std::collections::{BTreeMap, HashSet};

use modulyx_common::confidence::combine_scores;
use modulyx_common::entities::{Channel, Edge, EvidenceRecord, PipelineWarning};
use modulyx_common::error::{validate_unit_interval, Result};
use tracing::{debug, info, warn};

use crate::graph::InteractionGraph;

/// Retained edges plus the graph built from them.
#[derive(Debug, Clone)]
pub struct AssembledNetwork {
    pub edges: Vec<Edge>,
    pub graph: InteractionGraph,
    pub warnings: Vec<PipelineWarning>,
}

/// Recompute each record's score from its retained channels and keep the
/// edges with `combined_score >= confidence`. Input order is preserved.
pub fn filter_interactions(
    records: &[EvidenceRecord],
    confidence: f64,
    excluded: &HashSet<Channel>,
    prior: f64,
) -> Result<Vec<Edge>> {
    validate_unit_interval("confidence", confidence)?;
    validate_unit_interval("prior", prior)?;

    let edges: Vec<Edge> = records
        .iter()
        .filter_map(|rec| {
            let combined = combine_scores(&rec.retained_scores(excluded), prior);
            (combined >= confidence).then(|| Edge {
                protein_a: rec.protein_a.clone(),
                protein_b: rec.protein_b.clone(),
                combined_score: combined,
            })
        })
        .collect();

    debug!(
        kept = edges.len(),
        total = records.len(),
        confidence,
        "Filtered interactions by recombined score"
    );
    Ok(edges)
}

/// Build the weighted undirected graph for a set of retained edges.
pub fn build_network(edges: &[Edge]) -> InteractionGraph {
    InteractionGraph::from_edges(edges)
}

/// Report unordered pairs that occur in more than one raw record.
pub fn find_duplicate_pairs(records: &[EvidenceRecord]) -> Vec<PipelineWarning> {
    let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();
    for rec in records {
        *counts.entry(rec.pair_key()).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|((a, b), count)| PipelineWarning::DuplicateInteraction {
            protein_a: a,
            protein_b: b,
            count,
        })
        .collect()
}

/// Combine, filter and build in one step. Duplicate pairs are reported, not removed.
pub fn assemble(
    records: &[EvidenceRecord],
    confidence: f64,
    excluded: &HashSet<Channel>,
    prior: f64,
) -> Result<AssembledNetwork> {
    let warnings = find_duplicate_pairs(records);
    for w in &warnings {
        if let PipelineWarning::DuplicateInteraction { protein_a, protein_b, count } = w {
            warn!("{count} interaction records for pair {protein_a} / {protein_b}; all are used");
        }
    }

    let edges = filter_interactions(records, confidence, excluded, prior)?;
    let graph = build_network(&edges);
    info!(
        "Assembled network: {} nodes, {} edges (threshold {confidence})",
        graph.node_count(),
        graph.edge_count()
    );

    Ok(AssembledNetwork { edges, graph, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use modulyx_common::confidence::DEFAULT_PRIOR;

    fn records() -> Vec<EvidenceRecord> {
        vec![
            EvidenceRecord::new("a", "b")
                .with_score(Channel::Experimental, 0.9)
                .with_score(Channel::Textmining, 0.5),
            EvidenceRecord::new("b", "c").with_score(Channel::Textmining, 0.8),
            EvidenceRecord::new("c", "d").with_score(Channel::Coexpression, 0.1),
        ]
    }

    #[test]
    fn test_threshold_filters_edges() {
        let edges = filter_interactions(&records(), 0.4, &HashSet::new(), DEFAULT_PRIOR).unwrap();
        let pairs: Vec<_> = edges.iter().map(|e| (e.protein_a.as_str(), e.protein_b.as_str())).collect();
        assert_eq!(pairs, vec![("a", "b"), ("b", "c")]);
        assert!(edges.iter().all(|e| e.combined_score >= 0.4));
    }

    #[test]
    fn test_excluding_channel_drops_dependent_edge() {
        let excluded: HashSet<Channel> = [Channel::Textmining].into_iter().collect();
        let edges = filter_interactions(&records(), 0.4, &excluded, DEFAULT_PRIOR).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].protein_a, "a");
        assert!((edges[0].combined_score - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_score_at_threshold_is_kept() {
        let recs = vec![EvidenceRecord::new("x", "y").with_score(Channel::Database, 0.5)];
        let combined = combine_scores(&recs[0].retained_scores(&HashSet::new()), DEFAULT_PRIOR);
        let edges = filter_interactions(&recs, combined, &HashSet::new(), DEFAULT_PRIOR).unwrap();
        assert_eq!(edges.len(), 1);
    }

    #[test]
    fn test_invalid_confidence_is_input_error() {
        assert!(filter_interactions(&records(), 1.0, &HashSet::new(), DEFAULT_PRIOR).is_err());
    }

    #[test]
    fn test_duplicates_reported_not_removed() {
        let mut recs = records();
        recs.push(EvidenceRecord::new("b", "a").with_score(Channel::Database, 0.9));
        let net = assemble(&recs, 0.4, &HashSet::new(), DEFAULT_PRIOR).unwrap();
        assert_eq!(net.edges.len(), 3);
        assert_eq!(net.graph.edge_count(), 2);
        assert_eq!(
            net.warnings,
            vec![PipelineWarning::DuplicateInteraction {
                protein_a: "a".into(),
                protein_b: "b".into(),
                count: 2,
            }]
        );
    }
}
