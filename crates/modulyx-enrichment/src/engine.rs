//! Enrichment engine: per-term exact tests, batch-wide FDR, threshold and ranking.

use std::cmp::Ordering;
use std::collections::HashSet;

use modulyx_common::entities::EnrichmentResult;
use modulyx_common::error::{validate_fdr_threshold, Result};
use rayon::prelude::*;
use tracing::debug;

use crate::annotations::{AnnotationIndex, TermSet};
use crate::correction::benjamini_hochberg;
use crate::hypergeom::upper_tail_pvalue;

/// Anything that can test a study gene set for term over-representation.
pub trait StudySetTester: Send + Sync {
    fn enrich(&self, study: &HashSet<String>, fdr_threshold: f64) -> Result<Vec<EnrichmentResult>>;
}

impl StudySetTester for AnnotationIndex {
    fn enrich(&self, study: &HashSet<String>, fdr_threshold: f64) -> Result<Vec<EnrichmentResult>> {
        test_terms(self.terms(), study, self.background(), fdr_threshold)
    }
}

/// Test every term against `study` and return those with `fdr <= fdr_threshold`.
///
/// The study set is first intersected with `background`. P-values are computed
/// per term in parallel and corrected together across the whole batch.
/// Results are ordered by fdr, then p-value, then `(category, term_id)`.
pub fn test_terms(
    terms: &[TermSet],
    study: &HashSet<String>,
    background: &HashSet<String>,
    fdr_threshold: f64,
) -> Result<Vec<EnrichmentResult>> {
    validate_fdr_threshold(fdr_threshold)?;

    let study: HashSet<&String> = study.iter().filter(|g| background.contains(*g)).collect();
    if study.is_empty() {
        debug!("Study set has no genes in the background universe");
        return Ok(Vec::new());
    }
    let mut input_genes: Vec<String> = study.iter().map(|g| g.to_string()).collect();
    input_genes.sort();

    let population = background.len();
    let draws = study.len();

    let tested: Vec<(usize, usize, f64)> = terms
        .par_iter()
        .map(|term| {
            let overlap = term.genes.iter().filter(|g| study.contains(g)).count();
            let p = upper_tail_pvalue(population, term.genes.len(), draws, overlap)?;
            Ok((overlap, term.genes.len(), p))
        })
        .collect::<Result<_>>()?;

    // Join point: correction needs every p-value in the batch
    let pvalues: Vec<f64> = tested.iter().map(|(_, _, p)| *p).collect();
    let fdrs = benjamini_hochberg(&pvalues);

    let mut results: Vec<EnrichmentResult> = terms
        .iter()
        .zip(tested)
        .zip(fdrs)
        .filter(|(_, fdr)| *fdr <= fdr_threshold)
        .map(|((term, (overlap, size, p)), fdr)| EnrichmentResult {
            category: term.key.category.clone(),
            term_id: term.key.term_id.clone(),
            description: term.description.clone(),
            p_value: p,
            fdr,
            overlap_count: overlap,
            term_size: size,
            study_size: draws,
            input_genes: input_genes.clone(),
        })
        .collect();

    results.sort_by(rank_order);
    debug!(
        tested = terms.len(),
        significant = results.len(),
        study_size = draws,
        "Enrichment batch complete"
    );
    Ok(results)
}

fn rank_order(a: &EnrichmentResult, b: &EnrichmentResult) -> Ordering {
    a.fdr
        .total_cmp(&b.fdr)
        .then_with(|| a.p_value.total_cmp(&b.p_value))
        .then_with(|| a.category.cmp(&b.category))
        .then_with(|| a.term_id.cmp(&b.term_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::TermKey;

    fn genes(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn term(cat: &str, id: &str, members: &[&str]) -> TermSet {
        TermSet {
            key: TermKey { category: cat.into(), term_id: id.into() },
            description: Some(format!("{id} description")),
            genes: genes(members),
        }
    }

    fn background() -> HashSet<String> {
        (1..=20).map(|i| format!("g{i}")).collect()
    }

    #[test]
    fn test_reference_scenario() {
        let terms = vec![term("KEGG", "T", &["g1", "g2", "g3", "g4", "g5"])];
        let study = genes(&["g1", "g2", "g6_missing"]);
        let res = test_terms(&terms, &study, &background(), 1.0).unwrap();
        assert_eq!(res.len(), 1);
        let r = &res[0];
        assert_eq!((r.overlap_count, r.term_size, r.study_size), (2, 5, 2));
        assert!((r.p_value - 10.0 / 190.0).abs() < 1e-10);
        assert_eq!(r.input_genes, vec!["g1", "g2"]);
    }

    #[test]
    fn test_zero_overlap_term_has_unit_pvalue() {
        let terms = vec![
            term("KEGG", "A", &["g1", "g2"]),
            term("KEGG", "B", &["g10", "g11"]),
        ];
        let res = test_terms(&terms, &genes(&["g1", "g2"]), &background(), 1.0).unwrap();
        let b = res.iter().find(|r| r.term_id == "B").unwrap();
        assert_eq!(b.p_value, 1.0);
        assert_eq!(b.overlap_count, 0);
    }

    #[test]
    fn test_empty_study_after_intersection() {
        let terms = vec![term("KEGG", "A", &["g1", "g2"])];
        let res = test_terms(&terms, &genes(&["x1", "x2"]), &background(), 1.0).unwrap();
        assert!(res.is_empty());
    }

    #[test]
    fn test_sorted_by_fdr_then_pvalue() {
        let terms = vec![
            term("KEGG", "weak", &["g1", "g7", "g8", "g9", "g10", "g11"]),
            term("KEGG", "strong", &["g1", "g2", "g3"]),
            term("Reactome Pathways", "mid", &["g1", "g2", "g12", "g13"]),
        ];
        let res = test_terms(&terms, &genes(&["g1", "g2", "g3"]), &background(), 1.0).unwrap();
        assert_eq!(res[0].term_id, "strong");
        for w in res.windows(2) {
            assert!(w[0].fdr <= w[1].fdr);
        }
    }

    #[test]
    fn test_accepted_set_monotone_in_threshold() {
        let terms = vec![
            term("KEGG", "a", &["g1", "g2", "g3"]),
            term("KEGG", "b", &["g1", "g2", "g9", "g10"]),
            term("KEGG", "c", &["g1", "g11", "g12", "g13", "g14"]),
            term("KEGG", "d", &["g15", "g16"]),
        ];
        let study = genes(&["g1", "g2", "g3"]);
        let mut previous: HashSet<String> = HashSet::new();
        for alpha in [0.001, 0.01, 0.05, 0.2, 0.5, 1.0] {
            let accepted: HashSet<String> = test_terms(&terms, &study, &background(), alpha)
                .unwrap()
                .into_iter()
                .map(|r| r.term_id)
                .collect();
            assert!(previous.is_subset(&accepted), "not monotone at {alpha}");
            previous = accepted;
        }
        assert_eq!(previous.len(), 4);
    }

    #[test]
    fn test_index_implements_tester() {
        let index = AnnotationIndex::from_rows(
            vec![
                ("g1".to_string(), "KEGG".to_string(), "k1".to_string(), None),
                ("g2".to_string(), "KEGG".to_string(), "k1".to_string(), None),
                ("g3".to_string(), "KEGG".to_string(), "k2".to_string(), None),
            ],
            &["KEGG"],
        );
        let res = index.enrich(&genes(&["g1", "g2"]), 1.0).unwrap();
        assert_eq!(res[0].term_id, "k1");
    }

    #[test]
    fn test_correction_pools_all_categories() {
        let study = genes(&["g1", "g2", "g3"]);
        let mut terms = vec![
            term("KEGG", "k1", &["g1", "g2", "g3"]),
            term("Reactome Pathways", "r1", &["g1", "g2", "g3"]),
            term("KEGG", "k0", &["g10", "g11"]),
        ];
        let fdr_of = |res: &[EnrichmentResult], id: &str| {
            res.iter().find(|r| r.term_id == id).map(|r| r.fdr).unwrap()
        };

        // m = 3: p(k1) = p(r1) = 1/C(20,3) at ranks 1 and 2
        let res = test_terms(&terms, &study, &background(), 1.0).unwrap();
        assert!((fdr_of(&res, "k1") - (1.0 / 1140.0) * 3.0 / 2.0).abs() < 1e-10);

        // A category outside every report bucket still enlarges m to 4
        terms.push(term("Molecular Function (Gene Ontology)", "mf1", &["g1", "g4"]));
        let res = test_terms(&terms, &study, &background(), 1.0).unwrap();
        assert!((fdr_of(&res, "k1") - (1.0 / 1140.0) * 4.0 / 2.0).abs() < 1e-10);
        assert!((fdr_of(&res, "r1") - (1.0 / 1140.0) * 4.0 / 2.0).abs() < 1e-10);
        // p(mf1) = 1 - C(18,3)/C(20,3) = 324/1140, rank 3 of 4
        assert!((fdr_of(&res, "mf1") - (324.0 / 1140.0) * 4.0 / 3.0).abs() < 1e-10);
        assert_eq!(fdr_of(&res, "k0"), 1.0);

        let order: Vec<&str> = res.iter().map(|r| r.term_id.as_str()).collect();
        assert_eq!(order, vec!["k1", "r1", "mf1", "k0"]);
    }

    #[test]
    fn test_ties_broken_by_category_then_term_id() {
        let terms = vec![
            term("Reactome Pathways", "a", &["g1", "g2"]),
            term("KEGG", "b", &["g1", "g2"]),
            term("KEGG", "a", &["g1", "g2"]),
        ];
        let res = test_terms(&terms, &genes(&["g1", "g2"]), &background(), 1.0).unwrap();
        assert!(res.windows(2).all(|w| w[0].fdr == w[1].fdr && w[0].p_value == w[1].p_value));
        let keys: Vec<(&str, &str)> = res
            .iter()
            .map(|r| (r.category.as_str(), r.term_id.as_str()))
            .collect();
        assert_eq!(keys, vec![("KEGG", "a"), ("KEGG", "b"), ("Reactome Pathways", "a")]);
    }

    #[test]
    fn test_rank_order_fdr_then_pvalue_then_key() {
        let row = |cat: &str, id: &str, p: f64, fdr: f64| EnrichmentResult {
            category: cat.into(),
            term_id: id.into(),
            description: None,
            p_value: p,
            fdr,
            overlap_count: 1,
            term_size: 1,
            study_size: 1,
            input_genes: vec![],
        };
        let mut rows = vec![
            row("KEGG", "late", 0.02, 0.04),
            row("KEGG", "weaker", 0.02, 0.03),
            row("Reactome Pathways", "r", 0.01, 0.03),
            row("KEGG", "stronger", 0.01, 0.03),
            row("KEGG", "first", 0.03, 0.01),
        ];
        rows.sort_by(rank_order);
        let ids: Vec<&str> = rows.iter().map(|r| r.term_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "stronger", "r", "weaker", "late"]);
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(test_terms(&[], &genes(&["g1"]), &background(), 0.0).is_err());
    }
}
