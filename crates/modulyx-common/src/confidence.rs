//! Confidence scoring for interaction evidence.
//! Fuses independent channel sub-scores with the prior removed, then adds it back.

/// Baseline probability that a random protein pair interacts.
pub const DEFAULT_PRIOR: f64 = 0.041;

/// Remove the prior from a single sub-score.
/// Scores below the prior are clamped to it, so the result lies in [0, 1).
pub fn compute_prior_away(score: f64, prior: f64) -> f64 {
    let score = score.max(prior);
    (score - prior) / (1.0 - prior)
}

/// Aggregate confidence from multiple independent evidence sources
/// using the noisy-OR model: p = 1 - Π(1 - p_i)
pub fn aggregate_confidence(confidences: &[f64]) -> f64 {
    if confidences.is_empty() {
        return 0.0;
    }
    let product: f64 = confidences.iter().map(|&p| 1.0 - p).product();
    1.0 - product
}

/// Combine channel sub-scores into one confidence value.
///
/// Each sub-score has the prior removed, the corrected scores are combined by
/// noisy-OR, and the prior is reinstated. No sub-scores yields `prior` exactly.
/// Callers must ensure `prior ∈ [0, 1)`.
pub fn combine_scores(subscores: &[f64], prior: f64) -> f64 {
    let corrected: Vec<f64> = subscores
        .iter()
        .map(|&s| compute_prior_away(s, prior))
        .collect();

    let combined_no_prior = aggregate_confidence(&corrected);

    combined_no_prior * (1.0 - prior) + prior
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_noisy_or() {
        // Two independent pieces of evidence at 0.7 each
        // Expected: 1 - (0.3 * 0.3) = 0.91
        let agg = aggregate_confidence(&[0.7, 0.7]);
        assert!((agg - 0.91).abs() < 1e-6);
    }

    #[test]
    fn test_empty_channels_yield_prior() {
        for prior in [0.0, 0.041, 0.5, 0.99] {
            assert_eq!(combine_scores(&[], prior), prior);
        }
    }

    #[test]
    fn test_channel_at_prior_adds_nothing() {
        assert_eq!(combine_scores(&[DEFAULT_PRIOR], DEFAULT_PRIOR), DEFAULT_PRIOR);
    }

    #[test]
    fn test_below_prior_is_clamped() {
        assert_eq!(compute_prior_away(0.0, DEFAULT_PRIOR), 0.0);
        assert_eq!(combine_scores(&[0.0, 0.01], DEFAULT_PRIOR), DEFAULT_PRIOR);
    }

    #[test]
    fn test_zero_channel_contributes_nothing() {
        let expected = compute_prior_away(0.9, DEFAULT_PRIOR) * (1.0 - DEFAULT_PRIOR) + DEFAULT_PRIOR;
        let got = combine_scores(&[0.9, 0.0], DEFAULT_PRIOR);
        assert!((got - expected).abs() < 1e-12);
        // A single channel round-trips through prior removal.
        assert!((got - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_monotone_in_single_score() {
        let mut last = combine_scores(&[DEFAULT_PRIOR], DEFAULT_PRIOR);
        for i in 1..=100 {
            let s = DEFAULT_PRIOR + (1.0 - DEFAULT_PRIOR) * i as f64 / 100.0;
            let c = combine_scores(&[s], DEFAULT_PRIOR);
            assert!(c >= last, "not monotone at s={s}");
            last = c;
        }
    }

    #[test]
    fn test_two_channels_exceed_either() {
        let c = combine_scores(&[0.6, 0.5], DEFAULT_PRIOR);
        assert!(c > 0.6 && c <= 1.0);
    }
}
