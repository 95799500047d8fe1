//! One-sided hypergeometric over-representation test.

use modulyx_common::error::{ModulyxError, Result};
use statrs::distribution::{DiscreteCDF, Hypergeometric};

/// `P(X >= observed)` for `X ~ Hypergeometric(population, successes, draws)`.
///
/// Zero overlap is never evidence of enrichment and returns exactly 1.0
/// without evaluating the distribution.
pub fn upper_tail_pvalue(population: usize, successes: usize, draws: usize, observed: usize) -> Result<f64> {
    if observed == 0 {
        return Ok(1.0);
    }
    let hyper = Hypergeometric::new(population as u64, successes as u64, draws as u64).map_err(|e| {
        ModulyxError::Input(format!(
            "invalid hypergeometric parameters N={population}, M={successes}, n={draws}: {e}"
        ))
    })?;
    // sf(k) is P(X > k); subtract 1 to include the observed count
    Ok(hyper.sf(observed as u64 - 1).clamp(0.0, 1.0))
}
