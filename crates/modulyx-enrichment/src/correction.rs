//! Multiple-testing correction.

/// Benjamini–Hochberg step-up adjusted p-values, returned in input order.
///
/// q_(i) = min_{j >= i} p_(j) · m / j over ascending p-values, capped at 1.
/// Needs the whole batch; there is no incremental form.
pub fn benjamini_hochberg(pvalues: &[f64]) -> Vec<f64> {
    let m = pvalues.len();
    if m == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| pvalues[a].total_cmp(&pvalues[b]));

    let mut adjusted = vec![0.0; m];
    let mut running_min = 1.0_f64;
    for (rank, &idx) in order.iter().enumerate().rev() {
        let q = pvalues[idx] * m as f64 / (rank + 1) as f64;
        running_min = running_min.min(q);
        adjusted[idx] = running_min;
    }
    adjusted
}
