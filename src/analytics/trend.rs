//! Least-squares trend estimation.
//!
//! The single primitive behind every directional signal in the engine:
//! accuracy trends, (negated) response-time trends, mastery and confidence
//! trends all reduce to the slope of a value series against its index.

/// Ordinary least-squares slope of `values` against index 0..n-1.
///
/// Returns 0.0 for fewer than two points or a degenerate denominator.
/// Pure, O(n).
pub fn slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let n_f = n as f64;
    let sum_x: f64 = (0..n).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, y)| i as f64 * y).sum();
    let sum_xx: f64 = (0..n).map(|i| (i as f64).powi(2)).sum();

    let denominator = n_f * sum_xx - sum_x.powi(2);
    if denominator.abs() < 1e-10 {
        return 0.0;
    }
    (n_f * sum_xy - sum_x * sum_y) / denominator
}

/// Population variance, used to penalize inconsistent confidence.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}
