//! Combined model health score.

/// Weight of the accuracy score.
pub const ACCURACY_WEIGHT: f64 = 0.5;
/// Weight of the statistical parity score.
pub const PARITY_WEIGHT: f64 = 0.2;
/// Weight of the embedding association score.
pub const ASSOCIATION_WEIGHT: f64 = 0.3;

/// Blends the three evaluation scores into a percentage.
///
/// `accuracy` is a percentage; the two fairness scores are in `[0, 1]`
/// with 1 meaning no measured bias.
#[must_use]
pub fn overall_health(accuracy: f64, parity_score: f64, association_score: f64) -> f64 {
    (accuracy / 100.0 * ACCURACY_WEIGHT
        + parity_score * PARITY_WEIGHT
        + association_score * ASSOCIATION_WEIGHT)
        * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_scores_reach_one_hundred() {
        assert!((overall_health(100.0, 1.0, 1.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn weights_each_component() {
        assert!((overall_health(80.0, 0.5, 0.0) - 50.0).abs() < 1e-9);
        assert!((overall_health(0.0, 0.0, 1.0) - 30.0).abs() < 1e-9);
    }
}
