use crate::{Factor, FactorBreakdown, FactorScores, FactorWeights, WEIGHT_BP_SCALE};

/// Weighted sum of the five sub-scores, rounded to an integer in 0..=100.
///
/// Weights are applied in basis points so the sum is exact integer arithmetic.
/// Exact halves round to the even integer (56.5 -> 56, 83.5 -> 84).
pub fn aggregate(weights: &FactorWeights, scores: &FactorScores) -> u32 {
    let total_bp: i64 = Factor::ALL
        .iter()
        .map(|f| i64::from(scores.score(*f)) * weights.basis_points(*f))
        .sum();
    round_half_even(total_bp, WEIGHT_BP_SCALE).clamp(0, 100) as u32
}

fn round_half_even(value: i64, scale: i64) -> i64 {
    let q = value.div_euclid(scale);
    let r = value.rem_euclid(scale);
    let half = scale / 2;
    if r > half || (r == half && q % 2 != 0) {
        q + 1
    } else {
        q
    }
}

/// Per-factor breakdown (score, weight, contribution) in aggregation order.
pub fn weighted_contributions(weights: &FactorWeights, scores: &FactorScores) -> Vec<FactorBreakdown> {
    Factor::ALL
        .iter()
        .map(|f| {
            let score = scores.score(*f);
            FactorBreakdown {
                factor: *f,
                score,
                status: scores.status(*f).to_string(),
                weight: weights.weight(*f),
                contribution: (i64::from(score) * weights.basis_points(*f)) as f64
                    / WEIGHT_BP_SCALE as f64,
            }
        })
        .collect()
}
