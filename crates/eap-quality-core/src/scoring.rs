//! Scoring strategies that combine per-gate results into one score.

use crate::domain::{GateResult, ScoringConfig};

/// Pluggable policy for turning gate results into scores.
pub trait ScoringStrategy: Send + Sync {
    /// Score for a single result.
    fn calculate_score(&self, result: &GateResult, config: &ScoringConfig) -> u32;

    /// Combined score for all results, in 0–100.
    fn calculate_overall_score(&self, results: &[GateResult], config: &ScoringConfig) -> u32;
}

/// Weighted mean of gate scores, weights looked up by gate type.
///
/// Gates already compute their own score, so `calculate_score` passes it
/// through. The overall score is `round(Σ score·weight / Σ weight)`, or 0
/// when there are no results or the total weight is zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedScoringStrategy;

impl ScoringStrategy for WeightedScoringStrategy {
    fn calculate_score(&self, result: &GateResult, _config: &ScoringConfig) -> u32 {
        result.score.min(100)
    }

    fn calculate_overall_score(&self, results: &[GateResult], config: &ScoringConfig) -> u32 {
        let mut weighted_sum = 0i64;
        let mut total_weight = 0i64;

        for result in results {
            let weight = i64::from(config.weight_for(&result.gate_type));
            weighted_sum += i64::from(self.calculate_score(result, config)) * weight;
            total_weight += weight;
        }

        if total_weight == 0 {
            return 0;
        }
        let mean = weighted_sum as f64 / total_weight as f64;
        (mean.round() as i64).clamp(0, 100) as u32
    }
}
