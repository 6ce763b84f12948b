//! Scoring configuration and verdict thresholds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::result::GateType;

/// Weight applied to a gate type that has no configured weight.
pub const DEFAULT_GATE_WEIGHT: i32 = 50;

/// Score deductions applied by gates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Penalties {
    /// Deducted once when the upstream build did not report SUCCESS.
    pub failure_penalty: i32,
    /// Deducted per CRITICAL issue.
    pub critical_issue_penalty: i32,
    /// Deducted per HIGH/MEDIUM issue, and once for any LOW observations.
    pub warning_penalty: i32,
}

impl Default for Penalties {
    fn default() -> Self {
        Self {
            failure_penalty: 50,
            critical_issue_penalty: 20,
            warning_penalty: 5,
        }
    }
}

/// Caller-supplied scoring policy, fixed for one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub base_score: i32,
    /// Percent weights per gate type; intended to sum to 100 across active gates.
    pub weights: BTreeMap<GateType, i32>,
    pub penalties: Penalties,
}

impl ScoringConfig {
    /// Weight for `gate_type`; unconfigured types weigh 50, negatives count as 0.
    pub fn weight_for(&self, gate_type: &GateType) -> i32 {
        self.weights
            .get(gate_type)
            .copied()
            .unwrap_or(DEFAULT_GATE_WEIGHT)
            .max(0)
    }

    pub fn with_weight(mut self, gate_type: GateType, weight: i32) -> Self {
        self.weights.insert(gate_type, weight);
        self
    }

    pub fn with_base_score(mut self, base_score: i32) -> Self {
        self.base_score = base_score;
        self
    }

    pub fn with_penalties(mut self, penalties: Penalties) -> Self {
        self.penalties = penalties;
        self
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let mut weights = BTreeMap::new();
        weights.insert(GateType::ExternalValidation, 60);
        weights.insert(GateType::InternalValidation, 40);
        Self {
            base_score: 100,
            weights,
            penalties: Penalties::default(),
        }
    }
}

/// Overall verdict thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub minimum_passing_score: u32,
    /// Total CRITICAL issues tolerated across all gates.
    pub critical_issue_threshold: usize,
    /// Total warnings above which an advisory recommendation is added.
    pub warning_issue_threshold: usize,
    /// Run-wide regression limit (%). Gates apply the limit in their own
    /// [`GateCriteria`](super::GateCriteria).
    pub performance_regression_threshold: f64,
    /// Wall-clock budget for the whole run, in minutes.
    pub execution_timeout_minutes: u32,
    /// Target percentage of passing gates.
    pub success_rate_threshold: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            minimum_passing_score: 80,
            critical_issue_threshold: 0,
            warning_issue_threshold: 10,
            performance_regression_threshold: 10.0,
            execution_timeout_minutes: 60,
            success_rate_threshold: 90.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment() {
        let config = ScoringConfig::default();
        assert_eq!(config.base_score, 100);
        assert_eq!(config.weight_for(&GateType::ExternalValidation), 60);
        assert_eq!(config.weight_for(&GateType::InternalValidation), 40);
        assert_eq!(config.penalties.failure_penalty, 50);
        assert_eq!(config.penalties.critical_issue_penalty, 20);
        assert_eq!(config.penalties.warning_penalty, 5);

        let thresholds = Thresholds::default();
        assert_eq!(thresholds.minimum_passing_score, 80);
        assert_eq!(thresholds.critical_issue_threshold, 0);
        assert_eq!(thresholds.warning_issue_threshold, 10);
        assert_eq!(thresholds.performance_regression_threshold, 10.0);
        assert_eq!(thresholds.execution_timeout_minutes, 60);
        assert_eq!(thresholds.success_rate_threshold, 90.0);
    }

    #[test]
    fn unknown_gate_type_gets_default_weight() {
        let config = ScoringConfig::default();
        let ty = GateType::Custom("security_scan".to_string());
        assert_eq!(config.weight_for(&ty), DEFAULT_GATE_WEIGHT);
    }

    #[test]
    fn negative_weight_counts_as_zero() {
        let config = ScoringConfig::default().with_weight(GateType::ExternalValidation, -30);
        assert_eq!(config.weight_for(&GateType::ExternalValidation), 0);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: ScoringConfig =
            serde_json::from_str(r#"{"penalties": {"warning_penalty": 2}}"#).expect("parse");
        assert_eq!(config.base_score, 100);
        assert_eq!(config.penalties.warning_penalty, 2);
        assert_eq!(config.penalties.failure_penalty, 50);
    }
}
