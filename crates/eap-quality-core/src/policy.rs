//! Quality policy loading.
//!
//! A policy bundles the verdict thresholds, the scoring configuration and the
//! criteria of the two built-in gates. It is read from an optional TOML file
//! and then overridden by environment-style settings (`MIN_SCORE`,
//! `MAX_CRITICAL`, `BASE_SCORE`, `EXTERNAL_WEIGHT`, `INTERNAL_WEIGHT`).
//!
//! ```toml
//! [thresholds]
//! minimum_passing_score = 80
//!
//! [scoring.weights]
//! external_validation = 60
//! internal_validation = 40
//!
//! [scoring.penalties]
//! warning_penalty = 5
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{GateCriteria, GateType, QualityError, Result, ScoringConfig, Thresholds};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityPolicy {
    pub thresholds: Thresholds,
    pub scoring: ScoringConfig,
    pub external_criteria: GateCriteria,
    pub internal_criteria: GateCriteria,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            scoring: ScoringConfig::default(),
            external_criteria: GateCriteria::external(),
            internal_criteria: GateCriteria::internal(),
        }
    }
}

/// Explicit settings that win over the policy file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyOverrides {
    pub min_score: Option<u32>,
    pub max_critical: Option<usize>,
    pub base_score: Option<i32>,
    pub external_weight: Option<i32>,
    pub internal_weight: Option<i32>,
}

impl QualityPolicy {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn apply(mut self, overrides: &PolicyOverrides) -> Self {
        if let Some(min_score) = overrides.min_score {
            self.thresholds.minimum_passing_score = min_score;
        }
        if let Some(max_critical) = overrides.max_critical {
            self.thresholds.critical_issue_threshold = max_critical;
        }
        if let Some(base_score) = overrides.base_score {
            self.scoring.base_score = base_score;
        }
        if let Some(weight) = overrides.external_weight {
            self.scoring.weights.insert(GateType::ExternalValidation, weight);
        }
        if let Some(weight) = overrides.internal_weight {
            self.scoring.weights.insert(GateType::InternalValidation, weight);
        }
        self
    }

    /// Reject policies no evaluation could make sense of.
    ///
    /// The engine itself tolerates these (negative weights count as zero, a
    /// zero total weight scores 0); rejecting them here surfaces typos at load
    /// time instead of as a silently failing gate.
    pub fn validate(&self) -> Result<()> {
        if let Some((ty, w)) = self.scoring.weights.iter().find(|(_, w)| **w < 0) {
            return Err(QualityError::InvalidPolicy(format!(
                "weight for {} must be non-negative, got {}",
                ty, w
            )));
        }
        if self.scoring.base_score <= 0 {
            return Err(QualityError::InvalidPolicy(format!(
                "base_score must be positive, got {}",
                self.scoring.base_score
            )));
        }
        if self.thresholds.minimum_passing_score > 100 {
            return Err(QualityError::InvalidPolicy(format!(
                "minimum_passing_score must be at most 100, got {}",
                self.thresholds.minimum_passing_score
            )));
        }
        for (name, criteria) in [
            ("external_criteria", &self.external_criteria),
            ("internal_criteria", &self.internal_criteria),
        ] {
            if !(0.0..=100.0).contains(&criteria.min_pass_rate) {
                return Err(QualityError::InvalidPolicy(format!(
                    "{}.min_pass_rate must be within 0-100, got {}",
                    name, criteria.min_pass_rate
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let policy = QualityPolicy::from_toml_str(
            r#"
            [thresholds]
            minimum_passing_score = 70

            [scoring.weights]
            external_validation = 50
            internal_validation = 50
            "#,
        )
        .expect("parse");
        assert_eq!(policy.thresholds.minimum_passing_score, 70);
        assert_eq!(policy.thresholds.critical_issue_threshold, 0);
        assert_eq!(policy.scoring.weight_for(&GateType::ExternalValidation), 50);
        assert_eq!(policy.scoring.penalties.failure_penalty, 50);
        assert_eq!(policy.internal_criteria, GateCriteria::internal());
    }

    #[test]
    fn custom_gate_weights_parse() {
        let policy = QualityPolicy::from_toml_str(
            r#"
            [scoring.weights]
            security_scan = 20
            "#,
        )
        .expect("parse");
        assert_eq!(
            policy.scoring.weight_for(&GateType::Custom("security_scan".to_string())),
            20
        );
    }

    #[test]
    fn overrides_win() {
        let policy = QualityPolicy::default().apply(&PolicyOverrides {
            min_score: Some(90),
            max_critical: Some(2),
            base_score: Some(110),
            external_weight: Some(50),
            internal_weight: Some(50),
        });
        assert_eq!(policy.thresholds.minimum_passing_score, 90);
        assert_eq!(policy.thresholds.critical_issue_threshold, 2);
        assert_eq!(policy.scoring.base_score, 110);
        assert_eq!(policy.scoring.weight_for(&GateType::InternalValidation), 50);
    }

    #[test]
    fn validate_rejects_negative_weight() {
        let policy = QualityPolicy::default().apply(&PolicyOverrides {
            external_weight: Some(-1),
            ..PolicyOverrides::default()
        });
        let err = policy.validate().expect_err("negative weight");
        assert!(err.to_string().contains("external_validation"));
    }

    #[test]
    fn validate_accepts_defaults() {
        QualityPolicy::default().validate().expect("defaults are valid");
    }

    #[test]
    fn toml_roundtrip_of_defaults() {
        let policy = QualityPolicy::default();
        let rendered = policy.to_toml_string().expect("render");
        assert!(rendered.contains("external_validation = 60"));
        let parsed = QualityPolicy::from_toml_str(&rendered).expect("parse");
        assert_eq!(parsed, policy);
    }

    #[test]
    fn garbled_toml_is_parse_error() {
        let err = QualityPolicy::from_toml_str("[thresholds\nminimum").expect_err("garbled");
        assert!(matches!(err, QualityError::PolicyParse(_)));
    }
}
