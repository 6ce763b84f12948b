//! Per-evaluation input bag handed to every gate.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::{ScoringConfig, Thresholds};

/// Build status value that marks an upstream job as successful.
pub const STATUS_SUCCESS: &str = "SUCCESS";
/// Status assumed when an upstream signal is absent.
pub const STATUS_UNKNOWN: &str = "UNKNOWN";

pub const EXTERNAL_STATUS: &str = "external.status";
pub const EXTERNAL_STATUS_TEXT: &str = "external.status.text";
pub const EXTERNAL_BUILD_ID: &str = "external.build.id";
pub const EXTERNAL_SAMPLES_TOTAL: &str = "external.samples.total";
pub const EXTERNAL_SAMPLES_PASSED: &str = "external.samples.passed";

pub const INTERNAL_STATUS: &str = "internal.status";
pub const INTERNAL_STATUS_TEXT: &str = "internal.status.text";
pub const INTERNAL_BUILD_ID: &str = "internal.build.id";
pub const INTERNAL_TESTS_TOTAL: &str = "internal.tests.total";
pub const INTERNAL_TESTS_PASSED: &str = "internal.tests.passed";
pub const INTERNAL_PERFORMANCE_REGRESSION: &str = "internal.performance.regression";

/// Read-only input for one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateContext {
    pub eap_version: String,
    pub trigger_build: String,
    pub branch: String,
    pub environment: String,
    pub thresholds: Thresholds,
    pub scoring_config: ScoringConfig,
    /// Raw upstream signals, passed through verbatim.
    pub additional_parameters: BTreeMap<String, String>,
    /// Stamped on every result produced from this context.
    pub evaluated_at: DateTime<Utc>,
}

impl GateContext {
    pub fn new(eap_version: impl Into<String>) -> Self {
        Self {
            eap_version: eap_version.into(),
            trigger_build: String::new(),
            branch: "master".to_string(),
            environment: "ci".to_string(),
            thresholds: Thresholds::default(),
            scoring_config: ScoringConfig::default(),
            additional_parameters: BTreeMap::new(),
            evaluated_at: Utc::now(),
        }
    }

    pub fn with_trigger_build(mut self, trigger_build: impl Into<String>) -> Self {
        self.trigger_build = trigger_build.into();
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_scoring_config(mut self, scoring_config: ScoringConfig) -> Self {
        self.scoring_config = scoring_config;
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_evaluated_at(mut self, evaluated_at: DateTime<Utc>) -> Self {
        self.evaluated_at = evaluated_at;
        self
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.additional_parameters.get(key).map(String::as_str)
    }

    /// Upstream build status for `key`, `UNKNOWN` when absent or blank.
    pub fn status(&self, key: &str) -> &str {
        match self.parameter(key).map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => STATUS_UNKNOWN,
        }
    }

    /// Free-text status for `key`, empty when absent.
    pub fn status_text(&self, key: &str) -> &str {
        self.parameter(key).unwrap_or("")
    }

    /// Non-blank opaque identifier for `key`.
    pub fn build_id(&self, key: &str) -> Option<String> {
        self.parameter(key)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Numeric measurement for `key`. Garbled or non-finite values read as absent.
    pub fn counter(&self, key: &str) -> Option<f64> {
        self.parameter(key)
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    /// Whole-number count for `key`, such as samples or tests run.
    ///
    /// Fractions, exponents, negatives and values beyond `u64` read as absent.
    pub fn count(&self, key: &str) -> Option<u64> {
        self.parameter(key).and_then(|s| s.trim().parse::<u64>().ok())
    }
}

/// Whether an upstream status string denotes success.
pub fn is_success(status: &str) -> bool {
    status.trim().eq_ignore_ascii_case(STATUS_SUCCESS)
}
