//! Per-gate evaluation output.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::criteria::GateCriteria;
use super::issue::{Issue, Severity};

/// Metric key for the number of external samples validated.
pub const METRIC_SAMPLES_VALIDATED: &str = "samplesValidated";
/// Metric key for the number of internal tests executed.
pub const METRIC_TESTS_EXECUTED: &str = "testsExecuted";

/// Status of one gate, and of the overall verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateStatus {
    Passed,
    Failed,
    Blocked,
    Skipped,
}

impl GateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateStatus::Passed => "PASSED",
            GateStatus::Failed => "FAILED",
            GateStatus::Blocked => "BLOCKED",
            GateStatus::Skipped => "SKIPPED",
        }
    }
}

impl std::fmt::Display for GateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation domain a gate belongs to.
///
/// Carried explicitly on every [`GateResult`]; weight lookup and report
/// shaping match on this tag, never on the gate's display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GateType {
    ExternalValidation,
    InternalValidation,
    Custom(String),
}

impl GateType {
    pub fn as_str(&self) -> &str {
        match self {
            GateType::ExternalValidation => "external_validation",
            GateType::InternalValidation => "internal_validation",
            GateType::Custom(name) => name,
        }
    }
}

impl From<String> for GateType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "external_validation" => GateType::ExternalValidation,
            "internal_validation" => GateType::InternalValidation,
            _ => GateType::Custom(value),
        }
    }
}

impl From<GateType> for String {
    fn from(value: GateType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for GateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of evaluating one gate. Immutable once the engine has it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    pub gate_name: String,
    pub gate_type: GateType,
    pub status: GateStatus,
    /// Score in 0–100.
    pub score: u32,
    /// CRITICAL issues only.
    pub critical_issues: Vec<Issue>,
    /// Every issue below CRITICAL.
    pub warnings: Vec<Issue>,
    pub execution_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub eap_version: String,
    pub build_id: Option<String>,
    pub additional_metrics: BTreeMap<String, f64>,
}

impl GateResult {
    /// Result substituted for a gate whose evaluation errored or panicked.
    pub fn execution_failed(
        gate_name: &str,
        gate_type: GateType,
        eap_version: &str,
        timestamp: DateTime<Utc>,
        message: &str,
    ) -> Self {
        let issue = Issue::new(
            Severity::Critical,
            format!("Quality gate execution failed: {}", message),
            gate_name,
            "Investigate the gate failure and re-run the evaluation",
        )
        .with_error_detail(message);

        Self {
            gate_name: gate_name.to_string(),
            gate_type,
            status: GateStatus::Failed,
            score: 0,
            critical_issues: vec![issue],
            warnings: Vec::new(),
            execution_time_ms: 0,
            timestamp,
            eap_version: eap_version.to_string(),
            build_id: None,
            additional_metrics: BTreeMap::new(),
        }
    }

    /// Placeholder for a report slot whose gate was not evaluated.
    pub fn skipped(
        gate_name: &str,
        gate_type: GateType,
        eap_version: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let warning = Issue::new(
            Severity::Low,
            "Quality gate was not executed",
            gate_name,
            "Register the gate with the evaluation run",
        );

        Self {
            gate_name: gate_name.to_string(),
            gate_type,
            status: GateStatus::Skipped,
            score: 0,
            critical_issues: Vec::new(),
            warnings: vec![warning],
            execution_time_ms: 0,
            timestamp,
            eap_version: eap_version.to_string(),
            build_id: None,
            additional_metrics: BTreeMap::new(),
        }
    }

    /// Re-establish result invariants for output from arbitrary gates.
    ///
    /// Clamps the score, moves non-critical issues out of `critical_issues`
    /// and forces FAILED when critical issues exceed the gate's allowance.
    pub fn normalized(mut self, criteria: &GateCriteria) -> Self {
        self.score = self.score.min(100);

        if self.critical_issues.iter().any(|i| !i.severity.is_critical()) {
            let (critical, demoted): (Vec<Issue>, Vec<Issue>) = self
                .critical_issues
                .into_iter()
                .partition(|i| i.severity.is_critical());
            self.critical_issues = critical;
            self.warnings.extend(demoted);
        }

        if self.warnings.iter().any(|i| i.severity.is_critical()) {
            let (promoted, warnings): (Vec<Issue>, Vec<Issue>) = self
                .warnings
                .into_iter()
                .partition(|i| i.severity.is_critical());
            self.warnings = warnings;
            self.critical_issues.extend(promoted);
        }

        if self.critical_issues.len() > criteria.allowed_critical_issues {
            self.status = GateStatus::Failed;
        }
        self
    }

    pub fn passed(&self) -> bool {
        self.status == GateStatus::Passed
    }

    /// Reads a metric, treating absence as zero.
    pub fn metric(&self, key: &str) -> f64 {
        self.additional_metrics.get(key).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(critical: Vec<Issue>, warnings: Vec<Issue>) -> GateResult {
        GateResult {
            gate_name: "Custom Gate".to_string(),
            gate_type: GateType::Custom("security_scan".to_string()),
            status: GateStatus::Passed,
            score: 140,
            critical_issues: critical,
            warnings,
            execution_time_ms: 12,
            timestamp: Utc::now(),
            eap_version: "2.1.0-eap-1".to_string(),
            build_id: None,
            additional_metrics: BTreeMap::new(),
        }
    }

    #[test]
    fn gate_type_string_roundtrip() {
        for ty in [
            GateType::ExternalValidation,
            GateType::InternalValidation,
            GateType::Custom("security_scan".to_string()),
        ] {
            let s: String = ty.clone().into();
            assert_eq!(GateType::from(s), ty);
        }
    }

    #[test]
    fn gate_type_keys_json_maps() {
        let mut weights = BTreeMap::new();
        weights.insert(GateType::ExternalValidation, 60);
        weights.insert(GateType::InternalValidation, 40);
        let json = serde_json::to_value(&weights).expect("serialize");
        assert_eq!(json["external_validation"], 60);
        assert_eq!(json["internal_validation"], 40);
    }

    #[test]
    fn normalized_moves_misfiled_issues() {
        let result = result_with(
            vec![Issue::new(Severity::High, "slow", "perf", "profile")],
            vec![Issue::new(Severity::Critical, "crash", "runtime", "fix")],
        )
        .normalized(&GateCriteria::default());

        assert_eq!(result.score, 100);
        assert_eq!(result.critical_issues.len(), 1);
        assert_eq!(result.critical_issues[0].description, "crash");
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].description, "slow");
        assert_eq!(result.status, GateStatus::Failed);
    }

    #[test]
    fn normalized_respects_critical_allowance() {
        let criteria = GateCriteria {
            allowed_critical_issues: 1,
            ..GateCriteria::default()
        };
        let result = result_with(
            vec![Issue::new(Severity::Critical, "flaky", "samples", "retry")],
            vec![],
        )
        .normalized(&criteria);
        assert_eq!(result.status, GateStatus::Passed);
    }

    #[test]
    fn execution_failed_result_shape() {
        let result = GateResult::execution_failed(
            "Internal Validation",
            GateType::InternalValidation,
            "2.1.0-eap-1",
            Utc::now(),
            "boom",
        );
        assert_eq!(result.status, GateStatus::Failed);
        assert_eq!(result.score, 0);
        assert_eq!(result.execution_time_ms, 0);
        assert_eq!(result.critical_issues.len(), 1);
        assert_eq!(
            result.critical_issues[0].description,
            "Quality gate execution failed: boom"
        );
    }
}
