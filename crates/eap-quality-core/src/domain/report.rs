//! The final artifact of one evaluation run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::result::{GateResult, GateStatus};

/// Lifecycle of one evaluation run. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationPhase {
    Pending,
    Evaluating,
    Passed,
    Failed,
    Blocked,
}

impl EvaluationPhase {
    /// Terminal phase corresponding to an overall status.
    pub fn from_status(status: GateStatus) -> Self {
        match status {
            GateStatus::Passed => EvaluationPhase::Passed,
            GateStatus::Blocked => EvaluationPhase::Blocked,
            GateStatus::Failed | GateStatus::Skipped => EvaluationPhase::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EvaluationPhase::Passed | EvaluationPhase::Failed | EvaluationPhase::Blocked
        )
    }
}

/// Aggregates across every evaluated gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub total_execution_time_ms: u64,
    pub samples_validated: u64,
    pub tests_executed: u64,
    /// Passed gates over evaluated gates, in percent.
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// EAP version under evaluation.
    pub version: String,
    pub overall_status: GateStatus,
    pub overall_score: u32,
    pub external_validation: GateResult,
    pub internal_validation: GateResult,
    /// Results of extension gates outside the two built-in domains.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_gates: Vec<GateResult>,
    pub recommendations: Vec<String>,
    pub next_steps: Vec<String>,
    pub execution_summary: ExecutionSummary,
    pub generated_at: DateTime<Utc>,
    pub trigger_build: String,
    pub branch: String,
    pub environment: String,
}

impl QualityReport {
    /// Every gate result in report order: external, internal, then extensions.
    pub fn gate_results(&self) -> impl Iterator<Item = &GateResult> {
        [&self.external_validation, &self.internal_validation]
            .into_iter()
            .chain(self.additional_gates.iter())
    }

    pub fn total_critical_issues(&self) -> usize {
        self.gate_results().map(|r| r.critical_issues.len()).sum()
    }

    pub fn total_warnings(&self) -> usize {
        self.gate_results().map(|r| r.warnings.len()).sum()
    }

    pub fn ready_for_release(&self) -> bool {
        self.overall_status == GateStatus::Passed
    }

    /// Process exit code that gates the release: 0 on PASSED, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.ready_for_release() {
            0
        } else {
            1
        }
    }
}
