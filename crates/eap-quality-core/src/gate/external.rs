//! Gate over the external community sample builds.

use std::collections::BTreeMap;
use std::time::Instant;

use super::rules::{detect_issues, observation_issues, EXTERNAL_OBSERVATIONS, EXTERNAL_RULES};
use super::{assemble_result, check_pass_rate, QualityGate, SignalOutcome};
use crate::domain::context::{
    EXTERNAL_BUILD_ID, EXTERNAL_SAMPLES_PASSED, EXTERNAL_SAMPLES_TOTAL, EXTERNAL_STATUS,
    EXTERNAL_STATUS_TEXT,
};
use crate::domain::{
    is_success, GateContext, GateCriteria, GateError, GateResult, GateType,
    METRIC_SAMPLES_VALIDATED,
};

const COMPONENT: &str = "External Samples";

/// Validates that community samples still build against the EAP version.
///
/// Signals: `external.status`, `external.status.text`, `external.build.id`,
/// and optionally `external.samples.total` / `external.samples.passed`.
#[derive(Debug, Clone)]
pub struct ExternalValidationGate {
    name: String,
    criteria: GateCriteria,
}

impl ExternalValidationGate {
    pub fn new(criteria: GateCriteria) -> Self {
        Self {
            name: "External Validation".to_string(),
            criteria,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for ExternalValidationGate {
    fn default() -> Self {
        Self::new(GateCriteria::external())
    }
}

impl QualityGate for ExternalValidationGate {
    fn name(&self) -> &str {
        &self.name
    }

    fn gate_type(&self) -> GateType {
        GateType::ExternalValidation
    }

    fn criteria(&self) -> &GateCriteria {
        &self.criteria
    }

    fn evaluate(&self, context: &GateContext) -> Result<GateResult, GateError> {
        let started = Instant::now();
        let status = context.status(EXTERNAL_STATUS);
        let text = context.status_text(EXTERNAL_STATUS_TEXT);
        let build_id = context.build_id(EXTERNAL_BUILD_ID);
        let build_succeeded = is_success(status);

        let mut issues = detect_issues(text, EXTERNAL_RULES, COMPONENT, build_id.as_deref());

        let mut metrics = BTreeMap::new();
        let total = context.count(EXTERNAL_SAMPLES_TOTAL).map(|v| v as f64);
        let passed = context.count(EXTERNAL_SAMPLES_PASSED).map(|v| v as f64);
        if let Some(total) = total {
            metrics.insert(METRIC_SAMPLES_VALIDATED.to_string(), total);
        }
        if let Some(passed) = passed {
            metrics.insert("samplesPassed".to_string(), passed);
        }
        let (rate, rate_issue) = check_pass_rate(
            total,
            passed,
            &self.criteria,
            "Sample",
            COMPONENT,
            build_id.as_deref(),
        );
        if let Some(rate) = rate {
            metrics.insert("passRate".to_string(), rate);
        }
        issues.extend(rate_issue);

        if build_succeeded {
            issues.extend(observation_issues(
                EXTERNAL_OBSERVATIONS,
                COMPONENT,
                build_id.as_deref(),
            ));
        }

        Ok(assemble_result(
            self,
            context,
            SignalOutcome {
                build_succeeded,
                issues,
                build_id,
                metrics,
            },
            started,
        ))
    }
}
