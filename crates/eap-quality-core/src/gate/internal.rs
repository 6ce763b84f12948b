//! Gate over the internal regression suite.

use std::collections::BTreeMap;
use std::time::Instant;

use super::rules::{detect_issues, observation_issues, INTERNAL_OBSERVATIONS, INTERNAL_RULES};
use super::{assemble_result, check_pass_rate, QualityGate, SignalOutcome};
use crate::domain::context::{
    INTERNAL_BUILD_ID, INTERNAL_PERFORMANCE_REGRESSION, INTERNAL_STATUS, INTERNAL_STATUS_TEXT,
    INTERNAL_TESTS_PASSED, INTERNAL_TESTS_TOTAL,
};
use crate::domain::{
    is_success, GateContext, GateCriteria, GateError, GateResult, GateType, Issue, Severity,
    METRIC_TESTS_EXECUTED,
};

const COMPONENT: &str = "Internal Tests";

#[derive(Debug, Clone)]
pub struct InternalValidationGate {
    name: String,
    criteria: GateCriteria,
}

impl InternalValidationGate {
    pub fn new(criteria: GateCriteria) -> Self {
        Self {
            name: "Internal Validation".to_string(),
            criteria,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn regression_issue(&self, regression: f64, build_id: Option<&str>) -> Option<Issue> {
        if regression <= self.criteria.performance_regression_threshold {
            return None;
        }
        Some(
            Issue::new(
                Severity::Medium,
                format!(
                    "Performance regressed by {:.1}% (limit {:.1}%)",
                    regression, self.criteria.performance_regression_threshold
                ),
                COMPONENT,
                "Profile the regressed benchmarks against the previous EAP",
            )
            .with_build_id(build_id.map(str::to_string)),
        )
    }
}

impl Default for InternalValidationGate {
    fn default() -> Self {
        Self::new(GateCriteria::internal())
    }
}

impl QualityGate for InternalValidationGate {
    fn name(&self) -> &str {
        &self.name
    }

    fn gate_type(&self) -> GateType {
        GateType::InternalValidation
    }

    fn criteria(&self) -> &GateCriteria {
        &self.criteria
    }

    fn evaluate(&self, context: &GateContext) -> Result<GateResult, GateError> {
        let started = Instant::now();
        let status = context.status(INTERNAL_STATUS);
        let text = context.status_text(INTERNAL_STATUS_TEXT);
        let build_id = context.build_id(INTERNAL_BUILD_ID);
        let build_succeeded = is_success(status);

        let mut issues = detect_issues(text, INTERNAL_RULES, COMPONENT, build_id.as_deref());

        let mut metrics = BTreeMap::new();
        let total = context.count(INTERNAL_TESTS_TOTAL).map(|v| v as f64);
        let passed = context.count(INTERNAL_TESTS_PASSED).map(|v| v as f64);
        if let Some(total) = total {
            metrics.insert(METRIC_TESTS_EXECUTED.to_string(), total);
        }
        if let Some(passed) = passed {
            metrics.insert("testsPassed".to_string(), passed);
        }
        let (rate, rate_issue) = check_pass_rate(
            total,
            passed,
            &self.criteria,
            "Test",
            COMPONENT,
            build_id.as_deref(),
        );
        if let Some(rate) = rate {
            metrics.insert("passRate".to_string(), rate);
        }
        issues.extend(rate_issue);

        if let Some(regression) = context.counter(INTERNAL_PERFORMANCE_REGRESSION) {
            metrics.insert("performanceRegression".to_string(), regression);
            issues.extend(self.regression_issue(regression, build_id.as_deref()));
        }

        if build_succeeded {
            issues.extend(observation_issues(
                INTERNAL_OBSERVATIONS,
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
