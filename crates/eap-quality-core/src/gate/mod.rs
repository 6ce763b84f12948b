//! Quality gates.
//!
//! A gate evaluates one validation domain against its [`GateCriteria`] and
//! produces a [`GateResult`]. The two shipped gates read upstream status
//! signals from the [`GateContext`]; new domains plug in by implementing
//! [`QualityGate`] and being passed to the engine alongside them.

pub mod external;
pub mod internal;
pub mod rules;

use std::collections::BTreeMap;
use std::time::Instant;

use crate::domain::{
    GateContext, GateCriteria, GateError, GateResult, GateStatus, GateType, Issue, ScoringConfig,
    Severity,
};

pub use external::ExternalValidationGate;
pub use internal::InternalValidationGate;

/// One validation domain.
///
/// `evaluate` must not panic on missing or garbled signals; absent inputs
/// should degrade to a FAILED result instead. Errors returned here never reach
/// the engine's caller: the engine turns them into a FAILED result.
pub trait QualityGate: Send + Sync {
    fn name(&self) -> &str;

    fn gate_type(&self) -> GateType;

    fn criteria(&self) -> &GateCriteria;

    fn evaluate(&self, context: &GateContext) -> Result<GateResult, GateError>;
}

/// Score for one gate.
///
/// `base − failure·[not succeeded] − critical·#CRITICAL − warning·#(HIGH|MEDIUM)
/// − warning·[any LOW]`, clamped to 0–100. LOW observations are charged once
/// per gate.
pub fn calculate_gate_score(build_succeeded: bool, issues: &[Issue], config: &ScoringConfig) -> u32 {
    let p = &config.penalties;
    let critical = issues.iter().filter(|i| i.severity == Severity::Critical).count() as i64;
    let actionable = issues
        .iter()
        .filter(|i| matches!(i.severity, Severity::High | Severity::Medium))
        .count() as i64;
    let has_low = issues.iter().any(|i| i.severity == Severity::Low);

    let mut score = i64::from(config.base_score);
    if !build_succeeded {
        score -= i64::from(p.failure_penalty);
    }
    score -= i64::from(p.critical_issue_penalty) * critical;
    score -= i64::from(p.warning_penalty) * actionable;
    if has_low {
        score -= i64::from(p.warning_penalty);
    }
    score.clamp(0, 100) as u32
}

/// FAILED when the build did not succeed or critical issues exceed the allowance.
pub fn determine_status(build_succeeded: bool, issues: &[Issue], criteria: &GateCriteria) -> GateStatus {
    let critical = issues.iter().filter(|i| i.severity.is_critical()).count();
    if !build_succeeded || critical > criteria.allowed_critical_issues {
        GateStatus::Failed
    } else {
        GateStatus::Passed
    }
}

/// Pass-rate check over an upstream counter pair.
///
/// Returns the rate (percent) when computable, plus a HIGH issue when it falls
/// below `criteria.min_pass_rate`.
pub(crate) fn check_pass_rate(
    total: Option<f64>,
    passed: Option<f64>,
    criteria: &GateCriteria,
    what: &str,
    component: &str,
    build_id: Option<&str>,
) -> (Option<f64>, Option<Issue>) {
    let (Some(total), Some(passed)) = (total, passed) else {
        return (None, None);
    };
    if total <= 0.0 {
        return (None, None);
    }
    let rate = (passed.clamp(0.0, total) / total) * 100.0;
    if rate >= criteria.min_pass_rate {
        return (Some(rate), None);
    }
    let issue = Issue::new(
        Severity::High,
        format!(
            "{} pass rate {:.1}% is below the required {:.1}%",
            what, rate, criteria.min_pass_rate
        ),
        component,
        format!("Raise the {} pass rate before release", what.to_lowercase()),
    )
    .with_build_id(build_id.map(str::to_string));
    (Some(rate), Some(issue))
}

/// Common shape of a gate driven by upstream status signals.
pub(crate) struct SignalOutcome {
    pub build_succeeded: bool,
    pub issues: Vec<Issue>,
    pub build_id: Option<String>,
    pub metrics: BTreeMap<String, f64>,
}

/// Assemble a [`GateResult`] from detected issues, splitting them by severity.
pub(crate) fn assemble_result(
    gate: &dyn QualityGate,
    context: &GateContext,
    outcome: SignalOutcome,
    started: Instant,
) -> GateResult {
    let score = calculate_gate_score(outcome.build_succeeded, &outcome.issues, &context.scoring_config);
    let status = determine_status(outcome.build_succeeded, &outcome.issues, gate.criteria());
    let (critical_issues, warnings): (Vec<Issue>, Vec<Issue>) = outcome
        .issues
        .into_iter()
        .partition(|i| i.severity.is_critical());

    GateResult {
        gate_name: gate.name().to_string(),
        gate_type: gate.gate_type(),
        status,
        score,
        critical_issues,
        warnings,
        execution_time_ms: started.elapsed().as_millis() as u64,
        timestamp: context.evaluated_at,
        eap_version: context.eap_version.clone(),
        build_id: outcome.build_id,
        additional_metrics: outcome.metrics,
    }
}
