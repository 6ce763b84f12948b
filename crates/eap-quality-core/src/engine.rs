//! Evaluation engine.
//!
//! Runs every registered gate against one [`GateContext`], combines the
//! results with a [`ScoringStrategy`], classifies the overall status and
//! assembles the [`QualityReport`]. Evaluation is pure: no I/O, no shared
//! mutable state, and a failing gate never prevents the others from being
//! reported.

use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Once};

use futures::future::join_all;
use tracing::Instrument;

use crate::domain::{
    EvaluationPhase, ExecutionSummary, GateContext, GateResult, GateStatus, GateType,
    QualityReport, Thresholds, METRIC_SAMPLES_VALIDATED, METRIC_TESTS_EXECUTED,
};
use crate::gate::QualityGate;
use crate::obs;
use crate::recommendations::{generate_next_steps, generate_recommendations};
use crate::scoring::{ScoringStrategy, WeightedScoringStrategy};

const EXTERNAL_SLOT_NAME: &str = "External Validation";
const INTERNAL_SLOT_NAME: &str = "Internal Validation";

pub struct QualityGateEngine {
    strategy: Box<dyn ScoringStrategy>,
}

impl Default for QualityGateEngine {
    fn default() -> Self {
        Self::new(WeightedScoringStrategy)
    }
}

impl QualityGateEngine {
    pub fn new(strategy: impl ScoringStrategy + 'static) -> Self {
        Self {
            strategy: Box::new(strategy),
        }
    }

    /// Evaluate one gate. Never fails.
    ///
    /// An `Err` or a panic from the gate becomes a FAILED result with score 0
    /// and one CRITICAL issue describing the failure.
    pub fn evaluate_single(&self, gate: &dyn QualityGate, context: &GateContext) -> GateResult {
        run_gate(gate, context)
    }

    /// Evaluate `gates` in declared order and build the report.
    pub fn evaluate_all<G>(&self, gates: &[G], context: &GateContext) -> QualityReport
    where
        G: AsRef<dyn QualityGate>,
    {
        let _span = obs::EvaluationSpan::enter(&context.eap_version);
        obs::emit_phase(&context.eap_version, EvaluationPhase::Pending);
        obs::emit_evaluation_started(&context.eap_version, gates.len());
        obs::emit_phase(&context.eap_version, EvaluationPhase::Evaluating);

        let results: Vec<GateResult> = gates
            .iter()
            .map(|gate| self.evaluate_single(gate.as_ref(), context))
            .collect();

        self.assemble_report(context, results)
    }

    /// Evaluate `gates` concurrently on the blocking pool and build the report.
    ///
    /// Results are joined back into declared gate order before scoring. A task
    /// that fails to join is reported like a gate error.
    pub async fn evaluate_all_concurrent(
        &self,
        gates: &[Arc<dyn QualityGate>],
        context: &GateContext,
    ) -> QualityReport {
        let span = obs::evaluation_span(&context.eap_version);
        span.in_scope(|| {
            obs::emit_phase(&context.eap_version, EvaluationPhase::Pending);
            obs::emit_evaluation_started(&context.eap_version, gates.len());
            obs::emit_phase(&context.eap_version, EvaluationPhase::Evaluating);
        });

        let shared = Arc::new(context.clone());
        let handles: Vec<_> = gates
            .iter()
            .map(|gate| {
                let gate = Arc::clone(gate);
                let ctx = Arc::clone(&shared);
                let span = span.clone();
                tokio::task::spawn_blocking(move || {
                    span.in_scope(|| run_gate(gate.as_ref(), &ctx))
                })
            })
            .collect();

        let joined = join_all(handles).instrument(span.clone()).await;

        let _entered = span.enter();
        let results: Vec<GateResult> = joined
            .into_iter()
            .zip(gates)
            .map(|(joined, gate)| match joined {
                Ok(result) => result,
                Err(err) => execution_failed(gate.as_ref(), context, &err.to_string()),
            })
            .collect();

        self.assemble_report(context, results)
    }

    /// Report for a run that infrastructure prevented from evaluating.
    pub fn blocked_report(&self, context: &GateContext, reason: &str) -> QualityReport {
        let status = GateStatus::Blocked;
        let mut recommendations = generate_recommendations(status, &[], &context.thresholds);
        recommendations.push(format!("Blocking condition: {}", reason));

        obs::emit_phase(&context.eap_version, EvaluationPhase::Blocked);
        obs::emit_evaluation_finished(&context.eap_version, status, 0, 0);

        QualityReport {
            version: context.eap_version.clone(),
            overall_status: status,
            overall_score: 0,
            external_validation: skipped_slot(GateType::ExternalValidation, context),
            internal_validation: skipped_slot(GateType::InternalValidation, context),
            additional_gates: Vec::new(),
            recommendations,
            next_steps: generate_next_steps(status, &[]),
            execution_summary: summarize(&[]),
            generated_at: context.evaluated_at,
            trigger_build: context.trigger_build.clone(),
            branch: context.branch.clone(),
            environment: context.environment.clone(),
        }
    }

    fn assemble_report(&self, context: &GateContext, results: Vec<GateResult>) -> QualityReport {
        let overall_score = self
            .strategy
            .calculate_overall_score(&results, &context.scoring_config)
            .min(100);
        let mut overall_status =
            determine_overall_status(&results, overall_score, &context.thresholds);

        let slots = SlotMissing {
            external: !results.iter().any(|r| r.gate_type == GateType::ExternalValidation),
            internal: !results.iter().any(|r| r.gate_type == GateType::InternalValidation),
        };
        // A built-in gate that never ran cannot vouch for the release.
        if slots.any() && overall_status == GateStatus::Passed {
            overall_status = GateStatus::Failed;
        }

        let mut recommendations =
            generate_recommendations(overall_status, &results, &context.thresholds);
        for name in slots.names() {
            recommendations.push(format!("Register and run the {} gate", name));
        }
        let next_steps = generate_next_steps(overall_status, &results);
        let execution_summary = summarize(&results);
        let critical: usize = results.iter().map(|r| r.critical_issues.len()).sum();

        let mut external = None;
        let mut internal = None;
        let mut additional_gates = Vec::new();
        for result in results {
            match result.gate_type {
                GateType::ExternalValidation if external.is_none() => external = Some(result),
                GateType::InternalValidation if internal.is_none() => internal = Some(result),
                _ => additional_gates.push(result),
            }
        }

        obs::emit_evaluation_finished(&context.eap_version, overall_status, overall_score, critical);
        obs::emit_phase(
            &context.eap_version,
            EvaluationPhase::from_status(overall_status),
        );

        QualityReport {
            version: context.eap_version.clone(),
            overall_status,
            overall_score,
            external_validation: external
                .unwrap_or_else(|| skipped_slot(GateType::ExternalValidation, context)),
            internal_validation: internal
                .unwrap_or_else(|| skipped_slot(GateType::InternalValidation, context)),
            additional_gates,
            recommendations,
            next_steps,
            execution_summary,
            generated_at: context.evaluated_at,
            trigger_build: context.trigger_build.clone(),
            branch: context.branch.clone(),
            environment: context.environment.clone(),
        }
    }
}

/// Built-in report slots with no evaluated gate behind them.
#[derive(Debug)]
struct SlotMissing {
    external: bool,
    internal: bool,
}

impl SlotMissing {
    fn any(&self) -> bool {
        self.external || self.internal
    }

    fn names(&self) -> impl Iterator<Item = &'static str> {
        [
            (self.external, EXTERNAL_SLOT_NAME),
            (self.internal, INTERNAL_SLOT_NAME),
        ]
        .into_iter()
        .filter_map(|(missing, name)| missing.then_some(name))
    }
}

/// Overall verdict.
///
/// Checks run in order: total critical issues against the threshold, score
/// against the minimum, then every gate must have PASSED. The first two are
/// absolute and fail the run even when every gate nominally passed. An empty
/// result list fails closed.
pub fn determine_overall_status(
    results: &[GateResult],
    overall_score: u32,
    thresholds: &Thresholds,
) -> GateStatus {
    let critical: usize = results.iter().map(|r| r.critical_issues.len()).sum();
    if critical > thresholds.critical_issue_threshold {
        return GateStatus::Failed;
    }
    if overall_score < thresholds.minimum_passing_score {
        return GateStatus::Failed;
    }
    if results.is_empty() {
        return GateStatus::Failed;
    }
    if results.iter().all(GateResult::passed) {
        GateStatus::Passed
    } else {
        GateStatus::Failed
    }
}

thread_local! {
    static GATE_RUNNING: Cell<bool> = const { Cell::new(false) };
}

static QUIET_PANIC_HOOK: Once = Once::new();

/// Wrap the process panic hook so panics raised inside a gate stay silent.
///
/// The panic message still reaches the report through the unwind payload.
/// Panics on threads that are not running a gate go to the previous hook.
fn install_quiet_panic_hook() {
    QUIET_PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !GATE_RUNNING.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

/// Marks the current thread as running a gate until dropped.
struct GateRunGuard {
    was_running: bool,
}

impl GateRunGuard {
    fn enter() -> Self {
        Self {
            was_running: GATE_RUNNING.with(|flag| flag.replace(true)),
        }
    }
}

impl Drop for GateRunGuard {
    fn drop(&mut self) {
        GATE_RUNNING.with(|flag| flag.set(self.was_running));
    }
}

fn run_gate(gate: &dyn QualityGate, context: &GateContext) -> GateResult {
    install_quiet_panic_hook();
    let outcome = {
        let _running = GateRunGuard::enter();
        panic::catch_unwind(AssertUnwindSafe(|| gate.evaluate(context)))
    };
    match outcome {
        Ok(Ok(result)) => {
            let result = result.normalized(gate.criteria());
            obs::emit_gate_evaluated(&result);
            result
        }
        Ok(Err(err)) => execution_failed(gate, context, &err.to_string()),
        Err(payload) => execution_failed(gate, context, &panic_message(payload.as_ref())),
    }
}

fn execution_failed(gate: &dyn QualityGate, context: &GateContext, message: &str) -> GateResult {
    obs::emit_gate_execution_failed(gate.name(), &message);
    let result = GateResult::execution_failed(
        gate.name(),
        gate.gate_type(),
        &context.eap_version,
        context.evaluated_at,
        message,
    );
    obs::emit_gate_evaluated(&result);
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "gate panicked".to_string()
    }
}

fn skipped_slot(gate_type: GateType, context: &GateContext) -> GateResult {
    let name = match gate_type {
        GateType::ExternalValidation => EXTERNAL_SLOT_NAME,
        _ => INTERNAL_SLOT_NAME,
    };
    GateResult::skipped(name, gate_type, &context.eap_version, context.evaluated_at)
}

fn summarize(results: &[GateResult]) -> ExecutionSummary {
    let passed = results.iter().filter(|r| r.passed()).count();
    let success_rate = if results.is_empty() {
        0.0
    } else {
        passed as f64 / results.len() as f64 * 100.0
    };

    ExecutionSummary {
        total_execution_time_ms: results.iter().map(|r| r.execution_time_ms).sum(),
        samples_validated: sum_counts(results, METRIC_SAMPLES_VALIDATED),
        tests_executed: sum_counts(results, METRIC_TESTS_EXECUTED),
        success_rate,
    }
}

/// Sum a count metric across gates.
///
/// Gate-supplied metrics are floats: fractions truncate, negatives count as
/// zero and the total saturates at `u64::MAX`.
fn sum_counts(results: &[GateResult], metric: &str) -> u64 {
    results
        .iter()
        .map(|r| r.metric(metric).max(0.0) as u64)
        .fold(0u64, u64::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GateCriteria, GateError, Issue, Severity};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn result(status: GateStatus, score: u32, critical: usize) -> GateResult {
        GateResult {
            gate_name: "gate".to_string(),
            gate_type: GateType::ExternalValidation,
            status,
            score,
            critical_issues: (0..critical)
                .map(|_| Issue::new(Severity::Critical, "c", "gate", "fix"))
                .collect(),
            warnings: vec![],
            execution_time_ms: 5,
            timestamp: Utc::now(),
            eap_version: "2.1.0-eap-1".to_string(),
            build_id: None,
            additional_metrics: BTreeMap::new(),
        }
    }

    #[test]
    fn critical_threshold_overrides_high_score() {
        let results = vec![result(GateStatus::Passed, 100, 1)];
        assert_eq!(
            determine_overall_status(&results, 100, &Thresholds::default()),
            GateStatus::Failed
        );

        let lenient = Thresholds {
            critical_issue_threshold: 1,
            ..Thresholds::default()
        };
        assert_eq!(
            determine_overall_status(&results, 100, &lenient),
            GateStatus::Passed
        );
    }

    #[test]
    fn low_score_fails_even_if_gates_pass() {
        let results = vec![result(GateStatus::Passed, 70, 0)];
        assert_eq!(
            determine_overall_status(&results, 70, &Thresholds::default()),
            GateStatus::Failed
        );
    }

    #[test]
    fn any_non_passed_gate_fails() {
        let results = vec![result(GateStatus::Passed, 95, 0), result(GateStatus::Skipped, 95, 0)];
        assert_eq!(
            determine_overall_status(&results, 95, &Thresholds::default()),
            GateStatus::Failed
        );
    }

    #[test]
    fn count_metrics_saturate_instead_of_wrapping() {
        let mut huge = result(GateStatus::Passed, 95, 0);
        huge.additional_metrics.insert(METRIC_TESTS_EXECUTED.to_string(), 1e300);
        let mut fractional = result(GateStatus::Passed, 95, 0);
        fractional.additional_metrics.insert(METRIC_TESTS_EXECUTED.to_string(), 12.7);
        let mut negative = result(GateStatus::Passed, 95, 0);
        negative.additional_metrics.insert(METRIC_TESTS_EXECUTED.to_string(), -4.0);

        assert_eq!(sum_counts(&[fractional.clone(), negative], METRIC_TESTS_EXECUTED), 12);
        assert_eq!(sum_counts(&[huge, fractional], METRIC_TESTS_EXECUTED), u64::MAX);
    }

    #[test]
    fn empty_results_fail_closed() {
        let thresholds = Thresholds {
            minimum_passing_score: 0,
            ..Thresholds::default()
        };
        assert_eq!(determine_overall_status(&[], 0, &thresholds), GateStatus::Failed);
    }

    #[test]
    fn panic_message_extracts_payload() {
        let boxed: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(boxed.as_ref()), "static str");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(boxed.as_ref()), "gate panicked");
    }

    struct ErrGate(GateCriteria);

    impl QualityGate for ErrGate {
        fn name(&self) -> &str {
            "Broken Gate"
        }
        fn gate_type(&self) -> GateType {
            GateType::Custom("broken".to_string())
        }
        fn criteria(&self) -> &GateCriteria {
            &self.0
        }
        fn evaluate(&self, _context: &GateContext) -> Result<GateResult, GateError> {
            Err(GateError::evaluation("Broken Gate", "signal store offline"))
        }
    }

    #[test]
    fn evaluate_single_converts_errors() {
        let engine = QualityGateEngine::default();
        let result = engine.evaluate_single(&ErrGate(GateCriteria::default()), &GateContext::new("2.1.0-eap-1"));
        assert_eq!(result.status, GateStatus::Failed);
        assert_eq!(result.score, 0);
        assert_eq!(result.gate_type, GateType::Custom("broken".to_string()));
        assert!(result.critical_issues[0]
            .description
            .starts_with("Quality gate execution failed: Broken Gate: signal store offline"));
    }

    #[test]
    fn no_gates_yields_complete_report() {
        let engine = QualityGateEngine::default();
        let gates: Vec<Box<dyn QualityGate>> = Vec::new();
        let report = engine.evaluate_all(&gates, &GateContext::new("2.1.0-eap-1"));
        assert_eq!(report.overall_status, GateStatus::Failed);
        assert_eq!(report.overall_score, 0);
        assert_eq!(report.external_validation.status, GateStatus::Skipped);
        assert_eq!(report.internal_validation.status, GateStatus::Skipped);
        assert_eq!(
            report.internal_validation.warnings[0].description,
            "Quality gate was not executed"
        );
        assert_eq!(report.execution_summary.success_rate, 0.0);
    }

    #[test]
    fn blocked_report_shape() {
        let engine = QualityGateEngine::default();
        let report = engine.blocked_report(&GateContext::new("2.1.0-eap-1"), "agent pool offline");
        assert_eq!(report.overall_status, GateStatus::Blocked);
        assert_eq!(report.overall_score, 0);
        assert_eq!(report.exit_code(), 1);
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("agent pool offline")));
        assert!(report.next_steps[0].contains("infrastructure"));
    }
}
