//! Structured observability hooks for evaluation runs.
//!
//! This module provides:
//! - An evaluation-scoped tracing span via the `EvaluationSpan` RAII guard
//! - Emission functions for run start, per-gate outcomes, gate failures and
//!   the final verdict
//!
//! Nothing is printed unless the host process installs a subscriber (see
//! [`crate::telemetry::init_tracing`]); the report and exit code stay the only
//! user-visible output of an evaluation.

use tracing::{debug, info, warn};

use crate::domain::{EvaluationPhase, GateResult, GateStatus};

/// RAII guard that keeps an evaluation span entered for its lifetime.
///
/// ```ignore
/// let _span = EvaluationSpan::enter("2.1.0-eap-1");
/// // every event below is tagged with eap_version = "2.1.0-eap-1"
/// ```
pub struct EvaluationSpan {
    _span: tracing::span::EnteredSpan,
}

impl EvaluationSpan {
    pub fn enter(eap_version: &str) -> Self {
        Self {
            _span: evaluation_span(eap_version).entered(),
        }
    }
}

/// Unentered evaluation span, for work that hops threads or awaits.
pub fn evaluation_span(eap_version: &str) -> tracing::Span {
    tracing::info_span!("eap.quality.evaluate", eap_version = %eap_version)
}

/// Emit event: phase transition of the run state machine.
pub fn emit_phase(eap_version: &str, phase: EvaluationPhase) {
    debug!(event = "evaluation.phase", eap_version = %eap_version, phase = ?phase);
}

/// Emit event: evaluation started with the number of registered gates.
pub fn emit_evaluation_started(eap_version: &str, gate_count: usize) {
    info!(
        event = "evaluation.started",
        eap_version = %eap_version,
        gate_count = gate_count,
    );
}

/// Emit event: one gate produced a result.
pub fn emit_gate_evaluated(result: &GateResult) {
    info!(
        event = "gate.evaluated",
        gate = %result.gate_name,
        gate_type = %result.gate_type,
        status = %result.status,
        score = result.score,
        critical_issues = result.critical_issues.len(),
        warnings = result.warnings.len(),
        execution_time_ms = result.execution_time_ms,
    );
}

/// Emit event: a gate errored or panicked and was replaced by a FAILED result.
pub fn emit_gate_execution_failed(gate: &str, error: &dyn std::fmt::Display) {
    warn!(event = "gate.execution_failed", gate = %gate, error = %error);
}

/// Emit event: overall verdict computed.
pub fn emit_evaluation_finished(eap_version: &str, status: GateStatus, score: u32, critical_issues: usize) {
    info!(
        event = "evaluation.finished",
        eap_version = %eap_version,
        status = %status,
        score = score,
        critical_issues = critical_issues,
    );
}
