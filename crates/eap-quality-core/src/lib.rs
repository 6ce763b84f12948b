//! EAP Quality Gate Evaluation Engine
//!
//! Turns the outcomes of upstream validation pipelines (external sample
//! builds, internal regression suites) into one release verdict:
//! - Gates score each validation domain and list the issues they detect
//! - A scoring strategy combines gate scores into an overall score
//! - The engine classifies the verdict and attaches recommendations
//! - Reporting renders the verdict for logs, pipelines and chat

pub mod domain;
pub mod engine;
pub mod gate;
pub mod obs;
pub mod policy;
pub mod recommendations;
pub mod reporting;
pub mod scoring;
pub mod telemetry;

pub use domain::{
    EvaluationPhase, ExecutionSummary, GateContext, GateCriteria, GateError, GateResult,
    GateStatus, GateType, Issue, Penalties, QualityError, QualityReport, Result, ScoringConfig,
    Severity, Thresholds,
};

pub use engine::{determine_overall_status, QualityGateEngine};
pub use gate::{
    calculate_gate_score, determine_status, ExternalValidationGate, InternalValidationGate,
    QualityGate,
};
pub use policy::{PolicyOverrides, QualityPolicy};
pub use recommendations::{generate_next_steps, generate_recommendations};
pub use reporting::{
    read_report_artifact, render_text_report, write_report_artifact, JsonSummary,
    NotificationPayload,
};
pub use scoring::{ScoringStrategy, WeightedScoringStrategy};

pub use obs::{
    emit_evaluation_finished, emit_evaluation_started, emit_gate_evaluated,
    emit_gate_execution_failed, emit_phase, evaluation_span, EvaluationSpan,
};
pub use telemetry::init_tracing;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The two built-in gates configured from a policy, in report order.
pub fn default_gates(policy: &QualityPolicy) -> Vec<Box<dyn QualityGate>> {
    vec![
        Box::new(ExternalValidationGate::new(policy.external_criteria.clone())),
        Box::new(InternalValidationGate::new(policy.internal_criteria.clone())),
    ]
}
