//! Domain model for quality gate evaluation.
//!
//! Value types only:
//! - `GateCriteria`: per-gate policy
//! - `Issue`: one detected problem
//! - `GateResult`: output of one gate
//! - `ScoringConfig` / `Thresholds`: caller-supplied policy
//! - `GateContext`: per-run input
//! - `QualityReport`: the final artifact

pub mod config;
pub mod context;
pub mod criteria;
pub mod error;
pub mod issue;
pub mod report;
pub mod result;

pub use config::{Penalties, ScoringConfig, Thresholds, DEFAULT_GATE_WEIGHT};
pub use context::{is_success, GateContext, STATUS_SUCCESS, STATUS_UNKNOWN};
pub use criteria::GateCriteria;
pub use error::{GateError, QualityError, Result};
pub use issue::{Issue, Severity};
pub use report::{EvaluationPhase, ExecutionSummary, QualityReport};
pub use result::{
    GateResult, GateStatus, GateType, METRIC_SAMPLES_VALIDATED, METRIC_TESTS_EXECUTED,
};
