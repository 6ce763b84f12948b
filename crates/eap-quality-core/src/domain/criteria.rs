//! Per-gate pass criteria.

use serde::{Deserialize, Serialize};

/// Immutable policy for a single gate, fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateCriteria {
    /// Minimum pass rate (0–100) for counted samples or tests.
    pub min_pass_rate: f64,
    /// Number of CRITICAL issues tolerated before the gate fails.
    pub allowed_critical_issues: usize,
    /// Performance regression (%) above which an issue is raised.
    pub performance_regression_threshold: f64,
    /// Advisory wall-clock budget for the upstream job; not enforced here.
    pub execution_timeout_minutes: u32,
}

impl GateCriteria {
    /// Criteria for the external sample build gate.
    pub fn external() -> Self {
        Self {
            min_pass_rate: 90.0,
            allowed_critical_issues: 0,
            performance_regression_threshold: 10.0,
            execution_timeout_minutes: 60,
        }
    }

    /// Criteria for the internal regression suite gate.
    pub fn internal() -> Self {
        Self {
            min_pass_rate: 95.0,
            allowed_critical_issues: 0,
            performance_regression_threshold: 5.0,
            execution_timeout_minutes: 120,
        }
    }
}

impl Default for GateCriteria {
    fn default() -> Self {
        Self::external()
    }
}
