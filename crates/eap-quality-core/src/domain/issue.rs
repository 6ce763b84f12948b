//! Detected problems attached to a gate result.

use serde::{Deserialize, Serialize};

/// Issue severity. Declaration order is the ordering: `Critical` is worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, Severity::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected problem. Created once during a gate's evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub description: String,
    pub affected_component: String,
    pub suggested_action: String,
    pub related_build_id: Option<String>,
    pub error_detail: Option<String>,
}

impl Issue {
    pub fn new(
        severity: Severity,
        description: impl Into<String>,
        affected_component: impl Into<String>,
        suggested_action: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            description: description.into(),
            affected_component: affected_component.into(),
            suggested_action: suggested_action.into(),
            related_build_id: None,
            error_detail: None,
        }
    }

    /// Link the issue to the upstream build that produced it.
    pub fn with_build_id(mut self, build_id: Option<String>) -> Self {
        self.related_build_id = build_id;
        self
    }

    /// Attach raw error output (usually the upstream status text).
    pub fn with_error_detail(mut self, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        self.error_detail = if detail.is_empty() { None } else { Some(detail) };
        self
    }
}
