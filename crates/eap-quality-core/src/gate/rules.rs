//! Keyword rules that turn upstream status text into issues.
//!
//! Matching is case-insensitive substring search. Each rule yields at most one
//! issue per evaluation no matter how often its keywords appear.

use crate::domain::{Issue, Severity};

/// How a rule's keywords must appear in the status text.
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    /// At least one keyword present.
    Any(&'static [&'static str]),
    /// Every keyword present, in any order.
    All(&'static [&'static str]),
}

impl Matcher {
    /// `haystack` must already be lowercased.
    fn matches(&self, haystack: &str) -> bool {
        match self {
            Matcher::Any(words) => words.iter().any(|w| haystack.contains(&w.to_lowercase())),
            Matcher::All(words) => {
                !words.is_empty() && words.iter().all(|w| haystack.contains(&w.to_lowercase()))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DetectionRule {
    pub matcher: Matcher,
    pub severity: Severity,
    pub description: &'static str,
    pub suggested_action: &'static str,
}

/// Informational issue recorded when the upstream job succeeded.
#[derive(Debug, Clone, Copy)]
pub struct Observation {
    pub description: &'static str,
    pub suggested_action: &'static str,
}

pub const EXTERNAL_RULES: &[DetectionRule] = &[
    DetectionRule {
        matcher: Matcher::Any(&["BUILD FAILED", "compilation"]),
        severity: Severity::Critical,
        description: "External samples failed to build against the EAP version",
        suggested_action: "Fix compilation errors in the affected sample projects",
    },
    DetectionRule {
        matcher: Matcher::All(&["test", "failed"]),
        severity: Severity::High,
        description: "Tests failed in external samples",
        suggested_action: "Investigate failing sample tests for API regressions",
    },
];

pub const INTERNAL_RULES: &[DetectionRule] = &[
    DetectionRule {
        matcher: Matcher::Any(&["BUILD FAILED", "compilation"]),
        severity: Severity::Critical,
        description: "Internal test suite failed to compile",
        suggested_action: "Fix compilation errors before re-running the suite",
    },
    DetectionRule {
        matcher: Matcher::All(&["test", "failed"]),
        severity: Severity::High,
        description: "Internal regression tests failed",
        suggested_action: "Triage failing tests and fix regressions",
    },
    DetectionRule {
        matcher: Matcher::Any(&["OutOfMemory"]),
        severity: Severity::High,
        description: "Internal test run ran out of memory",
        suggested_action: "Check for memory leaks or raise the test JVM heap",
    },
    DetectionRule {
        matcher: Matcher::Any(&["timeout"]),
        severity: Severity::Medium,
        description: "Internal test run hit a timeout",
        suggested_action: "Investigate slow or hanging tests",
    },
];

pub const EXTERNAL_OBSERVATIONS: &[Observation] = &[Observation {
    description: "External samples built successfully with minor warnings",
    suggested_action: "Review compiler warnings in sample builds",
}];

pub const INTERNAL_OBSERVATIONS: &[Observation] = &[
    Observation {
        description: "Performance metrics within tolerance with minor variations",
        suggested_action: "Keep monitoring performance trends across EAP builds",
    },
    Observation {
        description: "Internal tests passed with minor test warnings",
        suggested_action: "Review test warnings before the release build",
    },
];

/// Apply `rules` to `text`, producing one issue per matching rule.
pub fn detect_issues(
    text: &str,
    rules: &[DetectionRule],
    component: &str,
    build_id: Option<&str>,
) -> Vec<Issue> {
    if text.is_empty() {
        return Vec::new();
    }
    let haystack = text.to_lowercase();
    rules
        .iter()
        .filter(|rule| rule.matcher.matches(&haystack))
        .map(|rule| {
            Issue::new(rule.severity, rule.description, component, rule.suggested_action)
                .with_build_id(build_id.map(str::to_string))
                .with_error_detail(text)
        })
        .collect()
}

pub fn observation_issues(
    observations: &[Observation],
    component: &str,
    build_id: Option<&str>,
) -> Vec<Issue> {
    observations
        .iter()
        .map(|o| {
            Issue::new(Severity::Low, o.description, component, o.suggested_action)
                .with_build_id(build_id.map(str::to_string))
        })
        .collect()
}
