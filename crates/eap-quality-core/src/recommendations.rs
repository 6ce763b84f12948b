//! Human-readable guidance attached to a report.
//!
//! Both generators are pure functions of the overall status and the gate
//! results, so identical inputs always produce identical lists.

use crate::domain::{GateResult, GateStatus, Thresholds};

/// Recommendations keyed on the overall status.
pub fn generate_recommendations(
    status: GateStatus,
    results: &[GateResult],
    thresholds: &Thresholds,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    match status {
        GateStatus::Passed => {
            recommendations.push("EAP version is ready for release".to_string());
            recommendations.push("Prepare release notes and documentation updates".to_string());
        }
        GateStatus::Failed => {
            recommendations.push("Address critical issues before release".to_string());
            for result in results {
                if result.status == GateStatus::Failed && !result.critical_issues.is_empty() {
                    recommendations.push(format!("Fix critical issues in {}", result.gate_name));
                }
            }
        }
        GateStatus::Blocked => {
            recommendations.push("Resolve blocking conditions before re-running the quality gates".to_string());
        }
        GateStatus::Skipped => {
            recommendations.push("Review quality gate status manually".to_string());
        }
    }

    let warnings: usize = results.iter().map(|r| r.warnings.len()).sum();
    if warnings > thresholds.warning_issue_threshold {
        recommendations.push(format!(
            "Review {} warning(s); the advisory limit is {}",
            warnings, thresholds.warning_issue_threshold
        ));
    }

    recommendations
}

/// Next steps keyed on the overall status.
pub fn generate_next_steps(status: GateStatus, results: &[GateResult]) -> Vec<String> {
    match status {
        GateStatus::Passed => vec![
            "Notify stakeholders that the EAP passed quality gates".to_string(),
            "Update release documentation".to_string(),
            "Monitor early-access feedback after publication".to_string(),
        ],
        GateStatus::Failed => {
            let mut steps = vec![
                "Analyze failed quality gate results".to_string(),
                "Create a fix plan for the detected issues".to_string(),
                "Re-run quality gates after fixes land".to_string(),
            ];
            let critical: usize = results.iter().map(|r| r.critical_issues.len()).sum();
            if critical > 0 {
                steps.push(format!("Prioritize resolution of {} critical issue(s)", critical));
            }
            steps
        }
        GateStatus::Blocked => vec![
            "Investigate infrastructure issues that prevented evaluation".to_string(),
            "Resolve the blocking conditions".to_string(),
            "Retry the quality gate evaluation".to_string(),
        ],
        GateStatus::Skipped => vec!["Review quality gate status manually".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GateType, Issue, Severity};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn result(name: &str, status: GateStatus, critical: usize, warnings: usize) -> GateResult {
        GateResult {
            gate_name: name.to_string(),
            gate_type: GateType::Custom(name.to_string()),
            status,
            score: 0,
            critical_issues: (0..critical)
                .map(|_| Issue::new(Severity::Critical, "c", name, "fix"))
                .collect(),
            warnings: (0..warnings)
                .map(|_| Issue::new(Severity::Low, "w", name, "review"))
                .collect(),
            execution_time_ms: 0,
            timestamp: Utc::now(),
            eap_version: "2.1.0-eap-1".to_string(),
            build_id: None,
            additional_metrics: BTreeMap::new(),
        }
    }

    #[test]
    fn passed_recommends_release() {
        let recs = generate_recommendations(GateStatus::Passed, &[], &Thresholds::default());
        assert!(recs[0].contains("ready for release"));
        let steps = generate_next_steps(GateStatus::Passed, &[]);
        assert_eq!(steps.len(), 3);
        assert!(steps[0].contains("Notify stakeholders"));
    }

    #[test]
    fn failed_names_each_gate_with_critical_issues() {
        let results = vec![
            result("External Validation", GateStatus::Failed, 2, 0),
            result("Internal Validation", GateStatus::Failed, 0, 0),
        ];
        let recs = generate_recommendations(GateStatus::Failed, &results, &Thresholds::default());
        assert_eq!(
            recs,
            vec![
                "Address critical issues before release".to_string(),
                "Fix critical issues in External Validation".to_string(),
            ]
        );
        let steps = generate_next_steps(GateStatus::Failed, &results);
        assert_eq!(steps.last().map(String::as_str), Some("Prioritize resolution of 2 critical issue(s)"));
    }

    #[test]
    fn failed_without_critical_issues_has_three_steps() {
        let results = vec![result("Internal Validation", GateStatus::Failed, 0, 0)];
        assert_eq!(generate_next_steps(GateStatus::Failed, &results).len(), 3);
    }

    #[test]
    fn blocked_and_fallback() {
        let recs = generate_recommendations(GateStatus::Blocked, &[], &Thresholds::default());
        assert!(recs[0].contains("blocking conditions"));
        assert!(generate_next_steps(GateStatus::Blocked, &[])[0].contains("infrastructure"));

        let recs = generate_recommendations(GateStatus::Skipped, &[], &Thresholds::default());
        assert_eq!(recs, vec!["Review quality gate status manually".to_string()]);
    }

    #[test]
    fn warning_overflow_adds_advisory() {
        let thresholds = Thresholds {
            warning_issue_threshold: 2,
            ..Thresholds::default()
        };
        let results = vec![result("Internal Validation", GateStatus::Passed, 0, 3)];
        let recs = generate_recommendations(GateStatus::Passed, &results, &thresholds);
        assert_eq!(recs.len(), 3);
        assert!(recs[2].starts_with("Review 3 warning(s)"));
    }
}
