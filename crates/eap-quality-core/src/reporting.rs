//! Report renderers and artifacts for CI consumers.
//!
//! Provides the outputs downstream steps forward verbatim:
//! - plain-text report for build logs
//! - `JsonSummary`: the compact machine-readable verdict document
//! - `NotificationPayload`: chat message body (built here, delivered elsewhere)
//! - `quality-report.json` + `quality-report.digest` on disk

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{GateResult, GateStatus, QualityError, QualityReport, Result};

pub const REPORT_FILE: &str = "quality-report.json";
pub const DIGEST_FILE: &str = "quality-report.digest";

// ── plain text ────────────────────────────────────────────────────────────

/// Render the report for build logs.
pub fn render_text_report(report: &QualityReport) -> String {
    let mut out = String::new();
    let rule = "=".repeat(60);

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "EAP QUALITY GATE REPORT");
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "EAP version:    {}", report.version);
    if !report.trigger_build.is_empty() {
        let _ = writeln!(out, "Trigger build:  {}", report.trigger_build);
    }
    let _ = writeln!(out, "Branch:         {}", report.branch);
    let _ = writeln!(out, "Environment:    {}", report.environment);
    let _ = writeln!(out, "Generated at:   {}", report.generated_at.to_rfc3339());
    let _ = writeln!(out);
    let _ = writeln!(out, "Overall status: {}", report.overall_status);
    let _ = writeln!(out, "Overall score:  {}/100", report.overall_score);
    let _ = writeln!(out, "Critical issues: {}", report.total_critical_issues());
    let _ = writeln!(out, "Warnings:        {}", report.total_warnings());

    for result in report.gate_results() {
        let _ = writeln!(out);
        render_gate_section(&mut out, result);
    }

    let summary = &report.execution_summary;
    let _ = writeln!(out);
    let _ = writeln!(out, "## Execution Summary");
    let _ = writeln!(out, "- total execution time: {} ms", summary.total_execution_time_ms);
    let _ = writeln!(out, "- samples validated: {}", summary.samples_validated);
    let _ = writeln!(out, "- tests executed: {}", summary.tests_executed);
    let _ = writeln!(out, "- gate success rate: {:.1}%", summary.success_rate);

    render_list(&mut out, "Recommendations", &report.recommendations);
    render_list(&mut out, "Next Steps", &report.next_steps);

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Ready for release: {}",
        if report.ready_for_release() { "YES" } else { "NO" }
    );
    let _ = writeln!(out, "{}", rule);
    out
}

fn render_gate_section(out: &mut String, result: &GateResult) {
    let _ = writeln!(out, "## {} [{}]", result.gate_name, result.status);
    let _ = writeln!(out, "- score: {}/100", result.score);
    if let Some(build_id) = &result.build_id {
        let _ = writeln!(out, "- build: {}", build_id);
    }
    for (key, value) in &result.additional_metrics {
        let _ = writeln!(out, "- {}: {}", key, value);
    }
    for issue in result.critical_issues.iter().chain(result.warnings.iter()) {
        let _ = writeln!(
            out,
            "  [{}] {} ({}) -> {}",
            issue.severity, issue.description, issue.affected_component, issue.suggested_action
        );
    }
}

fn render_list(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "## {}", title);
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, item);
    }
}

// ── JSON summary ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GateSummary {
    pub status: GateStatus,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityGatesSummary {
    pub external: GateSummary,
    pub internal: GateSummary,
}

/// Compact verdict document consumed by downstream pipeline steps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JsonSummary {
    pub eap_version: String,
    pub timestamp: DateTime<Utc>,
    pub overall_status: GateStatus,
    pub overall_score: u32,
    pub total_critical_issues: usize,
    pub quality_gates: QualityGatesSummary,
    pub recommendations: Vec<String>,
    pub next_steps: Vec<String>,
    pub ready_for_release: bool,
}

impl JsonSummary {
    pub fn from_report(report: &QualityReport) -> Self {
        Self {
            eap_version: report.version.clone(),
            timestamp: report.generated_at,
            overall_status: report.overall_status,
            overall_score: report.overall_score,
            total_critical_issues: report.total_critical_issues(),
            quality_gates: QualityGatesSummary {
                external: GateSummary {
                    status: report.external_validation.status,
                    score: report.external_validation.score,
                },
                internal: GateSummary {
                    status: report.internal_validation.status,
                    score: report.internal_validation.score,
                },
            },
            recommendations: report.recommendations.clone(),
            next_steps: report.next_steps.clone(),
            ready_for_release: report.ready_for_release(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ── chat notification ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationAttachment {
    pub color: String,
    pub title: String,
    pub fields: Vec<NotificationField>,
}

/// Chat webhook body in the common `text` + `attachments` shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationPayload {
    pub text: String,
    pub attachments: Vec<NotificationAttachment>,
}

impl NotificationPayload {
    pub fn from_report(report: &QualityReport) -> Self {
        let (emoji, color) = match report.overall_status {
            GateStatus::Passed => (":white_check_mark:", "good"),
            GateStatus::Blocked => (":no_entry:", "warning"),
            GateStatus::Failed | GateStatus::Skipped => (":x:", "danger"),
        };

        let mut fields = vec![
            NotificationField {
                title: "Overall score".to_string(),
                value: format!("{}/100", report.overall_score),
                short: true,
            },
            NotificationField {
                title: "Critical issues".to_string(),
                value: report.total_critical_issues().to_string(),
                short: true,
            },
        ];
        for result in report.gate_results() {
            fields.push(NotificationField {
                title: result.gate_name.clone(),
                value: format!("{} ({}/100)", result.status, result.score),
                short: true,
            });
        }
        if let Some(first) = report.recommendations.first() {
            fields.push(NotificationField {
                title: "Recommendation".to_string(),
                value: first.clone(),
                short: false,
            });
        }

        Self {
            text: format!(
                "{} EAP {} quality gate: {}",
                emoji, report.version, report.overall_status
            ),
            attachments: vec![NotificationAttachment {
                color: color.to_string(),
                title: format!("Branch {} / {}", report.branch, report.environment),
                fields,
            }],
        }
    }
}

// ── artifacts ─────────────────────────────────────────────────────────────

fn digest_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Persist `<dir>/quality-report.json` and `<dir>/quality-report.digest`.
pub fn write_report_artifact(report: &QualityReport, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let path = dir.join(REPORT_FILE);
    let json = serde_json::to_vec_pretty(report)?;
    std::fs::write(&path, &json)?;
    std::fs::write(dir.join(DIGEST_FILE), digest_hex(&json).as_bytes())?;

    Ok(path)
}

/// Read `<dir>/quality-report.json`, verifying it against the stored digest.
pub fn read_report_artifact(dir: &Path) -> Result<QualityReport> {
    let json = std::fs::read(dir.join(REPORT_FILE))?;
    let expected = std::fs::read_to_string(dir.join(DIGEST_FILE))?;
    let actual = digest_hex(&json);
    if expected.trim() != actual {
        return Err(QualityError::DigestMismatch {
            expected: expected.trim().to_string(),
            actual,
        });
    }
    Ok(serde_json::from_slice(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_sha256_hex() {
        assert_eq!(
            digest_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
