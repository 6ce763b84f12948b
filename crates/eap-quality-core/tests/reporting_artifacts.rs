use chrono::{TimeZone, Utc};
use eap_quality_core::domain::context::{
    EXTERNAL_STATUS, EXTERNAL_STATUS_TEXT, INTERNAL_STATUS,
};
use eap_quality_core::reporting::{DIGEST_FILE, REPORT_FILE};
use eap_quality_core::{
    default_gates, read_report_artifact, render_text_report, write_report_artifact, GateContext,
    JsonSummary, NotificationPayload, QualityError, QualityGateEngine, QualityPolicy,
    QualityReport,
};
use serde_json::json;
use tempfile::tempdir;

fn report(external_status: &str, external_text: &str) -> QualityReport {
    let ctx = GateContext::new("2.1.0-eap-3")
        .with_trigger_build("bt-1200")
        .with_branch("release/2.1")
        .with_environment("teamcity")
        .with_evaluated_at(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap())
        .with_parameter(EXTERNAL_STATUS, external_status)
        .with_parameter(EXTERNAL_STATUS_TEXT, external_text)
        .with_parameter(INTERNAL_STATUS, "SUCCESS");
    QualityGateEngine::default().evaluate_all(&default_gates(&QualityPolicy::default()), &ctx)
}

#[test]
fn json_summary_has_contract_fields() {
    let report = report("FAILED", "BUILD FAILED: compilation error");
    let summary = JsonSummary::from_report(&report);
    let raw = serde_json::to_value(&summary).expect("serialize summary");

    let obj = raw.as_object().expect("summary object");
    for key in [
        "eapVersion",
        "timestamp",
        "overallStatus",
        "overallScore",
        "totalCriticalIssues",
        "qualityGates",
        "recommendations",
        "nextSteps",
        "readyForRelease",
    ] {
        assert!(obj.contains_key(key), "missing {}", key);
    }

    assert_eq!(raw["eapVersion"], json!("2.1.0-eap-3"));
    assert_eq!(raw["overallStatus"], json!("FAILED"));
    assert_eq!(raw["overallScore"], json!(56));
    assert_eq!(raw["totalCriticalIssues"], json!(1));
    assert_eq!(raw["qualityGates"]["external"]["status"], json!("FAILED"));
    assert_eq!(raw["qualityGates"]["external"]["score"], json!(30));
    assert_eq!(raw["qualityGates"]["internal"]["score"], json!(95));
    assert_eq!(raw["readyForRelease"], json!(false));
}

#[test]
fn text_report_lists_gates_and_verdict() {
    let report = report("SUCCESS", "");
    let text = render_text_report(&report);

    assert!(text.contains("EAP QUALITY GATE REPORT"));
    assert!(text.contains("EAP version:    2.1.0-eap-3"));
    assert!(text.contains("Overall status: PASSED"));
    assert!(text.contains("Overall score:  95/100"));
    assert!(text.contains("## External Validation [PASSED]"));
    assert!(text.contains("## Internal Validation [PASSED]"));
    assert!(text.contains("## Recommendations"));
    assert!(text.contains("Ready for release: YES"));
}

#[test]
fn notification_payload_reflects_verdict() {
    let passed = NotificationPayload::from_report(&report("SUCCESS", ""));
    assert!(passed.text.contains("PASSED"));
    assert_eq!(passed.attachments[0].color, "good");

    let failed = NotificationPayload::from_report(&report("FAILED", "BUILD FAILED"));
    assert!(failed.text.contains("FAILED"));
    assert_eq!(failed.attachments[0].color, "danger");
    assert_eq!(failed.attachments[0].title, "Branch release/2.1 / teamcity");
    assert!(failed.attachments[0]
        .fields
        .iter()
        .any(|f| f.title == "External Validation" && f.value == "FAILED (30/100)"));
}

#[test]
fn artifact_roundtrip_verifies_digest() {
    let dir = tempdir().expect("tempdir");
    let report = report("SUCCESS", "");

    let path = write_report_artifact(&report, dir.path()).expect("write artifact");
    assert!(path.ends_with(REPORT_FILE));
    assert!(dir.path().join(DIGEST_FILE).exists());

    let loaded = read_report_artifact(dir.path()).expect("read artifact");
    assert_eq!(loaded, report);
}

#[test]
fn tampered_artifact_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let report = report("SUCCESS", "");
    write_report_artifact(&report, dir.path()).expect("write artifact");

    let path = dir.path().join(REPORT_FILE);
    let tampered = std::fs::read_to_string(&path)
        .expect("read")
        .replace("\"PASSED\"", "\"FAILED\"");
    std::fs::write(&path, tampered).expect("tamper");

    let err = read_report_artifact(dir.path()).expect_err("digest must not match");
    assert!(matches!(err, QualityError::DigestMismatch { .. }));
}
