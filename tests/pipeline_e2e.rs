//! End-to-end pipeline runs against mock LLM clients.

use std::fs;
use std::path::Path;

use batchqc::checks::CheckOutcome;
use batchqc::llm::{MockChatClient, MockVisionClient};
use batchqc::pipeline::QcPipeline;

/// A 30-row sheet: tight Temperature cluster with one injected outlier,
/// one MISSING operator cell, and a Dose column mixing mg and g.
fn sheet_response() -> String {
    let mut lines = vec!["Batch | Temperature | Dose | Operator".to_string()];
    for i in 1..=29 {
        let temp = 72.0 + (i % 3) as f64 * 0.1;
        let operator = if i == 7 { "MISSING" } else { "anna" };
        lines.push(format!("B-{i:03} | {temp} | 500 mg | {operator}"));
    }
    lines.push("B-030 | 500.0 | 0.5 g | ben".to_string());
    lines.join("\n")
}

fn pipeline_for(history_dir: &Path) -> QcPipeline {
    QcPipeline::new(
        Box::new(MockVisionClient::new(&sheet_response())),
        // Not JSON, so the planner falls back to running every check; the
        // same reply then serves as the summary text.
        Box::new(MockChatClient::new("Batch looks acceptable overall.")),
        None,
        history_dir.to_path_buf(),
    )
}

fn outcome<'a>(report: &'a batchqc::pipeline::ProcessReport, name: &str) -> &'a CheckOutcome {
    &report
        .results
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("check {name} missing from results"))
        .outcome
}

#[test]
fn mixed_problem_sheet_produces_all_findings() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("sheet_001.png");
    fs::write(&image, b"fake-png-bytes").unwrap();
    let history_dir = dir.path().join("history");

    let pipeline = pipeline_for(&history_dir);
    let report = pipeline.process_file(&image).unwrap();

    // All four checks ran (planner fallback).
    assert_eq!(report.results.len(), 4);

    // Non-zero missing count from the one MISSING cell.
    assert_eq!(
        outcome(&report, "completeness_check"),
        &CheckOutcome::Text("1 missing fields".into())
    );

    // Exactly one flagged anomaly, in the Temperature column.
    match outcome(&report, "anomaly_check") {
        CheckOutcome::PerColumn(map) => {
            assert_eq!(map.len(), 1);
            assert_eq!(map.get("Temperature").map(String::as_str), Some("1 outlier(s)"));
        }
        other => panic!("expected per-column anomalies, got {other:?}"),
    }

    // A non-empty unit issue on the Dose column.
    match outcome(&report, "unit_conversion_check") {
        CheckOutcome::PerColumn(map) => {
            let issue = map.get("Dose").expect("Dose unit issue");
            assert!(issue.contains("Mixed units detected"), "got {issue}");
            assert!(issue.contains('g') && issue.contains("mg"));
        }
        other => panic!("expected per-column unit issues, got {other:?}"),
    }

    // First run: no history yet.
    assert_eq!(
        outcome(&report, "kpi_summary_check"),
        &CheckOutcome::Text("No historical data directory found.".into())
    );

    // The summary is the chat model's narration.
    assert_eq!(report.summary, "Batch looks acceptable overall.");

    // The CSV was persisted beside the image and archived into history.
    assert!(report.csv_path.exists());
    assert_eq!(report.csv_path, dir.path().join("sheet_001.csv"));
    assert!(history_dir.join("sheet_001.csv").exists());
}

#[test]
fn history_accumulates_until_kpi_trends_appear() {
    let dir = tempfile::tempdir().unwrap();
    let history_dir = dir.path().join("history");
    let pipeline = pipeline_for(&history_dir);

    // Three runs build the minimum history window.
    for i in 1..=3 {
        let image = dir.path().join(format!("sheet_{i:03}.png"));
        fs::write(&image, b"fake-png-bytes").unwrap();
        pipeline.process_file(&image).unwrap();
    }

    // The fourth run sees three archived batches and reports trends, with
    // the short-history warning.
    let image = dir.path().join("sheet_004.png");
    fs::write(&image, b"fake-png-bytes").unwrap();
    let report = pipeline.process_file(&image).unwrap();

    match outcome(&report, "kpi_summary_check") {
        CheckOutcome::Kpi(kpi) => {
            let warning = kpi.warning.as_deref().expect("short-history warning");
            assert!(warning.contains("Only 3 historical records"), "got {warning}");
            assert!(kpi.stats.contains_key("Temperature"));
        }
        other => panic!("expected KPI report, got {other:?}"),
    }
}

#[test]
fn extraction_failure_stops_the_file_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("sheet.png");
    fs::write(&image, b"fake-png-bytes").unwrap();

    let pipeline = QcPipeline::new(
        Box::new(MockVisionClient::failing("vision model offline")),
        Box::new(MockChatClient::new("unused")),
        None,
        dir.path().join("history"),
    );
    let err = pipeline.process_file(&image).unwrap_err();
    assert!(err.to_string().contains("vision model offline"));
    assert!(!dir.path().join("sheet.csv").exists(), "no CSV on failure");
}
