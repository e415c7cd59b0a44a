//! Quality-control checks over an extracted batch table.
//!
//! Each check is a named, independent inspection that returns a finding.
//! The runner resolves the planner's selection against the registry and
//! traps per-check failures into inline error strings so one bad check
//! never aborts the run.

pub mod anomaly;
pub mod completeness;
pub mod kpi_summary;
pub mod units;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::table::BatchTable;

pub use anomaly::AnomalyCheck;
pub use completeness::CompletenessCheck;
pub use kpi_summary::KpiSummaryCheck;
pub use units::UnitConversionCheck;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("unknown check: {0}")]
    UnknownCheck(String),

    #[error("table error: {0}")]
    Table(#[from] crate::table::TableError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ambient inputs a check may need beyond the table itself.
pub struct CheckContext {
    /// Directory of archived CSVs from previous runs.
    pub history_dir: PathBuf,
}

/// Per-KPI descriptive statistics over the history window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiStats {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub outliers: usize,
}

/// KPI trend report: optional short-history warning plus per-KPI stats.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiReport {
    pub warning: Option<String>,
    pub stats: BTreeMap<String, KpiStats>,
}

/// What a check found. Free text for verdicts and errors, a per-column map
/// for column-scoped findings, a structured report for the KPI trend.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    Text(String),
    PerColumn(BTreeMap<String, String>),
    Kpi(KpiReport),
}

impl CheckOutcome {
    /// Plain-text rendering for logs and the summary prompt. Structured
    /// outcomes render as JSON.
    pub fn render_text(&self) -> String {
        match self {
            CheckOutcome::Text(s) => s.clone(),
            CheckOutcome::PerColumn(map) => {
                serde_json::to_string(map).unwrap_or_else(|_| format!("{map:?}"))
            }
            CheckOutcome::Kpi(report) => {
                serde_json::to_string(report).unwrap_or_else(|_| format!("{report:?}"))
            }
        }
    }
}

/// One named, independent table inspection.
pub trait Check {
    fn name(&self) -> &'static str;

    fn run(&self, table: &BatchTable, ctx: &CheckContext) -> Result<CheckOutcome, CheckError>;
}

/// One executed check with its finding (or inline error string).
#[derive(Debug, Clone)]
pub struct CheckRun {
    pub name: String,
    pub outcome: CheckOutcome,
}

/// All available checks, in the order they report.
pub fn registry() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(CompletenessCheck),
        Box::new(AnomalyCheck),
        Box::new(KpiSummaryCheck),
        Box::new(UnitConversionCheck),
    ]
}

/// Names of every registered check.
pub fn registered_names() -> Vec<&'static str> {
    registry().iter().map(|c| c.name()).collect()
}

/// The planner's selection: everything, or specific names.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckSelection {
    All,
    Named(Vec<String>),
}

/// Run the selected checks. A check that fails, or a name the registry
/// does not know, yields an inline `[ERROR] Check failed: ...` entry.
pub fn run_checks(
    table: &BatchTable,
    selection: &CheckSelection,
    ctx: &CheckContext,
) -> Vec<CheckRun> {
    let registry = registry();
    let names: Vec<String> = match selection {
        CheckSelection::All => registry.iter().map(|c| c.name().to_string()).collect(),
        CheckSelection::Named(names) => names.clone(),
    };

    let mut results = Vec::with_capacity(names.len());
    for name in names {
        let outcome = match registry.iter().find(|c| c.name() == name) {
            Some(check) => check
                .run(table, ctx)
                .unwrap_or_else(|e| CheckOutcome::Text(format!("[ERROR] Check failed: {e}"))),
            None => CheckOutcome::Text(format!(
                "[ERROR] Check failed: {}",
                CheckError::UnknownCheck(name.clone())
            )),
        };
        results.push(CheckRun { name, outcome });
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::BatchTable;

    fn ctx() -> CheckContext {
        CheckContext {
            history_dir: std::env::temp_dir().join("batchqc-no-such-history"),
        }
    }

    fn small_table() -> BatchTable {
        BatchTable::new(
            vec!["Batch".into(), "Temp".into()],
            vec![vec!["B-001".into(), "72.5".into()]],
        )
        .unwrap()
    }

    #[test]
    fn registry_has_the_four_checks() {
        assert_eq!(
            registered_names(),
            vec![
                "completeness_check",
                "anomaly_check",
                "kpi_summary_check",
                "unit_conversion_check"
            ]
        );
    }

    #[test]
    fn run_all_reports_every_check_once() {
        let results = run_checks(&small_table(), &CheckSelection::All, &ctx());
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].name, "completeness_check");
    }

    #[test]
    fn named_selection_runs_only_those() {
        let selection = CheckSelection::Named(vec!["anomaly_check".into()]);
        let results = run_checks(&small_table(), &selection, &ctx());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "anomaly_check");
    }

    #[test]
    fn unknown_check_becomes_inline_error() {
        let selection = CheckSelection::Named(vec!["no_such_check".into()]);
        let results = run_checks(&small_table(), &selection, &ctx());
        let text = results[0].outcome.render_text();
        assert!(text.starts_with("[ERROR] Check failed:"), "got {text}");
        assert!(text.contains("no_such_check"));
    }

    #[test]
    fn outcome_text_rendering() {
        let mut map = BTreeMap::new();
        map.insert("Temp".to_string(), "1 outlier(s)".to_string());
        let rendered = CheckOutcome::PerColumn(map).render_text();
        assert_eq!(rendered, r#"{"Temp":"1 outlier(s)"}"#);
    }
}
