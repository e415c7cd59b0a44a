//! Per-file orchestration: extract, plan, check, summarize, archive, report.
//!
//! Error policy is uniform: a failed stage is logged (or folded into the
//! result set as an inline error string) and the pipeline moves on. The
//! only hard stop for a file is extraction itself, since nothing
//! downstream can run without a table.

pub mod extraction;
pub mod planner;
pub mod summary;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::checks::{run_checks, CheckContext, CheckRun};
use crate::history;
use crate::llm::{ChatClient, VisionClient};
use crate::report::{render_report, Mailer};

pub use extraction::{extract_table, ExtractedSheet, ExtractionError};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything one processed sheet produced.
#[derive(Debug)]
pub struct ProcessReport {
    pub csv_path: PathBuf,
    pub results: Vec<CheckRun>,
    pub summary: String,
}

/// The wired-up pipeline. Clients are trait objects so tests can drive the
/// whole flow with mocks; the mailer is optional so runs without a mail
/// account still produce results.
pub struct QcPipeline {
    vision: Box<dyn VisionClient>,
    chat: Box<dyn ChatClient>,
    mailer: Option<Mailer>,
    history_dir: PathBuf,
}

impl QcPipeline {
    pub fn new(
        vision: Box<dyn VisionClient>,
        chat: Box<dyn ChatClient>,
        mailer: Option<Mailer>,
        history_dir: PathBuf,
    ) -> Self {
        Self {
            vision,
            chat,
            mailer,
            history_dir,
        }
    }

    /// Run one batch sheet through the full pipeline.
    pub fn process_file(&self, image_path: &Path) -> Result<ProcessReport, PipelineError> {
        let _span = tracing::info_span!("process_file", file = %image_path.display()).entered();
        let start = std::time::Instant::now();

        let sheet = extract_table(self.vision.as_ref(), image_path)?;
        tracing::info!(
            csv = %sheet.csv_path.display(),
            rows = sheet.table.row_count(),
            cols = sheet.table.column_count(),
            "Table extracted"
        );

        let csv_text = fs::read_to_string(&sheet.csv_path)?;
        let selection = planner::plan_checks(self.chat.as_ref(), &csv_text);
        tracing::info!(selection = ?selection, "Planner selected checks");

        let ctx = CheckContext {
            history_dir: self.history_dir.clone(),
        };
        let results = run_checks(&sheet.table, &selection, &ctx);
        for run in &results {
            tracing::info!(check = %run.name, result = %run.outcome.render_text(), "QC check");
        }

        let summary = summary::generate_summary(self.chat.as_ref(), &results)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Summary generation failed");
                format!("Summary generation failed: {e}")
            });

        // Archive before the report goes out, so the next batch's KPI
        // baseline includes this one even if delivery fails.
        if let Err(e) = history::archive_csv(&sheet.csv_path, &self.history_dir) {
            tracing::warn!(error = %e, "Failed to archive CSV to history");
        }

        self.deliver(&sheet, &results, &summary);

        tracing::info!(
            elapsed_ms = %start.elapsed().as_millis(),
            "Pipeline complete for this file"
        );
        Ok(ProcessReport {
            csv_path: sheet.csv_path,
            results,
            summary,
        })
    }

    fn deliver(&self, sheet: &ExtractedSheet, results: &[CheckRun], summary: &str) {
        let Some(mailer) = &self.mailer else {
            tracing::info!("Mail account not configured, skipping report delivery");
            return;
        };
        let csv_name = sheet
            .csv_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("batch.csv");
        let subject = format!("Zipp QC Report: {csv_name}");
        let html = render_report(summary, results, &sheet.table);
        let attachment = match fs::read(&sheet.csv_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "Could not read CSV for attachment");
                return;
            }
        };
        if let Err(e) = mailer.send(&subject, &html, csv_name, attachment) {
            tracing::error!(error = %e, "Report email failed");
        }
    }
}
