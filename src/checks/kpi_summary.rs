//! KPI trend statistics over the history archive.
//!
//! For each key numeric signal (Temperature, Pressure, pH, Volume, Yield)
//! the check computes mean/std/min/max over the most recent 30 archived
//! batches and counts current-batch values more than 3 standard deviations
//! from the historical mean. With fewer than 30 archived batches the report
//! carries a warning; with fewer than 3 there is no report at all.

use std::collections::BTreeMap;

use super::{Check, CheckContext, CheckError, CheckOutcome, KpiReport, KpiStats};
use crate::history;
use crate::table::{mean, sample_std, BatchTable};

/// Key numeric columns tracked across batches.
const KPI_COLUMNS: &[&str] = &["Temperature", "Pressure", "pH", "Volume", "Yield"];

/// History window size, in archived batches.
const HISTORY_WINDOW: usize = 30;

/// Minimum archived batches before any statistics are reported.
const MIN_HISTORY: usize = 3;

const Z_THRESHOLD: f64 = 3.0;

pub struct KpiSummaryCheck;

impl Check for KpiSummaryCheck {
    fn name(&self) -> &'static str {
        "kpi_summary_check"
    }

    fn run(&self, table: &BatchTable, ctx: &CheckContext) -> Result<CheckOutcome, CheckError> {
        if !ctx.history_dir.is_dir() {
            return Ok(CheckOutcome::Text(
                "No historical data directory found.".to_string(),
            ));
        }

        let files = history::recent_csvs(&ctx.history_dir, HISTORY_WINDOW)?;
        if files.len() < MIN_HISTORY {
            return Ok(CheckOutcome::Text(
                "Not enough historical data (need \u{2265} 3).".to_string(),
            ));
        }

        let mut archived = Vec::with_capacity(files.len());
        for file in &files {
            archived.push(BatchTable::from_csv_path(file)?);
        }

        let mut stats = BTreeMap::new();
        for kpi in KPI_COLUMNS {
            let Some(current_idx) = table.find_column(kpi) else {
                continue;
            };
            let current_values = table.cleaned_numeric_values(current_idx);

            let hist_values: Vec<f64> = archived
                .iter()
                .filter_map(|t| t.find_column(kpi).map(|idx| t.cleaned_numeric_values(idx)))
                .flatten()
                .collect();

            if hist_values.is_empty() || current_values.is_empty() {
                continue;
            }
            let Some(std) = sample_std(&hist_values) else {
                continue;
            };

            let hist_mean = mean(&hist_values);
            let min = hist_values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = hist_values
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            let outliers = current_values
                .iter()
                .filter(|v| ((*v - hist_mean) / std).abs() > Z_THRESHOLD)
                .count();

            stats.insert(
                kpi.to_string(),
                KpiStats {
                    mean: round2(hist_mean),
                    std: round2(std),
                    min: round2(min),
                    max: round2(max),
                    outliers,
                },
            );
        }

        if stats.is_empty() {
            return Ok(CheckOutcome::Text(
                "No KPI statistics generated.".to_string(),
            ));
        }

        let warning = (files.len() < HISTORY_WINDOW).then(|| {
            format!(
                "Warning: Only {} historical records found (expected {}). \
                 Statistics are based on available data. ",
                files.len(),
                HISTORY_WINDOW
            )
        });

        Ok(CheckOutcome::Kpi(KpiReport { warning, stats }))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
