//! Rectangular batch table extracted from a sheet image.
//!
//! Cells are kept as trimmed strings; numeric interpretation is decided per
//! column at read time, mirroring how the extracted CSV round-trips through
//! the checks. A cell is *missing* when it is empty or the literal sentinel
//! `MISSING` (any case) the vision model is instructed to emit.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Missing-value sentinel the extraction prompt asks the model to write.
pub const MISSING_SENTINEL: &str = "MISSING";

#[derive(Error, Debug)]
pub enum TableError {
    #[error("table has no data rows")]
    Empty,

    #[error("row {row} has {got} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        got: usize,
        expected: usize,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A named-column table of string cells. Every row holds exactly
/// `columns.len()` cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl BatchTable {
    /// Build a table from a header and rows. Short rows are padded with
    /// empty cells; an overlong row is an error.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, TableError> {
        let width = columns.len();
        if width == 0 {
            return Err(TableError::Empty);
        }
        let mut padded = Vec::with_capacity(rows.len());
        for (i, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(TableError::RaggedRow {
                    row: i,
                    got: row.len(),
                    expected: width,
                });
            }
            row.resize(width, String::new());
            padded.push(row);
        }
        Ok(Self {
            columns,
            rows: padded,
        })
    }

    /// Parse delimiter-separated text: first line is the header, the rest
    /// are data rows. Cells are trimmed. Markdown separator rows (cells of
    /// dashes and colons) are layout, not data, and are dropped.
    pub fn parse_delimited(text: &str, delimiter: char) -> Result<Self, TableError> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let header = lines.next().ok_or(TableError::Empty)?;
        let columns = split_cells(header, delimiter);
        let rows: Vec<Vec<String>> = lines
            .map(|l| split_cells(l, delimiter))
            .filter(|cells| !is_separator_row(cells))
            .collect();
        Self::new(columns, rows)
    }

    /// Read a table back from a CSV file written by `write_csv`.
    pub fn from_csv_path(path: &Path) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)?;
        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.trim().to_string()).collect());
        }
        Self::new(columns, rows)
    }

    /// Write the table as CSV.
    pub fn write_csv(&self, path: &Path) -> Result<(), TableError> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush().map_err(TableError::Io)?;
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cells of one column, top to bottom.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |r| r[idx].as_str())
    }

    /// Find a column by name, case-insensitive after trimming. This is how
    /// the KPI check matches `Temperature` against ` temperature ` headers.
    pub fn find_column(&self, name: &str) -> Option<usize> {
        let wanted = normalize_name(name);
        self.columns
            .iter()
            .position(|c| normalize_name(c) == wanted)
    }

    /// A column is numeric when every non-empty cell parses as a float and
    /// at least one does. A `MISSING` sentinel makes the column textual,
    /// which matches the dtype the original checks saw.
    pub fn column_is_numeric(&self, idx: usize) -> bool {
        let mut any = false;
        for cell in self.column(idx) {
            if cell.trim().is_empty() {
                continue;
            }
            if parse_plain_number(cell).is_none() {
                return false;
            }
            any = true;
        }
        any
    }

    /// Parsed values of a numeric column; empty cells are skipped.
    pub fn numeric_values(&self, idx: usize) -> Vec<f64> {
        self.column(idx).filter_map(parse_plain_number).collect()
    }

    /// Cleaned values of any column: `%` stripped, then parsed. Used by the
    /// KPI check so `95%` yields counts toward the Yield trend.
    pub fn cleaned_numeric_values(&self, idx: usize) -> Vec<f64> {
        self.column(idx).filter_map(clean_numeric).collect()
    }
}

/// True for empty/whitespace cells and the `MISSING` sentinel (any case).
pub fn is_missing_cell(cell: &str) -> bool {
    let trimmed = cell.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(MISSING_SENTINEL)
}

/// Strict float parse for dtype detection and the anomaly check.
pub fn parse_plain_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Lenient parse for KPI trends: drop `%` signs, then parse.
pub fn clean_numeric(cell: &str) -> Option<f64> {
    let cleaned: String = cell.trim().chars().filter(|c| *c != '%').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Trim and lowercase a column name for matching.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn split_cells(line: &str, delimiter: char) -> Vec<String> {
    let mut cells: Vec<String> = line.split(delimiter).map(|c| c.trim().to_string()).collect();
    // Leading/trailing pipes in markdown-style rows produce empty edge
    // cells that are not data.
    if cells.len() > 1 && cells.first().is_some_and(|c| c.is_empty()) {
        cells.remove(0);
    }
    if cells.len() > 1 && cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells
}

fn is_separator_row(cells: &[String]) -> bool {
    !cells.is_empty()
        && cells.iter().all(|c| {
            !c.is_empty() && c.chars().all(|ch| ch == '-' || ch == ':' || ch == ' ')
        })
}

/// Sample standard deviation (ddof = 1), the original's pandas default.
/// Returns None with fewer than two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
