//! Vision extraction: sheet image in, `BatchTable` plus persisted CSV out.
//!
//! The model is asked for a pipe-delimited table with explicit `MISSING`
//! sentinels. Only delimiter-bearing lines of the reply are kept, and
//! parsing falls back through the common delimiters before giving up.

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use thiserror::Error;

use crate::llm::{LlmError, VisionClient};
use crate::table::{BatchTable, TableError};

/// Extraction instruction sent with every sheet image.
pub const EXTRACTION_PROMPT: &str = "\
You are an expert at reading batch production tables from images. Extract \
the entire table as CSV, using the pipe character (|) as the delimiter \
between columns. Do not use commas or semicolons as delimiters. If a value \
is missing or unclear, write 'MISSING'.";

/// Delimiters tried against the reply, most likely first.
const DELIMITER_CANDIDATES: &[char] = &['|', ';', ',', '\t'];

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("vision extraction failed: {0}")]
    Llm(#[from] LlmError),

    #[error("failed to parse table with any common delimiter")]
    UnparseableTable,

    #[error("CSV write failed: {0}")]
    Table(#[from] TableError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An extracted table together with the CSV persisted beside the image.
#[derive(Debug)]
pub struct ExtractedSheet {
    pub table: BatchTable,
    pub csv_path: PathBuf,
}

/// Send the image to the vision model and persist the parsed table as CSV
/// next to the source file.
pub fn extract_table(
    vision: &dyn VisionClient,
    image_path: &Path,
) -> Result<ExtractedSheet, ExtractionError> {
    let mime_type = mime_for(image_path)?;
    let bytes = fs::read(image_path)?;

    let _span = tracing::info_span!(
        "vision_extract",
        file = %image_path.display(),
        image_size = bytes.len(),
    )
    .entered();
    let start = std::time::Instant::now();

    let image_base64 = base64::engine::general_purpose::STANDARD.encode(&bytes);
    let response = vision.generate_from_image(EXTRACTION_PROMPT, &image_base64, mime_type)?;

    let table = parse_table_text(&response).ok_or(ExtractionError::UnparseableTable)?;

    let csv_path = image_path.with_extension("csv");
    table.write_csv(&csv_path)?;

    tracing::info!(
        elapsed_ms = %start.elapsed().as_millis(),
        rows = table.row_count(),
        cols = table.column_count(),
        csv = %csv_path.display(),
        "Vision extraction complete"
    );

    Ok(ExtractedSheet { table, csv_path })
}

/// Keep only table-looking lines of the reply, then try each delimiter in
/// turn. A parse only counts when it yields at least two columns.
pub fn parse_table_text(response: &str) -> Option<BatchTable> {
    let table_text: String = response
        .lines()
        .filter(|l| l.contains('|'))
        .collect::<Vec<_>>()
        .join("\n");

    for delimiter in DELIMITER_CANDIDATES {
        match BatchTable::parse_delimited(&table_text, *delimiter) {
            Ok(table) if table.column_count() > 1 => return Some(table),
            _ => continue,
        }
    }
    None
}

fn mime_for(path: &Path) -> Result<&'static str, ExtractionError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();
    match ext.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        other => Err(ExtractionError::UnsupportedFormat(other.to_string())),
    }
}
