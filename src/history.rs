//! Append-only archive of extracted CSVs, the KPI check's baseline.
//!
//! A flat directory, one CSV per processed batch, no index and no
//! compaction. Recency is by file name order, matching how batch sheets
//! are named when scanned.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Copy an extracted CSV into the history directory, creating it on first
/// use. Returns the archived path.
pub fn archive_csv(csv_path: &Path, history_dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(history_dir)?;
    let file_name = csv_path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "CSV path has no file name"))?;
    let target = history_dir.join(file_name);
    fs::copy(csv_path, &target)?;
    tracing::debug!(archived = %target.display(), "CSV archived to history");
    Ok(target)
}

/// The most recent `limit` archived CSVs, sorted by file name, oldest
/// first within the window.
pub fn recent_csvs(history_dir: &Path, limit: usize) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(history_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    let skip = files.len().saturating_sub(limit);
    Ok(files.split_off(skip))
}
