//! Completeness: every field on the sheet is filled in.

use super::{Check, CheckContext, CheckError, CheckOutcome};
use crate::table::{is_missing_cell, BatchTable};

/// Counts missing fields across the whole table. Empty cells and the
/// `MISSING` sentinel (any case) both count, one per occurrence.
pub struct CompletenessCheck;

impl Check for CompletenessCheck {
    fn name(&self) -> &'static str {
        "completeness_check"
    }

    fn run(&self, table: &BatchTable, _ctx: &CheckContext) -> Result<CheckOutcome, CheckError> {
        let missing: usize = table
            .rows()
            .iter()
            .flat_map(|row| row.iter())
            .filter(|cell| is_missing_cell(cell))
            .count();

        let message = if missing == 0 {
            "All fields complete".to_string()
        } else {
            format!("{missing} missing fields")
        };
        Ok(CheckOutcome::Text(message))
    }
}
