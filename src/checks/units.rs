//! Unit consistency: one unit abbreviation per column.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;

use super::{Check, CheckContext, CheckError, CheckOutcome};
use crate::table::{is_missing_cell, BatchTable};

/// Matches a number followed by a unit abbreviation, e.g. `500 mg`, `1.2L`,
/// `95%`.
fn unit_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"([\d.]+)\s*([a-zA-Z%]+)").expect("valid unit regex"))
}

/// Scans textual columns for mixed unit abbreviations (`mg` vs `g`, `L` vs
/// `ml`). Numeric columns carry no units and are skipped.
pub struct UnitConversionCheck;

impl Check for UnitConversionCheck {
    fn name(&self) -> &'static str {
        "unit_conversion_check"
    }

    fn run(&self, table: &BatchTable, _ctx: &CheckContext) -> Result<CheckOutcome, CheckError> {
        let mut issues = BTreeMap::new();

        for (idx, column) in table.columns().iter().enumerate() {
            if table.column_is_numeric(idx) {
                continue;
            }
            let mut units = BTreeSet::new();
            for cell in table.column(idx) {
                if is_missing_cell(cell) {
                    continue;
                }
                if let Some(caps) = unit_pattern().captures(cell) {
                    units.insert(caps[2].to_lowercase());
                }
            }
            if units.len() > 1 {
                let joined = units.into_iter().collect::<Vec<_>>().join(", ");
                issues.insert(column.clone(), format!("Mixed units detected: {joined}"));
            }
        }

        if issues.is_empty() {
            Ok(CheckOutcome::Text("No unit issues".to_string()))
        } else {
            Ok(CheckOutcome::PerColumn(issues))
        }
    }
}
