//! Anomaly detection: z-score outliers within the current batch.

use std::collections::BTreeMap;

use super::{Check, CheckContext, CheckError, CheckOutcome};
use crate::table::{mean, sample_std, BatchTable};

/// Z-score magnitude above which a value counts as an outlier.
const Z_THRESHOLD: f64 = 3.0;

/// Flags numeric columns holding values more than 3 standard deviations
/// from that column's own mean. Sample standard deviation throughout.
pub struct AnomalyCheck;

impl Check for AnomalyCheck {
    fn name(&self) -> &'static str {
        "anomaly_check"
    }

    fn run(&self, table: &BatchTable, _ctx: &CheckContext) -> Result<CheckOutcome, CheckError> {
        let mut flagged = BTreeMap::new();

        for (idx, column) in table.columns().iter().enumerate() {
            if !table.column_is_numeric(idx) {
                continue;
            }
            let values = table.numeric_values(idx);
            let Some(std) = sample_std(&values) else {
                continue;
            };
            let mean = mean(&values);
            let outliers = values
                .iter()
                .filter(|v| ((*v - mean) / std).abs() > Z_THRESHOLD)
                .count();
            if outliers > 0 {
                flagged.insert(column.clone(), format!("{outliers} outlier(s)"));
            }
        }

        if flagged.is_empty() {
            Ok(CheckOutcome::Text("No anomalies".to_string()))
        } else {
            Ok(CheckOutcome::PerColumn(flagged))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn ctx() -> CheckContext {
        CheckContext {
            history_dir: PathBuf::from("unused"),
        }
    }

    fn single_column(name: &str, values: &[&str]) -> BatchTable {
        BatchTable::new(
            vec![name.into()],
            values.iter().map(|v| vec![v.to_string()]).collect(),
        )
        .unwrap()
    }

    #[test]
    fn tight_cluster_has_no_anomalies() {
        let table = single_column(
            "Temp",
            &["71.9", "72.0", "72.1", "72.0", "71.8", "72.2", "72.0"],
        );
        let out = AnomalyCheck.run(&table, &ctx()).unwrap();
        assert_eq!(out, CheckOutcome::Text("No anomalies".into()));
    }

    #[test]
    fn one_extreme_value_flags_exactly_one() {
        // 29 values near 10 plus one at 1000: even with the outlier pulling
        // the mean and std, its z-score stays well above 3.
        let mut values: Vec<String> = (0..29).map(|i| format!("{}", 10.0 + (i % 3) as f64 * 0.1)).collect();
        values.push("1000".to_string());
        let refs: Vec<&str> = values.iter().map(String::as_str).collect();
        let table = single_column("Pressure", &refs);

        let out = AnomalyCheck.run(&table, &ctx()).unwrap();
        match out {
            CheckOutcome::PerColumn(map) => {
                assert_eq!(map.get("Pressure").map(String::as_str), Some("1 outlier(s)"));
                assert_eq!(map.len(), 1);
            }
            other => panic!("expected per-column outcome, got {other:?}"),
        }
    }

    #[test]
    fn textual_columns_are_ignored() {
        let table = BatchTable::new(
            vec!["Operator".into()],
            vec![vec!["anna".into()], vec!["ben".into()]],
        )
        .unwrap();
        let out = AnomalyCheck.run(&table, &ctx()).unwrap();
        assert_eq!(out, CheckOutcome::Text("No anomalies".into()));
    }

    #[test]
    fn constant_column_has_no_anomalies() {
        let table = single_column("pH", &["7.0", "7.0", "7.0", "7.0"]);
        let out = AnomalyCheck.run(&table, &ctx()).unwrap();
        assert_eq!(out, CheckOutcome::Text("No anomalies".into()));
    }

    #[test]
    fn single_value_column_is_skipped() {
        let table = single_column("Volume", &["480"]);
        let out = AnomalyCheck.run(&table, &ctx()).unwrap();
        assert_eq!(out, CheckOutcome::Text("No anomalies".into()));
    }
}
