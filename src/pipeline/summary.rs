//! Summary generation: a QC-analyst narration of the check results.

use crate::checks::{CheckOutcome, CheckRun};
use crate::llm::{ChatClient, LlmError};

/// Summary instruction; `{warning}` and `{results}` are filled in per run.
pub const SUMMARY_PROMPT_TEMPLATE: &str = "\
You are a Quality Control (QC) analyst.\n\
\n\
Below are the results of various checks on a batch production record, including:\n\
- Completeness Check\n\
- Anomaly Detection\n\
- KPI Summary (with mean, std, and outliers for the last 30 batches)\n\
- Unit Conversion Check (flags columns with mixed or inconsistent units)\n\
\n\
{warning}\
Your task:\n\
1. Summarize any issues or anomalies found, including unit conversion issues.\n\
2. Mention KPI trends, such as abnormal values or deviations.\n\
3. Suggest whether the batch is acceptable, should be reviewed, or rejected.\n\
\n\
QC Check Results:\n\
{results}";

/// Ask the model to narrate the check results into a recommendation.
pub fn generate_summary(
    chat: &dyn ChatClient,
    results: &[CheckRun],
) -> Result<String, LlmError> {
    let (block, warning) = render_results_block(results);
    let warning_line = match warning {
        Some(w) => format!("There is a warning about the KPI statistics: [KPI WARNING]: {w}\n"),
        None => String::new(),
    };
    let prompt = SUMMARY_PROMPT_TEMPLATE
        .replace("{warning}", &warning_line)
        .replace("{results}", &block);
    chat.complete(&prompt)
}

/// Render the result set as text blocks for the prompt. A KPI warning is
/// lifted out and returned separately so the prompt can flag it up front,
/// leaving only the stats in the rendered block.
pub fn render_results_block(results: &[CheckRun]) -> (String, Option<String>) {
    let mut warning = None;
    let blocks: Vec<String> = results
        .iter()
        .map(|run| {
            let rendered = match &run.outcome {
                CheckOutcome::Kpi(report) => {
                    if warning.is_none() {
                        warning.clone_from(&report.warning);
                    }
                    serde_json::to_string(&report.stats).unwrap_or_else(|_| "{}".into())
                }
                other => other.render_text(),
            };
            format!("{}:\n{}", run.name, rendered)
        })
        .collect();
    (blocks.join("\n"), warning)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{KpiReport, KpiStats};
    use crate::llm::MockChatClient;
    use std::collections::BTreeMap;

    fn kpi_run(warning: Option<&str>) -> CheckRun {
        let mut stats = BTreeMap::new();
        stats.insert(
            "Temperature".to_string(),
            KpiStats {
                mean: 72.1,
                std: 0.2,
                min: 71.8,
                max: 72.5,
                outliers: 1,
            },
        );
        CheckRun {
            name: "kpi_summary_check".into(),
            outcome: CheckOutcome::Kpi(KpiReport {
                warning: warning.map(String::from),
                stats,
            }),
        }
    }

    #[test]
    fn results_render_as_named_blocks() {
        let results = vec![CheckRun {
            name: "completeness_check".into(),
            outcome: CheckOutcome::Text("All fields complete".into()),
        }];
        let (block, warning) = render_results_block(&results);
        assert_eq!(block, "completeness_check:\nAll fields complete");
        assert!(warning.is_none());
    }

    #[test]
    fn kpi_warning_is_lifted_out_of_the_block() {
        let results = vec![kpi_run(Some("Only 4 historical records found"))];
        let (block, warning) = render_results_block(&results);
        assert_eq!(warning.as_deref(), Some("Only 4 historical records found"));
        assert!(block.contains("\"Temperature\""));
        assert!(!block.contains("Only 4 historical records"));
    }

    #[test]
    fn summary_returns_model_text() {
        let chat = MockChatClient::new("Batch acceptable; review the Yield column.");
        let results = vec![kpi_run(None)];
        let summary = generate_summary(&chat, &results).unwrap();
        assert_eq!(summary, "Batch acceptable; review the Yield column.");
    }

    #[test]
    fn transport_failure_propagates() {
        let chat = MockChatClient::failing("model offline");
        let results = vec![kpi_run(None)];
        assert!(generate_summary(&chat, &results).is_err());
    }
}
