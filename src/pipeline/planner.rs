//! Check planner: the chat model picks which checks to run.
//!
//! The reply is expected to be a JSON list of check names, or `"*"` for
//! everything. Anything else, including transport failures, falls back to
//! running all checks. That fallback is deliberate and load-bearing: a
//! flaky planner must never reduce QC coverage.

use serde_json::Value;

use crate::checks::CheckSelection;
use crate::llm::ChatClient;

/// Planner instruction; `{table}` is replaced with the extracted CSV text.
pub const PLANNER_PROMPT_TEMPLATE: &str = "\
You are a QC planner agent. Given the table below, return a JSON list of \
checks to run:\n\
[\"completeness_check\", \"anomaly_check\"] or \"*\" for all.\n\
TABLE:\n{table}";

/// Ask the model which checks to run over this table.
pub fn plan_checks(chat: &dyn ChatClient, table_csv: &str) -> CheckSelection {
    let prompt = PLANNER_PROMPT_TEMPLATE.replace("{table}", table_csv);
    match chat.complete(&prompt) {
        Ok(reply) => parse_selection(&reply),
        Err(e) => {
            tracing::warn!(error = %e, "Planner request failed, running all checks");
            CheckSelection::All
        }
    }
}

/// Interpret the planner's reply. Only a JSON array of names narrows the
/// selection; `"*"` anywhere, or output that is not valid JSON, means all.
pub fn parse_selection(reply: &str) -> CheckSelection {
    let Ok(value) = serde_json::from_str::<Value>(reply.trim()) else {
        return CheckSelection::All;
    };
    match value {
        Value::String(s) if s == "*" => CheckSelection::All,
        Value::Array(items) => {
            if items.is_empty() || items.iter().any(|v| v == "*") {
                return CheckSelection::All;
            }
            let names = items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            CheckSelection::Named(names)
        }
        _ => CheckSelection::All,
    }
}
