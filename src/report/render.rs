//! HTML rendering of a QC run: summary, checks table, batch data.
//!
//! The summary comes back from the chat model as light markdown; mail
//! clients want HTML, so a small line-based converter handles headers,
//! emphasis, and lists. Everything user- or model-supplied is escaped.

use std::sync::OnceLock;

use regex::Regex;

use crate::checks::{CheckOutcome, CheckRun};
use crate::table::BatchTable;

/// Render the full report body for one processed batch sheet.
pub fn render_report(summary: &str, results: &[CheckRun], table: &BatchTable) -> String {
    let kpi_warning = kpi_warning_banner(results);
    let checks = checks_table(results);
    let data = table_to_html(table);
    let summary_html = markdown_to_html(summary);
    let generated = chrono::Utc::now().format("%Y-%m-%d %H:%M UTC");

    format!(
        "<h1 style='color:#2d6cdf;'>Zipp QC Report</h1>\n\
         <div style='font-size:12px;color:#888;'>Generated {generated}</div>\n\
         <h2>Summary</h2>\n{kpi_warning}\
         <div style='margin-bottom:20px;'>{summary_html}</div>\n\
         <h2>QC Checks</h2>\n{checks}\n\
         <h2>Batch Data</h2>\n{data}"
    )
}

/// Orange banner shown when the KPI check ran on a short history window.
fn kpi_warning_banner(results: &[CheckRun]) -> String {
    let warning = results
        .iter()
        .filter(|r| r.name.to_lowercase().contains("kpi"))
        .find_map(|r| match &r.outcome {
            CheckOutcome::Kpi(report) => report.warning.as_deref(),
            _ => None,
        });
    match warning {
        Some(w) => format!(
            "<div style='color:#b85c00; font-weight:bold; margin-bottom:10px;'>\u{26a0} {}</div>\n",
            escape_html(w)
        ),
        None => String::new(),
    }
}

fn checks_table(results: &[CheckRun]) -> String {
    let mut html = String::from(
        "<table border='1' cellpadding='6' cellspacing='0' \
         style='border-collapse:collapse;margin-bottom:20px;'>\n\
         <tr><th>Check</th><th>Result</th></tr>\n",
    );
    for run in results {
        let rendered = match &run.outcome {
            // The warning is surfaced in the banner; the table carries the
            // stats themselves.
            CheckOutcome::Kpi(report) => {
                serde_json::to_string(&report.stats).unwrap_or_else(|_| "{}".into())
            }
            other => other.render_text(),
        };
        html.push_str(&format!(
            "<tr><td><b>{}</b></td><td>{}</td></tr>\n",
            escape_html(&run.name),
            escape_html(&rendered)
        ));
    }
    html.push_str("</table>\n");

    if results.iter().any(|r| r.name.contains("completeness")) {
        html.push_str(
            "<div style='font-size:12px;color:#888;margin-bottom:10px;'>\
             Note: The completeness check flags as missing: empty fields and \
             the string 'MISSING' (case-insensitive).</div>\n",
        );
    }
    html
}

/// The extracted batch table as a plain bordered HTML table.
pub fn table_to_html(table: &BatchTable) -> String {
    let mut html = String::from(
        "<table border='1' cellpadding='6' cellspacing='0' style='border-collapse:collapse;'>\n<tr>",
    );
    for col in table.columns() {
        html.push_str(&format!("<th>{}</th>", escape_html(col)));
    }
    html.push_str("</tr>\n");
    for row in table.rows() {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape_html(cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
    html
}

/// Convert the summary's light markdown to HTML: `#`-headers, `**bold**`,
/// `*italic*`, numbered and bulleted lists. Input is escaped first.
pub fn markdown_to_html(text: &str) -> String {
    #[derive(PartialEq)]
    enum ListState {
        None,
        Ordered,
        Unordered,
    }

    let mut out = String::new();
    let mut state = ListState::None;

    let close = |out: &mut String, state: &mut ListState| {
        match state {
            ListState::Ordered => out.push_str("</ol>\n"),
            ListState::Unordered => out.push_str("</ul>\n"),
            ListState::None => {}
        }
        *state = ListState::None;
    };

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            close(&mut out, &mut state);
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("### ") {
            close(&mut out, &mut state);
            out.push_str(&format!("<h3>{}</h3>\n", inline_markdown(rest)));
        } else if let Some(rest) = trimmed.strip_prefix("## ") {
            close(&mut out, &mut state);
            out.push_str(&format!("<h2>{}</h2>\n", inline_markdown(rest)));
        } else if let Some(rest) = trimmed.strip_prefix("# ") {
            close(&mut out, &mut state);
            out.push_str(&format!("<h1>{}</h1>\n", inline_markdown(rest)));
        } else if let Some(item) = numbered_item(trimmed) {
            if state != ListState::Ordered {
                close(&mut out, &mut state);
                out.push_str("<ol>\n");
                state = ListState::Ordered;
            }
            out.push_str(&format!("<li>{}</li>\n", inline_markdown(item)));
        } else if let Some(item) = bullet_item(trimmed) {
            if state != ListState::Unordered {
                close(&mut out, &mut state);
                out.push_str("<ul>\n");
                state = ListState::Unordered;
            }
            out.push_str(&format!("<li>{}</li>\n", inline_markdown(item)));
        } else {
            close(&mut out, &mut state);
            out.push_str(&format!("{}<br>\n", inline_markdown(trimmed)));
        }
    }
    close(&mut out, &mut state);
    out
}

fn numbered_item(line: &str) -> Option<&str> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| Regex::new(r"^\d+\.\s+(.*)$").expect("valid list regex"));
    re.captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

fn bullet_item(line: &str) -> Option<&str> {
    line.strip_prefix("- ").or_else(|| line.strip_prefix("* "))
}

/// Escape, then apply `**bold**` and `*italic*`.
fn inline_markdown(text: &str) -> String {
    static BOLD: OnceLock<Regex> = OnceLock::new();
    static ITALIC: OnceLock<Regex> = OnceLock::new();
    let bold = BOLD.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid bold regex"));
    let italic = ITALIC.get_or_init(|| Regex::new(r"\*(.+?)\*").expect("valid italic regex"));

    let escaped = escape_html(text);
    let with_bold = bold.replace_all(&escaped, "<b>$1</b>");
    italic.replace_all(&with_bold, "<i>$1</i>").into_owned()
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
