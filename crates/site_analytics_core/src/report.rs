//! Plain-text rendering of the daily analytics report.
//!
//! Each section renders from one [`QueryResult`]. A result with no data rows
//! (header only, or nothing at all) renders the section's fixed "no data"
//! sentence instead of an empty block.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::contract::{QueryResult, ReportSection};

pub const REPORT_TITLE: &str = "Website Analytics Report";
pub const SUBJECT_PREFIX: &str = "Website Analytics";
const RULE_WIDTH: usize = 50;
const MISSING_KEY: &str = "N/A";
const MISSING_COUNT: &str = "0";

/// Query results keyed by the section they feed.
pub type SectionResults = HashMap<ReportSection, QueryResult>;

pub fn no_data_message(section: ReportSection) -> &'static str {
    match section {
        ReportSection::Overview => "No traffic data available.",
        ReportSection::Yesterday => "No traffic yesterday.",
        ReportSection::TopPages => "No page data.",
        ReportSection::GeoDistribution => "No geographic data.",
        ReportSection::TopVisitors => "No visitor data.",
    }
}

pub fn section_title(section: ReportSection, yesterday: NaiveDate) -> String {
    match section {
        ReportSection::Overview => "ALL-TIME OVERVIEW".to_string(),
        ReportSection::Yesterday => format!("YESTERDAY ({})", yesterday.format("%Y-%m-%d")),
        ReportSection::TopPages => "TOP PAGES (All Time)".to_string(),
        ReportSection::GeoDistribution => "GEOGRAPHIC DISTRIBUTION".to_string(),
        ReportSection::TopVisitors => "TOP VISITORS".to_string(),
    }
}

pub fn report_subject(today: NaiveDate) -> String {
    format!("{SUBJECT_PREFIX} - {}", today.format("%Y-%m-%d"))
}

pub fn format_section(section: ReportSection, result: &QueryResult) -> String {
    if !result.has_data() {
        return no_data_message(section).to_string();
    }

    match section {
        ReportSection::Overview => {
            format_labelled_counts(result, &["Total Visits", "Unique Visitors", "Days Tracked"])
        }
        ReportSection::Yesterday => format_labelled_counts(result, &["Visits", "Unique Visitors"]),
        ReportSection::TopPages | ReportSection::TopVisitors => format_ranked(result, "visits"),
        ReportSection::GeoDistribution => format_ranked(result, "requests"),
    }
}

/// Reads counts positionally from the first data row.
fn format_labelled_counts(result: &QueryResult, labels: &[&str]) -> String {
    let row = result.first_data_row();
    labels
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let value = row.and_then(|row| row.cell(index)).unwrap_or(MISSING_COUNT);
            format!("{label}: {value}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_ranked(result: &QueryResult, unit: &str) -> String {
    result
        .data_rows()
        .iter()
        .map(|row| {
            let key = row.cell(0).unwrap_or(MISSING_KEY);
            let count = row.cell(1).unwrap_or(MISSING_COUNT);
            format!("{key}: {count} {unit}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders the full report body. Sections missing from `results` render as
/// "no data".
pub fn render_report(
    generated_at: DateTime<Utc>,
    yesterday: NaiveDate,
    results: &SectionResults,
    filtered_address_count: usize,
) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let empty = QueryResult::empty();
    let mut lines = vec![
        REPORT_TITLE.to_string(),
        format!(
            "Generated: {} UTC",
            generated_at.format("%Y-%m-%d %H:%M:%S")
        ),
    ];

    for section in ReportSection::ALL {
        lines.push(format!("\n{rule}"));
        lines.push(section_title(section, yesterday));
        lines.push(rule.clone());
        lines.push(format_section(
            section,
            results.get(&section).unwrap_or(&empty),
        ));
    }

    lines.push(format!(
        "\nFiltered IPs: {filtered_address_count} IP(s) excluded from stats"
    ));
    lines.join("\n")
}
