//! Markdown and JSON report generation.
//!
//! This module generates shareable dashboard reports from the
//! aggregation results and a sample of the raw records.

use super::table::{columns, project, render_markdown_table};
use crate::analysis::{share_of_total, TOP_N};
use crate::models::{DashboardReport, DisplayCountEntry, RawRecord, ReportMetadata, TimeBucketEntry};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(
    report: &DashboardReport,
    records: &[RawRecord],
    table_limit: usize,
) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Crime Incident Dashboard\n\n");

    // Metadata section
    output.push_str(&generate_metadata_section(&report.metadata, report.summary.total_processed));

    if report.summary.is_empty() {
        output.push_str("No records to display.\n\n");
        output.push_str(&generate_footer());
        return output;
    }

    let total = report.summary.total_processed;

    output.push_str(&generate_ranked_section(
        "Crime Types",
        "Crime Type",
        &report.summary.by_category,
        total,
    ));
    output.push_str(&generate_ranked_section(
        "Areas",
        "Area",
        &report.summary.by_area,
        total,
    ));
    output.push_str(&generate_time_section(
        &report.summary.over_time,
        report.summary.undated(),
    ));
    output.push_str(&generate_sample_section(records, table_limit));

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata, total_processed: usize) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(limit) = metadata.requested_limit {
        section.push_str(&format!("- **Requested Sample Size:** {}\n", limit));
    }
    section.push_str(&format!("- **Records Analyzed:** {}\n", total_processed));
    section.push('\n');

    section
}

/// Generate a ranked count table. Uses full labels; Markdown wraps them.
fn generate_ranked_section(
    title: &str,
    column: &str,
    entries: &[DisplayCountEntry],
    total: usize,
) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", title));
    section.push_str(&format!(
        "*Top {} of {} records analyzed (at most {} shown).*\n\n",
        entries.len(),
        total,
        TOP_N
    ));
    section.push_str(&format!("| # | {} | Count | Share |\n", column));
    section.push_str("|---:|:---|---:|---:|\n");

    for (rank, entry) in entries.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {} | {:.1}% |\n",
            rank + 1,
            entry.full_label.replace('|', "\\|"),
            entry.value,
            share_of_total(entry.value, total)
        ));
    }
    section.push('\n');

    section
}

/// Generate the monthly section.
fn generate_time_section(buckets: &[TimeBucketEntry], undated: usize) -> String {
    let mut section = String::new();

    section.push_str("## Reports per Month\n\n");

    if buckets.is_empty() {
        section.push_str("No records with a valid report date.\n\n");
    } else {
        section.push_str("| Month | Reports |\n");
        section.push_str("|:---|---:|\n");
        for bucket in buckets {
            section.push_str(&format!("| {} | {} |\n", bucket.period_key, bucket.value));
        }
        section.push('\n');
    }

    if undated > 0 {
        section.push_str(&format!(
            "*{} record(s) had no valid report date and are not shown by month.*\n\n",
            undated
        ));
    }

    section
}

/// Generate the raw record sample section.
fn generate_sample_section(records: &[RawRecord], table_limit: usize) -> String {
    let rows = project(records, table_limit);
    if rows.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Record Sample\n\n");
    section.push_str(&format!(
        "*First {} of {} records.*\n\n",
        rows.len(),
        records.len()
    ));
    section.push_str(&render_markdown_table(rows, &columns(rows)));
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by crimedash*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate;
    use chrono::Utc;
    use serde_json::json;

    fn sample_records() -> Vec<RawRecord> {
        vec![
            json!({ "dr_no": "1", "crm_cd_desc": "BURGLARY FROM VEHICLE", "area_name": "Hollywood", "date_rptd": "2021-03-15T00:00:00.000" }),
            json!({ "dr_no": "2", "crm_cd_desc": "BURGLARY FROM VEHICLE", "area_name": "Harbor", "date_rptd": "2021-04-01T00:00:00.000" }),
            json!({ "dr_no": "3", "area": "Harbor" }),
        ]
        .into_iter()
        .map(|v| serde_json::from_value(v).unwrap())
        .collect()
    }

    fn create_test_report(records: &[RawRecord]) -> DashboardReport {
        DashboardReport {
            metadata: ReportMetadata {
                source: "https://data.lacity.org/resource/2nrs-mtv8.json".to_string(),
                generated_at: Utc::now(),
                records_loaded: records.len(),
                requested_limit: Some(5000),
            },
            summary: aggregate(records),
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let records = sample_records();
        let report = create_test_report(&records);
        let markdown = generate_markdown_report(&report, &records, 2);

        assert!(markdown.contains("# Crime Incident Dashboard"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("- **Records Analyzed:** 3"));
        assert!(markdown.contains("| 1 | BURGLARY FROM VEHICLE | 2 | 66.7% |"));
        assert!(markdown.contains("| 1 | Harbor | 2 | 66.7% |"));
        assert!(markdown.contains("| 2021-03 | 1 |"));
        assert!(markdown.contains("1 record(s) had no valid report date"));
        assert!(markdown.contains("*First 2 of 3 records.*"));
    }

    #[test]
    fn test_markdown_report_empty() {
        let report = create_test_report(&[]);
        let markdown = generate_markdown_report(&report, &[], 10);

        assert!(markdown.contains("No records to display."));
        assert!(!markdown.contains("## Crime Types"));
    }

    #[test]
    fn test_generate_metadata_section() {
        let records = sample_records();
        let report = create_test_report(&records);
        let section = generate_metadata_section(&report.metadata, 3);

        assert!(section.contains("data.lacity.org"));
        assert!(section.contains("Requested Sample Size:** 5000"));
    }

    #[test]
    fn test_generate_json_report() {
        let records = sample_records();
        let report = create_test_report(&records);
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"byCategory\""));
        assert!(json.contains("\"fullLabel\": \"BURGLARY FROM VEHICLE\""));
        assert!(json.contains("\"totalProcessed\": 3"));
    }
}
