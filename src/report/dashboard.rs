//! Terminal dashboard rendering.
//!
//! The view mode and paging are passed in as a [`DashboardState`] value;
//! rendering reads nothing else.

use super::charts::{ranked_chart, time_series_chart};
use super::table::{columns, page, page_count, project, render_text_table};
use crate::cli::ViewMode;
use crate::config::DisplayConfig;
use crate::models::{AggregationResult, RawRecord};

/// Presentation state for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardState {
    pub view: ViewMode,
    /// Records available to the table view.
    pub table_limit: usize,
    /// 1-indexed table page.
    pub page: usize,
    pub page_size: usize,
    /// Cells used by the longest chart bar.
    pub bar_width: usize,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(&DisplayConfig::default(), 1)
    }
}

impl DashboardState {
    /// State from display settings and the requested table page.
    pub fn new(display: &DisplayConfig, page: usize) -> Self {
        Self {
            view: display.view,
            table_limit: display.table_limit,
            page,
            page_size: display.page_size,
            bar_width: display.bar_width,
        }
    }
}

/// Render the dashboard for the current state.
pub fn render_dashboard(
    state: &DashboardState,
    records: &[RawRecord],
    summary: &AggregationResult,
) -> String {
    let mut output = String::new();

    output.push_str("Crime Incident Dashboard\n");
    output.push_str("========================\n\n");
    output.push_str(&format!(
        "Total records analyzed: {}\n\n",
        summary.total_processed
    ));

    if summary.is_empty() {
        output.push_str("No records to display.\n");
        return output;
    }

    match state.view {
        ViewMode::Charts => output.push_str(&render_charts(state, summary)),
        ViewMode::Table => output.push_str(&render_table(state, records)),
    }

    output
}

fn shown_of(shown: usize, distinct_label: &str, total: usize) -> String {
    format!("(top {} {} of {} records analyzed)\n", shown, distinct_label, total)
}

fn render_charts(state: &DashboardState, summary: &AggregationResult) -> String {
    let total = summary.total_processed;
    let mut section = String::new();

    section.push_str("Crime Types\n");
    section.push_str(&shown_of(summary.by_category.len(), "types", total));
    section.push_str(&ranked_chart(&summary.by_category, None, state.bar_width));
    section.push('\n');

    section.push_str("Areas\n");
    section.push_str(&shown_of(summary.by_area.len(), "areas", total));
    section.push_str(&ranked_chart(&summary.by_area, Some(total), state.bar_width));
    section.push('\n');

    section.push_str("Reports per Month\n");
    if summary.over_time.is_empty() {
        section.push_str("  No records with a valid report date.\n");
    } else {
        section.push_str(&time_series_chart(&summary.over_time, state.bar_width));
        if let Some(peak) = summary.peak_month() {
            section.push_str(&format!(
                "  Busiest month: {} ({} reports)\n",
                peak.period_key, peak.value
            ));
        }
    }

    let undated = summary.undated();
    if undated > 0 {
        section.push_str(&format!(
            "  {} record(s) without a valid report date\n",
            undated
        ));
    }

    section
}

fn render_table(state: &DashboardState, records: &[RawRecord]) -> String {
    let projected = project(records, state.table_limit);
    let rows = page(projected, state.page, state.page_size);
    let pages = page_count(projected.len(), state.page_size);

    if rows.is_empty() {
        return format!(
            "Page {} is out of range ({} page(s) of {} rows).\n",
            state.page,
            pages,
            projected.len()
        );
    }

    let first = (state.page - 1) * state.page_size + 1;
    let last = first + rows.len() - 1;

    let mut section = render_text_table(rows, &columns(projected));
    section.push_str(&format!(
        "\nShowing rows {}-{} of {} (limit {}), page {} of {}\n",
        first,
        last,
        projected.len(),
        state.table_limit,
        state.page,
        pages
    ));
    section
}
