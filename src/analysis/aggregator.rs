//! Incident aggregation and statistics.
//!
//! This module turns a batch of raw incident records into the ranked
//! summary views shown by the dashboard: crime types, reporting areas
//! and a monthly time series.

use crate::models::{AggregationResult, CountEntry, DisplayCountEntry, RawRecord, TimeBucketEntry};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Maximum number of entries kept in the category and area views.
pub const TOP_N: usize = 15;

/// Labels longer than this are shortened for display.
pub const MAX_LABEL_CHARS: usize = 40;

/// Characters kept from a shortened label before the ellipsis.
pub const TRUNCATED_LABEL_CHARS: usize = 37;

/// Marker appended to a shortened label.
pub const ELLIPSIS: &str = "...";

/// Frequency table that remembers when each label was first seen.
#[derive(Debug, Default)]
struct Tally {
    counts: HashMap<String, (usize, usize)>,
}

impl Tally {
    fn add(&mut self, label: String) {
        let next = self.counts.len();
        self.counts.entry(label).or_insert((0, next)).0 += 1;
    }

    /// Entries by count descending; equal counts keep first-seen order.
    fn into_ranked(self) -> Vec<CountEntry> {
        let mut entries: Vec<_> = self.counts.into_iter().collect();
        entries.sort_by(|(_, (a_count, a_seen)), (_, (b_count, b_seen))| {
            b_count.cmp(a_count).then_with(|| a_seen.cmp(b_seen))
        });

        entries
            .into_iter()
            .map(|(label, (value, _))| CountEntry { label, value })
            .collect()
    }
}

/// Aggregate a batch of records into the dashboard summary views.
///
/// Never fails: records with missing fields are counted under
/// `"Unknown"`, and records without a usable report date are left out
/// of the time series only.
pub fn aggregate(records: &[RawRecord]) -> AggregationResult {
    let mut categories = Tally::default();
    let mut areas = Tally::default();
    let mut months: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_processed = 0;

    for record in records {
        categories.add(record.category());
        areas.add(record.area());

        if let Some(key) = record.reported_date().and_then(month_key) {
            *months.entry(key).or_default() += 1;
        }

        total_processed += 1;
    }

    let result = AggregationResult {
        by_category: top_display_entries(categories.into_ranked(), TOP_N),
        by_area: top_display_entries(areas.into_ranked(), TOP_N),
        over_time: months
            .into_iter()
            .map(|(period_key, value)| TimeBucketEntry { period_key, value })
            .collect(),
        total_processed,
    };

    debug!(
        "Aggregated {} records: {} categories, {} areas, {} months",
        result.total_processed,
        result.by_category.len(),
        result.by_area.len(),
        result.over_time.len()
    );

    result
}

/// Keep the first `n` ranked entries and attach display labels.
pub fn top_display_entries(ranked: Vec<CountEntry>, n: usize) -> Vec<DisplayCountEntry> {
    ranked
        .into_iter()
        .take(n)
        .map(|entry| DisplayCountEntry {
            display_label: display_label(&entry.label),
            full_label: entry.label,
            value: entry.value,
        })
        .collect()
}

/// Shorten a label to [`MAX_LABEL_CHARS`], counting characters, not bytes.
pub fn display_label(label: &str) -> String {
    if label.chars().count() > MAX_LABEL_CHARS {
        let head: String = label.chars().take(TRUNCATED_LABEL_CHARS).collect();
        format!("{}{}", head, ELLIPSIS)
    } else {
        label.to_string()
    }
}

/// `YYYY-MM` bucket for a report timestamp, if it parses.
pub fn month_key(value: &Value) -> Option<String> {
    let date = parse_reported_date(value)?;
    Some(date.format("%Y-%m").to_string())
}

/// Parse a report timestamp as delivered by the open-data API.
///
/// Strings may be RFC 3339, the SODA floating timestamp
/// (`2021-03-15T00:00:00.000`), a plain date, or the `MM/DD/YYYY`
/// forms of the CSV export. Numbers are epoch milliseconds (UTC).
/// Offset timestamps keep the calendar date they were written with.
pub fn parse_reported_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date_str(s.trim()),
        Value::Number(n) => {
            let millis = n.as_i64()?;
            DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.date_naive())
        }
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }

    // The written local date, not the UTC one.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%m/%d/%Y %I:%M:%S %p",
        "%m/%d/%Y %H:%M:%S",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.date());
        }
    }

    const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
}

/// Percentage of `total` represented by `value`.
pub fn share_of_total(value: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        value as f64 / total as f64 * 100.0
    }
}
