//! Data models for the crime dashboard.
//!
//! This module contains the raw incident record as delivered by the
//! open-data API and the summary structures produced by aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Source field holding the crime-type description.
pub const CATEGORY_FIELD: &str = "crm_cd_desc";

/// Primary source field holding the reporting area name.
pub const AREA_FIELD: &str = "area_name";

/// Secondary area field, present in older exports of the dataset.
pub const AREA_FALLBACK_FIELD: &str = "area";

/// Source field holding the report timestamp.
pub const REPORTED_DATE_FIELD: &str = "date_rptd";

/// Label used when a grouping field is missing.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// A single incident record, field name to scalar value.
///
/// Fields keep the order they had in the source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: Map<String, Value>,
}

impl RawRecord {
    /// Wraps an already-decoded JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Builds a record from `(field, text)` pairs.
    #[cfg(test)]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        Self { fields }
    }

    /// Field names in source order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Raw value of a field. Null counts as absent.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    /// Text of a field, or `None` when absent, null or empty.
    ///
    /// Numbers and booleans are rendered as their JSON text.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.get(field)? {
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Crime-type label, falling back to [`UNKNOWN_LABEL`].
    pub fn category(&self) -> String {
        self.text(CATEGORY_FIELD)
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
    }

    /// Area label: primary field, then the fallback field, then [`UNKNOWN_LABEL`].
    pub fn area(&self) -> String {
        self.text(AREA_FIELD)
            .or_else(|| self.text(AREA_FALLBACK_FIELD))
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
    }

    /// Unparsed report timestamp.
    pub fn reported_date(&self) -> Option<&Value> {
        self.get(REPORTED_DATE_FIELD)
    }
}

/// A grouped label and how many records carried it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountEntry {
    pub label: String,
    pub value: usize,
}

/// A ranked count with a label shortened for compact rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayCountEntry {
    /// Label clipped to the display width, with an ellipsis when clipped.
    pub display_label: String,
    /// The untruncated label.
    pub full_label: String,
    pub value: usize,
}

/// Number of records reported in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBucketEntry {
    /// `YYYY-MM`
    pub period_key: String,
    pub value: usize,
}

/// Summary views computed from one batch of records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    /// Top crime types, most frequent first.
    pub by_category: Vec<DisplayCountEntry>,
    /// Top reporting areas, most frequent first.
    pub by_area: Vec<DisplayCountEntry>,
    /// Monthly counts in chronological order.
    pub over_time: Vec<TimeBucketEntry>,
    /// Every input record, including ones with missing fields.
    pub total_processed: usize,
}

impl AggregationResult {
    /// Records that had no usable report date.
    pub fn undated(&self) -> usize {
        let dated: usize = self.over_time.iter().map(|b| b.value).sum();
        self.total_processed.saturating_sub(dated)
    }

    /// Busiest month; the earliest one wins a tie.
    pub fn peak_month(&self) -> Option<&TimeBucketEntry> {
        self.over_time
            .iter()
            .fold(None, |best: Option<&TimeBucketEntry>, b| match best {
                Some(cur) if cur.value >= b.value => Some(cur),
                _ => Some(b),
            })
    }

    /// Whether there was nothing to aggregate.
    pub fn is_empty(&self) -> bool {
        self.total_processed == 0
    }
}

/// Where a batch of records came from and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Endpoint URL or input file path.
    pub source: String,
    /// When the records were loaded.
    pub generated_at: DateTime<Utc>,
    /// Number of records loaded.
    pub records_loaded: usize,
    /// Sample size that was requested, if fetched over HTTP.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_limit: Option<usize>,
}

/// A full dashboard export: metadata plus the summary views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub metadata: ReportMetadata,
    pub summary: AggregationResult,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_category_fallback() {
        assert_eq!(record(json!({})).category(), "Unknown");
        assert_eq!(record(json!({ "crm_cd_desc": "" })).category(), "Unknown");
        assert_eq!(record(json!({ "crm_cd_desc": null })).category(), "Unknown");
        assert_eq!(
            record(json!({ "crm_cd_desc": "BATTERY - SIMPLE ASSAULT" })).category(),
            "BATTERY - SIMPLE ASSAULT"
        );
    }

    #[test]
    fn test_area_uses_fallback_field() {
        assert_eq!(record(json!({ "area_name": "Central" })).area(), "Central");
        assert_eq!(
            record(json!({ "area_name": "Central", "area": "01" })).area(),
            "Central"
        );
        assert_eq!(record(json!({ "area": "01" })).area(), "01");
        assert_eq!(record(json!({ "area_name": null, "area": 7 })).area(), "7");
        assert_eq!(record(json!({ "dr_no": "1" })).area(), "Unknown");
    }

    #[test]
    fn test_keys_keep_source_order() {
        let r = record(json!({ "zeta": 1, "alpha": 2, "mid": 3 }));
        assert_eq!(r.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_undated_and_peak_month() {
        let result = AggregationResult {
            by_category: vec![],
            by_area: vec![],
            over_time: vec![
                TimeBucketEntry { period_key: "2021-01".into(), value: 3 },
                TimeBucketEntry { period_key: "2021-02".into(), value: 5 },
                TimeBucketEntry { period_key: "2021-03".into(), value: 5 },
            ],
            total_processed: 15,
        };
        assert_eq!(result.undated(), 2);
        assert_eq!(result.peak_month().map(|b| b.period_key.as_str()), Some("2021-02"));
        assert!(AggregationResult::default().peak_month().is_none());
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let json = serde_json::to_string(&AggregationResult::default()).unwrap();
        assert!(json.contains("\"byCategory\""));
        assert!(json.contains("\"overTime\""));
        assert!(json.contains("\"totalProcessed\""));
    }
}
