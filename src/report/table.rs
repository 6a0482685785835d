//! Raw record table projection.
//!
//! Truncates the record sample to a display limit, derives the column
//! list from the first record and renders cells, with `"N/A"` standing
//! in for absent values.

use crate::models::RawRecord;
use serde_json::Value;

/// Text shown for absent or null values.
pub const MISSING_CELL: &str = "N/A";

/// Widest a text-table column may grow, in characters.
pub const MAX_COLUMN_WIDTH: usize = 28;

/// The first `limit` records.
pub fn project(records: &[RawRecord], limit: usize) -> &[RawRecord] {
    &records[..records.len().min(limit)]
}

/// Column names: the first record's fields in source order.
pub fn columns(records: &[RawRecord]) -> Vec<String> {
    records
        .first()
        .map(|r| r.keys().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Display text for one cell.
pub fn cell(record: &RawRecord, column: &str) -> String {
    match record.get(column) {
        None => MISSING_CELL.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// One page of `records` (pages start at 1). Out-of-range pages are empty.
pub fn page(records: &[RawRecord], page: usize, page_size: usize) -> &[RawRecord] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= records.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(records.len());
    &records[start..end]
}

/// Number of pages needed for `len` rows.
pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        0
    } else {
        len.div_ceil(page_size)
    }
}

/// Clip text to `width` characters on a single line.
fn clip(text: &str, width: usize) -> String {
    let flat = text.replace(['\n', '\r', '\t'], " ");
    if flat.chars().count() <= width {
        flat
    } else if width <= 3 {
        flat.chars().take(width).collect()
    } else {
        let head: String = flat.chars().take(width - 3).collect();
        format!("{}...", head)
    }
}

/// Render rows as a fixed-width text table.
pub fn render_text_table(rows: &[RawRecord], columns: &[String]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            columns
                .iter()
                .map(|c| clip(&cell(r, c), MAX_COLUMN_WIDTH))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let header = c.chars().count().min(MAX_COLUMN_WIDTH);
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .fold(header, usize::max)
        })
        .collect();

    let format_row = |values: &[String]| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<width$}", v, width = *w))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let headers: Vec<String> = columns.iter().map(|c| clip(c, MAX_COLUMN_WIDTH)).collect();
    let mut output = String::new();
    output.push_str(&format_row(headers.as_slice()));
    output.push('\n');
    output.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    output.push('\n');
    for row in &cells {
        output.push_str(&format_row(row.as_slice()));
        output.push('\n');
    }

    output
}

/// Render rows as a Markdown table.
pub fn render_markdown_table(rows: &[RawRecord], columns: &[String]) -> String {
    fn escape(s: &str) -> String {
        s.replace('|', "\\|").replace(['\n', '\r'], " ")
    }
    let mut table = String::new();

    table.push_str(&format!(
        "| {} |\n",
        columns.iter().map(|c| escape(c)).collect::<Vec<_>>().join(" | ")
    ));
    table.push_str(&format!(
        "|{}\n",
        columns.iter().map(|_| ":---|").collect::<String>()
    ));
    for row in rows {
        table.push_str(&format!(
            "| {} |\n",
            columns
                .iter()
                .map(|c| escape(&cell(row, c)))
                .collect::<Vec<_>>()
                .join(" | ")
        ));
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(n: usize) -> Vec<RawRecord> {
        (0..n)
            .map(|i| {
                serde_json::from_value(json!({
                    "dr_no": format!("{}", 100 + i),
                    "crm_cd_desc": "THEFT",
                    "area_name": "Central",
                }))
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_project_truncates() {
        let all = records(10);
        assert_eq!(project(&all, 3).len(), 3);
        assert_eq!(project(&all, 50).len(), 10);
        assert!(project(&[], 5).is_empty());
    }

    #[test]
    fn test_columns_from_first_record() {
        assert_eq!(
            columns(&records(2)),
            vec!["dr_no", "crm_cd_desc", "area_name"]
        );
        assert!(columns(&[]).is_empty());
    }

    #[test]
    fn test_cell_missing_is_na() {
        let r: RawRecord =
            serde_json::from_value(json!({ "a": "x", "b": null, "c": 4.5 })).unwrap();
        assert_eq!(cell(&r, "a"), "x");
        assert_eq!(cell(&r, "b"), "N/A");
        assert_eq!(cell(&r, "c"), "4.5");
        assert_eq!(cell(&r, "missing"), "N/A");
    }

    #[test]
    fn test_paging() {
        let all = records(10);
        assert_eq!(page(&all, 1, 4).len(), 4);
        assert_eq!(page(&all, 3, 4).len(), 2);
        assert!(page(&all, 4, 4).is_empty());
        assert!(page(&all, 0, 4).is_empty());
        assert_eq!(page_count(10, 4), 3);
        assert_eq!(page_count(0, 4), 0);
    }

    #[test]
    fn test_render_text_table() {
        let mut rows = records(2);
        rows.push(serde_json::from_value(json!({ "dr_no": "999" })).unwrap());
        let cols = columns(&rows);
        let table = render_text_table(&rows, &cols);
        let lines: Vec<_> = table.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("dr_no"));
        assert!(lines[1].starts_with("------"));
        assert!(lines[4].contains("N/A"));
    }

    #[test]
    fn test_clip_long_values() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("abcdefghijkl", 8), "abcde...");
        assert_eq!(clip("line\nbreak", 20), "line break");
    }

    #[test]
    fn test_render_markdown_table_escapes_pipes() {
        let rows: Vec<RawRecord> =
            vec![serde_json::from_value(json!({ "mocodes": "0416|0334" })).unwrap()];
        let table = render_markdown_table(&rows, &columns(&rows));
        assert!(table.contains("0416\\|0334"));
        assert!(table.starts_with("| mocodes |"));
    }
}
