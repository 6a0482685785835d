//! Terminal bar charts for the summary views.

use crate::analysis::share_of_total;
use crate::models::{DisplayCountEntry, TimeBucketEntry};

const BAR_CHAR: char = '█';

/// One labelled bar.
struct Bar<'a> {
    label: &'a str,
    value: usize,
}

/// Bar length scaled against the largest value. Non-zero values get at least one cell.
fn bar_len(value: usize, max: usize, width: usize) -> usize {
    if max == 0 || value == 0 {
        return 0;
    }
    // value <= max, so the quotient fits back into usize
    let scaled = value as u128 * width as u128 / max as u128;
    usize::try_from(scaled).unwrap_or(width).max(1)
}

fn render_bars(bars: &[Bar<'_>], total: Option<usize>, width: usize) -> String {
    let max = bars.iter().map(|b| b.value).max().unwrap_or(0);
    let label_width = bars
        .iter()
        .map(|b| b.label.chars().count())
        .max()
        .unwrap_or(0);

    let mut output = String::new();
    for bar in bars {
        let filled: String = std::iter::repeat(BAR_CHAR)
            .take(bar_len(bar.value, max, width))
            .collect();
        let line = match total {
            Some(total) => format!(
                "  {:<lw$}  {} {} ({:.1}%)",
                bar.label,
                filled,
                bar.value,
                share_of_total(bar.value, total),
                lw = label_width
            ),
            None => format!(
                "  {:<lw$}  {} {}",
                bar.label,
                filled,
                bar.value,
                lw = label_width
            ),
        };
        output.push_str(line.trim_end());
        output.push('\n');
    }

    output
}

/// Horizontal bar chart of ranked counts, using display labels.
///
/// When `total` is given each bar also shows its share of it.
pub fn ranked_chart(entries: &[DisplayCountEntry], total: Option<usize>, width: usize) -> String {
    let bars: Vec<Bar<'_>> = entries
        .iter()
        .map(|e| Bar {
            label: &e.display_label,
            value: e.value,
        })
        .collect();
    render_bars(&bars, total, width)
}

/// Monthly time series as one bar per month, oldest first.
pub fn time_series_chart(buckets: &[TimeBucketEntry], width: usize) -> String {
    let bars: Vec<Bar<'_>> = buckets
        .iter()
        .map(|b| Bar {
            label: &b.period_key,
            value: b.value,
        })
        .collect();
    render_bars(&bars, None, width)
}
