//! On-demand reordering of rows by their rendered percentage.

use crate::core::page::{PageAdapter, RowId};
use regex::Regex;
use std::sync::LazyLock;

static PERCENTAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([-+]?[0-9]*\.?[0-9]+)%\)").unwrap());

/// Percentage shown in a result cell, or 0 when there is none. Non-finite
/// percentages (`Infinity`, `NaN`) also count as 0.
pub fn extract_percentage(text: &str) -> f64 {
    PERCENTAGE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}

/// Stable-sorts the page's rows ascending by percentage. Cell contents are
/// left untouched.
pub fn sort_by_percentage(page: &mut dyn PageAdapter) {
    let mut keyed: Vec<(RowId, f64)> = page
        .list_rows()
        .into_iter()
        .map(|row| {
            let pct = page
                .result_cell(row)
                .map_or(0.0, |cell| extract_percentage(&cell.text));
            (row, pct)
        })
        .collect();

    keyed.sort_by(|a, b| a.1.total_cmp(&b.1));
    let order: Vec<RowId> = keyed.into_iter().map(|(row, _)| row).collect();
    page.reorder_rows(&order);
}
