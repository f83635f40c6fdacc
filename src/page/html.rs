//! HTML-backed sales page.
//!
//! The page is parsed once into an owned table model. The refresh cycle then
//! mutates that model through [`PageAdapter`].

use crate::core::config::PageLayout;
use crate::core::page::{PageAdapter, ResultCell, RowId};
use anyhow::{Result, anyhow};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::sync::LazyLock;
use tracing::{debug, trace};

static HEADER_CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th, td").unwrap());
static BODY_CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRow {
    pub item_id: Option<String>,
    pub cells: Vec<String>,
    pub result: Option<ResultCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesPage {
    pub header: Vec<String>,
    pub result_header: Option<String>,
    pub rows: Vec<SalesRow>,
    #[serde(skip)]
    region_text: Option<String>,
    #[serde(skip)]
    comparison_column: usize,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector '{}': {:?}", css, e))
}

/// Visible text of an element with whitespace runs collapsed.
fn element_text(element: ElementRef) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

impl SalesPage {
    pub fn parse(html: &str, layout: &PageLayout) -> Result<Self> {
        let header_sel = selector(&layout.header_row)?;
        let rows_sel = selector(&layout.body_rows)?;
        let region_sel = selector(&layout.region)?;

        let document = Html::parse_document(html);

        let header = match document.select(&header_sel).next() {
            Some(row) => row.select(&HEADER_CELL).map(element_text).collect(),
            None => {
                debug!(selector = %layout.header_row, "No header row found");
                Vec::new()
            }
        };

        let rows: Vec<SalesRow> = document
            .select(&rows_sel)
            .map(|row| {
                let item_id = row
                    .value()
                    .attr(&layout.id_attribute)
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(String::from);
                let cells = row.select(&BODY_CELL).map(element_text).collect();
                trace!(?item_id, "Parsed sales row");
                SalesRow {
                    item_id,
                    cells,
                    result: None,
                }
            })
            .collect();

        let region_text = document.select(&region_sel).next().map(element_text);

        debug!(
            rows = rows.len(),
            has_region = region_text.is_some(),
            "Parsed sales page"
        );

        Ok(Self {
            header,
            result_header: None,
            rows,
            region_text,
            comparison_column: layout.comparison_column,
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl PageAdapter for SalesPage {
    fn list_rows(&self) -> Vec<RowId> {
        (0..self.rows.len()).map(RowId).collect()
    }

    fn identifier(&self, row: RowId) -> Option<&str> {
        self.rows.get(row.0)?.item_id.as_deref()
    }

    fn comparison_text(&self, row: RowId) -> Option<&str> {
        self.rows
            .get(row.0)?
            .cells
            .get(self.comparison_column)
            .map(String::as_str)
    }

    fn result_cell(&self, row: RowId) -> Option<&ResultCell> {
        self.rows.get(row.0)?.result.as_ref()
    }

    fn get_or_create_result_cell(&mut self, row: RowId) -> Option<&mut ResultCell> {
        let row = self.rows.get_mut(row.0)?;
        Some(row.result.get_or_insert_with(ResultCell::default))
    }

    fn ensure_result_header(&mut self, title: &str) {
        if self.result_header.is_none() {
            self.result_header = Some(title.to_string());
        }
    }

    fn region_snapshot(&self) -> Option<String> {
        self.region_text.clone()
    }

    fn reorder_rows(&mut self, order: &[RowId]) {
        let mut taken: Vec<Option<SalesRow>> = self.rows.drain(..).map(Some).collect();
        let mut reordered = Vec::with_capacity(taken.len());
        for id in order {
            if let Some(row) = taken.get_mut(id.0).and_then(Option::take) {
                reordered.push(row);
            }
        }
        // Rows missing from `order` keep their relative position at the end
        reordered.extend(taken.into_iter().flatten());
        self.rows = reordered;
    }
}
