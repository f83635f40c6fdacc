//! Page adapter abstraction over the sales table being annotated

use serde::Serialize;

/// Position of a row in the table at the time it was listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RowId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellColor {
    Green,
    Red,
}

/// The cell this tool adds to each row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultCell {
    pub text: String,
    pub color: Option<CellColor>,
}

impl ResultCell {
    pub fn clear(&mut self) {
        self.text.clear();
        self.color = None;
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Read access to the rows of a sales table, plus the few writes the
/// refresh cycle is allowed to make.
pub trait PageAdapter {
    fn list_rows(&self) -> Vec<RowId>;

    /// Item identifier of the row, if it carries one.
    fn identifier(&self, row: RowId) -> Option<&str>;

    /// Displayed text of the row's comparison price cell.
    fn comparison_text(&self, row: RowId) -> Option<&str>;

    fn result_cell(&self, row: RowId) -> Option<&ResultCell>;

    /// Returns the row's result cell, attaching an empty one first if the
    /// row has none. `None` only when the row does not exist.
    fn get_or_create_result_cell(&mut self, row: RowId) -> Option<&mut ResultCell>;

    /// Adds the result column header once.
    fn ensure_result_header(&mut self, title: &str);

    /// Visible text of the change-detection region, if present.
    fn region_snapshot(&self) -> Option<String>;

    /// Reorders rows so that `order[i]` becomes the i-th row. Cell contents
    /// travel with their rows.
    fn reorder_rows(&mut self, order: &[RowId]);
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Debug, Clone, Default)]
    pub(crate) struct MemoryRow {
        pub id: Option<String>,
        pub comparison: Option<String>,
        pub result: Option<ResultCell>,
    }

    /// In-memory page used to drive the refresh cycle without HTML.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct MemoryPage {
        pub rows: Vec<MemoryRow>,
        pub header: Option<String>,
        pub region: Option<String>,
        pub header_calls: usize,
    }

    impl MemoryPage {
        pub fn with_rows(rows: &[(Option<&str>, &str)]) -> Self {
            MemoryPage {
                rows: rows
                    .iter()
                    .map(|(id, comparison)| MemoryRow {
                        id: id.map(String::from),
                        comparison: Some(comparison.to_string()),
                        result: None,
                    })
                    .collect(),
                ..Default::default()
            }
        }

        pub fn texts(&self) -> Vec<String> {
            self.rows
                .iter()
                .map(|r| r.result.as_ref().map(|c| c.text.clone()).unwrap_or_default())
                .collect()
        }
    }

    impl PageAdapter for MemoryPage {
        fn list_rows(&self) -> Vec<RowId> {
            (0..self.rows.len()).map(RowId).collect()
        }

        fn identifier(&self, row: RowId) -> Option<&str> {
            self.rows.get(row.0)?.id.as_deref()
        }

        fn comparison_text(&self, row: RowId) -> Option<&str> {
            self.rows.get(row.0)?.comparison.as_deref()
        }

        fn result_cell(&self, row: RowId) -> Option<&ResultCell> {
            self.rows.get(row.0)?.result.as_ref()
        }

        fn get_or_create_result_cell(&mut self, row: RowId) -> Option<&mut ResultCell> {
            Some(self.rows.get_mut(row.0)?.result.get_or_insert_with(ResultCell::default))
        }

        fn ensure_result_header(&mut self, title: &str) {
            self.header_calls += 1;
            self.header.get_or_insert_with(|| title.to_string());
        }

        fn region_snapshot(&self) -> Option<String> {
            self.region.clone()
        }

        fn reorder_rows(&mut self, order: &[RowId]) {
            let rows = order.iter().filter_map(|id| self.rows.get(id.0).cloned()).collect();
            self.rows = rows;
        }
    }
}
