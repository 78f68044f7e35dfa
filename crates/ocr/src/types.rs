use serde::{Deserialize, Serialize};
use slipscan_core::Fragment;

/// Left edge of one logical column. A band covers `[start_x, next.start_x)`; the last
/// band is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnBand {
    pub start_x: f64,
}

/// Vertically contiguous fragments within one column, in clustering order.
#[derive(Debug, Clone, PartialEq)]
pub struct Card<'a> {
    pub fragments: Vec<&'a Fragment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    /// One cell per column; empty when that column has no card at this row.
    pub cells: Vec<String>,
    /// Parallel to `cells`; 0.0 for empty cells.
    pub confidences: Vec<f32>,
}

impl TableRow {
    /// Cells joined with tabs.
    pub fn text(&self) -> String {
        self.cells.join("\t")
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

/// A non-empty table cell with its position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellBlock {
    pub text: String,
    pub confidence: f32,
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub rows: Vec<TableRow>,
    pub column_count: usize,
    pub row_count: usize,
    /// Non-blank rows, newline-joined, cells tab-separated.
    pub reconstructed_text: String,
}

impl LayoutResult {
    pub fn blocks(&self) -> Vec<CellBlock> {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(row, r)| {
                r.cells
                    .iter()
                    .zip(&r.confidences)
                    .enumerate()
                    .filter(|(_, (text, _))| !text.is_empty())
                    .map(move |(col, (text, &confidence))| CellBlock {
                        text: text.clone(),
                        confidence,
                        row,
                        col,
                    })
            })
            .collect()
    }

    /// Best plain-text rendering: the table text for multi-column layouts, otherwise
    /// the fragments joined top-to-bottom, left-to-right.
    pub fn display_text(&self, fragments: &[Fragment]) -> String {
        if self.column_count > 1 {
            return self.reconstructed_text.clone();
        }
        let mut ordered: Vec<&Fragment> = fragments.iter().collect();
        ordered.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
        ordered
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn summary(&self) -> LayoutSummary {
        LayoutSummary {
            column_count: self.column_count,
            row_count: self.row_count,
            raw_text: self.reconstructed_text.clone(),
        }
    }
}

/// Wire form of a layout for downstream consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutSummary {
    pub column_count: usize,
    pub row_count: usize,
    pub raw_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    /// Always 1; quantity multipliers such as "2 x" are not parsed.
    pub quantity: u32,
    pub unit_price: f64,
    pub total_price: f64,
}

impl LineItem {
    pub fn single(name: impl Into<String>, price: f64) -> Self {
        Self { name: name.into(), quantity: 1, unit_price: price, total_price: price }
    }
}

/// Financial fields read off a receipt. Absent fields serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedReceipt {
    pub store_name: Option<String>,
    pub items: Vec<LineItem>,
    pub subtotal: Option<f64>,
    pub tax: Option<f64>,
    pub total: Option<f64>,
}
