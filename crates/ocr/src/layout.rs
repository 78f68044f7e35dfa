//! Column-first table reconstruction.
//!
//! Columns are found once over the whole page, each column is cut into cards by
//! vertical gaps, and row `r` of the table is the `r`-th card of every column.

use std::sync::Arc;

use slipscan_core::Fragment;

use crate::cards::CardClusterer;
use crate::clean::TextCleaner;
use crate::columns::ColumnDetector;
use crate::config::LayoutConfig;
use crate::types::{Card, LayoutResult, TableRow};

pub struct LayoutReconstructor {
    config: LayoutConfig,
    detector: ColumnDetector,
    cleaner: Arc<TextCleaner>,
}

impl Default for LayoutReconstructor {
    fn default() -> Self {
        Self::new(LayoutConfig::default(), Arc::new(TextCleaner::default()))
    }
}

impl LayoutReconstructor {
    pub fn new(config: LayoutConfig, cleaner: Arc<TextCleaner>) -> Self {
        let detector = ColumnDetector::new(&config);
        Self { config, detector, cleaner }
    }

    pub fn reconstruct(&self, fragments: &[Fragment]) -> LayoutResult {
        if fragments.is_empty() {
            return LayoutResult::default();
        }

        let bands = self.detector.detect(fragments);
        let column_count = bands.len();

        // Column membership is decided here and nowhere else.
        let mut columns: Vec<Vec<&Fragment>> = vec![Vec::new(); column_count];
        for fragment in fragments {
            columns[self.detector.assign(&bands, fragment)].push(fragment);
        }
        tracing::debug!(
            "Fragments per column: {:?}",
            columns.iter().map(Vec::len).collect::<Vec<_>>()
        );

        let clusterer = CardClusterer::for_document(fragments, &self.config);
        let column_cards: Vec<Vec<Card<'_>>> =
            columns.iter().map(|col| clusterer.cluster(col)).collect();
        tracing::debug!(
            "Cards per column: {:?}",
            column_cards.iter().map(Vec::len).collect::<Vec<_>>()
        );

        let row_count = column_cards.iter().map(Vec::len).max().unwrap_or(0);
        tracing::info!("Layout: {column_count} columns x {row_count} rows");

        let rows: Vec<TableRow> = (0..row_count)
            .map(|r| {
                let (cells, confidences) = column_cards
                    .iter()
                    .map(|cards| cards.get(r).map_or((String::new(), 0.0), |c| self.cell(c)))
                    .unzip();
                TableRow { cells, confidences }
            })
            .collect();

        // Blank rows stay in the table but not in the printable text.
        let reconstructed_text = rows
            .iter()
            .filter(|row| !row.is_blank())
            .map(TableRow::text)
            .collect::<Vec<_>>()
            .join("\n");

        LayoutResult { rows, column_count, row_count, reconstructed_text }
    }

    /// Card text in (y, x) reading order, cleaned; confidence is the card's best.
    fn cell(&self, card: &Card<'_>) -> (String, f32) {
        let mut ordered = card.fragments.clone();
        ordered.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
        let raw = ordered
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let confidence = ordered.iter().map(|f| f.confidence).fold(0.0f32, f32::max);
        (self.cleaner.clean(&raw), confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(text: &str, confidence: f32, x: f64, y: f64) -> Fragment {
        Fragment::new(text, confidence, x, y, 120.0, 20.0)
    }

    #[test]
    fn empty_input_is_empty_layout() {
        let layout = LayoutReconstructor::default().reconstruct(&[]);
        assert_eq!(layout.column_count, 0);
        assert_eq!(layout.row_count, 0);
        assert!(layout.rows.is_empty());
        assert_eq!(layout.reconstructed_text, "");
    }

    #[test]
    fn single_column_rows_follow_cards() {
        let fragments = vec![
            frag("Store A", 0.95, 0.0, 0.0),
            frag("Milk $3.50", 0.90, 0.0, 40.0),
            frag("Total $3.50", 0.85, 0.0, 80.0),
        ];
        let layout = LayoutReconstructor::default().reconstruct(&fragments);
        assert_eq!(layout.column_count, 1);
        // Gaps of 20 stay under 24, so all three lines form one card.
        assert_eq!(layout.row_count, 1);
        assert_eq!(layout.rows[0].cells, vec!["Store A Milk $3.50 Total $3.50"]);
        assert_eq!(layout.rows[0].confidences, vec![0.95]);
    }

    #[test]
    fn two_columns_two_cards_each() {
        let fragments = vec![
            frag("Name", 0.9, 0.0, 0.0),
            frag("Price", 0.8, 500.0, 0.0),
            frag("Coffee", 0.7, 0.0, 100.0),
            frag("$4.50", 0.6, 500.0, 100.0),
        ];
        let layout = LayoutReconstructor::default().reconstruct(&fragments);
        assert_eq!(layout.column_count, 2);
        assert_eq!(layout.row_count, 2);
        assert_eq!(layout.reconstructed_text, "Name\tPrice\nCoffee\t$4.50");
        for line in layout.reconstructed_text.lines() {
            assert_eq!(line.matches('\t').count(), 1);
        }
    }

    #[test]
    fn short_column_yields_empty_cells() {
        let fragments = vec![
            frag("A1", 0.9, 0.0, 0.0),
            frag("B1", 0.9, 600.0, 0.0),
            frag("A2", 0.9, 0.0, 100.0),
            frag("A3", 0.9, 0.0, 200.0),
        ];
        let layout = LayoutReconstructor::default().reconstruct(&fragments);
        assert_eq!(layout.row_count, 3);
        assert_eq!(layout.rows[2].cells, vec!["A3", ""]);
        assert_eq!(layout.rows[2].confidences, vec![0.9, 0.0]);
    }

    #[test]
    fn card_text_reads_top_down_then_left_right() {
        let fragments = vec![
            frag("world", 0.5, 60.0, 0.0),
            frag("second", 0.5, 0.0, 15.0),
            frag("hello", 0.9, 0.0, 0.0),
        ];
        let layout = LayoutReconstructor::default().reconstruct(&fragments);
        assert_eq!(layout.rows[0].cells, vec!["hello world second"]);
        assert_eq!(layout.rows[0].confidences, vec![0.9]);
    }

    #[test]
    fn cell_text_is_cleaned() {
        let fragments = vec![frag("Subtotai", 0.9, 0.0, 0.0), frag("$9.00", 0.9, 30.0, 0.0)];
        let layout = LayoutReconstructor::default().reconstruct(&fragments);
        assert_eq!(layout.rows[0].cells, vec!["Subtotal $9.00"]);
    }

    #[test]
    fn blank_rows_are_counted_but_not_printed() {
        let fragments = vec![
            frag("top", 0.9, 0.0, 0.0),
            frag("   ", 0.1, 0.0, 100.0),
            frag("bottom", 0.9, 0.0, 200.0),
        ];
        let layout = LayoutReconstructor::default().reconstruct(&fragments);
        assert_eq!(layout.row_count, 3);
        assert_eq!(layout.rows.len(), 3);
        assert_eq!(layout.reconstructed_text, "top\nbottom");
    }

    #[test]
    fn row_count_is_max_cards_across_columns() {
        let mut fragments: Vec<Fragment> = (0..4).map(|i| frag("L", 0.9, 0.0, i as f64 * 100.0)).collect();
        fragments.extend((0..2).map(|i| frag("R", 0.9, 700.0, i as f64 * 100.0)));
        let layout = LayoutReconstructor::default().reconstruct(&fragments);
        assert_eq!(layout.column_count, 2);
        assert_eq!(layout.row_count, 4);
        assert!(layout.rows.iter().all(|r| r.cells.len() == 2));
    }
}
