use slipscan_core::{median_or, Fragment};

use crate::config::LayoutConfig;
use crate::types::Card;

/// Groups one column's fragments into cards wherever the vertical gap reaches
/// `y_gap_threshold`.
#[derive(Debug, Clone, Copy)]
pub struct CardClusterer {
    y_gap_threshold: f64,
}

impl CardClusterer {
    pub fn new(y_gap_threshold: f64) -> Self {
        Self { y_gap_threshold }
    }

    /// Threshold derived from the median height of every fragment in the document, so
    /// all columns split on the same gap.
    pub fn for_document(fragments: &[Fragment], config: &LayoutConfig) -> Self {
        let median_height = median_or(fragments.iter().map(|f| f.h), config.fallback_height);
        Self::new(median_height * config.row_gap_factor)
    }

    pub fn y_gap_threshold(&self) -> f64 {
        self.y_gap_threshold
    }

    /// Cards top to bottom. The gap is measured from the lowest bottom edge seen so far
    /// in the current card, not just the previous fragment's.
    pub fn cluster<'a>(&self, column: &[&'a Fragment]) -> Vec<Card<'a>> {
        let mut sorted: Vec<&'a Fragment> = column.to_vec();
        sorted.sort_by(|a, b| a.y.total_cmp(&b.y));

        let mut iter = sorted.into_iter();
        let Some(first) = iter.next() else {
            return Vec::new();
        };

        let mut cards = Vec::new();
        let mut current = vec![first];
        let mut current_bottom = first.bottom();

        for fragment in iter {
            if fragment.y - current_bottom >= self.y_gap_threshold {
                cards.push(Card { fragments: std::mem::replace(&mut current, vec![fragment]) });
                current_bottom = fragment.bottom();
            } else {
                current.push(fragment);
                current_bottom = current_bottom.max(fragment.bottom());
            }
        }
        cards.push(Card { fragments: current });
        cards
    }
}
