use std::collections::BTreeSet;

use slipscan_core::{median_or, Fragment};

use crate::config::LayoutConfig;
use crate::types::ColumnBand;

/// Splits the page into column bands by looking for large gaps between distinct
/// fragment x-starts.
#[derive(Debug, Clone)]
pub struct ColumnDetector {
    gap_factor: f64,
    min_gap: f64,
    tolerance: f64,
    fallback_width: f64,
}

impl Default for ColumnDetector {
    fn default() -> Self {
        Self::new(&LayoutConfig::default())
    }
}

impl ColumnDetector {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            gap_factor: config.column_gap_factor,
            min_gap: config.min_column_gap,
            tolerance: config.column_tolerance,
            fallback_width: config.fallback_width,
        }
    }

    /// `max(median_width * gap_factor, min_gap)`.
    pub fn gap_threshold(&self, fragments: &[Fragment]) -> f64 {
        let median_width = median_or(fragments.iter().map(|f| f.w), self.fallback_width);
        (median_width * self.gap_factor).max(self.min_gap)
    }

    /// Column bands sorted by `start_x`. Never empty: with no fragments, or no gap at
    /// or above the threshold, there is exactly one band.
    pub fn detect(&self, fragments: &[Fragment]) -> Vec<ColumnBand> {
        // x-starts are truncated to whole pixels before deduplication.
        let x_starts: Vec<i64> = fragments
            .iter()
            .map(|f| f.x as i64)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let Some(&first) = x_starts.first() else {
            return vec![ColumnBand { start_x: 0.0 }];
        };

        let threshold = self.gap_threshold(fragments);
        // x-starts saturate at the i64 range, so the difference must too.
        let gaps: Vec<(i64, i64)> = x_starts
            .windows(2)
            .map(|w| (w[1].saturating_sub(w[0]), w[1]))
            .collect();

        if tracing::enabled!(tracing::Level::DEBUG) {
            let mut largest: Vec<i64> = gaps.iter().map(|&(g, _)| g).collect();
            largest.sort_unstable_by(|a, b| b.cmp(a));
            largest.truncate(5);
            tracing::debug!("X gaps (largest 5): {largest:?}, threshold: {threshold:.0}px");
        }

        // Every qualifying gap opens a band, even when several are the same size.
        let bands: Vec<ColumnBand> = std::iter::once(first)
            .chain(
                gaps.iter()
                    .filter(|&&(gap, _)| gap as f64 >= threshold)
                    .map(|&(_, x)| x),
            )
            .map(|x| ColumnBand { start_x: x as f64 })
            .collect();

        tracing::debug!(
            "Column boundaries ({}): {:?}",
            bands.len(),
            bands.iter().map(|b| b.start_x).collect::<Vec<_>>()
        );
        bands
    }

    /// Index of the last band whose start, less the tolerance, is at or left of the
    /// fragment. Fragments left of every band fall into band 0.
    pub fn assign(&self, bands: &[ColumnBand], fragment: &Fragment) -> usize {
        bands
            .iter()
            .rposition(|b| fragment.x >= b.start_x - self.tolerance)
            .unwrap_or(0)
    }
}
