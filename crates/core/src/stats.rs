/// Upper median of `values` (the element at `len / 2` after sorting), or `fallback`
/// when there are no values.
pub fn median_or(values: impl IntoIterator<Item = f64>, fallback: f64) -> f64 {
    let mut sorted: Vec<f64> = values.into_iter().collect();
    if sorted.is_empty() {
        return fallback;
    }
    sorted.sort_by(f64::total_cmp);
    sorted[sorted.len() / 2]
}
