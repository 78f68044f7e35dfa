use std::sync::Arc;

use slipscan_core::Fragment;

use crate::clean::TextCleaner;
use crate::config::ParserConfig;
use crate::price::PriceExtractor;
use crate::types::{LineItem, ParsedReceipt};

// ── Line classification ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Subtotal,
    Tax,
    Total,
    Item,
}

/// A cleaned fragment with the facts every rule looks at.
struct Line<'t> {
    text: &'t str,
    lower: String,
    price: Option<f64>,
}

type Predicate = for<'a> fn(&Line<'a>, &[String]) -> bool;

/// Checked top to bottom; the first rule that holds decides the line.
/// "subtotal" must come before "total", which it contains.
const RULES: [(LineKind, Predicate); 4] = [
    (LineKind::Subtotal, is_subtotal),
    (LineKind::Tax, is_tax),
    (LineKind::Total, is_total),
    (LineKind::Item, is_item),
];

fn is_subtotal(line: &Line<'_>, _: &[String]) -> bool {
    line.price.is_some() && line.lower.contains("subtotal")
}

fn is_tax(line: &Line<'_>, _: &[String]) -> bool {
    line.price.is_some() && line.lower.contains("tax")
}

fn is_total(line: &Line<'_>, _: &[String]) -> bool {
    line.price.is_some() && line.lower.contains("total") && !line.lower.contains("subtotal")
}

fn is_item(line: &Line<'_>, excluded: &[String]) -> bool {
    line.price.is_some()
        && !line.text.is_empty()
        && !excluded.iter().any(|k| line.lower.contains(k.as_str()))
}

// ── Parser ───────────────────────────────────────────────────────────────────

/// Reads store name, line items and summary amounts from raw fragments.
pub struct ReceiptFieldParser {
    store_name_window: usize,
    /// Lower-cased at construction.
    excluded_keywords: Vec<String>,
    cleaner: Arc<TextCleaner>,
}

impl Default for ReceiptFieldParser {
    fn default() -> Self {
        Self::new(&ParserConfig::default(), Arc::new(TextCleaner::default()))
    }
}

impl ReceiptFieldParser {
    pub fn new(config: &ParserConfig, cleaner: Arc<TextCleaner>) -> Self {
        Self {
            store_name_window: config.store_name_window,
            excluded_keywords: config.excluded_keywords.iter().map(|k| k.to_lowercase()).collect(),
            cleaner,
        }
    }

    pub fn parse(&self, fragments: &[Fragment]) -> ParsedReceipt {
        let mut sorted: Vec<&Fragment> = fragments.iter().collect();
        sorted.sort_by(|a, b| a.y.total_cmp(&b.y));

        let cleaned: Vec<String> = sorted.iter().map(|f| self.cleaner.clean(&f.text)).collect();

        let mut receipt = ParsedReceipt {
            store_name: self.store_name(&cleaned),
            ..Default::default()
        };

        // Later matches overwrite earlier ones for the summary fields.
        for text in &cleaned {
            let Some((kind, price)) = self.classify_line(text) else {
                continue;
            };
            match kind {
                LineKind::Subtotal => receipt.subtotal = Some(price),
                LineKind::Tax => receipt.tax = Some(price),
                LineKind::Total => receipt.total = Some(price),
                LineKind::Item => {
                    let name = PriceExtractor::strip(text);
                    if !name.is_empty() {
                        receipt.items.push(LineItem::single(name, price));
                    }
                }
            }
        }

        tracing::debug!(
            "Parsed receipt: store={:?}, items={}, subtotal={:?}, tax={:?}, total={:?}",
            receipt.store_name,
            receipt.items.len(),
            receipt.subtotal,
            receipt.tax,
            receipt.total
        );
        receipt
    }

    /// Classify one already-cleaned line. `None` when no rule applies.
    pub fn classify_line(&self, text: &str) -> Option<(LineKind, f64)> {
        let line = Line {
            text,
            lower: text.to_lowercase(),
            price: PriceExtractor::extract(text),
        };
        let price = line.price?;
        RULES
            .iter()
            .find(|(_, applies)| applies(&line, self.excluded_keywords.as_slice()))
            .map(|&(kind, _)| (kind, price))
    }

    /// First of the top lines that has text and no price.
    fn store_name(&self, cleaned: &[String]) -> Option<String> {
        cleaned
            .iter()
            .take(self.store_name_window)
            .find(|t| !t.is_empty() && !PriceExtractor::contains_price(t))
            .cloned()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, y: f64) -> Fragment {
        Fragment::new(text, 0.9, 0.0, y, 200.0, 20.0)
    }

    fn parse(fragments: &[Fragment]) -> ParsedReceipt {
        ReceiptFieldParser::default().parse(fragments)
    }

    // ── Store name ────────────────────────────────────────────────────────────

    #[test]
    fn store_name_is_first_line_without_price() {
        let r = parse(&[line("$1.00", 0.0), line("  ", 10.0), line("CORNER  SHOP", 20.0)]);
        assert_eq!(r.store_name.as_deref(), Some("CORNER SHOP"));
    }

    #[test]
    fn store_name_only_looks_at_top_three() {
        let r = parse(&[
            line("$1.00", 0.0),
            line("$2.00", 10.0),
            line("$3.00", 20.0),
            line("Late Header", 30.0),
        ]);
        assert_eq!(r.store_name, None);
    }

    #[test]
    fn store_name_uses_vertical_order() {
        let r = parse(&[line("Milk $3.50", 40.0), line("Store A", 0.0)]);
        assert_eq!(r.store_name.as_deref(), Some("Store A"));
    }

    // ── Summary fields ────────────────────────────────────────────────────────

    #[test]
    fn subtotal_does_not_set_total() {
        let r = parse(&[line("Subtotal $10.00", 0.0)]);
        assert_eq!(r.subtotal, Some(10.00));
        assert_eq!(r.total, None);
    }

    #[test]
    fn summary_fields_are_separated() {
        let r = parse(&[
            line("STORE", 0.0),
            line("Subtotal $45.00", 40.0),
            line("Tax $3.60", 80.0),
            line("Total $48.60", 120.0),
        ]);
        assert_eq!(r.subtotal, Some(45.00));
        assert_eq!(r.tax, Some(3.60));
        assert_eq!(r.total, Some(48.60));
        assert!(r.items.is_empty());
    }

    #[test]
    fn later_summary_line_wins() {
        let r = parse(&[line("Total $5.00", 0.0), line("TOTAL $6.25", 50.0)]);
        assert_eq!(r.total, Some(6.25));
    }

    #[test]
    fn keyword_without_price_is_ignored() {
        let r = parse(&[line("Total", 0.0), line("Tax included", 20.0)]);
        assert_eq!(r.total, None);
        assert_eq!(r.tax, None);
    }

    #[test]
    fn misread_keyword_is_cleaned_first() {
        let r = parse(&[line("Subtotai 12.00", 0.0), line("Totai 13.00", 30.0)]);
        assert_eq!(r.subtotal, Some(12.00));
        assert_eq!(r.total, Some(13.00));
    }

    // ── Items ─────────────────────────────────────────────────────────────────

    #[test]
    fn priced_line_becomes_item() {
        let r = parse(&[line("Store A", 0.0), line("Milk $3.50", 40.0), line("Total $3.50", 80.0)]);
        assert_eq!(r.items, vec![LineItem::single("Milk", 3.50)]);
        assert_eq!(r.items[0].quantity, 1);
        assert_eq!(r.items[0].total_price, 3.50);
    }

    #[test]
    fn excluded_keywords_are_not_items() {
        let r = parse(&[
            line("Cash $20.00", 0.0),
            line("Change $1.50", 10.0),
            line("Credit Card 4.00", 20.0),
        ]);
        assert!(r.items.is_empty());
    }

    #[test]
    fn zero_amount_still_counts_as_price() {
        let r = parse(&[line("Tax $0.00", 0.0), line("Bag fee 0.00", 20.0)]);
        assert_eq!(r.tax, Some(0.0));
        assert_eq!(r.items, vec![LineItem::single("Bag fee", 0.0)]);
    }

    #[test]
    fn price_only_line_is_not_item() {
        let r = parse(&[line("$7.99", 0.0)]);
        assert!(r.items.is_empty());
    }

    #[test]
    fn quantity_prefix_stays_in_name() {
        let r = parse(&[line("2 x Bagel $5.00", 0.0)]);
        assert_eq!(r.items, vec![LineItem::single("2 x Bagel", 5.00)]);
    }

    #[test]
    fn custom_exclusions_apply() {
        let parser = ReceiptFieldParser::new(
            &ParserConfig { store_name_window: 3, excluded_keywords: vec!["TIP".into()] },
            Arc::new(TextCleaner::default()),
        );
        let r = parser.parse(&[line("Tip $2.00", 0.0), line("Cash $20.00", 10.0)]);
        assert_eq!(r.items, vec![LineItem::single("Cash", 20.00)]);
    }

    // ── Classification order ──────────────────────────────────────────────────

    #[test]
    fn classify_line_first_match_wins() {
        let p = ReceiptFieldParser::default();
        assert_eq!(p.classify_line("Subtotal $1.00"), Some((LineKind::Subtotal, 1.00)));
        assert_eq!(p.classify_line("Total Tax $2.00"), Some((LineKind::Tax, 2.00)));
        assert_eq!(p.classify_line("Grand total 3.00"), Some((LineKind::Total, 3.00)));
        assert_eq!(p.classify_line("Bread 4.00"), Some((LineKind::Item, 4.00)));
        assert_eq!(p.classify_line("Debit 5.00"), None);
        assert_eq!(p.classify_line("Bread"), None);
    }

    #[test]
    fn empty_input_has_all_fields_absent() {
        assert_eq!(parse(&[]), ParsedReceipt::default());
    }
}
