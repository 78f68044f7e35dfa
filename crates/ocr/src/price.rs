use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Optional `$`, digits, a `.` and exactly two digits. Only `.` is a decimal separator.
fn re_price() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"\$?\d+\.\d{2}").expect("invalid regex"))
}

/// Pulls monetary values out of free text.
pub struct PriceExtractor;

impl PriceExtractor {
    /// Value of the first price in `text`.
    ///
    /// The pattern has no thousands separator, so `"$1,234.56"` matches only `234.56`.
    pub fn extract(text: &str) -> Option<f64> {
        let m = re_price().find(text)?;
        parse_amount_str(m.as_str())
    }

    pub fn contains_price(text: &str) -> bool {
        re_price().is_match(text)
    }

    /// `text` with every price removed and the remainder trimmed.
    pub fn strip(text: &str) -> String {
        re_price().replace_all(text, "").trim().to_string()
    }
}

fn parse_amount_str(s: &str) -> Option<f64> {
    let clean = s.replace('$', "").replace(',', "");
    Decimal::from_str(&clean).ok()?.to_f64()
}
