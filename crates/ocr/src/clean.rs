use std::sync::OnceLock;

use regex::Regex;

use crate::config::{CleanerConfig, ConfigError, Correction};

fn re_ampersand() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"(\w)&(\w)").expect("invalid regex"))
}

fn re_multi_space() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r" {2,}").expect("invalid regex"))
}

struct CompiledRule {
    regex: Regex,
    replacement: String,
}

/// Normalizes recognizer text: known misreads, glued tokens, `&` spacing, runs of spaces.
///
/// Passes run in a fixed order; each one sees the output of the previous.
pub struct TextCleaner {
    corrections: Vec<Correction>,
    rules: Vec<CompiledRule>,
}

impl Default for TextCleaner {
    fn default() -> Self {
        Self::new(&CleanerConfig::default()).expect("built-in spacing rules must compile")
    }
}

impl TextCleaner {
    pub fn new(config: &CleanerConfig) -> Result<Self, ConfigError> {
        let rules = config
            .spacing_rules
            .iter()
            .map(|r| {
                let regex = Regex::new(&r.pattern).map_err(|source| ConfigError::Regex {
                    pattern: r.pattern.clone(),
                    source,
                })?;
                Ok(CompiledRule { regex, replacement: r.replacement.clone() })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self { corrections: config.corrections.clone(), rules })
    }

    pub fn clean(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        // Literal substring replacement, so a key inside a longer word still matches.
        let mut cleaned = text.to_string();
        for c in &self.corrections {
            if !c.wrong.is_empty() && cleaned.contains(c.wrong.as_str()) {
                cleaned = cleaned.replace(c.wrong.as_str(), &c.right);
            }
        }

        for rule in &self.rules {
            cleaned = rule.regex.replace_all(&cleaned, rule.replacement.as_str()).into_owned();
        }

        // Matches cannot overlap, so "a&b&c" needs a second sweep for the middle pair.
        while re_ampersand().is_match(&cleaned) {
            cleaned = re_ampersand().replace_all(&cleaned, "${1} & ${2}").into_owned();
        }

        re_multi_space().replace_all(&cleaned, " ").trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpacingRule;

    fn clean(text: &str) -> String {
        TextCleaner::default().clean(text)
    }

    #[test]
    fn empty_input_is_unchanged() {
        assert_eq!(clean(""), "");
    }

    #[test]
    fn dictionary_fixes_known_misreads() {
        assert_eq!(clean("Subtotai $10.00"), "Subtotal $10.00");
        assert_eq!(clean("Totai 4.50"), "Total 4.50");
        assert_eq!(clean("TAx 0.40"), "Tax 0.40");
        assert_eq!(clean("QTY 2"), "Qty 2");
    }

    #[test]
    fn dictionary_replaces_inside_words() {
        assert_eq!(clean("Bigltem"), "BigItem");
    }

    #[test]
    fn digit_glued_to_items_or_units() {
        assert_eq!(clean("3Items"), "3 Items");
        assert_eq!(clean("12units left"), "12 units left");
        assert_eq!(clean("1Item"), "1 Item");
    }

    #[test]
    fn closing_paren_glued_to_capitalized_word() {
        assert_eq!(clean("(2)Apples"), "(2) Apples");
        // Two letters is too short to count as a word.
        assert_eq!(clean("(2)Ab"), "(2)Ab");
    }

    #[test]
    fn lowercase_glued_to_summary_keywords() {
        assert_eq!(clean("FoodTotal $5.00"), "Food Total $5.00");
        assert_eq!(clean("SalesTax 0.80"), "Sales Tax 0.80");
        assert_eq!(clean("groceriesSubtotal 9.00"), "groceries Subtotal 9.00");
        assert_eq!(clean("itemTOTAL 1.00"), "item TOTAL 1.00");
    }

    #[test]
    fn subtotal_is_not_split() {
        assert_eq!(clean("Subtotal $10.00"), "Subtotal $10.00");
        assert_eq!(clean("subtotal $10.00"), "subtotal $10.00");
        assert_eq!(clean("SubTotal $10.00"), "Subtotal $10.00");
        assert_eq!(clean("Syntax"), "Syntax");
    }

    #[test]
    fn ampersand_gets_spaces() {
        assert_eq!(clean("Salt&Pepper"), "Salt & Pepper");
        assert_eq!(clean("a&b&c"), "a & b & c");
        assert_eq!(clean("Fish & Chips"), "Fish & Chips");
    }

    #[test]
    fn whitespace_is_collapsed_and_trimmed() {
        assert_eq!(clean("  Milk    $3.50  "), "Milk $3.50");
    }

    #[test]
    fn cleaning_is_idempotent() {
        let cleaner = TextCleaner::default();
        for s in [
            "Subtotai $10.00",
            "a&b&c&d&e",
            "3Items(2)ApplesFoodTotal",
            "  ltems   QTY  ",
            "SalesTAx 1.00",
            "Fish&Chips  x2",
            "",
        ] {
            let once = cleaner.clean(s);
            assert_eq!(cleaner.clean(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn custom_tables_replace_builtins() {
        let cleaner = TextCleaner::new(&CleanerConfig {
            corrections: vec![Correction { wrong: "0range".into(), right: "Orange".into() }],
            spacing_rules: vec![SpacingRule { pattern: r"(\d)(kg)".into(), replacement: "${1} ${2}".into() }],
        })
        .unwrap();
        assert_eq!(cleaner.clean("0range 2kg"), "Orange 2 kg");
        // Built-in corrections are gone.
        assert_eq!(cleaner.clean("Totai"), "Totai");
    }

    #[test]
    fn invalid_rule_is_reported() {
        let err = TextCleaner::new(&CleanerConfig {
            corrections: vec![],
            spacing_rules: vec![SpacingRule { pattern: "(unclosed".into(), replacement: "".into() }],
        })
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::Regex { ref pattern, .. } if pattern == "(unclosed"));
    }
}
