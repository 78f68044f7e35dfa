use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid spacing rule pattern '{pattern}': {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// All tunables for one pipeline. Every section and field is optional in TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub layout: LayoutConfig,
    pub cleaner: CleanerConfig,
    pub parser: ParserConfig,
}

impl PipelineConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

/// Geometry thresholds, in the pixel unit of the fragment coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Column gap threshold as a multiple of the median fragment width.
    pub column_gap_factor: f64,
    /// Floor for the column gap threshold.
    pub min_column_gap: f64,
    /// How far left of a band start a fragment may sit and still belong to it.
    pub column_tolerance: f64,
    /// Card gap threshold as a multiple of the median fragment height.
    pub row_gap_factor: f64,
    pub fallback_width: f64,
    pub fallback_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            column_gap_factor: 1.5,
            min_column_gap: 300.0,
            column_tolerance: 50.0,
            row_gap_factor: 1.2,
            fallback_width: 100.0,
            fallback_height: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub wrong: String,
    pub right: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpacingRule {
    pub pattern: String,
    /// Replacement in `regex` syntax (`${1}` for capture groups).
    pub replacement: String,
}

/// Text correction tables. Both lists are applied in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    pub corrections: Vec<Correction>,
    pub spacing_rules: Vec<SpacingRule>,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        let corrections = [
            ("Subtotai", "Subtotal"),
            ("SubTotal", "Subtotal"),
            ("Totai", "Total"),
            ("ltem", "Item"),
            ("ltems", "Items"),
            ("QTy", "Qty"),
            ("QTY", "Qty"),
            ("Prlce", "Price"),
            ("Arnount", "Amount"),
            ("TAx", "Tax"),
            ("TaX", "Tax"),
        ];
        let spacing_rules = [
            // Count glued to a unit word: "3Items" -> "3 Items"
            (r"(?i)(\d)(items?)\b", "${1} ${2}"),
            (r"(?i)(\d)(units?)\b", "${1} ${2}"),
            // ")Apples" -> ") Apples"
            (r"\)([A-Z][a-z]{2,})", ") ${1}"),
            // Summary keyword glued to a word: "FoodTotal" -> "Food Total".
            // The keyword must start upper-case so "Subtotal" and "Syntax" stay whole.
            (r"([a-z])(T(?i:otal))\b", "${1} ${2}"),
            (r"([a-z])(S(?i:ubtotal))\b", "${1} ${2}"),
            (r"([a-z])(T(?i:ax))\b", "${1} ${2}"),
        ];
        Self {
            corrections: corrections
                .into_iter()
                .map(|(wrong, right)| Correction { wrong: wrong.into(), right: right.into() })
                .collect(),
            spacing_rules: spacing_rules
                .into_iter()
                .map(|(pattern, replacement)| SpacingRule {
                    pattern: pattern.into(),
                    replacement: replacement.into(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// How many top fragments are considered for the store name.
    pub store_name_window: usize,
    /// Lines containing any of these (lower-case) never become line items.
    pub excluded_keywords: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            store_name_window: 3,
            excluded_keywords: ["subtotal", "tax", "total", "change", "cash", "card", "credit", "debit"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}
