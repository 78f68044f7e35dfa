pub mod cards;
pub mod clean;
pub mod columns;
pub mod config;
pub mod extract;
pub mod layout;
pub mod pipeline;
pub mod price;
pub mod recognizer;
pub mod types;

pub use cards::CardClusterer;
pub use clean::TextCleaner;
pub use columns::ColumnDetector;
pub use config::{CleanerConfig, ConfigError, LayoutConfig, ParserConfig, PipelineConfig};
pub use extract::{LineKind, ReceiptFieldParser};
pub use layout::LayoutReconstructor;
pub use pipeline::{spawn_intake_watcher, Analyzer, OcrResult, PipelineError, ReceiptPipeline};
pub use price::PriceExtractor;
pub use recognizer::{JsonRecognizer, MockRecognizer, OcrBackend, OcrError};
pub use types::{
    Card, CellBlock, ColumnBand, LayoutResult, LayoutSummary, LineItem, ParsedReceipt, TableRow,
};
