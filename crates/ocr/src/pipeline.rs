use serde::{Deserialize, Serialize};
use slipscan_core::{to_fragments, Fragment};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::clean::TextCleaner;
use crate::config::{ConfigError, PipelineConfig};
use crate::extract::ReceiptFieldParser;
use crate::layout::LayoutReconstructor;
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::{CellBlock, LayoutResult, LayoutSummary, ParsedReceipt};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
}

/// The result of a single receipt processing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    pub fragments: Vec<Fragment>,
    /// Table text for multi-column layouts, plain top-down text otherwise.
    pub raw_text: String,
    pub parsed: ParsedReceipt,
    pub layout: LayoutSummary,
    /// Non-empty table cells with their row and column.
    pub blocks: Vec<CellBlock>,
}

/// Both analysis passes over one fragment set, without the recognizer.
pub struct Analyzer {
    layout: LayoutReconstructor,
    parser: ReceiptFieldParser,
}

impl Default for Analyzer {
    fn default() -> Self {
        let cleaner = Arc::new(TextCleaner::default());
        Self {
            layout: LayoutReconstructor::new(Default::default(), Arc::clone(&cleaner)),
            parser: ReceiptFieldParser::new(&Default::default(), cleaner),
        }
    }
}

impl Analyzer {
    pub fn new(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let cleaner = Arc::new(TextCleaner::new(&config.cleaner)?);
        Ok(Self {
            layout: LayoutReconstructor::new(config.layout.clone(), Arc::clone(&cleaner)),
            parser: ReceiptFieldParser::new(&config.parser, cleaner),
        })
    }

    pub fn layout(&self, fragments: &[Fragment]) -> LayoutResult {
        self.layout.reconstruct(fragments)
    }

    pub fn parse(&self, fragments: &[Fragment]) -> ParsedReceipt {
        self.parser.parse(fragments)
    }

    /// Layout and field parsing run independently; the reconstructed text is not
    /// fed into the parser.
    pub fn analyze(&self, fragments: Vec<Fragment>) -> OcrResult {
        let layout = self.layout(&fragments);
        let parsed = self.parse(&fragments);
        let raw_text = layout.display_text(&fragments);
        OcrResult {
            blocks: layout.blocks(),
            layout: layout.summary(),
            raw_text,
            parsed,
            fragments,
        }
    }
}

/// Orchestrates: read → recognize → normalize → layout + field parsing.
pub struct ReceiptPipeline<R: OcrBackend> {
    recognizer: R,
    analyzer: Analyzer,
}

impl<R: OcrBackend> ReceiptPipeline<R> {
    pub fn new(recognizer: R) -> Self {
        Self { recognizer, analyzer: Analyzer::default() }
    }

    pub fn with_config(recognizer: R, config: &PipelineConfig) -> Result<Self, ConfigError> {
        Ok(Self { recognizer, analyzer: Analyzer::new(config)? })
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Process a file on disk.
    pub async fn process_file(&self, path: &Path) -> Result<OcrResult, PipelineError> {
        let bytes = tokio::fs::read(path).await?;
        self.process_bytes(&bytes)
    }

    /// Process raw recognizer input. No detections is not an error: the result is
    /// simply empty.
    pub fn process_bytes(&self, data: &[u8]) -> Result<OcrResult, PipelineError> {
        let detections = self.recognizer.recognize(data)?;
        tracing::info!("Detected {} text blocks", detections.len());
        Ok(self.analyzer.analyze(to_fragments(&detections)))
    }
}

// ── Watch-folder integration ──────────────────────────────────────────────────

/// Spawn a notify watcher on `watch_dir` that sends new file paths to `tx`.
/// The returned watcher must be kept alive for watching to continue.
pub fn spawn_intake_watcher(
    watch_dir: &Path,
    tx: mpsc::Sender<PathBuf>,
) -> notify::Result<impl notify::Watcher> {
    use notify::{EventKind, RecursiveMode, Watcher};

    let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
        if let Ok(ev) = event {
            if matches!(ev.kind, EventKind::Create(_)) {
                for path in ev.paths {
                    if tx.try_send(path).is_err() {
                        tracing::warn!("Intake queue full or closed, dropping event");
                    }
                }
            }
        }
    })?;

    watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
