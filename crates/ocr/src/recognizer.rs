use serde::Deserialize;
use slipscan_core::{Detection, EngineOutput};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Malformed recognizer output: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("OCR engine error: {0}")]
    Engine(String),
}

/// Abstraction over a text detection/recognition engine.
/// Implementations accept raw input bytes and return positioned detections.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, input: &[u8]) -> Result<Vec<Detection>, OcrError>;
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a preset detection list regardless of input.
pub struct MockRecognizer {
    pub detections: Vec<Detection>,
}

impl MockRecognizer {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(&self, _input: &[u8]) -> Result<Vec<Detection>, OcrError> {
        Ok(self.detections.clone())
    }
}

// ── Recorded engine output ────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum Recorded {
    Detections(Vec<Detection>),
    Engine(EngineOutput),
}

/// Replays engine output saved as JSON, either a list of detections or the
/// engine's parallel `rec_texts` / `rec_scores` / `dt_polys` arrays.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRecognizer;

impl OcrBackend for JsonRecognizer {
    fn recognize(&self, input: &[u8]) -> Result<Vec<Detection>, OcrError> {
        Ok(match serde_json::from_slice::<Recorded>(input)? {
            Recorded::Detections(d) => d,
            Recorded::Engine(e) => e.into_detections(),
        })
    }
}
