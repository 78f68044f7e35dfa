use serde::{Deserialize, Serialize};

/// One recognized text span, normalized to an axis-aligned rectangle in image pixels.
///
/// Fragments are produced once from recognizer output and only read afterwards;
/// every analysis pass borrows them as `&[Fragment]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    /// Recognizer confidence (0.0–1.0).
    pub confidence: f32,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Fragment {
    pub fn new(text: impl Into<String>, confidence: f32, x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
            x,
            y,
            w: w.max(0.0),
            h: h.max(0.0),
        }
    }

    /// Build a fragment from a detection polygon by taking its bounding rectangle.
    /// An empty polygon collapses to a zero-sized box at the origin.
    pub fn from_polygon(text: impl Into<String>, confidence: f32, points: &[[f64; 2]]) -> Self {
        if points.is_empty() {
            return Self::new(text, confidence, 0.0, 0.0, 0.0, 0.0);
        }
        let (min_x, max_x) = bounds(points.iter().map(|p| p[0]));
        let (min_y, max_y) = bounds(points.iter().map(|p| p[1]));
        Self::new(text, confidence, min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Bottom edge (`y + h`).
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// A single recognizer hit in "list of detections" form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub text: String,
    #[serde(default)]
    pub confidence: f32,
    /// Corner points of the detected region, usually four.
    #[serde(default)]
    pub bounding_box: Vec<[f64; 2]>,
}

impl Detection {
    pub fn to_fragment(&self) -> Fragment {
        Fragment::from_polygon(self.text.as_str(), self.confidence, &self.bounding_box)
    }
}

/// Parallel-array output as emitted by the recognition engine.
///
/// The arrays are not guaranteed to be the same length: `rec_texts` drives the
/// conversion, a missing score reads as 0.0 and a missing polygon as four origin points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineOutput {
    #[serde(default)]
    pub rec_texts: Vec<String>,
    #[serde(default)]
    pub rec_scores: Vec<f32>,
    #[serde(default)]
    pub dt_polys: Vec<Vec<[f64; 2]>>,
}

impl EngineOutput {
    pub fn into_detections(self) -> Vec<Detection> {
        let EngineOutput { rec_texts, rec_scores, dt_polys } = self;
        rec_texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Detection {
                text,
                confidence: rec_scores.get(i).copied().unwrap_or(0.0),
                bounding_box: dt_polys
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| vec![[0.0, 0.0]; 4]),
            })
            .collect()
    }
}

/// Convert detections to fragments, preserving recognizer order.
pub fn to_fragments(detections: &[Detection]) -> Vec<Fragment> {
    detections.iter().map(Detection::to_fragment).collect()
}
