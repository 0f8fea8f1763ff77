use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Screen-space box in device pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Shrink by `inset` pixels on every side, `None` if nothing is left
    pub fn inset(&self, inset: u32) -> Option<Self> {
        let width = self.width.checked_sub(inset * 2)?;
        let height = self.height.checked_sub(inset * 2)?;
        if width == 0 || height == 0 {
            return None;
        }

        Some(Self {
            x: self.x + inset as i32,
            y: self.y + inset as i32,
            width,
            height,
        })
    }
}

impl fmt::Display for CaptureRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})_({},{})",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Bounding box of a recognized symbol, relative to the job image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextOrientation {
    #[default]
    Horizontal,
    Vertical,
}

/// One alternative reading of a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    pub confidence: f64,
}

impl Choice {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// A recognized symbol with its alternatives, most likely first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionCandidate {
    pub bbox: BoundingBox,
    pub choices: Vec<Choice>,
}

impl RecognitionCandidate {
    /// Most likely reading
    pub fn best(&self) -> Option<&Choice> {
        self.choices.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub candidates: Vec<RecognitionCandidate>,
    pub elapsed: Duration,
    /// Region the job was captured from
    pub region: CaptureRegion,
    /// Submitted automatically on release rather than by double-tap
    pub instant: bool,
}

impl RecognitionResult {
    /// Concatenation of the best choice of every candidate
    pub fn text(&self) -> String {
        self.candidates
            .iter()
            .filter_map(|c| c.best())
            .map(|c| c.text.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BorderStyle {
    /// Translucent fill shown while busy
    Default,
    /// Transparent with the solid marker border the readiness check looks for
    Armed,
}

/// Lightweight message surfaced to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    NoTextFound,
    NothingCaptured,
    CaptureFailed(String),
    RecognitionFailed(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NoTextFound => write!(f, "No Characters Recognized."),
            Notice::NothingCaptured => write!(f, "Nothing captured yet"),
            Notice::CaptureFailed(reason) => write!(f, "Capture failed: {reason}"),
            Notice::RecognitionFailed(_) => write!(f, "Recognition failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inset_shrinks_every_side() {
        let region = CaptureRegion::new(10, 20, 50, 40);
        assert_eq!(region.inset(2), Some(CaptureRegion::new(12, 22, 46, 36)));
    }

    #[test]
    fn inset_rejects_regions_that_vanish() {
        assert_eq!(CaptureRegion::new(0, 0, 4, 40).inset(2), None);
        assert_eq!(CaptureRegion::new(0, 0, 3, 40).inset(2), None);
    }

    #[test]
    fn region_display_matches_artifact_labels() {
        assert_eq!(CaptureRegion::new(1, 2, 3, 4).to_string(), "(1,2)_(3,4)");
    }

    #[test]
    fn result_text_uses_best_choice() {
        let result = RecognitionResult {
            candidates: vec![
                RecognitionCandidate {
                    bbox: BoundingBox::new(0, 0, 8, 8),
                    choices: vec![Choice::new("日", 0.9), Choice::new("曰", 0.4)],
                },
                RecognitionCandidate {
                    bbox: BoundingBox::new(8, 0, 8, 8),
                    choices: vec![Choice::new("本", 0.8)],
                },
            ],
            elapsed: Duration::from_millis(12),
            region: CaptureRegion::new(0, 0, 16, 8),
            instant: false,
        };
        assert_eq!(result.text(), "日本");
    }

    #[test]
    fn orientation_serializes_lowercase() {
        let json = serde_json::to_string(&TextOrientation::Vertical).unwrap();
        assert_eq!(json, "\"vertical\"");
    }
}
