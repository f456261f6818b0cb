use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RecognitionError;

/// One line of text as produced by the recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedLine {
    pub text: String,
    /// Recognition confidence in [0.0, 1.0].
    pub confidence: f32,
}

impl RecognizedLine {
    /// Build a line, clamping the confidence into [0, 1]. NaN becomes 0.
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence: clamp_confidence(confidence),
        }
    }
}

/// Everything the recognizer returned for one image, in reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecognitionResult {
    pub image_id: Uuid,
    lines: Vec<RecognizedLine>,
}

impl RawRecognitionResult {
    pub fn new(image_id: Uuid, lines: Vec<RecognizedLine>) -> Self {
        let lines = lines
            .into_iter()
            .map(|l| RecognizedLine::new(l.text, l.confidence))
            .collect();
        Self { image_id, lines }
    }

    /// Convenience for synthetic input: (text, confidence) pairs under a fresh id.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f32)>) -> Self {
        Self::new(
            Uuid::new_v4(),
            pairs
                .into_iter()
                .map(|(text, confidence)| RecognizedLine::new(text, confidence))
                .collect(),
        )
    }

    pub fn lines(&self) -> &[RecognizedLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// A photographed prescription handed to the recognizer.
#[derive(Debug, Clone)]
pub struct PrescriptionImage {
    pub id: Uuid,
    /// MIME type reported by the upload (e.g. "image/jpeg").
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PrescriptionImage {
    pub fn new(content_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content_type: content_type.to_string(),
            bytes,
        }
    }
}

/// Text recognition capability (allows mocking for tests).
///
/// Implementations turn image pixels into ordered lines with confidence.
/// They must be shareable across threads so the reader can run them on a
/// blocking worker.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, image: &PrescriptionImage) -> Result<RawRecognitionResult, RecognitionError>;
}

pub(crate) fn clamp_confidence(confidence: f32) -> f32 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_clamped_on_construction() {
        assert_eq!(RecognizedLine::new("a", 1.7).confidence, 1.0);
        assert_eq!(RecognizedLine::new("a", -0.2).confidence, 0.0);
        assert_eq!(RecognizedLine::new("a", f32::NAN).confidence, 0.0);
        assert!((RecognizedLine::new("a", 0.42).confidence - 0.42).abs() < f32::EPSILON);
    }

    #[test]
    fn raw_result_reclamps_struct_literals() {
        let raw = RawRecognitionResult::new(
            Uuid::new_v4(),
            vec![RecognizedLine {
                text: "Amoxicillin".into(),
                confidence: 3.0,
            }],
        );
        assert_eq!(raw.lines()[0].confidence, 1.0);
    }

    #[test]
    fn from_pairs_preserves_order() {
        let raw = RawRecognitionResult::from_pairs([("first", 0.9), ("second", 0.8)]);
        assert_eq!(raw.lines().len(), 2);
        assert_eq!(raw.lines()[0].text, "first");
        assert_eq!(raw.lines()[1].text, "second");
        assert!(!raw.is_empty());
    }
}
