use super::types::{PrescriptionImage, RawRecognitionResult, RecognizedLine, Recognizer};
use super::RecognitionError;

/// Mock recognizer for tests and demos: returns the configured lines for any image.
pub struct MockRecognizer {
    lines: Vec<RecognizedLine>,
}

impl MockRecognizer {
    pub fn new(lines: Vec<RecognizedLine>) -> Self {
        Self { lines }
    }

    /// Every line of `text` with the same confidence.
    pub fn from_text(text: &str, confidence: f32) -> Self {
        Self::new(super::tsv::lines_from_text(text, confidence))
    }
}

impl Recognizer for MockRecognizer {
    fn recognize(
        &self,
        image: &PrescriptionImage,
    ) -> Result<RawRecognitionResult, RecognitionError> {
        Ok(RawRecognitionResult::new(image.id, self.lines.clone()))
    }
}

/// Recognizer that always fails as if the engine were down.
pub struct FailingRecognizer {
    reason: String,
}

impl FailingRecognizer {
    pub fn new(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

impl Recognizer for FailingRecognizer {
    fn recognize(
        &self,
        _image: &PrescriptionImage,
    ) -> Result<RawRecognitionResult, RecognitionError> {
        Err(RecognitionError::Unavailable(self.reason.clone()))
    }
}
