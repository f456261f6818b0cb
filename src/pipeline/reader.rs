use std::sync::Arc;
use std::time::Duration;

use super::recognition::{validate_image, PrescriptionImage, RecognitionError, Recognizer};
use super::structuring::{PrescriptionRecord, PrescriptionStructurer};
use crate::config;

/// Reads one prescription image end to end: intake validation, text
/// recognition, then structuring.
///
/// Recognition failures are returned before structuring starts; there is no
/// partial record and no retry. Retrying is up to the caller.
#[derive(Clone)]
pub struct PrescriptionReader {
    recognizer: Arc<dyn Recognizer>,
    structurer: Arc<PrescriptionStructurer>,
    timeout: Duration,
}

impl PrescriptionReader {
    pub fn new(recognizer: Arc<dyn Recognizer>, structurer: Arc<PrescriptionStructurer>) -> Self {
        Self {
            recognizer,
            structurer,
            timeout: Duration::from_secs(config::DEFAULT_RECOGNITION_TIMEOUT_SECS),
        }
    }

    /// Bound on the recognizer call in `read_async`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Blocking read on the current thread.
    pub fn read(&self, image: &PrescriptionImage) -> Result<PrescriptionRecord, RecognitionError> {
        let _span = tracing::info_span!("read_prescription", image_id = %image.id).entered();

        check_image(image)?;
        let raw = self.recognizer.recognize(image).inspect_err(|e| {
            tracing::warn!(error = %e, "Text recognition failed");
        })?;

        let record = self.structurer.structure(&raw);
        log_outcome(&record);
        Ok(record)
    }

    /// Runs the recognizer on a blocking worker under the configured timeout.
    /// An elapsed timeout is `TimedOut`; a worker that panicked or was
    /// cancelled is `Cancelled`.
    pub async fn read_async(
        &self,
        image: PrescriptionImage,
    ) -> Result<PrescriptionRecord, RecognitionError> {
        let image_id = image.id;
        check_image(&image)?;

        let recognizer = Arc::clone(&self.recognizer);
        let task = tokio::task::spawn_blocking(move || recognizer.recognize(&image));

        let raw = match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result.inspect_err(|e| {
                tracing::warn!(%image_id, error = %e, "Text recognition failed");
            })?,
            Ok(Err(join_error)) => {
                tracing::warn!(%image_id, error = %join_error, "Recognition worker did not complete");
                return Err(RecognitionError::Cancelled);
            }
            Err(_) => {
                let secs = whole_secs_rounded_up(self.timeout);
                tracing::warn!(%image_id, timeout_secs = secs, "Text recognition timed out");
                return Err(RecognitionError::TimedOut { secs });
            }
        };

        let record = self.structurer.structure(&raw);
        log_outcome(&record);
        Ok(record)
    }
}

/// A 50ms timeout reports as 1s, never 0s.
fn whole_secs_rounded_up(timeout: Duration) -> u64 {
    timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0)
}

fn check_image(image: &PrescriptionImage) -> Result<(), RecognitionError> {
    validate_image(image).inspect_err(|e| {
        tracing::warn!(
            image_id = %image.id,
            content_type = %image.content_type,
            size = image.bytes.len(),
            error = %e,
            "Image rejected"
        );
    })
}

fn log_outcome(record: &PrescriptionRecord) {
    tracing::info!(
        medications = record.medications.len(),
        instructions = record.instructions.len(),
        overall_confidence = record.overall_confidence,
        "Prescription read"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::recognition::{
        FailingRecognizer, MockRecognizer, RawRecognitionResult, RecognizedLine,
    };

    /// Recognizer that sleeps before answering, to exercise the timeout.
    struct SlowRecognizer {
        delay: Duration,
    }

    impl Recognizer for SlowRecognizer {
        fn recognize(
            &self,
            image: &PrescriptionImage,
        ) -> Result<RawRecognitionResult, RecognitionError> {
            std::thread::sleep(self.delay);
            Ok(RawRecognitionResult::new(
                image.id,
                vec![RecognizedLine::new("Dr. Sarah Johnson, MD", 0.9)],
            ))
        }
    }

    struct PanickingRecognizer;

    impl Recognizer for PanickingRecognizer {
        fn recognize(
            &self,
            _image: &PrescriptionImage,
        ) -> Result<RawRecognitionResult, RecognitionError> {
            panic!("engine crashed");
        }
    }

    fn reader(recognizer: impl Recognizer + 'static) -> PrescriptionReader {
        PrescriptionReader::new(Arc::new(recognizer), Arc::new(PrescriptionStructurer::default()))
    }

    fn png() -> PrescriptionImage {
        PrescriptionImage::new("image/png", vec![0x89, 0x50, 0x4E, 0x47])
    }

    const TEXT: &str = "Dr. Sarah Johnson, MD
Date: December 14, 2024
1. Amoxicillin 500mg - Take 1 tablet twice daily after meals for 7 days
- Complete the full course of antibiotics";

    #[test]
    fn read_structures_recognized_text() {
        let record = reader(MockRecognizer::from_text(TEXT, 1.0)).read(&png()).unwrap();
        assert_eq!(record.medications.len(), 1);
        assert_eq!(record.date.as_deref(), Some("2024-12-14"));
        assert_eq!(record.overall_confidence, 1.0);
    }

    #[test]
    fn recognizer_failure_is_surfaced() {
        let err = reader(FailingRecognizer::new("offline")).read(&png()).unwrap_err();
        assert!(err.is_unavailable());
    }

    #[test]
    fn rejected_image_never_reaches_recognizer() {
        let err = reader(PanickingRecognizer)
            .read(&PrescriptionImage::new("application/pdf", vec![1, 2, 3]))
            .unwrap_err();
        assert!(matches!(err, RecognitionError::UnsupportedContentType(_)));

        let err = reader(PanickingRecognizer)
            .read(&PrescriptionImage::new("image/jpeg", vec![]))
            .unwrap_err();
        assert!(matches!(err, RecognitionError::EmptyImage));
    }

    #[test]
    fn default_timeout_comes_from_config() {
        let r = reader(MockRecognizer::from_text(TEXT, 1.0));
        assert_eq!(
            r.timeout(),
            Duration::from_secs(config::DEFAULT_RECOGNITION_TIMEOUT_SECS)
        );
    }

    #[tokio::test]
    async fn read_async_matches_blocking_read() {
        let r = reader(MockRecognizer::from_text(TEXT, 0.8));
        let image = png();
        let blocking = r.read(&image).unwrap();
        let asynchronous = r.read_async(image).await.unwrap();
        assert_eq!(blocking, asynchronous);
    }

    #[tokio::test]
    async fn slow_recognizer_times_out() {
        let r = reader(SlowRecognizer {
            delay: Duration::from_millis(500),
        })
        .with_timeout(Duration::from_millis(50));
        let err = r.read_async(png()).await.unwrap_err();
        assert!(matches!(err, RecognitionError::TimedOut { secs: 1 }), "{err}");
        assert!(err.is_unavailable());
    }

    #[test]
    fn timeout_seconds_round_up() {
        assert_eq!(whole_secs_rounded_up(Duration::from_millis(50)), 1);
        assert_eq!(whole_secs_rounded_up(Duration::from_secs(30)), 30);
        assert_eq!(whole_secs_rounded_up(Duration::from_millis(30_001)), 31);
        assert_eq!(whole_secs_rounded_up(Duration::ZERO), 0);
    }

    #[tokio::test]
    async fn recognizer_within_timeout_succeeds() {
        let r = reader(SlowRecognizer {
            delay: Duration::from_millis(10),
        })
        .with_timeout(Duration::from_secs(5));
        let record = r.read_async(png()).await.unwrap();
        assert_eq!(record.provider_name.as_deref(), Some("Dr. Sarah Johnson, MD"));
    }

    #[tokio::test]
    async fn panicking_recognizer_is_cancelled() {
        let err = reader(PanickingRecognizer).read_async(png()).await.unwrap_err();
        assert!(matches!(err, RecognitionError::Cancelled));
    }

    #[tokio::test]
    async fn async_failure_is_surfaced() {
        let err = reader(FailingRecognizer::new("offline"))
            .read_async(png())
            .await
            .unwrap_err();
        assert!(matches!(err, RecognitionError::Unavailable(_)));
    }
}
