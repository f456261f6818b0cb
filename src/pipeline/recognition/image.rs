use std::path::Path;

use super::types::PrescriptionImage;
use super::RecognitionError;
use crate::config::MAX_IMAGE_BYTES;

/// MIME type guessed from a file extension. Unknown extensions map to
/// `application/octet-stream`, which `validate_image` rejects.
pub fn content_type_for_path(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Reject uploads the recognizer should never see: empty payloads,
/// non-image content types and anything over the size cap.
pub fn validate_image(image: &PrescriptionImage) -> Result<(), RecognitionError> {
    validate_image_with_limit(image, MAX_IMAGE_BYTES)
}

pub fn validate_image_with_limit(
    image: &PrescriptionImage,
    limit: usize,
) -> Result<(), RecognitionError> {
    if image.bytes.is_empty() {
        return Err(RecognitionError::EmptyImage);
    }

    let content_type = image.content_type.trim().to_ascii_lowercase();
    if !content_type.starts_with("image/") {
        return Err(RecognitionError::UnsupportedContentType(
            image.content_type.clone(),
        ));
    }

    if image.bytes.len() > limit {
        return Err(RecognitionError::ImageTooLarge {
            size: image.bytes.len(),
            limit,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_image_types() {
        for ct in ["image/jpeg", "image/png", "IMAGE/GIF", " image/webp "] {
            let image = PrescriptionImage::new(ct, vec![1, 2, 3]);
            assert!(validate_image(&image).is_ok(), "{ct} should be accepted");
        }
    }

    #[test]
    fn rejects_non_image_content() {
        let image = PrescriptionImage::new("application/pdf", vec![1, 2, 3]);
        assert!(matches!(
            validate_image(&image),
            Err(RecognitionError::UnsupportedContentType(ct)) if ct == "application/pdf"
        ));
    }

    #[test]
    fn rejects_empty_payload() {
        let image = PrescriptionImage::new("image/png", vec![]);
        assert!(matches!(
            validate_image(&image),
            Err(RecognitionError::EmptyImage)
        ));
    }

    #[test]
    fn rejects_oversized_payload() {
        let image = PrescriptionImage::new("image/png", vec![0; 11]);
        assert!(matches!(
            validate_image_with_limit(&image, 10),
            Err(RecognitionError::ImageTooLarge { size: 11, limit: 10 })
        ));
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type_for_path(Path::new("rx.JPG")), "image/jpeg");
        assert_eq!(content_type_for_path(Path::new("scan.png")), "image/png");
        assert_eq!(content_type_for_path(Path::new("scan.tiff")), "image/tiff");
        assert_eq!(content_type_for_path(Path::new("notes.pdf")), "application/pdf");
        assert_eq!(content_type_for_path(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn guessed_non_image_types_are_rejected() {
        for name in ["notes.pdf", "noext", "data.json"] {
            let ct = content_type_for_path(Path::new(name));
            let image = PrescriptionImage::new(&ct, vec![1, 2, 3]);
            assert!(
                matches!(validate_image(&image), Err(RecognitionError::UnsupportedContentType(_))),
                "{name} ({ct}) should be rejected"
            );
        }
        let ct = content_type_for_path(Path::new("rx.jpeg"));
        assert!(validate_image(&PrescriptionImage::new(&ct, vec![1])).is_ok());
    }

    #[test]
    fn payload_at_limit_is_accepted() {
        let image = PrescriptionImage::new("image/png", vec![0; 10]);
        assert!(validate_image_with_limit(&image, 10).is_ok());
    }
}
