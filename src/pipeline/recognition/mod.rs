pub mod types;
pub mod image;
pub mod tsv;
pub mod vision;
pub mod mock;

pub use types::*;
pub use image::*;
pub use tsv::*;
pub use vision::*;
pub use mock::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("Text recognition unavailable: {0}")]
    Unavailable(String),

    #[error("Text recognition timed out after {secs}s")]
    TimedOut { secs: u64 },

    #[error("Text recognition was cancelled")]
    Cancelled,

    #[error("Unsupported content type: {0} (expected an image)")]
    UnsupportedContentType(String),

    #[error("Image is {size} bytes, limit is {limit} bytes")]
    ImageTooLarge { size: usize, limit: usize },

    #[error("Image payload is empty")]
    EmptyImage,

    #[error("Recognizer response could not be parsed: {0}")]
    ResponseParsing(String),

    #[error("Malformed recognition input: {0}")]
    MalformedInput(String),
}

impl RecognitionError {
    /// True when the recognizer itself failed or returned garbage, as opposed
    /// to the caller's image or pre-recognized text being rejected.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            RecognitionError::Unavailable(_)
                | RecognitionError::TimedOut { .. }
                | RecognitionError::Cancelled
                | RecognitionError::ResponseParsing(_)
        )
    }
}
