pub mod config;
pub mod pipeline;
pub mod report;

pub use pipeline::reader::PrescriptionReader;
pub use pipeline::recognition::{
    PrescriptionImage, RawRecognitionResult, RecognitionError, RecognizedLine, Recognizer,
};
pub use pipeline::structuring::{
    structure_prescription, MedicationRecord, PrescriptionRecord, PrescriptionStructurer,
};

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber. Honours RUST_LOG, otherwise uses
/// `config::default_log_filter()`. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
