use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pipeline::structuring::RuleVocabulary;

/// Application-level constants
pub const APP_NAME: &str = "rx-reader";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// File name used when exporting the extracted text
pub const EXPORT_FILE_NAME: &str = "prescription.txt";

/// Upload limit for a single prescription image (10 MiB)
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Upper bound on one text recognition call
pub const DEFAULT_RECOGNITION_TIMEOUT_SECS: u64 = 120;

/// Local Ollama server used by the vision recognizer
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_VISION_MODEL: &str = "llama3.2-vision";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid vocabulary file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Log filter used when RUST_LOG is not set.
pub fn default_log_filter() -> &'static str {
    "rx_reader=info"
}

/// Where exports go by default: Documents, else home, else the working directory.
pub fn default_export_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Load a rule vocabulary from JSON. Fields missing from the file keep
/// their built-in values.
pub fn load_vocabulary(path: &Path) -> Result<RuleVocabulary, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let vocabulary = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "Loaded rule vocabulary");
    Ok(vocabulary)
}
