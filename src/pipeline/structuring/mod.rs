pub mod types;
pub mod vocabulary;
pub mod normalize;
pub mod drug_names;
pub mod classify;
pub mod medication;
pub mod metadata;
pub mod confidence;
pub mod assembler;

pub use types::*;
pub use vocabulary::*;
pub use normalize::*;
pub use classify::*;
pub use medication::*;
pub use metadata::*;
pub use confidence::*;
pub use assembler::*;

use thiserror::Error;

/// Structuring itself never fails on input text; the only error is a
/// user-supplied vocabulary that does not compile.
#[derive(Error, Debug)]
pub enum StructuringError {
    #[error("Invalid rule vocabulary: {0}")]
    InvalidVocabulary(String),
}
