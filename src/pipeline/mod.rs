pub mod recognition;
pub mod structuring;
pub mod reader;

pub use reader::PrescriptionReader;
