pub mod enums;
pub mod insight;
pub mod patient;
pub mod records;

pub use enums::*;
pub use insight::*;
pub use patient::*;
pub use records::*;

/// Sentinel rendered wherever a clinical value is absent from the source.
/// Distinct from an empty string, which never survives normalization.
pub const NOT_DOCUMENTED: &str = "Not documented";

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid value '{value}' for {field}")]
    InvalidEnum { field: String, value: String },
}
