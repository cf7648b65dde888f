pub mod assemble;
pub mod collections;
pub mod columns;
pub mod csv;
pub mod loader;
pub mod normalize;

pub use assemble::*;
pub use columns::*;
pub use loader::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Source file is empty (no header row)")]
    EmptySource,

    #[error("Header row has no usable columns")]
    NoColumns,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
