pub mod fallback;
pub mod ollama;
pub mod parser;
pub mod prompt;
pub mod service;
pub mod types;

pub use fallback::*;
pub use ollama::*;
pub use parser::*;
pub use prompt::*;
pub use service::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Ollama is not running at {0}")]
    OllamaConnection(String),

    #[error("Ollama returned error (status {status}): {body}")]
    OllamaError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("Response violates the insight schema: {0}")]
    SchemaViolation(String),

    #[error("Insight generation timed out after {0}s")]
    Timeout(u64),
}
