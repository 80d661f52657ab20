//! Error types for the extractor

use std::path::PathBuf;

use newsdesk_llm::LlmError;
use thiserror::Error;

/// Errors that can surface from an extraction
///
/// Content-level problems (Pass-2 output that is not valid JSON) are never
/// errors; they are absorbed into the degraded record shape. Only input
/// validation and transport failures reach the caller this way.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Input file does not exist
    #[error("Email file not found: {0}")]
    FileNotFound(PathBuf),

    /// Input file is not an .eml file
    #[error("File must be .eml format, got: {0}")]
    InvalidExtension(PathBuf),

    /// Input text missing or invalid
    #[error("Input error: {0}")]
    Input(String),

    /// Failed to read the input file
    #[error("Failed to read email file: {0}")]
    Io(#[from] std::io::Error),

    /// Transport failure from the underlying provider, propagated as-is
    #[error("Provider error: {0}")]
    Provider(#[from] LlmError),
}
