//! Error handling for smart-ats

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmartAtsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing API credential: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("Text extraction failed: {0}")]
    ExtractionFailure(String),

    #[error("Text processing error: {0}")]
    TextProcessing(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, SmartAtsError>;

impl From<askama::Error> for SmartAtsError {
    fn from(err: askama::Error) -> Self {
        SmartAtsError::OutputFormatting(err.to_string())
    }
}
