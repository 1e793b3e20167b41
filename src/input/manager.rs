//! Input manager for handling different file types

use crate::error::{Result, SmartAtsError};
use crate::input::file_detector::FileType;
use crate::input::text_extractor::{MarkdownExtractor, PdfExtractor, PlainTextExtractor, TextExtractor};
use log::info;
use std::io::Read;
use std::path::Path;

/// Routes a file to the extractor for its type.
#[derive(Debug, Default)]
pub struct InputManager;

impl InputManager {
    pub fn new() -> Self {
        Self
    }

    pub async fn extract_text(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(SmartAtsError::InvalidInput(
                format!("File does not exist: {}", path.display())
            ));
        }

        let file_type = self.detect_file_type(path)?;

        let text = match file_type {
            FileType::Pdf => {
                info!("Extracting text from PDF: {}", path.display());
                PdfExtractor.extract(path).await?
            },
            FileType::Text => {
                info!("Reading plain text file: {}", path.display());
                PlainTextExtractor.extract(path).await?
            },
            FileType::Markdown => {
                info!("Processing markdown file: {}", path.display());
                MarkdownExtractor.extract(path).await?
            },
            FileType::Unknown => {
                return Err(SmartAtsError::UnsupportedFormat(
                    format!("Unsupported file type for: {}", path.display())
                ));
            }
        };

        Ok(text)
    }

    /// Extract a resume. A document with no usable text is an extraction
    /// failure, reported before any model call is made.
    pub async fn extract_resume(&self, path: &Path) -> Result<String> {
        let text = self.extract_text(path).await?;
        if text.trim().is_empty() {
            return Err(SmartAtsError::ExtractionFailure(format!(
                "no text could be extracted from {}",
                path.display()
            )));
        }
        Ok(text)
    }

    /// Read a saved model reply verbatim. `-` reads from `stdin`.
    pub fn read_reply<R: Read>(&self, path: &Path, mut stdin: R) -> Result<String> {
        if path == Path::new("-") {
            let mut raw = String::new();
            stdin.read_to_string(&mut raw)?;
            Ok(raw)
        } else {
            Ok(std::fs::read_to_string(path)?)
        }
    }

    fn detect_file_type(&self, path: &Path) -> Result<FileType> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| SmartAtsError::InvalidInput(
                format!("File has no extension: {}", path.display())
            ))?;

        Ok(FileType::from_extension(extension))
    }
}
