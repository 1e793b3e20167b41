//! Text extraction from various file formats

use crate::error::{Result, SmartAtsError};
use log::debug;
use pulldown_cmark::{html, Parser};
use regex::Regex;
use std::path::Path;
use tokio::fs;

pub trait TextExtractor {
    fn extract(&self, path: &Path) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).await?;

        extract_pdf_text(&bytes).map_err(|e| match e {
            SmartAtsError::ExtractionFailure(reason) => {
                SmartAtsError::ExtractionFailure(format!("'{}': {}", path.display(), reason))
            }
            other => other,
        })
    }
}

/// Extract the text of every page, in page order, from an in-memory PDF.
///
/// `pdf-extract` panics on some malformed documents; the panic is caught and
/// reported as an extraction failure.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => {
            debug!("Extracted {} characters from {} byte PDF", text.len(), bytes.len());
            Ok(text)
        }
        Ok(Err(e)) => Err(SmartAtsError::ExtractionFailure(format!("could not read PDF: {}", e))),
        Err(_) => Err(SmartAtsError::ExtractionFailure(
            "PDF parser aborted on a malformed document".to_string(),
        )),
    }
}

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let content = fs::read_to_string(path).await?;
        Ok(content)
    }
}

pub struct MarkdownExtractor;

impl TextExtractor for MarkdownExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let markdown_content = fs::read_to_string(path).await?;
        markdown_to_text(&markdown_content)
    }
}

/// Render markdown to HTML and strip the markup back out, one line per block.
pub fn markdown_to_text(markdown: &str) -> Result<String> {
    let parser = Parser::new(markdown);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    let text = html_output
        .replace("<br>", "\n")
        .replace("</p>", "\n\n")
        .replace("</li>", "\n");

    let tags = Regex::new(r"<[^>]*>")
        .map_err(|e| SmartAtsError::TextProcessing(e.to_string()))?;
    let clean_text = tags.replace_all(&text, "");

    let clean_text = clean_text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    let lines: Vec<&str> = clean_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    Ok(lines.join("\n"))
}
