//! Source file parsing and text extraction.

use crate::ingest::html::{collapse_blank_lines, html_to_text};
use ragcourse_core::{AppError, AppResult};
use std::fs;
use std::path::Path;

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    Html,
    Pdf,
    PlainText,
    Unknown,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("md") | Some("markdown") => Self::Markdown,
            Some("html") | Some("htm") => Self::Html,
            Some("pdf") => Self::Pdf,
            Some("txt") => Self::PlainText,
            _ => Self::Unknown,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Pdf => "pdf",
            Self::PlainText => "text",
            Self::Unknown => "unknown",
        }
    }

    /// Whether files of this type are ingested.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Parse a source file and extract clean text.
pub fn parse_file(path: &Path) -> AppResult<String> {
    let content_type = ContentType::from_path(path);

    let cleaned = match content_type {
        ContentType::Pdf => {
            let bytes = fs::read(path)
                .map_err(|e| AppError::Ingest(format!("Failed to read {:?}: {}", path, e)))?;
            extract_pdf(&bytes)?
        }
        ContentType::Markdown => clean_markdown(&read_text(path)?),
        ContentType::Html => html_to_text(&read_text(path)?),
        ContentType::PlainText => collapse_blank_lines(&read_text(path)?),
        ContentType::Unknown => {
            return Err(AppError::Ingest(format!(
                "Unsupported file type: {:?}",
                path
            )))
        }
    };

    if cleaned.trim().is_empty() {
        return Err(AppError::Ingest(format!("No text in {:?}", path)));
    }

    Ok(cleaned)
}

/// Extract text from PDF bytes.
pub fn extract_pdf(bytes: &[u8]) -> AppResult<String> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| AppError::Ingest(format!("PDF extraction failed: {}", e)))?;
    Ok(collapse_blank_lines(&text))
}

fn read_text(path: &Path) -> AppResult<String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Ingest(format!("Failed to read {:?}: {}", path, e)))?;

    if raw.contains('\0') {
        tracing::warn!("Skipping likely binary file: {:?}", path);
        return Err(AppError::Ingest(format!("Binary file not supported: {:?}", path)));
    }

    Ok(raw)
}

/// Clean markdown by removing excess formatting.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();

        // Horizontal rules and code fences
        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_content_type_detection() {
        assert_eq!(
            ContentType::from_path(Path::new("catalog.md")),
            ContentType::Markdown
        );
        assert_eq!(
            ContentType::from_path(Path::new("catalog.PDF")),
            ContentType::Pdf
        );
        assert_eq!(
            ContentType::from_path(Path::new("notes.txt")),
            ContentType::PlainText
        );
        assert!(!ContentType::from_path(Path::new("main.rs")).is_supported());
    }

    #[test]
    fn test_clean_markdown() {
        let input = "# Header\n\nSome text\n\n```rust\ncode\n```\n\nMore text";
        let output = clean_markdown(input);
        assert!(output.contains("Header"));
        assert!(output.contains("Some text"));
        assert!(output.contains("More text"));
        assert!(!output.contains("```"));
    }

    #[test]
    fn test_parse_html_file_prefers_main() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.html");
        fs::write(
            &path,
            "<html><body><nav>Menu</nav><main><p>Hello <b>world</b></p></main></body></html>",
        )
        .unwrap();

        assert_eq!(parse_file(&path).unwrap(), "Hello\nworld");
    }

    #[test]
    fn test_empty_file_is_ingest_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.txt");
        fs::write(&path, "\n \n").unwrap();
        assert!(matches!(parse_file(&path), Err(AppError::Ingest(_))));
    }

    #[test]
    fn test_unsupported_and_invalid_pdf() {
        let dir = TempDir::new().unwrap();
        let code = dir.path().join("main.rs");
        fs::write(&code, "fn main() {}").unwrap();
        assert!(matches!(parse_file(&code), Err(AppError::Ingest(_))));

        assert!(matches!(
            extract_pdf(b"not a pdf"),
            Err(AppError::Ingest(_))
        ));
    }
}
