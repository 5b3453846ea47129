//! Conversion requests and results

use crate::backend::BackendKind;
use crate::error::{ConvertError, Result};

/// Highest heading level a document can carry
pub const MAX_HEADING_LEVEL: u8 = 9;

/// Inputs of one conversion, immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Document title; blank means "use the default"
    pub title: Option<String>,
    /// HTML body fragment or full page
    pub html_body: String,
    /// Level the heading hierarchy should start at (1-9)
    pub start_level: u8,
    /// Map bold/italic runs to Strong/Emphasis
    pub strong_emph: bool,
}

impl Default for ConversionRequest {
    fn default() -> Self {
        Self {
            title: None,
            html_body: String::new(),
            start_level: 1,
            strong_emph: true,
        }
    }
}

impl ConversionRequest {
    /// Request with default options for the given body
    pub fn new(html_body: impl Into<String>) -> Self {
        Self {
            html_body: html_body.into(),
            ..Default::default()
        }
    }

    /// Builder: set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder: set the starting heading level
    pub fn with_start_level(mut self, start_level: u8) -> Self {
        self.start_level = start_level;
        self
    }

    /// Builder: toggle Strong/Emphasis mapping
    pub fn with_strong_emph(mut self, strong_emph: bool) -> Self {
        self.strong_emph = strong_emph;
        self
    }

    /// Check the request before running the pipeline
    pub fn validate(&self) -> Result<()> {
        if self.html_body.trim().is_empty() {
            return Err(ConvertError::Validation(
                "HTML body is empty; provide some content to convert".to_string(),
            ));
        }
        if !(1..=MAX_HEADING_LEVEL).contains(&self.start_level) {
            return Err(ConvertError::Validation(format!(
                "start level must be between 1 and {MAX_HEADING_LEVEL}, got {}",
                self.start_level
            )));
        }
        Ok(())
    }

    /// Title after trimming, or `default` when blank
    pub fn effective_title<'a>(&'a self, default: &'a str) -> &'a str {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .unwrap_or(default)
    }
}

/// The finished document handed back to the caller
#[derive(Debug, Clone)]
pub struct ConvertedDocument {
    /// DOCX bytes
    pub bytes: Vec<u8>,
    /// Suggested file name (`<title>.docx`)
    pub file_name: String,
    /// Which backend produced the raw document
    pub backend: BackendKind,
}

/// Suggested file name for a title: path separators become `-`
pub fn suggested_file_name(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect();
    format!("{stem}.docx")
}
