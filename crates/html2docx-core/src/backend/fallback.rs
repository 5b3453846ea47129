//! Built-in conversion path
//!
//! Builds a fresh package with the writer's own styles. The template is
//! never used here: the scanner only knows the built-in style IDs.

use html2docx_ooxml::DocxWriter;

use super::html::scan;
use super::{BackendFailure, BackendKind, ConversionInput, ConversionResult, Converter};

const NAME: &str = "fallback";

/// Converter using the minimal HTML scanner
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackConverter;

impl FallbackConverter {
    /// Create the converter
    pub fn new() -> Self {
        Self
    }
}

impl Converter for FallbackConverter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Fallback
    }

    fn convert(&self, input: &ConversionInput<'_>) -> ConversionResult {
        let mut writer = DocxWriter::new().title(input.title).language(input.locale);
        for block in scan(input.html) {
            writer.push(block);
        }
        log::debug!("fallback drafted {} blocks", writer.len());
        writer
            .build()
            .map_err(|e| BackendFailure::new(NAME, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_document_with_metadata() {
        let document = FallbackConverter::new()
            .convert(&ConversionInput {
                html: "<h2>A</h2><p>x <b>y</b></p>",
                title: "Notes",
                locale: "en-GB",
                template: None,
            })
            .unwrap();

        let core = document.core_properties().unwrap();
        assert_eq!(core.title().as_deref(), Some("Notes"));
        assert_eq!(core.language().as_deref(), Some("en-GB"));

        let paragraphs: Vec<_> = document.paragraphs().collect();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].style_id(), Some("Heading2"));
        assert_eq!(paragraphs[1].text(), "x y");
        assert!(paragraphs[1].runs().nth(1).unwrap().is_bold());
    }

    #[test]
    fn test_no_title_heading_is_added() {
        let document = FallbackConverter::new()
            .convert(&ConversionInput {
                html: "<p>only</p>",
                title: "Title",
                locale: "en-US",
                template: None,
            })
            .unwrap();
        let texts: Vec<_> = document.paragraphs().map(|p| p.text()).collect();
        assert_eq!(texts, vec!["only"]);
    }

    #[test]
    fn test_empty_html_gives_one_paragraph() {
        let document = FallbackConverter::new()
            .convert(&ConversionInput {
                html: "<!-- nothing -->",
                title: "T",
                locale: "en-US",
                template: None,
            })
            .unwrap();
        assert_eq!(document.paragraphs().count(), 1);
        assert!(document.paragraphs().next().unwrap().is_empty());
    }
}
