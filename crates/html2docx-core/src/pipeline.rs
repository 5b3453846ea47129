//! Conversion pipeline
//!
//! Runs the backend, then the post-processing passes in a fixed order over
//! the one document it produced:
//!
//! 1. heading floor
//! 2. heading shift
//! 3. Strong/Emphasis mapping (when enabled)
//! 4. footer page numbers
//! 5. title, language and run tags
//!
//! and finally serializes the package.

use html2docx_ooxml::{Document, Template};

use crate::backend::{ConversionBackend, ConversionInput};
use crate::char_styles::map_character_styles;
use crate::config::Settings;
use crate::error::{ConvertError, Result};
use crate::footer::inject_page_numbers;
use crate::headings::{floor_headings, shift_headings};
use crate::language::apply_language;
use crate::request::{suggested_file_name, ConversionRequest, ConvertedDocument, MAX_HEADING_LEVEL};

/// The HTML to DOCX pipeline
#[derive(Debug)]
pub struct Pipeline {
    settings: Settings,
    backend: ConversionBackend,
}

impl Pipeline {
    /// Pipeline with backends configured from `settings`
    pub fn new(settings: Settings) -> Self {
        let backend = ConversionBackend::new(&settings.backend);
        Self { settings, backend }
    }

    /// Pipeline with an explicit backend
    pub fn with_backend(settings: Settings, backend: ConversionBackend) -> Self {
        Self { settings, backend }
    }

    /// Active settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Load the configured template. A missing file is fine; an unreadable
    /// one is ignored with a warning.
    pub fn resolve_template(&self) -> Option<Template> {
        let path = self.settings.backend.template.as_ref()?;
        if !path.exists() {
            log::debug!("template {} not found, using default styles", path.display());
            return None;
        }
        match Template::load(path) {
            Ok(template) => {
                log::debug!(
                    "using template {} ({} styles)",
                    path.display(),
                    template.styles().len()
                );
                Some(template)
            }
            Err(e) => {
                log::warn!("ignoring template {}: {e}", path.display());
                None
            }
        }
    }

    /// Convert one request into DOCX bytes
    pub fn convert(&self, request: &ConversionRequest) -> Result<ConvertedDocument> {
        if !(1..=MAX_HEADING_LEVEL).contains(&request.start_level) {
            return Err(ConvertError::Validation(format!(
                "start level must be between 1 and {MAX_HEADING_LEVEL}, got {}",
                request.start_level
            )));
        }

        let document_settings = &self.settings.document;
        let title = request.effective_title(&document_settings.default_title);
        let html = if request.html_body.trim().is_empty() {
            log::debug!("empty body, using placeholder");
            document_settings.placeholder_body.as_str()
        } else {
            request.html_body.as_str()
        };

        let template = self.resolve_template();
        let input = ConversionInput {
            html,
            title,
            locale: &document_settings.locale,
            template: template.as_ref(),
        };
        let (mut document, backend) = self.backend.convert(&input)?;

        self.post_process(&mut document, request, title)?;

        let bytes = document.to_bytes()?;
        log::info!("Produced {} bytes with the {backend} backend", bytes.len());
        Ok(ConvertedDocument {
            bytes,
            file_name: suggested_file_name(title),
            backend,
        })
    }

    /// Run the post-processing passes on a raw document
    pub fn post_process(
        &self,
        document: &mut Document,
        request: &ConversionRequest,
        title: &str,
    ) -> Result<()> {
        let floor = floor_headings(document);
        let shift = shift_headings(document, request.start_level);
        log::debug!("headings: floor {floor:?}, shift {shift:?}");

        if request.strong_emph {
            map_character_styles(document);
        }

        let fields = inject_page_numbers(document)?;
        log::debug!("inserted {fields} page number fields");

        let runs = apply_language(document, title, &self.settings.document.locale);
        log::debug!("tagged {runs} runs");
        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
