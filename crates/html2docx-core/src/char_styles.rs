//! Bold and italic runs to Strong and Emphasis character styles

use html2docx_ooxml::{Document, StyleType};

/// Outcome of the mapping pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StyleMappingReport {
    /// Runs given the Strong style
    pub strong: usize,
    /// Runs given the Emphasis style
    pub emphasis: usize,
    /// Assignments dropped because the style is not defined
    pub skipped: usize,
}

fn character_style_id(document: &Document, name: &str) -> Option<String> {
    let id = document
        .styles()
        .find_by_name(name, StyleType::Character)
        .map(|style| style.id.clone());
    if id.is_none() {
        log::debug!("no \"{name}\" character style");
    }
    id
}

/// Point bold runs at Strong and italic runs at Emphasis. Only runs directly
/// inside body paragraphs are touched; direct `w:b`/`w:i` stay in place.
pub fn map_character_styles(document: &mut Document) -> StyleMappingReport {
    let strong = character_style_id(document, "Strong");
    let emphasis = character_style_id(document, "Emphasis");
    let mut report = StyleMappingReport::default();

    for mut paragraph in document.paragraphs_mut() {
        for mut run in paragraph.runs_mut() {
            // Emphasis is applied last so it wins on bold italic runs
            if run.is_bold() {
                match &strong {
                    Some(id) => {
                        run.set_style_id(id);
                        report.strong += 1;
                    }
                    None => report.skipped += 1,
                }
            }
            if run.is_italic() {
                match &emphasis {
                    Some(id) => {
                        run.set_style_id(id);
                        report.emphasis += 1;
                    }
                    None => report.skipped += 1,
                }
            }
        }
    }

    log::debug!("character style mapping: {report:?}");
    report
}
