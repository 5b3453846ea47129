//! Heading normalization
//!
//! Headings are body paragraphs whose style name reads `Heading N`. Two
//! passes run in order: the floor pass moves the shallowest heading to level
//! 1, the shift pass then starts the hierarchy at the requested level.
//! Retargeting goes through the document's own style sheet; when the target
//! style does not exist the paragraph keeps its style.

use html2docx_ooxml::{Document, StyleSheet, StyleType};

use crate::request::MAX_HEADING_LEVEL;

/// Outcome of one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemapReport {
    /// Headings moved to another level
    pub remapped: usize,
    /// Headings left alone because the target style is missing
    pub skipped: usize,
}

/// Level encoded in a style name: it must start with "Heading" (any case)
/// and the first number in it must be 1-9
pub fn heading_level(style_name: &str) -> Option<u8> {
    let name = style_name.trim_start();
    let prefix = name.get(..7)?;
    if !prefix.eq_ignore_ascii_case("heading") {
        return None;
    }

    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    let level: u8 = digits.parse().ok()?;
    (1..=MAX_HEADING_LEVEL).contains(&level).then_some(level)
}

/// Heading level of every body paragraph, `None` for non-headings
pub fn paragraph_levels(document: &Document) -> Vec<Option<u8>> {
    let styles = document.styles();
    document
        .paragraphs()
        .map(|p| {
            p.style_id()
                .and_then(|id| heading_level(styles.display_name(id)))
        })
        .collect()
}

/// Levels of the body headings, in document order
pub fn heading_levels(document: &Document) -> Vec<u8> {
    paragraph_levels(document).into_iter().flatten().collect()
}

/// Style IDs for `Heading 1` to `Heading 9`
struct HeadingStyles {
    ids: Vec<Option<String>>,
}

impl HeadingStyles {
    fn resolve(styles: &StyleSheet) -> Self {
        let ids = (1..=MAX_HEADING_LEVEL)
            .map(|level| {
                styles
                    .find_by_name(&format!("Heading {level}"), StyleType::Paragraph)
                    .map(|style| style.id.clone())
            })
            .collect();
        Self { ids }
    }

    fn id(&self, level: u8) -> Option<&str> {
        self.ids.get(usize::from(level).checked_sub(1)?)?.as_deref()
    }
}

/// Move every heading to `target(level)`
fn remap(document: &mut Document, target: impl Fn(u8) -> u8) -> RemapReport {
    let levels = paragraph_levels(document);
    let styles = HeadingStyles::resolve(document.styles());
    let mut report = RemapReport::default();

    for (mut paragraph, level) in document.paragraphs_mut().zip(levels) {
        let Some(level) = level else { continue };
        let wanted = target(level);
        if wanted == level {
            continue;
        }
        match styles.id(wanted) {
            Some(id) => {
                paragraph.set_style_id(id);
                report.remapped += 1;
            }
            None => {
                log::debug!("no \"Heading {wanted}\" style, keeping level {level}");
                report.skipped += 1;
            }
        }
    }

    report
}

/// Rebase headings so the shallowest one is level 1
pub fn floor_headings(document: &mut Document) -> RemapReport {
    let Some(min) = heading_levels(document).into_iter().min() else {
        return RemapReport::default();
    };
    if min <= 1 {
        return RemapReport::default();
    }

    let offset = min - 1;
    let report = remap(document, |level| {
        if level >= min {
            (level - offset).max(1)
        } else {
            level
        }
    });
    log::debug!("floor pass moved headings up by {offset}: {report:?}");
    report
}

/// Start the hierarchy at `start_level`, clamping at 9
pub fn shift_headings(document: &mut Document, start_level: u8) -> RemapReport {
    if start_level <= 1 {
        return RemapReport::default();
    }

    let offset = start_level - 1;
    let report = remap(document, |level| {
        level.saturating_add(offset).min(MAX_HEADING_LEVEL)
    });
    log::debug!("shift pass moved headings down by {offset}: {report:?}");
    report
}
