//! Page number field in section footers

use html2docx_ooxml::{Document, OoxmlError, Paragraph, XmlElement};

use crate::error::Result;

/// Whether a field instruction is a PAGE field
fn is_page_instruction(instruction: &str) -> bool {
    instruction
        .split_whitespace()
        .next()
        .is_some_and(|name| name.eq_ignore_ascii_case("PAGE"))
}

/// Number of PAGE fields (complex or simple) below `root`
pub fn count_page_fields(root: &XmlElement) -> usize {
    let mut count = 0;
    root.walk(&mut |element| {
        let page = match element.local_name() {
            "instrText" => is_page_instruction(&element.text_content()),
            "fldSimple" => element.attr_local("instr").is_some_and(is_page_instruction),
            _ => false,
        };
        if page {
            count += 1;
        }
    });
    count
}

/// A run holding a complete `PAGE` field
fn page_field_run() -> XmlElement {
    XmlElement::new("w:r")
        .with_child(XmlElement::new("w:fldChar").with_attr("w:fldCharType", "begin"))
        .with_child(
            XmlElement::new("w:instrText")
                .with_attr("xml:space", "preserve")
                .with_text(" PAGE "),
        )
        .with_child(XmlElement::new("w:fldChar").with_attr("w:fldCharType", "end"))
}

/// Give every section a default footer with a centered page number.
/// Footers that already hold a PAGE field are left alone. Returns the
/// number of fields inserted.
pub fn inject_page_numbers(document: &mut Document) -> Result<usize> {
    if document.ensure_section() {
        log::debug!("document had no section, appended one");
    }

    let mut inserted = 0;
    for section in 0..document.sections().len() {
        let path = document.ensure_default_footer(section)?;
        let footer = document.footer_mut(&path).ok_or_else(|| {
            OoxmlError::MissingFile(path.clone())
        })?;

        if count_page_fields(footer) > 0 {
            log::debug!("{path} already has a page number");
            continue;
        }

        let reuse_first = footer
            .children_named("p")
            .next()
            .is_some_and(|p| Paragraph::new(p).is_empty());
        if !reuse_first {
            footer.push(XmlElement::new("w:p"));
        }
        let target = if reuse_first {
            footer.children_named_mut("p").next()
        } else {
            footer.children_named_mut("p").last()
        };
        let Some(element) = target else { continue };

        let mut paragraph = Paragraph::new(element);
        paragraph.set_alignment("center");
        paragraph.push_run(page_field_run());
        inserted += 1;
        log::debug!("added page number to {path}");
    }

    Ok(inserted)
}
