//! The `[Content_Types].xml` table
//!
//! Every part added to a package needs either a `Default` entry for its
//! extension or an `Override` entry for its exact part name.

use crate::error::Result;
use crate::xml::{XmlElement, XmlPart};

/// Namespace of the content types table
pub const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// Content type of the main document part
pub const CT_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
/// Content type of the style definitions part
pub const CT_STYLES: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
/// Content type of a footer part
pub const CT_FOOTER: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";
/// Content type of the core properties part
pub const CT_CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
/// Content type of relationship parts
pub const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";

/// Editable content types table
#[derive(Debug, Clone)]
pub struct ContentTypes {
    part: XmlPart,
}

impl Default for ContentTypes {
    fn default() -> Self {
        let root = XmlElement::new("Types")
            .with_attr("xmlns", CONTENT_TYPES_NS)
            .with_child(
                XmlElement::new("Default")
                    .with_attr("Extension", "rels")
                    .with_attr("ContentType", CT_RELATIONSHIPS),
            )
            .with_child(
                XmlElement::new("Default")
                    .with_attr("Extension", "xml")
                    .with_attr("ContentType", "application/xml"),
            );
        Self {
            part: XmlPart::new(root),
        }
    }
}

impl ContentTypes {
    /// A table with the `rels` and `xml` defaults only
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an existing table
    pub fn parse(xml: &[u8]) -> Result<Self> {
        Ok(Self {
            part: XmlPart::parse(xml)?,
        })
    }

    /// Content type registered for an archive path, checking overrides
    /// before extension defaults
    pub fn content_type_of(&self, path: &str) -> Option<&str> {
        let part_name = part_name(path);
        let overridden = self
            .part
            .root
            .children_named("Override")
            .find(|e| {
                e.attr("PartName")
                    .is_some_and(|name| name.eq_ignore_ascii_case(&part_name))
            })
            .and_then(|e| e.attr("ContentType"));
        if overridden.is_some() {
            return overridden;
        }

        let extension = path.rsplit_once('.').map(|(_, ext)| ext)?;
        self.part
            .root
            .children_named("Default")
            .find(|e| {
                e.attr("Extension")
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
            })
            .and_then(|e| e.attr("ContentType"))
    }

    /// Register `content_type` for the archive path `path` unless an
    /// override for it already exists. Returns whether an entry was added.
    pub fn ensure_override(&mut self, path: &str, content_type: &str) -> bool {
        let part_name = part_name(path);
        let exists = self.part.root.children_named("Override").any(|e| {
            e.attr("PartName")
                .is_some_and(|name| name.eq_ignore_ascii_case(&part_name))
        });
        if exists {
            return false;
        }
        self.part.root.push(
            XmlElement::new("Override")
                .with_attr("PartName", part_name)
                .with_attr("ContentType", content_type),
        );
        true
    }

    /// Register a default content type for an extension unless present
    pub fn ensure_default(&mut self, extension: &str, content_type: &str) -> bool {
        let exists = self.part.root.children_named("Default").any(|e| {
            e.attr("Extension")
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        });
        if exists {
            return false;
        }
        self.part.root.push(
            XmlElement::new("Default")
                .with_attr("Extension", extension)
                .with_attr("ContentType", content_type),
        );
        true
    }

    /// Serialize the table
    pub fn to_xml(&self) -> String {
        self.part.to_xml()
    }
}

/// `word/footer1.xml` -> `/word/footer1.xml`
fn part_name(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}
