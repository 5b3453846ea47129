//! Relationship parts (`*.rels`)
//!
//! Every part that points at another part (the document at its styles and
//! footers, the package at its main document and core properties) does so
//! through a relationship ID declared in a sibling `_rels/*.rels` file.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{OoxmlError, Result};
use crate::xml::escape_attr;

/// OOXML namespace for relationships
pub const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Common relationship type URIs
impl Relationships {
    /// Main document (package level)
    pub const TYPE_OFFICE_DOCUMENT: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    /// Core properties (package level)
    pub const TYPE_CORE_PROPERTIES: &'static str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    /// Styles relationship type
    pub const TYPE_STYLES: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    /// Footer relationship type
    pub const TYPE_FOOTER: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
    /// Hyperlink relationship type
    pub const TYPE_HYPERLINK: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
}

/// A single relationship entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID, e.g. `rId3`
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative to the source part's folder) or URL
    pub target: String,
    /// `External` for URLs
    pub target_mode: Option<String>,
}

/// Parsed relationships of one source part, in document order
#[derive(Debug, Clone)]
pub struct Relationships {
    entries: Vec<Relationship>,
    next_id: u32,
}

impl Default for Relationships {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl Relationships {
    /// Create an empty relationship set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `.rels` part
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut rels = Self::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let mut id = None;
                    let mut target = None;
                    let mut rel_type = None;
                    let mut target_mode = None;

                    for attr in e.attributes() {
                        let attr = attr.map_err(OoxmlError::decode)?;
                        let value = attr
                            .unescape_value()
                            .map_err(OoxmlError::decode)?
                            .into_owned();
                        match attr.key.as_ref() {
                            b"Id" => id = Some(value),
                            b"Target" => target = Some(value),
                            b"Type" => rel_type = Some(value),
                            b"TargetMode" => target_mode = Some(value),
                            _ => {}
                        }
                    }

                    if let (Some(id), Some(target)) = (id, target) {
                        rels.push(Relationship {
                            id,
                            rel_type: rel_type.unwrap_or_default(),
                            target,
                            target_mode,
                        });
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(OoxmlError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    fn push(&mut self, rel: Relationship) {
        if let Some(num) = extract_id_number(&rel.id) {
            self.next_id = self.next_id.max(num + 1);
        }
        self.entries.push(rel);
    }

    /// Add an internal relationship and return its generated ID
    pub fn add(&mut self, target: impl Into<String>, rel_type: impl Into<String>) -> String {
        let mut id = format!("rId{}", self.next_id);
        // Skip over non-numeric IDs that happen to collide
        while self.get(&id).is_some() {
            self.next_id += 1;
            id = format!("rId{}", self.next_id);
        }
        self.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.into(),
            target: target.into(),
            target_mode: None,
        });
        id
    }

    /// Look up a relationship by ID
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.entries.iter().find(|rel| rel.id == id)
    }

    /// First relationship of the given type
    pub fn find_by_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.entries.iter().find(|rel| rel.rel_type == rel_type)
    }

    /// Whether any relationship already targets `target`
    pub fn targets(&self, target: &str) -> bool {
        self.entries.iter().any(|rel| rel.target == target)
    }

    /// Number of relationships
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no relationships
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in document order
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.entries.iter()
    }

    /// Serialize to a `.rels` part
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<Relationships xmlns="{}">"#, RELATIONSHIPS_NS));

        for rel in &self.entries {
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                escape_attr(&rel.id),
                escape_attr(&rel.rel_type),
                escape_attr(&rel.target)
            ));
            if let Some(mode) = &rel.target_mode {
                xml.push_str(&format!(r#" TargetMode="{}""#, escape_attr(mode)));
            }
            xml.push_str("/>");
        }

        xml.push_str("</Relationships>");
        xml
    }
}

/// Path of the `.rels` part that belongs to `part`
///
/// `word/document.xml` maps to `word/_rels/document.xml.rels`, the package
/// root (empty string) to `_rels/.rels`.
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target to an archive path
///
/// Targets are relative to the folder of the source part unless they start
/// with `/`, in which case they are relative to the package root.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    let mut segments: Vec<&str> = match target.strip_prefix('/') {
        Some(_) => Vec::new(),
        None => source_part
            .rsplit_once('/')
            .map(|(dir, _)| dir.split('/').collect())
            .unwrap_or_default(),
    };

    for segment in target.trim_start_matches('/').split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Numeric part of a relationship ID (`rId5` -> 5)
fn extract_id_number(id: &str) -> Option<u32> {
    id.strip_prefix("rId")
        .or_else(|| id.strip_prefix("RId"))
        .or_else(|| id.strip_prefix("rid"))
        .and_then(|num| num.parse().ok())
}
