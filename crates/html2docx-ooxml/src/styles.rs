//! Style definitions parsing (word/styles.xml)
//!
//! Passes refer to styles by their display name ("Heading 2", "Strong") and
//! write the matching style ID into the document. Names are compared
//! case-insensitively with whitespace collapsed, because Word stores its
//! built-in heading names in lower case (`heading 2`) while converters such
//! as pandoc use title case.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{OoxmlError, Result};

/// Collection of styles from a document, in definition order
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    styles: Vec<Style>,
    by_id: HashMap<String, usize>,
    /// Default paragraph style ID
    pub default_paragraph: Option<String>,
}

/// A Word style definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    /// Style ID (used in document references)
    pub id: String,
    /// Display name
    pub name: String,
    /// Style type
    pub style_type: StyleType,
    /// Base style ID (for inheritance)
    pub based_on: Option<String>,
}

/// Type of style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleType {
    /// Paragraph style
    Paragraph,
    /// Character (run) style
    Character,
    /// Table style
    Table,
    /// Numbering style
    Numbering,
}

impl StyleType {
    fn from_attr(value: &str) -> Self {
        match value {
            "character" => StyleType::Character,
            "table" => StyleType::Table,
            "numbering" => StyleType::Numbering,
            _ => StyleType::Paragraph,
        }
    }
}

#[derive(Default)]
struct StyleBuilder {
    id: Option<String>,
    name: Option<String>,
    style_type: Option<StyleType>,
    based_on: Option<String>,
    is_default: bool,
}

impl StyleBuilder {
    fn open(e: &BytesStart<'_>) -> Result<Self> {
        Ok(Self {
            id: get_attr(e, b"w:styleId")?,
            style_type: get_attr(e, b"w:type")?.map(|t| StyleType::from_attr(&t)),
            is_default: get_attr(e, b"w:default")?.as_deref() == Some("1"),
            ..Default::default()
        })
    }

    fn read_property(&mut self, e: &BytesStart<'_>) -> Result<()> {
        match e.local_name().as_ref() {
            b"name" => self.name = get_attr(e, b"w:val")?,
            b"basedOn" => self.based_on = get_attr(e, b"w:val")?,
            _ => {}
        }
        Ok(())
    }

    fn build(self) -> Option<Style> {
        let id = self.id?;
        Some(Style {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            style_type: self.style_type.unwrap_or(StyleType::Paragraph),
            based_on: self.based_on,
        })
    }
}

impl StyleSheet {
    /// Parse styles from XML bytes
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut sheet = StyleSheet::default();
        let mut buf = Vec::new();
        let mut current: Option<StyleBuilder> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    if e.local_name().as_ref() == b"style" {
                        current = Some(StyleBuilder::open(e)?);
                    } else if let Some(builder) = current.as_mut() {
                        builder.read_property(e)?;
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    if e.local_name().as_ref() == b"style" {
                        // <w:style/> without children
                        sheet.insert(StyleBuilder::open(e)?);
                    } else if let Some(builder) = current.as_mut() {
                        builder.read_property(e)?;
                    }
                }
                Ok(Event::End(ref e)) if e.local_name().as_ref() == b"style" => {
                    if let Some(builder) = current.take() {
                        sheet.insert(builder);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(OoxmlError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheet)
    }

    fn insert(&mut self, builder: StyleBuilder) {
        let is_default = builder.is_default;
        let Some(style) = builder.build() else {
            return;
        };
        if is_default && style.style_type == StyleType::Paragraph {
            self.default_paragraph = Some(style.id.clone());
        }
        match self.by_id.get(&style.id) {
            // Later definitions win, as in Word
            Some(&index) => self.styles[index] = style,
            None => {
                self.by_id.insert(style.id.clone(), self.styles.len());
                self.styles.push(style);
            }
        }
    }

    /// Get a style by ID
    pub fn get(&self, id: &str) -> Option<&Style> {
        self.by_id.get(id).map(|&index| &self.styles[index])
    }

    /// All styles in definition order
    pub fn all(&self) -> impl Iterator<Item = &Style> {
        self.styles.iter()
    }

    /// Number of styles
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Whether the sheet defines no styles
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Display name of a referenced style, falling back to the ID itself
    /// when the style is not defined
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map(|s| s.name.as_str()).unwrap_or(id)
    }

    /// First style of the given type whose name matches `name`
    pub fn find_by_name(&self, name: &str, style_type: StyleType) -> Option<&Style> {
        let wanted = normalize_name(name);
        self.styles
            .iter()
            .find(|s| s.style_type == style_type && normalize_name(&s.name) == wanted)
    }
}

/// Lowercase with runs of whitespace collapsed to one space
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn get_attr(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(OoxmlError::decode)?;
        if attr.key.as_ref() == name {
            let value = attr.unescape_value().map_err(OoxmlError::decode)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
