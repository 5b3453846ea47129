//! Reference documents supplying named style definitions
//!
//! A template is only useful to the external converter when it is a readable
//! DOCX with a style sheet, so loading validates both up front.

use std::path::{Path, PathBuf};

use crate::archive::{OoxmlArchive, DOCUMENT_RELS_PART, STYLES_PART};
use crate::error::{OoxmlError, Result};
use crate::relationships::{resolve_target, Relationships};
use crate::styles::{StyleSheet, StyleType};

/// A validated style template (.docx or .dotx)
#[derive(Debug, Clone)]
pub struct Template {
    path: PathBuf,
    styles: StyleSheet,
}

impl Template {
    /// Load and validate a template file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let archive = OoxmlArchive::open(path)?;
        let styles = Self::read_styles(&archive)?;
        Ok(Self {
            path: path.to_path_buf(),
            styles,
        })
    }

    fn read_styles(archive: &OoxmlArchive) -> Result<StyleSheet> {
        let from_rels = match archive.get(DOCUMENT_RELS_PART) {
            Some(xml) => Relationships::parse(xml)?
                .find_by_type(Relationships::TYPE_STYLES)
                .map(|rel| resolve_target("word/document.xml", &rel.target)),
            None => None,
        };
        let path = from_rels.unwrap_or_else(|| STYLES_PART.to_string());
        let styles = StyleSheet::parse(archive.require(&path)?)?;
        if styles.is_empty() {
            return Err(OoxmlError::InvalidStructure(format!(
                "{path} defines no styles"
            )));
        }
        Ok(styles)
    }

    /// Path the template was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Style definitions of the template
    pub fn styles(&self) -> &StyleSheet {
        &self.styles
    }

    /// Whether the template defines a style with this name and type
    pub fn has_style(&self, name: &str, style_type: StyleType) -> bool {
        self.styles.find_by_name(name, style_type).is_some()
    }
}
