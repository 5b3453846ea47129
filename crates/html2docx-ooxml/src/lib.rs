//! # html2docx-ooxml
//!
//! OOXML (Office Open XML) package handling for html2docx.
//!
//! This crate provides functionality to:
//! - Unpack and repack DOCX files
//! - Edit the main document as a lossless element tree through typed
//!   paragraph, run, table and section views
//! - Maintain relationships, content types and core properties
//! - Write minimal DOCX packages with a built-in style set
//!
//! ## Example: Retargeting a Paragraph
//!
//! ```no_run
//! use html2docx_ooxml::{Document, StyleType};
//!
//! let mut document = Document::open("report.docx")?;
//! let heading = document
//!     .styles()
//!     .find_by_name("Heading 1", StyleType::Paragraph)
//!     .map(|style| style.id.clone());
//!
//! if let (Some(id), Some(mut first)) = (heading, document.paragraphs_mut().next()) {
//!     first.set_style_id(&id);
//! }
//! document.save("report.docx")?;
//! # Ok::<(), html2docx_ooxml::OoxmlError>(())
//! ```

pub mod archive;
pub mod content_types;
pub mod core_properties;
pub mod document;
pub mod error;
pub mod relationships;
pub mod styles;
pub mod template;
pub mod writer;
pub mod xml;

#[cfg(test)]
mod test_utils;

pub use archive::OoxmlArchive;
pub use content_types::ContentTypes;
pub use core_properties::CoreProperties;
pub use document::{contains_element, Document, Paragraph, Run, Table};
pub use error::{OoxmlError, Result};
pub use relationships::Relationships;
pub use styles::{Style, StyleSheet, StyleType};
pub use template::Template;
pub use writer::DocxWriter;
pub use xml::{XmlElement, XmlNode, XmlPart};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
