//! Error types for OOXML operations

use thiserror::Error;

/// Errors that can occur while reading, editing or writing a package
#[derive(Error, Debug)]
pub enum OoxmlError {
    /// Error reading or writing the ZIP archive
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Error reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing XML content
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Required part not found in the package
    #[error("Required file not found: {0}")]
    MissingFile(String),

    /// Invalid document structure
    #[error("Invalid document structure: {0}")]
    InvalidStructure(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OoxmlError {
    /// Wrap a lower-level decoding error (attribute, escape, encoding)
    pub(crate) fn decode(err: impl std::fmt::Display) -> Self {
        OoxmlError::InvalidStructure(err.to_string())
    }
}

/// Result type for OOXML operations
pub type Result<T> = std::result::Result<T, OoxmlError>;
