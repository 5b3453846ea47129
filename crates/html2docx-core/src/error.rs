//! Error types for the conversion pipeline

use thiserror::Error;

use html2docx_ooxml::OoxmlError;

use crate::backend::BackendFailure;

/// Errors that can end a conversion
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The request was rejected before the pipeline ran
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Neither the external converter nor the fallback produced a document
    #[error("All conversion backends failed: {external}; {fallback}")]
    BackendsExhausted {
        /// Why the external converter failed
        external: BackendFailure,
        /// Why the fallback failed
        fallback: BackendFailure,
    },

    /// The document could not be read, edited or written
    #[error("Document error: {0}")]
    Ooxml(#[from] OoxmlError),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, ConvertError>;
