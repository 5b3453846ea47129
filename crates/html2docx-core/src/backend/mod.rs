//! Conversion backends with fallback
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              ConversionBackend               │
//! ├──────────────────────────────────────────────┤
//! │  1. ExternalConverter (pandoc)               │
//! │  2. FallbackConverter (built-in scanner)     │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The external converter is tried first unless the settings disable it.
//! Its failure is logged and the fallback takes over; the backend only
//! reports an error when both fail.

pub mod external;
pub mod fallback;
pub mod html;

use std::fmt;

use html2docx_ooxml::{Document, Template};
use thiserror::Error;

use crate::config::BackendSettings;
use crate::error::{ConvertError, Result};

pub use external::ExternalConverter;
pub use fallback::FallbackConverter;

/// Everything a converter needs for one document
#[derive(Debug, Clone, Copy)]
pub struct ConversionInput<'a> {
    /// HTML to convert
    pub html: &'a str,
    /// Document title (already defaulted)
    pub title: &'a str,
    /// Language tag
    pub locale: &'a str,
    /// Validated style template, if any
    pub template: Option<&'a Template>,
}

/// Why a converter could not produce a document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{backend}: {message}")]
pub struct BackendFailure {
    /// Converter name
    pub backend: String,
    /// Diagnostic message
    pub message: String,
}

impl BackendFailure {
    /// Failure of the named converter
    pub fn new(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

/// Result of a single converter
pub type ConversionResult = std::result::Result<Document, BackendFailure>;

/// Which path produced the raw document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// The external converter
    External,
    /// The built-in fallback
    Fallback,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::External => write!(f, "external"),
            BackendKind::Fallback => write!(f, "fallback"),
        }
    }
}

/// An HTML to DOCX converter
pub trait Converter: Send + Sync {
    /// Name used in logs and failures
    fn name(&self) -> &'static str;

    /// Which path this converter represents
    fn kind(&self) -> BackendKind;

    /// Convert one document
    fn convert(&self, input: &ConversionInput<'_>) -> ConversionResult;
}

/// External converter first, fallback second
pub struct ConversionBackend {
    primary: Option<Box<dyn Converter>>,
    fallback: Box<dyn Converter>,
}

impl fmt::Debug for ConversionBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionBackend")
            .field("primary", &self.primary.as_ref().map(|c| c.name()))
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

impl ConversionBackend {
    /// Backend configured from settings
    pub fn new(settings: &BackendSettings) -> Self {
        let primary: Option<Box<dyn Converter>> = if settings.fallback_only {
            log::debug!("external converter disabled by settings");
            None
        } else {
            Some(Box::new(ExternalConverter::new(&settings.pandoc)))
        };
        Self::with_converters(primary, Box::new(FallbackConverter::new()))
    }

    /// Backend with explicit converters
    pub fn with_converters(
        primary: Option<Box<dyn Converter>>,
        fallback: Box<dyn Converter>,
    ) -> Self {
        Self { primary, fallback }
    }

    /// Names of the converters in the order they are tried
    pub fn converter_names(&self) -> Vec<&'static str> {
        self.primary
            .iter()
            .map(|c| c.name())
            .chain(std::iter::once(self.fallback.name()))
            .collect()
    }

    /// Produce a raw document, falling back when the primary fails
    pub fn convert(&self, input: &ConversionInput<'_>) -> Result<(Document, BackendKind)> {
        let external = match &self.primary {
            Some(primary) => match primary.convert(input) {
                Ok(document) => {
                    log::info!("Converted with {}", primary.name());
                    return Ok((document, primary.kind()));
                }
                Err(failure) => {
                    log::warn!("Converter {failure}; using the fallback");
                    failure
                }
            },
            None => BackendFailure::new("external", "skipped"),
        };

        match self.fallback.convert(input) {
            Ok(document) => {
                log::info!("Converted with {}", self.fallback.name());
                Ok((document, self.fallback.kind()))
            }
            Err(fallback) => {
                log::warn!("Converter {fallback}");
                Err(ConvertError::BackendsExhausted { external, fallback })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingConverter, FixedConverter};

    fn input() -> ConversionInput<'static> {
        ConversionInput {
            html: "<p>x</p>",
            title: "T",
            locale: "en-US",
            template: None,
        }
    }

    #[test]
    fn test_primary_success() {
        let backend = ConversionBackend::with_converters(
            Some(Box::new(FixedConverter::external("<w:p/>"))),
            Box::new(FailingConverter::fallback("unused")),
        );
        let (_, kind) = backend.convert(&input()).unwrap();
        assert_eq!(kind, BackendKind::External);
    }

    #[test]
    fn test_primary_failure_falls_back() {
        let backend = ConversionBackend::with_converters(
            Some(Box::new(FailingConverter::external("not installed"))),
            Box::new(FallbackConverter::new()),
        );
        let (document, kind) = backend.convert(&input()).unwrap();
        assert_eq!(kind, BackendKind::Fallback);
        assert_eq!(document.paragraphs().next().unwrap().text(), "x");
    }

    #[test]
    fn test_both_failing_reports_both() {
        let backend = ConversionBackend::with_converters(
            Some(Box::new(FailingConverter::external("exit status 1"))),
            Box::new(FailingConverter::fallback("broken")),
        );
        let err = backend.convert(&input()).unwrap_err();
        match &err {
            ConvertError::BackendsExhausted { external, fallback } => {
                assert_eq!(external.message, "exit status 1");
                assert_eq!(fallback.message, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("exit status 1"));
    }

    #[test]
    fn test_fallback_only_settings() {
        let settings = BackendSettings {
            fallback_only: true,
            ..Default::default()
        };
        let backend = ConversionBackend::new(&settings);
        assert_eq!(backend.converter_names(), vec!["fallback"]);
        let (_, kind) = backend.convert(&input()).unwrap();
        assert_eq!(kind, BackendKind::Fallback);

        let backend = ConversionBackend::new(&BackendSettings::default());
        assert_eq!(backend.converter_names(), vec!["pandoc", "fallback"]);
    }

    #[test]
    fn test_backend_kind_display() {
        assert_eq!(BackendKind::External.to_string(), "external");
        assert_eq!(BackendKind::Fallback.to_string(), "fallback");
    }
}
