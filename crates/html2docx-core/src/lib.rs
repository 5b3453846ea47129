//! # html2docx-core
//!
//! HTML to DOCX conversion with deterministic post-processing.
//!
//! A [`Pipeline`] converts HTML with pandoc (or a built-in fallback when
//! pandoc is missing or fails) and then reshapes the result:
//!
//! - heading hierarchy rebased to level 1, then shifted to a start level
//! - bold/italic runs mapped to the Strong/Emphasis character styles
//! - a centered PAGE field in every section footer
//! - title and language metadata, language tags on every run
//!
//! ## Example
//!
//! ```no_run
//! use html2docx_core::{ConversionRequest, Pipeline, Settings};
//!
//! let pipeline = Pipeline::new(Settings::default());
//! let request = ConversionRequest::new("<h2>Intro</h2><p>Hello</p>")
//!     .with_title("Notes")
//!     .with_start_level(2);
//! let converted = pipeline.convert(&request)?;
//! std::fs::write(&converted.file_name, &converted.bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backend;
pub mod char_styles;
pub mod config;
pub mod error;
pub mod footer;
pub mod headings;
pub mod language;
pub mod pipeline;
pub mod request;

#[cfg(test)]
mod test_support;

pub use backend::{
    BackendFailure, BackendKind, ConversionBackend, ConversionInput, ConversionResult, Converter,
    ExternalConverter, FallbackConverter,
};
pub use char_styles::{map_character_styles, StyleMappingReport};
pub use config::Settings;
pub use error::{ConvertError, Result};
pub use footer::{count_page_fields, inject_page_numbers};
pub use headings::{floor_headings, heading_level, heading_levels, shift_headings, RemapReport};
pub use language::{apply_language, language_coverage, set_metadata, tag_runs};
pub use pipeline::Pipeline;
pub use request::{suggested_file_name, ConversionRequest, ConvertedDocument};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
