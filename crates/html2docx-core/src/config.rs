//! Configuration settings
//!
//! Loaded from an optional `html2docx.toml`; every field has a default so a
//! missing file or a partial one is fine.
//!
//! ```toml
//! [document]
//! default_title = "Converted Document"
//! locale = "en-US"
//!
//! [backend]
//! pandoc = "/usr/local/bin/pandoc"
//! template = "assets/reference.docx"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;

/// Title used when the caller supplies none
pub const DEFAULT_TITLE: &str = "Converted Document";
/// Language written to metadata and runs
pub const DEFAULT_LOCALE: &str = "en-US";
/// Body used when the caller supplies an empty one
pub const PLACEHOLDER_BODY: &str = "<p>(empty)</p>";

/// Top-level settings structure
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Document defaults
    pub document: DocumentSettings,
    /// Conversion backend settings
    pub backend: BackendSettings,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load settings from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&text)?)
    }
}

/// Defaults applied to every document
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    /// Title when the request has none
    pub default_title: String,
    /// Language tag for metadata and runs
    pub locale: String,
    /// HTML used when the request body is empty
    pub placeholder_body: String,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            default_title: DEFAULT_TITLE.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            placeholder_body: PLACEHOLDER_BODY.to_string(),
        }
    }
}

/// Conversion backend configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Program name or path of the external converter
    pub pandoc: String,
    /// Optional reference document with named styles
    pub template: Option<PathBuf>,
    /// Skip the external converter entirely
    pub fallback_only: bool,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            pandoc: "pandoc".to_string(),
            template: None,
            fallback_only: false,
        }
    }
}
