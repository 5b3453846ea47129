//! html2docx CLI - Command-line interface library
//!
//! - Convert: HTML to a post-processed DOCX
//! - Inspect: summarize headings, metadata, language tags and page numbers
//!
//! # Binary Usage
//!
//! ```bash
//! # Convert with pandoc (falls back to the built-in converter)
//! html2docx convert page.html --title "Q3 Report" --start-level 2
//!
//! # Built-in converter only, custom output path
//! html2docx convert page.html --fallback-only -o report.docx
//!
//! # Check the result
//! html2docx inspect report.docx
//! ```

pub mod app;

pub use app::{convert_command, inspect_command, inspect_report, run_cli, ConvertOptions};
