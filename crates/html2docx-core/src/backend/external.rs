//! External conversion through pandoc

use std::path::PathBuf;
use std::process::Command;

use html2docx_ooxml::Document;

use super::{BackendFailure, BackendKind, ConversionInput, ConversionResult, Converter};

const NAME: &str = "pandoc";

/// Runs pandoc in a scratch directory
#[derive(Debug, Clone)]
pub struct ExternalConverter {
    program: PathBuf,
}

impl Default for ExternalConverter {
    fn default() -> Self {
        Self::new(NAME)
    }
}

impl ExternalConverter {
    /// Converter calling the given program name or path
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn failure(message: impl Into<String>) -> BackendFailure {
        BackendFailure::new(NAME, message)
    }
}

impl Converter for ExternalConverter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn kind(&self) -> BackendKind {
        BackendKind::External
    }

    fn convert(&self, input: &ConversionInput<'_>) -> ConversionResult {
        // Removed on drop, whichever way this returns
        let scratch = tempfile::Builder::new()
            .prefix("html2docx-")
            .tempdir()
            .map_err(|e| Self::failure(format!("cannot create scratch directory: {e}")))?;
        let input_path = scratch.path().join("input.html");
        let output_path = scratch.path().join("out.docx");

        std::fs::write(&input_path, input.html)
            .map_err(|e| Self::failure(format!("cannot write {}: {e}", input_path.display())))?;

        let mut command = Command::new(&self.program);
        command
            .arg("--from=html")
            .arg("--to=docx")
            .arg(format!("--output={}", output_path.display()))
            .arg(format!("--metadata=lang={}", input.locale))
            .arg(format!("--metadata=title={}", input.title));
        if let Some(template) = input.template {
            command.arg(format!("--reference-doc={}", template.path().display()));
        }
        command.arg(&input_path);

        log::debug!("running {:?}", command);
        let output = command.output().map_err(|e| {
            Self::failure(format!("cannot run {}: {e}", self.program.display()))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            return Err(Self::failure(if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                format!("exited with {}: {stderr}", output.status)
            }));
        }

        Document::open(&output_path).map_err(|e| Self::failure(format!("unusable output: {e}")))
    }
}
