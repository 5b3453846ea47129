//! Fixtures shared by the unit tests

use std::io::{Cursor, Write};

use html2docx_ooxml::Document;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::backend::{BackendFailure, BackendKind, ConversionInput, ConversionResult, Converter};

/// Title-case heading names as pandoc writes them, no character styles
pub const PANDOC_STYLES: &str = r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="Heading 1"/></w:style>
<w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="Heading 2"/></w:style>
<w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="Heading 3"/></w:style>
<w:style w:type="paragraph" w:styleId="Heading4"><w:name w:val="Heading 4"/></w:style>
<w:style w:type="paragraph" w:styleId="Heading5"><w:name w:val="Heading 5"/></w:style>
<w:style w:type="paragraph" w:styleId="Heading6"><w:name w:val="Heading 6"/></w:style>
<w:style w:type="paragraph" w:styleId="Heading7"><w:name w:val="Heading 7"/></w:style>
<w:style w:type="paragraph" w:styleId="Heading8"><w:name w:val="Heading 8"/></w:style>
<w:style w:type="paragraph" w:styleId="Heading9"><w:name w:val="Heading 9"/></w:style>
<w:style w:type="character" w:styleId="VerbatimChar"><w:name w:val="Verbatim Char"/></w:style>"#;

/// Character styles with IDs that differ from their names
pub const CHARACTER_STYLES: &str = r#"<w:style w:type="character" w:styleId="StrongChar"><w:name w:val="Strong"/></w:style>
<w:style w:type="character" w:styleId="EmphasisChar"><w:name w:val="emphasis"/></w:style>"#;

/// Package bytes with the given body content and style definitions
pub fn docx_bytes(body: &str, styles: &str) -> Vec<u8> {
    let files = [
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#
                .to_string(),
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#
                .to_string(),
        ),
        (
            "word/_rels/document.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#
                .to_string(),
        ),
        (
            "word/styles.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">{styles}</w:styles>"#
            ),
        ),
        (
            "word/document.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{body}</w:body></w:document>"#
            ),
        ),
    ];

    let mut buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buffer);
    for (path, contents) in &files {
        zip.start_file(*path, SimpleFileOptions::default()).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    buffer.into_inner()
}

/// Loaded document with the given body and styles
pub fn document(body: &str, styles: &str) -> Document {
    Document::from_bytes(&docx_bytes(body, styles)).unwrap()
}

/// A heading paragraph referencing `style_id`
pub fn heading(style_id: &str, text: &str) -> String {
    format!(r#"<w:p><w:pPr><w:pStyle w:val="{style_id}"/></w:pPr><w:r><w:t>{text}</w:t></w:r></w:p>"#)
}

/// Style IDs of the body paragraphs
pub fn style_ids(document: &Document) -> Vec<Option<String>> {
    document
        .paragraphs()
        .map(|p| p.style_id().map(str::to_string))
        .collect()
}

/// Converter returning a fixed body
pub struct FixedConverter {
    kind: BackendKind,
    body: String,
}

impl FixedConverter {
    pub fn external(body: &str) -> Self {
        Self {
            kind: BackendKind::External,
            body: body.to_string(),
        }
    }
}

impl Converter for FixedConverter {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn convert(&self, _input: &ConversionInput<'_>) -> ConversionResult {
        Ok(document(&self.body, PANDOC_STYLES))
    }
}

/// Converter that always fails
pub struct FailingConverter {
    kind: BackendKind,
    message: &'static str,
}

impl FailingConverter {
    pub fn external(message: &'static str) -> Self {
        Self {
            kind: BackendKind::External,
            message,
        }
    }

    pub fn fallback(message: &'static str) -> Self {
        Self {
            kind: BackendKind::Fallback,
            message,
        }
    }
}

impl Converter for FailingConverter {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn convert(&self, _input: &ConversionInput<'_>) -> ConversionResult {
        Err(BackendFailure::new(self.name(), self.message))
    }
}
