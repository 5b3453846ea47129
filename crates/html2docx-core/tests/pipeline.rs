//! End-to-end pipeline tests
//!
//! A stand-in converter returns pandoc-shaped packages so every pass runs
//! against realistic input without pandoc being installed.

use std::io::{Cursor, Read, Write};

use html2docx_core::{
    count_page_fields, heading_levels, language_coverage, BackendFailure, BackendKind,
    ConversionBackend, ConversionInput, ConversionRequest, ConversionResult, ConvertError,
    Converter, FallbackConverter, Pipeline, Settings,
};
use html2docx_ooxml::xml::is_xml_char;
use html2docx_ooxml::Document;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const HEADING_STYLES: &str = r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="Heading 1"/></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="Heading 2"/></w:style><w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="Heading 3"/></w:style><w:style w:type="paragraph" w:styleId="Heading4"><w:name w:val="Heading 4"/></w:style><w:style w:type="paragraph" w:styleId="Heading5"><w:name w:val="Heading 5"/></w:style>"#;

const STRONG_STYLES: &str = r#"<w:style w:type="character" w:styleId="Strong"><w:name w:val="Strong"/></w:style><w:style w:type="character" w:styleId="Emphasis"><w:name w:val="Emphasis"/></w:style>"#;

/// Converter standing in for pandoc
struct StubPandoc {
    body: String,
    styles: String,
}

impl StubPandoc {
    fn new(body: &str, styles: &str) -> Self {
        Self {
            body: body.to_string(),
            styles: styles.to_string(),
        }
    }

    fn package(&self) -> Vec<u8> {
        let files = [
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#.to_string(),
            ),
            (
                "_rels/.rels",
                r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="/word/document.xml"/></Relationships>"#.to_string(),
            ),
            (
                "word/_rels/document.xml.rels",
                r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#.to_string(),
            ),
            (
                "word/styles.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">{}</w:styles>"#,
                    self.styles
                ),
            ),
            (
                "word/document.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{}<w:sectPr/></w:body></w:document>"#,
                    self.body
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
}

impl Converter for StubPandoc {
    fn name(&self) -> &'static str {
        "stub-pandoc"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::External
    }

    fn convert(&self, _input: &ConversionInput<'_>) -> ConversionResult {
        Document::from_bytes(&self.package()).map_err(|e| BackendFailure::new("stub-pandoc", e.to_string()))
    }
}

/// Converter that is never installed
struct MissingPandoc;

impl Converter for MissingPandoc {
    fn name(&self) -> &'static str {
        "pandoc"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::External
    }

    fn convert(&self, _input: &ConversionInput<'_>) -> ConversionResult {
        Err(BackendFailure::new("pandoc", "cannot run pandoc: not found"))
    }
}

fn pipeline_with(primary: Box<dyn Converter>) -> Pipeline {
    Pipeline::with_backend(
        Settings::default(),
        ConversionBackend::with_converters(Some(primary), Box::new(FallbackConverter::new())),
    )
}

fn heading(style: &str, text: &str) -> String {
    format!(r#"<w:p><w:pPr><w:pStyle w:val="{style}"/></w:pPr><w:r><w:t>{text}</w:t></w:r></w:p>"#)
}

fn convert(pipeline: &Pipeline, request: &ConversionRequest) -> Document {
    let result = pipeline.convert(request).unwrap();
    Document::from_bytes(&result.bytes).unwrap()
}

#[test]
fn test_levels_start_at_one() {
    let body = format!("{}<w:p><w:r><w:t>x</w:t></w:r></w:p>{}", heading("Heading2", "A"), heading("Heading3", "B"));
    let pipeline = pipeline_with(Box::new(StubPandoc::new(&body, HEADING_STYLES)));

    let document = convert(&pipeline, &ConversionRequest::new("<h2>A</h2><p>x</p><h3>B</h3>"));
    assert_eq!(heading_levels(&document), vec![1, 2]);
}

#[test]
fn test_levels_start_at_three() {
    let body = format!("{}<w:p><w:r><w:t>x</w:t></w:r></w:p>{}", heading("Heading2", "A"), heading("Heading3", "B"));
    let pipeline = pipeline_with(Box::new(StubPandoc::new(&body, HEADING_STYLES)));

    let document = convert(
        &pipeline,
        &ConversionRequest::new("<h2>A</h2><p>x</p><h3>B</h3>").with_start_level(3),
    );
    assert_eq!(heading_levels(&document), vec![3, 4]);
}

#[test]
fn test_fallback_path_normalizes_the_same_way() {
    let pipeline = pipeline_with(Box::new(MissingPandoc));

    let result = pipeline
        .convert(&ConversionRequest::new("<h2>A</h2><p>x</p><h3>B</h3>").with_start_level(3))
        .unwrap();
    assert_eq!(result.backend, BackendKind::Fallback);

    let document = Document::from_bytes(&result.bytes).unwrap();
    assert_eq!(heading_levels(&document), vec![3, 4]);
}

#[test]
fn test_bold_without_strong_style_stays_bold() {
    let body = r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>loud</w:t></w:r></w:p>"#;
    let pipeline = pipeline_with(Box::new(StubPandoc::new(body, HEADING_STYLES)));

    let document = convert(&pipeline, &ConversionRequest::new("<p><b>loud</b></p>"));
    let paragraph = document.paragraphs().next().unwrap();
    let run = paragraph.runs().next().unwrap();
    assert!(run.is_bold());
    assert_eq!(run.style_id(), None);
    assert_eq!(run.text(), "loud");
}

#[test]
fn test_strong_emphasis_toggle() {
    let body = r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>loud</w:t></w:r><w:r><w:rPr><w:i/></w:rPr><w:t>soft</w:t></w:r></w:p>"#;
    let styles = format!("{HEADING_STYLES}{STRONG_STYLES}");

    let pipeline = pipeline_with(Box::new(StubPandoc::new(body, &styles)));
    let document = convert(&pipeline, &ConversionRequest::new("<p>x</p>"));
    let paragraph = document.paragraphs().next().unwrap();
    let styles: Vec<_> = paragraph.runs().map(|r| r.style_id().map(str::to_string)).collect();
    assert_eq!(styles, vec![Some("Strong".to_string()), Some("Emphasis".to_string())]);

    let document = convert(&pipeline, &ConversionRequest::new("<p>x</p>").with_strong_emph(false));
    let paragraph = document.paragraphs().next().unwrap();
    assert!(paragraph.runs().all(|r| r.style_id().is_none()));
}

#[test]
fn test_every_run_carries_the_locale() {
    let body = r#"<w:p><w:r><w:t>a</w:t></w:r><w:hyperlink r:id="rId7"><w:r><w:t>b</w:t></w:r></w:hyperlink></w:p><w:tbl><w:tr><w:tc><w:p><w:r><w:rPr><w:lang w:val="de-DE"/></w:rPr><w:t>c</w:t></w:r></w:p><w:tbl><w:tr><w:tc><w:p><w:r><w:t>d</w:t></w:r></w:p></w:tc></w:tr></w:tbl></w:tc></w:tr></w:tbl>"#;
    let pipeline = pipeline_with(Box::new(StubPandoc::new(body, HEADING_STYLES)));

    let document = convert(&pipeline, &ConversionRequest::new("<p>x</p>"));
    assert_eq!(language_coverage(&document, "en-US"), (4, 4));
    assert_eq!(
        document.core_properties().unwrap().language().as_deref(),
        Some("en-US")
    );
}

#[test]
fn test_every_section_has_one_page_field() {
    let body = r#"<w:p><w:pPr><w:sectPr/></w:pPr><w:r><w:t>first</w:t></w:r></w:p><w:p><w:r><w:t>second</w:t></w:r></w:p>"#;
    let pipeline = pipeline_with(Box::new(StubPandoc::new(body, HEADING_STYLES)));

    let document = convert(&pipeline, &ConversionRequest::new("<p>x</p>"));
    assert_eq!(document.sections().len(), 2);
    for section in 0..2 {
        let path = document.default_footer_path(section).unwrap();
        assert_eq!(count_page_fields(document.footer(&path).unwrap()), 1);
    }
}

#[test]
fn test_run_text_survives_the_pipeline() {
    let html = "<h1>Title</h1><p>Some <strong>bold</strong> and <em>italic</em> text.</p><ul><li>one</li></ul><table><tr><th>H</th></tr><tr><td>v</td></tr></table>";
    let pipeline = pipeline_with(Box::new(MissingPandoc));

    let document = convert(&pipeline, &ConversionRequest::new(html));
    let texts: Vec<_> = document.paragraphs().map(|p| p.text()).collect();
    assert_eq!(texts, vec!["Title", "Some bold and italic text.", "one"]);

    let table = document.tables().next().unwrap();
    let cells: Vec<_> = table.paragraphs().iter().map(|p| p.text()).collect();
    assert_eq!(cells, vec!["H", "v"]);
    assert_eq!(language_coverage(&document, "en-US").0, language_coverage(&document, "en-US").1);
}

#[test]
fn test_empty_request_uses_placeholder_and_default_title() {
    let pipeline = pipeline_with(Box::new(MissingPandoc));
    let result = pipeline.convert(&ConversionRequest::new("")).unwrap();

    assert_eq!(result.file_name, "Converted Document.docx");
    let document = Document::from_bytes(&result.bytes).unwrap();
    assert_eq!(document.paragraphs().next().unwrap().text(), "(empty)");
    assert_eq!(
        document.core_properties().unwrap().title().as_deref(),
        Some("Converted Document")
    );
}

#[test]
fn test_title_with_separators() {
    let pipeline = pipeline_with(Box::new(MissingPandoc));
    let result = pipeline
        .convert(&ConversionRequest::new("<p>x</p>").with_title("Q3/Q4 Report"))
        .unwrap();
    assert_eq!(result.file_name, "Q3-Q4 Report.docx");

    let document = Document::from_bytes(&result.bytes).unwrap();
    assert_eq!(
        document.core_properties().unwrap().title().as_deref(),
        Some("Q3/Q4 Report")
    );
}

#[test]
fn test_both_backends_failing() {
    struct Broken;
    impl Converter for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }
        fn kind(&self) -> BackendKind {
            BackendKind::Fallback
        }
        fn convert(&self, _input: &ConversionInput<'_>) -> ConversionResult {
            Err(BackendFailure::new("broken", "out of paper"))
        }
    }

    let pipeline = Pipeline::with_backend(
        Settings::default(),
        ConversionBackend::with_converters(Some(Box::new(MissingPandoc)), Box::new(Broken)),
    );
    let err = pipeline.convert(&ConversionRequest::new("<p>x</p>")).unwrap_err();
    assert!(matches!(err, ConvertError::BackendsExhausted { .. }));
    assert!(err.to_string().contains("out of paper"));
}

#[test]
fn test_configured_locale() {
    let mut settings = Settings::default();
    settings.document.locale = "en-GB".to_string();
    settings.backend.fallback_only = true;
    let pipeline = Pipeline::new(settings);

    let document = convert(&pipeline, &ConversionRequest::new("<p>colour</p>"));
    assert_eq!(language_coverage(&document, "en-GB"), (1, 1));
}

fn part_text(bytes: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut text = String::new();
    archive.by_name(name).unwrap().read_to_string(&mut text).unwrap();
    text
}

#[test]
fn test_control_characters_never_reach_the_package() {
    let pipeline = pipeline_with(Box::new(MissingPandoc));
    let result = pipeline
        .convert(&ConversionRequest::new("<p>a&#0;b&#1;c\u{7}d</p>").with_title("T\u{1}"))
        .unwrap();

    for name in ["word/document.xml", "docProps/core.xml"] {
        let xml = part_text(&result.bytes, name);
        let illegal: Vec<u32> = xml.chars().filter(|&c| !is_xml_char(c)).map(u32::from).collect();
        assert!(illegal.is_empty(), "{name}: {illegal:?}");
    }

    let document = Document::from_bytes(&result.bytes).unwrap();
    assert_eq!(document.paragraphs().next().unwrap().text(), "a&#0;b&#1;cd");
    assert_eq!(document.core_properties().unwrap().title().as_deref(), Some("T"));
}
