//! Minimal DOCX writer
//!
//! Builds a complete package from scratch out of simple block drafts
//! (paragraphs with a semantic kind, formatted runs, tables). Used by the
//! internal conversion path, which cannot rely on a reference template and
//! therefore ships its own built-in style set.
//!
//! # Example
//!
//! ```
//! use html2docx_ooxml::writer::{Block, DocxWriter, ParagraphDraft, ParagraphKind, TextRun};
//!
//! let mut writer = DocxWriter::new().title("Notes").language("en-US");
//! writer.push(Block::Paragraph(
//!     ParagraphDraft::new(ParagraphKind::Heading(1)).with_run(TextRun::plain("Intro")),
//! ));
//! let document = writer.build()?;
//! assert_eq!(document.paragraphs().count(), 1);
//! # Ok::<(), html2docx_ooxml::OoxmlError>(())
//! ```

use crate::archive::{
    OoxmlArchive, CONTENT_TYPES_PART, CORE_PROPERTIES_PART, DOCUMENT_PART, DOCUMENT_RELS_PART,
    PACKAGE_RELS_PART, STYLES_PART,
};
use crate::content_types::{ContentTypes, CT_CORE_PROPERTIES, CT_DOCUMENT, CT_STYLES};
use crate::core_properties::CoreProperties;
use crate::document::{Document, NS_R, NS_W};
use crate::error::Result;
use crate::relationships::Relationships;
use crate::xml::{escape_attr, escape_text};

/// Usable text width of a Letter page with one-inch margins, in twips
const TEXT_WIDTH_TWIPS: usize = 9360;

/// Semantic kind of a drafted paragraph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphKind {
    /// Body text
    Normal,
    /// Document title
    Title,
    /// Heading of the given level (1-9)
    Heading(u8),
    /// Block quotation
    Quote,
    /// Preformatted code
    SourceCode,
    /// Item of an unordered list
    ListBullet,
    /// Item of an ordered list
    ListNumber,
}

impl ParagraphKind {
    /// Built-in style ID for this kind
    pub fn style_id(self) -> String {
        match self {
            ParagraphKind::Normal => "Normal".to_string(),
            ParagraphKind::Title => "Title".to_string(),
            ParagraphKind::Heading(level) => format!("Heading{}", level.clamp(1, 9)),
            ParagraphKind::Quote => "Quote".to_string(),
            ParagraphKind::SourceCode => "SourceCode".to_string(),
            ParagraphKind::ListBullet => "ListBullet".to_string(),
            ParagraphKind::ListNumber => "ListNumber".to_string(),
        }
    }
}

/// A run of text with direct formatting
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextRun {
    /// Text content
    pub text: String,
    /// Direct bold
    pub bold: bool,
    /// Direct italic
    pub italic: bool,
    /// Monospace (verbatim character style)
    pub monospace: bool,
}

impl TextRun {
    /// Unformatted text
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Inline content of a paragraph draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// Formatted text
    Run(TextRun),
    /// Line break inside the paragraph
    Break,
}

/// A paragraph waiting to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphDraft {
    /// Paragraph kind (selects the style)
    pub kind: ParagraphKind,
    /// Inline content
    pub inlines: Vec<Inline>,
}

impl ParagraphDraft {
    /// Empty paragraph of the given kind
    pub fn new(kind: ParagraphKind) -> Self {
        Self {
            kind,
            inlines: Vec::new(),
        }
    }

    /// Builder: append a run
    pub fn with_run(mut self, run: TextRun) -> Self {
        self.inlines.push(Inline::Run(run));
        self
    }

    /// Whether the paragraph carries no visible content
    pub fn is_blank(&self) -> bool {
        self.inlines.iter().all(|inline| match inline {
            Inline::Run(run) => run.text.trim().is_empty(),
            Inline::Break => true,
        })
    }
}

/// A table cell
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CellDraft {
    /// Cell paragraphs (an empty cell gets one empty paragraph)
    pub paragraphs: Vec<ParagraphDraft>,
}

/// A table waiting to be written
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableDraft {
    /// Rows of cells
    pub rows: Vec<Vec<CellDraft>>,
}

impl TableDraft {
    /// Widest row
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Block-level content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// A paragraph
    Paragraph(ParagraphDraft),
    /// A table
    Table(TableDraft),
}

/// Writer producing a self-contained DOCX package
#[derive(Debug, Default)]
pub struct DocxWriter {
    title: Option<String>,
    language: Option<String>,
    blocks: Vec<Block>,
    output: String,
}

impl DocxWriter {
    /// Writer without content or metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: core title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder: language for metadata, style defaults and every run
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Append a block
    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Number of blocks drafted so far
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether no block has been drafted
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Write all parts into a fresh archive
    pub fn generate(mut self) -> OoxmlArchive {
        let mut archive = OoxmlArchive::new();

        let mut content_types = ContentTypes::new();
        content_types.ensure_override(DOCUMENT_PART, CT_DOCUMENT);
        content_types.ensure_override(STYLES_PART, CT_STYLES);
        content_types.ensure_override(CORE_PROPERTIES_PART, CT_CORE_PROPERTIES);
        archive.set_string(CONTENT_TYPES_PART, content_types.to_xml());

        let mut package_rels = Relationships::new();
        package_rels.add(DOCUMENT_PART, Relationships::TYPE_OFFICE_DOCUMENT);
        package_rels.add(CORE_PROPERTIES_PART, Relationships::TYPE_CORE_PROPERTIES);
        archive.set_string(PACKAGE_RELS_PART, package_rels.to_xml());

        let mut document_rels = Relationships::new();
        document_rels.add("styles.xml", Relationships::TYPE_STYLES);
        archive.set_string(DOCUMENT_RELS_PART, document_rels.to_xml());

        let mut core = CoreProperties::new();
        if let Some(title) = &self.title {
            core.set_title(title);
        }
        if let Some(language) = &self.language {
            core.set_language(language);
        }
        archive.set_string(CORE_PROPERTIES_PART, core.to_xml());

        archive.set_string(STYLES_PART, builtin_styles_xml(self.language.as_deref()));
        archive.set_string(DOCUMENT_PART, self.generate_document_xml());

        archive
    }

    /// Write all parts and load them as an editable [`Document`]
    pub fn build(self) -> Result<Document> {
        Document::from_archive(self.generate())
    }

    fn generate_document_xml(&mut self) -> String {
        self.output.clear();
        self.output
            .push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        self.output.push('\n');
        self.output.push_str(&format!(
            r#"<w:document xmlns:w="{NS_W}" xmlns:r="{NS_R}"><w:body>"#
        ));

        let blocks = std::mem::take(&mut self.blocks);
        if blocks.is_empty() {
            self.generate_paragraph(&ParagraphDraft::new(ParagraphKind::Normal));
        }
        for block in &blocks {
            match block {
                Block::Paragraph(paragraph) => self.generate_paragraph(paragraph),
                Block::Table(table) => self.generate_table(table),
            }
        }

        self.output.push_str(
            r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr>"#,
        );
        self.output.push_str("</w:body></w:document>");
        std::mem::take(&mut self.output)
    }

    fn generate_paragraph(&mut self, paragraph: &ParagraphDraft) {
        self.output.push_str(&format!(
            r#"<w:p><w:pPr><w:pStyle w:val="{}"/></w:pPr>"#,
            escape_attr(&paragraph.kind.style_id())
        ));
        for inline in &paragraph.inlines {
            match inline {
                Inline::Run(run) => self.generate_run(run),
                Inline::Break => {
                    self.output.push_str("<w:r>");
                    self.generate_run_properties(None, false, false);
                    self.output.push_str("<w:br/></w:r>");
                }
            }
        }
        self.output.push_str("</w:p>");
    }

    fn generate_run(&mut self, run: &TextRun) {
        self.output.push_str("<w:r>");
        let style = run.monospace.then_some("VerbatimChar");
        self.generate_run_properties(style, run.bold, run.italic);
        self.output.push_str(&format!(
            r#"<w:t xml:space="preserve">{}</w:t>"#,
            escape_text(&run.text)
        ));
        self.output.push_str("</w:r>");
    }

    fn generate_run_properties(&mut self, style: Option<&str>, bold: bool, italic: bool) {
        if style.is_none() && !bold && !italic && self.language.is_none() {
            return;
        }
        self.output.push_str("<w:rPr>");
        if let Some(style) = style {
            self.output
                .push_str(&format!(r#"<w:rStyle w:val="{}"/>"#, escape_attr(style)));
        }
        if bold {
            self.output.push_str("<w:b/>");
        }
        if italic {
            self.output.push_str("<w:i/>");
        }
        if let Some(language) = &self.language {
            self.output
                .push_str(&format!(r#"<w:lang w:val="{}"/>"#, escape_attr(language)));
        }
        self.output.push_str("</w:rPr>");
    }

    fn generate_table(&mut self, table: &TableDraft) {
        let columns = table.column_count().max(1);
        let width = TEXT_WIDTH_TWIPS / columns;

        self.output.push_str(
            r#"<w:tbl><w:tblPr><w:tblStyle w:val="TableGrid"/><w:tblW w:w="5000" w:type="pct"/></w:tblPr><w:tblGrid>"#,
        );
        for _ in 0..columns {
            self.output
                .push_str(&format!(r#"<w:gridCol w:w="{width}"/>"#));
        }
        self.output.push_str("</w:tblGrid>");

        for row in &table.rows {
            self.output.push_str("<w:tr>");
            for index in 0..columns {
                self.output.push_str(&format!(
                    r#"<w:tc><w:tcPr><w:tcW w:w="{width}" w:type="dxa"/></w:tcPr>"#
                ));
                match row.get(index) {
                    Some(cell) if !cell.paragraphs.is_empty() => {
                        for paragraph in &cell.paragraphs {
                            self.generate_paragraph(paragraph);
                        }
                    }
                    // Every cell needs at least one paragraph
                    _ => self.output.push_str("<w:p/>"),
                }
                self.output.push_str("</w:tc>");
            }
            self.output.push_str("</w:tr>");
        }

        self.output.push_str("</w:tbl>");
    }
}

/// Style part with the built-in style set
fn builtin_styles_xml(language: Option<&str>) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<w:styles xmlns:w="{NS_W}">"#));

    xml.push_str(r#"<w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:eastAsia="Calibri" w:cs="Calibri"/><w:sz w:val="22"/><w:szCs w:val="22"/>"#);
    if let Some(language) = language {
        xml.push_str(&format!(r#"<w:lang w:val="{}"/>"#, escape_attr(language)));
    }
    xml.push_str(r#"</w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="160" w:line="259" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults>"#);

    xml.push_str(r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#);
    xml.push_str(r#"<w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:spacing w:after="240"/></w:pPr><w:rPr><w:sz w:val="56"/><w:szCs w:val="56"/></w:rPr></w:style>"#);

    for level in 1..=9u8 {
        // 16pt for level 1 down to 11pt from level 6 on
        let size = 32u32.saturating_sub(u32::from(level - 1) * 2).max(22);
        xml.push_str(&format!(
            r#"<w:style w:type="paragraph" w:styleId="Heading{level}"><w:name w:val="Heading {level}"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:uiPriority w:val="9"/><w:qFormat/><w:pPr><w:keepNext/><w:keepLines/><w:spacing w:before="240" w:after="80"/><w:outlineLvl w:val="{outline}"/></w:pPr><w:rPr><w:b/><w:sz w:val="{size}"/><w:szCs w:val="{size}"/></w:rPr></w:style>"#,
            outline = level - 1,
        ));
    }

    xml.push_str(r#"<w:style w:type="paragraph" w:styleId="Quote"><w:name w:val="Quote"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:ind w:left="720" w:right="720"/></w:pPr><w:rPr><w:i/></w:rPr></w:style>"#);
    xml.push_str(r#"<w:style w:type="paragraph" w:styleId="SourceCode"><w:name w:val="Source Code"/><w:basedOn w:val="Normal"/><w:pPr><w:spacing w:after="0" w:line="240" w:lineRule="auto"/></w:pPr><w:rPr><w:rFonts w:ascii="Courier New" w:hAnsi="Courier New" w:cs="Courier New"/><w:sz w:val="20"/></w:rPr></w:style>"#);
    xml.push_str(r#"<w:style w:type="paragraph" w:styleId="ListBullet"><w:name w:val="List Bullet"/><w:basedOn w:val="Normal"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:style>"#);
    xml.push_str(r#"<w:style w:type="paragraph" w:styleId="ListNumber"><w:name w:val="List Number"/><w:basedOn w:val="Normal"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:style>"#);

    xml.push_str(r#"<w:style w:type="character" w:default="1" w:styleId="DefaultParagraphFont"><w:name w:val="Default Paragraph Font"/><w:uiPriority w:val="1"/><w:semiHidden/></w:style>"#);
    xml.push_str(r#"<w:style w:type="character" w:styleId="Strong"><w:name w:val="Strong"/><w:basedOn w:val="DefaultParagraphFont"/><w:qFormat/><w:rPr><w:b/><w:bCs/></w:rPr></w:style>"#);
    xml.push_str(r#"<w:style w:type="character" w:styleId="Emphasis"><w:name w:val="Emphasis"/><w:basedOn w:val="DefaultParagraphFont"/><w:qFormat/><w:rPr><w:i/><w:iCs/></w:rPr></w:style>"#);
    xml.push_str(r#"<w:style w:type="character" w:styleId="VerbatimChar"><w:name w:val="Verbatim Char"/><w:basedOn w:val="DefaultParagraphFont"/><w:rPr><w:rFonts w:ascii="Courier New" w:hAnsi="Courier New" w:cs="Courier New"/><w:sz w:val="20"/></w:rPr></w:style>"#);

    xml.push_str(r#"<w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:tblPr><w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/></w:tblBorders></w:tblPr></w:style>"#);

    xml.push_str("</w:styles>");
    xml
}
