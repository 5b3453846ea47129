//! Minimal HTML scanner for the internal conversion path
//!
//! Not an HTML parser: tags are recognised by name, nesting is tracked with
//! counters and a few stacks, and anything unknown is ignored while its text
//! is kept. Good enough to turn simple article markup into paragraphs with
//! the right styles and direct bold/italic formatting.

use html2docx_ooxml::writer::{
    Block, CellDraft, Inline, ParagraphDraft, ParagraphKind, TableDraft, TextRun,
};
use html2docx_ooxml::xml::is_xml_char;

/// Elements whose content is never document text
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "head", "title", "noscript", "template"];

/// Elements that delimit a plain paragraph
const PARAGRAPH_ELEMENTS: &[&str] = &[
    "p", "div", "section", "article", "header", "footer", "main", "nav", "aside", "figure",
    "figcaption", "address", "dl", "dt", "dd", "caption",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

#[derive(Debug, Default)]
struct TableBuilder {
    rows: Vec<Vec<CellDraft>>,
    row_open: bool,
    cell: Option<(CellDraft, bool)>,
}

impl TableBuilder {
    fn close_cell(&mut self) {
        if let Some((cell, _)) = self.cell.take() {
            if !self.row_open {
                self.rows.push(Vec::new());
                self.row_open = true;
            }
            if let Some(row) = self.rows.last_mut() {
                row.push(cell);
            }
        }
    }

    fn open_row(&mut self) {
        self.close_cell();
        self.rows.push(Vec::new());
        self.row_open = true;
    }

    fn close_row(&mut self) {
        self.close_cell();
        self.row_open = false;
    }

    fn finish(mut self) -> TableDraft {
        self.close_cell();
        self.rows.retain(|row| !row.is_empty());
        TableDraft { rows: self.rows }
    }
}

/// Stateful scanner turning HTML into block drafts
#[derive(Debug)]
pub struct HtmlScanner {
    blocks: Vec<Block>,
    current: ParagraphDraft,
    bold_depth: u32,
    italic_depth: u32,
    code_depth: u32,
    pre_depth: u32,
    quote_depth: u32,
    list_item_depth: u32,
    lists: Vec<ListKind>,
    tables: Vec<TableBuilder>,
}

impl Default for HtmlScanner {
    fn default() -> Self {
        Self {
            blocks: Vec::new(),
            current: ParagraphDraft::new(ParagraphKind::Normal),
            bold_depth: 0,
            italic_depth: 0,
            code_depth: 0,
            pre_depth: 0,
            quote_depth: 0,
            list_item_depth: 0,
            lists: Vec::new(),
            tables: Vec::new(),
        }
    }
}

/// Scan an HTML document or fragment into blocks
pub fn scan(html: &str) -> Vec<Block> {
    let mut scanner = HtmlScanner::default();
    scanner.feed(extract_body(html));
    scanner.finish()
}

impl HtmlScanner {
    /// Consume a chunk of markup
    pub fn feed(&mut self, html: &str) {
        // ASCII lowercasing keeps byte offsets valid
        let lower = html.to_ascii_lowercase();
        let bytes = html.as_bytes();
        let mut i = 0usize;

        while i < bytes.len() {
            if bytes[i] != b'<' {
                let end = html[i..].find('<').map_or(html.len(), |offset| i + offset);
                self.text(&html[i..end]);
                i = end;
                continue;
            }

            if lower[i..].starts_with("<!--") {
                i = lower[i + 4..]
                    .find("-->")
                    .map_or(html.len(), |end| i + 4 + end + 3);
                continue;
            }

            let Some(close) = html[i..].find('>') else {
                // Unterminated tag: keep it as text
                self.text(&html[i..]);
                break;
            };
            let raw = html[i + 1..i + close].trim();
            i += close + 1;

            if raw.is_empty() || raw.starts_with('!') || raw.starts_with('?') {
                continue;
            }

            let is_end = raw.starts_with('/');
            let name = raw
                .trim_start_matches('/')
                .trim_end_matches('/')
                .split(|c: char| c.is_whitespace() || c == '/')
                .next()
                .unwrap_or("")
                .to_ascii_lowercase();

            if !is_end && SKIPPED_ELEMENTS.contains(&name.as_str()) {
                let closing = format!("</{name}");
                i = lower[i..]
                    .find(&closing)
                    .and_then(|start| lower[i + start..].find('>').map(|gt| i + start + gt + 1))
                    .unwrap_or(html.len());
                continue;
            }

            if is_end {
                self.end_tag(&name);
            } else {
                self.start_tag(&name);
            }
        }
    }

    /// Flush pending content and return the blocks
    pub fn finish(mut self) -> Vec<Block> {
        self.flush();
        while let Some(table) = self.tables.pop() {
            self.emit_table(table.finish());
        }
        self.blocks
    }

    fn start_tag(&mut self, name: &str) {
        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse().unwrap_or(1);
                self.start_paragraph(ParagraphKind::Heading(level));
            }
            "blockquote" => {
                self.flush();
                self.quote_depth += 1;
                self.current.kind = self.context_kind();
            }
            "ul" => {
                self.flush();
                self.lists.push(ListKind::Unordered);
            }
            "ol" => {
                self.flush();
                self.lists.push(ListKind::Ordered);
            }
            "li" => {
                self.list_item_depth += 1;
                self.start_paragraph(self.context_kind());
            }
            "pre" => {
                self.start_paragraph(ParagraphKind::SourceCode);
                self.pre_depth += 1;
            }
            "br" => self.current.inlines.push(Inline::Break),
            "hr" => self.flush(),
            "strong" | "b" => self.bold_depth += 1,
            "em" | "i" => self.italic_depth += 1,
            "code" | "kbd" | "samp" | "tt" => self.code_depth += 1,
            "table" => {
                self.flush();
                self.tables.push(TableBuilder::default());
            }
            "tr" => {
                self.flush();
                if let Some(table) = self.tables.last_mut() {
                    table.open_row();
                }
            }
            "td" | "th" => {
                self.flush();
                if let Some(table) = self.tables.last_mut() {
                    table.close_cell();
                    if !table.row_open {
                        table.open_row();
                    }
                    table.cell = Some((CellDraft::default(), name == "th"));
                }
            }
            _ if PARAGRAPH_ELEMENTS.contains(&name) => self.start_paragraph(self.context_kind()),
            _ => {}
        }
    }

    fn end_tag(&mut self, name: &str) {
        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => self.flush(),
            "blockquote" => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.current.kind = self.context_kind();
            }
            "ul" | "ol" => {
                self.flush();
                self.lists.pop();
            }
            "li" => {
                self.flush();
                self.list_item_depth = self.list_item_depth.saturating_sub(1);
                self.current.kind = self.context_kind();
            }
            "pre" => {
                self.flush();
                self.pre_depth = self.pre_depth.saturating_sub(1);
            }
            "strong" | "b" => self.bold_depth = self.bold_depth.saturating_sub(1),
            "em" | "i" => self.italic_depth = self.italic_depth.saturating_sub(1),
            "code" | "kbd" | "samp" | "tt" => self.code_depth = self.code_depth.saturating_sub(1),
            "td" | "th" => {
                self.flush();
                if let Some(table) = self.tables.last_mut() {
                    table.close_cell();
                }
            }
            "tr" => {
                self.flush();
                if let Some(table) = self.tables.last_mut() {
                    table.close_row();
                }
            }
            "table" => {
                self.flush();
                if let Some(table) = self.tables.pop() {
                    self.emit_table(table.finish());
                }
            }
            _ if PARAGRAPH_ELEMENTS.contains(&name) => self.flush(),
            _ => {}
        }
    }

    /// Paragraph kind implied by the enclosing list or quotation
    fn context_kind(&self) -> ParagraphKind {
        if self.list_item_depth > 0 {
            match self.lists.last() {
                Some(ListKind::Ordered) => ParagraphKind::ListNumber,
                _ => ParagraphKind::ListBullet,
            }
        } else if self.quote_depth > 0 {
            ParagraphKind::Quote
        } else {
            ParagraphKind::Normal
        }
    }

    fn start_paragraph(&mut self, kind: ParagraphKind) {
        self.flush();
        self.current.kind = kind;
    }

    fn in_header_cell(&self) -> bool {
        self.tables
            .last()
            .and_then(|table| table.cell.as_ref())
            .is_some_and(|(_, header)| *header)
    }

    fn text(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let bold = self.bold_depth > 0 || self.in_header_cell();
        let italic = self.italic_depth > 0;
        let monospace = self.code_depth > 0 || self.pre_depth > 0;
        let run = |text: String| {
            Inline::Run(TextRun {
                text,
                bold,
                italic,
                monospace,
            })
        };

        if self.pre_depth > 0 {
            let mut text = decode_entities(&raw.replace("\r\n", "\n").replace('\r', "\n"));
            // A newline right after <pre> is not content
            if self.current.inlines.is_empty() && text.starts_with('\n') {
                text.remove(0);
            }
            for (index, line) in text.split('\n').enumerate() {
                if index > 0 {
                    self.current.inlines.push(Inline::Break);
                }
                if !line.is_empty() {
                    self.current.inlines.push(run(line.to_string()));
                }
            }
            return;
        }

        let mut text = collapse_whitespace(raw);
        if text.starts_with(' ') && !self.ends_with_text() {
            text.remove(0);
        }
        if !text.is_empty() {
            self.current.inlines.push(run(decode_entities(&text)));
        }
    }

    /// Whether the pending paragraph ends with a non-space character
    fn ends_with_text(&self) -> bool {
        match self.current.inlines.last() {
            Some(Inline::Run(run)) => !run.text.ends_with(char::is_whitespace),
            _ => false,
        }
    }

    fn flush(&mut self) {
        let kind = self.context_kind();
        let mut paragraph = std::mem::replace(&mut self.current, ParagraphDraft::new(kind));

        if paragraph.kind != ParagraphKind::SourceCode {
            trim_edges(&mut paragraph);
            if paragraph.is_blank() {
                return;
            }
        } else if paragraph.inlines.is_empty() {
            return;
        }

        let cell = self
            .tables
            .last_mut()
            .and_then(|table| table.cell.as_mut());
        match cell {
            Some((cell, _)) => cell.paragraphs.push(paragraph),
            None => self.blocks.push(Block::Paragraph(paragraph)),
        }
    }

    fn emit_table(&mut self, table: TableDraft) {
        if table.rows.is_empty() {
            return;
        }
        // Nested tables are flattened into the enclosing cell
        let outer_cell = self
            .tables
            .last_mut()
            .and_then(|outer| outer.cell.as_mut());
        match outer_cell {
            Some((cell, _)) => {
                for row in table.rows {
                    for inner in row {
                        cell.paragraphs.extend(inner.paragraphs);
                    }
                }
            }
            None => self.blocks.push(Block::Table(table)),
        }
    }
}

/// Drop whitespace at the start and end of a paragraph
fn trim_edges(paragraph: &mut ParagraphDraft) {
    while let Some(Inline::Run(run)) = paragraph.inlines.first_mut() {
        let trimmed = run.text.trim_start().to_string();
        if trimmed.is_empty() {
            paragraph.inlines.remove(0);
        } else {
            run.text = trimmed;
            break;
        }
    }
    while let Some(Inline::Run(run)) = paragraph.inlines.last_mut() {
        let trimmed = run.text.trim_end().to_string();
        if trimmed.is_empty() {
            paragraph.inlines.pop();
        } else {
            run.text = trimmed;
            break;
        }
    }
}

/// Content of the `<body>` element, or the whole input without one
pub fn extract_body(html: &str) -> &str {
    let lower = html.to_ascii_lowercase();
    if let Some(open) = lower.find("<body") {
        if let Some(gt) = html[open..].find('>') {
            let start = open + gt + 1;
            let end = lower[start..]
                .rfind("</body")
                .map_or(html.len(), |offset| start + offset);
            return &html[start..end];
        }
    }
    html
}

/// Collapse runs of ASCII/Unicode whitespace (except no-break space) to
/// single spaces
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() && ch != '\u{a0}' {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

/// Decode the basic named entities and numeric character references;
/// anything else is kept literally
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest[1..]
            .find(';')
            .filter(|&semi| semi <= 32)
            .and_then(|semi| decode_entity(&rest[1..1 + semi]).map(|ch| (ch, semi + 2)));

        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = entity.strip_prefix('#')?;
            let value = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            // References XML cannot hold stay literal
            char::from_u32(value).filter(|&ch| is_xml_char(ch))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraphs(blocks: &[Block]) -> Vec<&ParagraphDraft> {
        blocks
            .iter()
            .filter_map(|block| match block {
                Block::Paragraph(p) => Some(p),
                Block::Table(_) => None,
            })
            .collect()
    }

    fn text_of(paragraph: &ParagraphDraft) -> String {
        paragraph
            .inlines
            .iter()
            .map(|inline| match inline {
                Inline::Run(run) => run.text.clone(),
                Inline::Break => "\n".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let blocks = scan("<h2>A</h2><p>x</p><h3>B</h3>");
        let paras = paragraphs(&blocks);

        assert_eq!(paras.len(), 3);
        assert_eq!(paras[0].kind, ParagraphKind::Heading(2));
        assert_eq!(text_of(paras[0]), "A");
        assert_eq!(paras[1].kind, ParagraphKind::Normal);
        assert_eq!(paras[2].kind, ParagraphKind::Heading(3));
    }

    #[test]
    fn test_inline_formatting_and_spacing() {
        let blocks = scan("<p>Plain <strong>bold <em>both</em></strong>\n   <i>it</i> <code>x()</code></p>");
        let paras = paragraphs(&blocks);
        assert_eq!(text_of(paras[0]), "Plain bold both it x()");

        let runs: Vec<_> = paras[0]
            .inlines
            .iter()
            .filter_map(|inline| match inline {
                Inline::Run(run) => Some(run),
                Inline::Break => None,
            })
            .collect();
        assert!(!runs[0].bold);
        assert!(runs[1].bold && !runs[1].italic);
        assert!(runs[2].bold && runs[2].italic);
        assert!(runs.iter().any(|run| run.italic && !run.bold && run.text == "it"));
        assert!(runs.last().unwrap().monospace);
    }

    #[test]
    fn test_body_extraction_and_skipped_content() {
        let html = r#"<!DOCTYPE html><html><head><title>Ignored</title><style>p { color: red }</style></head>
<BODY class="x"><!-- note --><script>var a = "<p>no</p>";</script><p>Yes</p></BODY></html>"#;
        let blocks = scan(html);
        let paras = paragraphs(&blocks);
        assert_eq!(paras.len(), 1);
        assert_eq!(text_of(paras[0]), "Yes");
    }

    #[test]
    fn test_lists_and_quotes() {
        let blocks = scan(
            "<ul><li>one</li><li><p>two</p></li></ul><ol><li>first</li></ol><blockquote><p>said</p></blockquote><p>after</p>",
        );
        let kinds: Vec<_> = paragraphs(&blocks).iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ParagraphKind::ListBullet,
                ParagraphKind::ListBullet,
                ParagraphKind::ListNumber,
                ParagraphKind::Quote,
                ParagraphKind::Normal,
            ]
        );
    }

    #[test]
    fn test_preformatted_keeps_lines() {
        let blocks = scan("<pre>\nfn main() {\n    run();\n}</pre>");
        let paras = paragraphs(&blocks);
        assert_eq!(paras[0].kind, ParagraphKind::SourceCode);
        assert_eq!(text_of(paras[0]), "fn main() {\n    run();\n}");
    }

    #[test]
    fn test_breaks_and_rules() {
        let blocks = scan("<p>a<br/>b</p>one<hr>two");
        let paras = paragraphs(&blocks);
        assert_eq!(text_of(paras[0]), "a\nb");
        assert_eq!(text_of(paras[1]), "one");
        assert_eq!(text_of(paras[2]), "two");
    }

    #[test]
    fn test_tables() {
        let blocks = scan(
            "<table><thead><tr><th>Name</th><th>Qty</th></tr></thead><tbody><tr><td>Fish &amp; chips</td><td>2</td></tr></tbody></table><p>end</p>",
        );
        assert_eq!(blocks.len(), 2);
        let Block::Table(table) = &blocks[0] else {
            panic!("expected a table");
        };
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.column_count(), 2);

        let header = &table.rows[0][0].paragraphs[0];
        assert!(matches!(&header.inlines[0], Inline::Run(run) if run.bold && run.text == "Name"));
        assert_eq!(text_of(&table.rows[1][0].paragraphs[0]), "Fish & chips");
    }

    #[test]
    fn test_nested_table_is_flattened() {
        let blocks = scan("<table><tr><td>outer<table><tr><td>inner</td></tr></table></td></tr></table>");
        assert_eq!(blocks.len(), 1);
        let Block::Table(table) = &blocks[0] else {
            panic!("expected a table");
        };
        let texts: Vec<_> = table.rows[0][0].paragraphs.iter().map(text_of).collect();
        assert_eq!(texts, vec!["outer", "inner"]);
    }

    #[test]
    fn test_bare_text_and_empty_input() {
        assert_eq!(text_of(paragraphs(&scan("just text"))[0]), "just text");
        assert!(scan("").is_empty());
        assert!(scan("<p>   </p><div></div>").is_empty());
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt; &quot;d&quot; &apos;e&apos;"), "a & b <c> \"d\" 'e'");
        assert_eq!(decode_entities("&#65;&#x42;&#X43;"), "ABC");
        assert_eq!(decode_entities("1&nbsp;2"), "1\u{a0}2");
        assert_eq!(decode_entities("AT&T &bogus; &#xZZ; &"), "AT&T &bogus; &#xZZ; &");
        assert_eq!(decode_entities("caf&#233; ünïcode"), "café ünïcode");
        assert_eq!(decode_entities("a&#0;b&#x1;c&#65535;"), "a&#0;b&#x1;c&#65535;");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace(" a \n\t b "), " a b ");
        assert_eq!(collapse_whitespace("a\u{a0}\u{a0}b"), "a\u{a0}\u{a0}b");
    }

    #[test]
    fn test_extract_body() {
        assert_eq!(extract_body("<html><body><p>x</p></body></html>"), "<p>x</p>");
        assert_eq!(extract_body("<p>x</p>"), "<p>x</p>");
        assert_eq!(extract_body("<body><p>x</p>"), "<p>x</p>");
    }
}
