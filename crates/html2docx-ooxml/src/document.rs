//! The editable document model
//!
//! A [`Document`] owns an unpacked package together with the parsed parts
//! the post-processing passes touch: the main part as a lossless element
//! tree, its style sheet, relationships, the content types table, the core
//! properties and every footer part. Paragraphs, runs and tables are typed
//! views over that tree, generic over shared (`&XmlElement`) and mutable
//! (`&mut XmlElement`) element references.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::path::Path;

use crate::archive::{
    OoxmlArchive, CONTENT_TYPES_PART, CORE_PROPERTIES_PART, DOCUMENT_PART, PACKAGE_RELS_PART,
    STYLES_PART,
};
use crate::content_types::{ContentTypes, CT_CORE_PROPERTIES, CT_FOOTER};
use crate::core_properties::CoreProperties;
use crate::error::{OoxmlError, Result};
use crate::relationships::{rels_path_for, resolve_target, Relationships};
use crate::styles::StyleSheet;
use crate::xml::{XmlElement, XmlPart};

/// WordprocessingML main namespace
pub const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
/// Office document relationships namespace (`r:id` attributes)
pub const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Children of `w:pPr` in schema order
const PPR_ORDER: &[&str] = &[
    "pStyle", "keepNext", "keepLines", "pageBreakBefore", "framePr", "widowControl", "numPr",
    "suppressLineNumbers", "pBdr", "shd", "tabs", "suppressAutoHyphens", "kinsoku", "wordWrap",
    "overflowPunct", "topLinePunct", "autoSpaceDE", "autoSpaceDN", "bidi", "adjustRightInd",
    "snapToGrid", "spacing", "ind", "contextualSpacing", "mirrorIndents", "suppressOverlap", "jc",
    "textDirection", "textAlignment", "textboxTightWrap", "outlineLvl", "divId", "cnfStyle", "rPr",
    "sectPr", "pPrChange",
];

/// Children of `w:rPr` in schema order
const RPR_ORDER: &[&str] = &[
    "rStyle", "rFonts", "b", "bCs", "i", "iCs", "caps", "smallCaps", "strike", "dstrike",
    "outline", "shadow", "emboss", "imprint", "noProof", "snapToGrid", "vanish", "webHidden",
    "color", "spacing", "w", "kern", "position", "sz", "szCs", "highlight", "u", "effect", "bdr",
    "shd", "fitText", "vertAlign", "rtl", "cs", "em", "lang", "eastAsianLayout", "specVanish",
    "oMath", "rPrChange",
];

/// Children of `w:sectPr` that follow the header/footer references
const SECTPR_AFTER_REFERENCES: &[&str] = &[
    "footnotePr", "endnotePr", "type", "pgSz", "pgMar", "paperSrc", "pgBorders", "lnNumType",
    "pgNumType", "cols", "formProt", "vAlign", "noEndnote", "titlePg", "textDirection", "bidi",
    "rtlGutter", "docGrid", "printerSettings", "sectPrChange",
];

/// Get or create `local` inside `parent`, keeping `order`
fn ensure_ordered<'a>(
    parent: &'a mut XmlElement,
    local: &str,
    order: &[&str],
) -> &'a mut XmlElement {
    let successors = order
        .iter()
        .position(|name| *name == local)
        .map(|index| &order[index + 1..])
        .unwrap_or(&[]);
    parent.ensure_child(local, &format!("w:{local}"), successors)
}

/// Whether an on/off property (`w:b`, `w:i`) is switched on
fn toggle_is_on(element: &XmlElement) -> bool {
    !matches!(element.attr_local("val"), Some("0" | "false" | "off"))
}

/// A paragraph (`w:p`)
#[derive(Debug)]
pub struct Paragraph<E> {
    element: E,
}

impl<E: Deref<Target = XmlElement>> Paragraph<E> {
    /// Wrap a `w:p` element
    pub fn new(element: E) -> Self {
        Self { element }
    }

    /// The underlying element
    pub fn element(&self) -> &XmlElement {
        &self.element
    }

    /// Referenced paragraph style ID
    pub fn style_id(&self) -> Option<&str> {
        self.element
            .child("pPr")?
            .child("pStyle")?
            .attr_local("val")
    }

    /// Paragraph alignment (`w:jc`)
    pub fn alignment(&self) -> Option<&str> {
        self.element.child("pPr")?.child("jc")?.attr_local("val")
    }

    /// Runs that are direct children of the paragraph
    pub fn runs(&self) -> impl Iterator<Item = Run<&XmlElement>> + '_ {
        self.element.children_named("r").map(Run::new)
    }

    /// All runs, including those nested in hyperlinks, fields and
    /// tracked-change containers
    pub fn all_runs(&self) -> Vec<Run<&XmlElement>> {
        let mut runs = Vec::new();
        collect_runs(&self.element, &mut runs);
        runs
    }

    /// Visible text of the paragraph
    pub fn text(&self) -> String {
        self.all_runs().iter().map(|run| run.text()).collect()
    }

    /// Whether the paragraph has no content besides its properties
    pub fn is_empty(&self) -> bool {
        self.element.elements().all(|e| {
            matches!(
                e.local_name(),
                "pPr" | "bookmarkStart" | "bookmarkEnd" | "proofErr"
            )
        })
    }
}

impl<E: DerefMut<Target = XmlElement>> Paragraph<E> {
    fn properties_mut(&mut self) -> &mut XmlElement {
        self.element.ensure_leading_child("pPr", "w:pPr")
    }

    /// Point the paragraph at another style
    pub fn set_style_id(&mut self, style_id: &str) {
        ensure_ordered(self.properties_mut(), "pStyle", PPR_ORDER).set_attr("w:val", style_id);
    }

    /// Set paragraph alignment (`left`, `center`, `right`, `both`)
    pub fn set_alignment(&mut self, value: &str) {
        ensure_ordered(self.properties_mut(), "jc", PPR_ORDER).set_attr("w:val", value);
    }

    /// Direct runs, mutably
    pub fn runs_mut(&mut self) -> impl Iterator<Item = Run<&mut XmlElement>> + '_ {
        self.element.children_named_mut("r").map(Run::new)
    }

    /// Visit every run, including nested ones
    pub fn for_each_run_mut(&mut self, visit: &mut dyn FnMut(Run<&mut XmlElement>)) {
        visit_runs_mut(&mut self.element, visit);
    }

    /// Append a run element
    pub fn push_run(&mut self, run: XmlElement) {
        self.element.push(run);
    }
}

fn collect_runs<'a>(element: &'a XmlElement, runs: &mut Vec<Run<&'a XmlElement>>) {
    for child in element.elements() {
        match child.local_name() {
            "r" => runs.push(Run::new(child)),
            "pPr" => {}
            _ => collect_runs(child, runs),
        }
    }
}

fn visit_runs_mut(element: &mut XmlElement, visit: &mut dyn FnMut(Run<&mut XmlElement>)) {
    for child in element.elements_mut() {
        match child.local_name() {
            "r" => visit(Run::new(child)),
            "pPr" => {}
            _ => visit_runs_mut(child, visit),
        }
    }
}

/// A text run (`w:r`)
#[derive(Debug)]
pub struct Run<E> {
    element: E,
}

impl<E: Deref<Target = XmlElement>> Run<E> {
    /// Wrap a `w:r` element
    pub fn new(element: E) -> Self {
        Self { element }
    }

    /// The underlying element
    pub fn element(&self) -> &XmlElement {
        &self.element
    }

    fn property(&self, local_name: &str) -> Option<&XmlElement> {
        self.element.child("rPr")?.child(local_name)
    }

    /// Visible text: `w:t` content, tabs and breaks
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in self.element.elements() {
            match child.local_name() {
                "t" => out.push_str(&child.text_content()),
                "tab" => out.push('\t'),
                "br" | "cr" => out.push('\n'),
                _ => {}
            }
        }
        out
    }

    /// Direct bold formatting
    pub fn is_bold(&self) -> bool {
        self.property("b").is_some_and(toggle_is_on)
    }

    /// Direct italic formatting
    pub fn is_italic(&self) -> bool {
        self.property("i").is_some_and(toggle_is_on)
    }

    /// Referenced character style ID
    pub fn style_id(&self) -> Option<&str> {
        self.property("rStyle")?.attr_local("val")
    }

    /// Language tag (`w:lang w:val`)
    pub fn language(&self) -> Option<&str> {
        self.property("lang")?.attr_local("val")
    }
}

impl<E: DerefMut<Target = XmlElement>> Run<E> {
    fn properties_mut(&mut self) -> &mut XmlElement {
        self.element.ensure_leading_child("rPr", "w:rPr")
    }

    /// Point the run at a character style
    pub fn set_style_id(&mut self, style_id: &str) {
        ensure_ordered(self.properties_mut(), "rStyle", RPR_ORDER).set_attr("w:val", style_id);
    }

    /// Set the run language, updating an existing `w:lang` in place
    pub fn set_language(&mut self, language: &str) {
        ensure_ordered(self.properties_mut(), "lang", RPR_ORDER).set_attr("w:val", language);
    }
}

/// A table (`w:tbl`)
#[derive(Debug)]
pub struct Table<E> {
    element: E,
}

impl<E: Deref<Target = XmlElement>> Table<E> {
    /// Wrap a `w:tbl` element
    pub fn new(element: E) -> Self {
        Self { element }
    }

    /// The underlying element
    pub fn element(&self) -> &XmlElement {
        &self.element
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.element.children_named("tr").count()
    }

    /// Cell elements of one row
    pub fn cells(&self, row: usize) -> Vec<&XmlElement> {
        self.element
            .children_named("tr")
            .nth(row)
            .map(|tr| tr.children_named("tc").collect())
            .unwrap_or_default()
    }

    /// Every cell paragraph, descending into nested tables
    pub fn paragraphs(&self) -> Vec<Paragraph<&XmlElement>> {
        let mut out = Vec::new();
        collect_table_paragraphs(&self.element, &mut out);
        out
    }
}

impl<E: DerefMut<Target = XmlElement>> Table<E> {
    /// Visit every cell paragraph, descending into nested tables
    pub fn for_each_paragraph_mut(&mut self, visit: &mut dyn FnMut(Paragraph<&mut XmlElement>)) {
        visit_table_paragraphs_mut(&mut self.element, visit);
    }
}

fn collect_table_paragraphs<'a>(table: &'a XmlElement, out: &mut Vec<Paragraph<&'a XmlElement>>) {
    for row in table.children_named("tr") {
        for cell in row.children_named("tc") {
            for block in cell.elements() {
                match block.local_name() {
                    "p" => out.push(Paragraph::new(block)),
                    "tbl" => collect_table_paragraphs(block, out),
                    _ => {}
                }
            }
        }
    }
}

fn visit_table_paragraphs_mut(
    table: &mut XmlElement,
    visit: &mut dyn FnMut(Paragraph<&mut XmlElement>),
) {
    for row in table.children_named_mut("tr") {
        for cell in row.children_named_mut("tc") {
            for block in cell.elements_mut() {
                match block.local_name() {
                    "p" => visit(Paragraph::new(block)),
                    "tbl" => visit_table_paragraphs_mut(block, visit),
                    _ => {}
                }
            }
        }
    }
}

/// A footer part with a single empty paragraph
fn empty_footer() -> XmlPart {
    XmlPart::new(
        XmlElement::new("w:ftr")
            .with_attr("xmlns:w", NS_W)
            .with_attr("xmlns:r", NS_R)
            .with_child(XmlElement::new("w:p")),
    )
}

/// An editable WordprocessingML package
#[derive(Debug, Clone)]
pub struct Document {
    archive: OoxmlArchive,
    main_path: String,
    main: XmlPart,
    styles: StyleSheet,
    rels: Relationships,
    package_rels: Relationships,
    content_types: ContentTypes,
    core_path: String,
    core: Option<CoreProperties>,
    footers: BTreeMap<String, XmlPart>,
}

impl Document {
    /// Open a DOCX file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_archive(OoxmlArchive::open(path)?)
    }

    /// Load a DOCX held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_archive(OoxmlArchive::from_bytes(bytes)?)
    }

    /// Parse the parts of an unpacked package
    pub fn from_archive(archive: OoxmlArchive) -> Result<Self> {
        let package_rels = match archive.get(PACKAGE_RELS_PART) {
            Some(xml) => Relationships::parse(xml)?,
            None => Relationships::new(),
        };

        let main_path = package_rels
            .find_by_type(Relationships::TYPE_OFFICE_DOCUMENT)
            .map(|rel| resolve_target("", &rel.target))
            .unwrap_or_else(|| DOCUMENT_PART.to_string());
        let main = XmlPart::parse(archive.require(&main_path)?)?;
        if main.root.child("body").is_none() {
            return Err(OoxmlError::InvalidStructure(format!(
                "{main_path} has no w:body"
            )));
        }

        let rels = match archive.get(&rels_path_for(&main_path)) {
            Some(xml) => Relationships::parse(xml)?,
            None => Relationships::new(),
        };

        let styles_xml = rels
            .find_by_type(Relationships::TYPE_STYLES)
            .map(|rel| resolve_target(&main_path, &rel.target))
            .and_then(|path| archive.get(&path))
            .or_else(|| archive.get(STYLES_PART));
        let styles = match styles_xml {
            Some(xml) => StyleSheet::parse(xml)?,
            None => {
                log::debug!("package has no style definitions");
                StyleSheet::default()
            }
        };

        let content_types = match archive.get(CONTENT_TYPES_PART) {
            Some(xml) => ContentTypes::parse(xml)?,
            None => ContentTypes::new(),
        };

        let core_path = package_rels
            .find_by_type(Relationships::TYPE_CORE_PROPERTIES)
            .map(|rel| resolve_target("", &rel.target))
            .unwrap_or_else(|| CORE_PROPERTIES_PART.to_string());
        let core = archive
            .get(&core_path)
            .map(CoreProperties::parse)
            .transpose()?;

        let mut footers = BTreeMap::new();
        for rel in rels
            .iter()
            .filter(|rel| rel.rel_type == Relationships::TYPE_FOOTER)
        {
            let path = resolve_target(&main_path, &rel.target);
            if let Some(xml) = archive.get(&path) {
                footers.insert(path, XmlPart::parse(xml)?);
            }
        }

        Ok(Self {
            archive,
            main_path,
            main,
            styles,
            rels,
            package_rels,
            content_types,
            core_path,
            core,
            footers,
        })
    }

    /// Archive path of the main document part
    pub fn main_part_path(&self) -> &str {
        &self.main_path
    }

    /// Style definitions
    pub fn styles(&self) -> &StyleSheet {
        &self.styles
    }

    /// Relationships of the main part
    pub fn relationships(&self) -> &Relationships {
        &self.rels
    }

    /// Content types table
    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    /// Root element of the main part
    pub fn root(&self) -> &XmlElement {
        &self.main.root
    }

    /// The `w:body` element
    pub fn body(&self) -> Option<&XmlElement> {
        self.main.root.child("body")
    }

    /// The `w:body` element, mutably
    pub fn body_mut(&mut self) -> Option<&mut XmlElement> {
        self.main.root.child_mut("body")
    }

    /// Paragraphs that are direct children of the body
    pub fn paragraphs(&self) -> impl Iterator<Item = Paragraph<&XmlElement>> + '_ {
        self.body()
            .into_iter()
            .flat_map(|body| body.children_named("p"))
            .map(Paragraph::new)
    }

    /// Body paragraphs, mutably
    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = Paragraph<&mut XmlElement>> + '_ {
        self.body_mut()
            .into_iter()
            .flat_map(|body| body.children_named_mut("p"))
            .map(Paragraph::new)
    }

    /// Tables that are direct children of the body
    pub fn tables(&self) -> impl Iterator<Item = Table<&XmlElement>> + '_ {
        self.body()
            .into_iter()
            .flat_map(|body| body.children_named("tbl"))
            .map(Table::new)
    }

    /// Body tables, mutably
    pub fn tables_mut(&mut self) -> impl Iterator<Item = Table<&mut XmlElement>> + '_ {
        self.body_mut()
            .into_iter()
            .flat_map(|body| body.children_named_mut("tbl"))
            .map(Table::new)
    }

    /// Core properties, if the package has them
    pub fn core_properties(&self) -> Option<&CoreProperties> {
        self.core.as_ref()
    }

    /// Core properties, creating the part (with its package relationship
    /// and content type) when missing
    pub fn core_properties_mut(&mut self) -> &mut CoreProperties {
        if self.core.is_none() {
            log::debug!("creating {}", self.core_path);
            if self
                .package_rels
                .find_by_type(Relationships::TYPE_CORE_PROPERTIES)
                .is_none()
            {
                self.package_rels
                    .add(self.core_path.clone(), Relationships::TYPE_CORE_PROPERTIES);
            }
            self.content_types
                .ensure_override(&self.core_path, CT_CORE_PROPERTIES);
        }
        self.core.get_or_insert_with(CoreProperties::new)
    }

    /// Section property elements (`w:sectPr`) in document order:
    /// paragraph-level section breaks first, the body-level one last
    pub fn sections(&self) -> Vec<&XmlElement> {
        self.body()
            .into_iter()
            .flat_map(|body| body.elements())
            .filter_map(|e| match e.local_name() {
                "sectPr" => Some(e),
                "p" => e.child("pPr").and_then(|ppr| ppr.child("sectPr")),
                _ => None,
            })
            .collect()
    }

    fn section_mut(&mut self, index: usize) -> Option<&mut XmlElement> {
        self.body_mut()?
            .elements_mut()
            .filter_map(|e| {
                if e.is("sectPr") {
                    Some(e)
                } else if e.is("p") {
                    e.child_mut("pPr").and_then(|ppr| ppr.child_mut("sectPr"))
                } else {
                    None
                }
            })
            .nth(index)
    }

    /// Append a body-level `w:sectPr` when the document has no section at
    /// all. Returns whether one was added.
    pub fn ensure_section(&mut self) -> bool {
        if !self.sections().is_empty() {
            return false;
        }
        match self.body_mut() {
            Some(body) => {
                body.push(XmlElement::new("w:sectPr"));
                true
            }
            None => false,
        }
    }

    /// Archive path of the default footer referenced by a section
    pub fn default_footer_path(&self, section: usize) -> Option<String> {
        let sections = self.sections();
        let reference = sections.get(section)?.children_named("footerReference").find(|e| {
            e.attr_local("type").unwrap_or("default") == "default"
        })?;
        let rel = self.rels.get(reference.attr_local("id")?)?;
        Some(resolve_target(&self.main_path, &rel.target))
    }

    /// Archive path of the section's default footer, creating the footer
    /// part, its relationship, its content type and the section reference
    /// when the section has none
    pub fn ensure_default_footer(&mut self, section: usize) -> Result<String> {
        if section >= self.sections().len() {
            return Err(OoxmlError::InvalidStructure(format!(
                "section {section} does not exist"
            )));
        }

        if let Some(path) = self.default_footer_path(section) {
            if !self.footers.contains_key(&path) {
                log::debug!("footer {path} is referenced but missing, recreating it");
                self.content_types.ensure_override(&path, CT_FOOTER);
                self.footers.insert(path.clone(), empty_footer());
            }
            return Ok(path);
        }

        let path = self.next_footer_path();
        let target = match self.main_path.rsplit_once('/') {
            Some((dir, _)) => path
                .strip_prefix(&format!("{dir}/"))
                .unwrap_or(path.as_str())
                .to_string(),
            None => path.clone(),
        };
        let id = self.rels.add(target, Relationships::TYPE_FOOTER);
        self.content_types.ensure_override(&path, CT_FOOTER);
        self.footers.insert(path.clone(), empty_footer());
        log::debug!("created {path} as {id} for section {section}");

        let prefix = self.relationship_prefix();
        let sect_pr = self.section_mut(section).ok_or_else(|| {
            OoxmlError::InvalidStructure(format!("section {section} does not exist"))
        })?;
        // Drop dangling default references before adding ours
        sect_pr.remove_children(|e| {
            e.is("footerReference") && e.attr_local("type").unwrap_or("default") == "default"
        });
        sect_pr.insert_before_any(
            XmlElement::new("w:footerReference")
                .with_attr("w:type", "default")
                .with_attr(format!("{prefix}:id"), id),
            SECTPR_AFTER_REFERENCES,
        );

        Ok(path)
    }

    /// Footer root element (`w:ftr`) by archive path
    pub fn footer(&self, path: &str) -> Option<&XmlElement> {
        self.footers.get(path).map(|part| &part.root)
    }

    /// Footer root element, mutably
    pub fn footer_mut(&mut self, path: &str) -> Option<&mut XmlElement> {
        self.footers.get_mut(path).map(|part| &mut part.root)
    }

    fn next_footer_path(&self) -> String {
        let dir = self
            .main_path
            .rsplit_once('/')
            .map(|(dir, _)| format!("{dir}/"))
            .unwrap_or_default();
        (1..)
            .map(|n| format!("{dir}footer{n}.xml"))
            .find(|path| !self.archive.contains(path) && !self.footers.contains_key(path))
            .unwrap_or_else(|| format!("{dir}footer.xml"))
    }

    /// Prefix bound to the relationships namespace on the main part,
    /// declaring `r` if needed
    fn relationship_prefix(&mut self) -> String {
        let declared = self.main.root.attrs.iter().find_map(|(key, value)| {
            key.strip_prefix("xmlns:")
                .filter(|_| value == NS_R)
                .map(str::to_string)
        });
        match declared {
            Some(prefix) => prefix,
            None => {
                self.main.root.set_attr("xmlns:r", NS_R);
                "r".to_string()
            }
        }
    }

    /// Repack every parsed part into a copy of the archive
    pub fn to_archive(&self) -> OoxmlArchive {
        let mut archive = self.archive.clone();
        archive.set(self.main_path.as_str(), self.main.to_bytes());
        archive.set_string(rels_path_for(&self.main_path), self.rels.to_xml());
        if !self.package_rels.is_empty() {
            archive.set_string(PACKAGE_RELS_PART, self.package_rels.to_xml());
        }
        archive.set_string(CONTENT_TYPES_PART, self.content_types.to_xml());
        if let Some(core) = &self.core {
            archive.set_string(self.core_path.as_str(), core.to_xml());
        }
        for (path, part) in &self.footers {
            archive.set(path.as_str(), part.to_bytes());
        }
        archive
    }

    /// Serialize the document to DOCX bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_archive().to_bytes()
    }

    /// Write the document to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

/// Whether an element tree contains a node of the given local name
pub fn contains_element(root: &XmlElement, local_name: &str) -> bool {
    root.elements()
        .any(|e| e.is(local_name) || contains_element(e, local_name))
}
