//! Lossless XML element tree for package parts
//!
//! Parts are parsed into an owned tree of [`XmlElement`]s so that passes can
//! edit paragraphs and runs in place while everything they do not understand
//! (drawings, fields, bookmarks, extension markup) survives serialization.
//!
//! Element and attribute names keep their prefixes (`w:p`, `w:val`).
//! Matching is done on local names; new WordprocessingML elements are written
//! with the conventional `w:` prefix.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{OoxmlError, Result};

/// Standard declaration written in front of every serialized part
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// A node inside an element
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    /// Child element
    Element(XmlElement),
    /// Character data (unescaped)
    Text(String),
    /// CDATA section content
    CData(String),
    /// Comment content (raw)
    Comment(String),
    /// Processing instruction content (raw)
    ProcessingInstruction(String),
}

/// An XML element with its attributes and children
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    /// Qualified name, e.g. `w:p`
    pub name: String,
    /// Attributes in document order, values unescaped
    pub attrs: Vec<(String, String)>,
    /// Child nodes in document order
    pub children: Vec<XmlNode>,
}

/// A parsed part: the root element plus whether a declaration was present
#[derive(Debug, Clone, PartialEq)]
pub struct XmlPart {
    /// Root element
    pub root: XmlElement,
    /// Whether the source carried an `<?xml ...?>` declaration
    pub declaration: bool,
}

impl XmlPart {
    /// Wrap a root element into a part that serializes with a declaration
    pub fn new(root: XmlElement) -> Self {
        Self {
            root,
            declaration: true,
        }
    }

    /// Parse a part from XML bytes
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        // Whitespace inside w:t is content
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;
        let mut declaration = false;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Decl(_) => declaration = true,
                Event::Start(ref e) => stack.push(XmlElement::from_start(e)?),
                Event::Empty(ref e) => {
                    let element = XmlElement::from_start(e)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        OoxmlError::InvalidStructure("unbalanced end tag".to_string())
                    })?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(ref t) => {
                    // Text outside the root element is formatting whitespace
                    if let Some(parent) = stack.last_mut() {
                        let text = t.unescape().map_err(OoxmlError::decode)?;
                        parent.children.push(XmlNode::Text(text.into_owned()));
                    }
                }
                Event::CData(t) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                        parent.children.push(XmlNode::CData(text));
                    }
                }
                Event::Comment(t) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                        parent.children.push(XmlNode::Comment(text));
                    }
                }
                Event::PI(ref t) => {
                    if let Some(parent) = stack.last_mut() {
                        let content = format!(
                            "{}{}",
                            String::from_utf8_lossy(t.target()),
                            String::from_utf8_lossy(t.content())
                        );
                        parent.children.push(XmlNode::ProcessingInstruction(content));
                    }
                }
                Event::DocType(_) => {}
                Event::Eof => break,
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(OoxmlError::InvalidStructure(format!(
                "unclosed element <{}>",
                stack[stack.len() - 1].name
            )));
        }

        let root = root
            .ok_or_else(|| OoxmlError::InvalidStructure("missing root element".to_string()))?;
        Ok(Self { root, declaration })
    }

    /// Serialize the part back to XML text
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        if self.declaration {
            out.push_str(XML_DECLARATION);
            out.push('\n');
        }
        self.root.write_into(&mut out);
        out
    }

    /// Serialize the part to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_xml().into_bytes()
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(element));
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(OoxmlError::InvalidStructure(format!(
            "second root element <{}>",
            element.name
        )))
    }
}

impl XmlElement {
    /// Create an element without attributes or children
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: add an attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    /// Builder: add a child element
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Builder: add a text node
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    fn from_start(e: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(OoxmlError::decode)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(OoxmlError::decode)?;
            attrs.push((key, value.into_owned()));
        }
        Ok(Self {
            name,
            attrs,
            children: Vec::new(),
        })
    }

    /// Name without namespace prefix
    pub fn local_name(&self) -> &str {
        local(&self.name)
    }

    /// Namespace prefix of this element, if any
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Check the local name
    pub fn is(&self, local_name: &str) -> bool {
        self.local_name() == local_name
    }

    /// Get an attribute value by qualified name (`w:val`)
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get an attribute value by local name, ignoring the prefix
    pub fn attr_local(&self, local_name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| local(k) == local_name)
            .map(|(_, v)| v.as_str())
    }

    /// Set (or replace) an attribute
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key.to_string(), value)),
        }
    }

    /// Iterate over child elements
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Iterate mutably over child elements
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element with the given local name
    pub fn child(&self, local_name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.is(local_name))
    }

    /// First child element with the given local name, mutably
    pub fn child_mut(&mut self, local_name: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.is(local_name))
    }

    /// Child elements with the given local name
    pub fn children_named<'a>(
        &'a self,
        local_name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements().filter(move |e| e.is(local_name))
    }

    /// Child elements with the given local name, mutably
    pub fn children_named_mut<'a>(
        &'a mut self,
        local_name: &'a str,
    ) -> impl Iterator<Item = &'a mut XmlElement> + 'a {
        self.elements_mut().filter(move |e| e.is(local_name))
    }

    /// Append a child element
    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Insert a child element before the first existing child whose local
    /// name appears in `before`; append when none does.
    ///
    /// OOXML property containers (`w:pPr`, `w:rPr`, `w:sectPr`) have a fixed
    /// child sequence, so new children go in front of their successors.
    pub fn insert_before_any(&mut self, child: XmlElement, before: &[&str]) -> &mut XmlElement {
        let index = self
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(e) if before.contains(&e.local_name())))
            .unwrap_or(self.children.len());
        self.children.insert(index, XmlNode::Element(child));
        match &mut self.children[index] {
            XmlNode::Element(e) => e,
            _ => unreachable!("just inserted an element"),
        }
    }

    /// Get the child with the given local name, creating it (named
    /// `qualified_name`, positioned by [`insert_before_any`]) when missing
    ///
    /// [`insert_before_any`]: XmlElement::insert_before_any
    pub fn ensure_child(
        &mut self,
        local_name: &str,
        qualified_name: &str,
        before: &[&str],
    ) -> &mut XmlElement {
        let existing = self
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(e) if e.is(local_name)));
        let index = match existing {
            Some(index) => index,
            None => {
                self.insert_before_any(XmlElement::new(qualified_name), before);
                self.children
                    .iter()
                    .position(|node| matches!(node, XmlNode::Element(e) if e.is(local_name)))
                    .unwrap_or(0)
            }
        };
        match &mut self.children[index] {
            XmlNode::Element(e) => e,
            _ => unreachable!("index points at an element"),
        }
    }

    /// Get the child with the given local name, creating it as the first
    /// child when missing (`w:pPr` in `w:p`, `w:rPr` in `w:r`)
    pub fn ensure_leading_child(&mut self, local_name: &str, qualified_name: &str) -> &mut XmlElement {
        let index = match self
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(e) if e.is(local_name)))
        {
            Some(index) => index,
            None => {
                self.children
                    .insert(0, XmlNode::Element(XmlElement::new(qualified_name)));
                0
            }
        };
        match &mut self.children[index] {
            XmlNode::Element(e) => e,
            _ => unreachable!("index points at an element"),
        }
    }

    /// Remove child elements matching `predicate`, returning how many went
    pub fn remove_children(&mut self, predicate: impl Fn(&XmlElement) -> bool) -> usize {
        let before = self.children.len();
        self.children
            .retain(|node| !matches!(node, XmlNode::Element(e) if predicate(e)));
        before - self.children.len()
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Visit this element and all descendant elements, depth first
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a XmlElement)) {
        visit(self);
        for child in self.elements() {
            child.walk(visit);
        }
    }

    fn write_into(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                XmlNode::Element(e) => e.write_into(out),
                XmlNode::Text(text) => out.push_str(&escape_text(text)),
                XmlNode::CData(text) => {
                    out.push_str("<![CDATA[");
                    out.push_str(text);
                    out.push_str("]]>");
                }
                XmlNode::Comment(text) => {
                    out.push_str("<!--");
                    out.push_str(text);
                    out.push_str("-->");
                }
                XmlNode::ProcessingInstruction(content) => {
                    out.push_str("<?");
                    out.push_str(content);
                    out.push_str("?>");
                }
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn collect_text(element: &XmlElement, out: &mut String) {
    for child in &element.children {
        match child {
            XmlNode::Element(e) => collect_text(e, out),
            XmlNode::Text(text) | XmlNode::CData(text) => out.push_str(text),
            _ => {}
        }
    }
}

fn local(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, l)| l).unwrap_or(name)
}

/// Whether XML 1.0 allows `ch` in a document
pub fn is_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{d7ff}' | '\u{e000}'..='\u{fffd}' | '\u{10000}'..='\u{10ffff}'
    )
}

/// Escape character data
///
/// Characters XML cannot hold are dropped.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) && text.chars().all(is_xml_char) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ if !is_xml_char(ch) => {}
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Escape an attribute value (double-quoted)
///
/// Line breaks and tabs are written as character references so that
/// attribute-value normalization does not turn them into spaces on reread.
/// Characters XML cannot hold are dropped.
pub fn escape_attr(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\n', '\r', '\t']) && value.chars().all(is_xml_char) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ if !is_xml_char(ch) => {}
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}
