//! Core document properties (docProps/core.xml)

use crate::error::Result;
use crate::xml::{XmlElement, XmlNode, XmlPart};

const NS_CP: &str =
    "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
const NS_DC: &str = "http://purl.org/dc/elements/1.1/";
const NS_DCTERMS: &str = "http://purl.org/dc/terms/";
const NS_DCMITYPE: &str = "http://purl.org/dc/dcmitype/";
const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Editable Dublin Core properties of a package
#[derive(Debug, Clone)]
pub struct CoreProperties {
    part: XmlPart,
}

impl Default for CoreProperties {
    fn default() -> Self {
        let root = XmlElement::new("cp:coreProperties")
            .with_attr("xmlns:cp", NS_CP)
            .with_attr("xmlns:dc", NS_DC)
            .with_attr("xmlns:dcterms", NS_DCTERMS)
            .with_attr("xmlns:dcmitype", NS_DCMITYPE)
            .with_attr("xmlns:xsi", NS_XSI);
        Self {
            part: XmlPart::new(root),
        }
    }
}

impl CoreProperties {
    /// Empty property set with the usual namespace declarations
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an existing core properties part
    pub fn parse(xml: &[u8]) -> Result<Self> {
        Ok(Self {
            part: XmlPart::parse(xml)?,
        })
    }

    /// Document title (`dc:title`)
    pub fn title(&self) -> Option<String> {
        self.dc_value("title")
    }

    /// Set the document title
    pub fn set_title(&mut self, title: &str) {
        self.set_dc_value("title", title);
    }

    /// Document language (`dc:language`)
    pub fn language(&self) -> Option<String> {
        self.dc_value("language")
    }

    /// Set the document language
    pub fn set_language(&mut self, language: &str) {
        self.set_dc_value("language", language);
    }

    fn dc_value(&self, local_name: &str) -> Option<String> {
        self.part
            .root
            .child(local_name)
            .map(|e| e.text_content())
    }

    fn set_dc_value(&mut self, local_name: &str, value: &str) {
        let prefix = self.dc_prefix();
        let root = &mut self.part.root;
        match root.child_mut(local_name) {
            Some(element) => element.children = vec![XmlNode::Text(value.to_string())],
            None => root.push(XmlElement::new(format!("{prefix}:{local_name}")).with_text(value)),
        }
    }

    /// Prefix bound to the Dublin Core namespace, declaring `dc` if needed
    fn dc_prefix(&mut self) -> String {
        let declared = self.part.root.attrs.iter().find_map(|(key, value)| {
            key.strip_prefix("xmlns:")
                .filter(|_| value == NS_DC)
                .map(str::to_string)
        });
        match declared {
            Some(prefix) => prefix,
            None => {
                self.part.root.set_attr("xmlns:dc", NS_DC);
                "dc".to_string()
            }
        }
    }

    /// Serialize the part
    pub fn to_xml(&self) -> String {
        self.part.to_xml()
    }
}
