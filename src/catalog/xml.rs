use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Document is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("Malformed XML at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    #[error("Document has no root element")]
    Empty,

    #[error("Unclosed element <{0}>")]
    Unclosed(String),
}

/// An XML element with namespace prefixes stripped from element and attribute names.
///
/// THREDDS catalogs put everything we read in the InvCatalog namespace, plus
/// `xlink:href`/`xlink:title` on catalogRefs, so local names are unambiguous.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Element {
    pub name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Direct children with the given name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// All descendants (not including `self`) in document order
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        let mut stack: Vec<&Element> = self.children.iter().rev().collect();
        while let Some(element) = stack.pop() {
            out.push(element);
            stack.extend(element.children.iter().rev());
        }
        out
    }

    /// All descendants with the given name, in document order
    pub fn find_all(&self, name: &str) -> Vec<&Element> {
        self.descendants()
            .into_iter()
            .filter(|e| e.name == name)
            .collect()
    }

    /// Trimmed text content
    pub fn text(&self) -> &str {
        self.text.trim()
    }
}

/// Parse a document into an element tree
///
/// # Errors
///
/// Returns `XmlError::Encoding` for non-UTF-8 input, `XmlError::Malformed` for syntax
/// errors, `XmlError::Empty` when there is no root element, or `XmlError::Unclosed` when
/// the document ends inside an element.
pub fn parse(bytes: &[u8]) -> Result<Element, XmlError> {
    let text = std::str::from_utf8(bytes)?;
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| XmlError::Malformed {
            position: reader.buffer_position(),
            message: e.to_string(),
        })?;

        match event {
            Event::Start(ref e) => stack.push(start_element(e, &reader)?),
            Event::Empty(ref e) => {
                let element = start_element(e, &reader)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                // quick-xml checks that end names match their start tags
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Text(ref e) => {
                if let Some(current) = stack.last_mut() {
                    let text = e.unescape().map_err(|err| XmlError::Malformed {
                        position: reader.buffer_position(),
                        message: err.to_string(),
                    })?;
                    current.text.push_str(&text);
                }
            }
            Event::CData(ref e) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(e));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed(open.name));
    }
    root.ok_or(XmlError::Empty)
}

fn start_element(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Element, XmlError> {
    let malformed = |message: String| XmlError::Malformed {
        position: reader.buffer_position(),
        message,
    };

    let mut element = Element::new(String::from_utf8_lossy(e.local_name().as_ref()));
    for attr in e.attributes() {
        let attr = attr.map_err(|err| malformed(err.to_string()))?;
        let key = attr.key.local_name();
        let key = String::from_utf8_lossy(key.as_ref()).to_string();
        // namespace declarations are not data
        if key == "xmlns" || attr.key.as_ref().starts_with(b"xmlns:") {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|err| malformed(err.to_string()))?;
        element.attributes.insert(key, value.into_owned());
    }
    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}
