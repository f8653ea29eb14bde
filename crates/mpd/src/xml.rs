//! A small namespace-aware element tree.
//!
//! The manifest grammar is walked by element name at several levels at once
//! (BaseURL lookups climb from a Representation up to the MPD root), so the
//! event stream of [`quick_xml`] is folded into an owned tree first.

use quick_xml::{
    events::{BytesStart, Event},
    name::ResolveResult,
    NsReader,
};

use crate::error::{MpdError, MpdResult};

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    name: String,
    /// Whether the element is bound to the namespace of the document root.
    in_document_namespace: bool,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    fn from_start(
        start: &BytesStart<'_>,
        namespace: Option<&str>,
        document_namespace: Option<&str>,
    ) -> MpdResult<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            in_document_namespace: namespace == document_namespace,
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw attribute value. An attribute that is present but empty is returned as `Some("")`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute value with absence collapsed into an empty string.
    pub fn attr(&self, name: &str) -> &str {
        self.attribute(name).unwrap_or_default()
    }

    /// Trimmed text content of this element, not including descendants.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Direct children bound to the document namespace, in document order.
    pub fn children(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter(|c| c.in_document_namespace)
    }

    pub fn children_named<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a XmlElement> + use<'a, 'n> {
        self.children().filter(move |c| c.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children_named(name).next()
    }

    /// First descendant with the given name, depth-first in document order.
    pub fn descendant(&self, name: &str) -> Option<&XmlElement> {
        self.children().find_map(|c| {
            if c.name == name {
                Some(c)
            } else {
                c.descendant(name)
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct XmlDocument {
    root: XmlElement,
    namespace: Option<String>,
}

impl XmlDocument {
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Namespace of the root element, usually `urn:mpeg:dash:schema:mpd:2011`.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

fn resolved_namespace(resolved: &ResolveResult<'_>) -> Option<String> {
    match resolved {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        ResolveResult::Unbound => None,
        ResolveResult::Unknown(prefix) => Some(format!(
            "unknown:{}",
            String::from_utf8_lossy(prefix.as_slice())
        )),
    }
}

pub fn parse(text: &str) -> MpdResult<XmlDocument> {
    let mut reader = NsReader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut namespace: Option<Option<String>> = None;
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root = None;

    loop {
        let (resolved, event) = reader.read_resolved_event()?;
        let element_namespace = resolved_namespace(&resolved);

        match event {
            Event::Start(start) | Event::Empty(start)
                if root.is_some() && stack.is_empty() =>
            {
                log::debug!(
                    "Ignoring trailing element <{}> after manifest root",
                    String::from_utf8_lossy(start.local_name().as_ref())
                );
            }
            Event::Start(start) => {
                let document_namespace =
                    namespace.get_or_insert_with(|| element_namespace.clone());
                stack.push(XmlElement::from_start(
                    &start,
                    element_namespace.as_deref(),
                    document_namespace.as_deref(),
                )?);
            }
            Event::Empty(start) => {
                let document_namespace =
                    namespace.get_or_insert_with(|| element_namespace.clone());
                let element = XmlElement::from_start(
                    &start,
                    element_namespace.as_deref(),
                    document_namespace.as_deref(),
                )?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::End(_) => {
                // quick-xml rejects mismatched end tags, so the stack is never empty here
                if let Some(element) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => root = Some(element),
                    }
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(text.unescape()?.trim());
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(String::from_utf8_lossy(&data.into_inner()).trim());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(MpdError::MissingElement("closing tag"));
    }
    let root = root.ok_or(MpdError::MissingElement("MPD"))?;

    Ok(XmlDocument {
        root,
        namespace: namespace.flatten(),
    })
}
