// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Minimal owned XML element tree.
//
// JMF messages are small and shallow, so a full DOM is not needed: the
// envelope and the response validator only ever look up elements by local
// name, read or set attributes, and collect text.  Reading goes through
// `quick-xml`'s pull parser; writing is a compact serializer with escaping.

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

/// Well-formedness failure while reading a document.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct XmlError(pub String);

/// A child of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with its qualified name, ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder form of [`set_attr`](Self::set_attr).
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder form of [`push_child`](Self::push_child).
    pub fn with_child(mut self, child: Element) -> Self {
        self.push_child(child);
        self
    }

    /// Builder form of [`push_text`](Self::push_text).
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.push_text(text);
        self
    }

    /// Qualified name as written (may carry a namespace prefix).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without any namespace prefix.
    pub fn local_name(&self) -> &str {
        local(&self.name)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing any previous value in place.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(k, _)| k == key)?;
        Some(self.attributes.remove(pos).1)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn clear_children(&mut self) {
        self.children.clear();
    }

    /// Remove direct child elements for which `keep` returns `false`.
    pub fn retain_elements(&mut self, mut keep: impl FnMut(&Element) -> bool) {
        self.children.retain(|node| match node {
            Node::Element(el) => keep(el),
            Node::Text(_) => true,
        });
    }

    /// Direct child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// First direct child with the given local name.
    pub fn child(&self, local_name: &str) -> Option<&Element> {
        self.elements().find(|el| el.local_name() == local_name)
    }

    pub fn child_mut(&mut self, local_name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|el| el.local_name() == local_name)
    }

    /// Depth-first search (self included) for the first element with the
    /// given local name.
    pub fn find(&self, local_name: &str) -> Option<&Element> {
        if self.local_name() == local_name {
            return Some(self);
        }
        self.elements().find_map(|el| el.find(local_name))
    }

    /// Concatenated direct text content, verbatim.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if let Node::Text(text) = node {
                out.push_str(text);
            }
        }
        out
    }

    /// Serialize as a standalone document with an XML declaration.
    pub fn to_document(&self) -> Vec<u8> {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        write_element(&mut out, self);
        out.push('\n');
        out.into_bytes()
    }
}

fn local(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn write_element(out: &mut String, el: &Element) {
    out.push('<');
    out.push_str(&el.name);
    for (key, value) in &el.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value.as_str()));
        out.push('"');
    }
    if el.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &el.children {
        match child {
            Node::Element(inner) => write_element(out, inner),
            Node::Text(text) => out.push_str(&escape(text.as_str())),
        }
    }
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

/// Parse a complete document into its root element.
///
/// Whitespace-only text between child elements is dropped; text content of
/// a leaf element is kept verbatim.  Comments, processing instructions and
/// the declaration are skipped.  Anything that is not well-formed UTF-8 XML
/// with exactly one root element is rejected.
pub fn parse(bytes: &[u8]) -> Result<Element, XmlError> {
    let text =
        std::str::from_utf8(bytes).map_err(|e| XmlError(format!("document is not UTF-8: {e}")))?;
    let mut reader = Reader::from_str(text);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(XmlError(format!(
                    "at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
        };

        match event {
            Event::Start(start) => stack.push(element_from_start(&start)?),
            Event::Empty(start) => {
                let el = element_from_start(&start)?;
                attach(&mut stack, &mut root, el)?;
            }
            Event::End(_) => {
                let mut el = stack
                    .pop()
                    .ok_or_else(|| XmlError("closing tag without opening tag".into()))?;
                drop_layout_whitespace(&mut el);
                attach(&mut stack, &mut root, el)?;
            }
            Event::Text(raw) => {
                let text = raw
                    .unescape()
                    .map_err(|e| XmlError(format!("bad character data: {e}")))?;
                push_text(&mut stack, &text)?;
            }
            Event::CData(raw) => {
                let text = String::from_utf8_lossy(&raw).into_owned();
                push_text(&mut stack, &text)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError(format!(
            "unexpected end of document: <{}> is not closed",
            open.name
        )));
    }
    root.ok_or_else(|| XmlError("document has no root element".into()))
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element, XmlError> {
    let mut el = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError(format!("bad attribute: {e}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError(format!("bad attribute value for {key}: {e}")))?;
        el.attributes.push((key, value.into_owned()));
    }
    Ok(el)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    el: Element,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.push_child(el);
    } else if root.is_some() {
        return Err(XmlError(format!(
            "second root element <{}> after document end",
            el.name
        )));
    } else {
        *root = Some(el);
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => {
            match parent.children.last_mut() {
                Some(Node::Text(prev)) => prev.push_str(text),
                _ => parent.push_text(text),
            }
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(XmlError("text outside the root element".into())),
    }
}

/// Indentation between child elements is layout, not content.
fn drop_layout_whitespace(el: &mut Element) {
    if el.elements().next().is_none() {
        return;
    }
    el.children.retain(|node| match node {
        Node::Text(text) => !text.trim().is_empty(),
        Node::Element(_) => true,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_and_text() {
        let doc = br#"<?xml version="1.0"?>
            <JMF xmlns="http://www.CIP4.org/JDFSchema_1_1">
              <Response ReturnCode="5">
                <Notification Class="Error"><Comment>Queue &amp; device full</Comment></Notification>
              </Response>
            </JMF>"#;
        let root = parse(doc).expect("parse");
        assert_eq!(root.name(), "JMF");
        let response = root.find("Response").expect("response");
        assert_eq!(response.attr("ReturnCode"), Some("5"));
        let comment = response
            .child("Notification")
            .and_then(|n| n.child("Comment"))
            .expect("comment");
        assert_eq!(comment.text(), "Queue & device full");
    }

    #[test]
    fn leaf_text_is_kept_verbatim_and_indentation_dropped() {
        let root = parse(b"<JMF>\n  <Comment>  padded \n</Comment>\n  <Blank>   </Blank>\n</JMF>")
            .expect("parse");
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.child("Comment").expect("comment").text(), "  padded \n");
        assert_eq!(root.child("Blank").expect("blank").text(), "   ");
    }

    #[test]
    fn prefixed_names_match_by_local_name() {
        let root = parse(b"<jmf:JMF xmlns:jmf=\"urn:x\"><jmf:Response ReturnCode=\"0\"/></jmf:JMF>")
            .expect("parse");
        assert_eq!(root.local_name(), "JMF");
        assert!(root.find("Response").is_some());
    }

    #[test]
    fn rejects_unclosed_and_mismatched_documents() {
        assert!(parse(b"<JMF><Response>").is_err());
        assert!(parse(b"<JMF></Response>").is_err());
        assert!(parse(b"<A/><B/>").is_err());
        assert!(parse(b"").is_err());
        assert!(parse(b"not xml at all").is_err());
        assert!(parse(&[0xff, 0xfe, 0x00]).is_err());
    }

    #[test]
    fn serializer_escapes_attributes_and_text() {
        let el = Element::new("Comment")
            .with_attr("Agent", "a\"b<c")
            .with_text("x & y");
        let doc = el.to_document();
        let reparsed = parse(&doc).expect("reparse");
        assert_eq!(reparsed, el);
    }

    #[test]
    fn set_attr_replaces_in_place() {
        let mut el = Element::new("JMF").with_attr("A", "1").with_attr("B", "2");
        el.set_attr("A", "3");
        let attrs: Vec<_> = el.attributes().collect();
        assert_eq!(attrs, vec![("A", "3"), ("B", "2")]);
        assert_eq!(el.remove_attr("A").as_deref(), Some("3"));
        assert_eq!(el.attr("A"), None);
    }
}
