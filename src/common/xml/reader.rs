//! Cursor-based reader over namespaced EWS XML.
//!
//! [`EwsXmlReader`] wraps a `quick-xml` pull parser and exposes one node at
//! a time. Every routine that reads an element follows the same positional
//! contract: after reading a leaf value the cursor sits on that element's
//! end tag, and after reading a container it sits on the container's end
//! tag. Empty elements (`<t:Subject/>`) are reported as a start element
//! flagged empty followed by a synthetic end element, so callers never need
//! a second code path for them.

use crate::common::error::{Error, Result};
use crate::common::xml::escape::{resolve_entity, unescape_references, unescape_xml};
use crate::common::xml::namespace::{XSI_NS, XmlNamespace};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use smallvec::SmallVec;
use std::collections::VecDeque;

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Kind of node under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlNodeType {
    /// Nothing has been read yet
    None,
    /// Start tag (possibly of an empty element)
    StartElement,
    /// End tag (possibly synthetic, for an empty element)
    EndElement,
    /// Text, CDATA and entity references merged into one value
    Text,
    /// The input is exhausted
    EndOfDocument,
}

/// An attribute of the current start element, with its namespace resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Resolved namespace, `NotSpecified` for unprefixed attributes
    pub namespace: XmlNamespace,
    /// Local part of the attribute name
    pub local_name: String,
    /// Unescaped attribute value
    pub value: String,
}

#[derive(Debug, Clone)]
struct XmlNode {
    kind: XmlNodeType,
    namespace: XmlNamespace,
    namespace_uri: String,
    local_name: String,
    attributes: SmallVec<[XmlAttribute; 4]>,
    is_empty: bool,
    text: String,
}

impl XmlNode {
    fn new(kind: XmlNodeType) -> Self {
        Self {
            kind,
            namespace: XmlNamespace::NotSpecified,
            namespace_uri: String::new(),
            local_name: String::new(),
            attributes: SmallVec::new(),
            is_empty: false,
            text: String::new(),
        }
    }

    fn text(text: String) -> Self {
        Self {
            text,
            ..Self::new(XmlNodeType::Text)
        }
    }

    fn end(namespace_uri: String, local_name: String) -> Self {
        Self {
            namespace: XmlNamespace::from_uri(&namespace_uri),
            namespace_uri,
            local_name,
            ..Self::new(XmlNodeType::EndElement)
        }
    }

    fn qualified_name(&self) -> String {
        match self.namespace {
            XmlNamespace::NotSpecified => self.local_name.clone(),
            ns => format!("{}:{}", ns.prefix(), self.local_name),
        }
    }
}

type NamespaceScope = SmallVec<[(String, String); 2]>;

fn split_qname(qname: &str) -> (&str, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (prefix, local),
        None => ("", qname),
    }
}

/// Pull reader that keeps exactly one current node.
pub struct EwsXmlReader<'a> {
    reader: Reader<&'a [u8]>,
    scopes: Vec<NamespaceScope>,
    queued: VecDeque<XmlNode>,
    node: XmlNode,
}

impl<'a> EwsXmlReader<'a> {
    /// Create a reader over a complete XML document or fragment.
    pub fn new(xml: &'a str) -> Self {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);
        Self {
            reader,
            scopes: Vec::new(),
            queued: VecDeque::new(),
            node: XmlNode::new(XmlNodeType::None),
        }
    }

    /// Advance the cursor by exactly one node.
    pub fn read(&mut self) -> Result<()> {
        let node = self.pull()?;
        if node.kind != XmlNodeType::Text {
            self.node = node;
            return Ok(());
        }

        // Merge adjacent text, CDATA and entity pieces into one node
        let mut text = node.text;
        loop {
            let next = self.pull()?;
            if next.kind == XmlNodeType::Text {
                text.push_str(&next.text);
            } else {
                self.queued.push_front(next);
                break;
            }
        }
        self.node = XmlNode::text(text);
        Ok(())
    }

    /// Kind of the current node.
    #[inline]
    pub fn node_type(&self) -> XmlNodeType {
        self.node.kind
    }

    /// Local name of the current element (empty for text nodes).
    #[inline]
    pub fn local_name(&self) -> &str {
        &self.node.local_name
    }

    /// Namespace of the current element.
    #[inline]
    pub fn namespace(&self) -> XmlNamespace {
        self.node.namespace
    }

    /// Namespace URI of the current element, as declared in the document.
    #[inline]
    pub fn namespace_uri(&self) -> &str {
        &self.node.namespace_uri
    }

    /// Content of the current text node.
    #[inline]
    pub fn text(&self) -> &str {
        &self.node.text
    }

    /// Byte offset of the parser in the input, for error messages.
    pub fn position(&self) -> u64 {
        self.reader.buffer_position() as u64
    }

    /// True when the current node is the start tag of an empty element.
    #[inline]
    pub fn is_empty_element(&self) -> bool {
        self.node.kind == XmlNodeType::StartElement && self.node.is_empty
    }

    /// True when the current node is the start tag `namespace:name`.
    pub fn is_start_element(&self, namespace: XmlNamespace, name: &str) -> bool {
        self.node.kind == XmlNodeType::StartElement
            && self.node.namespace == namespace
            && self.node.local_name == name
    }

    /// True when the current node is any start tag.
    #[inline]
    pub fn is_any_start_element(&self) -> bool {
        self.node.kind == XmlNodeType::StartElement
    }

    /// True when the current node is the end tag `namespace:name`.
    pub fn is_end_element(&self, namespace: XmlNamespace, name: &str) -> bool {
        self.node.kind == XmlNodeType::EndElement
            && self.node.namespace == namespace
            && self.node.local_name == name
    }

    /// Attributes of the current start element.
    pub fn attributes(&self) -> &[XmlAttribute] {
        &self.node.attributes
    }

    /// Value of an unprefixed attribute of the current start element.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attribute_ns(XmlNamespace::NotSpecified, name)
    }

    /// Value of an attribute in a specific namespace.
    pub fn attribute_ns(&self, namespace: XmlNamespace, name: &str) -> Option<&str> {
        self.node
            .attributes
            .iter()
            .find(|a| a.namespace == namespace && a.local_name == name)
            .map(|a| a.value.as_str())
    }

    /// True when the current element carries `xsi:nil="true"`.
    pub fn is_nil(&self) -> bool {
        matches!(
            self.attribute_ns(XmlNamespace::XmlSchemaInstance, "nil"),
            Some("true" | "1")
        )
    }

    /// Fail unless the cursor is on the start tag `namespace:name`.
    pub fn ensure_current_node_is_start_element(
        &self,
        namespace: XmlNamespace,
        name: &str,
    ) -> Result<()> {
        if self.is_start_element(namespace, name) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("start of <{}:{}>", namespace.prefix(), name)))
        }
    }

    /// Fail unless the cursor is on the end tag `namespace:name`.
    pub fn ensure_current_node_is_end_element(
        &self,
        namespace: XmlNamespace,
        name: &str,
    ) -> Result<()> {
        if self.is_end_element(namespace, name) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("end of <{}:{}>", namespace.prefix(), name)))
        }
    }

    /// Read past whitespace to the next start tag and check its name.
    pub fn read_start_element(&mut self, namespace: XmlNamespace, name: &str) -> Result<()> {
        self.read_significant()?;
        self.ensure_current_node_is_start_element(namespace, name)
    }

    /// Read past whitespace to the next end tag and check its name.
    pub fn read_end_element(&mut self, namespace: XmlNamespace, name: &str) -> Result<()> {
        self.read_significant()?;
        self.ensure_current_node_is_end_element(namespace, name)
    }

    /// Read past whitespace-only text to the next element tag.
    pub fn read_significant(&mut self) -> Result<()> {
        loop {
            self.read()?;
            if self.node.kind != XmlNodeType::Text || !self.node.text.trim().is_empty() {
                return Ok(());
            }
        }
    }

    /// Read the text content of the current start element.
    ///
    /// The cursor must be on a start tag; on success it is left on the
    /// matching end tag. Child elements are a deserialization error.
    pub fn read_value(&mut self) -> Result<String> {
        if self.node.kind != XmlNodeType::StartElement {
            return Err(self.unexpected("start of a value element"));
        }
        let owner = self.node.qualified_name();

        let mut value = String::new();
        loop {
            self.read()?;
            match self.node.kind {
                XmlNodeType::Text => value.push_str(&self.node.text),
                XmlNodeType::EndElement => return Ok(value),
                XmlNodeType::StartElement => {
                    return Err(Error::Deserialization(format!(
                        "Unexpected element <{}> inside value of <{}> at position {}",
                        self.node.qualified_name(),
                        owner,
                        self.position()
                    )));
                },
                XmlNodeType::EndOfDocument | XmlNodeType::None => {
                    return Err(self.unexpected_end(&owner));
                },
            }
        }
    }

    /// Read the next element `namespace:name` and return its text content.
    pub fn read_element_value(&mut self, namespace: XmlNamespace, name: &str) -> Result<String> {
        self.read_start_element(namespace, name)?;
        self.read_value()
    }

    /// Skip the current element and everything inside it.
    ///
    /// The cursor must be on a start tag; it is left on the matching end tag.
    pub fn skip_current_element(&mut self) -> Result<()> {
        if self.node.kind != XmlNodeType::StartElement {
            return Err(self.unexpected("start of an element to skip"));
        }
        let owner = self.node.qualified_name();

        let mut depth = 0usize;
        loop {
            self.read()?;
            match self.node.kind {
                XmlNodeType::StartElement => depth += 1,
                XmlNodeType::EndElement => {
                    if depth == 0 {
                        return Ok(());
                    }
                    depth -= 1;
                },
                XmlNodeType::EndOfDocument | XmlNodeType::None => {
                    return Err(self.unexpected_end(&owner));
                },
                XmlNodeType::Text => {},
            }
        }
    }

    /// Advance until the start tag `namespace:name` is found inside the
    /// current element. Returns false, positioned on the current element's
    /// end tag, when it is not there.
    pub fn read_to_descendant(&mut self, namespace: XmlNamespace, name: &str) -> Result<bool> {
        if self.node.kind != XmlNodeType::StartElement {
            return Err(self.unexpected("start of an element to search"));
        }
        if self.node.is_empty {
            self.read()?;
            return Ok(false);
        }
        let owner = self.node.qualified_name();

        let mut depth = 0usize;
        loop {
            self.read()?;
            match self.node.kind {
                XmlNodeType::StartElement => {
                    if self.is_start_element(namespace, name) {
                        return Ok(true);
                    }
                    depth += 1;
                },
                XmlNodeType::EndElement => {
                    if depth == 0 {
                        return Ok(false);
                    }
                    depth -= 1;
                },
                XmlNodeType::EndOfDocument | XmlNodeType::None => {
                    return Err(self.unexpected_end(&owner));
                },
                XmlNodeType::Text => {},
            }
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        let found = match self.node.kind {
            XmlNodeType::StartElement => format!("start of <{}>", self.node.qualified_name()),
            XmlNodeType::EndElement => format!("end of <{}>", self.node.qualified_name()),
            XmlNodeType::Text => "text".to_string(),
            XmlNodeType::EndOfDocument => "end of document".to_string(),
            XmlNodeType::None => "nothing".to_string(),
        };
        Error::Deserialization(format!(
            "Expected {} but found {} at position {}",
            expected,
            found,
            self.position()
        ))
    }

    fn unexpected_end(&self, owner: &str) -> Error {
        Error::Deserialization(format!(
            "Unexpected end of document inside <{}> at position {}",
            owner,
            self.position()
        ))
    }

    fn pull(&mut self) -> Result<XmlNode> {
        match self.queued.pop_front() {
            Some(node) => Ok(node),
            None => self.next_node(),
        }
    }

    fn next_node(&mut self) -> Result<XmlNode> {
        loop {
            let event = self.reader.read_event().map_err(|e| {
                Error::XmlError(format!(
                    "{} at position {}",
                    e,
                    self.reader.buffer_position()
                ))
            })?;

            match event {
                Event::Start(ref e) => return self.start_node(e, false),
                Event::Empty(ref e) => {
                    let start = self.start_node(e, true)?;
                    self.scopes.pop();
                    self.queued.push_back(XmlNode::end(
                        start.namespace_uri.clone(),
                        start.local_name.clone(),
                    ));
                    return Ok(start);
                },
                Event::End(ref e) => {
                    let name = e.name();
                    let qname = std::str::from_utf8(name.as_ref())?;
                    let (prefix, local) = split_qname(qname);
                    let uri = self.resolve_prefix(prefix).to_string();
                    let node = XmlNode::end(uri, local.to_string());
                    self.scopes.pop();
                    return Ok(node);
                },
                Event::Text(ref t) => {
                    let raw = std::str::from_utf8(t)?;
                    return Ok(XmlNode::text(unescape_xml(raw)));
                },
                Event::CData(ref c) => {
                    let raw = std::str::from_utf8(c)?;
                    return Ok(XmlNode::text(raw.to_string()));
                },
                Event::GeneralRef(ref r) => {
                    let name = std::str::from_utf8(r)?;
                    return match resolve_entity(name) {
                        Some(ch) => Ok(XmlNode::text(ch.to_string())),
                        None => Err(Error::Deserialization(format!(
                            "Unknown entity reference &{}; at position {}",
                            name,
                            self.reader.buffer_position()
                        ))),
                    };
                },
                Event::Eof => return Ok(XmlNode::new(XmlNodeType::EndOfDocument)),
                // Declarations, comments, processing instructions, doctype
                _ => continue,
            }
        }
    }

    fn start_node(&mut self, start: &BytesStart<'_>, is_empty: bool) -> Result<XmlNode> {
        let mut declarations = NamespaceScope::new();
        let mut raw_attributes: SmallVec<[(String, String); 4]> = SmallVec::new();

        for attr in start.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?;
            let value = unescape_references(std::str::from_utf8(attr.value.as_ref())?);
            if key == "xmlns" {
                declarations.push((String::new(), value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declarations.push((prefix.to_string(), value));
            } else {
                raw_attributes.push((key.to_string(), value));
            }
        }
        self.scopes.push(declarations);

        let name = start.name();
        let qname = std::str::from_utf8(name.as_ref())?;
        let (prefix, local) = split_qname(qname);
        let namespace_uri = self.resolve_prefix(prefix).to_string();

        let attributes = raw_attributes
            .into_iter()
            .map(|(key, value)| {
                let (prefix, local) = split_qname(&key);
                // Unprefixed attributes are in no namespace
                let namespace = if prefix.is_empty() {
                    XmlNamespace::NotSpecified
                } else {
                    XmlNamespace::from_uri(self.resolve_prefix(prefix))
                };
                XmlAttribute {
                    namespace,
                    local_name: local.to_string(),
                    value,
                }
            })
            .collect();

        Ok(XmlNode {
            kind: XmlNodeType::StartElement,
            namespace: XmlNamespace::from_uri(&namespace_uri),
            namespace_uri,
            local_name: local.to_string(),
            attributes,
            is_empty,
            text: String::new(),
        })
    }

    fn resolve_prefix(&self, prefix: &str) -> &str {
        match prefix {
            "xml" => XML_NS,
            "xsi" if !self.is_prefix_declared("xsi") => XSI_NS,
            _ => self
                .scopes
                .iter()
                .rev()
                .flat_map(|scope| scope.iter())
                .find(|(p, _)| p == prefix)
                .map(|(_, uri)| uri.as_str())
                .unwrap_or(""),
        }
    }

    fn is_prefix_declared(&self, prefix: &str) -> bool {
        self.scopes
            .iter()
            .any(|scope| scope.iter().any(|(p, _)| p == prefix))
    }
}

impl std::fmt::Debug for EwsXmlReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EwsXmlReader")
            .field("node", &self.node.kind)
            .field("name", &self.node.local_name)
            .field("position", &self.position())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<t:Message xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
  <t:ItemId Id="AAMk" ChangeKey="CQAA"/>
  <t:Subject>Q3 &amp; Q4 plans</t:Subject>
  <t:Body BodyType="Text"><![CDATA[<raw>]]> text</t:Body>
  <t:Unknown><t:Nested>1</t:Nested></t:Unknown>
  <t:IsRead>true</t:IsRead>
</t:Message>"#;

    #[test]
    fn test_leaf_read_leaves_cursor_on_end_tag() {
        let mut reader = EwsXmlReader::new(SAMPLE);
        reader.read_start_element(XmlNamespace::Types, "Message").unwrap();
        reader.read_start_element(XmlNamespace::Types, "ItemId").unwrap();
        assert!(reader.is_empty_element());
        assert_eq!(reader.attribute("Id"), Some("AAMk"));
        reader.read().unwrap();
        assert!(reader.is_end_element(XmlNamespace::Types, "ItemId"));

        let subject = reader
            .read_element_value(XmlNamespace::Types, "Subject")
            .unwrap();
        assert_eq!(subject, "Q3 & Q4 plans");
        assert!(reader.is_end_element(XmlNamespace::Types, "Subject"));

        // The next sibling must be readable directly
        reader.read_start_element(XmlNamespace::Types, "Body").unwrap();
        assert_eq!(reader.attribute("BodyType"), Some("Text"));
        assert_eq!(reader.read_value().unwrap(), "<raw> text");
        assert!(reader.is_end_element(XmlNamespace::Types, "Body"));
    }

    #[test]
    fn test_skip_current_element() {
        let mut reader = EwsXmlReader::new(SAMPLE);
        reader.read_start_element(XmlNamespace::Types, "Message").unwrap();
        assert!(reader.read_to_descendant(XmlNamespace::Types, "Unknown").unwrap());
        reader.skip_current_element().unwrap();
        assert!(reader.is_end_element(XmlNamespace::Types, "Unknown"));
        assert_eq!(
            reader
                .read_element_value(XmlNamespace::Types, "IsRead")
                .unwrap(),
            "true"
        );
        reader.read_end_element(XmlNamespace::Types, "Message").unwrap();
        reader.read().unwrap();
        assert_eq!(reader.node_type(), XmlNodeType::EndOfDocument);
    }

    #[test]
    fn test_default_namespace_and_nil() {
        let xml = r#"<Root xmlns="http://schemas.microsoft.com/exchange/services/2006/messages"
            xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><Value xsi:nil="true"/></Root>"#;
        let mut reader = EwsXmlReader::new(xml);
        reader.read_start_element(XmlNamespace::Messages, "Root").unwrap();
        reader.read_start_element(XmlNamespace::Messages, "Value").unwrap();
        assert!(reader.is_nil());
        assert_eq!(reader.read_value().unwrap(), "");
        assert!(reader.is_end_element(XmlNamespace::Messages, "Value"));
    }

    #[test]
    fn test_unexpected_child_in_value() {
        let mut reader = EwsXmlReader::new("<a><b>1</b></a>");
        reader.read_start_element(XmlNamespace::NotSpecified, "a").unwrap();
        let err = reader.read_value().unwrap_err();
        assert!(matches!(err, Error::Deserialization(_)));
    }

    #[test]
    fn test_character_references_in_attributes() {
        let mut reader = EwsXmlReader::new(r#"<a Name="x&#38;y&#x41;&quot;">t&#38;</a>"#);
        reader.read_start_element(XmlNamespace::NotSpecified, "a").unwrap();
        assert_eq!(reader.attribute("Name"), Some("x&yA\""));
        assert_eq!(reader.read_value().unwrap(), "t&");
    }

    #[test]
    fn test_truncated_document() {
        let mut reader = EwsXmlReader::new("<a><b>");
        reader.read_start_element(XmlNamespace::NotSpecified, "a").unwrap();
        assert!(reader.skip_current_element().is_err());
    }
}
