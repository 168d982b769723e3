//! Streaming writer for EWS request XML.
//!
//! Output is built into a `String` with escaped text and attributes. A start
//! tag stays open until content or an end tag follows, so an element with no
//! content is emitted in its empty form (`<t:Foo Id="1"/>`).

use crate::common::error::{Error, Result};
use crate::common::version::ExchangeVersion;
use crate::common::xml::escape::escape_xml;
use crate::common::xml::namespace::XmlNamespace;

/// Writer that tracks open elements and the negotiated server version.
#[derive(Debug)]
pub struct EwsXmlWriter {
    buffer: String,
    open: Vec<String>,
    start_tag_open: bool,
    version: ExchangeVersion,
}

impl EwsXmlWriter {
    /// Create an empty writer for a given negotiated version.
    pub fn new(version: ExchangeVersion) -> Self {
        Self {
            buffer: String::with_capacity(1024),
            open: Vec::new(),
            start_tag_open: false,
            version,
        }
    }

    /// Negotiated version, used by serializers for fail-fast checks.
    #[inline]
    pub fn version(&self) -> ExchangeVersion {
        self.version
    }

    /// Number of currently open elements.
    #[inline]
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Write the XML declaration. Only valid before any element.
    pub fn write_declaration(&mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            return Err(Error::XmlError(
                "XML declaration must come first".to_string(),
            ));
        }
        self.buffer
            .push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>");
        Ok(())
    }

    /// Open a new element `prefix:name`.
    pub fn write_start_element(&mut self, namespace: XmlNamespace, name: &str) {
        self.close_start_tag();
        let qname = match namespace {
            XmlNamespace::NotSpecified => name.to_string(),
            ns => format!("{}:{}", ns.prefix(), name),
        };
        self.buffer.push('<');
        self.buffer.push_str(&qname);
        self.open.push(qname);
        self.start_tag_open = true;
    }

    /// Add an attribute to the start tag that is still open.
    pub fn write_attribute(&mut self, name: &str, value: &str) -> Result<()> {
        if !self.start_tag_open {
            return Err(Error::XmlError(format!(
                "Attribute '{}' written after element content",
                name
            )));
        }
        self.buffer.push(' ');
        self.buffer.push_str(name);
        self.buffer.push_str("=\"");
        self.buffer.push_str(&escape_xml(value));
        self.buffer.push('"');
        Ok(())
    }

    /// Declare `xmlns:prefix` for a namespace on the open start tag.
    pub fn write_namespace_declaration(&mut self, namespace: XmlNamespace) -> Result<()> {
        let name = format!("xmlns:{}", namespace.prefix());
        self.write_attribute(&name, namespace.uri())
    }

    /// Write escaped text content into the current element.
    pub fn write_value(&mut self, text: &str) {
        self.close_start_tag();
        self.buffer.push_str(&escape_xml(text));
    }

    /// Close the innermost open element.
    pub fn write_end_element(&mut self) -> Result<()> {
        let qname = self
            .open
            .pop()
            .ok_or_else(|| Error::XmlError("No open element to close".to_string()))?;
        if self.start_tag_open {
            self.buffer.push_str("/>");
            self.start_tag_open = false;
        } else {
            self.buffer.push_str("</");
            self.buffer.push_str(&qname);
            self.buffer.push('>');
        }
        Ok(())
    }

    /// Write `<prefix:name>value</prefix:name>`.
    pub fn write_element_value(
        &mut self,
        namespace: XmlNamespace,
        name: &str,
        value: &str,
    ) -> Result<()> {
        self.write_start_element(namespace, name);
        if !value.is_empty() {
            self.write_value(value);
        }
        self.write_end_element()
    }

    /// Finish writing and return the document.
    pub fn into_string(self) -> Result<String> {
        if let Some(name) = self.open.last() {
            return Err(Error::XmlError(format!("Element <{}> was never closed", name)));
        }
        Ok(self.buffer)
    }

    /// Text written so far, including any open start tag.
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    fn close_start_tag(&mut self) {
        if self.start_tag_open {
            self.buffer.push('>');
            self.start_tag_open = false;
        }
    }
}
