//! Item bodies (`Body`, `UniqueBody`).

use crate::common::error::{Error, Result};
use crate::common::xml::{EwsXmlReader, EwsXmlWriter};
use crate::property::change::{OwnerHandle, notify};
use crate::property::complex::ComplexProperty;
use std::str::FromStr;

/// Body format, as requested in shapes and carried on bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BodyType {
    /// Whatever the server stores; only meaningful in a shape
    Best,
    #[default]
    HTML,
    Text,
}

impl BodyType {
    pub const fn as_str(self) -> &'static str {
        match self {
            BodyType::Best => "Best",
            BodyType::HTML => "HTML",
            BodyType::Text => "Text",
        }
    }
}

impl FromStr for BodyType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Best" => Ok(BodyType::Best),
            "HTML" => Ok(BodyType::HTML),
            "Text" => Ok(BodyType::Text),
            other => Err(Error::Deserialization(format!("Unknown BodyType: {}", other))),
        }
    }
}

/// Body text with its format.
#[derive(Debug, Clone, Default)]
pub struct MessageBody {
    body_type: BodyType,
    text: String,
    is_truncated: bool,
    owner: Option<OwnerHandle>,
}

impl MessageBody {
    pub fn new(body_type: BodyType, text: impl Into<String>) -> Self {
        Self {
            body_type,
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(BodyType::Text, text)
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self::new(BodyType::HTML, text)
    }

    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    pub fn content(&self) -> &str {
        &self.text
    }

    /// Set by the server when the body was cut to a size limit.
    pub fn is_truncated(&self) -> bool {
        self.is_truncated
    }

    pub fn set_content(&mut self, text: impl Into<String>) {
        self.text = text.into();
        notify(&self.owner);
    }

    pub fn set_body_type(&mut self, body_type: BodyType) {
        self.body_type = body_type;
        notify(&self.owner);
    }
}

impl ComplexProperty for MessageBody {
    fn read_attributes(&mut self, reader: &EwsXmlReader<'_>) -> Result<()> {
        if let Some(body_type) = reader.attribute("BodyType") {
            self.body_type = body_type.parse()?;
        }
        self.is_truncated = reader
            .attribute("IsTruncated")
            .is_some_and(|value| value == "true" || value == "1");
        self.text.clear();
        Ok(())
    }

    fn read_text_value(&mut self, text: &str) -> Result<()> {
        self.text.push_str(text);
        Ok(())
    }

    fn write_attributes(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        writer.write_attribute("BodyType", self.body_type.as_str())
    }

    fn write_elements(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        if !self.text.is_empty() {
            writer.write_value(&self.text);
        }
        Ok(())
    }

    fn set_owner(&mut self, owner: Option<OwnerHandle>) {
        self.owner = owner;
    }
}
