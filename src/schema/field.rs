//! References to properties on the wire.
//!
//! Requests address properties with `t:FieldURI`, `t:IndexedFieldURI` or
//! `t:ExtendedFieldURI`; responses use the same elements to blame a
//! property in error payloads.

use crate::common::error::{Error, Result};
use crate::common::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace, XmlNodeType};
use crate::schema::definition::PropertyDefinition;
use crate::schema::extended::ExtendedPropertyDefinition;
use crate::schema::registry::SchemaRegistry;
use std::fmt;

/// Path to a property, written inside update instructions and shapes.
#[derive(Debug, Clone, Copy)]
pub enum FieldPath<'a> {
    Uri(&'a str),
    /// One entry of a dictionary property
    Indexed { uri: &'a str, index: &'a str },
    Extended(&'a ExtendedPropertyDefinition),
}

impl FieldPath<'_> {
    pub fn write_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        match self {
            FieldPath::Uri(uri) => {
                writer.write_start_element(XmlNamespace::Types, "FieldURI");
                writer.write_attribute("FieldURI", uri)?;
                writer.write_end_element()
            },
            FieldPath::Indexed { uri, index } => {
                writer.write_start_element(XmlNamespace::Types, "IndexedFieldURI");
                writer.write_attribute("FieldURI", uri)?;
                writer.write_attribute("FieldIndex", index)?;
                writer.write_end_element()
            },
            FieldPath::Extended(definition) => definition.write_to_xml(writer),
        }
    }
}

/// A property reference read from a response.
#[derive(Debug, Clone)]
pub enum FieldReference {
    /// `FieldURI` or `IndexedFieldURI`
    Property {
        uri: String,
        index: Option<String>,
        /// Schema definition, when the URI is known
        definition: Option<&'static PropertyDefinition>,
    },
    Extended(ExtendedPropertyDefinition),
}

impl FieldReference {
    /// Read the path element under the cursor.
    ///
    /// Returns `None`, after skipping it, for elements that are not paths.
    pub fn read_from_xml(
        reader: &mut EwsXmlReader<'_>,
        registry: &SchemaRegistry,
    ) -> Result<Option<Self>> {
        if reader.node_type() != XmlNodeType::StartElement {
            return Err(Error::Deserialization(format!(
                "Expected a field path element at position {}",
                reader.position()
            )));
        }

        let reference = match (reader.namespace(), reader.local_name()) {
            (XmlNamespace::Types, "FieldURI") | (XmlNamespace::Types, "IndexedFieldURI") => {
                let uri = reader
                    .attribute("FieldURI")
                    .ok_or_else(|| {
                        Error::Deserialization("Field path without FieldURI attribute".to_string())
                    })?
                    .to_string();
                let index = reader.attribute("FieldIndex").map(str::to_string);
                Some(FieldReference::Property {
                    definition: registry.find_property_definition(&uri),
                    uri,
                    index,
                })
            },
            (XmlNamespace::Types, "ExtendedFieldURI") => Some(FieldReference::Extended(
                ExtendedPropertyDefinition::read_attributes(reader)?,
            )),
            _ => None,
        };

        reader.skip_current_element()?;
        Ok(reference)
    }

    /// Schema definition of a `FieldURI` reference.
    pub fn definition(&self) -> Option<&'static PropertyDefinition> {
        match self {
            FieldReference::Property { definition, .. } => *definition,
            FieldReference::Extended(_) => None,
        }
    }

    pub fn extended_definition(&self) -> Option<&ExtendedPropertyDefinition> {
        match self {
            FieldReference::Extended(definition) => Some(definition),
            FieldReference::Property { .. } => None,
        }
    }
}

impl fmt::Display for FieldReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldReference::Property {
                uri,
                index: Some(index),
                ..
            } => write!(f, "{}[{}]", uri, index),
            FieldReference::Property { uri, .. } => f.write_str(uri),
            FieldReference::Extended(definition) => write!(f, "{}", definition),
        }
    }
}
