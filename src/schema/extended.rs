//! Extended (MAPI) property definitions.
//!
//! An extended property is addressed either by a MAPI property tag or by a
//! property set (distinguished or GUID) plus a name or numeric id.

use crate::common::error::{Error, Result};
use crate::common::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace};
use crate::schema::codec::ScalarKind;
use std::fmt;
use std::str::FromStr;

/// Well-known property sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultExtendedPropertySet {
    Meeting,
    Appointment,
    Common,
    PublicStrings,
    Address,
    InternetHeaders,
    CalendarAssistant,
    UnifiedMessaging,
    Task,
}

impl DefaultExtendedPropertySet {
    const ALL: [DefaultExtendedPropertySet; 9] = [
        DefaultExtendedPropertySet::Meeting,
        DefaultExtendedPropertySet::Appointment,
        DefaultExtendedPropertySet::Common,
        DefaultExtendedPropertySet::PublicStrings,
        DefaultExtendedPropertySet::Address,
        DefaultExtendedPropertySet::InternetHeaders,
        DefaultExtendedPropertySet::CalendarAssistant,
        DefaultExtendedPropertySet::UnifiedMessaging,
        DefaultExtendedPropertySet::Task,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            DefaultExtendedPropertySet::Meeting => "Meeting",
            DefaultExtendedPropertySet::Appointment => "Appointment",
            DefaultExtendedPropertySet::Common => "Common",
            DefaultExtendedPropertySet::PublicStrings => "PublicStrings",
            DefaultExtendedPropertySet::Address => "Address",
            DefaultExtendedPropertySet::InternetHeaders => "InternetHeaders",
            DefaultExtendedPropertySet::CalendarAssistant => "CalendarAssistant",
            DefaultExtendedPropertySet::UnifiedMessaging => "UnifiedMessaging",
            DefaultExtendedPropertySet::Task => "Task",
        }
    }
}

impl FromStr for DefaultExtendedPropertySet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|set| set.as_str() == s)
            .ok_or_else(|| Error::Deserialization(format!("Unknown property set: {}", s)))
    }
}

/// MAPI type of an extended property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapiPropertyType {
    Binary,
    Boolean,
    Double,
    Integer,
    Long,
    Short,
    String,
    SystemTime,
}

impl MapiPropertyType {
    const ALL: [MapiPropertyType; 8] = [
        MapiPropertyType::Binary,
        MapiPropertyType::Boolean,
        MapiPropertyType::Double,
        MapiPropertyType::Integer,
        MapiPropertyType::Long,
        MapiPropertyType::Short,
        MapiPropertyType::String,
        MapiPropertyType::SystemTime,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            MapiPropertyType::Binary => "Binary",
            MapiPropertyType::Boolean => "Boolean",
            MapiPropertyType::Double => "Double",
            MapiPropertyType::Integer => "Integer",
            MapiPropertyType::Long => "Long",
            MapiPropertyType::Short => "Short",
            MapiPropertyType::String => "String",
            MapiPropertyType::SystemTime => "SystemTime",
        }
    }

    /// Scalar codec used for values of this type.
    pub const fn scalar_kind(self) -> ScalarKind {
        match self {
            MapiPropertyType::Binary => ScalarKind::Base64,
            MapiPropertyType::Boolean => ScalarKind::Boolean,
            MapiPropertyType::Double => ScalarKind::Double,
            MapiPropertyType::Integer | MapiPropertyType::Short => ScalarKind::Integer,
            MapiPropertyType::Long => ScalarKind::Long,
            MapiPropertyType::String => ScalarKind::String,
            MapiPropertyType::SystemTime => ScalarKind::DateTime,
        }
    }
}

impl FromStr for MapiPropertyType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::Deserialization(format!("Unsupported MAPI property type: {}", s)))
    }
}

/// Property set an extended property belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertySetId {
    Distinguished(DefaultExtendedPropertySet),
    Guid(String),
}

/// How the property is named inside its set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Tag(u16),
    Named { set: PropertySetId, name: String },
    Id { set: PropertySetId, id: i32 },
}

/// Identity and type of an extended property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtendedPropertyDefinition {
    key: PropertyKey,
    mapi_type: MapiPropertyType,
}

impl ExtendedPropertyDefinition {
    pub fn with_tag(tag: u16, mapi_type: MapiPropertyType) -> Self {
        Self {
            key: PropertyKey::Tag(tag),
            mapi_type,
        }
    }

    pub fn with_name(
        set: PropertySetId,
        name: impl Into<String>,
        mapi_type: MapiPropertyType,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Validation(
                "Extended property name must not be empty".to_string(),
            ));
        }
        validate_set(&set)?;
        Ok(Self {
            key: PropertyKey::Named { set, name },
            mapi_type,
        })
    }

    pub fn with_id(set: PropertySetId, id: i32, mapi_type: MapiPropertyType) -> Result<Self> {
        validate_set(&set)?;
        Ok(Self {
            key: PropertyKey::Id { set, id },
            mapi_type,
        })
    }

    pub fn key(&self) -> &PropertyKey {
        &self.key
    }

    pub fn mapi_type(&self) -> MapiPropertyType {
        self.mapi_type
    }

    /// Read the attributes of an `ExtendedFieldURI` start tag.
    pub fn read_attributes(reader: &EwsXmlReader<'_>) -> Result<Self> {
        let mapi_type: MapiPropertyType = reader
            .attribute("PropertyType")
            .ok_or_else(|| Error::Deserialization("ExtendedFieldURI without PropertyType".to_string()))?
            .parse()?;

        let set = match (
            reader.attribute("DistinguishedPropertySetId"),
            reader.attribute("PropertySetId"),
        ) {
            (Some(name), None) => Some(PropertySetId::Distinguished(name.parse()?)),
            (None, Some(guid)) => Some(PropertySetId::Guid(guid.to_string())),
            (None, None) => None,
            (Some(_), Some(_)) => {
                return Err(Error::Deserialization(
                    "ExtendedFieldURI names two property sets".to_string(),
                ));
            },
        };

        let key = match (
            set,
            reader.attribute("PropertyTag"),
            reader.attribute("PropertyName"),
            reader.attribute("PropertyId"),
        ) {
            (None, Some(tag), None, None) => PropertyKey::Tag(parse_tag(tag)?),
            (Some(set), None, Some(name), None) => PropertyKey::Named {
                set,
                name: name.to_string(),
            },
            (Some(set), None, None, Some(id)) => PropertyKey::Id {
                set,
                id: atoi_simd::parse::<i32, false, false>(id.trim().as_bytes()).map_err(|_| {
                    Error::Deserialization(format!("Invalid PropertyId: {}", id))
                })?,
            },
            _ => {
                return Err(Error::Deserialization(
                    "ExtendedFieldURI needs a tag, or a property set with a name or id".to_string(),
                ));
            },
        };

        Ok(Self { key, mapi_type })
    }

    /// Write `<t:ExtendedFieldURI .../>`.
    pub fn write_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        writer.write_start_element(XmlNamespace::Types, "ExtendedFieldURI");
        match &self.key {
            PropertyKey::Tag(tag) => {
                writer.write_attribute("PropertyTag", &format!("0x{:04x}", tag))?;
            },
            PropertyKey::Named { set, name } => {
                write_set(writer, set)?;
                writer.write_attribute("PropertyName", name)?;
            },
            PropertyKey::Id { set, id } => {
                write_set(writer, set)?;
                writer.write_attribute("PropertyId", itoa::Buffer::new().format(*id))?;
            },
        }
        writer.write_attribute("PropertyType", self.mapi_type.as_str())?;
        writer.write_end_element()
    }
}

fn validate_set(set: &PropertySetId) -> Result<()> {
    match set {
        PropertySetId::Guid(guid) if guid.trim().is_empty() => Err(Error::Validation(
            "Property set GUID must not be empty".to_string(),
        )),
        _ => Ok(()),
    }
}

fn write_set(writer: &mut EwsXmlWriter, set: &PropertySetId) -> Result<()> {
    match set {
        PropertySetId::Distinguished(set) => {
            writer.write_attribute("DistinguishedPropertySetId", set.as_str())
        },
        PropertySetId::Guid(guid) => writer.write_attribute("PropertySetId", guid),
    }
}

fn parse_tag(text: &str) -> Result<u16> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => atoi_simd::parse::<u16, false, false>(text.as_bytes()).ok(),
    };
    parsed.ok_or_else(|| Error::Deserialization(format!("Invalid PropertyTag: {}", text)))
}

impl fmt::Display for ExtendedPropertyDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set_name = |set: &PropertySetId| match set {
            PropertySetId::Distinguished(set) => set.as_str().to_string(),
            PropertySetId::Guid(guid) => guid.clone(),
        };
        match &self.key {
            PropertyKey::Tag(tag) => write!(f, "0x{:04x} ({})", tag, self.mapi_type.as_str()),
            PropertyKey::Named { set, name } => {
                write!(f, "{}:{} ({})", set_name(set), name, self.mapi_type.as_str())
            },
            PropertyKey::Id { set, id } => {
                write!(f, "{}:{} ({})", set_name(set), id, self.mapi_type.as_str())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(xml: &str) -> Result<ExtendedPropertyDefinition> {
        let mut reader = EwsXmlReader::new(xml);
        reader.read()?;
        ExtendedPropertyDefinition::read_attributes(&reader)
    }

    #[test]
    fn test_tag_written_as_hex() {
        let definition = ExtendedPropertyDefinition::with_tag(0x0E07, MapiPropertyType::Integer);
        let mut writer = EwsXmlWriter::new(crate::common::ExchangeVersion::Exchange2010);
        definition.write_to_xml(&mut writer).unwrap();
        let xml = writer.into_string().unwrap();
        assert_eq!(
            xml,
            "<t:ExtendedFieldURI PropertyTag=\"0x0e07\" PropertyType=\"Integer\"/>"
        );
        assert_eq!(
            read(r#"<ExtendedFieldURI PropertyTag="0x0e07" PropertyType="Integer"/>"#).unwrap(),
            definition
        );
        assert_eq!(
            read(r#"<ExtendedFieldURI PropertyTag="3591" PropertyType="Integer"/>"#).unwrap(),
            definition
        );
    }

    #[test]
    fn test_named_property() {
        let definition = read(
            r#"<ExtendedFieldURI DistinguishedPropertySetId="PublicStrings" PropertyName="Project" PropertyType="String"/>"#,
        )
        .unwrap();
        assert_eq!(
            definition,
            ExtendedPropertyDefinition::with_name(
                PropertySetId::Distinguished(DefaultExtendedPropertySet::PublicStrings),
                "Project",
                MapiPropertyType::String,
            )
            .unwrap()
        );
        assert_eq!(definition.to_string(), "PublicStrings:Project (String)");
    }

    #[test]
    fn test_invalid_definitions() {
        assert!(read(r#"<ExtendedFieldURI PropertyName="x" PropertyType="String"/>"#).is_err());
        assert!(read(r#"<ExtendedFieldURI PropertyTag="0x1000"/>"#).is_err());
        assert!(read(r#"<ExtendedFieldURI PropertyTag="zz" PropertyType="String"/>"#).is_err());
        assert!(
            ExtendedPropertyDefinition::with_name(
                PropertySetId::Guid(String::new()),
                "x",
                MapiPropertyType::String
            )
            .is_err()
        );
    }
}
