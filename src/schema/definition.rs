//! Property definitions.
//!
//! A [`PropertyDefinition`] describes one schema field: its XML element
//! name, its field URI, the first server version that knows it, its
//! behaviour flags and the kind of value it holds. Definitions are declared
//! as `static` items in the schema tables and compared by address.
//!
//! ```
//! use ews_binding::common::ExchangeVersion;
//! use ews_binding::schema::{PropertyDefinition, PropertyDefinitionFlags, ScalarKind};
//!
//! static IS_READ: PropertyDefinition = PropertyDefinition::scalar(
//!     "IsRead",
//!     "message:IsRead",
//!     ScalarKind::Boolean,
//!     PropertyDefinitionFlags::CAN_SET.union(PropertyDefinitionFlags::CAN_UPDATE),
//!     ExchangeVersion::Exchange2007Sp1,
//! );
//!
//! assert!(IS_READ.has_flag(PropertyDefinitionFlags::CAN_UPDATE, None));
//! assert!(IS_READ.is_supported(ExchangeVersion::Exchange2010));
//! ```

use crate::common::error::{Error, Result};
use crate::common::version::ExchangeVersion;
use crate::common::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace};
use crate::property::complex::ComplexProperty;
use crate::property::value::PropertyValue;
use crate::schema::codec::ScalarKind;
use crate::schema::flags::{FlagGate, PropertyDefinitionFlags};
use std::fmt;

/// Constructs an empty complex value.
pub type ComplexFactory = fn() -> Box<dyn ComplexProperty>;

/// Factory for any default-constructible complex type.
pub fn default_instance<T: ComplexProperty + Default + 'static>() -> Box<dyn ComplexProperty> {
    Box::new(T::default())
}

/// Kind of value a definition holds.
#[derive(Debug, Clone, Copy)]
pub enum PropertyKind {
    /// Leaf text value
    Scalar(ScalarKind),
    /// Structured value, optionally wrapped in an inner element
    /// (`<t:From><t:Mailbox>...</t:Mailbox></t:From>`)
    Complex {
        factory: ComplexFactory,
        contained: Option<&'static str>,
    },
    /// Ordered collection of structured items
    Collection(ComplexFactory),
    /// Entries keyed by an enumeration; `entry_uri` addresses one entry
    Dictionary {
        factory: ComplexFactory,
        entry_uri: &'static str,
    },
}

/// Descriptor of one schema field.
pub struct PropertyDefinition {
    xml_name: &'static str,
    uri: Option<&'static str>,
    flags: PropertyDefinitionFlags,
    version: ExchangeVersion,
    gates: &'static [FlagGate],
    kind: PropertyKind,
    nullable: bool,
}

impl PropertyDefinition {
    const fn new(
        xml_name: &'static str,
        uri: &'static str,
        kind: PropertyKind,
        flags: PropertyDefinitionFlags,
        version: ExchangeVersion,
    ) -> Self {
        Self {
            xml_name,
            uri: Some(uri),
            flags,
            version,
            gates: &[],
            kind,
            nullable: false,
        }
    }

    pub const fn scalar(
        xml_name: &'static str,
        uri: &'static str,
        kind: ScalarKind,
        flags: PropertyDefinitionFlags,
        version: ExchangeVersion,
    ) -> Self {
        Self::new(xml_name, uri, PropertyKind::Scalar(kind), flags, version)
    }

    pub const fn complex(
        xml_name: &'static str,
        uri: &'static str,
        factory: ComplexFactory,
        flags: PropertyDefinitionFlags,
        version: ExchangeVersion,
    ) -> Self {
        Self::new(
            xml_name,
            uri,
            PropertyKind::Complex {
                factory,
                contained: None,
            },
            flags,
            version,
        )
    }

    pub const fn collection(
        xml_name: &'static str,
        uri: &'static str,
        factory: ComplexFactory,
        flags: PropertyDefinitionFlags,
        version: ExchangeVersion,
    ) -> Self {
        Self::new(xml_name, uri, PropertyKind::Collection(factory), flags, version)
    }

    pub const fn dictionary(
        xml_name: &'static str,
        uri: &'static str,
        entry_uri: &'static str,
        factory: ComplexFactory,
        flags: PropertyDefinitionFlags,
        version: ExchangeVersion,
    ) -> Self {
        Self::new(
            xml_name,
            uri,
            PropertyKind::Dictionary { factory, entry_uri },
            flags,
            version,
        )
    }

    /// Wrap a complex value in an inner element.
    pub const fn contained(self, element: &'static str) -> Self {
        let kind = match self.kind {
            PropertyKind::Complex { factory, .. } => PropertyKind::Complex {
                factory,
                contained: Some(element),
            },
            other => other,
        };
        Self { kind, ..self }
    }

    /// Allow empty or `xsi:nil` elements to read as null.
    pub const fn nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }

    pub const fn with_gates(self, gates: &'static [FlagGate]) -> Self {
        Self { gates, ..self }
    }

    /// For properties that are only ever addressed through their items.
    pub const fn without_field_uri(self) -> Self {
        Self { uri: None, ..self }
    }

    #[inline]
    pub fn xml_name(&self) -> &'static str {
        self.xml_name
    }

    #[inline]
    pub fn uri(&self) -> Option<&'static str> {
        self.uri
    }

    /// Field URI, or the XML name for properties without one.
    pub fn name(&self) -> &'static str {
        self.uri.unwrap_or(self.xml_name)
    }

    #[inline]
    pub fn flags(&self) -> PropertyDefinitionFlags {
        self.flags
    }

    /// First server version that supports this property.
    #[inline]
    pub fn version(&self) -> ExchangeVersion {
        self.version
    }

    #[inline]
    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_complex(&self) -> bool {
        !matches!(self.kind, PropertyKind::Scalar(_))
    }

    /// Whether `flag` applies.
    ///
    /// With a version, flags listed in the gate table only apply from the
    /// gate version on. Without one, the gate table is ignored.
    pub fn has_flag(&self, flag: PropertyDefinitionFlags, version: Option<ExchangeVersion>) -> bool {
        if !self.flags.contains(flag) {
            return false;
        }
        match version {
            None => true,
            Some(version) => self
                .gates
                .iter()
                .filter(|gate| gate.flags.intersects(flag))
                .all(|gate| version >= gate.since),
        }
    }

    #[inline]
    pub fn is_supported(&self, version: ExchangeVersion) -> bool {
        version.supports(self.version)
    }

    /// Fail with `VersionMismatch` when `version` predates this property.
    pub fn ensure_supported(&self, version: ExchangeVersion) -> Result<()> {
        if self.is_supported(version) {
            Ok(())
        } else {
            Err(Error::version_mismatch(self.name(), self.version, version))
        }
    }

    /// Field URI, or a validation error for properties without one.
    pub fn require_uri(&self) -> Result<&'static str> {
        self.uri.ok_or_else(|| {
            Error::Validation(format!(
                "Property '{}' has no field URI and cannot be referenced directly",
                self.xml_name
            ))
        })
    }

    /// A fresh, empty value for complex kinds.
    pub fn create_instance(&self) -> Option<Box<dyn ComplexProperty>> {
        match self.kind {
            PropertyKind::Scalar(_) => None,
            PropertyKind::Complex { factory, .. }
            | PropertyKind::Collection(factory)
            | PropertyKind::Dictionary { factory, .. } => Some(factory()),
        }
    }

    /// Whether `value` may be stored under this definition.
    pub fn accepts(&self, value: &PropertyValue) -> bool {
        match (self.kind, value) {
            (_, PropertyValue::Null) => true,
            (PropertyKind::Scalar(kind), PropertyValue::Scalar(scalar)) => kind.accepts(scalar),
            (PropertyKind::Scalar(_), PropertyValue::Complex(_))
            | (_, PropertyValue::Scalar(_)) => false,
            (_, PropertyValue::Complex(complex)) => self
                .create_instance()
                .is_some_and(|fresh| fresh.as_any().type_id() == complex.as_any().type_id()),
        }
    }

    /// Read this property from the element under the cursor.
    ///
    /// Leaves the cursor on the element's end tag.
    pub fn read_value(&self, reader: &mut EwsXmlReader<'_>) -> Result<PropertyValue> {
        reader.ensure_current_node_is_start_element(XmlNamespace::Types, self.xml_name)?;
        match self.kind {
            PropertyKind::Scalar(kind) => {
                let is_nil = reader.is_nil();
                let text = reader.read_value()?;
                if is_nil || (self.nullable && text.is_empty()) {
                    return Ok(PropertyValue::Null);
                }
                kind.parse(&text)
                    .map(PropertyValue::Scalar)
                    .map_err(|err| match err {
                        Error::Deserialization(msg) => {
                            Error::Deserialization(format!("{} in <{}>", msg, self.xml_name))
                        },
                        other => other,
                    })
            },
            _ => {
                let mut instance = self.create_instance().ok_or_else(|| {
                    Error::Other(format!("No factory for property '{}'", self.xml_name))
                })?;
                self.load_into(reader, instance.as_mut())?;
                Ok(PropertyValue::Complex(instance))
            },
        }
    }

    /// Load the element under the cursor into an existing complex value.
    pub fn load_into(
        &self,
        reader: &mut EwsXmlReader<'_>,
        value: &mut dyn ComplexProperty,
    ) -> Result<()> {
        match self.kind {
            PropertyKind::Complex {
                contained: Some(inner),
                ..
            } => {
                reader.ensure_current_node_is_start_element(XmlNamespace::Types, self.xml_name)?;
                if reader.is_empty_element() {
                    reader.read()?;
                    return Ok(());
                }
                reader.read_start_element(XmlNamespace::Types, inner)?;
                value.load_from_xml(reader, XmlNamespace::Types, inner)?;
                reader.read_end_element(XmlNamespace::Types, self.xml_name)
            },
            _ => value.load_from_xml(reader, XmlNamespace::Types, self.xml_name),
        }
    }

    /// Write a non-null value as this property's element.
    pub fn write_value(&self, writer: &mut EwsXmlWriter, value: &PropertyValue) -> Result<()> {
        match (self.kind, value) {
            (PropertyKind::Scalar(kind), PropertyValue::Scalar(scalar)) => {
                let text = kind.format(scalar)?;
                writer.write_element_value(XmlNamespace::Types, self.xml_name, &text)
            },
            (
                PropertyKind::Complex {
                    contained: Some(inner),
                    ..
                },
                PropertyValue::Complex(complex),
            ) => {
                writer.write_start_element(XmlNamespace::Types, self.xml_name);
                complex.write_to_xml(writer, XmlNamespace::Types, inner)?;
                writer.write_end_element()
            },
            (PropertyKind::Scalar(_), _) | (_, PropertyValue::Scalar(_)) | (_, PropertyValue::Null) => {
                Err(Error::Validation(format!(
                    "Cannot write {:?} as property '{}'",
                    value,
                    self.name()
                )))
            },
            (_, PropertyValue::Complex(complex)) => {
                complex.write_to_xml(writer, XmlNamespace::Types, self.xml_name)
            },
        }
    }
}

impl PartialEq for PropertyDefinition {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for PropertyDefinition {}

impl fmt::Debug for PropertyDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDefinition")
            .field("xml_name", &self.xml_name)
            .field("uri", &self.uri)
            .field("version", &self.version)
            .field("flags", &self.flags)
            .finish()
    }
}

impl fmt::Display for PropertyDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::value::ScalarValue;

    static COUNT: PropertyDefinition = PropertyDefinition::scalar(
        "Count",
        "test:Count",
        ScalarKind::Integer,
        PropertyDefinitionFlags::EDITABLE,
        ExchangeVersion::Exchange2007Sp1,
    );

    static REMINDER: PropertyDefinition = PropertyDefinition::scalar(
        "Reminder",
        "test:Reminder",
        ScalarKind::Boolean,
        PropertyDefinitionFlags::EDITABLE,
        ExchangeVersion::Exchange2007Sp1,
    )
    .nullable()
    .with_gates(&[FlagGate::new(
        PropertyDefinitionFlags::CAN_DELETE,
        ExchangeVersion::Exchange2010Sp1,
    )]);

    static NEWER: PropertyDefinition = PropertyDefinition::scalar(
        "Newer",
        "test:Newer",
        ScalarKind::String,
        PropertyDefinitionFlags::EDITABLE,
        ExchangeVersion::Exchange2010,
    );

    #[test]
    fn test_version_gated_flags() {
        let flag = PropertyDefinitionFlags::CAN_DELETE;
        assert!(REMINDER.has_flag(flag, None));
        assert!(!REMINDER.has_flag(flag, Some(ExchangeVersion::Exchange2010)));
        assert!(REMINDER.has_flag(flag, Some(ExchangeVersion::Exchange2010Sp1)));
        assert!(REMINDER.has_flag(PropertyDefinitionFlags::CAN_SET, Some(ExchangeVersion::Exchange2007Sp1)));
        assert!(!COUNT.has_flag(PropertyDefinitionFlags::MUST_BE_EXPLICITLY_LOADED, None));
    }

    #[test]
    fn test_version_support() {
        assert!(NEWER.ensure_supported(ExchangeVersion::Exchange2013).is_ok());
        let err = NEWER
            .ensure_supported(ExchangeVersion::Exchange2007Sp1)
            .unwrap_err();
        assert!(err.is_version_mismatch());
    }

    #[test]
    fn test_leaf_read_leaves_cursor_on_end_tag() {
        let xml = r#"<t:Item xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types"><t:Count>7</t:Count><t:Newer>x</t:Newer></t:Item>"#;
        let mut reader = EwsXmlReader::new(xml);
        reader.read_start_element(XmlNamespace::Types, "Item").unwrap();
        reader.read_start_element(XmlNamespace::Types, "Count").unwrap();
        let value = COUNT.read_value(&mut reader).unwrap();
        assert_eq!(value.as_scalar(), Some(&ScalarValue::Int(7)));
        assert!(reader.is_end_element(XmlNamespace::Types, "Count"));
        reader.read_start_element(XmlNamespace::Types, "Newer").unwrap();
    }

    #[test]
    fn test_nullable_reads() {
        let xml = r#"<t:Item xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types"><t:Reminder/><t:Count></t:Count></t:Item>"#;
        let mut reader = EwsXmlReader::new(xml);
        reader.read_start_element(XmlNamespace::Types, "Item").unwrap();
        reader.read_start_element(XmlNamespace::Types, "Reminder").unwrap();
        assert!(REMINDER.read_value(&mut reader).unwrap().is_null());
        reader.read_start_element(XmlNamespace::Types, "Count").unwrap();
        assert!(matches!(
            COUNT.read_value(&mut reader),
            Err(Error::Deserialization(_))
        ));
    }

    #[test]
    fn test_write_scalar() {
        let mut writer = EwsXmlWriter::new(ExchangeVersion::Exchange2010);
        REMINDER
            .write_value(&mut writer, &PropertyValue::from(false))
            .unwrap();
        assert_eq!(writer.into_string().unwrap(), "<t:Reminder>false</t:Reminder>");

        let mut writer = EwsXmlWriter::new(ExchangeVersion::Exchange2010);
        assert!(COUNT.write_value(&mut writer, &PropertyValue::Null).is_err());
        assert!(!COUNT.accepts(&PropertyValue::from("seven")));
    }
}
