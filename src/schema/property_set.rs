//! Property sets: which properties a `GetItem` or `GetFolder` should return.

use crate::common::error::Result;
use crate::common::xml::{EwsXmlWriter, XmlNamespace};
use crate::property::types::BodyType;
use crate::schema::definition::PropertyDefinition;
use crate::schema::extended::ExtendedPropertyDefinition;
use crate::schema::field::FieldPath;
use crate::schema::flags::PropertyDefinitionFlags;
use crate::schema::registry::Schema;

/// Base shape of a property set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BasePropertySet {
    /// Only the object id
    IdOnly,
    /// The server's default set
    #[default]
    Default,
    /// Everything except explicitly loaded properties
    AllProperties,
}

impl BasePropertySet {
    pub const fn as_str(self) -> &'static str {
        match self {
            BasePropertySet::IdOnly => "IdOnly",
            BasePropertySet::Default => "Default",
            BasePropertySet::AllProperties => "AllProperties",
        }
    }
}

/// A property requested on top of the base shape.
#[derive(Debug, Clone)]
pub enum AdditionalProperty {
    Schema(&'static PropertyDefinition),
    Extended(ExtendedPropertyDefinition),
}

/// Requested properties of a get request.
#[derive(Debug, Clone, Default)]
pub struct PropertySet {
    base: BasePropertySet,
    body_type: Option<BodyType>,
    additional: Vec<AdditionalProperty>,
}

impl PropertySet {
    pub fn new(base: BasePropertySet) -> Self {
        Self {
            base,
            body_type: None,
            additional: Vec::new(),
        }
    }

    pub fn id_only() -> Self {
        Self::new(BasePropertySet::IdOnly)
    }

    pub fn first_class_properties() -> Self {
        Self::new(BasePropertySet::AllProperties)
    }

    pub fn with_property(mut self, definition: &'static PropertyDefinition) -> Self {
        self.add(definition);
        self
    }

    pub fn with_extended_property(mut self, definition: ExtendedPropertyDefinition) -> Self {
        self.additional.push(AdditionalProperty::Extended(definition));
        self
    }

    pub fn with_body_type(mut self, body_type: BodyType) -> Self {
        self.body_type = Some(body_type);
        self
    }

    pub fn add(&mut self, definition: &'static PropertyDefinition) {
        let present = self.additional.iter().any(|p| {
            matches!(p, AdditionalProperty::Schema(d) if std::ptr::eq(*d, definition))
        });
        if !present {
            self.additional.push(AdditionalProperty::Schema(definition));
        }
    }

    pub fn base(&self) -> BasePropertySet {
        self.base
    }

    pub fn body_type(&self) -> Option<BodyType> {
        self.body_type
    }

    pub fn additional(&self) -> &[AdditionalProperty] {
        &self.additional
    }

    fn requests_extended(&self) -> bool {
        self.additional
            .iter()
            .any(|p| matches!(p, AdditionalProperty::Extended(_)))
    }

    fn requests(&self, definition: &PropertyDefinition) -> bool {
        self.additional.iter().any(|p| {
            matches!(p, AdditionalProperty::Schema(d) if std::ptr::eq(*d, definition))
        })
    }

    /// Whether a response may populate `definition` for an object of `schema`.
    pub fn includes(&self, definition: &PropertyDefinition, schema: &Schema) -> bool {
        if schema
            .id_property()
            .is_some_and(|id| std::ptr::eq(id, definition))
        {
            return true;
        }
        if self.requests(definition) {
            return true;
        }
        if definition.xml_name() == "ExtendedProperty" && self.requests_extended() {
            return true;
        }
        if self.base == BasePropertySet::IdOnly {
            return false;
        }
        !definition.has_flag(PropertyDefinitionFlags::MUST_BE_EXPLICITLY_LOADED, None)
    }

    /// Write `<m:ItemShape>` or `<m:FolderShape>`.
    pub fn write_to_xml(&self, writer: &mut EwsXmlWriter, shape_element: &str) -> Result<()> {
        // Fail before anything is written
        for property in &self.additional {
            if let AdditionalProperty::Schema(definition) = property {
                definition.ensure_supported(writer.version())?;
                definition.require_uri()?;
            }
        }

        writer.write_start_element(XmlNamespace::Messages, shape_element);
        writer.write_element_value(XmlNamespace::Types, "BaseShape", self.base.as_str())?;
        if let Some(body_type) = self.body_type {
            writer.write_element_value(XmlNamespace::Types, "BodyType", body_type.as_str())?;
        }
        if !self.additional.is_empty() {
            writer.write_start_element(XmlNamespace::Types, "AdditionalProperties");
            for property in &self.additional {
                match property {
                    AdditionalProperty::Schema(definition) => {
                        FieldPath::Uri(definition.require_uri()?).write_to_xml(writer)?;
                    },
                    AdditionalProperty::Extended(definition) => definition.write_to_xml(writer)?,
                }
            }
            writer.write_end_element()?;
        }
        writer.write_end_element()
    }
}
