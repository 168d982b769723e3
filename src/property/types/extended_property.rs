//! MAPI extended properties.
//!
//! Unlike other collection properties, extended properties appear as
//! repeated `<t:ExtendedProperty>` siblings directly inside the object,
//! with no wrapping element. The bag hands each sibling to the same
//! [`ExtendedPropertyCollection`], which merges it by definition.

use crate::common::error::{Error, Result};
use crate::common::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace};
use crate::property::change::{OwnerHandle, notify};
use crate::property::complex::ComplexProperty;
use crate::property::update::UpdateSink;
use crate::property::value::ScalarValue;
use crate::schema::{ExtendedPropertyDefinition, FieldPath, PropertyDefinition};

const ELEMENT: &str = "ExtendedProperty";

/// One extended property and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedProperty {
    definition: ExtendedPropertyDefinition,
    value: ScalarValue,
}

impl ExtendedProperty {
    /// Pair a definition with a value of its MAPI type.
    pub fn new(definition: ExtendedPropertyDefinition, value: ScalarValue) -> Result<Self> {
        let kind = definition.mapi_type().scalar_kind();
        if !kind.accepts(&value) {
            return Err(Error::Validation(format!(
                "Value {:?} is not a {} for extended property {}",
                value,
                definition.mapi_type().as_str(),
                definition
            )));
        }
        Ok(Self { definition, value })
    }

    pub fn definition(&self) -> &ExtendedPropertyDefinition {
        &self.definition
    }

    pub fn value(&self) -> &ScalarValue {
        &self.value
    }

    /// Read the `t:ExtendedProperty` element under the cursor, leaving the
    /// cursor on its end tag.
    pub fn read_from_xml(reader: &mut EwsXmlReader<'_>) -> Result<Self> {
        reader.ensure_current_node_is_start_element(XmlNamespace::Types, ELEMENT)?;
        reader.read_start_element(XmlNamespace::Types, "ExtendedFieldURI")?;
        let definition = ExtendedPropertyDefinition::read_attributes(reader)?;
        reader.skip_current_element()?;

        reader.read_start_element(XmlNamespace::Types, "Value")?;
        let text = reader.read_value()?;
        let value = definition
            .mapi_type()
            .scalar_kind()
            .parse(&text)
            .map_err(|err| match err {
                Error::Deserialization(msg) => {
                    Error::Deserialization(format!("{} in extended property {}", msg, definition))
                },
                other => other,
            })?;

        reader.read_end_element(XmlNamespace::Types, ELEMENT)?;
        Ok(Self { definition, value })
    }

    pub fn write_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        let text = self.definition.mapi_type().scalar_kind().format(&self.value)?;
        writer.write_start_element(XmlNamespace::Types, ELEMENT);
        self.definition.write_to_xml(writer)?;
        writer.write_element_value(XmlNamespace::Types, "Value", &text)?;
        writer.write_end_element()
    }
}

/// All extended properties of one object, unique by definition.
#[derive(Debug, Clone, Default)]
pub struct ExtendedPropertyCollection {
    items: Vec<ExtendedProperty>,
    baseline: Vec<ExtendedProperty>,
    owner: Option<OwnerHandle>,
}

impl ExtendedPropertyCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, definition: &ExtendedPropertyDefinition) -> Option<&ScalarValue> {
        self.find(definition).map(|index| &self.items[index].value)
    }

    /// Set the value of `definition`, adding it when missing.
    pub fn set(&mut self, definition: ExtendedPropertyDefinition, value: ScalarValue) -> Result<()> {
        let property = ExtendedProperty::new(definition, value)?;
        match self.find(&property.definition) {
            Some(index) if self.items[index] == property => return Ok(()),
            Some(index) => self.items[index] = property,
            None => self.items.push(property),
        }
        notify(&self.owner);
        Ok(())
    }

    pub fn remove(&mut self, definition: &ExtendedPropertyDefinition) -> bool {
        match self.find(definition) {
            Some(index) => {
                self.items.remove(index);
                notify(&self.owner);
                true
            },
            None => false,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExtendedProperty> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn find(&self, definition: &ExtendedPropertyDefinition) -> Option<usize> {
        self.items
            .iter()
            .position(|item| &item.definition == definition)
    }

    fn upsert(&mut self, property: ExtendedProperty) {
        match self.find(&property.definition) {
            Some(index) => self.items[index] = property,
            None => self.items.push(property),
        }
    }
}

impl ComplexProperty for ExtendedPropertyCollection {
    /// Loads a single `t:ExtendedProperty` sibling into the collection.
    fn load_from_xml(
        &mut self,
        reader: &mut EwsXmlReader<'_>,
        _namespace: XmlNamespace,
        _element: &str,
    ) -> Result<()> {
        let property = ExtendedProperty::read_from_xml(reader)?;
        self.upsert(property);
        Ok(())
    }

    /// Writes every property as a sibling, without a wrapper.
    fn write_to_xml(
        &self,
        writer: &mut EwsXmlWriter,
        _namespace: XmlNamespace,
        _element: &str,
    ) -> Result<()> {
        for item in &self.items {
            item.write_to_xml(writer)?;
        }
        Ok(())
    }

    fn set_owner(&mut self, owner: Option<OwnerHandle>) {
        self.owner = owner;
    }

    fn clear_change_log(&mut self) {
        self.baseline = self.items.clone();
    }

    fn adopt_baseline(&mut self, previous: Option<&dyn ComplexProperty>) -> bool {
        if let Some(previous) = previous.and_then(|p| p.as_any().downcast_ref::<Self>()) {
            self.baseline = previous.baseline.clone();
        }
        true
    }

    fn write_custom_update(
        &self,
        _definition: &PropertyDefinition,
        sink: &mut UpdateSink<'_>,
    ) -> Result<bool> {
        for item in &self.items {
            let unchanged = self
                .baseline
                .iter()
                .any(|old| old == item);
            if !unchanged {
                sink.write_set(FieldPath::Extended(&item.definition), |writer| {
                    item.write_to_xml(writer)
                })?;
            }
        }
        for old in &self.baseline {
            if self.find(&old.definition).is_none() {
                sink.write_delete(FieldPath::Extended(&old.definition))?;
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::version::ExchangeVersion;
    use crate::schema::tables::item;
    use crate::schema::{DefaultExtendedPropertySet, MapiPropertyType, PropertySetId, SchemaTarget};

    const XML: &str = r#"<t:Message xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types"><t:ExtendedProperty><t:ExtendedFieldURI PropertyTag="0x0e07" PropertyType="Integer"/><t:Value>9</t:Value></t:ExtendedProperty><t:ExtendedProperty><t:ExtendedFieldURI DistinguishedPropertySetId="PublicStrings" PropertyName="Project" PropertyType="String"/><t:Value>Apollo</t:Value></t:ExtendedProperty></t:Message>"#;

    fn flags_tag() -> ExtendedPropertyDefinition {
        ExtendedPropertyDefinition::with_tag(0x0e07, MapiPropertyType::Integer)
    }

    fn project() -> ExtendedPropertyDefinition {
        ExtendedPropertyDefinition::with_name(
            PropertySetId::Distinguished(DefaultExtendedPropertySet::PublicStrings),
            "Project",
            MapiPropertyType::String,
        )
        .unwrap()
    }

    fn loaded() -> ExtendedPropertyCollection {
        let mut reader = EwsXmlReader::new(XML);
        reader.read_start_element(XmlNamespace::Types, "Message").unwrap();
        let mut collection = ExtendedPropertyCollection::default();
        for _ in 0..2 {
            reader.read_significant().unwrap();
            collection
                .load_from_xml(&mut reader, XmlNamespace::Types, ELEMENT)
                .unwrap();
            assert!(reader.is_end_element(XmlNamespace::Types, ELEMENT));
        }
        collection.clear_change_log();
        collection
    }

    #[test]
    fn test_siblings_merge_into_one_collection() {
        let collection = loaded();
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.get(&flags_tag()), Some(&ScalarValue::Int(9)));
        assert_eq!(
            collection.get(&project()),
            Some(&ScalarValue::String("Apollo".to_string()))
        );
    }

    #[test]
    fn test_type_checked_set() {
        let mut collection = ExtendedPropertyCollection::new();
        assert!(
            collection
                .set(flags_tag(), ScalarValue::String("nine".to_string()))
                .is_err()
        );
        assert!(collection.is_empty());
    }

    #[test]
    fn test_per_definition_updates() {
        let mut collection = loaded();
        collection.set(flags_tag(), ScalarValue::Int(9)).unwrap();
        collection
            .set(project(), ScalarValue::String("Gemini".to_string()))
            .unwrap();
        collection.remove(&flags_tag());

        let mut writer = EwsXmlWriter::new(ExchangeVersion::Exchange2010);
        let mut sink = UpdateSink::new(&mut writer, SchemaTarget::Item, "Message");
        assert!(
            collection
                .write_custom_update(&item::EXTENDED_PROPERTY, &mut sink)
                .unwrap()
        );
        assert_eq!(sink.written(), 2);
        assert_eq!(
            writer.into_string().unwrap(),
            concat!(
                r#"<t:SetItemField><t:ExtendedFieldURI DistinguishedPropertySetId="PublicStrings" PropertyName="Project" PropertyType="String"/>"#,
                r#"<t:Message><t:ExtendedProperty><t:ExtendedFieldURI DistinguishedPropertySetId="PublicStrings" PropertyName="Project" PropertyType="String"/>"#,
                r#"<t:Value>Gemini</t:Value></t:ExtendedProperty></t:Message></t:SetItemField>"#,
                r#"<t:DeleteItemField><t:ExtendedFieldURI PropertyTag="0x0e07" PropertyType="Integer"/></t:DeleteItemField>"#
            )
        );
    }
}
