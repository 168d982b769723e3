//! Property bag: the values of one service object.
//!
//! A bag stores values sparsely by definition and keeps a change log so
//! that updates only send what changed. Writing always follows schema
//! order, never insertion order.

use crate::common::error::{Error, Result};
use crate::common::version::ExchangeVersion;
use crate::common::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace, XmlNodeType};
use crate::property::change::{ChangeKind, ChangeLog, OwnerHandle, SharedChangeLog};
use crate::property::complex::ComplexProperty;
use crate::property::update::UpdateSink;
use crate::property::value::{PropertyLookup, PropertyValue};
use crate::schema::{
    FieldPath, PropertyDefinition, PropertyDefinitionFlags as Flags, PropertySet, Schema,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::trace;

#[derive(Debug)]
pub struct PropertyBag {
    schema: Arc<Schema>,
    version: ExchangeVersion,
    values: HashMap<&'static str, PropertyValue>,
    is_new: bool,
    changes: SharedChangeLog,
    /// Loaded complex values replaced by assignment since the last reset.
    displaced: HashMap<&'static str, Option<Box<dyn ComplexProperty>>>,
    /// Replaced values that must be written whole.
    rewritten: HashSet<&'static str>,
}

impl PropertyBag {
    /// Empty bag for a new, unsaved object.
    pub fn new(schema: Arc<Schema>, version: ExchangeVersion) -> Self {
        Self {
            schema,
            version,
            values: HashMap::new(),
            is_new: true,
            changes: Arc::new(Mutex::new(ChangeLog::default())),
            displaced: HashMap::new(),
            rewritten: HashSet::new(),
        }
    }

    #[inline]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    #[inline]
    pub fn version(&self) -> ExchangeVersion {
        self.version
    }

    /// True until the object has been loaded from, or saved to, the server.
    #[inline]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn mark_existing(&mut self) {
        self.is_new = false;
    }

    /// Whether a value, possibly null, is present.
    pub fn contains(&self, definition: &PropertyDefinition) -> bool {
        self.values.contains_key(definition.xml_name())
    }

    /// Current value of `definition`.
    ///
    /// Definitions flagged `AUTO_INSTANTIATE_ON_READ` get an empty value on
    /// first access; anything else that was never loaded or set reads as
    /// [`PropertyLookup::Unset`].
    pub fn get_object(&mut self, definition: &'static PropertyDefinition) -> Result<PropertyLookup<'_>> {
        self.ensure_member(definition)?;
        definition.ensure_supported(self.version)?;

        if !self.values.contains_key(definition.xml_name())
            && definition.has_flag(Flags::AUTO_INSTANTIATE_ON_READ, Some(self.version))
            && let Some(instance) = definition.create_instance()
        {
            let value = self.attach(definition, PropertyValue::Complex(instance));
            self.values.insert(definition.xml_name(), value);
        }

        Ok(self.peek(definition))
    }

    /// Current value without instantiating anything.
    pub fn peek(&self, definition: &PropertyDefinition) -> PropertyLookup<'_> {
        match self.values.get(definition.xml_name()) {
            Some(value) => PropertyLookup::Value(value),
            None => PropertyLookup::Unset,
        }
    }

    /// Typed mutable access to a complex value.
    ///
    /// Missing or null values are instantiated for definitions flagged
    /// `AUTO_INSTANTIATE_ON_READ`; otherwise they are `PropertyNotLoaded`.
    pub fn complex_mut<T: ComplexProperty + 'static>(
        &mut self,
        definition: &'static PropertyDefinition,
    ) -> Result<&mut T> {
        self.ensure_member(definition)?;
        definition.ensure_supported(self.version)?;

        let current = self.values.get(definition.xml_name());
        let cleared = current.is_some_and(PropertyValue::is_null);
        if current.is_none() || cleared {
            let instance = definition
                .create_instance()
                .filter(|_| definition.has_flag(Flags::AUTO_INSTANTIATE_ON_READ, Some(self.version)))
                .ok_or_else(|| Error::PropertyNotLoaded(definition.name().to_string()))?;
            let mut value = PropertyValue::Complex(instance);
            if cleared {
                self.prepare_replacement(definition.xml_name(), &mut value);
            }
            let value = self.attach(definition, value);
            self.values.insert(definition.xml_name(), value);
        }

        match self.values.get_mut(definition.xml_name()) {
            Some(PropertyValue::Complex(complex)) => {
                complex.as_any_mut().downcast_mut::<T>().ok_or_else(|| {
                    Error::Validation(format!(
                        "Property '{}' does not hold a {}",
                        definition.name(),
                        std::any::type_name::<T>()
                    ))
                })
            },
            _ => Err(Error::Validation(format!(
                "Property '{}' is not a complex property",
                definition.name()
            ))),
        }
    }

    /// Assign a value, or clear it with [`PropertyValue::Null`].
    pub fn set_object(
        &mut self,
        definition: &'static PropertyDefinition,
        value: impl Into<PropertyValue>,
    ) -> Result<()> {
        let value = value.into();
        self.ensure_member(definition)?;
        definition.ensure_supported(self.version)?;

        if self.is_new {
            if !definition.has_flag(Flags::CAN_SET, Some(self.version)) {
                return Err(Error::Validation(format!(
                    "Property '{}' cannot be set",
                    definition.name()
                )));
            }
        } else {
            if !definition.has_flag(Flags::CAN_UPDATE, Some(self.version)) {
                return Err(Error::Validation(format!(
                    "Property '{}' cannot be updated",
                    definition.name()
                )));
            }
            if value.is_null() && !definition.has_flag(Flags::CAN_DELETE, Some(self.version)) {
                return Err(Error::Validation(format!(
                    "Property '{}' cannot be deleted",
                    definition.name()
                )));
            }
        }

        if !definition.accepts(&value) {
            return Err(Error::Validation(format!(
                "Value {:?} is not valid for property '{}'",
                value,
                definition.name()
            )));
        }

        let key = definition.xml_name();
        let had_value = self.values.get(key).is_some_and(|v| !v.is_null());
        let previous = match self.values.remove(key) {
            Some(PropertyValue::Complex(mut previous)) => {
                previous.set_owner(None);
                Some(previous)
            },
            _ => None,
        };
        if !self.is_new {
            self.displaced.entry(key).or_insert(previous);
        }

        if value.is_null() {
            if self.is_new {
                self.changes.lock().remove(key);
            } else {
                self.values.insert(key, PropertyValue::Null);
                self.changes.lock().record(key, ChangeKind::Deleted);
            }
        } else {
            let mut value = value;
            self.prepare_replacement(key, &mut value);
            let value = self.attach(definition, value);
            self.values.insert(key, value);
            let change = if had_value {
                ChangeKind::Modified
            } else {
                ChangeKind::Added
            };
            self.changes.lock().record(key, change);
        }

        trace!(property = definition.name(), "property set");
        Ok(())
    }

    /// Write every settable, non-null value in schema order, wrapped in the
    /// schema's object element.
    pub fn write_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        writer.write_start_element(XmlNamespace::Types, self.schema.xml_element_name());
        self.write_properties(writer)?;
        writer.write_end_element()
    }

    /// Write the values of [`write_to_xml`](Self::write_to_xml) without the
    /// object element.
    pub fn write_properties(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        let version = writer.version();
        for definition in self.schema.properties() {
            let Some(value) = self.values.get(definition.xml_name()) else {
                continue;
            };
            if value.is_null() || is_empty_collection(value) {
                continue;
            }
            definition.ensure_supported(version)?;
            if !definition.has_flag(Flags::CAN_SET, Some(version)) {
                continue;
            }
            definition.write_value(writer, value)?;
        }
        Ok(())
    }

    /// Write set, append and delete instructions for changed properties.
    pub fn write_update_to_xml(&self, sink: &mut UpdateSink<'_>) -> Result<()> {
        let version = sink.version();
        let changes = self.changes.lock().clone();

        for definition in self.schema.properties() {
            let key = definition.xml_name();
            if !changes.contains(key) {
                continue;
            }
            definition.ensure_supported(version)?;

            let value = self
                .values
                .get(definition.xml_name())
                .filter(|value| !value.is_null());
            let Some(value) = value else {
                Self::write_delete(definition, sink)?;
                continue;
            };

            if !definition.has_flag(Flags::CAN_UPDATE, Some(version)) {
                return Err(Error::Validation(format!(
                    "Property '{}' cannot be updated",
                    definition.name()
                )));
            }

            if let Some(complex) = value.as_complex() {
                let whole = self.rewritten.contains(key);
                if !whole && complex.write_custom_update(definition, sink)? {
                    continue;
                }
                if let Some(collection) = complex.as_collection() {
                    if collection.is_empty() {
                        Self::write_delete(definition, sink)?;
                        continue;
                    }
                    if !whole
                        && collection.has_only_additions()
                        && definition.has_flag(Flags::UPDATE_COLLECTION_ITEMS, Some(version))
                    {
                        let uri = definition.require_uri()?;
                        sink.write_append(FieldPath::Uri(uri), |writer| {
                            writer.write_start_element(XmlNamespace::Types, definition.xml_name());
                            collection.write_added_items(writer)?;
                            writer.write_end_element()
                        })?;
                        continue;
                    }
                }
            }

            let uri = definition.require_uri()?;
            sink.write_set(FieldPath::Uri(uri), |writer| {
                definition.write_value(writer, value)
            })?;
        }
        Ok(())
    }

    fn write_delete(definition: &PropertyDefinition, sink: &mut UpdateSink<'_>) -> Result<()> {
        if !definition.has_flag(Flags::CAN_DELETE, Some(sink.version())) {
            return Err(Error::Validation(format!(
                "Property '{}' cannot be deleted",
                definition.name()
            )));
        }
        sink.write_delete(FieldPath::Uri(definition.require_uri()?))
    }

    /// Load the object element under the cursor.
    ///
    /// Only properties in `requested` (all, when `None`) that the negotiated
    /// version supports are stored; other children are skipped. With
    /// `clear`, previously loaded values are dropped first. The cursor ends
    /// on the object's end tag and the change log is empty afterwards.
    pub fn load_from_xml(
        &mut self,
        reader: &mut EwsXmlReader<'_>,
        requested: Option<&PropertySet>,
        clear: bool,
    ) -> Result<()> {
        if !reader.is_any_start_element() || reader.namespace() != XmlNamespace::Types {
            return Err(Error::Deserialization(format!(
                "Expected a {} element at position {}",
                self.schema.name(),
                reader.position()
            )));
        }
        let element = reader.local_name().to_string();

        if clear {
            for value in self.values.values_mut() {
                if let PropertyValue::Complex(complex) = value {
                    complex.set_owner(None);
                }
            }
            self.values.clear();
        }

        if reader.is_empty_element() {
            reader.read()?;
        } else {
            loop {
                reader.read_significant()?;
                match reader.node_type() {
                    XmlNodeType::StartElement => self.load_child(reader, requested)?,
                    XmlNodeType::EndElement => {
                        reader.ensure_current_node_is_end_element(XmlNamespace::Types, &element)?;
                        break;
                    },
                    XmlNodeType::Text => {
                        trace!(element = %element, "ignoring text inside object element");
                    },
                    XmlNodeType::EndOfDocument | XmlNodeType::None => {
                        return Err(Error::Deserialization(format!(
                            "Unexpected end of document inside <{}>",
                            element
                        )));
                    },
                }
            }
        }

        self.is_new = false;
        self.clear_change_log();
        Ok(())
    }

    fn load_child(
        &mut self,
        reader: &mut EwsXmlReader<'_>,
        requested: Option<&PropertySet>,
    ) -> Result<()> {
        let definition = if reader.namespace() == XmlNamespace::Types {
            self.schema.find_by_xml_name(reader.local_name())
        } else {
            None
        };
        let Some(definition) = definition else {
            trace!(
                schema = self.schema.name(),
                element = reader.local_name(),
                "skipping unknown element"
            );
            return reader.skip_current_element();
        };

        let wanted = definition.is_supported(self.version)
            && requested.is_none_or(|set| set.includes(definition, &self.schema));
        if !wanted {
            trace!(property = definition.name(), "skipping property outside the request");
            return reader.skip_current_element();
        }

        if definition.has_flag(Flags::REUSE_INSTANCE, None)
            && let Some(PropertyValue::Complex(existing)) = self.values.get_mut(definition.xml_name())
        {
            return definition.load_into(reader, existing.as_mut());
        }

        let value = definition.read_value(reader)?;
        let value = self.attach(definition, value);
        if let Some(PropertyValue::Complex(mut previous)) =
            self.values.insert(definition.xml_name(), value)
        {
            previous.set_owner(None);
        }
        Ok(())
    }

    /// Take over every value loaded into `loaded` and make the result the
    /// baseline, as if the response had been read into this bag directly.
    pub fn absorb(&mut self, loaded: PropertyBag) {
        for (key, mut value) in loaded.values {
            if let PropertyValue::Complex(complex) = &mut value {
                complex.set_owner(Some(OwnerHandle::new(&self.changes, key)));
            }
            if let Some(PropertyValue::Complex(mut previous)) = self.values.insert(key, value) {
                previous.set_owner(None);
            }
        }
        self.is_new = false;
        self.clear_change_log();
    }

    /// Make the current values the baseline.
    pub fn clear_change_log(&mut self) {
        self.changes.lock().clear();
        self.displaced.clear();
        self.rewritten.clear();
        for value in self.values.values_mut() {
            if let PropertyValue::Complex(complex) = value {
                complex.clear_change_log();
            }
        }
    }

    pub fn is_dirty(&self) -> bool {
        !self.changes.lock().is_empty()
    }

    /// Changed definitions, in schema order.
    pub fn changed_properties(&self) -> Vec<&'static PropertyDefinition> {
        let changes = self.changes.lock();
        self.schema
            .properties()
            .iter()
            .copied()
            .filter(|definition| changes.contains(definition.xml_name()))
            .collect()
    }

    pub fn change_kind(&self, definition: &PropertyDefinition) -> Option<ChangeKind> {
        self.changes.lock().get(definition.xml_name())
    }

    fn ensure_member(&self, definition: &PropertyDefinition) -> Result<()> {
        if self.schema.contains(definition) {
            Ok(())
        } else {
            Err(Error::Validation(format!(
                "Property '{}' is not part of the {} schema",
                definition.name(),
                self.schema.name()
            )))
        }
    }

    /// Let a value assigned over a loaded one diff against what it replaces.
    fn prepare_replacement(&mut self, key: &'static str, value: &mut PropertyValue) {
        self.rewritten.remove(key);
        let Some(previous) = self.displaced.get(key) else {
            return;
        };
        if let PropertyValue::Complex(complex) = value
            && !complex.adopt_baseline(previous.as_deref())
        {
            self.rewritten.insert(key);
        }
    }

    fn attach(&self, definition: &'static PropertyDefinition, mut value: PropertyValue) -> PropertyValue {
        if let PropertyValue::Complex(complex) = &mut value {
            complex.set_owner(Some(OwnerHandle::new(&self.changes, definition.xml_name())));
        }
        value
    }
}

fn is_empty_collection(value: &PropertyValue) -> bool {
    value
        .as_complex()
        .and_then(|complex| complex.as_collection())
        .is_some_and(|collection| collection.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::types::{
        EmailAddress, EmailAddressCollection, EmailAddressDictionary, EmailAddressKey, MessageBody,
    };
    use crate::property::value::ScalarValue;
    use crate::schema::tables::{contact, item, message};
    use crate::schema::{ScalarKind, SchemaBuilder, SchemaRegistry, SchemaTarget, default_instance};

    static A: PropertyDefinition = PropertyDefinition::scalar(
        "A",
        "test:A",
        ScalarKind::Integer,
        Flags::EDITABLE,
        ExchangeVersion::Exchange2007Sp1,
    );

    static B: PropertyDefinition = PropertyDefinition::scalar(
        "B",
        "test:B",
        ScalarKind::Boolean,
        Flags::EDITABLE,
        ExchangeVersion::Exchange2007Sp1,
    );

    fn test_schema() -> Arc<Schema> {
        Arc::new(
            SchemaBuilder::new("Test", "Test", SchemaTarget::Item)
                .register(&A)
                .register(&B)
                .build(),
        )
    }

    fn load(bag: &mut PropertyBag, xml: &str) {
        let mut reader = EwsXmlReader::new(xml);
        reader.read_significant().unwrap();
        bag.load_from_xml(&mut reader, None, true).unwrap();
    }

    fn update_xml(bag: &PropertyBag, element: &'static str) -> String {
        let mut writer = EwsXmlWriter::new(bag.version());
        let mut sink = UpdateSink::new(&mut writer, SchemaTarget::Item, element);
        bag.write_update_to_xml(&mut sink).unwrap();
        writer.into_string().unwrap()
    }

    const TYPES: &str = r#"xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types""#;

    #[test]
    fn test_only_changed_property_is_updated() {
        let mut bag = PropertyBag::new(test_schema(), ExchangeVersion::Exchange2010);
        load(
            &mut bag,
            &format!("<t:Test {}><t:A>5</t:A><t:B>true</t:B></t:Test>", TYPES),
        );
        assert!(!bag.is_new());
        assert!(!bag.is_dirty());

        bag.set_object(&B, false).unwrap();
        assert_eq!(bag.changed_properties(), vec![&B as &PropertyDefinition]);
        assert_eq!(
            update_xml(&bag, "Test"),
            r#"<t:SetItemField><t:FieldURI FieldURI="test:B"/><t:Test><t:B>false</t:B></t:Test></t:SetItemField>"#
        );
    }

    #[test]
    fn test_cleared_property_is_deleted() {
        let mut bag = PropertyBag::new(test_schema(), ExchangeVersion::Exchange2010);
        load(
            &mut bag,
            &format!("<t:Test {}><t:A>5</t:A><t:B>true</t:B></t:Test>", TYPES),
        );
        bag.set_object(&A, PropertyValue::Null).unwrap();
        assert_eq!(bag.change_kind(&A), Some(ChangeKind::Deleted));
        assert_eq!(
            update_xml(&bag, "Test"),
            r#"<t:DeleteItemField><t:FieldURI FieldURI="test:A"/></t:DeleteItemField>"#
        );

        bag.clear_change_log();
        assert_eq!(update_xml(&bag, "Test"), "");
    }

    #[test]
    fn test_create_writes_in_schema_order() {
        let registry = SchemaRegistry::shared();
        let mut bag = PropertyBag::new(registry.message().clone(), ExchangeVersion::Exchange2010);
        bag.set_object(&message::IS_READ, true).unwrap();
        bag.set_object(&item::BODY, PropertyValue::complex(MessageBody::text("hi")))
            .unwrap();
        bag.set_object(&item::SUBJECT, "Status").unwrap();

        let mut writer = EwsXmlWriter::new(ExchangeVersion::Exchange2010);
        bag.write_to_xml(&mut writer).unwrap();
        assert_eq!(
            writer.into_string().unwrap(),
            concat!(
                "<t:Message><t:Subject>Status</t:Subject>",
                r#"<t:Body BodyType="Text">hi</t:Body>"#,
                "<t:IsRead>true</t:IsRead></t:Message>"
            )
        );
    }

    #[test]
    fn test_version_gating() {
        let registry = SchemaRegistry::shared();
        let mut bag = PropertyBag::new(registry.item().clone(), ExchangeVersion::Exchange2007Sp1);
        let err = bag
            .set_object(&item::UNIQUE_BODY, PropertyValue::complex(MessageBody::text("x")))
            .unwrap_err();
        assert!(err.is_version_mismatch());

        // Stored under a newer version, written under an older one
        let mut bag = PropertyBag::new(registry.contact().clone(), ExchangeVersion::Exchange2010Sp2);
        bag.set_object(&contact::NOTES, "met at the conference").unwrap();
        let mut writer = EwsXmlWriter::new(ExchangeVersion::Exchange2010);
        assert!(bag.write_to_xml(&mut writer).unwrap_err().is_version_mismatch());

        // Gated flag: settable from 2010 on, silently skipped before
        let mut bag = PropertyBag::new(registry.item().clone(), ExchangeVersion::Exchange2010);
        bag.set_object(&item::IS_ASSOCIATED, true).unwrap();
        let mut writer = EwsXmlWriter::new(ExchangeVersion::Exchange2010);
        bag.write_to_xml(&mut writer).unwrap();
        assert_eq!(
            writer.into_string().unwrap(),
            "<t:Item><t:IsAssociated>true</t:IsAssociated></t:Item>"
        );
        let mut writer = EwsXmlWriter::new(ExchangeVersion::Exchange2007Sp1);
        bag.write_to_xml(&mut writer).unwrap();
        assert_eq!(writer.into_string().unwrap(), "<t:Item/>");
    }

    #[test]
    fn test_gated_flag_blocks_set() {
        let registry = SchemaRegistry::shared();
        let mut bag = PropertyBag::new(registry.item().clone(), ExchangeVersion::Exchange2007Sp1);
        let err = bag.set_object(&item::IS_ASSOCIATED, true).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_rejects_wrong_kind_and_foreign_property() {
        let mut bag = PropertyBag::new(test_schema(), ExchangeVersion::Exchange2010);
        assert!(bag.set_object(&A, "five").is_err());
        assert!(bag.set_object(&item::SUBJECT, "x").is_err());
        assert!(bag.peek(&A).is_unset());
    }

    #[test]
    fn test_unknown_elements_are_skipped() {
        let mut bag = PropertyBag::new(test_schema(), ExchangeVersion::Exchange2010);
        let xml = format!(
            "<t:Test {}><t:Future><t:Nested>1</t:Nested></t:Future><t:A>5</t:A><x:B xmlns:x=\"urn:other\">1</x:B></t:Test>",
            TYPES
        );
        let mut reader = EwsXmlReader::new(&xml);
        reader.read_significant().unwrap();
        bag.load_from_xml(&mut reader, None, true).unwrap();
        assert!(reader.is_end_element(XmlNamespace::Types, "Test"));
        assert_eq!(
            bag.peek(&A).value().and_then(PropertyValue::as_scalar),
            Some(&ScalarValue::Int(5))
        );
        assert!(bag.peek(&B).is_unset());
    }

    #[test]
    fn test_unloaded_property_stays_unset() {
        let registry = SchemaRegistry::shared();
        let mut bag = PropertyBag::new(registry.message().clone(), ExchangeVersion::Exchange2010);
        assert!(bag.get_object(&item::SUBJECT).unwrap().is_unset());
        // Auto-instantiated on read
        assert!(!bag.get_object(&message::TO_RECIPIENTS).unwrap().is_unset());
        assert!(!bag.is_dirty());
    }

    #[test]
    fn test_recipient_append_and_replace() {
        let registry = SchemaRegistry::shared();
        let mut bag = PropertyBag::new(registry.message().clone(), ExchangeVersion::Exchange2010);
        load(
            &mut bag,
            &format!(
                "<t:Message {}><t:ToRecipients><t:Mailbox><t:EmailAddress>a@contoso.com</t:EmailAddress></t:Mailbox></t:ToRecipients></t:Message>",
                TYPES
            ),
        );

        bag.complex_mut::<EmailAddressCollection>(&message::TO_RECIPIENTS)
            .unwrap()
            .add(EmailAddress::new("b@contoso.com"));
        assert!(bag.is_dirty());
        assert_eq!(
            update_xml(&bag, "Message"),
            concat!(
                r#"<t:AppendToItemField><t:FieldURI FieldURI="message:ToRecipients"/>"#,
                "<t:Message><t:ToRecipients><t:Mailbox><t:EmailAddress>b@contoso.com</t:EmailAddress></t:Mailbox></t:ToRecipients></t:Message>",
                "</t:AppendToItemField>"
            )
        );

        bag.complex_mut::<EmailAddressCollection>(&message::TO_RECIPIENTS)
            .unwrap()
            .remove(0);
        assert!(update_xml(&bag, "Message").starts_with("<t:SetItemField>"));

        bag.complex_mut::<EmailAddressCollection>(&message::TO_RECIPIENTS)
            .unwrap()
            .clear();
        assert_eq!(
            update_xml(&bag, "Message"),
            r#"<t:DeleteItemField><t:FieldURI FieldURI="message:ToRecipients"/></t:DeleteItemField>"#
        );
    }

    fn loaded_message() -> PropertyBag {
        let registry = SchemaRegistry::shared();
        let mut bag = PropertyBag::new(registry.message().clone(), ExchangeVersion::Exchange2010);
        load(
            &mut bag,
            &format!(
                "<t:Message {}><t:ToRecipients><t:Mailbox><t:EmailAddress>a@contoso.com</t:EmailAddress></t:Mailbox></t:ToRecipients></t:Message>",
                TYPES
            ),
        );
        bag
    }

    const SET_TO_C: &str = concat!(
        r#"<t:SetItemField><t:FieldURI FieldURI="message:ToRecipients"/>"#,
        "<t:Message><t:ToRecipients><t:Mailbox><t:EmailAddress>c@contoso.com</t:EmailAddress></t:Mailbox></t:ToRecipients></t:Message>",
        "</t:SetItemField>"
    );

    #[test]
    fn test_replaced_collection_is_set_whole() {
        let mut bag = loaded_message();
        let mut replacement = EmailAddressCollection::new();
        replacement.add(EmailAddress::new("c@contoso.com"));
        bag.set_object(&message::TO_RECIPIENTS, PropertyValue::complex(replacement))
            .unwrap();
        assert_eq!(update_xml(&bag, "Message"), SET_TO_C);

        // Still written whole after further appends
        bag.complex_mut::<EmailAddressCollection>(&message::TO_RECIPIENTS)
            .unwrap()
            .add(EmailAddress::new("d@contoso.com"));
        assert!(update_xml(&bag, "Message").starts_with("<t:SetItemField>"));

        bag.clear_change_log();
        bag.complex_mut::<EmailAddressCollection>(&message::TO_RECIPIENTS)
            .unwrap()
            .add(EmailAddress::new("e@contoso.com"));
        assert!(update_xml(&bag, "Message").starts_with("<t:AppendToItemField>"));
    }

    #[test]
    fn test_cleared_then_refilled_collection_is_set_whole() {
        let mut bag = loaded_message();
        bag.set_object(&message::TO_RECIPIENTS, PropertyValue::Null)
            .unwrap();
        bag.complex_mut::<EmailAddressCollection>(&message::TO_RECIPIENTS)
            .unwrap()
            .add(EmailAddress::new("c@contoso.com"));
        assert_eq!(bag.change_kind(&message::TO_RECIPIENTS), Some(ChangeKind::Modified));
        assert_eq!(update_xml(&bag, "Message"), SET_TO_C);
    }

    #[test]
    fn test_replaced_dictionary_deletes_dropped_keys() {
        let registry = SchemaRegistry::shared();
        let mut bag = PropertyBag::new(registry.contact().clone(), ExchangeVersion::Exchange2010);
        load(
            &mut bag,
            &format!(
                r#"<t:Contact {}><t:EmailAddresses><t:Entry Key="EmailAddress1">a@contoso.com</t:Entry><t:Entry Key="EmailAddress2">b@contoso.com</t:Entry></t:EmailAddresses></t:Contact>"#,
                TYPES
            ),
        );

        let mut replacement = EmailAddressDictionary::default();
        replacement.set(EmailAddressKey::EmailAddress1, "z@contoso.com".to_string());
        bag.set_object(&contact::EMAIL_ADDRESSES, PropertyValue::complex(replacement))
            .unwrap();
        assert_eq!(
            update_xml(&bag, "Contact"),
            concat!(
                r#"<t:SetItemField><t:IndexedFieldURI FieldURI="contacts:EmailAddress" FieldIndex="EmailAddress1"/>"#,
                r#"<t:Contact><t:EmailAddresses><t:Entry Key="EmailAddress1">z@contoso.com</t:Entry></t:EmailAddresses></t:Contact>"#,
                "</t:SetItemField>",
                r#"<t:DeleteItemField><t:IndexedFieldURI FieldURI="contacts:EmailAddress" FieldIndex="EmailAddress2"/></t:DeleteItemField>"#
            )
        );
    }

    static RECIPIENT_LIST: PropertyDefinition = PropertyDefinition::collection(
        "List",
        "test:List",
        default_instance::<EmailAddressCollection>,
        Flags::CAN_SET
            .union(Flags::CAN_UPDATE)
            .union(Flags::AUTO_INSTANTIATE_ON_READ),
        ExchangeVersion::Exchange2007Sp1,
    );

    #[test]
    fn test_emptied_collection_requires_delete_permission() {
        let schema = Arc::new(
            SchemaBuilder::new("Test", "Test", SchemaTarget::Item)
                .register(&RECIPIENT_LIST)
                .build(),
        );
        let mut bag = PropertyBag::new(schema, ExchangeVersion::Exchange2010);
        load(
            &mut bag,
            &format!(
                "<t:Test {}><t:List><t:Mailbox><t:EmailAddress>a@contoso.com</t:EmailAddress></t:Mailbox></t:List></t:Test>",
                TYPES
            ),
        );
        bag.complex_mut::<EmailAddressCollection>(&RECIPIENT_LIST)
            .unwrap()
            .clear();

        let mut writer = EwsXmlWriter::new(ExchangeVersion::Exchange2010);
        let mut sink = UpdateSink::new(&mut writer, SchemaTarget::Item, "Test");
        let err = bag.write_update_to_xml(&mut sink).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_copies_are_detached() {
        let registry = SchemaRegistry::shared();
        let mut bag = PropertyBag::new(registry.message().clone(), ExchangeVersion::Exchange2010);
        bag.set_object(&message::FROM, PropertyValue::complex(EmailAddress::new("a@contoso.com")))
            .unwrap();
        bag.clear_change_log();

        let snapshot = bag.peek(&message::FROM).value().cloned().unwrap();
        let mut copy = snapshot.downcast_ref::<EmailAddress>().unwrap().clone();
        copy.set_name("copy");
        assert!(!bag.is_dirty());

        bag.complex_mut::<EmailAddress>(&message::FROM)
            .unwrap()
            .set_name("Alice");
        assert_eq!(bag.change_kind(&message::FROM), Some(ChangeKind::Modified));
    }
}
