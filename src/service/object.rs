//! Service objects: items and folders.
//!
//! A [`ServiceObject`] pairs a schema with a [`PropertyBag`]. [`Item`] and
//! [`Folder`] add typed accessors on top; a typed getter turns a property
//! that was never loaded into [`Error::PropertyNotLoaded`] instead of a
//! default value.

use crate::common::error::{Error, Result};
use crate::common::version::ExchangeVersion;
use crate::common::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace};
use crate::property::types::{
    EmailAddress, EmailAddressCollection, EmailAddressDictionary, ExtendedPropertyCollection,
    MessageBody, PhoneNumberDictionary, PhysicalAddressDictionary, ServiceId, StringList,
};
use crate::property::{
    ComplexProperty, PropertyBag, PropertyLookup, PropertyValue, ScalarValue, UpdateSink,
};
use crate::schema::tables::{contact, folder, item, message};
use crate::schema::{ExtendedPropertyDefinition, PropertyDefinition, PropertySet, Schema};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Schema plus property values of one server object.
#[derive(Debug)]
pub struct ServiceObject {
    bag: PropertyBag,
}

impl ServiceObject {
    pub fn new(schema: Arc<Schema>, version: ExchangeVersion) -> Self {
        Self {
            bag: PropertyBag::new(schema, version),
        }
    }

    #[inline]
    pub fn schema(&self) -> &Arc<Schema> {
        self.bag.schema()
    }

    #[inline]
    pub fn bag(&self) -> &PropertyBag {
        &self.bag
    }

    #[inline]
    pub fn bag_mut(&mut self) -> &mut PropertyBag {
        &mut self.bag
    }

    pub fn is_new(&self) -> bool {
        self.bag.is_new()
    }

    pub fn is_dirty(&self) -> bool {
        self.bag.is_dirty()
    }

    /// Server id, once assigned.
    pub fn id(&self) -> Option<&ServiceId> {
        let definition = self.schema().id_property()?;
        self.bag
            .peek(definition)
            .value()
            .and_then(PropertyValue::downcast_ref::<ServiceId>)
            .filter(|id| id.is_valid())
    }

    /// Value of `definition`; `None` for a known null.
    pub fn lookup(&self, definition: &PropertyDefinition) -> Result<Option<&PropertyValue>> {
        definition.ensure_supported(self.bag.version())?;
        match self.bag.peek(definition) {
            PropertyLookup::Unset => Err(Error::PropertyNotLoaded(definition.name().to_string())),
            PropertyLookup::Value(PropertyValue::Null) => Ok(None),
            PropertyLookup::Value(value) => Ok(Some(value)),
        }
    }

    pub fn scalar(&self, definition: &PropertyDefinition) -> Result<Option<&ScalarValue>> {
        Ok(self.lookup(definition)?.and_then(PropertyValue::as_scalar))
    }

    pub fn string(&self, definition: &PropertyDefinition) -> Result<Option<&str>> {
        Ok(self.scalar(definition)?.and_then(ScalarValue::as_str))
    }

    pub fn boolean(&self, definition: &PropertyDefinition) -> Result<Option<bool>> {
        Ok(self.scalar(definition)?.and_then(ScalarValue::as_bool))
    }

    pub fn integer(&self, definition: &PropertyDefinition) -> Result<Option<i32>> {
        Ok(self.scalar(definition)?.and_then(ScalarValue::as_i32))
    }

    pub fn date_time(&self, definition: &PropertyDefinition) -> Result<Option<DateTime<Utc>>> {
        Ok(self.scalar(definition)?.and_then(ScalarValue::as_date_time))
    }

    pub fn complex<T: ComplexProperty + 'static>(
        &self,
        definition: &PropertyDefinition,
    ) -> Result<Option<&T>> {
        Ok(self
            .lookup(definition)?
            .and_then(PropertyValue::downcast_ref::<T>))
    }

    pub fn complex_mut<T: ComplexProperty + 'static>(
        &mut self,
        definition: &'static PropertyDefinition,
    ) -> Result<&mut T> {
        self.bag.complex_mut(definition)
    }

    pub fn set(
        &mut self,
        definition: &'static PropertyDefinition,
        value: impl Into<PropertyValue>,
    ) -> Result<()> {
        self.bag.set_object(definition, value)
    }

    /// Write the object for a create request.
    pub fn write_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        self.bag.write_to_xml(writer)
    }

    /// Write `<t:ItemChange>` or `<t:FolderChange>` with the pending updates.
    pub fn write_update_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        let schema = Arc::clone(self.schema());
        let target = schema.target();
        let id = self.id().ok_or_else(|| {
            Error::Validation(format!(
                "Cannot update a {} that has no id",
                schema.name()
            ))
        })?;

        writer.write_start_element(XmlNamespace::Types, target.change_element());
        id.write_to_xml(writer, XmlNamespace::Types, target.id_element())?;
        writer.write_start_element(XmlNamespace::Types, "Updates");
        let mut sink = UpdateSink::new(writer, target, schema.xml_element_name());
        self.bag.write_update_to_xml(&mut sink)?;
        writer.write_end_element()?;
        writer.write_end_element()
    }

    pub fn load_from_xml(
        &mut self,
        reader: &mut EwsXmlReader<'_>,
        requested: Option<&PropertySet>,
        clear: bool,
    ) -> Result<()> {
        self.bag.load_from_xml(reader, requested, clear)
    }

    /// Accept the current state as saved.
    pub fn reset_change_log(&mut self) {
        self.bag.clear_change_log();
    }

    /// Empty object of the same schema and version, to read a response
    /// into before it is applied.
    pub(crate) fn staging(&self) -> ServiceObject {
        ServiceObject::new(Arc::clone(self.schema()), self.bag.version())
    }

    /// Apply values read into a [`staging`](Self::staging) object and
    /// accept the result as saved.
    pub(crate) fn absorb(&mut self, staged: ServiceObject) {
        self.bag.absorb(staged.bag);
    }
}

/// An item: generic item, message or contact, depending on the schema.
#[derive(Debug)]
pub struct Item {
    object: ServiceObject,
}

impl Item {
    pub fn new(schema: Arc<Schema>, version: ExchangeVersion) -> Self {
        Self {
            object: ServiceObject::new(schema, version),
        }
    }

    #[inline]
    pub fn object(&self) -> &ServiceObject {
        &self.object
    }

    #[inline]
    pub fn object_mut(&mut self) -> &mut ServiceObject {
        &mut self.object
    }

    pub fn schema(&self) -> &Arc<Schema> {
        self.object.schema()
    }

    pub fn is_new(&self) -> bool {
        self.object.is_new()
    }

    pub fn is_dirty(&self) -> bool {
        self.object.is_dirty()
    }

    pub fn id(&self) -> Option<&ServiceId> {
        self.object.id()
    }

    pub fn item_class(&self) -> Result<Option<&str>> {
        self.object.string(&item::ITEM_CLASS)
    }

    pub fn subject(&self) -> Result<Option<&str>> {
        self.object.string(&item::SUBJECT)
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) -> Result<()> {
        self.object.set(&item::SUBJECT, subject.into())
    }

    pub fn body(&self) -> Result<Option<&MessageBody>> {
        self.object.complex(&item::BODY)
    }

    pub fn set_body(&mut self, body: MessageBody) -> Result<()> {
        self.object.set(&item::BODY, PropertyValue::complex(body))
    }

    pub fn importance(&self) -> Result<Option<&str>> {
        self.object.string(&item::IMPORTANCE)
    }

    /// `Low`, `Normal` or `High`.
    pub fn set_importance(&mut self, importance: &str) -> Result<()> {
        self.object.set(
            &item::IMPORTANCE,
            ScalarValue::Enum(importance.to_string()),
        )
    }

    pub fn categories_mut(&mut self) -> Result<&mut StringList> {
        self.object.complex_mut(&item::CATEGORIES)
    }

    pub fn date_time_received(&self) -> Result<Option<DateTime<Utc>>> {
        self.object.date_time(&item::DATE_TIME_RECEIVED)
    }

    pub fn size(&self) -> Result<Option<i32>> {
        self.object.integer(&item::SIZE)
    }

    pub fn has_attachments(&self) -> Result<Option<bool>> {
        self.object.boolean(&item::HAS_ATTACHMENTS)
    }

    pub fn extended_property(&self, definition: &ExtendedPropertyDefinition) -> Result<Option<&ScalarValue>> {
        Ok(self
            .object
            .complex::<ExtendedPropertyCollection>(&item::EXTENDED_PROPERTY)?
            .and_then(|collection| collection.get(definition)))
    }

    pub fn set_extended_property(
        &mut self,
        definition: ExtendedPropertyDefinition,
        value: ScalarValue,
    ) -> Result<()> {
        self.object
            .complex_mut::<ExtendedPropertyCollection>(&item::EXTENDED_PROPERTY)?
            .set(definition, value)
    }

    pub fn remove_extended_property(&mut self, definition: &ExtendedPropertyDefinition) -> Result<bool> {
        Ok(self
            .object
            .complex_mut::<ExtendedPropertyCollection>(&item::EXTENDED_PROPERTY)?
            .remove(definition))
    }

    pub fn is_read(&self) -> Result<Option<bool>> {
        self.object.boolean(&message::IS_READ)
    }

    pub fn set_is_read(&mut self, is_read: bool) -> Result<()> {
        self.object.set(&message::IS_READ, is_read)
    }

    pub fn from(&self) -> Result<Option<&EmailAddress>> {
        self.object.complex(&message::FROM)
    }

    pub fn set_from(&mut self, from: EmailAddress) -> Result<()> {
        self.object.set(&message::FROM, PropertyValue::complex(from))
    }

    pub fn to_recipients(&self) -> Result<Option<&EmailAddressCollection>> {
        self.object.complex(&message::TO_RECIPIENTS)
    }

    pub fn to_recipients_mut(&mut self) -> Result<&mut EmailAddressCollection> {
        self.object.complex_mut(&message::TO_RECIPIENTS)
    }

    pub fn cc_recipients_mut(&mut self) -> Result<&mut EmailAddressCollection> {
        self.object.complex_mut(&message::CC_RECIPIENTS)
    }

    pub fn bcc_recipients_mut(&mut self) -> Result<&mut EmailAddressCollection> {
        self.object.complex_mut(&message::BCC_RECIPIENTS)
    }

    pub fn given_name(&self) -> Result<Option<&str>> {
        self.object.string(&contact::GIVEN_NAME)
    }

    pub fn set_given_name(&mut self, name: impl Into<String>) -> Result<()> {
        self.object.set(&contact::GIVEN_NAME, name.into())
    }

    pub fn surname(&self) -> Result<Option<&str>> {
        self.object.string(&contact::SURNAME)
    }

    pub fn set_surname(&mut self, name: impl Into<String>) -> Result<()> {
        self.object.set(&contact::SURNAME, name.into())
    }

    pub fn email_addresses_mut(&mut self) -> Result<&mut EmailAddressDictionary> {
        self.object.complex_mut(&contact::EMAIL_ADDRESSES)
    }

    pub fn phone_numbers_mut(&mut self) -> Result<&mut PhoneNumberDictionary> {
        self.object.complex_mut(&contact::PHONE_NUMBERS)
    }

    pub fn physical_addresses_mut(&mut self) -> Result<&mut PhysicalAddressDictionary> {
        self.object.complex_mut(&contact::PHYSICAL_ADDRESSES)
    }
}

/// A folder of any folder class.
#[derive(Debug)]
pub struct Folder {
    object: ServiceObject,
}

impl Folder {
    pub fn new(schema: Arc<Schema>, version: ExchangeVersion) -> Self {
        Self {
            object: ServiceObject::new(schema, version),
        }
    }

    #[inline]
    pub fn object(&self) -> &ServiceObject {
        &self.object
    }

    #[inline]
    pub fn object_mut(&mut self) -> &mut ServiceObject {
        &mut self.object
    }

    pub fn is_new(&self) -> bool {
        self.object.is_new()
    }

    pub fn is_dirty(&self) -> bool {
        self.object.is_dirty()
    }

    pub fn id(&self) -> Option<&ServiceId> {
        self.object.id()
    }

    pub fn parent_folder_id(&self) -> Result<Option<&ServiceId>> {
        self.object.complex(&folder::PARENT_FOLDER_ID)
    }

    pub fn display_name(&self) -> Result<Option<&str>> {
        self.object.string(&folder::DISPLAY_NAME)
    }

    pub fn set_display_name(&mut self, name: impl Into<String>) -> Result<()> {
        self.object.set(&folder::DISPLAY_NAME, name.into())
    }

    pub fn folder_class(&self) -> Result<Option<&str>> {
        self.object.string(&folder::FOLDER_CLASS)
    }

    pub fn set_folder_class(&mut self, class: impl Into<String>) -> Result<()> {
        self.object.set(&folder::FOLDER_CLASS, class.into())
    }

    pub fn total_count(&self) -> Result<Option<i32>> {
        self.object.integer(&folder::TOTAL_COUNT)
    }

    pub fn child_folder_count(&self) -> Result<Option<i32>> {
        self.object.integer(&folder::CHILD_FOLDER_COUNT)
    }

    pub fn unread_count(&self) -> Result<Option<i32>> {
        self.object.integer(&folder::UNREAD_COUNT)
    }

    pub fn set_extended_property(
        &mut self,
        definition: ExtendedPropertyDefinition,
        value: ScalarValue,
    ) -> Result<()> {
        self.object
            .complex_mut::<ExtendedPropertyCollection>(&folder::EXTENDED_PROPERTY)?
            .set(definition, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaRegistry;

    const TYPES: &str = r#"xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types""#;

    fn loaded_message() -> Item {
        let registry = SchemaRegistry::shared();
        let mut item = Item::new(registry.message().clone(), ExchangeVersion::Exchange2010);
        let xml = format!(
            r#"<t:Message {}><t:ItemId Id="AAMk" ChangeKey="CQAA"/><t:Subject>Status</t:Subject><t:IsRead>false</t:IsRead></t:Message>"#,
            TYPES
        );
        let mut reader = EwsXmlReader::new(&xml);
        reader.read_significant().unwrap();
        item.object_mut().load_from_xml(&mut reader, None, true).unwrap();
        item
    }

    #[test]
    fn test_typed_getters() {
        let item = loaded_message();
        assert_eq!(item.subject().unwrap(), Some("Status"));
        assert_eq!(item.is_read().unwrap(), Some(false));
        assert_eq!(item.id().map(ServiceId::id), Some("AAMk"));
        assert!(matches!(item.body(), Err(Error::PropertyNotLoaded(_))));
    }

    #[test]
    fn test_update_wraps_changes_with_id() {
        let mut item = loaded_message();
        item.set_is_read(true).unwrap();

        let mut writer = EwsXmlWriter::new(ExchangeVersion::Exchange2010);
        item.object().write_update_to_xml(&mut writer).unwrap();
        assert_eq!(
            writer.into_string().unwrap(),
            concat!(
                r#"<t:ItemChange><t:ItemId Id="AAMk" ChangeKey="CQAA"/><t:Updates>"#,
                r#"<t:SetItemField><t:FieldURI FieldURI="message:IsRead"/><t:Message><t:IsRead>true</t:IsRead></t:Message></t:SetItemField>"#,
                "</t:Updates></t:ItemChange>"
            )
        );
    }

    #[test]
    fn test_update_without_id_fails() {
        let registry = SchemaRegistry::shared();
        let mut folder = Folder::new(registry.folder().clone(), ExchangeVersion::Exchange2010);
        folder.set_display_name("Projects").unwrap();
        let mut writer = EwsXmlWriter::new(ExchangeVersion::Exchange2010);
        assert!(matches!(
            folder.object().write_update_to_xml(&mut writer),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_contact_dictionary_update() {
        let registry = SchemaRegistry::shared();
        let mut contact = Item::new(registry.contact().clone(), ExchangeVersion::Exchange2010);
        let xml = format!(
            r#"<t:Contact {}><t:ItemId Id="C1"/><t:GivenName>Ann</t:GivenName></t:Contact>"#,
            TYPES
        );
        let mut reader = EwsXmlReader::new(&xml);
        reader.read_significant().unwrap();
        contact
            .object_mut()
            .load_from_xml(&mut reader, None, true)
            .unwrap();

        contact
            .phone_numbers_mut()
            .unwrap()
            .set(crate::property::types::PhoneNumberKey::MobilePhone, "555".to_string());
        let mut writer = EwsXmlWriter::new(ExchangeVersion::Exchange2010);
        contact.object().write_update_to_xml(&mut writer).unwrap();
        assert_eq!(
            writer.into_string().unwrap(),
            concat!(
                r#"<t:ItemChange><t:ItemId Id="C1"/><t:Updates>"#,
                r#"<t:SetItemField><t:IndexedFieldURI FieldURI="contacts:PhoneNumber" FieldIndex="MobilePhone"/>"#,
                r#"<t:Contact><t:PhoneNumbers><t:Entry Key="MobilePhone">555</t:Entry></t:PhoneNumbers></t:Contact>"#,
                "</t:SetItemField></t:Updates></t:ItemChange>"
            )
        );
    }
}
