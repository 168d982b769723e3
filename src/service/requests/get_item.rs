use crate::common::error::{Error, Result};
use crate::common::version::ExchangeVersion;
use crate::common::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace};
use crate::property::ComplexProperty;
use crate::property::types::ServiceId;
use crate::schema::PropertySet;
use crate::service::object::Item;
use crate::service::request::{ResponseContext, ServiceRequest};
use crate::service::requests::{missing_object, read_objects};
use crate::service::response::ResponseMessage;
use std::sync::Arc;

/// Load items by id.
///
/// Each returned item uses the schema matching its element (`Message`,
/// `Contact`, ...), falling back to the generic item schema.
#[derive(Debug)]
pub struct GetItem {
    ids: Vec<ServiceId>,
    property_set: PropertySet,
    items: Vec<Option<Item>>,
}

impl GetItem {
    pub fn new(ids: Vec<ServiceId>, property_set: PropertySet) -> Self {
        let items = ids.iter().map(|_| None).collect();
        Self {
            ids,
            property_set,
            items,
        }
    }
}

impl ServiceRequest for GetItem {
    type Response = Vec<Item>;

    const ELEMENT: &'static str = "GetItem";
    const RESPONSE_ELEMENT: &'static str = "GetItemResponse";
    const RESPONSE_MESSAGE_ELEMENT: &'static str = "GetItemResponseMessage";

    fn validate(&self, _version: ExchangeVersion) -> Result<()> {
        if self.ids.is_empty() {
            return Err(Error::Validation("GetItem needs at least one id".to_string()));
        }
        if let Some(id) = self.ids.iter().find(|id| !id.is_valid()) {
            return Err(Error::Validation(format!("Invalid item id {:?}", id)));
        }
        Ok(())
    }

    fn write_elements(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        self.property_set.write_to_xml(writer, "ItemShape")?;
        writer.write_start_element(XmlNamespace::Messages, "ItemIds");
        for id in &self.ids {
            id.write_to_xml(writer, XmlNamespace::Types, "ItemId")?;
        }
        writer.write_end_element()
    }

    fn expected_message_count(&self) -> usize {
        self.ids.len()
    }

    fn read_message_element(
        &mut self,
        index: usize,
        reader: &mut EwsXmlReader<'_>,
        context: &ResponseContext<'_>,
    ) -> Result<bool> {
        if !reader.is_start_element(XmlNamespace::Messages, "Items") {
            return Ok(false);
        }
        let property_set = &self.property_set;
        let slot = self
            .items
            .get_mut(index)
            .ok_or_else(|| Error::Deserialization(format!("Unexpected response message {}", index)))?;
        read_objects(reader, "Items", |reader| {
            let schema = context
                .registry
                .schema_for_element(reader.local_name())
                .unwrap_or_else(|| context.registry.item());
            let mut item = Item::new(Arc::clone(schema), context.version);
            item.object_mut()
                .load_from_xml(reader, Some(property_set), true)?;
            *slot = Some(item);
            Ok(())
        })?;
        Ok(true)
    }

    fn finish(&mut self, _messages: Vec<ResponseMessage>) -> Result<Vec<Item>> {
        std::mem::take(&mut self.items)
            .into_iter()
            .enumerate()
            .map(|(index, item)| item.ok_or_else(|| missing_object("item", index)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ServiceErrorSource;
    use crate::property::types::PhoneNumberKey;
    use crate::schema::tables::item;
    use crate::service::requests::testing::{envelope, recording_service, recording_service_at};

    #[test]
    fn test_get_message_and_contact() {
        let response = envelope(
            "GetItemResponse",
            concat!(
                r#"<m:GetItemResponseMessage ResponseClass="Success"><m:ResponseCode>NoError</m:ResponseCode><m:Items>"#,
                r#"<t:Message><t:ItemId Id="M1" ChangeKey="CK1"/><t:Subject>Lunch</t:Subject><t:Body BodyType="Text">Noon?</t:Body><t:ProposedNewField>ignored</t:ProposedNewField><t:IsRead>true</t:IsRead></t:Message>"#,
                r#"</m:Items></m:GetItemResponseMessage>"#,
                r#"<m:GetItemResponseMessage ResponseClass="Success"><m:ResponseCode>NoError</m:ResponseCode><m:Items>"#,
                r#"<t:Contact><t:ItemId Id="C1"/><t:GivenName>Ann</t:GivenName><t:PhoneNumbers><t:Entry Key="MobilePhone">555</t:Entry></t:PhoneNumbers></t:Contact>"#,
                r#"</m:Items></m:GetItemResponseMessage>"#
            ),
        );
        let (service, sent) = recording_service(response);
        let mut request = GetItem::new(
            vec![ServiceId::new("M1"), ServiceId::new("C1")],
            PropertySet::first_class_properties(),
        );
        let mut items = service.execute(&mut request).unwrap();

        assert!(sent.lock()[0].contains(
            r#"<m:ItemShape><t:BaseShape>AllProperties</t:BaseShape></m:ItemShape><m:ItemIds><t:ItemId Id="M1"/><t:ItemId Id="C1"/></m:ItemIds>"#
        ));

        let message = &items[0];
        assert_eq!(message.schema().xml_element_name(), "Message");
        assert_eq!(message.subject().unwrap(), Some("Lunch"));
        assert_eq!(message.body().unwrap().map(|body| body.content()), Some("Noon?"));
        assert_eq!(message.is_read().unwrap(), Some(true));
        assert!(!message.is_dirty());

        let contact = &mut items[1];
        assert_eq!(contact.schema().xml_element_name(), "Contact");
        assert_eq!(contact.given_name().unwrap(), Some("Ann"));
        assert_eq!(
            contact
                .phone_numbers_mut()
                .unwrap()
                .get(PhoneNumberKey::MobilePhone)
                .map(String::as_str),
            Some("555")
        );
    }

    #[test]
    fn test_id_only_leaves_other_properties_unloaded() {
        let response = envelope(
            "GetItemResponse",
            r#"<m:GetItemResponseMessage ResponseClass="Success"><m:ResponseCode>NoError</m:ResponseCode><m:Items><t:Message><t:ItemId Id="M1"/><t:Subject>Lunch</t:Subject></t:Message></m:Items></m:GetItemResponseMessage>"#,
        );
        let (service, _) = recording_service(response);
        let items = service
            .execute(&mut GetItem::new(vec![ServiceId::new("M1")], PropertySet::id_only()))
            .unwrap();
        assert!(matches!(items[0].subject(), Err(Error::PropertyNotLoaded(_))));
    }

    #[test]
    fn test_item_not_found() {
        let response = envelope(
            "GetItemResponse",
            r#"<m:GetItemResponseMessage ResponseClass="Error"><m:MessageText>The specified object was not found in the store.</m:MessageText><m:ResponseCode>ErrorItemNotFound</m:ResponseCode><m:DescriptiveLinkKey>0</m:DescriptiveLinkKey><m:Items/></m:GetItemResponseMessage>"#,
        );
        let (service, _) = recording_service(response);
        let err = service
            .execute(&mut GetItem::new(vec![ServiceId::new("gone")], PropertySet::id_only()))
            .unwrap_err();
        let remote = err.service_error().unwrap();
        assert_eq!(remote.code, "ErrorItemNotFound");
        assert_eq!(remote.source, ServiceErrorSource::ResponseMessage);
    }

    #[test]
    fn test_unsupported_property_fails_before_sending() {
        let (service, sent) = recording_service_at(ExchangeVersion::Exchange2007Sp1, String::new());
        let mut request = GetItem::new(
            vec![ServiceId::new("M1")],
            PropertySet::id_only().with_property(&item::UNIQUE_BODY),
        );
        assert!(service.execute(&mut request).unwrap_err().is_version_mismatch());
        assert!(sent.lock().is_empty());
    }
}
