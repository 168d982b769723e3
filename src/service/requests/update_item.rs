use crate::common::error::{Error, Result};
use crate::common::version::ExchangeVersion;
use crate::common::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace};
use crate::service::object::{Item, ServiceObject};
use crate::service::request::{ResponseContext, ServiceRequest};
use crate::service::requests::{
    ConflictResolutionMode, FolderIdRef, MessageDisposition, empty_slots, stage_object,
};
use crate::service::response::ResponseMessage;

/// Send the pending changes of existing items.
///
/// Only items with changes are written; all items are handed back, the
/// updated ones with refreshed change keys and empty change logs. After a
/// failed call every item still carries its changes.
#[derive(Debug)]
pub struct UpdateItem {
    items: Vec<Item>,
    dirty: Vec<usize>,
    staged: Vec<Option<ServiceObject>>,
    conflict_resolution: ConflictResolutionMode,
    disposition: Option<MessageDisposition>,
    saved_item_folder: Option<FolderIdRef>,
}

impl UpdateItem {
    pub fn new(items: Vec<Item>) -> Self {
        let dirty = items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_dirty())
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        Self {
            staged: empty_slots(dirty.len()),
            items,
            dirty,
            conflict_resolution: ConflictResolutionMode::default(),
            disposition: None,
            saved_item_folder: None,
        }
    }

    pub fn with_conflict_resolution(mut self, mode: ConflictResolutionMode) -> Self {
        self.conflict_resolution = mode;
        self
    }

    /// Required when a changed item is a message.
    pub fn with_disposition(mut self, disposition: MessageDisposition) -> Self {
        self.disposition = Some(disposition);
        self
    }

    pub fn with_saved_item_folder(mut self, folder: impl Into<FolderIdRef>) -> Self {
        self.saved_item_folder = Some(folder.into());
        self
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Take the items back; empty after a successful call.
    pub fn into_items(self) -> Vec<Item> {
        self.items
    }

    fn dirty_items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.dirty.iter().map(|&index| &self.items[index])
    }
}

impl ServiceRequest for UpdateItem {
    type Response = Vec<Item>;

    const ELEMENT: &'static str = "UpdateItem";
    const RESPONSE_ELEMENT: &'static str = "UpdateItemResponse";
    const RESPONSE_MESSAGE_ELEMENT: &'static str = "UpdateItemResponseMessage";

    fn validate(&self, _version: ExchangeVersion) -> Result<()> {
        if self.dirty.is_empty() {
            return Err(Error::Validation("No item has pending changes".to_string()));
        }
        if self.dirty_items().any(Item::is_new) {
            return Err(Error::Validation(
                "New items must be created before they can be updated".to_string(),
            ));
        }
        let has_message = self
            .dirty_items()
            .any(|item| item.schema().xml_element_name() == "Message");
        if has_message && self.disposition.is_none() {
            return Err(Error::Validation(
                "A message disposition is required when updating messages".to_string(),
            ));
        }
        Ok(())
    }

    fn write_attributes(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        writer.write_attribute("ConflictResolution", self.conflict_resolution.as_str())?;
        if let Some(disposition) = self.disposition {
            writer.write_attribute("MessageDisposition", disposition.as_str())?;
        }
        Ok(())
    }

    fn write_elements(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        if let Some(folder) = &self.saved_item_folder {
            writer.write_start_element(XmlNamespace::Messages, "SavedItemFolderId");
            folder.write_to_xml(writer)?;
            writer.write_end_element()?;
        }
        writer.write_start_element(XmlNamespace::Messages, "ItemChanges");
        for item in self.dirty_items() {
            item.object().write_update_to_xml(writer)?;
        }
        writer.write_end_element()
    }

    fn expected_message_count(&self) -> usize {
        self.dirty.len()
    }

    fn read_message_element(
        &mut self,
        index: usize,
        reader: &mut EwsXmlReader<'_>,
        _context: &ResponseContext<'_>,
    ) -> Result<bool> {
        if !reader.is_start_element(XmlNamespace::Messages, "Items") {
            return Ok(false);
        }
        let item = self.dirty.get(index).and_then(|&position| self.items.get(position));
        let (Some(item), Some(slot)) = (item, self.staged.get_mut(index)) else {
            return Err(Error::Deserialization(format!(
                "Unexpected response message {}",
                index
            )));
        };
        *slot = stage_object(reader, "Items", item.object())?;
        Ok(true)
    }

    fn finish(&mut self, _messages: Vec<ResponseMessage>) -> Result<Vec<Item>> {
        let staged = std::mem::take(&mut self.staged);
        for (&position, staged) in self.dirty.iter().zip(staged) {
            let object = self.items[position].object_mut();
            match staged {
                Some(staged) => object.absorb(staged),
                None => object.reset_change_log(),
            }
        }
        Ok(std::mem::take(&mut self.items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::types::EmailAddress;
    use crate::service::exchange::ExchangeService;
    use crate::service::requests::testing::{TYPES_NS, envelope, recording_service};

    fn loaded_message(service: &ExchangeService, id: &str) -> Item {
        let xml = format!(
            r#"<t:Message xmlns:t="{}"><t:ItemId Id="{}" ChangeKey="CK0"/><t:Subject>Draft</t:Subject><t:ToRecipients><t:Mailbox><t:EmailAddress>ann@contoso.com</t:EmailAddress></t:Mailbox></t:ToRecipients></t:Message>"#,
            TYPES_NS, id
        );
        let mut reader = EwsXmlReader::new(&xml);
        reader.read_significant().unwrap();
        let mut item = service.new_message();
        item.object_mut().load_from_xml(&mut reader, None, true).unwrap();
        item
    }

    #[test]
    fn test_only_dirty_items_are_sent() {
        let response = envelope(
            "UpdateItemResponse",
            r#"<m:UpdateItemResponseMessage ResponseClass="Success"><m:ResponseCode>NoError</m:ResponseCode><m:Items><t:Message><t:ItemId Id="M2" ChangeKey="CK1"/></t:Message></m:Items><m:ConflictResults><m:Count>0</m:Count></m:ConflictResults></m:UpdateItemResponseMessage>"#,
        );
        let (service, sent) = recording_service(response);
        let untouched = loaded_message(&service, "M1");
        let mut changed = loaded_message(&service, "M2");
        changed
            .to_recipients_mut()
            .unwrap()
            .add(EmailAddress::new("bob@contoso.com"));

        let mut request = UpdateItem::new(vec![untouched, changed])
            .with_conflict_resolution(ConflictResolutionMode::AlwaysOverwrite)
            .with_disposition(MessageDisposition::SaveOnly);
        let items = service.execute(&mut request).unwrap();

        let body = &sent.lock()[0];
        assert!(body.contains(
            r#"<m:UpdateItem ConflictResolution="AlwaysOverwrite" MessageDisposition="SaveOnly"><m:ItemChanges><t:ItemChange><t:ItemId Id="M2" ChangeKey="CK0"/>"#
        ));
        assert!(body.contains(concat!(
            r#"<t:AppendToItemField><t:FieldURI FieldURI="message:ToRecipients"/>"#,
            r#"<t:Message><t:ToRecipients><t:Mailbox><t:EmailAddress>bob@contoso.com</t:EmailAddress></t:Mailbox></t:ToRecipients></t:Message>"#,
            "</t:AppendToItemField>"
        )));
        assert!(!body.contains(r#"Id="M1""#));

        assert_eq!(items.len(), 2);
        assert_eq!(items[1].id().and_then(|id| id.change_key()), Some("CK1"));
        assert_eq!(items[0].id().and_then(|id| id.change_key()), Some("CK0"));
        assert!(!items[1].is_dirty());
        assert_eq!(items[1].subject().unwrap(), Some("Draft"));
    }

    #[test]
    fn test_nothing_to_update() {
        let (service, sent) = recording_service(String::new());
        let item = loaded_message(&service, "M1");
        let err = service
            .execute(&mut UpdateItem::new(vec![item]).with_disposition(MessageDisposition::SaveOnly))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(sent.lock().is_empty());
    }

    #[test]
    fn test_message_update_requires_disposition() {
        let (service, _) = recording_service(String::new());
        let mut item = loaded_message(&service, "M1");
        item.set_subject("Final").unwrap();
        assert!(matches!(
            service.execute(&mut UpdateItem::new(vec![item])),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_partial_failure_keeps_every_change() {
        let response = envelope(
            "UpdateItemResponse",
            concat!(
                r#"<m:UpdateItemResponseMessage ResponseClass="Success"><m:ResponseCode>NoError</m:ResponseCode><m:Items><t:Message><t:ItemId Id="M1" ChangeKey="CK1"/></t:Message></m:Items></m:UpdateItemResponseMessage>"#,
                r#"<m:UpdateItemResponseMessage ResponseClass="Error"><m:MessageText>The change key is out of date.</m:MessageText><m:ResponseCode>ErrorIrresolvableConflict</m:ResponseCode><m:Items/></m:UpdateItemResponseMessage>"#
            ),
        );
        let (service, _) = recording_service(response);
        let mut first = loaded_message(&service, "M1");
        first.set_subject("One").unwrap();
        let mut second = loaded_message(&service, "M2");
        second.set_subject("Two").unwrap();

        let mut request = UpdateItem::new(vec![first, second])
            .with_disposition(MessageDisposition::SaveOnly);
        let err = service.execute(&mut request).unwrap_err();
        assert_eq!(
            err.service_error().map(|e| e.code.as_str()),
            Some("ErrorIrresolvableConflict")
        );

        let items = request.into_items();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(Item::is_dirty));
        // The successful message is not applied either
        assert_eq!(items[0].id().and_then(|id| id.change_key()), Some("CK0"));
        assert_eq!(items[0].subject().unwrap(), Some("One"));
    }
}
