use crate::common::error::{Error, Result};
use crate::common::version::ExchangeVersion;
use crate::common::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace};
use crate::service::object::{Item, ServiceObject};
use crate::service::request::{ResponseContext, ServiceRequest};
use crate::service::requests::{FolderIdRef, MessageDisposition, empty_slots, stage_object};
use crate::service::response::ResponseMessage;

/// Save new items on the server.
///
/// The returned items carry their server ids and have empty change logs.
/// A failed call leaves the items in the request, see
/// [`into_items`](Self::into_items).
#[derive(Debug)]
pub struct CreateItem {
    items: Vec<Item>,
    staged: Vec<Option<ServiceObject>>,
    disposition: Option<MessageDisposition>,
    saved_item_folder: Option<FolderIdRef>,
}

impl CreateItem {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            staged: empty_slots(items.len()),
            items,
            disposition: None,
            saved_item_folder: None,
        }
    }

    /// Required when any item is a message.
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
}

impl ServiceRequest for CreateItem {
    type Response = Vec<Item>;

    const ELEMENT: &'static str = "CreateItem";
    const RESPONSE_ELEMENT: &'static str = "CreateItemResponse";
    const RESPONSE_MESSAGE_ELEMENT: &'static str = "CreateItemResponseMessage";

    fn validate(&self, _version: ExchangeVersion) -> Result<()> {
        if self.items.is_empty() {
            return Err(Error::Validation("CreateItem needs at least one item".to_string()));
        }
        if self.items.iter().any(|item| !item.is_new()) {
            return Err(Error::Validation(
                "CreateItem only accepts items that were never saved".to_string(),
            ));
        }
        let has_message = self
            .items
            .iter()
            .any(|item| item.schema().xml_element_name() == "Message");
        if has_message && self.disposition.is_none() {
            return Err(Error::Validation(
                "A message disposition is required when creating messages".to_string(),
            ));
        }
        if self.disposition == Some(MessageDisposition::SendOnly) && self.saved_item_folder.is_some() {
            return Err(Error::Validation(
                "A saved item folder cannot be combined with SendOnly".to_string(),
            ));
        }
        Ok(())
    }

    fn write_attributes(&self, writer: &mut EwsXmlWriter) -> Result<()> {
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
        writer.write_start_element(XmlNamespace::Messages, "Items");
        for item in &self.items {
            item.object().write_to_xml(writer)?;
        }
        writer.write_end_element()
    }

    fn expected_message_count(&self) -> usize {
        self.items.len()
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
        let (Some(item), Some(slot)) = (self.items.get(index), self.staged.get_mut(index)) else {
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
        for (item, staged) in self.items.iter_mut().zip(staged) {
            match staged {
                Some(staged) => item.object_mut().absorb(staged),
                // Sent-only messages come back without an id
                None => item.object_mut().reset_change_log(),
            }
        }
        Ok(std::mem::take(&mut self.items))
    }
}
