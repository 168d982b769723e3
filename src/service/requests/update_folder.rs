use crate::common::error::{Error, Result};
use crate::common::version::ExchangeVersion;
use crate::common::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace};
use crate::service::object::{Folder, ServiceObject};
use crate::service::request::{ResponseContext, ServiceRequest};
use crate::service::requests::{empty_slots, stage_object};
use crate::service::response::ResponseMessage;

/// Send the pending changes of existing folders.
#[derive(Debug)]
pub struct UpdateFolder {
    folders: Vec<Folder>,
    dirty: Vec<usize>,
    staged: Vec<Option<ServiceObject>>,
}

impl UpdateFolder {
    pub fn new(folders: Vec<Folder>) -> Self {
        let dirty = folders
            .iter()
            .enumerate()
            .filter(|(_, folder)| folder.is_dirty())
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        Self {
            staged: empty_slots(dirty.len()),
            folders,
            dirty,
        }
    }

    /// Take the folders back; empty after a successful call.
    pub fn into_folders(self) -> Vec<Folder> {
        self.folders
    }
}

impl ServiceRequest for UpdateFolder {
    type Response = Vec<Folder>;

    const ELEMENT: &'static str = "UpdateFolder";
    const RESPONSE_ELEMENT: &'static str = "UpdateFolderResponse";
    const RESPONSE_MESSAGE_ELEMENT: &'static str = "UpdateFolderResponseMessage";

    fn validate(&self, _version: ExchangeVersion) -> Result<()> {
        if self.dirty.is_empty() {
            return Err(Error::Validation("No folder has pending changes".to_string()));
        }
        if self.dirty.iter().any(|&index| self.folders[index].is_new()) {
            return Err(Error::Validation(
                "New folders must be created before they can be updated".to_string(),
            ));
        }
        Ok(())
    }

    fn write_elements(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        writer.write_start_element(XmlNamespace::Messages, "FolderChanges");
        for &index in &self.dirty {
            self.folders[index].object().write_update_to_xml(writer)?;
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
        if !reader.is_start_element(XmlNamespace::Messages, "Folders") {
            return Ok(false);
        }
        let folder = self.dirty.get(index).and_then(|&position| self.folders.get(position));
        let (Some(folder), Some(slot)) = (folder, self.staged.get_mut(index)) else {
            return Err(Error::Deserialization(format!(
                "Unexpected response message {}",
                index
            )));
        };
        *slot = stage_object(reader, "Folders", folder.object())?;
        Ok(true)
    }

    fn finish(&mut self, _messages: Vec<ResponseMessage>) -> Result<Vec<Folder>> {
        let staged = std::mem::take(&mut self.staged);
        for (&position, staged) in self.dirty.iter().zip(staged) {
            let object = self.folders[position].object_mut();
            match staged {
                Some(staged) => object.absorb(staged),
                None => object.reset_change_log(),
            }
        }
        Ok(std::mem::take(&mut self.folders))
    }
}
