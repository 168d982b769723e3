use crate::common::error::{Error, Result};
use crate::common::version::ExchangeVersion;
use crate::common::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace};
use crate::schema::PropertySet;
use crate::service::object::Folder;
use crate::service::request::{ResponseContext, ServiceRequest};
use crate::service::requests::{FolderIdRef, missing_object, read_objects};
use crate::service::response::ResponseMessage;
use std::sync::Arc;

/// Load folders by id or well-known name.
#[derive(Debug)]
pub struct GetFolder {
    ids: Vec<FolderIdRef>,
    property_set: PropertySet,
    folders: Vec<Option<Folder>>,
}

impl GetFolder {
    pub fn new(ids: Vec<FolderIdRef>, property_set: PropertySet) -> Self {
        let folders = ids.iter().map(|_| None).collect();
        Self {
            ids,
            property_set,
            folders,
        }
    }
}

impl ServiceRequest for GetFolder {
    type Response = Vec<Folder>;

    const ELEMENT: &'static str = "GetFolder";
    const RESPONSE_ELEMENT: &'static str = "GetFolderResponse";
    const RESPONSE_MESSAGE_ELEMENT: &'static str = "GetFolderResponseMessage";

    fn validate(&self, _version: ExchangeVersion) -> Result<()> {
        if self.ids.is_empty() {
            return Err(Error::Validation("GetFolder needs at least one id".to_string()));
        }
        Ok(())
    }

    fn write_elements(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        self.property_set.write_to_xml(writer, "FolderShape")?;
        writer.write_start_element(XmlNamespace::Messages, "FolderIds");
        for id in &self.ids {
            id.write_to_xml(writer)?;
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
        if !reader.is_start_element(XmlNamespace::Messages, "Folders") {
            return Ok(false);
        }
        let property_set = &self.property_set;
        let slot = self
            .folders
            .get_mut(index)
            .ok_or_else(|| Error::Deserialization(format!("Unexpected response message {}", index)))?;
        // CalendarFolder, ContactsFolder and SearchFolder share the folder schema
        read_objects(reader, "Folders", |reader| {
            let mut folder = Folder::new(Arc::clone(context.registry.folder()), context.version);
            folder
                .object_mut()
                .load_from_xml(reader, Some(property_set), true)?;
            *slot = Some(folder);
            Ok(())
        })?;
        Ok(true)
    }

    fn finish(&mut self, _messages: Vec<ResponseMessage>) -> Result<Vec<Folder>> {
        std::mem::take(&mut self.folders)
            .into_iter()
            .enumerate()
            .map(|(index, folder)| folder.ok_or_else(|| missing_object("folder", index)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::requests::WellKnownFolder;
    use crate::service::requests::testing::{envelope, recording_service};

    #[test]
    fn test_get_inbox() {
        let response = envelope(
            "GetFolderResponse",
            r#"<m:GetFolderResponseMessage ResponseClass="Success"><m:ResponseCode>NoError</m:ResponseCode><m:Folders><t:Folder><t:FolderId Id="F1" ChangeKey="AQAA"/><t:ParentFolderId Id="ROOT"/><t:FolderClass>IPF.Note</t:FolderClass><t:DisplayName>Inbox</t:DisplayName><t:TotalCount>42</t:TotalCount><t:ChildFolderCount>3</t:ChildFolderCount><t:UnreadCount>7</t:UnreadCount></t:Folder></m:Folders></m:GetFolderResponseMessage>"#,
        );
        let (service, sent) = recording_service(response);
        let mut request = GetFolder::new(
            vec![WellKnownFolder::Inbox.into()],
            PropertySet::first_class_properties(),
        );
        let folders = service.execute(&mut request).unwrap();

        assert!(sent.lock()[0].contains(
            r#"<m:FolderIds><t:DistinguishedFolderId Id="inbox"/></m:FolderIds>"#
        ));
        let inbox = &folders[0];
        assert_eq!(inbox.id().map(|id| id.id()), Some("F1"));
        assert_eq!(inbox.parent_folder_id().unwrap().map(|id| id.id()), Some("ROOT"));
        assert_eq!(inbox.display_name().unwrap(), Some("Inbox"));
        assert_eq!(inbox.folder_class().unwrap(), Some("IPF.Note"));
        assert_eq!(inbox.total_count().unwrap(), Some(42));
        assert_eq!(inbox.child_folder_count().unwrap(), Some(3));
        assert_eq!(inbox.unread_count().unwrap(), Some(7));
    }

    #[test]
    fn test_missing_folder_element() {
        let response = envelope(
            "GetFolderResponse",
            r#"<m:GetFolderResponseMessage ResponseClass="Success"><m:ResponseCode>NoError</m:ResponseCode><m:Folders/></m:GetFolderResponseMessage>"#,
        );
        let (service, _) = recording_service(response);
        let mut request = GetFolder::new(vec![WellKnownFolder::Inbox.into()], PropertySet::id_only());
        assert!(matches!(service.execute(&mut request), Err(Error::Deserialization(_))));
    }
}
