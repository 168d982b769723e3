//! Item and folder operations.
//!
//! Each request owns the objects it works on and hands them back, loaded
//! or refreshed, as its response. Response data is staged and applied only
//! once the whole call succeeded, so after a failure the request still
//! holds every object with its pending changes.

mod create_item;
mod get_folder;
mod get_item;
mod update_folder;
mod update_item;

pub use create_item::CreateItem;
pub use get_folder::GetFolder;
pub use get_item::GetItem;
pub use update_folder::UpdateFolder;
pub use update_item::UpdateItem;

use crate::common::error::{Error, Result};
use crate::common::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace, XmlNodeType};
use crate::property::ComplexProperty;
use crate::property::types::ServiceId;
use crate::schema::PropertySet;
use crate::service::object::ServiceObject;

/// Folder names every mailbox has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownFolder {
    Root,
    MsgFolderRoot,
    Inbox,
    Drafts,
    SentItems,
    DeletedItems,
    Outbox,
    JunkEmail,
    Calendar,
    Contacts,
    Tasks,
    Notes,
    Journal,
}

impl WellKnownFolder {
    pub const fn as_str(self) -> &'static str {
        match self {
            WellKnownFolder::Root => "root",
            WellKnownFolder::MsgFolderRoot => "msgfolderroot",
            WellKnownFolder::Inbox => "inbox",
            WellKnownFolder::Drafts => "drafts",
            WellKnownFolder::SentItems => "sentitems",
            WellKnownFolder::DeletedItems => "deleteditems",
            WellKnownFolder::Outbox => "outbox",
            WellKnownFolder::JunkEmail => "junkemail",
            WellKnownFolder::Calendar => "calendar",
            WellKnownFolder::Contacts => "contacts",
            WellKnownFolder::Tasks => "tasks",
            WellKnownFolder::Notes => "notes",
            WellKnownFolder::Journal => "journal",
        }
    }
}

/// A folder addressed by id or by well-known name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderIdRef {
    Id(ServiceId),
    Distinguished(WellKnownFolder),
}

impl FolderIdRef {
    pub fn write_to_xml(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        match self {
            FolderIdRef::Id(id) => id.write_to_xml(writer, XmlNamespace::Types, "FolderId"),
            FolderIdRef::Distinguished(folder) => {
                writer.write_start_element(XmlNamespace::Types, "DistinguishedFolderId");
                writer.write_attribute("Id", folder.as_str())?;
                writer.write_end_element()
            },
        }
    }
}

impl From<ServiceId> for FolderIdRef {
    fn from(id: ServiceId) -> Self {
        FolderIdRef::Id(id)
    }
}

impl From<WellKnownFolder> for FolderIdRef {
    fn from(folder: WellKnownFolder) -> Self {
        FolderIdRef::Distinguished(folder)
    }
}

/// What the server does with a message after saving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDisposition {
    SaveOnly,
    SendOnly,
    SendAndSaveCopy,
}

impl MessageDisposition {
    pub const fn as_str(self) -> &'static str {
        match self {
            MessageDisposition::SaveOnly => "SaveOnly",
            MessageDisposition::SendOnly => "SendOnly",
            MessageDisposition::SendAndSaveCopy => "SendAndSaveCopy",
        }
    }
}

/// How the server resolves concurrent modifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictResolutionMode {
    NeverOverwrite,
    #[default]
    AutoResolve,
    AlwaysOverwrite,
}

impl ConflictResolutionMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ConflictResolutionMode::NeverOverwrite => "NeverOverwrite",
            ConflictResolutionMode::AutoResolve => "AutoResolve",
            ConflictResolutionMode::AlwaysOverwrite => "AlwaysOverwrite",
        }
    }
}

/// Visit each object element inside `<m:{container}>`.
///
/// `each` is called with the cursor on an object start tag and must leave
/// it on that object's end tag. Ends on the container's end tag.
pub(crate) fn read_objects<F>(
    reader: &mut EwsXmlReader<'_>,
    container: &str,
    mut each: F,
) -> Result<()>
where
    F: FnMut(&mut EwsXmlReader<'_>) -> Result<()>,
{
    reader.ensure_current_node_is_start_element(XmlNamespace::Messages, container)?;
    if reader.is_empty_element() {
        return reader.read();
    }
    loop {
        reader.read_significant()?;
        match reader.node_type() {
            XmlNodeType::StartElement => each(reader)?,
            XmlNodeType::EndElement => {
                return reader.ensure_current_node_is_end_element(XmlNamespace::Messages, container);
            },
            XmlNodeType::Text => {},
            XmlNodeType::EndOfDocument | XmlNodeType::None => {
                return Err(Error::Deserialization(format!(
                    "Unexpected end of document inside <m:{}>",
                    container
                )));
            },
        }
    }
}

/// Read the object inside `<m:{container}>` into a staging copy of `object`.
///
/// Only ids and change keys are kept. `None` when the container is empty.
pub(crate) fn stage_object(
    reader: &mut EwsXmlReader<'_>,
    container: &str,
    object: &ServiceObject,
) -> Result<Option<ServiceObject>> {
    let id_only = PropertySet::id_only();
    let mut staged = object.staging();
    let mut found = false;
    read_objects(reader, container, |reader| {
        found = true;
        staged.load_from_xml(reader, Some(&id_only), false)
    })?;
    Ok(found.then_some(staged))
}

/// One empty slot per expected response message.
pub(crate) fn empty_slots<T>(count: usize) -> Vec<Option<T>> {
    std::iter::repeat_with(|| None).take(count).collect()
}

/// Fail when a message for an object carried no object element.
pub(crate) fn missing_object(kind: &str, index: usize) -> Error {
    Error::Deserialization(format!("Response message {} carried no {}", index, kind))
}
