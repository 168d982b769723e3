//! Folder schema, in the element order of `FolderType`.

use crate::common::version::ExchangeVersion::Exchange2007Sp1;
use crate::property::types::{ExtendedPropertyCollection, ServiceId};
use crate::schema::codec::ScalarKind;
use crate::schema::definition::{PropertyDefinition, default_instance};
use crate::schema::flags::PropertyDefinitionFlags as F;
use crate::schema::registry::{Schema, SchemaBuilder, SchemaTarget};

pub static FOLDER_ID: PropertyDefinition = PropertyDefinition::complex(
    "FolderId",
    "folder:FolderId",
    default_instance::<ServiceId>,
    F::CAN_FIND,
    Exchange2007Sp1,
);

pub static PARENT_FOLDER_ID: PropertyDefinition = PropertyDefinition::complex(
    "ParentFolderId",
    "folder:ParentFolderId",
    default_instance::<ServiceId>,
    F::CAN_FIND,
    Exchange2007Sp1,
);

pub static FOLDER_CLASS: PropertyDefinition = PropertyDefinition::scalar(
    "FolderClass",
    "folder:FolderClass",
    ScalarKind::String,
    F::CAN_SET.union(F::CAN_UPDATE).union(F::CAN_FIND),
    Exchange2007Sp1,
);

pub static DISPLAY_NAME: PropertyDefinition = PropertyDefinition::scalar(
    "DisplayName",
    "folder:DisplayName",
    ScalarKind::String,
    F::REQUIRED,
    Exchange2007Sp1,
);

pub static TOTAL_COUNT: PropertyDefinition = PropertyDefinition::scalar(
    "TotalCount",
    "folder:TotalCount",
    ScalarKind::Integer,
    F::CAN_FIND,
    Exchange2007Sp1,
);

pub static CHILD_FOLDER_COUNT: PropertyDefinition = PropertyDefinition::scalar(
    "ChildFolderCount",
    "folder:ChildFolderCount",
    ScalarKind::Integer,
    F::CAN_FIND,
    Exchange2007Sp1,
);

pub static EXTENDED_PROPERTY: PropertyDefinition = PropertyDefinition::collection(
    "ExtendedProperty",
    "",
    default_instance::<ExtendedPropertyCollection>,
    F::AUTO_INSTANTIATE_ON_READ
        .union(F::REUSE_INSTANCE)
        .union(F::CAN_SET)
        .union(F::CAN_UPDATE)
        .union(F::CAN_DELETE),
    Exchange2007Sp1,
)
.without_field_uri();

pub static UNREAD_COUNT: PropertyDefinition = PropertyDefinition::scalar(
    "UnreadCount",
    "folder:UnreadCount",
    ScalarKind::Integer,
    F::CAN_FIND,
    Exchange2007Sp1,
);

pub fn schema() -> Schema {
    SchemaBuilder::new("Folder", "Folder", SchemaTarget::Folder)
        .register(&FOLDER_ID)
        .register(&PARENT_FOLDER_ID)
        .register(&FOLDER_CLASS)
        .register(&DISPLAY_NAME)
        .register(&TOTAL_COUNT)
        .register(&CHILD_FOLDER_COUNT)
        .register(&EXTENDED_PROPERTY)
        .register(&UNREAD_COUNT)
        .id(&FOLDER_ID)
        .build()
}
