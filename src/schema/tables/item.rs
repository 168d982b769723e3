//! Item schema: properties shared by every item type.
//!
//! Declared in the element order of `ItemType` in types.xsd.

use crate::common::version::ExchangeVersion::{Exchange2007Sp1, Exchange2010};
use crate::property::types::{ExtendedPropertyCollection, MessageBody, ServiceId, StringList};
use crate::schema::codec::ScalarKind;
use crate::schema::definition::{PropertyDefinition, default_instance};
use crate::schema::flags::{FlagGate, PropertyDefinitionFlags as F};
use crate::schema::registry::{Schema, SchemaBuilder, SchemaTarget};

const SET_UPDATE_FIND: F = F::CAN_SET.union(F::CAN_UPDATE).union(F::CAN_FIND);

pub static MIME_CONTENT: PropertyDefinition = PropertyDefinition::scalar(
    "MimeContent",
    "item:MimeContent",
    ScalarKind::Base64,
    F::CAN_SET
        .union(F::CAN_UPDATE)
        .union(F::MUST_BE_EXPLICITLY_LOADED),
    Exchange2007Sp1,
);

pub static ITEM_ID: PropertyDefinition = PropertyDefinition::complex(
    "ItemId",
    "item:ItemId",
    default_instance::<ServiceId>,
    F::CAN_FIND,
    Exchange2007Sp1,
);

pub static PARENT_FOLDER_ID: PropertyDefinition = PropertyDefinition::complex(
    "ParentFolderId",
    "item:ParentFolderId",
    default_instance::<ServiceId>,
    F::CAN_FIND,
    Exchange2007Sp1,
);

pub static ITEM_CLASS: PropertyDefinition = PropertyDefinition::scalar(
    "ItemClass",
    "item:ItemClass",
    ScalarKind::String,
    SET_UPDATE_FIND,
    Exchange2007Sp1,
);

pub static SUBJECT: PropertyDefinition = PropertyDefinition::scalar(
    "Subject",
    "item:Subject",
    ScalarKind::String,
    F::EDITABLE,
    Exchange2007Sp1,
);

pub const SENSITIVITY_VALUES: &[&str] = &["Normal", "Personal", "Private", "Confidential"];

pub static SENSITIVITY: PropertyDefinition = PropertyDefinition::scalar(
    "Sensitivity",
    "item:Sensitivity",
    ScalarKind::Enum(SENSITIVITY_VALUES),
    SET_UPDATE_FIND,
    Exchange2007Sp1,
);

pub static BODY: PropertyDefinition = PropertyDefinition::complex(
    "Body",
    "item:Body",
    default_instance::<MessageBody>,
    F::CAN_SET.union(F::CAN_UPDATE).union(F::CAN_DELETE),
    Exchange2007Sp1,
);

pub static DATE_TIME_RECEIVED: PropertyDefinition = PropertyDefinition::scalar(
    "DateTimeReceived",
    "item:DateTimeReceived",
    ScalarKind::DateTime,
    F::CAN_FIND,
    Exchange2007Sp1,
);

pub static SIZE: PropertyDefinition = PropertyDefinition::scalar(
    "Size",
    "item:Size",
    ScalarKind::Integer,
    F::CAN_FIND,
    Exchange2007Sp1,
);

pub static CATEGORIES: PropertyDefinition = PropertyDefinition::complex(
    "Categories",
    "item:Categories",
    default_instance::<StringList>,
    F::AUTO_INSTANTIATE_ON_READ.union(F::EDITABLE),
    Exchange2007Sp1,
);

pub const IMPORTANCE_VALUES: &[&str] = &["Low", "Normal", "High"];

pub static IMPORTANCE: PropertyDefinition = PropertyDefinition::scalar(
    "Importance",
    "item:Importance",
    ScalarKind::Enum(IMPORTANCE_VALUES),
    SET_UPDATE_FIND,
    Exchange2007Sp1,
);

pub static IN_REPLY_TO: PropertyDefinition = PropertyDefinition::scalar(
    "InReplyTo",
    "item:InReplyTo",
    ScalarKind::String,
    F::EDITABLE,
    Exchange2007Sp1,
);

pub static IS_SUBMITTED: PropertyDefinition = PropertyDefinition::scalar(
    "IsSubmitted",
    "item:IsSubmitted",
    ScalarKind::Boolean,
    F::CAN_FIND,
    Exchange2007Sp1,
);

pub static IS_DRAFT: PropertyDefinition = PropertyDefinition::scalar(
    "IsDraft",
    "item:IsDraft",
    ScalarKind::Boolean,
    F::CAN_FIND,
    Exchange2007Sp1,
);

pub static IS_FROM_ME: PropertyDefinition = PropertyDefinition::scalar(
    "IsFromMe",
    "item:IsFromMe",
    ScalarKind::Boolean,
    F::CAN_FIND,
    Exchange2007Sp1,
);

pub static IS_RESEND: PropertyDefinition = PropertyDefinition::scalar(
    "IsResend",
    "item:IsResend",
    ScalarKind::Boolean,
    F::CAN_FIND,
    Exchange2007Sp1,
);

pub static IS_UNMODIFIED: PropertyDefinition = PropertyDefinition::scalar(
    "IsUnmodified",
    "item:IsUnmodified",
    ScalarKind::Boolean,
    F::CAN_FIND,
    Exchange2007Sp1,
);

pub static DATE_TIME_SENT: PropertyDefinition = PropertyDefinition::scalar(
    "DateTimeSent",
    "item:DateTimeSent",
    ScalarKind::DateTime,
    F::CAN_FIND,
    Exchange2007Sp1,
);

pub static DATE_TIME_CREATED: PropertyDefinition = PropertyDefinition::scalar(
    "DateTimeCreated",
    "item:DateTimeCreated",
    ScalarKind::DateTime,
    F::CAN_FIND,
    Exchange2007Sp1,
);

pub static REMINDER_DUE_BY: PropertyDefinition = PropertyDefinition::scalar(
    "ReminderDueBy",
    "item:ReminderDueBy",
    ScalarKind::DateTime,
    SET_UPDATE_FIND,
    Exchange2007Sp1,
);

pub static REMINDER_IS_SET: PropertyDefinition = PropertyDefinition::scalar(
    "ReminderIsSet",
    "item:ReminderIsSet",
    ScalarKind::Boolean,
    SET_UPDATE_FIND,
    Exchange2007Sp1,
);

pub static REMINDER_MINUTES_BEFORE_START: PropertyDefinition = PropertyDefinition::scalar(
    "ReminderMinutesBeforeStart",
    "item:ReminderMinutesBeforeStart",
    ScalarKind::Integer,
    SET_UPDATE_FIND,
    Exchange2007Sp1,
);

pub static DISPLAY_CC: PropertyDefinition = PropertyDefinition::scalar(
    "DisplayCc",
    "item:DisplayCc",
    ScalarKind::String,
    F::CAN_FIND,
    Exchange2007Sp1,
);

pub static DISPLAY_TO: PropertyDefinition = PropertyDefinition::scalar(
    "DisplayTo",
    "item:DisplayTo",
    ScalarKind::String,
    F::CAN_FIND,
    Exchange2007Sp1,
);

pub static HAS_ATTACHMENTS: PropertyDefinition = PropertyDefinition::scalar(
    "HasAttachments",
    "item:HasAttachments",
    ScalarKind::Boolean,
    F::CAN_FIND,
    Exchange2007Sp1,
);

/// Repeated `t:ExtendedProperty` children, one per extended property.
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

pub static CULTURE: PropertyDefinition = PropertyDefinition::scalar(
    "Culture",
    "item:Culture",
    ScalarKind::String,
    SET_UPDATE_FIND,
    Exchange2007Sp1,
);

pub static LAST_MODIFIED_NAME: PropertyDefinition = PropertyDefinition::scalar(
    "LastModifiedName",
    "item:LastModifiedName",
    ScalarKind::String,
    F::CAN_FIND,
    Exchange2007Sp1,
);

pub static LAST_MODIFIED_TIME: PropertyDefinition = PropertyDefinition::scalar(
    "LastModifiedTime",
    "item:LastModifiedTime",
    ScalarKind::DateTime,
    F::CAN_FIND,
    Exchange2007Sp1,
);

/// Settable only when creating associated items on Exchange 2010 or later.
pub static IS_ASSOCIATED: PropertyDefinition = PropertyDefinition::scalar(
    "IsAssociated",
    "item:IsAssociated",
    ScalarKind::Boolean,
    F::CAN_SET.union(F::CAN_FIND),
    Exchange2007Sp1,
)
.with_gates(&[FlagGate::new(F::CAN_SET, Exchange2010)]);

pub static WEB_CLIENT_READ_FORM_QUERY_STRING: PropertyDefinition = PropertyDefinition::scalar(
    "WebClientReadFormQueryString",
    "item:WebClientReadFormQueryString",
    ScalarKind::String,
    F::CAN_FIND,
    Exchange2010,
);

pub static CONVERSATION_ID: PropertyDefinition = PropertyDefinition::complex(
    "ConversationId",
    "item:ConversationId",
    default_instance::<ServiceId>,
    F::CAN_FIND,
    Exchange2010,
);

pub static UNIQUE_BODY: PropertyDefinition = PropertyDefinition::complex(
    "UniqueBody",
    "item:UniqueBody",
    default_instance::<MessageBody>,
    F::MUST_BE_EXPLICITLY_LOADED,
    Exchange2010,
);

/// Item properties in wire order.
pub fn properties() -> [&'static PropertyDefinition; 33] {
    [
        &MIME_CONTENT,
        &ITEM_ID,
        &PARENT_FOLDER_ID,
        &ITEM_CLASS,
        &SUBJECT,
        &SENSITIVITY,
        &BODY,
        &DATE_TIME_RECEIVED,
        &SIZE,
        &CATEGORIES,
        &IMPORTANCE,
        &IN_REPLY_TO,
        &IS_SUBMITTED,
        &IS_DRAFT,
        &IS_FROM_ME,
        &IS_RESEND,
        &IS_UNMODIFIED,
        &DATE_TIME_SENT,
        &DATE_TIME_CREATED,
        &REMINDER_DUE_BY,
        &REMINDER_IS_SET,
        &REMINDER_MINUTES_BEFORE_START,
        &DISPLAY_CC,
        &DISPLAY_TO,
        &HAS_ATTACHMENTS,
        &EXTENDED_PROPERTY,
        &CULTURE,
        &LAST_MODIFIED_NAME,
        &LAST_MODIFIED_TIME,
        &IS_ASSOCIATED,
        &WEB_CLIENT_READ_FORM_QUERY_STRING,
        &CONVERSATION_ID,
        &UNIQUE_BODY,
    ]
}

pub fn schema() -> Schema {
    SchemaBuilder::new("Item", "Item", SchemaTarget::Item)
        .register_all(&properties())
        .id(&ITEM_ID)
        .build()
}
