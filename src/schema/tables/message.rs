//! Message schema, in the element order of `MessageType`.

use crate::common::version::ExchangeVersion::Exchange2007Sp1;
use crate::property::types::{EmailAddress, EmailAddressCollection};
use crate::schema::codec::ScalarKind;
use crate::schema::definition::{PropertyDefinition, default_instance};
use crate::schema::flags::PropertyDefinitionFlags as F;
use crate::schema::registry::{Schema, SchemaBuilder, SchemaTarget};

const RECIPIENTS: F = F::AUTO_INSTANTIATE_ON_READ
    .union(F::CAN_SET)
    .union(F::CAN_UPDATE)
    .union(F::CAN_DELETE)
    .union(F::UPDATE_COLLECTION_ITEMS);

pub static SENDER: PropertyDefinition = PropertyDefinition::complex(
    "Sender",
    "message:Sender",
    default_instance::<EmailAddress>,
    F::EDITABLE,
    Exchange2007Sp1,
)
.contained("Mailbox");

pub static TO_RECIPIENTS: PropertyDefinition = PropertyDefinition::collection(
    "ToRecipients",
    "message:ToRecipients",
    default_instance::<EmailAddressCollection>,
    RECIPIENTS,
    Exchange2007Sp1,
);

pub static CC_RECIPIENTS: PropertyDefinition = PropertyDefinition::collection(
    "CcRecipients",
    "message:CcRecipients",
    default_instance::<EmailAddressCollection>,
    RECIPIENTS,
    Exchange2007Sp1,
);

pub static BCC_RECIPIENTS: PropertyDefinition = PropertyDefinition::collection(
    "BccRecipients",
    "message:BccRecipients",
    default_instance::<EmailAddressCollection>,
    RECIPIENTS,
    Exchange2007Sp1,
);

pub static IS_READ_RECEIPT_REQUESTED: PropertyDefinition = PropertyDefinition::scalar(
    "IsReadReceiptRequested",
    "message:IsReadReceiptRequested",
    ScalarKind::Boolean,
    F::EDITABLE,
    Exchange2007Sp1,
);

pub static IS_DELIVERY_RECEIPT_REQUESTED: PropertyDefinition = PropertyDefinition::scalar(
    "IsDeliveryReceiptRequested",
    "message:IsDeliveryReceiptRequested",
    ScalarKind::Boolean,
    F::EDITABLE,
    Exchange2007Sp1,
);

pub static CONVERSATION_INDEX: PropertyDefinition = PropertyDefinition::scalar(
    "ConversationIndex",
    "message:ConversationIndex",
    ScalarKind::Base64,
    F::CAN_FIND,
    Exchange2007Sp1,
);

pub static CONVERSATION_TOPIC: PropertyDefinition = PropertyDefinition::scalar(
    "ConversationTopic",
    "message:ConversationTopic",
    ScalarKind::String,
    F::CAN_FIND,
    Exchange2007Sp1,
);

pub static FROM: PropertyDefinition = PropertyDefinition::complex(
    "From",
    "message:From",
    default_instance::<EmailAddress>,
    F::EDITABLE,
    Exchange2007Sp1,
)
.contained("Mailbox");

pub static INTERNET_MESSAGE_ID: PropertyDefinition = PropertyDefinition::scalar(
    "InternetMessageId",
    "message:InternetMessageId",
    ScalarKind::String,
    F::CAN_FIND,
    Exchange2007Sp1,
);

pub static IS_READ: PropertyDefinition = PropertyDefinition::scalar(
    "IsRead",
    "message:IsRead",
    ScalarKind::Boolean,
    F::CAN_SET.union(F::CAN_UPDATE).union(F::CAN_FIND),
    Exchange2007Sp1,
);

pub static IS_RESPONSE_REQUESTED: PropertyDefinition = PropertyDefinition::scalar(
    "IsResponseRequested",
    "message:IsResponseRequested",
    ScalarKind::Boolean,
    F::EDITABLE,
    Exchange2007Sp1,
)
.nullable();

pub static REFERENCES: PropertyDefinition = PropertyDefinition::scalar(
    "References",
    "message:References",
    ScalarKind::String,
    F::EDITABLE,
    Exchange2007Sp1,
);

pub static REPLY_TO: PropertyDefinition = PropertyDefinition::collection(
    "ReplyTo",
    "message:ReplyTo",
    default_instance::<EmailAddressCollection>,
    F::AUTO_INSTANTIATE_ON_READ.union(F::EDITABLE),
    Exchange2007Sp1,
);

pub static RECEIVED_BY: PropertyDefinition = PropertyDefinition::complex(
    "ReceivedBy",
    "message:ReceivedBy",
    default_instance::<EmailAddress>,
    F::CAN_FIND,
    Exchange2007Sp1,
)
.contained("Mailbox");

pub static RECEIVED_REPRESENTING: PropertyDefinition = PropertyDefinition::complex(
    "ReceivedRepresenting",
    "message:ReceivedRepresenting",
    default_instance::<EmailAddress>,
    F::CAN_FIND,
    Exchange2007Sp1,
)
.contained("Mailbox");

pub fn schema(item: &Schema) -> Schema {
    SchemaBuilder::new("Message", "Message", SchemaTarget::Item)
        .extend(item)
        .register(&SENDER)
        .register(&TO_RECIPIENTS)
        .register(&CC_RECIPIENTS)
        .register(&BCC_RECIPIENTS)
        .register(&IS_READ_RECEIPT_REQUESTED)
        .register(&IS_DELIVERY_RECEIPT_REQUESTED)
        .register(&CONVERSATION_INDEX)
        .register(&CONVERSATION_TOPIC)
        .register(&FROM)
        .register(&INTERNET_MESSAGE_ID)
        .register(&IS_READ)
        .register(&IS_RESPONSE_REQUESTED)
        .register(&REFERENCES)
        .register(&REPLY_TO)
        .register(&RECEIVED_BY)
        .register(&RECEIVED_REPRESENTING)
        .build()
}
