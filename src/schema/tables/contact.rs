//! Contact schema, in the element order of `ContactItemType`.

use crate::common::version::ExchangeVersion::{Exchange2007Sp1, Exchange2010, Exchange2010Sp2};
use crate::property::types::{
    EmailAddressDictionary, ImAddressDictionary, PhoneNumberDictionary, PhysicalAddressDictionary,
};
use crate::schema::codec::ScalarKind;
use crate::schema::definition::{PropertyDefinition, default_instance};
use crate::schema::flags::PropertyDefinitionFlags as F;
use crate::schema::registry::{Schema, SchemaBuilder, SchemaTarget};

const DICTIONARY: F = F::AUTO_INSTANTIATE_ON_READ
    .union(F::CAN_SET)
    .union(F::CAN_UPDATE);

macro_rules! contact_string {
    ($name:ident, $element:literal) => {
        pub static $name: PropertyDefinition = PropertyDefinition::scalar(
            $element,
            concat!("contacts:", $element),
            ScalarKind::String,
            F::EDITABLE,
            Exchange2007Sp1,
        );
    };
}

contact_string!(FILE_AS, "FileAs");
contact_string!(DISPLAY_NAME, "DisplayName");
contact_string!(GIVEN_NAME, "GivenName");
contact_string!(INITIALS, "Initials");
contact_string!(MIDDLE_NAME, "MiddleName");
contact_string!(NICKNAME, "Nickname");
contact_string!(COMPANY_NAME, "CompanyName");

pub static EMAIL_ADDRESSES: PropertyDefinition = PropertyDefinition::dictionary(
    "EmailAddresses",
    "contacts:EmailAddresses",
    "contacts:EmailAddress",
    default_instance::<EmailAddressDictionary>,
    DICTIONARY,
    Exchange2007Sp1,
);

pub static PHYSICAL_ADDRESSES: PropertyDefinition = PropertyDefinition::dictionary(
    "PhysicalAddresses",
    "contacts:PhysicalAddresses",
    "contacts:PhysicalAddress",
    default_instance::<PhysicalAddressDictionary>,
    DICTIONARY,
    Exchange2007Sp1,
);

pub static PHONE_NUMBERS: PropertyDefinition = PropertyDefinition::dictionary(
    "PhoneNumbers",
    "contacts:PhoneNumbers",
    "contacts:PhoneNumber",
    default_instance::<PhoneNumberDictionary>,
    DICTIONARY,
    Exchange2007Sp1,
);

contact_string!(ASSISTANT_NAME, "AssistantName");

pub static BIRTHDAY: PropertyDefinition = PropertyDefinition::scalar(
    "Birthday",
    "contacts:Birthday",
    ScalarKind::DateTime,
    F::EDITABLE,
    Exchange2007Sp1,
);

contact_string!(BUSINESS_HOME_PAGE, "BusinessHomePage");
contact_string!(DEPARTMENT, "Department");
contact_string!(GENERATION, "Generation");

pub static IM_ADDRESSES: PropertyDefinition = PropertyDefinition::dictionary(
    "ImAddresses",
    "contacts:ImAddresses",
    "contacts:ImAddress",
    default_instance::<ImAddressDictionary>,
    DICTIONARY,
    Exchange2007Sp1,
);

contact_string!(JOB_TITLE, "JobTitle");
contact_string!(MANAGER, "Manager");
contact_string!(OFFICE_LOCATION, "OfficeLocation");
contact_string!(PROFESSION, "Profession");
contact_string!(SPOUSE_NAME, "SpouseName");
contact_string!(SURNAME, "Surname");

pub static WEDDING_ANNIVERSARY: PropertyDefinition = PropertyDefinition::scalar(
    "WeddingAnniversary",
    "contacts:WeddingAnniversary",
    ScalarKind::DateTime,
    F::EDITABLE,
    Exchange2007Sp1,
);

pub static HAS_PICTURE: PropertyDefinition = PropertyDefinition::scalar(
    "HasPicture",
    "contacts:HasPicture",
    ScalarKind::Boolean,
    F::CAN_FIND,
    Exchange2010,
);

pub static NOTES: PropertyDefinition = PropertyDefinition::scalar(
    "Notes",
    "contacts:Notes",
    ScalarKind::String,
    F::EDITABLE,
    Exchange2010Sp2,
);

pub fn schema(item: &Schema) -> Schema {
    SchemaBuilder::new("Contact", "Contact", SchemaTarget::Item)
        .extend(item)
        .register_all(&[
            &FILE_AS,
            &DISPLAY_NAME,
            &GIVEN_NAME,
            &INITIALS,
            &MIDDLE_NAME,
            &NICKNAME,
            &COMPANY_NAME,
            &EMAIL_ADDRESSES,
            &PHYSICAL_ADDRESSES,
            &PHONE_NUMBERS,
            &ASSISTANT_NAME,
            &BIRTHDAY,
            &BUSINESS_HOME_PAGE,
            &DEPARTMENT,
            &GENERATION,
            &IM_ADDRESSES,
            &JOB_TITLE,
            &MANAGER,
            &OFFICE_LOCATION,
            &PROFESSION,
            &SPOUSE_NAME,
            &SURNAME,
            &WEDDING_ANNIVERSARY,
            &HAS_PICTURE,
            &NOTES,
        ])
        .build()
}
