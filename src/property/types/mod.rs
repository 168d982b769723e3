//! Concrete complex property types.

mod email_address;
mod extended_property;
mod keys;
mod message_body;
mod physical_address;
mod service_id;
mod string_list;

pub use email_address::{EmailAddress, EmailAddressCollection, MailboxType};
pub use extended_property::{ExtendedProperty, ExtendedPropertyCollection};
pub use keys::{EmailAddressKey, ImAddressKey, PhoneNumberKey, PhysicalAddressKey};
pub use message_body::{BodyType, MessageBody};
pub use physical_address::PhysicalAddressEntry;
pub use service_id::ServiceId;
pub use string_list::StringList;

use crate::property::dictionary::DictionaryProperty;

pub type EmailAddressDictionary = DictionaryProperty<EmailAddressKey, String>;
pub type ImAddressDictionary = DictionaryProperty<ImAddressKey, String>;
pub type PhoneNumberDictionary = DictionaryProperty<PhoneNumberKey, String>;
pub type PhysicalAddressDictionary = DictionaryProperty<PhysicalAddressKey, PhysicalAddressEntry>;
