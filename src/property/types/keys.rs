//! Keys of the contact dictionaries.

use crate::common::error::{Error, Result};
use crate::property::dictionary::DictionaryKey;

macro_rules! dictionary_key {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl DictionaryKey for $name {
            fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }

            fn parse(text: &str) -> Result<Self> {
                match text {
                    $(stringify!($variant) => Ok($name::$variant),)+
                    other => Err(Error::Deserialization(format!(
                        "Unknown {} key: {}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

dictionary_key!(
    /// Slot of a contact e-mail address.
    EmailAddressKey {
        EmailAddress1,
        EmailAddress2,
        EmailAddress3,
    }
);

dictionary_key!(
    /// Slot of a contact instant messaging address.
    ImAddressKey {
        ImAddress1,
        ImAddress2,
        ImAddress3,
    }
);

dictionary_key!(PhysicalAddressKey { Business, Home, Other });

dictionary_key!(PhoneNumberKey {
    AssistantPhone,
    BusinessFax,
    BusinessPhone,
    BusinessPhone2,
    Callback,
    CarPhone,
    CompanyMainPhone,
    HomeFax,
    HomePhone,
    HomePhone2,
    Isdn,
    MobilePhone,
    OtherFax,
    OtherTelephone,
    Pager,
    PrimaryPhone,
    RadioPhone,
    Telex,
    TtyTddPhone,
});
