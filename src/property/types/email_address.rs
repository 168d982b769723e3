//! Mailboxes (`t:Mailbox`) and recipient collections.

use crate::common::error::{Error, Result};
use crate::common::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace};
use crate::property::change::{OwnerHandle, notify};
use crate::property::collection::{CollectionItem, ComplexPropertyCollection};
use crate::property::complex::ComplexProperty;
use std::fmt;
use std::str::FromStr;

/// Kind of mailbox an address resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MailboxType {
    Mailbox,
    PublicDL,
    PrivateDL,
    Contact,
    PublicFolder,
    Unknown,
    OneOff,
}

impl MailboxType {
    const ALL: [MailboxType; 7] = [
        MailboxType::Mailbox,
        MailboxType::PublicDL,
        MailboxType::PrivateDL,
        MailboxType::Contact,
        MailboxType::PublicFolder,
        MailboxType::Unknown,
        MailboxType::OneOff,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            MailboxType::Mailbox => "Mailbox",
            MailboxType::PublicDL => "PublicDL",
            MailboxType::PrivateDL => "PrivateDL",
            MailboxType::Contact => "Contact",
            MailboxType::PublicFolder => "PublicFolder",
            MailboxType::Unknown => "Unknown",
            MailboxType::OneOff => "OneOff",
        }
    }
}

impl FromStr for MailboxType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::Deserialization(format!("Unknown MailboxType: {}", s)))
    }
}

/// A named SMTP (or other routing type) address.
#[derive(Debug, Clone, Default)]
pub struct EmailAddress {
    name: Option<String>,
    address: Option<String>,
    routing_type: Option<String>,
    mailbox_type: Option<MailboxType>,
    owner: Option<OwnerHandle>,
}

impl EmailAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            ..Self::default()
        }
    }

    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            address: Some(address.into()),
            ..Self::default()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn routing_type(&self) -> Option<&str> {
        self.routing_type.as_deref()
    }

    pub fn mailbox_type(&self) -> Option<MailboxType> {
        self.mailbox_type
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
        notify(&self.owner);
    }

    pub fn set_address(&mut self, address: impl Into<String>) {
        self.address = Some(address.into());
        notify(&self.owner);
    }

    pub fn set_routing_type(&mut self, routing_type: impl Into<String>) {
        self.routing_type = Some(routing_type.into());
        notify(&self.owner);
    }

    pub fn set_mailbox_type(&mut self, mailbox_type: MailboxType) {
        self.mailbox_type = Some(mailbox_type);
        notify(&self.owner);
    }
}

impl PartialEq for EmailAddress {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.address == other.address
            && self.routing_type == other.routing_type
            && self.mailbox_type == other.mailbox_type
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.address) {
            (Some(name), Some(address)) => write!(f, "{} <{}>", name, address),
            (None, Some(address)) => f.write_str(address),
            (Some(name), None) => f.write_str(name),
            (None, None) => Ok(()),
        }
    }
}

impl ComplexProperty for EmailAddress {
    fn try_read_element(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<bool> {
        if reader.namespace() != XmlNamespace::Types {
            return Ok(false);
        }
        let name = reader.local_name().to_string();
        match name.as_str() {
            "Name" => self.name = Some(reader.read_value()?),
            "EmailAddress" => self.address = Some(reader.read_value()?),
            "RoutingType" => self.routing_type = Some(reader.read_value()?),
            "MailboxType" => self.mailbox_type = Some(reader.read_value()?.parse()?),
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn write_elements(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        if let Some(name) = &self.name {
            writer.write_element_value(XmlNamespace::Types, "Name", name)?;
        }
        if let Some(address) = &self.address {
            writer.write_element_value(XmlNamespace::Types, "EmailAddress", address)?;
        }
        if let Some(routing_type) = &self.routing_type {
            writer.write_element_value(XmlNamespace::Types, "RoutingType", routing_type)?;
        }
        if let Some(mailbox_type) = self.mailbox_type {
            writer.write_element_value(XmlNamespace::Types, "MailboxType", mailbox_type.as_str())?;
        }
        Ok(())
    }

    fn set_owner(&mut self, owner: Option<OwnerHandle>) {
        self.owner = owner;
    }
}

impl CollectionItem for EmailAddress {
    const ELEMENT: &'static str = "Mailbox";
}

/// Recipient list (`ToRecipients`, `CcRecipients`, `BccRecipients`, `ReplyTo`).
pub type EmailAddressCollection = ComplexPropertyCollection<EmailAddress>;

impl ComplexPropertyCollection<EmailAddress> {
    /// Append an SMTP address.
    pub fn add_address(&mut self, address: impl Into<String>) {
        self.add(EmailAddress::new(address));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::version::ExchangeVersion;

    #[test]
    fn test_mailbox_round_trip() {
        let xml = r#"<t:Mailbox xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types"><t:Name>Alice &amp; Co</t:Name><t:EmailAddress>alice@contoso.com</t:EmailAddress><t:RoutingType>SMTP</t:RoutingType><t:MailboxType>Mailbox</t:MailboxType></t:Mailbox>"#;
        let mut reader = EwsXmlReader::new(xml);
        reader.read_significant().unwrap();
        let mut mailbox = EmailAddress::default();
        mailbox
            .load_from_xml(&mut reader, XmlNamespace::Types, "Mailbox")
            .unwrap();
        assert_eq!(mailbox.name(), Some("Alice & Co"));
        assert_eq!(mailbox.mailbox_type(), Some(MailboxType::Mailbox));
        assert_eq!(mailbox.to_string(), "Alice & Co <alice@contoso.com>");

        let mut writer = EwsXmlWriter::new(ExchangeVersion::Exchange2010);
        mailbox
            .write_to_xml(&mut writer, XmlNamespace::Types, "Mailbox")
            .unwrap();
        assert_eq!(writer.into_string().unwrap(), xml.replace(
            r#" xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types""#,
            ""
        ));
    }

    #[test]
    fn test_unknown_mailbox_type() {
        assert!("Room".parse::<MailboxType>().is_err());
        assert_eq!("OneOff".parse::<MailboxType>().unwrap(), MailboxType::OneOff);
    }
}
