//! Server-assigned identifiers (`ItemId`, `FolderId`, `ConversationId`, ...).

use crate::common::error::{Error, Result};
use crate::common::xml::{EwsXmlReader, EwsXmlWriter};
use crate::property::complex::ComplexProperty;

/// An `Id` plus optional `ChangeKey`, both carried as attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ServiceId {
    id: String,
    change_key: Option<String>,
}

impl ServiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            change_key: None,
        }
    }

    pub fn with_change_key(mut self, change_key: impl Into<String>) -> Self {
        self.change_key = Some(change_key.into());
        self
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn change_key(&self) -> Option<&str> {
        self.change_key.as_deref()
    }

    /// True once the server has assigned an id.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty()
    }
}

impl ComplexProperty for ServiceId {
    fn read_attributes(&mut self, reader: &EwsXmlReader<'_>) -> Result<()> {
        self.id = reader
            .attribute("Id")
            .ok_or_else(|| {
                Error::Deserialization(format!("<{}> without Id attribute", reader.local_name()))
            })?
            .to_string();
        self.change_key = reader.attribute("ChangeKey").map(str::to_string);
        Ok(())
    }

    fn write_attributes(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        writer.write_attribute("Id", &self.id)?;
        if let Some(change_key) = &self.change_key {
            writer.write_attribute("ChangeKey", change_key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::version::ExchangeVersion;
    use crate::common::xml::XmlNamespace;

    #[test]
    fn test_attributes() {
        let xml = r#"<t:ItemId xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types" Id="AAMk" ChangeKey="CQAA"/>"#;
        let mut reader = EwsXmlReader::new(xml);
        reader.read_significant().unwrap();
        let mut id = ServiceId::default();
        id.load_from_xml(&mut reader, XmlNamespace::Types, "ItemId").unwrap();
        assert_eq!(id, ServiceId::new("AAMk").with_change_key("CQAA"));

        let mut writer = EwsXmlWriter::new(ExchangeVersion::Exchange2010);
        id.write_to_xml(&mut writer, XmlNamespace::Types, "ItemId").unwrap();
        assert_eq!(
            writer.into_string().unwrap(),
            r#"<t:ItemId Id="AAMk" ChangeKey="CQAA"/>"#
        );
    }

    #[test]
    fn test_missing_id() {
        let xml = r#"<t:FolderId xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types"/>"#;
        let mut reader = EwsXmlReader::new(xml);
        reader.read_significant().unwrap();
        let mut id = ServiceId::default();
        assert!(
            id.load_from_xml(&mut reader, XmlNamespace::Types, "FolderId")
                .is_err()
        );
    }
}
