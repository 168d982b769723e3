//! Postal address entries of `PhysicalAddresses`.
//!
//! Each sub-field has its own indexed URI
//! (`contacts:PhysicalAddress:Street`, ...), so updates are written per
//! sub-field rather than per entry.

use crate::common::error::{Error, Result};
use crate::common::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace, XmlNodeType};
use crate::property::dictionary::{DictionaryEntry, EntryScope};
use crate::property::update::UpdateSink;
use crate::schema::FieldPath;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhysicalAddressEntry {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country_or_region: Option<String>,
    pub postal_code: Option<String>,
}

impl PhysicalAddressEntry {
    /// Sub-fields in schema order.
    fn fields(&self) -> [(&'static str, Option<&str>); 5] {
        [
            ("Street", self.street.as_deref()),
            ("City", self.city.as_deref()),
            ("State", self.state.as_deref()),
            ("CountryOrRegion", self.country_or_region.as_deref()),
            ("PostalCode", self.postal_code.as_deref()),
        ]
    }

    fn field_mut(&mut self, element: &str) -> Option<&mut Option<String>> {
        match element {
            "Street" => Some(&mut self.street),
            "City" => Some(&mut self.city),
            "State" => Some(&mut self.state),
            "CountryOrRegion" => Some(&mut self.country_or_region),
            "PostalCode" => Some(&mut self.postal_code),
            _ => None,
        }
    }
}

impl DictionaryEntry for PhysicalAddressEntry {
    fn read_entry(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<()> {
        if reader.is_empty_element() {
            return reader.read();
        }
        loop {
            reader.read_significant()?;
            match reader.node_type() {
                XmlNodeType::StartElement => {
                    let element = reader.local_name().to_string();
                    if self.field_mut(&element).is_some() {
                        let value = reader.read_value()?;
                        if let Some(field) = self.field_mut(&element) {
                            *field = Some(value);
                        }
                    } else {
                        reader.skip_current_element()?;
                    }
                },
                XmlNodeType::EndElement => {
                    return reader.ensure_current_node_is_end_element(XmlNamespace::Types, "Entry");
                },
                XmlNodeType::Text => {},
                XmlNodeType::EndOfDocument | XmlNodeType::None => {
                    return Err(Error::Deserialization(
                        "Unexpected end of document inside <Entry>".to_string(),
                    ));
                },
            }
        }
    }

    fn write_entry_content(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        for (element, value) in self.fields() {
            if let Some(value) = value {
                writer.write_element_value(XmlNamespace::Types, element, value)?;
            }
        }
        Ok(())
    }

    fn write_entry_update(
        &self,
        previous: Option<&Self>,
        scope: &EntryScope<'_>,
        sink: &mut UpdateSink<'_>,
    ) -> Result<()> {
        let empty = Self::default();
        let previous = previous.unwrap_or(&empty).fields();

        for ((element, current), (_, old)) in self.fields().into_iter().zip(previous) {
            if current == old {
                continue;
            }
            let uri = format!("{}:{}", scope.entry_uri, element);
            let path = FieldPath::Indexed {
                uri: &uri,
                index: scope.key,
            };
            match current {
                Some(value) => sink.write_set(path, |writer| {
                    scope.write_wrapped(writer, |writer| {
                        writer.write_element_value(XmlNamespace::Types, element, value)
                    })
                })?,
                None => sink.write_delete(path)?,
            }
        }
        Ok(())
    }

    fn write_entry_delete(&self, scope: &EntryScope<'_>, sink: &mut UpdateSink<'_>) -> Result<()> {
        for (element, value) in self.fields() {
            if value.is_some() {
                let uri = format!("{}:{}", scope.entry_uri, element);
                sink.write_delete(FieldPath::Indexed {
                    uri: &uri,
                    index: scope.key,
                })?;
            }
        }
        Ok(())
    }
}
