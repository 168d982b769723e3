//! Keyed entry properties (`EmailAddresses`, `PhoneNumbers`, ...).
//!
//! On the wire a dictionary is a list of `<t:Entry Key="...">` children.
//! Updates address single entries through `t:IndexedFieldURI`, so each
//! dictionary keeps a baseline copy of its entries and emits one
//! instruction per key that differs from it.

use crate::common::error::{Error, Result};
use crate::common::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace};
use crate::property::change::{OwnerHandle, notify};
use crate::property::complex::ComplexProperty;
use crate::property::update::UpdateSink;
use crate::schema::{FieldPath, PropertyDefinition, PropertyKind};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::trace;

/// Enumeration used as a dictionary key.
pub trait DictionaryKey: Copy + Ord + fmt::Debug + Send + Sync + 'static {
    fn as_str(self) -> &'static str;
    fn parse(text: &str) -> Result<Self>;
}

/// Value stored under one dictionary key.
pub trait DictionaryEntry: Clone + PartialEq + Default + fmt::Debug + Send + Sync + 'static {
    /// Read the entry under the cursor (a `t:Entry` start tag), leaving the
    /// cursor on its end tag.
    fn read_entry(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<()>;

    /// Write what goes between `<t:Entry Key="...">` and `</t:Entry>`.
    fn write_entry_content(&self, writer: &mut EwsXmlWriter) -> Result<()>;

    /// Write the update for an entry that was added or changed.
    fn write_entry_update(
        &self,
        _previous: Option<&Self>,
        scope: &EntryScope<'_>,
        sink: &mut UpdateSink<'_>,
    ) -> Result<()> {
        sink.write_set(scope.path(), |writer| {
            scope.write_wrapped(writer, |writer| self.write_entry_content(writer))
        })
    }

    /// Write the update for an entry that was removed.
    fn write_entry_delete(&self, scope: &EntryScope<'_>, sink: &mut UpdateSink<'_>) -> Result<()> {
        sink.write_delete(scope.path())
    }
}

/// Where an entry update is addressed.
#[derive(Debug, Clone, Copy)]
pub struct EntryScope<'a> {
    /// Dictionary element, e.g. `PhysicalAddresses`
    pub element: &'a str,
    /// Entry field URI, e.g. `contacts:PhysicalAddress`
    pub entry_uri: &'a str,
    pub key: &'a str,
}

impl EntryScope<'_> {
    pub fn path(&self) -> FieldPath<'_> {
        FieldPath::Indexed {
            uri: self.entry_uri,
            index: self.key,
        }
    }

    /// Write `<t:{element}><t:Entry Key="{key}">...</t:Entry></t:{element}>`.
    pub fn write_wrapped<F>(&self, writer: &mut EwsXmlWriter, content: F) -> Result<()>
    where
        F: FnOnce(&mut EwsXmlWriter) -> Result<()>,
    {
        writer.write_start_element(XmlNamespace::Types, self.element);
        writer.write_start_element(XmlNamespace::Types, "Entry");
        writer.write_attribute("Key", self.key)?;
        content(writer)?;
        writer.write_end_element()?;
        writer.write_end_element()
    }
}

impl DictionaryEntry for String {
    fn read_entry(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<()> {
        *self = reader.read_value()?;
        Ok(())
    }

    fn write_entry_content(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        writer.write_value(self);
        Ok(())
    }
}

/// Entries keyed by `K`, tracked against the last loaded state.
#[derive(Clone)]
pub struct DictionaryProperty<K: DictionaryKey, V: DictionaryEntry> {
    entries: BTreeMap<K, V>,
    baseline: BTreeMap<K, V>,
    owner: Option<OwnerHandle>,
}

impl<K: DictionaryKey, V: DictionaryEntry> Default for DictionaryProperty<K, V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            baseline: BTreeMap::new(),
            owner: None,
        }
    }
}

impl<K: DictionaryKey, V: DictionaryEntry> fmt::Debug for DictionaryProperty<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<K: DictionaryKey, V: DictionaryEntry> DictionaryProperty<K, V> {
    pub fn get(&self, key: K) -> Option<&V> {
        self.entries.get(&key)
    }

    pub fn contains_key(&self, key: K) -> bool {
        self.entries.contains_key(&key)
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn set(&mut self, key: K, value: V) {
        if self.entries.get(&key) != Some(&value) {
            self.entries.insert(key, value);
            notify(&self.owner);
        }
    }

    /// Mutable access to an entry, creating an empty one when missing.
    pub fn entry_mut(&mut self, key: K) -> &mut V {
        notify(&self.owner);
        self.entries.entry(key).or_default()
    }

    pub fn remove(&mut self, key: K) -> Option<V> {
        let removed = self.entries.remove(&key);
        if removed.is_some() {
            notify(&self.owner);
        }
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys whose entry differs from the baseline, in key order.
    pub fn changed_keys(&self) -> Vec<K> {
        let keys: BTreeSet<K> = self
            .entries
            .keys()
            .chain(self.baseline.keys())
            .copied()
            .collect();
        keys.into_iter()
            .filter(|key| self.entries.get(key) != self.baseline.get(key))
            .collect()
    }
}

impl<K: DictionaryKey, V: DictionaryEntry> ComplexProperty for DictionaryProperty<K, V> {
    fn try_read_element(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<bool> {
        if !reader.is_start_element(XmlNamespace::Types, "Entry") {
            return Ok(false);
        }
        let text = reader
            .attribute("Key")
            .ok_or_else(|| Error::Deserialization("Dictionary entry without Key".to_string()))?;
        let Ok(key) = K::parse(text) else {
            trace!(key = text, "skipping entry with unknown key");
            return Ok(false);
        };
        let mut value = V::default();
        value.read_entry(reader)?;
        self.entries.insert(key, value);
        Ok(true)
    }

    fn write_elements(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        for (key, value) in &self.entries {
            writer.write_start_element(XmlNamespace::Types, "Entry");
            writer.write_attribute("Key", key.as_str())?;
            value.write_entry_content(writer)?;
            writer.write_end_element()?;
        }
        Ok(())
    }

    fn set_owner(&mut self, owner: Option<OwnerHandle>) {
        self.owner = owner;
    }

    fn clear_change_log(&mut self) {
        self.baseline = self.entries.clone();
    }

    fn adopt_baseline(&mut self, previous: Option<&dyn ComplexProperty>) -> bool {
        if let Some(previous) = previous.and_then(|p| p.as_any().downcast_ref::<Self>()) {
            self.baseline = previous.baseline.clone();
        }
        true
    }

    fn write_custom_update(
        &self,
        definition: &PropertyDefinition,
        sink: &mut UpdateSink<'_>,
    ) -> Result<bool> {
        let PropertyKind::Dictionary { entry_uri, .. } = definition.kind() else {
            return Ok(false);
        };

        for key in self.changed_keys() {
            let scope = EntryScope {
                element: definition.xml_name(),
                entry_uri,
                key: key.as_str(),
            };
            match (self.entries.get(&key), self.baseline.get(&key)) {
                (Some(current), previous) => current.write_entry_update(previous, &scope, sink)?,
                (None, Some(previous)) => previous.write_entry_delete(&scope, sink)?,
                (None, None) => {},
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::version::ExchangeVersion;
    use crate::property::types::{EmailAddressDictionary, EmailAddressKey};
    use crate::schema::SchemaTarget;
    use crate::schema::tables::contact;

    fn loaded() -> EmailAddressDictionary {
        let xml = r#"<t:EmailAddresses xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types"><t:Entry Key="EmailAddress1">a@contoso.com</t:Entry><t:Entry Key="EmailAddress2">b@contoso.com</t:Entry></t:EmailAddresses>"#;
        let mut reader = EwsXmlReader::new(xml);
        reader.read_significant().unwrap();
        let mut dictionary = EmailAddressDictionary::default();
        dictionary
            .load_from_xml(&mut reader, XmlNamespace::Types, "EmailAddresses")
            .unwrap();
        dictionary.clear_change_log();
        dictionary
    }

    #[test]
    fn test_load_entries() {
        let dictionary = loaded();
        assert_eq!(dictionary.len(), 2);
        assert_eq!(
            dictionary.get(EmailAddressKey::EmailAddress2).map(String::as_str),
            Some("b@contoso.com")
        );
        assert!(dictionary.changed_keys().is_empty());
    }

    #[test]
    fn test_unknown_key_is_skipped() {
        let xml = r#"<t:EmailAddresses xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types"><t:Entry Key="EmailAddress9">x@contoso.com</t:Entry><t:Entry Key="EmailAddress1">a@contoso.com</t:Entry></t:EmailAddresses>"#;
        let mut reader = EwsXmlReader::new(xml);
        reader.read_significant().unwrap();
        let mut dictionary = EmailAddressDictionary::default();
        dictionary
            .load_from_xml(&mut reader, XmlNamespace::Types, "EmailAddresses")
            .unwrap();
        assert!(reader.is_end_element(XmlNamespace::Types, "EmailAddresses"));
        assert_eq!(dictionary.len(), 1);
        assert!(dictionary.contains_key(EmailAddressKey::EmailAddress1));
    }

    #[test]
    fn test_indexed_updates() {
        let mut dictionary = loaded();
        dictionary.set(EmailAddressKey::EmailAddress1, "a@contoso.com".to_string());
        dictionary.set(EmailAddressKey::EmailAddress3, "c@contoso.com".to_string());
        dictionary.remove(EmailAddressKey::EmailAddress2);
        assert_eq!(
            dictionary.changed_keys(),
            vec![EmailAddressKey::EmailAddress2, EmailAddressKey::EmailAddress3]
        );

        let mut writer = EwsXmlWriter::new(ExchangeVersion::Exchange2010);
        let mut sink = UpdateSink::new(&mut writer, SchemaTarget::Item, "Contact");
        assert!(
            dictionary
                .write_custom_update(&contact::EMAIL_ADDRESSES, &mut sink)
                .unwrap()
        );
        assert_eq!(sink.written(), 2);
        assert_eq!(
            writer.into_string().unwrap(),
            concat!(
                r#"<t:DeleteItemField><t:IndexedFieldURI FieldURI="contacts:EmailAddress" FieldIndex="EmailAddress2"/></t:DeleteItemField>"#,
                r#"<t:SetItemField><t:IndexedFieldURI FieldURI="contacts:EmailAddress" FieldIndex="EmailAddress3"/>"#,
                r#"<t:Contact><t:EmailAddresses><t:Entry Key="EmailAddress3">c@contoso.com</t:Entry></t:EmailAddresses></t:Contact>"#,
                r#"</t:SetItemField>"#
            )
        );
    }
}
