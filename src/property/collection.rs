//! Ordered collections of complex items (`ToRecipients`, `ReplyTo`, ...).

use crate::common::error::Result;
use crate::common::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace};
use crate::property::change::{OwnerHandle, notify};
use crate::property::complex::{CollectionUpdate, ComplexProperty};

/// An item that can live in a [`ComplexPropertyCollection`].
pub trait CollectionItem: ComplexProperty + Clone + Default + 'static {
    /// Element name of one item, e.g. `Mailbox`.
    const ELEMENT: &'static str;
}

/// Ordered list of complex items.
///
/// Remembers how many items were present at the last reset so an update can
/// append only the new ones when nothing else changed.
#[derive(Debug, Clone)]
pub struct ComplexPropertyCollection<T: CollectionItem> {
    items: Vec<T>,
    baseline_len: usize,
    existing_changed: bool,
    owner: Option<OwnerHandle>,
}

impl<T: CollectionItem> Default for ComplexPropertyCollection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            baseline_len: 0,
            existing_changed: false,
            owner: None,
        }
    }
}

impl<T: CollectionItem> ComplexPropertyCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: T) {
        self.items.push(item);
        notify(&self.owner);
    }

    pub fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        let before = self.items.len();
        self.items.extend(items);
        if self.items.len() != before {
            notify(&self.owner);
        }
    }

    /// Remove the item at `index`.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.items.len() {
            return None;
        }
        if index < self.baseline_len {
            self.baseline_len -= 1;
            self.existing_changed = true;
        }
        let item = self.items.remove(index);
        notify(&self.owner);
        Some(item)
    }

    pub fn clear(&mut self) {
        if self.items.is_empty() {
            return;
        }
        if self.baseline_len > 0 {
            self.existing_changed = true;
        }
        self.baseline_len = 0;
        self.items.clear();
        notify(&self.owner);
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Mutable access to one item. Counts as a change to the collection.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.items.len() {
            return None;
        }
        if index < self.baseline_len {
            self.existing_changed = true;
        }
        notify(&self.owner);
        self.items.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items appended since the last reset.
    pub fn added_items(&self) -> &[T] {
        &self.items[self.baseline_len.min(self.items.len())..]
    }
}

impl<'a, T: CollectionItem> IntoIterator for &'a ComplexPropertyCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: CollectionItem> CollectionUpdate for ComplexPropertyCollection<T> {
    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn has_only_additions(&self) -> bool {
        !self.existing_changed && self.items.len() > self.baseline_len
    }

    fn write_added_items(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        for item in self.added_items() {
            item.write_to_xml(writer, XmlNamespace::Types, T::ELEMENT)?;
        }
        Ok(())
    }
}

impl<T: CollectionItem> ComplexProperty for ComplexPropertyCollection<T> {
    fn try_read_element(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<bool> {
        if !reader.is_start_element(XmlNamespace::Types, T::ELEMENT) {
            return Ok(false);
        }
        let mut item = T::default();
        item.load_from_xml(reader, XmlNamespace::Types, T::ELEMENT)?;
        self.items.push(item);
        Ok(true)
    }

    fn write_elements(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        for item in &self.items {
            item.write_to_xml(writer, XmlNamespace::Types, T::ELEMENT)?;
        }
        Ok(())
    }

    fn set_owner(&mut self, owner: Option<OwnerHandle>) {
        self.owner = owner;
    }

    fn clear_change_log(&mut self) {
        self.baseline_len = self.items.len();
        self.existing_changed = false;
        for item in &mut self.items {
            item.clear_change_log();
        }
    }

    fn as_collection(&self) -> Option<&dyn CollectionUpdate> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::version::ExchangeVersion;
    use crate::property::types::{EmailAddress, EmailAddressCollection};

    fn loaded() -> EmailAddressCollection {
        let xml = r#"<t:ToRecipients xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types"><t:Mailbox><t:EmailAddress>a@contoso.com</t:EmailAddress></t:Mailbox><t:Unknown/><t:Mailbox><t:EmailAddress>b@contoso.com</t:EmailAddress></t:Mailbox></t:ToRecipients>"#;
        let mut reader = EwsXmlReader::new(xml);
        reader.read_significant().unwrap();
        let mut collection = EmailAddressCollection::default();
        collection
            .load_from_xml(&mut reader, XmlNamespace::Types, "ToRecipients")
            .unwrap();
        assert!(reader.is_end_element(XmlNamespace::Types, "ToRecipients"));
        collection.clear_change_log();
        collection
    }

    #[test]
    fn test_load_skips_unknown_children() {
        let collection = loaded();
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.get(1).unwrap().address(), Some("b@contoso.com"));
        assert!(!CollectionUpdate::is_empty(&collection));
    }

    #[test]
    fn test_additions_only() {
        let mut collection = loaded();
        assert!(!collection.has_only_additions());

        collection.add(EmailAddress::new("c@contoso.com"));
        assert!(collection.has_only_additions());

        let mut writer = EwsXmlWriter::new(ExchangeVersion::Exchange2010);
        collection.write_added_items(&mut writer).unwrap();
        assert_eq!(
            writer.into_string().unwrap(),
            "<t:Mailbox><t:EmailAddress>c@contoso.com</t:EmailAddress></t:Mailbox>"
        );
    }

    #[test]
    fn test_removal_is_not_an_addition() {
        let mut collection = loaded();
        collection.add(EmailAddress::new("c@contoso.com"));
        collection.remove(0);
        assert!(!collection.has_only_additions());

        let mut collection = loaded();
        collection.get_mut(0).unwrap().set_name("Alice");
        collection.add(EmailAddress::new("c@contoso.com"));
        assert!(!collection.has_only_additions());
    }

    #[test]
    fn test_removing_added_item_keeps_baseline() {
        let mut collection = loaded();
        collection.add(EmailAddress::new("c@contoso.com"));
        collection.add(EmailAddress::new("d@contoso.com"));
        collection.remove(2);
        assert!(collection.has_only_additions());
        assert_eq!(collection.added_items().len(), 1);
    }
}
