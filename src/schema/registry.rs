//! Ordered schemas and the registry that owns them.
//!
//! A [`Schema`] lists the properties of one object type in the order the
//! server expects them on the wire. Lookups by element name or field URI go
//! through maps built once in [`SchemaBuilder::build`].

use crate::schema::definition::PropertyDefinition;
use crate::schema::tables;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

/// Whether a schema describes items or folders.
///
/// Decides the element names of update instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaTarget {
    Item,
    Folder,
}

impl SchemaTarget {
    pub const fn set_field_element(self) -> &'static str {
        match self {
            SchemaTarget::Item => "SetItemField",
            SchemaTarget::Folder => "SetFolderField",
        }
    }

    pub const fn append_field_element(self) -> &'static str {
        match self {
            SchemaTarget::Item => "AppendToItemField",
            SchemaTarget::Folder => "AppendToFolderField",
        }
    }

    pub const fn delete_field_element(self) -> &'static str {
        match self {
            SchemaTarget::Item => "DeleteItemField",
            SchemaTarget::Folder => "DeleteFolderField",
        }
    }

    pub const fn change_element(self) -> &'static str {
        match self {
            SchemaTarget::Item => "ItemChange",
            SchemaTarget::Folder => "FolderChange",
        }
    }

    pub const fn id_element(self) -> &'static str {
        match self {
            SchemaTarget::Item => "ItemId",
            SchemaTarget::Folder => "FolderId",
        }
    }
}

/// Ordered property list of one object type.
#[derive(Debug)]
pub struct Schema {
    name: &'static str,
    xml_element: &'static str,
    target: SchemaTarget,
    properties: Vec<&'static PropertyDefinition>,
    by_xml_name: HashMap<&'static str, usize>,
    by_uri: HashMap<&'static str, usize>,
    id_property: Option<&'static PropertyDefinition>,
}

impl Schema {
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Element name of objects of this type, e.g. `Message`.
    #[inline]
    pub fn xml_element_name(&self) -> &'static str {
        self.xml_element
    }

    #[inline]
    pub fn target(&self) -> SchemaTarget {
        self.target
    }

    /// Properties in wire order.
    #[inline]
    pub fn properties(&self) -> &[&'static PropertyDefinition] {
        &self.properties
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn id_property(&self) -> Option<&'static PropertyDefinition> {
        self.id_property
    }

    pub fn find_by_xml_name(&self, name: &str) -> Option<&'static PropertyDefinition> {
        self.by_xml_name.get(name).map(|&i| self.properties[i])
    }

    /// Resolve a field URI such as `item:Subject`.
    pub fn find_property_definition(&self, uri: &str) -> Option<&'static PropertyDefinition> {
        self.by_uri.get(uri).map(|&i| self.properties[i])
    }

    /// True when this exact definition belongs to the schema.
    pub fn contains(&self, definition: &PropertyDefinition) -> bool {
        self.find_by_xml_name(definition.xml_name())
            .is_some_and(|found| std::ptr::eq(found, definition))
    }

    /// Position of a definition in wire order.
    pub fn position(&self, definition: &PropertyDefinition) -> Option<usize> {
        self.by_xml_name
            .get(definition.xml_name())
            .copied()
            .filter(|&i| std::ptr::eq(self.properties[i], definition))
    }
}

/// Builds a [`Schema`], base type properties first.
#[derive(Debug)]
pub struct SchemaBuilder {
    name: &'static str,
    xml_element: &'static str,
    target: SchemaTarget,
    properties: Vec<&'static PropertyDefinition>,
    id_property: Option<&'static PropertyDefinition>,
}

impl SchemaBuilder {
    pub fn new(name: &'static str, xml_element: &'static str, target: SchemaTarget) -> Self {
        Self {
            name,
            xml_element,
            target,
            properties: Vec::new(),
            id_property: None,
        }
    }

    /// Start from every property of a base schema.
    pub fn extend(mut self, base: &Schema) -> Self {
        self.properties.extend_from_slice(&base.properties);
        if self.id_property.is_none() {
            self.id_property = base.id_property;
        }
        self
    }

    pub fn register(mut self, definition: &'static PropertyDefinition) -> Self {
        self.properties.push(definition);
        self
    }

    pub fn register_all(mut self, definitions: &[&'static PropertyDefinition]) -> Self {
        self.properties.extend_from_slice(definitions);
        self
    }

    /// Mark the property holding the object's id. It must be registered.
    pub fn id(mut self, definition: &'static PropertyDefinition) -> Self {
        self.id_property = Some(definition);
        self
    }

    pub fn build(self) -> Schema {
        let mut by_xml_name = HashMap::with_capacity(self.properties.len());
        let mut by_uri = HashMap::with_capacity(self.properties.len());
        for (i, definition) in self.properties.iter().enumerate() {
            let previous = by_xml_name.insert(definition.xml_name(), i);
            debug_assert!(
                previous.is_none(),
                "duplicate element {} in schema {}",
                definition.xml_name(),
                self.name
            );
            if let Some(uri) = definition.uri() {
                by_uri.insert(uri, i);
            }
        }

        Schema {
            name: self.name,
            xml_element: self.xml_element,
            target: self.target,
            properties: self.properties,
            by_xml_name,
            by_uri,
            id_property: self.id_property,
        }
    }
}

static SHARED: Lazy<Arc<SchemaRegistry>> = Lazy::new(|| Arc::new(SchemaRegistry::new()));

/// Immutable set of all schemas known to the binding.
#[derive(Debug)]
pub struct SchemaRegistry {
    item: Arc<Schema>,
    message: Arc<Schema>,
    contact: Arc<Schema>,
    folder: Arc<Schema>,
    by_uri: HashMap<&'static str, &'static PropertyDefinition>,
}

impl SchemaRegistry {
    /// Build every schema from the static tables.
    pub fn new() -> Self {
        let item = Arc::new(tables::item::schema());
        let message = Arc::new(tables::message::schema(&item));
        let contact = Arc::new(tables::contact::schema(&item));
        let folder = Arc::new(tables::folder::schema());

        let mut by_uri = HashMap::new();
        for schema in [&item, &message, &contact, &folder] {
            for definition in schema.properties() {
                if let Some(uri) = definition.uri() {
                    by_uri.entry(uri).or_insert(*definition);
                }
            }
        }

        Self {
            item,
            message,
            contact,
            folder,
            by_uri,
        }
    }

    /// Process-wide instance, built on first use.
    pub fn shared() -> &'static SchemaRegistry {
        &SHARED
    }

    /// Owned handle to the process-wide instance.
    pub fn shared_handle() -> Arc<SchemaRegistry> {
        Arc::clone(&SHARED)
    }

    pub fn item(&self) -> &Arc<Schema> {
        &self.item
    }

    pub fn message(&self) -> &Arc<Schema> {
        &self.message
    }

    pub fn contact(&self) -> &Arc<Schema> {
        &self.contact
    }

    pub fn folder(&self) -> &Arc<Schema> {
        &self.folder
    }

    /// Schema for an object element name (`Item`, `Message`, `Contact`, `Folder`).
    pub fn schema_for_element(&self, element: &str) -> Option<&Arc<Schema>> {
        [&self.item, &self.message, &self.contact, &self.folder]
            .into_iter()
            .find(|schema| schema.xml_element_name() == element)
    }

    /// Resolve a field URI across all schemas.
    pub fn find_property_definition(&self, uri: &str) -> Option<&'static PropertyDefinition> {
        self.by_uri.get(uri).copied()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{contact, folder, item, message};

    #[test]
    fn test_subtype_starts_with_base_properties() {
        let registry = SchemaRegistry::new();
        let base = registry.item().properties();
        let derived = registry.message().properties();
        assert!(derived.len() > base.len());
        for (a, b) in base.iter().zip(derived) {
            assert!(std::ptr::eq(*a, *b));
        }
        assert!(std::ptr::eq(
            derived[base.len()],
            &message::SENDER
        ));
    }

    #[test]
    fn test_lookups() {
        let registry = SchemaRegistry::shared();
        assert!(std::ptr::eq(
            registry.find_property_definition("item:Subject").unwrap(),
            &item::SUBJECT
        ));
        assert!(std::ptr::eq(
            registry.find_property_definition("contacts:EmailAddresses").unwrap(),
            &contact::EMAIL_ADDRESSES
        ));
        assert!(std::ptr::eq(
            registry.folder().find_by_xml_name("DisplayName").unwrap(),
            &folder::DISPLAY_NAME
        ));
        assert!(registry.find_property_definition("item:NoSuchThing").is_none());
        assert_eq!(
            registry.schema_for_element("Contact").unwrap().name(),
            "Contact"
        );
        assert!(registry.contact().contains(&item::SUBJECT));
        assert!(!registry.folder().contains(&item::SUBJECT));
        assert!(std::ptr::eq(
            registry.message().id_property().unwrap(),
            &item::ITEM_ID
        ));
    }

    #[test]
    fn test_shared_is_built_once() {
        assert!(std::ptr::eq(SchemaRegistry::shared(), SchemaRegistry::shared()));
        assert!(std::ptr::eq(
            SchemaRegistry::shared(),
            Arc::as_ptr(&SchemaRegistry::shared_handle())
        ));
    }
}
