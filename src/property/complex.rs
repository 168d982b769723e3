//! The complex property contract.
//!
//! A complex property owns an XML subtree. Implementors override the small
//! hooks (`read_attributes`, `try_read_element`, `write_elements`, ...) and
//! inherit [`ComplexProperty::load_from_xml`] and
//! [`ComplexProperty::write_to_xml`], which enforce the reader cursor
//! contract: on entry the reader is on the element's start tag, on return
//! it is on the matching end tag.

use crate::common::error::{Error, Result};
use crate::common::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace, XmlNodeType};
use crate::property::change::OwnerHandle;
use crate::property::update::UpdateSink;
use crate::schema::PropertyDefinition;
use std::any::Any;
use std::fmt;
use tracing::trace;

/// Cloning and downcasting for boxed complex values.
///
/// Implemented automatically for every `ComplexProperty + Clone` type.
pub trait ComplexPropertyExt {
    /// Clone into a detached box; the copy has no owner.
    fn clone_box(&self) -> Box<dyn ComplexProperty>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: ComplexProperty + Clone + 'static> ComplexPropertyExt for T {
    fn clone_box(&self) -> Box<dyn ComplexProperty> {
        let mut copy = self.clone();
        copy.set_owner(None);
        Box::new(copy)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Update behaviour of collection-valued properties.
pub trait CollectionUpdate {
    /// True when the collection holds no items.
    fn is_empty(&self) -> bool;

    /// True when items were appended since the last reset and nothing
    /// present before was removed or changed.
    fn has_only_additions(&self) -> bool;

    /// Write only the items appended since the last reset.
    fn write_added_items(&self, writer: &mut EwsXmlWriter) -> Result<()>;
}

/// A structured property value with its own XML subtree.
pub trait ComplexProperty: ComplexPropertyExt + fmt::Debug + Send + Sync {
    /// Read attributes of the start tag.
    fn read_attributes(&mut self, _reader: &EwsXmlReader<'_>) -> Result<()> {
        Ok(())
    }

    /// Consume a text node found directly inside the element.
    fn read_text_value(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    /// Read one child element.
    ///
    /// The reader is on the child's start tag. Return `true` after leaving
    /// the cursor on its end tag, or `false` to have it skipped.
    fn try_read_element(&mut self, _reader: &mut EwsXmlReader<'_>) -> Result<bool> {
        Ok(false)
    }

    fn write_attributes(&self, _writer: &mut EwsXmlWriter) -> Result<()> {
        Ok(())
    }

    fn write_elements(&self, _writer: &mut EwsXmlWriter) -> Result<()> {
        Ok(())
    }

    /// Attach to, or detach from, the bag entry holding this value.
    fn set_owner(&mut self, _owner: Option<OwnerHandle>) {}

    /// Make the current state the baseline for future updates.
    fn clear_change_log(&mut self) {}

    fn as_collection(&self) -> Option<&dyn CollectionUpdate> {
        None
    }

    /// Take the place of `previous`, the value this one replaces in a loaded
    /// object.
    ///
    /// Returns `true` when [`write_custom_update`](Self::write_custom_update)
    /// then covers the replacement; `false` has the whole value set.
    fn adopt_baseline(&mut self, _previous: Option<&dyn ComplexProperty>) -> bool {
        false
    }

    /// Write a property-specific update. Returns `false` to fall back to
    /// the generic set/delete handling.
    fn write_custom_update(
        &self,
        _definition: &PropertyDefinition,
        _sink: &mut UpdateSink<'_>,
    ) -> Result<bool> {
        Ok(false)
    }

    /// Load from the element `namespace:element` under the cursor.
    fn load_from_xml(
        &mut self,
        reader: &mut EwsXmlReader<'_>,
        namespace: XmlNamespace,
        element: &str,
    ) -> Result<()> {
        reader.ensure_current_node_is_start_element(namespace, element)?;
        self.read_attributes(reader)?;

        if reader.is_empty_element() {
            reader.read()?;
            return Ok(());
        }

        loop {
            reader.read()?;
            match reader.node_type() {
                XmlNodeType::Text => self.read_text_value(reader.text())?,
                XmlNodeType::StartElement => {
                    if !self.try_read_element(reader)? {
                        trace!(
                            parent = element,
                            element = reader.local_name(),
                            "skipping unrecognized element"
                        );
                        reader.skip_current_element()?;
                    }
                },
                XmlNodeType::EndElement => {
                    return reader.ensure_current_node_is_end_element(namespace, element);
                },
                XmlNodeType::EndOfDocument | XmlNodeType::None => {
                    return Err(Error::Deserialization(format!(
                        "Unexpected end of document inside <{}>",
                        element
                    )));
                },
            }
        }
    }

    /// Write this value as the element `namespace:element`.
    fn write_to_xml(
        &self,
        writer: &mut EwsXmlWriter,
        namespace: XmlNamespace,
        element: &str,
    ) -> Result<()> {
        writer.write_start_element(namespace, element);
        self.write_attributes(writer)?;
        self.write_elements(writer)?;
        writer.write_end_element()
    }
}

impl Clone for Box<dyn ComplexProperty> {
    fn clone(&self) -> Self {
        (**self).clone_box()
    }
}
