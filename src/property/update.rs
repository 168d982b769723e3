//! Update instructions for `UpdateItem` / `UpdateFolder`.

use crate::common::error::Result;
use crate::common::version::ExchangeVersion;
use crate::common::xml::{EwsXmlWriter, XmlNamespace};
use crate::schema::{FieldPath, SchemaTarget};

/// Writes set, append and delete instructions for one object.
///
/// A set or append payload is wrapped in the object's element, e.g.
/// `<t:SetItemField><t:FieldURI .../><t:Message>...</t:Message></t:SetItemField>`.
#[derive(Debug)]
pub struct UpdateSink<'w> {
    writer: &'w mut EwsXmlWriter,
    target: SchemaTarget,
    object_element: &'static str,
    written: usize,
}

impl<'w> UpdateSink<'w> {
    pub fn new(
        writer: &'w mut EwsXmlWriter,
        target: SchemaTarget,
        object_element: &'static str,
    ) -> Self {
        Self {
            writer,
            target,
            object_element,
            written: 0,
        }
    }

    pub fn version(&self) -> ExchangeVersion {
        self.writer.version()
    }

    /// Number of instructions written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn write_set<F>(&mut self, path: FieldPath<'_>, content: F) -> Result<()>
    where
        F: FnOnce(&mut EwsXmlWriter) -> Result<()>,
    {
        self.write_with_payload(self.target.set_field_element(), path, content)
    }

    pub fn write_append<F>(&mut self, path: FieldPath<'_>, content: F) -> Result<()>
    where
        F: FnOnce(&mut EwsXmlWriter) -> Result<()>,
    {
        self.write_with_payload(self.target.append_field_element(), path, content)
    }

    pub fn write_delete(&mut self, path: FieldPath<'_>) -> Result<()> {
        self.writer
            .write_start_element(XmlNamespace::Types, self.target.delete_field_element());
        path.write_to_xml(&mut *self.writer)?;
        self.writer.write_end_element()?;
        self.written += 1;
        Ok(())
    }

    fn write_with_payload<F>(
        &mut self,
        instruction: &'static str,
        path: FieldPath<'_>,
        content: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut EwsXmlWriter) -> Result<()>,
    {
        self.writer
            .write_start_element(XmlNamespace::Types, instruction);
        path.write_to_xml(&mut *self.writer)?;
        self.writer
            .write_start_element(XmlNamespace::Types, self.object_element);
        content(&mut *self.writer)?;
        self.writer.write_end_element()?;
        self.writer.write_end_element()?;
        self.written += 1;
        Ok(())
    }
}
