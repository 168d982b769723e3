//! Lists of `<t:String>` values, e.g. `Categories`.

use crate::common::error::Result;
use crate::common::xml::{EwsXmlReader, EwsXmlWriter, XmlNamespace};
use crate::property::change::{OwnerHandle, notify};
use crate::property::complex::ComplexProperty;

#[derive(Debug, Clone, Default)]
pub struct StringList {
    items: Vec<String>,
    owner: Option<OwnerHandle>,
}

impl StringList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: impl Into<String>) {
        self.items.push(value.into());
        notify(&self.owner);
    }

    /// Remove the first occurrence of `value`.
    pub fn remove(&mut self, value: &str) -> bool {
        match self.items.iter().position(|item| item == value) {
            Some(index) => {
                self.items.remove(index);
                notify(&self.owner);
                true
            },
            None => false,
        }
    }

    pub fn clear(&mut self) {
        if !self.items.is_empty() {
            self.items.clear();
            notify(&self.owner);
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        self.items.iter().any(|item| item == value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for StringList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(Into::into).collect(),
            owner: None,
        }
    }
}

impl ComplexProperty for StringList {
    fn try_read_element(&mut self, reader: &mut EwsXmlReader<'_>) -> Result<bool> {
        if !reader.is_start_element(XmlNamespace::Types, "String") {
            return Ok(false);
        }
        self.items.push(reader.read_value()?);
        Ok(true)
    }

    fn write_elements(&self, writer: &mut EwsXmlWriter) -> Result<()> {
        for item in &self.items {
            writer.write_element_value(XmlNamespace::Types, "String", item)?;
        }
        Ok(())
    }

    fn set_owner(&mut self, owner: Option<OwnerHandle>) {
        self.owner = owner;
    }
}
