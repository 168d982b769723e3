//! XML plumbing shared by the schema, property and service layers.

pub mod escape;
pub mod namespace;
pub mod reader;
pub mod writer;

pub use escape::{escape_xml, resolve_entity, unescape_references, unescape_xml};
pub use namespace::XmlNamespace;
pub use reader::{EwsXmlReader, XmlAttribute, XmlNodeType};
pub use writer::EwsXmlWriter;
