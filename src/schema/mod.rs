//! Declarative schema layer.
//!
//! Property definitions, their flags and scalar codec, the ordered schemas
//! built from the static tables, and the wire-level ways of referring to
//! properties (field paths, extended properties, property sets).

pub mod codec;
pub mod definition;
pub mod extended;
pub mod field;
pub mod flags;
pub mod property_set;
pub mod registry;
pub mod tables;

pub use codec::ScalarKind;
pub use definition::{ComplexFactory, PropertyDefinition, PropertyKind, default_instance};
pub use extended::{
    DefaultExtendedPropertySet, ExtendedPropertyDefinition, MapiPropertyType, PropertyKey,
    PropertySetId,
};
pub use field::{FieldPath, FieldReference};
pub use flags::{FlagGate, PropertyDefinitionFlags};
pub use property_set::{AdditionalProperty, BasePropertySet, PropertySet};
pub use registry::{Schema, SchemaBuilder, SchemaRegistry, SchemaTarget};
