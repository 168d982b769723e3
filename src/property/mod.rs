//! Property values, change tracking and the property bag.
//!
//! Scalar values live directly in a [`PropertyBag`]; structured values
//! implement [`ComplexProperty`] and report their own mutations back to the
//! bag through an [`OwnerHandle`](change::OwnerHandle).

pub mod bag;
pub mod change;
pub mod collection;
pub mod complex;
pub mod dictionary;
pub mod types;
pub mod update;
pub mod value;

pub use bag::PropertyBag;
pub use change::{ChangeKind, ChangeLog, OwnerHandle};
pub use collection::{CollectionItem, ComplexPropertyCollection};
pub use complex::{CollectionUpdate, ComplexProperty, ComplexPropertyExt};
pub use dictionary::{DictionaryEntry, DictionaryKey, DictionaryProperty, EntryScope};
pub use update::UpdateSink;
pub use value::{PropertyLookup, PropertyValue, ScalarValue};
