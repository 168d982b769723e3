//! Static property tables.
//!
//! Each module declares one object type's definitions as `static` items and
//! a `schema` function registering them in wire order.

pub mod contact;
pub mod folder;
pub mod item;
pub mod message;
