//! Behaviour flags carried by property definitions.

use crate::common::version::ExchangeVersion;
use bitflags::bitflags;

bitflags! {
    /// Capabilities and load behaviour of a property.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyDefinitionFlags: u16 {
        /// Reading an unset value constructs an empty instance
        const AUTO_INSTANTIATE_ON_READ = 0x0001;
        /// Loading merges into the existing complex value instead of replacing it
        const REUSE_INSTANCE = 0x0002;
        /// Value may be assigned on a new object
        const CAN_SET = 0x0004;
        /// Value may be changed on an existing object
        const CAN_UPDATE = 0x0008;
        /// Value may be removed from an existing object
        const CAN_DELETE = 0x0010;
        /// Property may be used in search restrictions
        const CAN_FIND = 0x0020;
        /// Only loaded when requested by name
        const MUST_BE_EXPLICITLY_LOADED = 0x0040;
        /// Collection updates may append instead of replacing
        const UPDATE_COLLECTION_ITEMS = 0x0080;

        /// Settable, updatable, deletable and searchable
        const EDITABLE = Self::CAN_SET.bits()
            | Self::CAN_UPDATE.bits()
            | Self::CAN_DELETE.bits()
            | Self::CAN_FIND.bits();
        /// Settable and updatable but never removed
        const REQUIRED = Self::CAN_SET.bits() | Self::CAN_UPDATE.bits() | Self::CAN_FIND.bits();
    }
}

/// A flag that only takes effect from a given server version on.
///
/// The flag must also be present in the definition's own flag set; the gate
/// narrows when it applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagGate {
    pub flags: PropertyDefinitionFlags,
    pub since: ExchangeVersion,
}

impl FlagGate {
    pub const fn new(flags: PropertyDefinitionFlags, since: ExchangeVersion) -> Self {
        Self { flags, since }
    }
}
