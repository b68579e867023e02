//! Pre-computed type metadata flags.
//!
//! Flags are computed once at construction from the children's cached
//! flags, enabling O(1) queries that gate substitution and free-variable
//! traversal without walking the type.

use bitflags::bitflags;

bitflags! {
    /// Pre-computed type properties.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct TypeFlags: u8 {
        /// Contains free type variables.
        const HAS_VAR = 1 << 0;
        /// Contains the `self` type.
        const HAS_SELF = 1 << 1;
        /// Contains the `instance` type.
        const HAS_INSTANCE = 1 << 2;
        /// Contains the `class` type.
        const HAS_CLASS = 1 << 3;
        /// Anything the self/instance/class triple can replace.
        const HAS_SELF_CONTEXT =
            Self::HAS_SELF.bits() | Self::HAS_INSTANCE.bits() | Self::HAS_CLASS.bits();
    }
}
