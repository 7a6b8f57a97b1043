//! ID types for blocks.

use serde::{Deserialize, Serialize};

/// Numeric identifier of a block type in the block registry.
///
/// Saves store the id as three decimal digits, so valid ids are `0..=999`.
/// Id 0 is reserved for the empty slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct BlockId(u16);

impl BlockId {
    /// The empty slot.
    pub const EMPTY: Self = Self(0);

    /// Largest id that fits the three-digit save field.
    pub const MAX: Self = Self(999);

    /// Creates a block id from a raw value.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Checks if this is the empty slot.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}", self.0)
    }
}
