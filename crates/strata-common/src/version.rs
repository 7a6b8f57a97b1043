//! Binary snapshot identification.

use serde::{Deserialize, Serialize};

/// Leading bytes of every binary snapshot header.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"STWD";

/// Snapshot layout version. A reader accepts data written with the same
/// major version; minor bumps only append fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormatVersion {
    /// Layout changes old readers cannot follow
    pub major: u16,
    /// Compatible additions
    pub minor: u16,
}

impl FormatVersion {
    /// Version written by this build.
    pub const SNAPSHOT: Self = Self::new(1, 0);

    /// Creates a version.
    #[must_use]
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Checks if a reader at this version can decode data stamped `written`.
    #[must_use]
    pub const fn reads(self, written: Self) -> bool {
        self.major == written.major
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
