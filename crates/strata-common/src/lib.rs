//! # Strata Common
//!
//! Small value types shared by the Strata crates:
//! - Tile and pixel coordinates, axis directions
//! - Block ids
//! - Snapshot format version and magic bytes

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod ids;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::ids::*;
    pub use crate::version::*;
}

pub use prelude::*;
