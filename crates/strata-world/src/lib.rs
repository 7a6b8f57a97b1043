//! # Strata World
//!
//! World model for Strata, a 2D side-scrolling sandbox.
//!
//! This crate handles:
//! - The layered tile grid and its block registry
//! - Seeded multi-pass terrain generation (caves, nature, dungeons)
//! - Auto-tiling and flood-fill lighting
//! - Incremental place/destroy edits
//! - Text and binary saves, collision queries and preview images

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod autotile;
pub mod blocks;
pub mod caves;
pub mod collision;
pub mod config;
pub mod dungeon;
pub mod edit;
pub mod error;
pub mod fractal;
pub mod generation;
pub mod grid;
pub mod lighting;
pub mod nature;
pub mod observer;
pub mod persistence;
pub mod preview;
pub mod serialize;
pub mod snapshot;
pub mod world;

#[cfg(test)]
mod pipeline_tests;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::autotile::*;
    pub use crate::blocks::*;
    pub use crate::caves::*;
    pub use crate::collision::*;
    pub use crate::config::*;
    pub use crate::dungeon::*;
    pub use crate::edit::*;
    pub use crate::error::*;
    pub use crate::fractal::*;
    pub use crate::generation::*;
    pub use crate::grid::*;
    pub use crate::lighting::*;
    pub use crate::nature::*;
    pub use crate::observer::*;
    pub use crate::persistence::*;
    pub use crate::preview::*;
    pub use crate::serialize::*;
    pub use crate::snapshot::*;
    pub use crate::world::*;
}

pub use prelude::*;
