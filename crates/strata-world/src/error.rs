//! Error types for world operations.

use thiserror::Error;

use crate::snapshot::SnapshotError;

/// World errors.
#[derive(Debug, Error)]
pub enum WorldError {
    /// Grid access outside `[0, width) x [0, height)`
    #[error("Position ({x}, {y}) is outside the {width}x{height} world")]
    OutOfBounds {
        /// X coordinate
        x: i32,
        /// Y coordinate
        y: i32,
        /// World width
        width: u32,
        /// World height
        height: u32,
    },

    /// A block name is not present in the registry
    #[error("Missing block definition: {0}")]
    MissingBlockDefinition(String),

    /// A block id is not present in the registry
    #[error("Unknown block id: {0:03}")]
    UnknownBlockId(u16),

    /// The block registry table is inconsistent
    #[error("Invalid block registry: {0}")]
    InvalidRegistry(String),

    /// Failed to parse the block registry table
    #[error("Failed to parse block registry: {0}")]
    RegistryParse(#[from] toml::de::Error),

    /// The world is too small to generate
    #[error("World size {width}x{height} is below the {min}x{min} minimum")]
    InvalidSize {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Smallest accepted side
        min: u32,
    },

    /// A save line could not be decoded
    #[error("Malformed save record at line {line}: {reason}")]
    MalformedSaveRecord {
        /// 1-based line number
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// Binary snapshot failure
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Failed to encode the preview image
    #[error("Preview image error: {0}")]
    Preview(#[from] image::ImageError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for world operations.
pub type WorldResult<T> = Result<T, WorldError>;
