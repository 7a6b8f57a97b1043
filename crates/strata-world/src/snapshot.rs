//! Binary world snapshots.
//!
//! Layout: a little-endian `u32` header length, the bincode-encoded
//! [`SnapshotHeader`], then an LZ4 block (size prepended) holding the column
//! heights followed by one packed [`RawCell`] per cell in row-major order.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use strata_common::{BlockId, FormatVersion, SNAPSHOT_MAGIC};
use thiserror::Error;
use tracing::info;

use crate::autotile::Orientation;
use crate::blocks::BlockRegistry;
use crate::error::{WorldError, WorldResult};
use crate::grid::{Cell, Layer, Slot, WorldGrid};
use crate::world::World;

/// Snapshot errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Serialization failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),
    /// Deserialization failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),
    /// Invalid magic bytes
    #[error("Invalid snapshot format")]
    InvalidFormat,
    /// Version mismatch
    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Expected version
        expected: String,
        /// Actual version
        actual: String,
    },
    /// Compression failed
    #[error("Compression failed: {0}")]
    CompressionFailed(String),
}

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Snapshot header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    /// Magic bytes for format identification
    pub magic: [u8; 4],
    /// Layout version
    pub version: FormatVersion,
    /// World width in cells
    pub width: u32,
    /// World height in cells
    pub height: u32,
    /// Compression type (0 = none, 1 = lz4)
    pub compression: u8,
}

impl SnapshotHeader {
    /// Creates a header for a grid of the given size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FormatVersion::SNAPSHOT,
            width,
            height,
            compression: 1,
        }
    }

    /// Validates the header.
    pub fn validate(&self) -> SnapshotResult<()> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(SnapshotError::InvalidFormat);
        }
        if !FormatVersion::SNAPSHOT.reads(self.version) {
            return Err(SnapshotError::VersionMismatch {
                expected: FormatVersion::SNAPSHOT.to_string(),
                actual: self.version.to_string(),
            });
        }
        Ok(())
    }
}

/// Packed cell record (16 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct RawCell {
    /// Block id per layer
    pub blocks: [u16; 4],
    /// Orientation code per layer
    pub orientations: [u8; 4],
    /// Light value
    pub darkness: f32,
}

impl From<&Cell> for RawCell {
    fn from(cell: &Cell) -> Self {
        let mut raw = Self::zeroed();
        for layer in Layer::ALL {
            let slot = cell.slot(layer);
            raw.blocks[layer.index()] = slot.block.raw();
            raw.orientations[layer.index()] = slot.orientation.code();
        }
        raw.darkness = cell.darkness();
        raw
    }
}

impl RawCell {
    fn to_cell(self, registry: &BlockRegistry) -> WorldResult<Cell> {
        let mut slots = [Slot::EMPTY; 4];
        for (i, slot) in slots.iter_mut().enumerate() {
            let block = BlockId::new(self.blocks[i]);
            if block.is_empty() {
                continue;
            }
            if registry.by_id(block).is_none() {
                return Err(WorldError::UnknownBlockId(block.raw()));
            }
            let code = self.orientations[i];
            let orientation = Orientation::from_code(code).ok_or_else(|| {
                SnapshotError::DeserializationFailed(format!(
                    "orientation code {code} out of range"
                ))
            })?;
            *slot = Slot::new(block, orientation);
        }
        Ok(Cell::new(slots, self.darkness))
    }
}

/// Encodes a grid as a binary snapshot.
pub fn encode_snapshot(grid: &WorldGrid) -> SnapshotResult<Vec<u8>> {
    let header = SnapshotHeader::new(grid.width(), grid.height());

    let header_bytes = bincode::serialize(&header)
        .map_err(|e| SnapshotError::SerializationFailed(e.to_string()))?;

    let raw_cells: Vec<RawCell> = grid.cells().iter().map(RawCell::from).collect();
    let mut body = Vec::with_capacity(
        grid.height_map().len() * 4 + raw_cells.len() * std::mem::size_of::<RawCell>(),
    );
    for height in grid.height_map() {
        body.extend_from_slice(&height.to_le_bytes());
    }
    body.extend_from_slice(bytemuck::cast_slice(&raw_cells));

    let compressed = lz4_flex::compress_prepend_size(&body);

    let mut result = Vec::with_capacity(header_bytes.len() + compressed.len() + 4);
    result.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
    result.extend_from_slice(&header_bytes);
    result.extend_from_slice(&compressed);
    Ok(result)
}

/// Decodes a binary snapshot. Block ids are checked against `registry`.
pub fn decode_snapshot(bytes: &[u8], registry: &BlockRegistry) -> WorldResult<WorldGrid> {
    if bytes.len() < 8 {
        return Err(SnapshotError::DeserializationFailed("data too short".into()).into());
    }

    let header_len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    if bytes.len() < 4 + header_len {
        return Err(SnapshotError::DeserializationFailed("header length mismatch".into()).into());
    }

    let header: SnapshotHeader = bincode::deserialize(&bytes[4..4 + header_len])
        .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))?;
    header.validate()?;

    let body = lz4_flex::decompress_size_prepended(&bytes[4 + header_len..])
        .map_err(|e| SnapshotError::CompressionFailed(e.to_string()))?;

    let width = header.width as usize;
    let cell_size = std::mem::size_of::<RawCell>();
    let heights_len = width.checked_mul(4);
    let expected = width
        .checked_mul(header.height as usize)
        .and_then(|cells| cells.checked_mul(cell_size))
        .zip(heights_len)
        .and_then(|(cells_len, heights_len)| cells_len.checked_add(heights_len));
    let (Some(expected), Some(heights_len)) = (expected, heights_len) else {
        return Err(SnapshotError::DeserializationFailed(format!(
            "{}x{} grid is too large",
            header.width, header.height
        ))
        .into());
    };
    if body.len() != expected {
        return Err(SnapshotError::DeserializationFailed("cell data size mismatch".into()).into());
    }
    let (height_bytes, cell_bytes) = body.split_at(heights_len);

    let height_map: Vec<i32> = height_bytes
        .chunks_exact(4)
        .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    let cells = cell_bytes
        .chunks_exact(cell_size)
        .map(|chunk| bytemuck::pod_read_unaligned::<RawCell>(chunk).to_cell(registry))
        .collect::<WorldResult<Vec<_>>>()?;

    WorldGrid::from_parts(header.width, header.height, cells, height_map)
}

impl World {
    /// Encodes the world's grid as a binary snapshot.
    pub fn to_snapshot(&self) -> WorldResult<Vec<u8>> {
        Ok(encode_snapshot(self.grid())?)
    }

    /// Replaces the grid with a decoded snapshot. On failure the current
    /// grid is left untouched.
    pub fn load_snapshot(&mut self, bytes: &[u8]) -> WorldResult<()> {
        let grid = decode_snapshot(bytes, self.registry())?;
        self.replace_grid(grid)?;
        info!("Loaded {}x{} world from snapshot", self.width(), self.height());
        Ok(())
    }
}
