//! Dense tile grid holding every layer of the world.
//!
//! The grid is a fixed `width x height` array of [`Cell`]s plus one surface
//! height per column. Each cell carries four independent [`Slot`]s (one per
//! [`Layer`]) and a single light value shared by all of them.
//!
//! All accessors are bounds-checked and fail with
//! [`WorldError::OutOfBounds`]; nothing ever wraps to an adjacent row.

use serde::{Deserialize, Serialize};
use strata_common::{BlockId, TilePos};

use crate::autotile::Orientation;
use crate::error::{WorldError, WorldResult};

/// One of the four independent planes stored per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Layer {
    /// Foreground, collidable blocks
    World,
    /// Non-collidable backdrop (cave walls)
    Back,
    /// Decoration (trees, flowers)
    Nature,
    /// Light emitters (torches)
    Light,
}

impl Layer {
    /// All layers in save-record order.
    pub const ALL: [Self; 4] = [Self::World, Self::Back, Self::Nature, Self::Light];

    /// Position of this layer inside a cell and inside a save record.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::World => 0,
            Self::Back => 1,
            Self::Nature => 2,
            Self::Light => 3,
        }
    }
}

/// Contents of one layer of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Slot {
    /// Block type (`BlockId::EMPTY` when unoccupied)
    pub block: BlockId,
    /// Auto-tiling variant
    pub orientation: Orientation,
}

impl Slot {
    /// The empty slot.
    pub const EMPTY: Self = Self {
        block: BlockId::EMPTY,
        orientation: Orientation::Unset,
    };

    /// Creates a slot holding `block` with the given orientation.
    #[must_use]
    pub const fn new(block: BlockId, orientation: Orientation) -> Self {
        Self { block, orientation }
    }

    /// Checks if the slot is unoccupied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.block.is_empty()
    }
}

/// A single grid position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cell {
    slots: [Slot; 4],
    darkness: f32,
}

impl Cell {
    /// Creates a cell from its slots and light value.
    #[must_use]
    pub const fn new(slots: [Slot; 4], darkness: f32) -> Self {
        Self { slots, darkness }
    }

    /// Returns the slot for a layer.
    #[must_use]
    pub const fn slot(&self, layer: Layer) -> Slot {
        self.slots[layer.index()]
    }

    /// Returns all four slots in [`Layer::ALL`] order.
    #[must_use]
    pub const fn slots(&self) -> &[Slot; 4] {
        &self.slots
    }

    /// Light value of the cell (higher is brighter).
    #[must_use]
    pub const fn darkness(&self) -> f32 {
        self.darkness
    }

    /// Checks if every layer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Slot::is_empty)
    }
}

/// The whole world: cells plus the per-column surface height.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldGrid {
    width: u32,
    height: u32,
    /// Row-major, `y * width + x`
    cells: Vec<Cell>,
    height_map: Vec<i32>,
}

impl WorldGrid {
    /// Creates an empty grid. Every surface height starts at 0.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let cell_count = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::default(); cell_count],
            height_map: vec![0; width as usize],
        }
    }

    /// Rebuilds a grid from raw parts, checking that the lengths agree.
    pub fn from_parts(
        width: u32,
        height: u32,
        cells: Vec<Cell>,
        height_map: Vec<i32>,
    ) -> WorldResult<Self> {
        let expected = width as usize * height as usize;
        if cells.len() != expected || height_map.len() != width as usize {
            return Err(WorldError::MalformedSaveRecord {
                line: 0,
                reason: format!(
                    "expected {expected} cells and {width} heights, got {} and {}",
                    cells.len(),
                    height_map.len()
                ),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
            height_map,
        })
    }

    /// Width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Checks if a position lies inside the grid.
    #[must_use]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Checks if a tile position lies inside the grid.
    #[must_use]
    pub const fn contains_pos(&self, pos: TilePos) -> bool {
        self.contains(pos.x, pos.y)
    }

    fn index(&self, x: i32, y: i32) -> WorldResult<usize> {
        if self.contains(x, y) {
            Ok(y as usize * self.width as usize + x as usize)
        } else {
            Err(WorldError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Returns the cell at a position.
    pub fn cell(&self, x: i32, y: i32) -> WorldResult<&Cell> {
        let index = self.index(x, y)?;
        Ok(&self.cells[index])
    }

    /// Returns one layer of a cell.
    pub fn slot(&self, layer: Layer, x: i32, y: i32) -> WorldResult<Slot> {
        Ok(self.cell(x, y)?.slot(layer))
    }

    /// Returns the block id stored in one layer of a cell.
    pub fn block(&self, layer: Layer, x: i32, y: i32) -> WorldResult<BlockId> {
        Ok(self.slot(layer, x, y)?.block)
    }

    /// Writes one layer of a cell. The cell's light value is kept.
    pub fn set_slot(
        &mut self,
        layer: Layer,
        x: i32,
        y: i32,
        block: BlockId,
        orientation: Orientation,
    ) -> WorldResult<()> {
        let index = self.index(x, y)?;
        self.cells[index].slots[layer.index()] = Slot::new(block, orientation);
        Ok(())
    }

    /// Resets one layer of a cell to empty.
    pub fn clear_slot(&mut self, layer: Layer, x: i32, y: i32) -> WorldResult<()> {
        let index = self.index(x, y)?;
        self.cells[index].slots[layer.index()] = Slot::EMPTY;
        Ok(())
    }

    /// Changes only the orientation of one layer of a cell.
    pub fn set_orientation(
        &mut self,
        layer: Layer,
        x: i32,
        y: i32,
        orientation: Orientation,
    ) -> WorldResult<()> {
        let index = self.index(x, y)?;
        self.cells[index].slots[layer.index()].orientation = orientation;
        Ok(())
    }

    /// Light value of a cell.
    ///
    /// The value is stored once per cell, so when the world slot is empty and
    /// the back slot is occupied this is already the backdrop's light.
    pub fn darkness(&self, x: i32, y: i32) -> WorldResult<f32> {
        Ok(self.cell(x, y)?.darkness)
    }

    /// Sets the light value for every layer of a cell.
    pub fn set_darkness(&mut self, x: i32, y: i32, value: f32) -> WorldResult<()> {
        let index = self.index(x, y)?;
        self.cells[index].darkness = value;
        Ok(())
    }

    /// Surface row of a column.
    pub fn surface(&self, x: i32) -> WorldResult<i32> {
        if x >= 0 && (x as u32) < self.width {
            Ok(self.height_map[x as usize])
        } else {
            Err(WorldError::OutOfBounds {
                x,
                y: 0,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Sets the surface row of a column.
    pub fn set_surface(&mut self, x: i32, y: i32) -> WorldResult<()> {
        if x >= 0 && (x as u32) < self.width {
            self.height_map[x as usize] = y;
            Ok(())
        } else {
            Err(WorldError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Per-column surface rows.
    #[must_use]
    pub fn height_map(&self) -> &[i32] {
        &self.height_map
    }

    /// All cells in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Checks if a position may receive light or collide: inside the grid
    /// and no more than `sky_margin` rows above its column's surface.
    #[must_use]
    pub fn is_valid_position(&self, x: i32, y: i32, sky_margin: i32) -> bool {
        self.contains(x, y) && y <= self.height_map[x as usize] + sky_margin
    }

    /// Iterates over every position, column by column (save-record order).
    pub fn positions(&self) -> impl Iterator<Item = TilePos> {
        let (width, height) = (self.width as i32, self.height as i32);
        (0..width).flat_map(move |x| (0..height).map(move |y| TilePos::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_empty() {
        let grid = WorldGrid::new(8, 4);
        assert_eq!(grid.cells().len(), 32);
        assert!(grid.cells().iter().all(Cell::is_empty));
        assert_eq!(grid.height_map(), &[0; 8]);
    }

    #[test]
    fn test_set_and_clear_slot() {
        let mut grid = WorldGrid::new(4, 4);
        let dirt = BlockId::new(1);
        grid.set_slot(Layer::World, 2, 3, dirt, Orientation::NN)
            .expect("in bounds");
        assert_eq!(
            grid.slot(Layer::World, 2, 3).expect("in bounds"),
            Slot::new(dirt, Orientation::NN)
        );
        assert!(grid.slot(Layer::Back, 2, 3).expect("in bounds").is_empty());

        grid.clear_slot(Layer::World, 2, 3).expect("in bounds");
        assert!(grid.slot(Layer::World, 2, 3).expect("in bounds").is_empty());
    }

    #[test]
    fn test_out_of_bounds_is_rejected() {
        let mut grid = WorldGrid::new(4, 4);
        assert!(matches!(
            grid.slot(Layer::World, 4, 0),
            Err(WorldError::OutOfBounds { x: 4, y: 0, .. })
        ));
        assert!(grid.set_darkness(-1, 2, 0.5).is_err());
        assert!(grid.surface(4).is_err());
        // A row-major index of (4, 0) would alias (0, 1): make sure it did not.
        assert_eq!(grid.darkness(0, 1).expect("in bounds"), 0.0);
    }

    #[test]
    fn test_darkness_shared_across_layers() {
        let mut grid = WorldGrid::new(4, 4);
        grid.set_slot(Layer::Back, 1, 1, BlockId::new(4), Orientation::Unset)
            .expect("in bounds");
        grid.set_darkness(1, 1, 0.7).expect("in bounds");
        grid.set_slot(Layer::Nature, 1, 1, BlockId::new(9), Orientation::Unset)
            .expect("in bounds");
        assert!((grid.darkness(1, 1).expect("in bounds") - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_valid_position_respects_sky_margin() {
        let mut grid = WorldGrid::new(4, 40);
        grid.set_surface(1, 10).expect("in bounds");
        assert!(grid.is_valid_position(1, 20, 10));
        assert!(!grid.is_valid_position(1, 21, 10));
        assert!(!grid.is_valid_position(4, 0, 10));
    }

    #[test]
    fn test_positions_are_column_major() {
        let grid = WorldGrid::new(2, 3);
        let positions: Vec<_> = grid.positions().collect();
        assert_eq!(positions[0], TilePos::new(0, 0));
        assert_eq!(positions[1], TilePos::new(0, 1));
        assert_eq!(positions[3], TilePos::new(1, 0));
        assert_eq!(positions.len(), 6);
    }

    #[test]
    fn test_from_parts_checks_lengths() {
        assert!(WorldGrid::from_parts(2, 2, vec![Cell::default(); 3], vec![0; 2]).is_err());
        assert!(WorldGrid::from_parts(2, 2, vec![Cell::default(); 4], vec![0; 2]).is_ok());
    }
}
