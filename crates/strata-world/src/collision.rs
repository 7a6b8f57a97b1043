//! Collision queries against the foreground layer.
//!
//! The world does no physics itself; these queries expose which tiles are
//! solid so a host can resolve movement.
//!
//! ## Overview
//!
//! - Point queries (is this tile solid?)
//! - Pixel lookups (which tile holds this pixel?)
//! - Box queries (all solid tiles in a region)
//! - Ground finding (first solid tile below a point)
//! - Box overlap for pixel-space hit boxes

use strata_common::{PixelPos, TilePos};

use crate::grid::Layer;
use crate::world::World;

/// Axis-aligned box in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Lower-left corner
    pub min: PixelPos,
    /// Upper-right corner
    pub max: PixelPos,
}

impl Aabb {
    /// Creates a box from its corners.
    #[must_use]
    pub const fn new(min: PixelPos, max: PixelPos) -> Self {
        Self { min, max }
    }

    /// Creates a box from its lower-left corner and size.
    #[must_use]
    pub fn from_size(min: PixelPos, width: f32, height: f32) -> Self {
        Self {
            min,
            max: PixelPos::new(min.x + width, min.y + height),
        }
    }
}

/// Collision queries over a world.
pub struct CollisionQuery<'a> {
    world: &'a World,
    block_size: u32,
}

impl<'a> CollisionQuery<'a> {
    /// Creates a query using the world's configured block size.
    #[must_use]
    pub fn new(world: &'a World) -> Self {
        Self {
            world,
            block_size: world.config().size.block_size,
        }
    }

    /// Checks if a tile blocks movement. Everything outside the grid does.
    #[must_use]
    pub fn is_solid(&self, pos: TilePos) -> bool {
        match self.world.grid().slot(Layer::World, pos.x, pos.y) {
            Ok(slot) => !slot.is_empty() && self.world.registry().is_solid(slot.block),
            Err(_) => true,
        }
    }

    /// The tile containing a pixel.
    #[must_use]
    pub fn tile_at_pixel(&self, pixel: PixelPos) -> TilePos {
        pixel.to_tile(self.block_size)
    }

    /// Finds all solid tiles within a region (both corners inclusive).
    #[must_use]
    pub fn box_query(&self, min: TilePos, max: TilePos) -> Vec<TilePos> {
        let mut result = Vec::new();
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                let pos = TilePos::new(x, y);
                if self.is_solid(pos) {
                    result.push(pos);
                }
            }
        }
        result
    }

    /// Finds the first solid tile at or below `pos`, searching down to the
    /// bottom row.
    #[must_use]
    pub fn ground_below(&self, pos: TilePos) -> Option<TilePos> {
        let top = pos.y.min(self.world.height() as i32 - 1);
        (0..=top)
            .rev()
            .map(|y| TilePos::new(pos.x, y))
            .find(|&tile| self.world.grid().contains_pos(tile) && self.is_solid(tile))
    }

    /// Checks if an entity `height` tiles tall can stand with its feet
    /// at `pos`: solid below, clear for its full height.
    #[must_use]
    pub fn can_stand_at(&self, pos: TilePos, height: u32) -> bool {
        if !self.is_solid(TilePos::new(pos.x, pos.y - 1)) {
            return false;
        }
        (0..height as i32).all(|dy| !self.is_solid(TilePos::new(pos.x, pos.y + dy)))
    }

    /// Checks if a pixel-space box touches any solid tile. The max edge is
    /// exclusive, so a box resting exactly on a tile does not overlap it.
    #[must_use]
    pub fn overlaps_solid(&self, aabb: Aabb) -> bool {
        let min = self.tile_at_pixel(aabb.min);
        let size = self.block_size as f32;
        let max = TilePos::new(
            ((aabb.max.x / size).ceil() as i32 - 1).max(min.x),
            ((aabb.max.y / size).ceil() as i32 - 1).max(min.y),
        );
        (min.y..=max.y).any(|y| (min.x..=max.x).any(|x| self.is_solid(TilePos::new(x, y))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autotile::Orientation;
    use crate::blocks::BlockRegistry;
    use crate::config::WorldConfig;

    /// 16x16 world with a floor of dirt at row 2 and a backdirt tile at (8, 3).
    fn test_world() -> World {
        let registry = BlockRegistry::builtin().expect("builtin table is valid");
        let dirt = registry.id_of("dirt").expect("defined");
        let backdirt = registry.id_of("backdirt").expect("defined");
        let mut world =
            World::new(WorldConfig::with_size(16, 16), registry).expect("palette resolves");
        let grid = world.grid_mut();
        for x in 0..16 {
            for y in 0..=2 {
                grid.set_slot(Layer::World, x, y, dirt, Orientation::Unset)
                    .expect("in bounds");
            }
        }
        grid.set_slot(Layer::Back, 8, 3, backdirt, Orientation::Unset)
            .expect("in bounds");
        world
    }

    #[test]
    fn test_is_solid() {
        let world = test_world();
        let query = CollisionQuery::new(&world);
        assert!(query.is_solid(TilePos::new(5, 2)));
        assert!(!query.is_solid(TilePos::new(5, 3)));
        // Backdrop never collides.
        assert!(!query.is_solid(TilePos::new(8, 3)));
        // Out of bounds
        assert!(query.is_solid(TilePos::new(-1, 5)));
        assert!(query.is_solid(TilePos::new(5, 16)));
    }

    #[test]
    fn test_tile_at_pixel() {
        let world = test_world();
        let query = CollisionQuery::new(&world);
        assert_eq!(query.tile_at_pixel(PixelPos::new(65.0, 31.9)), TilePos::new(2, 0));
        assert_eq!(query.tile_at_pixel(PixelPos::new(-1.0, 0.0)), TilePos::new(-1, 0));
    }

    #[test]
    fn test_box_query() {
        let world = test_world();
        let query = CollisionQuery::new(&world);
        let hits = query.box_query(TilePos::new(1, 1), TilePos::new(3, 4));
        assert_eq!(hits.len(), 6);
        assert!(hits.iter().all(|pos| pos.y <= 2));
    }

    #[test]
    fn test_ground_below() {
        let world = test_world();
        let query = CollisionQuery::new(&world);
        assert_eq!(query.ground_below(TilePos::new(4, 10)), Some(TilePos::new(4, 2)));
        assert_eq!(query.ground_below(TilePos::new(4, 99)), Some(TilePos::new(4, 2)));
        assert_eq!(query.ground_below(TilePos::new(40, 10)), None);
    }

    #[test]
    fn test_can_stand_at() {
        let world = test_world();
        let query = CollisionQuery::new(&world);
        assert!(query.can_stand_at(TilePos::new(4, 3), 2));
        assert!(!query.can_stand_at(TilePos::new(4, 5), 2));
        assert!(!query.can_stand_at(TilePos::new(4, 2), 2));
    }

    #[test]
    fn test_overlaps_solid() {
        let world = test_world();
        let query = CollisionQuery::new(&world);
        // Resting exactly on top of the floor.
        let standing = Aabb::from_size(PixelPos::new(64.0, 96.0), 32.0, 64.0);
        assert!(!query.overlaps_solid(standing));
        // Sunk one pixel into it.
        let sunk = Aabb::from_size(PixelPos::new(64.0, 95.0), 32.0, 64.0);
        assert!(query.overlaps_solid(sunk));
    }
}
