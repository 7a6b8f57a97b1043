//! Flood-fill light propagation.
//!
//! Light spreads from a source to its four neighbours, losing the
//! `light_block` amount of every cell it enters. A cell is only updated (and
//! only spreads further) when the incoming light is strictly brighter than
//! what it already holds, so the fill stops on its own and the final state
//! is the brightest value reaching each cell by any path.
//!
//! The fill runs on an explicit worklist. Cells outside the grid or more
//! than `sky_margin` rows above their column's surface are never lit.

use crate::blocks::BlockRegistry;
use crate::error::WorldResult;
use crate::grid::{Layer, WorldGrid};

/// Lighting operations over a grid.
pub struct LightPropagator<'a> {
    grid: &'a mut WorldGrid,
    registry: &'a BlockRegistry,
    sky_margin: i32,
}

impl<'a> LightPropagator<'a> {
    /// Creates a propagator.
    pub fn new(grid: &'a mut WorldGrid, registry: &'a BlockRegistry, sky_margin: i32) -> Self {
        Self {
            grid,
            registry,
            sky_margin,
        }
    }

    /// Light lost when entering `(x, y)`. Only the foreground block counts;
    /// an empty foreground attenuates like air whatever the backdrop holds.
    pub fn light_block_at(&self, x: i32, y: i32) -> WorldResult<f32> {
        let world = self.grid.slot(Layer::World, x, y)?.block;
        Ok(self.registry.light_block(world))
    }

    /// Tries to light one cell. Returns the new light when the cell got
    /// brighter.
    fn relax(&mut self, x: i32, y: i32, light: f32) -> WorldResult<Option<f32>> {
        if !self.grid.is_valid_position(x, y, self.sky_margin) {
            return Ok(None);
        }
        let new_light = light - self.light_block_at(x, y)?;
        if new_light <= self.grid.darkness(x, y)? {
            return Ok(None);
        }
        self.grid.set_darkness(x, y, new_light)?;
        Ok(Some(new_light))
    }

    /// Floods light from `(x, y)`. Returns the number of cell updates.
    pub fn create_lighting(&mut self, x: i32, y: i32, light: f32) -> WorldResult<usize> {
        let mut updates = 0;
        let mut pending = vec![(x, y, light)];
        while let Some((cx, cy, incoming)) = pending.pop() {
            let Some(lit) = self.relax(cx, cy, incoming)? else {
                continue;
            };
            updates += 1;
            // Reverse order so the right neighbour is expanded first.
            pending.extend([
                (cx, cy - 1, lit),
                (cx - 1, cy, lit),
                (cx, cy + 1, lit),
                (cx + 1, cy, lit),
            ]);
        }
        Ok(updates)
    }

    /// Floods light from `(x, y)` for at most `limit` steps.
    ///
    /// The budget shrinks by one per step and the fill stops at zero no
    /// matter how much light remains.
    pub fn create_lighting_limited(
        &mut self,
        x: i32,
        y: i32,
        light: f32,
        limit: u32,
    ) -> WorldResult<usize> {
        let mut updates = 0;
        let mut pending = vec![(x, y, light, limit)];
        while let Some((cx, cy, incoming, budget)) = pending.pop() {
            if budget == 0 {
                continue;
            }
            let Some(lit) = self.relax(cx, cy, incoming)? else {
                continue;
            };
            updates += 1;
            let next = budget - 1;
            pending.extend([
                (cx, cy - 1, lit, next),
                (cx - 1, cy, lit, next),
                (cx, cy + 1, lit, next),
                (cx + 1, cy, lit, next),
            ]);
        }
        Ok(updates)
    }

    /// Recomputes one cell from its neighbours: the brightest neighbour
    /// minus the cell's own light-block amount, clamped to `[0, 1]`.
    pub fn fix_lighting_at(&mut self, x: i32, y: i32) -> WorldResult<f32> {
        let mut brightest = 0.0_f32;
        for (nx, ny) in [(x + 1, y), (x, y + 1), (x - 1, y), (x, y - 1)] {
            if let Ok(light) = self.grid.darkness(nx, ny) {
                brightest = brightest.max(light);
            }
        }
        let value = (brightest - self.light_block_at(x, y)?).clamp(0.0, 1.0);
        self.grid.set_darkness(x, y, value)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autotile::Orientation;
    use crate::blocks::BlockDef;
    use proptest::prelude::*;

    fn open_grid(width: u32, height: u32) -> WorldGrid {
        let mut grid = WorldGrid::new(width, height);
        for x in 0..width as i32 {
            grid.set_surface(x, height as i32 - 1).expect("in bounds");
        }
        grid
    }

    fn fading_air(step: f32) -> BlockRegistry {
        BlockRegistry::from_defs(vec![
            BlockDef::new("air", 0).with_light_block(step),
            BlockDef::new("wall", 1).with_light_block(0.5),
            BlockDef::new("glass", 2).with_light_block(0.0).as_back(),
        ])
        .expect("valid table")
    }

    #[test]
    fn test_light_fades_with_distance() {
        let mut grid = open_grid(20, 20);
        let registry = fading_air(0.2);
        LightPropagator::new(&mut grid, &registry, 10)
            .create_lighting(5, 5, 1.1)
            .expect("in bounds");

        assert!((grid.darkness(5, 5).expect("in bounds") - 0.9).abs() < 1e-5);
        assert!((grid.darkness(6, 5).expect("in bounds") - 0.7).abs() < 1e-5);
        assert!((grid.darkness(5, 7).expect("in bounds") - 0.5).abs() < 1e-5);
        assert_eq!(grid.darkness(10, 5).expect("in bounds"), 0.0);
    }

    #[test]
    fn test_blocks_attenuate() {
        let mut grid = open_grid(10, 3);
        let registry = fading_air(0.0);
        grid.set_slot(Layer::World, 3, 1, registry.id_of("wall").expect("defined"), Orientation::Unset)
            .expect("in bounds");
        for y in [0, 2] {
            grid.set_slot(Layer::World, 3, y, registry.id_of("wall").expect("defined"), Orientation::Unset)
                .expect("in bounds");
        }
        LightPropagator::new(&mut grid, &registry, 10)
            .create_lighting(0, 1, 0.9)
            .expect("in bounds");
        assert!((grid.darkness(2, 1).expect("in bounds") - 0.9).abs() < 1e-5);
        assert!((grid.darkness(3, 1).expect("in bounds") - 0.4).abs() < 1e-5);
        assert!((grid.darkness(9, 1).expect("in bounds") - 0.4).abs() < 1e-5);
    }

    #[test]
    fn test_backdrop_does_not_attenuate() {
        let mut grid = open_grid(10, 3);
        let registry = fading_air(0.0);
        let glass = registry.id_of("glass").expect("defined");
        let wall = registry.id_of("wall").expect("defined");
        for x in 0..10 {
            grid.set_slot(Layer::Back, x, 1, glass, Orientation::Unset)
                .expect("in bounds");
        }
        // A wall behind the fill is ignored too.
        grid.set_slot(Layer::Back, 4, 1, wall, Orientation::Unset)
            .expect("in bounds");

        let mut light = LightPropagator::new(&mut grid, &registry, 10);
        assert_eq!(light.light_block_at(4, 1).expect("in bounds"), 0.0);
        light.create_lighting(1, 1, 0.9).expect("in bounds");
        assert!((grid.darkness(1, 1).expect("in bounds") - 0.9).abs() < 1e-6);
        assert!((grid.darkness(9, 1).expect("in bounds") - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_empty_foreground_uses_air() {
        let mut grid = open_grid(4, 4);
        let registry = fading_air(0.3);
        grid.set_slot(Layer::Back, 1, 1, registry.id_of("glass").expect("defined"), Orientation::Unset)
            .expect("in bounds");
        let light = LightPropagator::new(&mut grid, &registry, 10);
        assert!((light.light_block_at(1, 1).expect("in bounds") - 0.3).abs() < 1e-6);
        assert!((light.light_block_at(2, 1).expect("in bounds") - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_sky_margin_stops_light() {
        let mut grid = WorldGrid::new(5, 30);
        let registry = fading_air(0.0);
        LightPropagator::new(&mut grid, &registry, 10)
            .create_lighting(2, 0, 0.9)
            .expect("in bounds");
        assert!(grid.darkness(2, 10).expect("in bounds") > 0.0);
        assert_eq!(grid.darkness(2, 11).expect("in bounds"), 0.0);
        // Source itself outside the valid region does nothing.
        let updates = LightPropagator::new(&mut grid, &registry, 10)
            .create_lighting(2, 25, 0.9)
            .expect("in bounds");
        assert_eq!(updates, 0);
    }

    #[test]
    fn test_limited_fill_respects_budget() {
        let mut grid = open_grid(30, 30);
        let registry = fading_air(0.0);
        LightPropagator::new(&mut grid, &registry, 10)
            .create_lighting_limited(15, 15, 0.8, 3)
            .expect("in bounds");
        assert!(grid.darkness(17, 15).expect("in bounds") > 0.0);
        assert_eq!(grid.darkness(18, 15).expect("in bounds"), 0.0);
        assert_eq!(grid.darkness(15, 12).expect("in bounds"), 0.0);

        let updates = LightPropagator::new(&mut grid, &registry, 10)
            .create_lighting_limited(0, 0, 0.8, 0)
            .expect("in bounds");
        assert_eq!(updates, 0);
    }

    #[test]
    fn test_fix_lighting_at() {
        let mut grid = open_grid(5, 5);
        let registry = fading_air(0.1);
        grid.set_darkness(1, 2, 0.6).expect("in bounds");
        grid.set_darkness(2, 3, 0.8).expect("in bounds");
        grid.set_darkness(2, 2, 0.0).expect("in bounds");
        let value = LightPropagator::new(&mut grid, &registry, 10)
            .fix_lighting_at(2, 2)
            .expect("in bounds");
        assert!((value - 0.7).abs() < 1e-6);

        // Corner cells only look at in-bounds neighbours; result never negative.
        let value = LightPropagator::new(&mut grid, &registry, 10)
            .fix_lighting_at(4, 0)
            .expect("in bounds");
        assert_eq!(value, 0.0);
    }

    proptest! {
        #[test]
        fn prop_monotone_bounded_and_idempotent(
            walls in proptest::collection::vec(any::<bool>(), 144),
            sx in 0i32..12,
            sy in 0i32..12,
            light in 0.1f32..1.0,
        ) {
            let mut grid = open_grid(12, 12);
            let registry = fading_air(0.05);
            let wall = registry.id_of("wall").expect("defined");
            for (i, w) in walls.iter().enumerate() {
                if *w {
                    grid.set_slot(Layer::World, (i % 12) as i32, (i / 12) as i32, wall, Orientation::Unset)
                        .expect("in bounds");
                }
            }
            grid.set_darkness(0, 0, 0.3).expect("in bounds");
            let before: Vec<f32> = grid.cells().iter().map(|c| c.darkness()).collect();

            LightPropagator::new(&mut grid, &registry, 10)
                .create_lighting(sx, sy, light)
                .expect("in bounds");
            let after: Vec<f32> = grid.cells().iter().map(|c| c.darkness()).collect();
            for (b, a) in before.iter().zip(&after) {
                prop_assert!(a >= b);
                prop_assert!(*a <= light.max(*b));
            }

            let updates = LightPropagator::new(&mut grid, &registry, 10)
                .create_lighting(sx, sy, light)
                .expect("in bounds");
            prop_assert_eq!(updates, 0);
        }
    }
}
