//! Cave carving and backdrop maintenance.
//!
//! Caves are noise-driven: every underground cell whose cave noise exceeds
//! the threshold loses its foreground block and gets a `backdirt` backdrop.
//! The erosion passes then strip backdrop that ended up exposed to the open
//! sky, so caves reaching the surface do not leave floating walls.

use strata_common::BlockId;
use tracing::debug;

use crate::autotile::Orientation;
use crate::blocks::BlockRegistry;
use crate::config::{SizeConfig, TerrainConfig};
use crate::error::WorldResult;
use crate::fractal::NoiseSource;
use crate::grid::{Layer, WorldGrid};

/// Sweeps of the first erosion phase.
const SKY_EXPOSURE_SWEEPS: usize = 2;
/// Sweeps of the final erosion phase.
const COLUMN_SWEEPS: usize = 10;

/// Carves caves below the surface. Returns the number of cells carved.
pub fn carve_caves(
    grid: &mut WorldGrid,
    rng: &mut fastrand::Rng,
    size: &SizeConfig,
    terrain: &TerrainConfig,
    backdirt: BlockId,
) -> WorldResult<usize> {
    let noise = NoiseSource::from_rng(rng, terrain.cave_octaves, 1.0);
    let width = f64::from(size.width);
    let height = f64::from(size.height);
    let scalar = terrain.cave_noise_scalar;
    let mut carved = 0;

    for x in 0..grid.width() as i32 {
        let surface = grid.surface(x)?.min(grid.height() as i32 - 1);
        for y in 0..=surface {
            if grid.block(Layer::World, x, y)?.is_empty() {
                continue;
            }
            let n = noise.unit_2d(
                scalar * f64::from(x) / width * 2.0,
                scalar * f64::from(y) / height * 4.0,
            );
            if n > terrain.cave_threshold {
                grid.clear_slot(Layer::World, x, y)?;
                grid.set_slot(Layer::Back, x, y, backdirt, Orientation::Unset)?;
                carved += 1;
            }
        }
    }
    Ok(carved)
}

/// Grid view used by the erosion passes.
struct Backdrop<'a> {
    grid: &'a mut WorldGrid,
    backdirt: BlockId,
}

impl Backdrop<'_> {
    /// Nothing in the foreground or backdrop. Out of bounds is not sky.
    fn is_sky(&self, x: i32, y: i32) -> bool {
        self.grid.cell(x, y).is_ok_and(|cell| {
            cell.slot(Layer::World).is_empty() && cell.slot(Layer::Back).is_empty()
        })
    }

    /// Bare backdirt: backdrop present, foreground empty.
    fn is_backdirt(&self, x: i32, y: i32) -> bool {
        self.grid.cell(x, y).is_ok_and(|cell| {
            cell.slot(Layer::World).is_empty() && cell.slot(Layer::Back).block == self.backdirt
        })
    }

    fn clear(&mut self, x: i32, y: i32) -> WorldResult<()> {
        self.grid.clear_slot(Layer::Back, x, y)
    }

    /// Clears a run of backdirt starting at `(x, y)` and walking by `step`.
    fn clear_run(&mut self, mut x: i32, y: i32, step: i32) -> WorldResult<usize> {
        let mut cleared = 0;
        while self.is_backdirt(x, y) {
            self.clear(x, y)?;
            cleared += 1;
            x += step;
        }
        Ok(cleared)
    }

    /// Clears the staircase of backdirt hanging below an overhang at
    /// `(x, y)`, shifting one column against `step` per row.
    fn clear_overhang(&mut self, x: i32, y: i32, step: i32) -> WorldResult<usize> {
        let mut cleared = 0;
        let mut cx = x;
        for dy in (1..=y).rev() {
            if !self.is_backdirt(cx, dy) {
                break;
            }
            cleared += self.clear_run(cx, dy, step)?;
            cx -= step;
        }
        Ok(cleared)
    }
}

/// Removes backdirt exposed to the sky. Returns the number of cells cleared.
pub fn clean_backdirt(grid: &mut WorldGrid, backdirt: BlockId) -> WorldResult<usize> {
    let width = grid.width() as i32;
    let height = grid.height() as i32;
    let mut view = Backdrop { grid, backdirt };
    let mut cleared = 0;

    // Backdirt directly under open sky, scanning top-down so whole
    // columns peel away in one sweep.
    for _ in 0..SKY_EXPOSURE_SWEEPS {
        for x in 1..width - 1 {
            for y in (1..height - 1).rev() {
                if view.is_backdirt(x, y) && view.is_sky(x, y + 1) {
                    view.clear(x, y)?;
                    cleared += 1;
                }
            }
        }
    }

    // Overhangs: a backdirt cell without backdirt above and sky to one side.
    for x in 3..width - 3 {
        for y in 3..height - 3 {
            if !view.is_backdirt(x, y) || view.is_backdirt(x, y + 1) {
                continue;
            }
            if view.is_sky(x + 1, y) {
                cleared += view.clear_overhang(x, y, 1)?;
            }
            if view.is_sky(x - 1, y) {
                cleared += view.clear_overhang(x, y, -1)?;
            }
        }
    }

    // Remaining sky-topped columns and single-wide slivers.
    for _ in 0..COLUMN_SWEEPS {
        for x in 2..width - 2 {
            for y in 2..height - 2 {
                if view.is_backdirt(x, y) && view.is_sky(x, y + 1) {
                    let mut cy = y;
                    while view.is_backdirt(x, cy) {
                        view.clear(x, cy)?;
                        cleared += 1;
                        cy -= 1;
                    }
                }
                if view.is_backdirt(x, y) && view.is_sky(x - 1, y) && view.is_sky(x + 1, y) {
                    view.clear(x, y)?;
                    cleared += 1;
                }
            }
        }
    }

    debug!("Backdirt cleanup removed {cleared} cells");
    Ok(cleared)
}

/// Gives an exposed tiled foreground block a backdirt backdrop, so its
/// open edges show cave wall instead of sky.
///
/// Returns `true` when a backdrop was added.
pub fn create_extra_backdirt(
    grid: &mut WorldGrid,
    registry: &BlockRegistry,
    backdirt: BlockId,
    x: i32,
    y: i32,
) -> WorldResult<bool> {
    let cell = grid.cell(x, y)?;
    let world = cell.slot(Layer::World);
    if world.is_empty()
        || !registry.is_tiled(world.block)
        || registry.is_back(world.block)
        || matches!(world.orientation, Orientation::Unset | Orientation::NN)
        || !cell.slot(Layer::Back).is_empty()
    {
        return Ok(false);
    }
    grid.set_slot(Layer::Back, x, y, backdirt, Orientation::Unset)?;
    Ok(true)
}

/// Runs [`create_extra_backdirt`] over every cell.
pub fn create_all_extra_backdirt(
    grid: &mut WorldGrid,
    registry: &BlockRegistry,
    backdirt: BlockId,
) -> WorldResult<usize> {
    let mut added = 0;
    for pos in grid.positions().collect::<Vec<_>>() {
        if create_extra_backdirt(grid, registry, backdirt, pos.x, pos.y)? {
            added += 1;
        }
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> BlockRegistry {
        BlockRegistry::builtin().expect("builtin table is valid")
    }

    fn fill_back(grid: &mut WorldGrid, id: BlockId, xs: std::ops::Range<i32>, ys: std::ops::Range<i32>) {
        for x in xs {
            for y in ys.clone() {
                grid.set_slot(Layer::Back, x, y, id, Orientation::Unset)
                    .expect("in bounds");
            }
        }
    }

    #[test]
    fn test_caves_stay_below_surface() {
        let registry = registry();
        let dirt = registry.id_of("dirt").expect("defined");
        let backdirt = registry.id_of("backdirt").expect("defined");
        let size = SizeConfig {
            width: 64,
            height: 64,
            block_size: 32,
        };
        let terrain = TerrainConfig {
            cave_threshold: 0.0,
            ..TerrainConfig::default()
        };
        let mut grid = WorldGrid::new(64, 64);
        for x in 0..64 {
            grid.set_surface(x, 30).expect("in bounds");
            for y in 0..64 {
                grid.set_slot(Layer::World, x, y, dirt, Orientation::Unset)
                    .expect("in bounds");
            }
        }
        let mut rng = fastrand::Rng::with_seed(5);
        let carved = carve_caves(&mut grid, &mut rng, &size, &terrain, backdirt).expect("in bounds");

        assert!(carved > 0);
        for x in 0..64 {
            for y in 31..64 {
                assert_eq!(grid.block(Layer::World, x, y).expect("in bounds"), dirt);
            }
        }
        for pos in grid.positions() {
            let cell = grid.cell(pos.x, pos.y).expect("in bounds");
            if cell.slot(Layer::World).is_empty() {
                assert_eq!(cell.slot(Layer::Back).block, backdirt);
            }
        }
    }

    #[test]
    fn test_sky_exposed_backdirt_is_removed() {
        let registry = registry();
        let backdirt = registry.id_of("backdirt").expect("defined");
        let dirt = registry.id_of("dirt").expect("defined");
        let mut grid = WorldGrid::new(20, 20);
        // A shaft open to the sky...
        fill_back(&mut grid, backdirt, 5..6, 2..10);
        // ...and an enclosed pocket roofed by dirt.
        fill_back(&mut grid, backdirt, 12..15, 4..7);
        for x in 11..16 {
            grid.set_slot(Layer::World, x, 7, dirt, Orientation::Unset)
                .expect("in bounds");
            grid.set_slot(Layer::World, x, 3, dirt, Orientation::Unset)
                .expect("in bounds");
        }
        for y in 3..8 {
            grid.set_slot(Layer::World, 11, y, dirt, Orientation::Unset)
                .expect("in bounds");
            grid.set_slot(Layer::World, 15, y, dirt, Orientation::Unset)
                .expect("in bounds");
        }

        clean_backdirt(&mut grid, backdirt).expect("in bounds");

        for y in 2..10 {
            assert!(grid.block(Layer::Back, 5, y).expect("in bounds").is_empty());
        }
        for x in 12..15 {
            for y in 4..7 {
                assert_eq!(grid.block(Layer::Back, x, y).expect("in bounds"), backdirt);
            }
        }
    }

    #[test]
    fn test_isolated_sliver_is_removed() {
        let registry = registry();
        let backdirt = registry.id_of("backdirt").expect("defined");
        let dirt = registry.id_of("dirt").expect("defined");
        let mut grid = WorldGrid::new(12, 12);
        grid.set_slot(Layer::World, 6, 6, dirt, Orientation::Unset)
            .expect("in bounds");
        fill_back(&mut grid, backdirt, 6..7, 5..6);
        clean_backdirt(&mut grid, backdirt).expect("in bounds");
        assert!(grid.block(Layer::Back, 6, 5).expect("in bounds").is_empty());
    }

    #[test]
    fn test_extra_backdirt() {
        let registry = registry();
        let backdirt = registry.id_of("backdirt").expect("defined");
        let dirt = registry.id_of("dirt").expect("defined");
        let brick = registry.id_of("stoneBrick").expect("defined");
        let mut grid = WorldGrid::new(4, 4);
        grid.set_slot(Layer::World, 0, 0, dirt, Orientation::NT)
            .expect("in bounds");
        grid.set_slot(Layer::World, 1, 0, dirt, Orientation::NN)
            .expect("in bounds");
        grid.set_slot(Layer::World, 2, 0, dirt, Orientation::Unset)
            .expect("in bounds");
        grid.set_slot(Layer::World, 3, 0, brick, Orientation::AA)
            .expect("in bounds");

        let added = create_all_extra_backdirt(&mut grid, &registry, backdirt).expect("in bounds");
        assert_eq!(added, 1);
        assert_eq!(grid.block(Layer::Back, 0, 0).expect("in bounds"), backdirt);
        assert!(grid.block(Layer::Back, 1, 0).expect("in bounds").is_empty());
        assert!(!create_extra_backdirt(&mut grid, &registry, backdirt, 0, 0).expect("in bounds"));
    }
}
