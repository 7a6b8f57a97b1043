//! Surface decoration: trees, flowers, pebbles and grass tufts.

use strata_common::BlockId;

use crate::autotile::Orientation;
use crate::error::WorldResult;
use crate::grid::{Layer, WorldGrid};

/// Random draw range; one draw per eligible column.
const DRAW_RANGE: u32 = 16;
/// Draw value that grows a tree.
const TREE_DRAW: u32 = 15;
/// Lowest draw value that places a flower or pebble.
const FLORA_DRAW: u32 = 13;
/// Lowest draw value that places a grass tuft.
const TUFT_DRAW: u32 = 9;

/// Block ids used by the nature pass.
#[derive(Debug, Clone, Copy)]
pub struct NatureBlocks {
    /// Surface block that can carry decoration
    pub grass: BlockId,
    /// Trunk segment
    pub trunk: BlockId,
    /// Trunk base
    pub root: BlockId,
    /// Branch sticking out to the left
    pub branch_left: BlockId,
    /// Branch sticking out to the right
    pub branch_right: BlockId,
    /// Canopy
    pub leaves: BlockId,
    /// Three flowers and a pebble
    pub flora: [BlockId; 4],
    /// Grass tuft variants
    pub tufts: [BlockId; 3],
}

/// What a column ended up with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NatureStats {
    /// Trees grown
    pub trees: usize,
    /// Flowers and pebbles placed
    pub flora: usize,
    /// Grass tufts placed
    pub tufts: usize,
}

fn put(grid: &mut WorldGrid, block: BlockId, x: i32, y: i32) -> WorldResult<()> {
    grid.set_slot(Layer::Nature, x, y, block, Orientation::Unset)
}

/// Grows a tree on the surface at column `x`. Returns `false` (and places
/// nothing) when the tree would not fit under the top of the world.
fn grow_tree(
    grid: &mut WorldGrid,
    rng: &mut fastrand::Rng,
    blocks: &NatureBlocks,
    x: i32,
    surface: i32,
) -> WorldResult<bool> {
    let height = 4 + rng.i32(0..8);
    let branches: Vec<(bool, bool)> = (0..height)
        .map(|i| {
            let left = rng.u32(0..4) == 0;
            let right = rng.u32(0..4) == 0;
            let inner = i > 0 && i < height - 2;
            (left && inner, right && inner)
        })
        .collect();

    if surface + height + 1 >= grid.height() as i32 {
        return Ok(false);
    }

    put(grid, blocks.root, x, surface + 1)?;
    for (i, (left, right)) in (0..height).zip(branches) {
        let y = surface + 2 + i;
        if left {
            put(grid, blocks.branch_left, x - 1, y)?;
        }
        if right {
            put(grid, blocks.branch_right, x + 1, y)?;
        }
        put(grid, blocks.trunk, x, y)?;
    }
    for dy in -1..=1 {
        for dx in -1..=1 {
            put(grid, blocks.leaves, x + dx, surface + height + dy)?;
        }
    }
    Ok(true)
}

/// Decorates every grassy surface column with open air above it.
pub fn generate_nature(
    grid: &mut WorldGrid,
    rng: &mut fastrand::Rng,
    blocks: &NatureBlocks,
) -> WorldResult<NatureStats> {
    let mut stats = NatureStats::default();
    let width = grid.width() as i32;

    for x in 1..width - 1 {
        let surface = grid.surface(x)?;
        let on_grass = grid
            .block(Layer::World, x, surface)
            .is_ok_and(|b| b == blocks.grass);
        let open_above = grid
            .block(Layer::World, x, surface + 1)
            .is_ok_and(BlockId::is_empty);
        if !on_grass || !open_above {
            continue;
        }

        let draw = rng.u32(0..DRAW_RANGE);
        let next_to_trunk = grid
            .block(Layer::Nature, x - 1, surface + 2)
            .is_ok_and(|b| b == blocks.trunk);

        if draw == TREE_DRAW && !next_to_trunk {
            if grow_tree(grid, rng, blocks, x, surface)? {
                stats.trees += 1;
            }
        } else if draw >= FLORA_DRAW {
            let flora = blocks.flora[rng.usize(0..blocks.flora.len())];
            put(grid, flora, x, surface + 1)?;
            stats.flora += 1;
        } else if draw >= TUFT_DRAW {
            let tuft = blocks.tufts[rng.usize(0..blocks.tufts.len())];
            put(grid, tuft, x, surface + 1)?;
            stats.tufts += 1;
        }
    }
    Ok(stats)
}
