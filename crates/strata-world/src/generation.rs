//! Procedural world generation.
//!
//! The generator runs a fixed sequence of passes over an empty grid:
//!
//! 1. height map and grass surface
//! 2. dirt fill
//! 3. stone distribution, then stone cleanup
//! 4. caves, then backdirt erosion
//! 5. grass growth
//! 6. clouds and nature
//! 7. dungeons
//! 8. orientation and extra backdrop
//! 9. daylight
//!
//! Every random decision draws from one [`fastrand::Rng`] seeded once, in
//! pass order, so a seed and a config fully determine the result.

use strata_common::{BlockId, TilePos};
use tracing::{debug, info};

use crate::autotile::{orient_all, Orientation};
use crate::blocks::BlockRegistry;
use crate::caves::{carve_caves, clean_backdirt, create_all_extra_backdirt};
use crate::config::WorldConfig;
use crate::dungeon::DungeonPlanner;
use crate::error::WorldResult;
use crate::fractal::NoiseSource;
use crate::grid::{Layer, WorldGrid};
use crate::lighting::LightPropagator;
use crate::nature::{generate_nature, NatureBlocks};
use crate::observer::{Decoration, DecorationKind, WorldObserver};

/// Octaves of the stone distribution noise.
const STONE_OCTAVES: usize = 5;

/// Block ids the generator needs, resolved once up front.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    /// Underground filler
    pub dirt: BlockId,
    /// Surface block
    pub grass: BlockId,
    /// Deep rock
    pub stone: BlockId,
    /// Cave wall backdrop
    pub backdirt: BlockId,
    /// Dungeon wall
    pub stone_brick: BlockId,
    /// Decoration set
    pub nature: NatureBlocks,
}

impl Palette {
    /// Looks up every generator block; fails on the first missing name.
    pub fn resolve(registry: &BlockRegistry) -> WorldResult<Self> {
        let id = |name: &str| registry.id_of(name);
        Ok(Self {
            dirt: id("dirt")?,
            grass: id("grass")?,
            stone: id("stone")?,
            backdirt: id("backdirt")?,
            stone_brick: id("stoneBrick")?,
            nature: NatureBlocks {
                grass: id("grass")?,
                trunk: id("treeTrunk")?,
                root: id("treeBottomRoot")?,
                branch_left: id("treeBranchL1")?,
                branch_right: id("treeBranchR1")?,
                leaves: id("leaves")?,
                flora: [id("flower1")?, id("flower2")?, id("flower3")?, id("pebble")?],
                tufts: [id("topGrass1")?, id("topGrass2")?, id("topGrass3")?],
            },
        })
    }
}

/// Output of a generation run.
#[derive(Debug, Clone)]
pub struct Terrain {
    /// The populated grid
    pub grid: WorldGrid,
    /// Visual-only clouds, in placement order
    pub clouds: Vec<Decoration>,
}

/// Procedural world generator.
pub struct TerrainGenerator<'a> {
    config: &'a WorldConfig,
    registry: &'a BlockRegistry,
    palette: Palette,
    rng: fastrand::Rng,
}

impl<'a> TerrainGenerator<'a> {
    /// Creates a generator. Fails if the world is smaller than
    /// [`crate::config::SizeConfig::MIN_SIDE`] or the registry lacks a generator block.
    pub fn new(
        config: &'a WorldConfig,
        registry: &'a BlockRegistry,
        seed: u64,
    ) -> WorldResult<Self> {
        config.size.check()?;
        Ok(Self {
            config,
            registry,
            palette: Palette::resolve(registry)?,
            rng: fastrand::Rng::with_seed(seed),
        })
    }

    /// Runs every pass and returns the finished terrain.
    pub fn generate(mut self, observer: &mut dyn WorldObserver) -> WorldResult<Terrain> {
        let size = &self.config.size;
        let mut grid = WorldGrid::new(size.width, size.height);

        info!("Placing dirt...");
        self.generate_height_map(&mut grid)?;
        self.fill_dirt(&mut grid)?;

        info!("Placing stone...");
        self.generate_stone(&mut grid)?;
        self.clean_stone(&mut grid)?;

        info!("Generating caves...");
        let carved = carve_caves(
            &mut grid,
            &mut self.rng,
            &self.config.size,
            &self.config.terrain,
            self.palette.backdirt,
        )?;
        debug!("Carved {carved} cave cells");
        clean_backdirt(&mut grid, self.palette.backdirt)?;

        info!("Growing grass...");
        self.grow_grass(&mut grid)?;

        info!("Generating nature...");
        let clouds = self.generate_clouds(&grid)?;
        for cloud in &clouds {
            observer.decoration_added(*cloud);
        }
        let stats = generate_nature(&mut grid, &mut self.rng, &self.palette.nature)?;
        debug!(
            "Nature: {} trees, {} flora, {} tufts, {} clouds",
            stats.trees,
            stats.flora,
            stats.tufts,
            clouds.len()
        );

        info!("Generating structures...");
        let dungeons = DungeonPlanner::new(&self.config.dungeon).generate_all(
            &mut self.rng,
            &mut grid,
            self.palette.stone_brick,
            self.palette.backdirt,
        )?;
        debug!("Carved {dungeons} dungeons");

        info!("Orienting blocks...");
        self.orient_blocks(&mut grid)?;

        info!("Creating light...");
        seed_daylight(&mut grid, self.registry, self.config)?;

        Ok(Terrain { grid, clouds })
    }

    fn place(&self, grid: &mut WorldGrid, block: BlockId, x: i32, y: i32) -> WorldResult<()> {
        grid.set_slot(self.registry.layer_of(block), x, y, block, Orientation::Unset)
    }

    /// Surface row per column from 1D noise, topped with grass.
    fn generate_height_map(&mut self, grid: &mut WorldGrid) -> WorldResult<()> {
        let terrain = &self.config.terrain;
        let noise = NoiseSource::from_rng(
            &mut self.rng,
            terrain.height_octaves,
            terrain.height_frequency,
        );
        let world_height = f64::from(grid.height());
        let top = grid.height() as i32 - 2;

        for x in 0..grid.width() as i32 {
            let offset = terrain.flatness * noise.signed_1d(f64::from(x)) * world_height;
            let surface = (terrain.grass_minimum + offset as i32).clamp(1, top);
            grid.set_surface(x, surface)?;
            self.place(grid, self.palette.grass, x, surface)?;
        }
        Ok(())
    }

    /// Dirt from the bottom row up to just below the surface block.
    fn fill_dirt(&self, grid: &mut WorldGrid) -> WorldResult<()> {
        for x in 0..grid.width() as i32 {
            for y in 0..grid.height() as i32 - 1 {
                if grid.block(Layer::World, x, y)? == self.palette.grass {
                    break;
                }
                self.place(grid, self.palette.dirt, x, y)?;
            }
        }
        Ok(())
    }

    /// Stone below the surface, more likely with depth.
    fn generate_stone(&mut self, grid: &mut WorldGrid) -> WorldResult<()> {
        let terrain = &self.config.terrain;
        let noise = NoiseSource::from_rng(
            &mut self.rng,
            STONE_OCTAVES,
            1.0 / terrain.stone_noise_scale,
        );
        let mut placed = 0_usize;

        for x in 0..grid.width() as i32 {
            let mut frequency = terrain.stone_start_frequency;
            for y in (0..=grid.surface(x)?).rev() {
                if noise.unit_2d(f64::from(x), f64::from(y)) < frequency {
                    self.place(grid, self.palette.stone, x, y)?;
                    placed += 1;
                }
                frequency =
                    (frequency + terrain.stone_frequency_delta).min(terrain.stone_end_frequency);
            }
        }
        debug!("Placed {placed} stone cells");
        Ok(())
    }

    /// Clears everything above the surface; a stone surface keeps a small
    /// band so exposed rock can stick out.
    fn clean_stone(&self, grid: &mut WorldGrid) -> WorldResult<()> {
        let deviation = self.config.terrain.stone_top_deviation;
        for x in 0..grid.width() as i32 {
            let surface = grid.surface(x)?;
            let from = if grid.block(Layer::World, x, surface)? == self.palette.stone {
                surface + deviation
            } else {
                surface + 1
            };
            for y in from.max(0)..grid.height() as i32 {
                grid.clear_slot(Layer::World, x, y)?;
            }
        }
        Ok(())
    }

    /// Dirt with nothing in front of the cell above turns into grass.
    fn grow_grass(&self, grid: &mut WorldGrid) -> WorldResult<()> {
        let mut grown = 0_usize;
        for x in 0..grid.width() as i32 {
            for y in 0..grid.height() as i32 - 1 {
                if grid.block(Layer::World, x, y)? == self.palette.dirt
                    && grid.block(Layer::World, x, y + 1)?.is_empty()
                {
                    self.place(grid, self.palette.grass, x, y)?;
                    grown += 1;
                }
            }
        }
        debug!("Grew {grown} grass cells");
        Ok(())
    }

    /// Scatters clouds above the surface, keeping a gap after each one.
    fn generate_clouds(&mut self, grid: &WorldGrid) -> WorldResult<Vec<Decoration>> {
        let terrain = &self.config.terrain;
        let skip = (terrain.cloud_spacing / self.config.size.block_size.max(1)) as i32;
        let mut clouds = Vec::new();
        let mut x = 0;
        while x < grid.width() as i32 {
            if self.rng.f32() < terrain.cloud_chance {
                let y = grid.surface(x)?
                    + terrain.cloud_min_height
                    + self.rng.i32(0..terrain.cloud_height_range.max(1));
                clouds.push(Decoration {
                    kind: DecorationKind::Cloud,
                    pos: TilePos::new(x, y),
                });
                x += skip;
            }
            x += 1;
        }
        Ok(clouds)
    }

    /// Bulk orientation of every tiled block, then backdrop synthesis.
    fn orient_blocks(&self, grid: &mut WorldGrid) -> WorldResult<()> {
        let p = &self.palette;
        for block in [p.dirt, p.grass, p.stone] {
            orient_all(grid, self.registry, Layer::World, block, true)?;
        }
        orient_all(grid, self.registry, Layer::Nature, p.nature.leaves, true)?;
        let added = create_all_extra_backdirt(grid, self.registry, p.backdirt)?;
        debug!("Added {added} backdrop cells behind exposed blocks");
        orient_all(grid, self.registry, Layer::Back, p.backdirt, true)?;
        Ok(())
    }
}

/// Floods daylight from above the centre column.
pub fn seed_daylight(
    grid: &mut WorldGrid,
    registry: &BlockRegistry,
    config: &WorldConfig,
) -> WorldResult<usize> {
    let lighting = &config.lighting;
    let x = grid.width() as i32 / 2;
    let y = grid.surface(x)? + lighting.daylight_offset;
    LightPropagator::new(grid, registry, lighting.sky_margin)
        .create_lighting(x, y, lighting.daylight)
}
