//! The world: grid, block registry and configuration in one owner.

use std::sync::Arc;

use parking_lot::RwLock;
use strata_common::TilePos;
use tracing::info;

use crate::blocks::BlockRegistry;
use crate::config::WorldConfig;
use crate::edit::{EditAction, Editor};
use crate::error::{WorldError, WorldResult};
use crate::generation::{Palette, TerrainGenerator};
use crate::grid::{Layer, Slot, WorldGrid};
use crate::observer::{Decoration, WorldObserver};

/// Rows above the centre column's surface where the player spawns.
const SPAWN_HEIGHT: i32 = 25;

/// A world shared between threads. All mutation takes the write lock.
pub type SharedWorld = Arc<RwLock<World>>;

/// A complete world.
///
/// The grid is only mutated by generation and by the edit operations
/// ([`World::place_block`], [`World::destroy_block`]); everything else reads.
#[derive(Debug, Clone)]
pub struct World {
    grid: WorldGrid,
    registry: BlockRegistry,
    config: WorldConfig,
    palette: Palette,
    clouds: Vec<Decoration>,
}

impl World {
    /// Creates an empty world of the configured size.
    pub fn new(config: WorldConfig, registry: BlockRegistry) -> WorldResult<Self> {
        let palette = Palette::resolve(&registry)?;
        Ok(Self {
            grid: WorldGrid::new(config.size.width, config.size.height),
            registry,
            config,
            palette,
            clouds: Vec::new(),
        })
    }

    /// Generates a world from a seed. Sizes below the minimum are rejected;
    /// every other setting is clamped with [`WorldConfig::validate`].
    pub fn generate(
        mut config: WorldConfig,
        registry: BlockRegistry,
        seed: u64,
        observer: &mut dyn WorldObserver,
    ) -> WorldResult<Self> {
        config.size.check()?;
        config.validate();
        info!(
            "Generating {}x{} world with seed {seed}",
            config.size.width, config.size.height
        );
        let terrain = TerrainGenerator::new(&config, &registry, seed)?.generate(observer)?;
        let palette = Palette::resolve(&registry)?;
        Ok(Self {
            grid: terrain.grid,
            registry,
            config,
            palette,
            clouds: terrain.clouds,
        })
    }

    /// Wraps the world for shared access.
    #[must_use]
    pub fn into_shared(self) -> SharedWorld {
        Arc::new(RwLock::new(self))
    }

    /// The tile grid.
    #[must_use]
    pub const fn grid(&self) -> &WorldGrid {
        &self.grid
    }

    #[cfg(test)]
    pub(crate) fn grid_mut(&mut self) -> &mut WorldGrid {
        &mut self.grid
    }

    /// The block registry.
    #[must_use]
    pub const fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// The configuration the world was built with.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Clouds placed by the generator (not persisted).
    #[must_use]
    pub fn clouds(&self) -> &[Decoration] {
        &self.clouds
    }

    /// Width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.grid.width()
    }

    /// Height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.grid.height()
    }

    /// One layer of a cell.
    pub fn slot(&self, layer: Layer, x: i32, y: i32) -> WorldResult<Slot> {
        self.grid.slot(layer, x, y)
    }

    /// Name of the block in one layer of a cell (`None` when empty).
    pub fn block_name(&self, layer: Layer, x: i32, y: i32) -> WorldResult<Option<&str>> {
        let slot = self.grid.slot(layer, x, y)?;
        if slot.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.registry.def(slot.block)?.name.as_str()))
    }

    /// Light value of a cell.
    pub fn darkness(&self, x: i32, y: i32) -> WorldResult<f32> {
        self.grid.darkness(x, y)
    }

    /// Checks if a cell can be lit or collided with.
    #[must_use]
    pub fn is_valid_position(&self, x: i32, y: i32) -> bool {
        self.grid
            .is_valid_position(x, y, self.config.lighting.sky_margin)
    }

    /// Where the player appears after generation.
    pub fn spawn_point(&self) -> WorldResult<TilePos> {
        let x = self.grid.width() as i32 / 2;
        Ok(TilePos::new(x, self.grid.surface(x)? + SPAWN_HEIGHT))
    }

    fn editor(&mut self) -> Editor<'_> {
        Editor::new(
            &mut self.grid,
            &self.registry,
            &self.config.lighting,
            self.palette.backdirt,
        )
    }

    /// Places a block by name. See [`Editor::place_block`].
    pub fn place_block(
        &mut self,
        x: i32,
        y: i32,
        name: &str,
        observer: &mut dyn WorldObserver,
    ) -> WorldResult<bool> {
        self.editor().place_block(x, y, name, observer)
    }

    /// Destroys the block at a position. See [`Editor::destroy_block`].
    pub fn destroy_block(
        &mut self,
        x: i32,
        y: i32,
        observer: &mut dyn WorldObserver,
    ) -> WorldResult<bool> {
        self.editor().destroy_block(x, y, observer)
    }

    /// Applies an edit action at `pos`.
    pub fn apply_edit(
        &mut self,
        pos: TilePos,
        action: &EditAction,
        observer: &mut dyn WorldObserver,
    ) -> WorldResult<bool> {
        match action {
            EditAction::Place { block } => self.place_block(pos.x, pos.y, block, observer),
            EditAction::Destroy => self.destroy_block(pos.x, pos.y, observer),
        }
    }

    /// Swaps in a loaded grid. Fails (leaving the world untouched) when the
    /// grid size does not match.
    pub fn replace_grid(&mut self, grid: WorldGrid) -> WorldResult<()> {
        if grid.width() != self.grid.width() || grid.height() != self.grid.height() {
            return Err(WorldError::MalformedSaveRecord {
                line: 0,
                reason: format!(
                    "save is {}x{}, world is {}x{}",
                    grid.width(),
                    grid.height(),
                    self.grid.width(),
                    self.grid.height()
                ),
            });
        }
        self.grid = grid;
        self.clouds.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NullObserver;

    fn small_world(seed: u64) -> World {
        let mut config = WorldConfig::with_size(96, 80);
        config.dungeon.count = 0;
        let registry = BlockRegistry::builtin().expect("builtin table is valid");
        World::generate(config, registry, seed, &mut NullObserver).expect("generation succeeds")
    }

    #[test]
    fn test_tiny_world_is_rejected() {
        for (width, height) in [(8, 2), (64, 15), (0, 64)] {
            let registry = BlockRegistry::builtin().expect("builtin table is valid");
            let result = World::generate(
                WorldConfig::with_size(width, height),
                registry,
                1,
                &mut NullObserver,
            );
            assert!(
                matches!(result, Err(WorldError::InvalidSize { min: 16, .. })),
                "{width}x{height} was accepted"
            );
        }

        // The smallest accepted size generates.
        let mut config = WorldConfig::with_size(16, 16);
        config.dungeon.count = 0;
        let registry = BlockRegistry::builtin().expect("builtin table is valid");
        let world = World::generate(config, registry, 1, &mut NullObserver).expect("generates");
        assert_eq!((world.width(), world.height()), (16, 16));
    }

    #[test]
    fn test_spawn_point_above_surface() {
        let world = small_world(3);
        let spawn = world.spawn_point().expect("in bounds");
        assert_eq!(spawn.x, 48);
        assert_eq!(spawn.y, world.grid().surface(48).expect("in bounds") + 25);
    }

    #[test]
    fn test_block_name_lookup() {
        let world = small_world(3);
        // Deep cells are dirt or stone, or carved out into caves.
        let deep = world.block_name(Layer::World, 10, 0).expect("in bounds");
        assert!(matches!(deep, Some("dirt" | "stone" | "grass") | None));
        assert_eq!(world.block_name(Layer::World, 10, 79).expect("in bounds"), None);
        assert!(world.block_name(Layer::World, 96, 0).is_err());
    }

    #[test]
    fn test_replace_grid_checks_size() {
        let mut world = small_world(3);
        let before = world.grid().clone();
        assert!(world.replace_grid(WorldGrid::new(10, 10)).is_err());
        assert_eq!(world.grid(), &before);
        assert!(world.replace_grid(WorldGrid::new(96, 80)).is_ok());
    }

    #[test]
    fn test_shared_world() {
        let shared = small_world(4).into_shared();
        let width = shared.read().width();
        assert_eq!(width, 96);
    }
}
