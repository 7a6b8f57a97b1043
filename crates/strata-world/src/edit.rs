//! Incremental block edits.
//!
//! Placing or destroying a block only repairs what the change can affect:
//! the edited cell and its four neighbours. Orientation and lighting both
//! depend on direct neighbours only, so this keeps the world consistent
//! without re-running the bulk passes.

use serde::{Deserialize, Serialize};
use strata_common::{BlockId, TilePos};
use tracing::trace;

use crate::autotile::{orient_cell, Orientation};
use crate::blocks::BlockRegistry;
use crate::caves::create_extra_backdirt;
use crate::config::LightingConfig;
use crate::error::WorldResult;
use crate::grid::{Layer, WorldGrid};
use crate::lighting::LightPropagator;
use crate::observer::WorldObserver;

/// An edit a player (or tool) can apply to one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditAction {
    /// Place a block by name
    Place {
        /// Block name
        block: String,
    },
    /// Remove whatever is in front
    Destroy,
}

impl EditAction {
    /// Create a place action.
    #[must_use]
    pub fn place(block: impl Into<String>) -> Self {
        Self::Place {
            block: block.into(),
        }
    }
}

/// Applies edits to a grid.
pub struct Editor<'a> {
    grid: &'a mut WorldGrid,
    registry: &'a BlockRegistry,
    lighting: &'a LightingConfig,
    backdirt: BlockId,
}

impl<'a> Editor<'a> {
    /// Creates an editor. `backdirt` is the backdrop exposed by digging.
    pub fn new(
        grid: &'a mut WorldGrid,
        registry: &'a BlockRegistry,
        lighting: &'a LightingConfig,
        backdirt: BlockId,
    ) -> Self {
        Self {
            grid,
            registry,
            lighting,
            backdirt,
        }
    }

    fn notify(
        &self,
        observer: &mut dyn WorldObserver,
        layer: Layer,
        x: i32,
        y: i32,
    ) -> WorldResult<()> {
        let slot = self.grid.slot(layer, x, y)?;
        observer.material_changed(
            layer,
            TilePos::new(x, y),
            slot,
            self.registry.material_key(slot),
        );
        Ok(())
    }

    fn light(&mut self) -> LightPropagator<'_> {
        LightPropagator::new(&mut *self.grid, self.registry, self.lighting.sky_margin)
    }

    /// Places `name` at `(x, y)`.
    ///
    /// Returns `Ok(false)` without changing anything when the foreground
    /// slot is already occupied. Fails when the position is outside the
    /// grid or the block is unknown.
    pub fn place_block(
        &mut self,
        x: i32,
        y: i32,
        name: &str,
        observer: &mut dyn WorldObserver,
    ) -> WorldResult<bool> {
        let def = self.registry.require(name)?;
        if !self.grid.slot(Layer::World, x, y)?.is_empty() {
            return Ok(false);
        }
        let layer = def.layer();
        let emits = def.emits_light;

        self.grid.set_slot(layer, x, y, def.block_id(), Orientation::Unset)?;
        orient_cell(self.grid, self.registry, layer, x, y)?;
        self.notify(observer, layer, x, y)?;

        self.light().fix_lighting_at(x, y)?;
        if let Some(light) = emits {
            let radius = self.lighting.torch_radius;
            self.light().create_lighting_limited(x, y, light, radius)?;
        }

        self.repair_neighbours(x, y, observer)?;
        trace!("Placed {name} at ({x}, {y})");
        Ok(true)
    }

    /// Destroys the block at `(x, y)`.
    ///
    /// A foreground or decoration block takes the whole cell with it
    /// (foreground, decoration and backdrop); otherwise a light emitter is
    /// removed. Digging at or below the surface leaves a `backdirt`
    /// backdrop. Returns `Ok(false)` when there was nothing to destroy.
    pub fn destroy_block(
        &mut self,
        x: i32,
        y: i32,
        observer: &mut dyn WorldObserver,
    ) -> WorldResult<bool> {
        let cell = *self.grid.cell(x, y)?;
        let cleared: &[Layer] = if !cell.slot(Layer::World).is_empty()
            || !cell.slot(Layer::Nature).is_empty()
        {
            &[Layer::World, Layer::Nature, Layer::Back]
        } else if !cell.slot(Layer::Light).is_empty() {
            &[Layer::Light]
        } else {
            return Ok(false);
        };

        for &layer in cleared {
            if !cell.slot(layer).is_empty() {
                self.grid.clear_slot(layer, x, y)?;
                self.notify(observer, layer, x, y)?;
            }
        }

        if y <= self.grid.surface(x)? && self.grid.slot(Layer::Back, x, y)?.is_empty() {
            self.grid
                .set_slot(Layer::Back, x, y, self.backdirt, Orientation::Unset)?;
            orient_cell(self.grid, self.registry, Layer::Back, x, y)?;
            self.notify(observer, Layer::Back, x, y)?;
        }

        self.light().fix_lighting_at(x, y)?;
        self.repair_neighbours(x, y, observer)?;
        trace!("Destroyed block at ({x}, {y})");
        Ok(true)
    }

    /// Re-orients, re-backs and re-lights the four neighbours of `(x, y)`.
    fn repair_neighbours(
        &mut self,
        x: i32,
        y: i32,
        observer: &mut dyn WorldObserver,
    ) -> WorldResult<()> {
        for pos in TilePos::new(x, y).neighbors() {
            if !self.grid.contains_pos(pos) {
                continue;
            }
            for layer in [Layer::World, Layer::Nature] {
                if orient_cell(self.grid, self.registry, layer, pos.x, pos.y)? {
                    self.notify(observer, layer, pos.x, pos.y)?;
                }
            }
            let added =
                create_extra_backdirt(self.grid, self.registry, self.backdirt, pos.x, pos.y)?;
            let reoriented = orient_cell(self.grid, self.registry, Layer::Back, pos.x, pos.y)?;
            if added || reoriented {
                self.notify(observer, Layer::Back, pos.x, pos.y)?;
            }
            self.light().fix_lighting_at(pos.x, pos.y)?;
        }
        Ok(())
    }
}
