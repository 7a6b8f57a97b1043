//! Block registry: static properties of every block type.
//!
//! The registry is read-only once built. The built-in table lives in
//! `assets/blocks.toml`; hosts can load their own table with
//! [`BlockRegistry::load_from`].

use std::fs;
use std::path::Path;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use strata_common::BlockId;
use tracing::info;

use crate::autotile::Orientation;
use crate::error::{WorldError, WorldResult};
use crate::grid::{Layer, Slot};

/// Built-in block table.
const BUILTIN_BLOCKS: &str = include_str!("../assets/blocks.toml");

/// Name of the reserved id-0 entry describing empty cells.
pub const AIR: &str = "air";

/// Collision hint exposed to the physics collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionShape {
    /// Full tile box
    #[default]
    Solid,
    /// No collision
    None,
}

/// Static properties of one block type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDef {
    /// Unique name
    pub name: String,
    /// Three-digit save id
    pub id: u16,
    /// Light lost when light passes through this block
    #[serde(default)]
    pub light_block: f32,
    /// Backdrop block (transparent, never collidable)
    #[serde(default)]
    pub back: bool,
    /// Decoration block
    #[serde(default)]
    pub nature: bool,
    /// Has the 16 orientation variants
    #[serde(default)]
    pub tiled: bool,
    /// Light emitted when placed (light-layer blocks only)
    #[serde(default)]
    pub emits_light: Option<f32>,
    /// Texture name (defaults to the block name)
    #[serde(default)]
    pub texture: String,
    /// Colour used by the world preview
    #[serde(default)]
    pub save_color: [u8; 3],
    /// Collision hint
    #[serde(default)]
    pub collision: CollisionShape,
    #[serde(skip)]
    variants: Vec<String>,
}

impl BlockDef {
    /// Creates a plain foreground block definition.
    #[must_use]
    pub fn new(name: impl Into<String>, id: u16) -> Self {
        Self {
            name: name.into(),
            id,
            light_block: 0.0,
            back: false,
            nature: false,
            tiled: false,
            emits_light: None,
            texture: String::new(),
            save_color: [0, 0, 0],
            collision: CollisionShape::Solid,
            variants: Vec::new(),
        }
    }

    /// Sets the light-block amount.
    #[must_use]
    pub fn with_light_block(mut self, amount: f32) -> Self {
        self.light_block = amount;
        self
    }

    /// Marks the block as a backdrop block.
    #[must_use]
    pub fn as_back(mut self) -> Self {
        self.back = true;
        self.collision = CollisionShape::None;
        self
    }

    /// Marks the block as a decoration.
    #[must_use]
    pub fn as_nature(mut self) -> Self {
        self.nature = true;
        self.collision = CollisionShape::None;
        self
    }

    /// Marks the block as auto-tiled.
    #[must_use]
    pub fn as_tiled(mut self) -> Self {
        self.tiled = true;
        self
    }

    /// Marks the block as a light emitter.
    #[must_use]
    pub fn emitting(mut self, light: f32) -> Self {
        self.emits_light = Some(light);
        self.collision = CollisionShape::None;
        self
    }

    /// Registry id.
    #[must_use]
    pub const fn block_id(&self) -> BlockId {
        BlockId::new(self.id)
    }

    /// Layer this block is stored in.
    #[must_use]
    pub const fn layer(&self) -> Layer {
        if self.emits_light.is_some() {
            Layer::Light
        } else if self.back {
            Layer::Back
        } else if self.nature {
            Layer::Nature
        } else {
            Layer::World
        }
    }

    /// Visual variant name for an orientation.
    #[must_use]
    pub fn material_key(&self, orientation: Orientation) -> &str {
        self.variants
            .get(orientation.code() as usize)
            .or_else(|| self.variants.first())
            .map_or(self.name.as_str(), String::as_str)
    }

    fn build_variants(&mut self) {
        if self.texture.is_empty() {
            self.texture.clone_from(&self.name);
        }
        self.variants = if self.tiled {
            Orientation::ALL_WITH_UNSET
                .iter()
                .map(|o| match o.tag() {
                    Some(tag) => format!("{}_{tag}", self.texture),
                    None => self.texture.clone(),
                })
                .collect()
        } else {
            vec![self.texture.clone()]
        };
    }
}

#[derive(Debug, Deserialize)]
struct BlockTable {
    #[serde(default)]
    block: Vec<BlockDef>,
}

/// Lookup table from block name or id to [`BlockDef`].
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    defs: Vec<BlockDef>,
    by_name: AHashMap<String, usize>,
    by_id: AHashMap<u16, usize>,
}

impl BlockRegistry {
    /// Loads the built-in block table.
    pub fn builtin() -> WorldResult<Self> {
        Self::from_toml_str(BUILTIN_BLOCKS)
    }

    /// Loads a block table from a TOML file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> WorldResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let registry = Self::from_toml_str(&contents)?;
        info!(
            "Loaded {} block definitions from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Parses a block table.
    pub fn from_toml_str(contents: &str) -> WorldResult<Self> {
        let table: BlockTable = toml::from_str(contents)?;
        Self::from_defs(table.block)
    }

    /// Builds a registry from definitions, validating the table.
    pub fn from_defs(defs: Vec<BlockDef>) -> WorldResult<Self> {
        let mut defs = defs;
        let mut by_name = AHashMap::with_capacity(defs.len());
        let mut by_id = AHashMap::with_capacity(defs.len());

        for (index, def) in defs.iter_mut().enumerate() {
            if def.id > BlockId::MAX.raw() {
                return Err(WorldError::InvalidRegistry(format!(
                    "block '{}' has id {} which does not fit three digits",
                    def.name, def.id
                )));
            }
            if !def.light_block.is_finite() || def.light_block < 0.0 {
                return Err(WorldError::InvalidRegistry(format!(
                    "block '{}' has invalid light_block {}",
                    def.name, def.light_block
                )));
            }
            if def.back && def.nature {
                return Err(WorldError::InvalidRegistry(format!(
                    "block '{}' cannot be both back and nature",
                    def.name
                )));
            }
            if by_name.insert(def.name.clone(), index).is_some() {
                return Err(WorldError::InvalidRegistry(format!(
                    "duplicate block name '{}'",
                    def.name
                )));
            }
            if by_id.insert(def.id, index).is_some() {
                return Err(WorldError::InvalidRegistry(format!(
                    "duplicate block id {:03}",
                    def.id
                )));
            }
            def.build_variants();
        }

        match by_id.get(&0).map(|&i| defs[i].name.as_str()) {
            Some(AIR) => {},
            Some(other) => {
                return Err(WorldError::InvalidRegistry(format!(
                    "id 000 must be '{AIR}', found '{other}'"
                )))
            },
            None => {
                return Err(WorldError::InvalidRegistry(format!(
                    "missing '{AIR}' entry with id 000"
                )))
            },
        }

        Ok(Self {
            defs,
            by_name,
            by_id,
        })
    }

    /// Number of block types (including air).
    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Checks if the registry is empty (never true for a validated table).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Iterates over all definitions.
    pub fn iter(&self) -> impl Iterator<Item = &BlockDef> {
        self.defs.iter()
    }

    /// Looks up a block by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BlockDef> {
        self.by_name.get(name).map(|&i| &self.defs[i])
    }

    /// Looks up a block by name, failing if it is not defined.
    pub fn require(&self, name: &str) -> WorldResult<&BlockDef> {
        self.get(name)
            .ok_or_else(|| WorldError::MissingBlockDefinition(name.to_string()))
    }

    /// Resolves a block name to its id.
    pub fn id_of(&self, name: &str) -> WorldResult<BlockId> {
        self.require(name).map(BlockDef::block_id)
    }

    /// Looks up a block by id.
    #[must_use]
    pub fn by_id(&self, id: BlockId) -> Option<&BlockDef> {
        self.by_id.get(&id.raw()).map(|&i| &self.defs[i])
    }

    /// Looks up a block by id, failing if it is not defined.
    pub fn def(&self, id: BlockId) -> WorldResult<&BlockDef> {
        self.by_id(id).ok_or(WorldError::UnknownBlockId(id.raw()))
    }

    /// The id-0 entry describing empty cells.
    #[must_use]
    pub fn air(&self) -> &BlockDef {
        // from_defs guarantees the entry exists
        &self.defs[self.by_id[&0]]
    }

    /// Visual variant for a slot. Empty and unknown slots use air.
    #[must_use]
    pub fn material_key(&self, slot: Slot) -> &str {
        self.by_id(slot.block)
            .unwrap_or_else(|| self.air())
            .material_key(slot.orientation)
    }

    /// Light lost in a cell holding `id` (unknown ids behave like air).
    #[must_use]
    pub fn light_block(&self, id: BlockId) -> f32 {
        self.by_id(id).unwrap_or_else(|| self.air()).light_block
    }

    /// Home layer of `id` (unknown ids go to the world layer).
    #[must_use]
    pub fn layer_of(&self, id: BlockId) -> Layer {
        self.by_id(id).map_or(Layer::World, BlockDef::layer)
    }

    /// Checks if `id` is a backdrop block.
    #[must_use]
    pub fn is_back(&self, id: BlockId) -> bool {
        self.by_id(id).is_some_and(|d| d.back)
    }

    /// Checks if `id` is auto-tiled.
    #[must_use]
    pub fn is_tiled(&self, id: BlockId) -> bool {
        self.by_id(id).is_some_and(|d| d.tiled)
    }

    /// Checks if `id` blocks movement.
    #[must_use]
    pub fn is_solid(&self, id: BlockId) -> bool {
        !id.is_empty()
            && self
                .by_id(id)
                .is_some_and(|d| d.collision == CollisionShape::Solid)
    }
}
