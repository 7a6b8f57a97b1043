//! Change notifications for the rendering collaborator.
//!
//! The world never draws anything itself. Whenever a slot's block or
//! orientation changes it tells the observer, which can refresh the material
//! of the affected sprite. Purely visual decorations (clouds) are handed over
//! the same way and never stored in the grid.

use serde::{Deserialize, Serialize};
use strata_common::TilePos;

use crate::grid::{Layer, Slot};

/// Kind of a purely visual decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecorationKind {
    /// Background cloud
    Cloud,
}

/// A visual-only object placed by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Decoration {
    /// What to draw
    pub kind: DecorationKind,
    /// Tile position of the lower-left corner
    pub pos: TilePos,
}

/// Receives world change notifications.
pub trait WorldObserver {
    /// A slot's block or orientation changed. `material` is the visual
    /// variant to show, e.g. `dirt_AT`.
    fn material_changed(&mut self, _layer: Layer, _pos: TilePos, _slot: Slot, _material: &str) {}

    /// A decoration was created.
    fn decoration_added(&mut self, _decoration: Decoration) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl WorldObserver for NullObserver {}

/// One recorded notification.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    /// See [`WorldObserver::material_changed`]
    MaterialChanged {
        /// Layer of the slot
        layer: Layer,
        /// Cell position
        pos: TilePos,
        /// New slot contents
        slot: Slot,
        /// Visual variant of the new contents
        material: String,
    },
    /// See [`WorldObserver::decoration_added`]
    DecorationAdded(Decoration),
}

/// Observer that keeps every notification, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Vec<WorldEvent>,
}

impl RecordingObserver {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events.
    #[must_use]
    pub fn events(&self) -> &[WorldEvent] {
        &self.events
    }

    /// Material keys sent for one cell, oldest first.
    pub fn materials_at(&self, layer: Layer, pos: TilePos) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                WorldEvent::MaterialChanged {
                    layer: l,
                    pos: p,
                    material,
                    ..
                } if *l == layer && *p == pos => Some(material.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Positions that received a material refresh.
    pub fn refreshed(&self) -> impl Iterator<Item = (Layer, TilePos)> + '_ {
        self.events.iter().filter_map(|event| match event {
            WorldEvent::MaterialChanged { layer, pos, .. } => Some((*layer, *pos)),
            WorldEvent::DecorationAdded(_) => None,
        })
    }

    /// Drops all recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl WorldObserver for RecordingObserver {
    fn material_changed(&mut self, layer: Layer, pos: TilePos, slot: Slot, material: &str) {
        self.events.push(WorldEvent::MaterialChanged {
            layer,
            pos,
            slot,
            material: material.to_string(),
        });
    }

    fn decoration_added(&mut self, decoration: Decoration) {
        self.events.push(WorldEvent::DecorationAdded(decoration));
    }
}
