//! Dungeon structures: rectangular rooms joined by L-shaped corridors.
//!
//! A dungeon is planned inside a bounded region hanging below an anchor on
//! the surface, then carved into the grid. Rooms have a `stoneBrick` border
//! and a `backdirt` interior; corridors are five cells tall when horizontal
//! and three cells wide when vertical, walled on both sides. Within one
//! dungeon a floor cell always wins over a wall cell, so corridor turns and
//! room doors stay open.

use std::collections::BTreeMap;

use strata_common::{BlockId, TilePos};
use tracing::{debug, warn};

use crate::autotile::Orientation;
use crate::config::DungeonConfig;
use crate::error::WorldResult;
use crate::grid::{Layer, WorldGrid};

/// Axis-aligned room. `(x, y)` is the lower-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Room {
    /// Left column
    pub x: i32,
    /// Bottom row
    pub y: i32,
    /// Width in cells
    pub w: i32,
    /// Height in cells
    pub h: i32,
}

impl Room {
    /// Creates a room.
    #[must_use]
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Strict overlap test (touching edges do not intersect).
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }

    /// Centre cell (rounded down).
    #[must_use]
    pub const fn center(&self) -> TilePos {
        TilePos::new(self.x + self.w / 2, self.y + self.h / 2)
    }

    /// Checks if a cell lies on the room's outer ring.
    #[must_use]
    pub const fn is_border(&self, x: i32, y: i32) -> bool {
        x == self.x || x == self.x + self.w - 1 || y == self.y || y == self.y + self.h - 1
    }
}

/// Corridor between two room centres: horizontal first, then vertical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corridor {
    /// Start centre, turn point, end centre
    pub points: [TilePos; 3],
}

impl Corridor {
    /// Joins the centres of two rooms.
    #[must_use]
    pub const fn between(from: &Room, to: &Room) -> Self {
        let a = from.center();
        let b = to.center();
        Self {
            points: [a, TilePos::new(b.x, a.y), b],
        }
    }
}

/// A planned dungeon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dungeon {
    /// Accepted rooms in generation order
    pub rooms: Vec<Room>,
    /// Corridors joining consecutive rooms
    pub corridors: Vec<Corridor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Carve {
    Wall,
    Floor,
}

impl Dungeon {
    /// Cells the dungeon carves, floor winning over wall.
    fn carve_plan(&self) -> BTreeMap<TilePos, Carve> {
        let mut plan = BTreeMap::new();
        let mut mark = |x: i32, y: i32, carve: Carve| {
            let entry = plan.entry(TilePos::new(x, y)).or_insert(carve);
            if carve == Carve::Floor {
                *entry = Carve::Floor;
            }
        };

        for room in &self.rooms {
            for x in room.x..room.x + room.w {
                for y in room.y..room.y + room.h {
                    let carve = if room.is_border(x, y) {
                        Carve::Wall
                    } else {
                        Carve::Floor
                    };
                    mark(x, y, carve);
                }
            }
        }

        for corridor in &self.corridors {
            let [start, turn, end] = corridor.points;

            let y = start.y;
            for x in start.x.min(turn.x)..=start.x.max(turn.x) {
                mark(x, y - 2, Carve::Wall);
                mark(x, y - 1, Carve::Floor);
                mark(x, y, Carve::Floor);
                mark(x, y + 1, Carve::Floor);
                mark(x, y + 2, Carve::Wall);
            }

            let x = end.x;
            for y in turn.y.min(end.y)..=turn.y.max(end.y) {
                mark(x - 1, y, Carve::Wall);
                mark(x, y, Carve::Floor);
                mark(x + 1, y, Carve::Wall);
            }
        }

        plan
    }

    /// Writes the dungeon into the grid. Cells outside the grid are skipped.
    /// Returns the number of cells carved.
    pub fn carve(&self, grid: &mut WorldGrid, wall: BlockId, floor: BlockId) -> WorldResult<usize> {
        let mut carved = 0;
        for (pos, carve) in self.carve_plan() {
            if !grid.contains_pos(pos) {
                continue;
            }
            for layer in [Layer::World, Layer::Back, Layer::Nature] {
                grid.clear_slot(layer, pos.x, pos.y)?;
            }
            match carve {
                Carve::Wall => grid.set_slot(Layer::World, pos.x, pos.y, wall, Orientation::Unset)?,
                Carve::Floor => {
                    grid.set_slot(Layer::Back, pos.x, pos.y, floor, Orientation::Unset)?;
                },
            }
            carved += 1;
        }
        Ok(carved)
    }
}

/// Plans dungeons from a [`DungeonConfig`].
pub struct DungeonPlanner<'a> {
    config: &'a DungeonConfig,
}

impl<'a> DungeonPlanner<'a> {
    /// Creates a planner.
    #[must_use]
    pub const fn new(config: &'a DungeonConfig) -> Self {
        Self { config }
    }

    fn random_room(&self, rng: &mut fastrand::Rng, start: TilePos) -> Room {
        let c = self.config;
        Room::new(
            start.x + rng.i32(0..c.bounds_width.max(1)),
            start.y - rng.i32(0..c.bounds_height.max(1)),
            rng.i32(c.room_min_width..=c.room_max_width.max(c.room_min_width)),
            rng.i32(c.room_min_height..=c.room_max_height.max(c.room_min_height)),
        )
    }

    /// Plans one dungeon hanging below `start`.
    ///
    /// Each room gets `placement_attempts` tries to find a spot that does
    /// not overlap an accepted room; a room that never fits is skipped.
    pub fn plan(&self, rng: &mut fastrand::Rng, start: TilePos) -> Dungeon {
        let room_count = 1 + rng.u32(0..self.config.max_rooms.max(1));
        let mut rooms: Vec<Room> = Vec::with_capacity(room_count as usize);

        for index in 0..room_count {
            let placed = (0..self.config.placement_attempts.max(1))
                .map(|_| self.random_room(rng, start))
                .find(|candidate| rooms.iter().all(|room| !room.intersects(candidate)));
            match placed {
                Some(room) => rooms.push(room),
                None => warn!(
                    "Skipping dungeon room {index} at ({}, {}): no free spot after {} attempts",
                    start.x, start.y, self.config.placement_attempts
                ),
            }
        }

        let corridors = rooms
            .windows(2)
            .map(|pair| Corridor::between(&pair[0], &pair[1]))
            .collect();
        Dungeon { rooms, corridors }
    }

    /// Picks an anchor for the next dungeon, or `None` when the world is too
    /// small for the configured region.
    pub fn anchor(
        &self,
        rng: &mut fastrand::Rng,
        grid: &WorldGrid,
    ) -> WorldResult<Option<TilePos>> {
        let c = self.config;
        let x_span = grid.width() as i32 - c.bounds_width - c.room_max_width;
        if x_span <= 0 {
            return Ok(None);
        }
        let x = rng.i32(0..x_span);
        let surface = grid.surface(x)?;
        let y_span = surface - c.bounds_height - c.room_max_height;
        if y_span <= 0 {
            return Ok(None);
        }
        Ok(Some(TilePos::new(x, surface - rng.i32(0..y_span))))
    }

    /// Plans and carves every dungeon. Returns how many were carved.
    pub fn generate_all(
        &self,
        rng: &mut fastrand::Rng,
        grid: &mut WorldGrid,
        wall: BlockId,
        floor: BlockId,
    ) -> WorldResult<u32> {
        let mut carved = 0;
        for index in 0..self.config.count {
            let Some(start) = self.anchor(rng, grid)? else {
                warn!(
                    "Skipping dungeon {index}: a {}x{} world cannot hold a {}x{} dungeon region",
                    grid.width(),
                    grid.height(),
                    self.config.bounds_width,
                    self.config.bounds_height
                );
                continue;
            };
            let dungeon = self.plan(rng, start);
            let cells = dungeon.carve(grid, wall, floor)?;
            debug!(
                "Dungeon {index} at ({}, {}): {} rooms, {cells} cells",
                start.x,
                start.y,
                dungeon.rooms.len()
            );
            carved += 1;
        }
        Ok(carved)
    }
}
