//! Auto-tiling: picks one of 16 visual variants from the 4-neighbourhood.
//!
//! A tiled block looks at its four axis neighbours and decides, per side,
//! whether that side is *open* (exposed) or *closed* (covered by something
//! that connects to it). The open pattern maps to a two-letter
//! [`Orientation`] tag:
//!
//! - first letter: horizontal openness (`L` left, `R` right, `A` both, `N` neither)
//! - second letter: vertical openness (`T` top, `B` bottom, `A` both, `N` neither)
//!
//! What counts as open depends on the layer the block lives in:
//!
//! | Layer  | Neighbour side is open when                          |
//! |--------|------------------------------------------------------|
//! | World  | neighbour world slot is empty or holds a back block  |
//! | Back   | neighbour world and back slots are both empty        |
//! | Nature | neighbour nature slot does not hold the same block   |
//!
//! Out-of-bounds neighbours are always closed.

use serde::{Deserialize, Serialize};
use strata_common::{BlockId, Direction, TilePos};

use crate::blocks::BlockRegistry;
use crate::error::WorldResult;
use crate::grid::{Layer, WorldGrid};

/// Visual variant of a tiled block.
///
/// The discriminant order is the two-digit save code: `Unset` is `00`,
/// `AA` is `01` and so on up to `LT` = `16`.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Never oriented (non-tiled blocks, freshly placed blocks)
    #[default]
    Unset,
    /// Open on every side
    AA,
    /// Open left and right
    AN,
    /// Open above and below
    NA,
    /// Open left, above and below
    LA,
    /// Open right, above and below
    RA,
    /// Open left, right and above
    AT,
    /// Open left, right and below
    AB,
    /// Open left
    LN,
    /// Open right
    RN,
    /// Open above (top block allowed)
    NT,
    /// Open below
    NB,
    /// Open right and below
    RB,
    /// Open left and below
    LB,
    /// Fully enclosed
    NN,
    /// Open right and above
    RT,
    /// Open left and above
    LT,
}

/// Which sides of a cell are exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenSides {
    /// Left neighbour is open
    pub left: bool,
    /// Right neighbour is open
    pub right: bool,
    /// Neighbour below is open
    pub below: bool,
    /// Neighbour above is open
    pub above: bool,
}

impl OpenSides {
    /// Creates an open-side pattern.
    #[must_use]
    pub const fn new(left: bool, right: bool, below: bool, above: bool) -> Self {
        Self {
            left,
            right,
            below,
            above,
        }
    }

    fn set(&mut self, dir: Direction, open: bool) {
        match dir {
            Direction::Left => self.left = open,
            Direction::Right => self.right = open,
            Direction::Down => self.below = open,
            Direction::Up => self.above = open,
        }
    }
}

impl Orientation {
    /// Every tag in save-code order, starting with `Unset`.
    pub const ALL_WITH_UNSET: [Self; 17] = [
        Self::Unset,
        Self::AA,
        Self::AN,
        Self::NA,
        Self::LA,
        Self::RA,
        Self::AT,
        Self::AB,
        Self::LN,
        Self::RN,
        Self::NT,
        Self::NB,
        Self::RB,
        Self::LB,
        Self::NN,
        Self::RT,
        Self::LT,
    ];

    /// Two-digit save code (`0..=16`).
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Parses a save code.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL_WITH_UNSET.get(code as usize).copied()
    }

    /// Two-letter tag, or `None` for `Unset`.
    #[must_use]
    pub const fn tag(self) -> Option<&'static str> {
        Some(match self {
            Self::Unset => return None,
            Self::AA => "AA",
            Self::AN => "AN",
            Self::NA => "NA",
            Self::LA => "LA",
            Self::RA => "RA",
            Self::AT => "AT",
            Self::AB => "AB",
            Self::LN => "LN",
            Self::RN => "RN",
            Self::NT => "NT",
            Self::NB => "NB",
            Self::RB => "RB",
            Self::LB => "LB",
            Self::NN => "NN",
            Self::RT => "RT",
            Self::LT => "LT",
        })
    }

    /// Maps an open-side pattern to its tag.
    ///
    /// A block open only above becomes `NT` when a top variant is allowed and
    /// `NN` otherwise; every other pattern has exactly one tag.
    #[must_use]
    pub const fn from_open(open: OpenSides, top_allowed: bool) -> Self {
        match (open.left, open.right, open.below, open.above) {
            (true, true, true, true) => Self::AA,
            (true, true, false, false) => Self::AN,
            (false, false, true, true) => Self::NA,
            (true, false, true, true) => Self::LA,
            (false, true, true, true) => Self::RA,
            (true, true, false, true) => Self::AT,
            (true, true, true, false) => Self::AB,
            (true, false, false, false) => Self::LN,
            (false, true, false, false) => Self::RN,
            (false, false, false, true) if top_allowed => Self::NT,
            (false, false, true, false) => Self::NB,
            (false, true, true, false) => Self::RB,
            (true, false, true, false) => Self::LB,
            (false, true, false, true) => Self::RT,
            (true, false, false, true) => Self::LT,
            (false, false, false, _) => Self::NN,
        }
    }

    /// The open-side pattern this tag stands for (`NT` reads as open above).
    #[must_use]
    pub const fn open_sides(self) -> Option<OpenSides> {
        let (l, r, b, a) = match self {
            Self::Unset => return None,
            Self::AA => (true, true, true, true),
            Self::AN => (true, true, false, false),
            Self::NA => (false, false, true, true),
            Self::LA => (true, false, true, true),
            Self::RA => (false, true, true, true),
            Self::AT => (true, true, false, true),
            Self::AB => (true, true, true, false),
            Self::LN => (true, false, false, false),
            Self::RN => (false, true, false, false),
            Self::NT => (false, false, false, true),
            Self::NB => (false, false, true, false),
            Self::RB => (false, true, true, false),
            Self::LB => (true, false, true, false),
            Self::NN => (false, false, false, false),
            Self::RT => (false, true, false, true),
            Self::LT => (true, false, false, true),
        };
        Some(OpenSides::new(l, r, b, a))
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag().unwrap_or("--"))
    }
}

/// Checks whether the neighbour of a `block` in `layer` at `pos` is open.
fn side_is_open(
    grid: &WorldGrid,
    registry: &BlockRegistry,
    layer: Layer,
    block: BlockId,
    pos: TilePos,
) -> bool {
    let Ok(cell) = grid.cell(pos.x, pos.y) else {
        return false;
    };
    let world = cell.slot(Layer::World).block;
    match layer {
        Layer::World | Layer::Light => world.is_empty() || registry.is_back(world),
        Layer::Back => world.is_empty() && cell.slot(Layer::Back).is_empty(),
        Layer::Nature => cell.slot(Layer::Nature).block != block,
    }
}

/// Computes the open sides of the block stored in `layer` at `(x, y)`.
pub fn open_sides(
    grid: &WorldGrid,
    registry: &BlockRegistry,
    layer: Layer,
    x: i32,
    y: i32,
) -> WorldResult<OpenSides> {
    let block = grid.block(layer, x, y)?;
    let origin = TilePos::new(x, y);
    let mut open = OpenSides::default();
    for dir in Direction::ALL {
        open.set(
            dir,
            side_is_open(grid, registry, layer, block, origin.step(dir)),
        );
    }
    Ok(open)
}

/// Computes the orientation the block in `layer` at `(x, y)` should have.
pub fn compute_orientation(
    grid: &WorldGrid,
    registry: &BlockRegistry,
    layer: Layer,
    x: i32,
    y: i32,
    top_allowed: bool,
) -> WorldResult<Orientation> {
    let open = open_sides(grid, registry, layer, x, y)?;
    Ok(Orientation::from_open(open, top_allowed))
}

/// Re-orients one slot if it holds a tiled block.
///
/// Returns `true` when the stored orientation changed.
pub fn orient_cell(
    grid: &mut WorldGrid,
    registry: &BlockRegistry,
    layer: Layer,
    x: i32,
    y: i32,
) -> WorldResult<bool> {
    let slot = grid.slot(layer, x, y)?;
    if slot.is_empty() || !registry.is_tiled(slot.block) {
        return Ok(false);
    }
    let orientation = compute_orientation(grid, registry, layer, x, y, true)?;
    if orientation == slot.orientation {
        return Ok(false);
    }
    grid.set_orientation(layer, x, y, orientation)?;
    Ok(true)
}

/// Orients every cell holding `block` in `layer`. Returns the number of
/// cells visited.
pub fn orient_all(
    grid: &mut WorldGrid,
    registry: &BlockRegistry,
    layer: Layer,
    block: BlockId,
    top_allowed: bool,
) -> WorldResult<usize> {
    let mut count = 0;
    for pos in grid.positions().collect::<Vec<_>>() {
        if grid.block(layer, pos.x, pos.y)? != block {
            continue;
        }
        let orientation = compute_orientation(grid, registry, layer, pos.x, pos.y, top_allowed)?;
        grid.set_orientation(layer, pos.x, pos.y, orientation)?;
        count += 1;
    }
    Ok(count)
}
