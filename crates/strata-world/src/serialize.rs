//! Text save format.
//!
//! A save is one record per line:
//!
//! * `width` lines holding the surface height of each column, then
//! * `width * height` cell records, column by column (`x` outer, `y`
//!   inner). Each record is four five-digit slot ids (world, back, nature,
//!   light; three digits of block id followed by two digits of orientation
//!   code, `00000` for an empty slot) followed by the cell's light value.
//!
//! ```text
//! 00101000000000000000.4
//! ```

use std::io::{BufRead, Write};

use strata_common::BlockId;
use tracing::info;

use crate::autotile::Orientation;
use crate::blocks::BlockRegistry;
use crate::error::{WorldError, WorldResult};
use crate::grid::{Cell, Layer, Slot, WorldGrid};
use crate::world::World;

/// Characters per slot id.
pub const SLOT_ID_WIDTH: usize = 5;
/// Characters taken by the four slot ids.
const SLOTS_WIDTH: usize = SLOT_ID_WIDTH * Layer::ALL.len();
/// Shortest valid cell record: four ids and a one-digit light value.
pub const MIN_RECORD_WIDTH: usize = SLOTS_WIDTH + 1;

fn malformed(line: usize, reason: impl Into<String>) -> WorldError {
    WorldError::MalformedSaveRecord {
        line,
        reason: reason.into(),
    }
}

/// Formats one slot as its five-digit id.
#[must_use]
pub fn encode_slot(slot: Slot) -> String {
    if slot.is_empty() {
        return "00000".to_string();
    }
    format!("{:03}{:02}", slot.block.raw(), slot.orientation.code())
}

/// Parses a five-digit slot id.
pub fn decode_slot(field: &str, registry: &BlockRegistry, line: usize) -> WorldResult<Slot> {
    if field.len() != SLOT_ID_WIDTH || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed(line, format!("bad slot id {field:?}")));
    }
    let block: u16 = field[..3]
        .parse()
        .map_err(|_| malformed(line, format!("bad block id in {field:?}")))?;
    let code: u8 = field[3..]
        .parse()
        .map_err(|_| malformed(line, format!("bad orientation in {field:?}")))?;

    let block = BlockId::new(block);
    if block.is_empty() {
        return Ok(Slot::EMPTY);
    }
    if registry.by_id(block).is_none() {
        return Err(WorldError::UnknownBlockId(block.raw()));
    }
    let orientation = Orientation::from_code(code)
        .ok_or_else(|| malformed(line, format!("orientation code {code} out of range")))?;
    Ok(Slot::new(block, orientation))
}

/// Formats one cell record (without the line break).
#[must_use]
pub fn encode_cell(cell: &Cell) -> String {
    let mut record = String::with_capacity(MIN_RECORD_WIDTH + 8);
    for layer in Layer::ALL {
        record.push_str(&encode_slot(cell.slot(layer)));
    }
    record.push_str(&cell.darkness().to_string());
    record
}

/// Parses one cell record.
pub fn decode_cell(record: &str, registry: &BlockRegistry, line: usize) -> WorldResult<Cell> {
    let record = record.trim_end();
    if !record.is_ascii() {
        return Err(malformed(line, "record is not plain ASCII"));
    }
    if record.len() < MIN_RECORD_WIDTH {
        return Err(malformed(
            line,
            format!(
                "record is {} characters, expected at least {MIN_RECORD_WIDTH}",
                record.len()
            ),
        ));
    }
    let (ids, light) = record.split_at(SLOTS_WIDTH);

    let mut slots = [Slot::EMPTY; 4];
    for (i, slot) in slots.iter_mut().enumerate() {
        let start = i * SLOT_ID_WIDTH;
        *slot = decode_slot(&ids[start..start + SLOT_ID_WIDTH], registry, line)?;
    }
    let darkness: f32 = light
        .parse()
        .map_err(|_| malformed(line, format!("bad light value {light:?}")))?;
    Ok(Cell::new(slots, darkness))
}

/// Writes a grid in the text format.
pub fn write_text<W: Write>(grid: &WorldGrid, mut writer: W) -> WorldResult<()> {
    for height in grid.height_map() {
        writeln!(writer, "{height}")?;
    }
    for pos in grid.positions() {
        writeln!(writer, "{}", encode_cell(grid.cell(pos.x, pos.y)?))?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a `width` x `height` grid in the text format.
///
/// Stops at the first bad record. Lines after the last expected record are
/// ignored.
pub fn read_text<R: BufRead>(
    reader: R,
    width: u32,
    height: u32,
    registry: &BlockRegistry,
) -> WorldResult<WorldGrid> {
    let mut lines = reader.lines();
    let mut line_no = 0;
    let mut next_line = |what: &str| -> WorldResult<(usize, String)> {
        line_no += 1;
        match lines.next() {
            Some(line) => Ok((line_no, line?)),
            None => Err(malformed(line_no, format!("unexpected end of save, expected {what}"))),
        }
    };

    let mut height_map = Vec::with_capacity(width as usize);
    for _ in 0..width {
        let (line, text) = next_line("a column height")?;
        let value: i32 = text
            .trim()
            .parse()
            .map_err(|_| malformed(line, format!("bad column height {text:?}")))?;
        height_map.push(value);
    }

    let mut cells = vec![Cell::default(); width as usize * height as usize];
    for x in 0..width as usize {
        for y in 0..height as usize {
            let (line, text) = next_line("a cell record")?;
            cells[y * width as usize + x] = decode_cell(&text, registry, line)?;
        }
    }

    WorldGrid::from_parts(width, height, cells, height_map)
}

impl World {
    /// Writes the world's grid in the text format.
    pub fn save_text<W: Write>(&self, writer: W) -> WorldResult<()> {
        write_text(self.grid(), writer)?;
        info!("Saved {}x{} world as text", self.width(), self.height());
        Ok(())
    }

    /// Replaces the grid with one read from the text format. On failure the
    /// current grid is left untouched.
    pub fn load_text<R: BufRead>(&mut self, reader: R) -> WorldResult<()> {
        let grid = read_text(reader, self.width(), self.height(), self.registry())?;
        self.replace_grid(grid)?;
        info!("Loaded {}x{} world from text", self.width(), self.height());
        Ok(())
    }
}
