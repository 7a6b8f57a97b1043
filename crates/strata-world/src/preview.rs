//! Overview image of a world, one pixel per cell.

use std::path::Path;

use image::{Rgb, RgbImage};
use tracing::info;

use crate::error::WorldResult;
use crate::grid::Layer;
use crate::world::World;

/// Layers consulted for a cell's colour, front to back. Empty cells show
/// the air colour.
const PAINT_ORDER: [Layer; 3] = [Layer::World, Layer::Nature, Layer::Back];

/// Draws the world with each block's preview colour. The image is flipped
/// vertically so the sky is at the top.
#[must_use]
pub fn render_preview(world: &World) -> RgbImage {
    let registry = world.registry();
    let sky = registry.air().save_color;
    let height = world.height();
    let mut image = RgbImage::new(world.width(), height);

    for (cell, pos) in world.grid().cells().iter().zip(row_major(world)) {
        let color = PAINT_ORDER
            .iter()
            .map(|&layer| cell.slot(layer))
            .find(|slot| !slot.is_empty())
            .and_then(|slot| registry.by_id(slot.block))
            .map_or(sky, |def| def.save_color);
        image.put_pixel(pos.0, height - 1 - pos.1, Rgb(color));
    }
    image
}

fn row_major(world: &World) -> impl Iterator<Item = (u32, u32)> {
    let (width, height) = (world.width(), world.height());
    (0..height).flat_map(move |y| (0..width).map(move |x| (x, y)))
}

/// Renders the preview and writes it as a PNG.
pub fn save_preview(world: &World, path: impl AsRef<Path>) -> WorldResult<()> {
    let path = path.as_ref();
    render_preview(world).save(path)?;
    info!("Wrote preview to {}", path.display());
    Ok(())
}
