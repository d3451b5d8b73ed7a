//! XYZ (Web Mercator) tile rendering for registered layers.

use std::f64::consts::PI;
use std::io::Cursor;

use geo::{coord, Intersects, Rect};
use image::{ImageFormat, RgbaImage};
use rayon::prelude::*;

use super::error::{ComputeError, ComputeResult};
use crate::models::TileCoord;
use crate::pipeline::{RenderedLayer, TRANSPARENT};

/// Output tile edge in pixels.
pub const TILE_SIZE: u32 = 256;

/// Half the earth's circumference in Web Mercator meters
const HALF_EARTH: f64 = 20_037_508.342_789_244;

/// Tile extent in Web Mercator meters as `(min_x, min_y, max_x, max_y)`.
fn mercator_bounds(tile: TileCoord) -> (f64, f64, f64, f64) {
    let n = f64::from(1u32 << tile.z);
    let size = 2.0 * HALF_EARTH / n;
    let min_x = -HALF_EARTH + f64::from(tile.x) * size;
    let max_y = HALF_EARTH - f64::from(tile.y) * size;
    (min_x, max_y - size, min_x + size, max_y)
}

#[inline]
fn merc_x_to_lon(x: f64) -> f64 {
    x * 180.0 / HALF_EARTH
}

#[inline]
fn merc_y_to_lat(y: f64) -> f64 {
    let y_rad = y * PI / HALF_EARTH;
    (2.0 * y_rad.exp().atan() - PI / 2.0) * 180.0 / PI
}

/// Geographic (lon/lat) bounds of a tile.
pub fn tile_bounds(tile: TileCoord) -> Rect<f64> {
    let (min_x, min_y, max_x, max_y) = mercator_bounds(tile);
    Rect::new(
        coord! { x: merc_x_to_lon(min_x), y: merc_y_to_lat(min_y) },
        coord! { x: merc_x_to_lon(max_x), y: merc_y_to_lat(max_y) },
    )
}

/// Sample `layer` (nearest) into a 256x256 RGBA tile.
///
/// Pixels falling outside the layer grid are transparent; a tile that misses
/// the layer entirely is fully transparent.
pub fn render_tile_image(layer: &RenderedLayer, tile: TileCoord) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, image::Rgba(TRANSPARENT));
    if !tile_bounds(tile).intersects(&layer.grid().bounds()) {
        return img;
    }
    let (min_x, _, max_x, max_y) = mercator_bounds(tile);
    let res = (max_x - min_x) / f64::from(TILE_SIZE);
    let grid = layer.grid();
    img.par_chunks_mut(TILE_SIZE as usize * 4)
        .enumerate()
        .for_each(|(py, line)| {
            let lat = merc_y_to_lat(max_y - (py as f64 + 0.5) * res);
            for (px, out) in line.chunks_exact_mut(4).enumerate() {
                let lon = merc_x_to_lon(min_x + (px as f64 + 0.5) * res);
                if let Some((row, col)) = grid.locate(lon, lat) {
                    out.copy_from_slice(&layer.pixel(row, col));
                }
            }
        });
    img
}

/// Render and PNG-encode a tile.
pub fn render_png(layer: &RenderedLayer, tile: TileCoord) -> ComputeResult<Vec<u8>> {
    let img = render_tile_image(layer, tile);
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).map_err(|e| {
        ComputeError::Internal(format!(
            "PNG encoding of tile {} for map {} failed: {}",
            tile,
            layer.id(),
            e
        ))
    })?;
    Ok(buf.into_inner())
}
