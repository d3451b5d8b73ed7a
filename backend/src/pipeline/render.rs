//! Single-band rasters to RGBA through a visualization style.

use std::sync::Arc;

use ndarray::Array2;
use sha2::{Digest, Sha256};

use crate::error::{PipelineError, PipelineResult};
use crate::models::{is_no_data, GridSpec, VisualizationStyle};

/// Fully transparent pixel.
pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Styled raster ready for tile serving.
///
/// The id is a SHA-256 over the grid and the RGBA pixels, so identical
/// renders share an id.
#[derive(Debug, Clone)]
pub struct RenderedLayer {
    id: String,
    grid: GridSpec,
    rgba: Arc<Vec<u8>>,
}

impl RenderedLayer {
    pub fn new(grid: GridSpec, rgba: Vec<u8>) -> PipelineResult<Self> {
        if rgba.len() != grid.len() * 4 {
            return Err(PipelineError::Internal(format!(
                "RGBA buffer holds {} bytes, grid {}x{} needs {}",
                rgba.len(),
                grid.rows,
                grid.cols,
                grid.len() * 4
            )));
        }
        let id = layer_id(&grid, &rgba);
        Ok(Self {
            id,
            grid,
            rgba: Arc::new(rgba),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn pixel(&self, row: usize, col: usize) -> [u8; 4] {
        if row >= self.grid.rows || col >= self.grid.cols {
            return TRANSPARENT;
        }
        let i = (row * self.grid.cols + col) * 4;
        [
            self.rgba[i],
            self.rgba[i + 1],
            self.rgba[i + 2],
            self.rgba[i + 3],
        ]
    }

    /// True when no pixel is visible.
    pub fn is_transparent(&self) -> bool {
        self.rgba.chunks_exact(4).all(|px| px[3] == 0)
    }
}

/// Apply `style` to every pixel; no-data becomes transparent.
pub fn render(
    band: &Array2<f32>,
    grid: &GridSpec,
    style: &VisualizationStyle,
) -> PipelineResult<RenderedLayer> {
    let (er, ec) = grid.shape();
    let (ar, ac) = band.dim();
    if (er, ec) != (ar, ac) {
        return Err(PipelineError::ShapeMismatch { er, ec, ar, ac });
    }
    let mut rgba = Vec::with_capacity(grid.len() * 4);
    for &value in band.iter() {
        if is_no_data(value) {
            rgba.extend_from_slice(&TRANSPARENT);
        } else {
            let c = style.color_at(f64::from(value));
            rgba.extend_from_slice(&[c.r, c.g, c.b, 255]);
        }
    }
    RenderedLayer::new(*grid, rgba)
}

fn layer_id(grid: &GridSpec, rgba: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(grid.origin_lon.to_le_bytes());
    hasher.update(grid.origin_lat.to_le_bytes());
    hasher.update(grid.pixel_size.to_le_bytes());
    hasher.update((grid.rows as u64).to_le_bytes());
    hasher.update((grid.cols as u64).to_le_bytes());
    hasher.update(rgba);
    hex::encode(hasher.finalize())
}
