//! North-up geographic raster grids.

use geo::{coord, Rect};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Georeferencing for a raster in geographic coordinates (EPSG:4326).
///
/// Pixel `(row, col)` covers
/// `[origin_lon + col * pixel_size, origin_lon + (col + 1) * pixel_size)` in
/// longitude and the mirrored interval below `origin_lat` in latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Longitude of the upper-left corner
    pub origin_lon: f64,
    /// Latitude of the upper-left corner
    pub origin_lat: f64,
    /// Cell size in degrees (same in both axes)
    pub pixel_size: f64,
    pub rows: usize,
    pub cols: usize,
}

impl GridSpec {
    pub fn new(
        origin_lon: f64,
        origin_lat: f64,
        pixel_size: f64,
        rows: usize,
        cols: usize,
    ) -> PipelineResult<Self> {
        if !(pixel_size.is_finite() && pixel_size > 0.0) {
            return Err(PipelineError::InvalidGeometry(format!(
                "pixel size must be positive, got {}",
                pixel_size
            )));
        }
        if rows == 0 || cols == 0 {
            return Err(PipelineError::InvalidGeometry(format!(
                "grid must have at least one pixel, got {}x{}",
                rows, cols
            )));
        }
        Ok(Self {
            origin_lon,
            origin_lat,
            pixel_size,
            rows,
            cols,
        })
    }

    /// Smallest grid of `pixel_size` cells anchored at the rectangle's
    /// upper-left corner that covers the whole rectangle.
    pub fn covering(bounds: Rect<f64>, pixel_size: f64) -> PipelineResult<Self> {
        if !(pixel_size.is_finite() && pixel_size > 0.0) {
            return Err(PipelineError::InvalidGeometry(format!(
                "pixel size must be positive, got {}",
                pixel_size
            )));
        }
        // tolerance keeps 0.2 / 0.01 at 20 cells despite decimal rounding
        let cells = |extent: f64| ((extent / pixel_size) - 1e-9).ceil().max(1.0) as usize;
        let cols = cells(bounds.width());
        let rows = cells(bounds.height());
        Self::new(bounds.min().x, bounds.max().y, pixel_size, rows, cols)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Longitude/latitude of the pixel centre.
    pub fn pixel_center(&self, row: usize, col: usize) -> (f64, f64) {
        let lon = self.origin_lon + (col as f64 + 0.5) * self.pixel_size;
        let lat = self.origin_lat - (row as f64 + 0.5) * self.pixel_size;
        (lon, lat)
    }

    /// Pixel containing the given coordinate, if it falls inside the grid.
    pub fn locate(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        let col = (lon - self.origin_lon) / self.pixel_size;
        let row = (self.origin_lat - lat) / self.pixel_size;
        if !(col.is_finite() && row.is_finite()) || col < 0.0 || row < 0.0 {
            return None;
        }
        let (row, col) = (row.floor() as usize, col.floor() as usize);
        (row < self.rows && col < self.cols).then_some((row, col))
    }

    pub fn bounds(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.origin_lon, y: self.origin_lat - self.rows as f64 * self.pixel_size },
            coord! { x: self.origin_lon + self.cols as f64 * self.pixel_size, y: self.origin_lat },
        )
    }

    /// Inclusive pixel window covering a rectangle, clipped to the grid.
    pub fn window(&self, rect: Rect<f64>) -> Option<(usize, usize, usize, usize)> {
        let grid = self.bounds();
        if rect.max().x < grid.min().x
            || rect.min().x > grid.max().x
            || rect.max().y < grid.min().y
            || rect.min().y > grid.max().y
        {
            return None;
        }
        let clamp_col = |lon: f64| {
            (((lon - self.origin_lon) / self.pixel_size).floor().max(0.0) as usize)
                .min(self.cols - 1)
        };
        let clamp_row = |lat: f64| {
            (((self.origin_lat - lat) / self.pixel_size).floor().max(0.0) as usize)
                .min(self.rows - 1)
        };
        Some((
            clamp_row(rect.max().y),
            clamp_row(rect.min().y),
            clamp_col(rect.min().x),
            clamp_col(rect.max().x),
        ))
    }
}
