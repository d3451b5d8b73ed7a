//! The fixed area of interest every request is computed over.

use std::sync::Arc;

use geo::{BoundingRect, Contains, Intersects, LineString, Point, Polygon, Rect};
use ndarray::Array2;

use super::grid::GridSpec;
use crate::error::{PipelineError, PipelineResult};

/// Region boundary plus the analysis grid covering it.
///
/// The per-pixel inside/outside table is computed once at construction so
/// clipping a composite costs a lookup per pixel.
#[derive(Debug, Clone)]
pub struct AreaOfInterest {
    name: String,
    polygon: Polygon<f64>,
    grid: GridSpec,
    inside: Arc<Array2<bool>>,
}

impl AreaOfInterest {
    /// Build an AOI from an exterior ring of `[lon, lat]` pairs.
    pub fn from_ring(
        name: impl Into<String>,
        ring: &[[f64; 2]],
        pixel_size: f64,
    ) -> PipelineResult<Self> {
        if ring.len() < 3 {
            return Err(PipelineError::InvalidGeometry(format!(
                "AOI ring needs at least 3 vertices, got {}",
                ring.len()
            )));
        }
        let exterior: LineString<f64> = ring.iter().map(|&[lon, lat]| (lon, lat)).collect();
        Self::new(name, Polygon::new(exterior, vec![]), pixel_size)
    }

    pub fn new(
        name: impl Into<String>,
        polygon: Polygon<f64>,
        pixel_size: f64,
    ) -> PipelineResult<Self> {
        let bounds = polygon
            .bounding_rect()
            .ok_or_else(|| PipelineError::InvalidGeometry("AOI polygon is empty".to_string()))?;
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return Err(PipelineError::InvalidGeometry(
                "AOI polygon has zero area".to_string(),
            ));
        }
        let grid = GridSpec::covering(bounds, pixel_size)?;
        let inside = Array2::from_shape_fn(grid.shape(), |(row, col)| {
            let (lon, lat) = grid.pixel_center(row, col);
            polygon.contains(&Point::new(lon, lat))
        });
        Ok(Self {
            name: name.into(),
            polygon,
            grid,
            inside: Arc::new(inside),
        })
    }

    /// The Tequila agave region the service was built for.
    pub fn tequila(pixel_size: f64) -> PipelineResult<Self> {
        Self::from_ring("tequila", &TEQUILA_RING, pixel_size)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    /// Whether the centre of an analysis-grid pixel lies inside the polygon.
    pub fn covers_pixel(&self, row: usize, col: usize) -> bool {
        self.inside.get((row, col)).copied().unwrap_or(false)
    }

    pub fn intersects(&self, footprint: &Rect<f64>) -> bool {
        self.polygon.intersects(footprint)
    }
}

/// Exterior ring of the Tequila region, `[lon, lat]`.
pub const TEQUILA_RING: [[f64; 2]; 4] = [
    [-103.9, 21.0],
    [-103.7, 21.0],
    [-103.7, 20.8],
    [-103.9, 20.8],
];
