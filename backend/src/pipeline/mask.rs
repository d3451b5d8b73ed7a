//! Spatial Masker: binary rasters from filtered vector layers.

use std::sync::{Arc, OnceLock};

use geo::{BoundingRect, Contains, Geometry, Point, Polygon};
use log::{debug, info};
use ndarray::{Array2, Zip};

use super::composite::Composite;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{AreaOfInterest, AttributePredicate, GridSpec, VectorLayer, NO_DATA};

/// `{0, 1}` raster on the AOI grid.
#[derive(Debug, Clone)]
pub struct Mask {
    grid: GridSpec,
    values: Array2<u8>,
}

impl Mask {
    /// Rasterize the union of the features matching `predicate`.
    ///
    /// A pixel is 1 when its centre lies inside any matching polygon.
    /// Geometries other than polygons and multipolygons are ignored.
    pub fn build(
        layer: &VectorLayer,
        predicate: &AttributePredicate,
        aoi: &AreaOfInterest,
    ) -> PipelineResult<Self> {
        let grid = *aoi.grid();
        let mut values = Array2::<u8>::zeros(grid.shape());
        let matching = layer.filter(predicate);
        info!(
            "Building mask from {} of {} feature(s) matching {}",
            matching.len(),
            layer.len(),
            predicate
        );

        for feature in matching.iter() {
            let polygons: Vec<&Polygon<f64>> = match &feature.geometry {
                Geometry::Polygon(p) => vec![p],
                Geometry::MultiPolygon(mp) => mp.0.iter().collect(),
                _ => {
                    debug!("Skipping non-areal geometry on feature {:?}", feature.id);
                    continue;
                }
            };
            for polygon in polygons {
                burn(polygon, &grid, &mut values);
            }
        }
        Ok(Self { grid, values })
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn values(&self) -> &Array2<u8> {
        &self.values
    }

    pub fn covers_pixel(&self, row: usize, col: usize) -> bool {
        self.values.get((row, col)).is_some_and(|&v| v == 1)
    }

    pub fn covered_pixels(&self) -> usize {
        self.values.iter().filter(|&&v| v == 1).count()
    }

    /// Composite with every pixel outside the mask set to no-data in all
    /// bands. Pixels inside keep their values.
    pub fn apply(&self, composite: &Composite) -> PipelineResult<Composite> {
        if composite.grid() != &self.grid {
            return Err(PipelineError::GridMismatch(format!(
                "mask grid {:?} does not match composite grid {:?}",
                self.grid,
                composite.grid()
            )));
        }
        let bands = composite
            .bands()
            .iter()
            .map(|(name, data)| {
                let mut masked = data.clone();
                Zip::from(&mut masked).and(&self.values).for_each(|v, &m| {
                    if m == 0 {
                        *v = NO_DATA;
                    }
                });
                (name.clone(), masked)
            })
            .collect();
        Composite::from_parts(
            self.grid,
            bands,
            composite.image_count(),
            composite.period(),
        )
    }
}

fn burn(polygon: &Polygon<f64>, grid: &GridSpec, values: &mut Array2<u8>) {
    let Some(window) = polygon.bounding_rect().and_then(|rect| grid.window(rect)) else {
        return;
    };
    let (row0, row1, col0, col1) = window;
    for row in row0..=row1 {
        for col in col0..=col1 {
            if values[(row, col)] == 1 {
                continue;
            }
            let (lon, lat) = grid.pixel_center(row, col);
            if polygon.contains(&Point::new(lon, lat)) {
                values[(row, col)] = 1;
            }
        }
    }
}

/// Init-once holder for the process-wide mask.
///
/// Clones share the same slot. Reads before [`init`](Self::init) fail with
/// [`PipelineError::NotInitialized`] instead of blocking.
#[derive(Debug, Clone, Default)]
pub struct MaskCell {
    slot: Arc<OnceLock<Arc<Mask>>>,
}

impl MaskCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&self, mask: Mask) -> PipelineResult<Arc<Mask>> {
        let mask = Arc::new(mask);
        self.slot
            .set(Arc::clone(&mask))
            .map_err(|_| PipelineError::Initialization("mask already initialized".to_string()))?;
        Ok(mask)
    }

    pub fn get(&self) -> PipelineResult<Arc<Mask>> {
        self.slot
            .get()
            .cloned()
            .ok_or(PipelineError::NotInitialized("agricultural mask"))
    }

    pub fn is_ready(&self) -> bool {
        self.slot.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateRange, Feature};
    use geo::polygon;

    fn aoi() -> AreaOfInterest {
        AreaOfInterest::tequila(0.02).unwrap()
    }

    fn west_half() -> Feature {
        Feature::new(Geometry::Polygon(polygon![
            (x: -103.95, y: 20.75),
            (x: -103.8, y: 20.75),
            (x: -103.8, y: 21.05),
            (x: -103.95, y: 21.05),
        ]))
        .with_property("Clasif2014", "Agrícola")
    }

    fn forest() -> Feature {
        Feature::new(Geometry::Polygon(polygon![
            (x: -103.8, y: 20.75),
            (x: -103.65, y: 20.75),
            (x: -103.65, y: 21.05),
            (x: -103.8, y: 21.05),
        ]))
        .with_property("Clasif2014", "Bosque")
    }

    fn agricultural() -> AttributePredicate {
        AttributePredicate::equals("Clasif2014", "Agrícola")
    }

    fn composite(value: f32) -> Composite {
        let grid = *aoi().grid();
        Composite::from_parts(
            grid,
            vec![
                ("NDVI".to_string(), Array2::from_elem(grid.shape(), value)),
                ("NDRE".to_string(), Array2::from_elem(grid.shape(), value / 2.0)),
            ],
            1,
            DateRange::for_month(2023, 6).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_only_matching_features_are_burned() {
        let layer = VectorLayer::new(vec![west_half(), forest()]);
        let mask = Mask::build(&layer, &agricultural(), &aoi()).unwrap();
        assert!(mask.covers_pixel(0, 0));
        assert!(mask.covers_pixel(9, 4));
        assert!(!mask.covers_pixel(0, 5));
        assert!(!mask.covers_pixel(9, 9));
        assert_eq!(mask.covered_pixels(), 50);
    }

    #[test]
    fn test_apply_keeps_inside_and_blanks_outside() {
        let layer = VectorLayer::new(vec![west_half(), forest()]);
        let mask = Mask::build(&layer, &agricultural(), &aoi()).unwrap();
        let masked = mask.apply(&composite(0.7)).unwrap();
        let ndvi = masked.band("NDVI").unwrap();
        let ndre = masked.band("NDRE").unwrap();
        assert_eq!(ndvi[[3, 2]], 0.7);
        assert_eq!(ndre[[3, 2]], 0.35);
        assert_eq!(ndvi[[3, 7]], NO_DATA);
        assert_eq!(ndre[[3, 7]], NO_DATA);
        assert_eq!(masked.image_count(), 1);
    }

    #[test]
    fn test_no_matching_features_blanks_everything() {
        let layer = VectorLayer::new(vec![forest()]);
        let mask = Mask::build(&layer, &agricultural(), &aoi()).unwrap();
        assert_eq!(mask.covered_pixels(), 0);
        assert!(mask.apply(&composite(0.5)).unwrap().is_empty());
    }

    #[test]
    fn test_multipolygon_and_points() {
        let multi = Geometry::MultiPolygon(geo::MultiPolygon(vec![polygon![
            (x: -103.9, y: 20.98),
            (x: -103.86, y: 20.98),
            (x: -103.86, y: 21.0),
            (x: -103.9, y: 21.0),
        ]]));
        let layer = VectorLayer::new(vec![
            Feature::new(multi).with_property("Clasif2014", "Agrícola"),
            Feature::new(Geometry::Point(Point::new(-103.75, 20.85)))
                .with_property("Clasif2014", "Agrícola"),
        ]);
        let mask = Mask::build(&layer, &agricultural(), &aoi()).unwrap();
        assert_eq!(mask.covered_pixels(), 2);
        assert!(mask.covers_pixel(0, 0));
        assert!(mask.covers_pixel(0, 1));
    }

    #[test]
    fn test_grid_mismatch_is_rejected() {
        let other = AreaOfInterest::tequila(0.05).unwrap();
        let mask = Mask::build(&VectorLayer::default(), &agricultural(), &other).unwrap();
        assert!(matches!(
            mask.apply(&composite(0.5)),
            Err(PipelineError::GridMismatch(_))
        ));
    }

    #[test]
    fn test_cell_is_init_once() {
        let cell = MaskCell::new();
        assert!(matches!(cell.get(), Err(PipelineError::NotInitialized(_))));
        let mask = Mask {
            grid: *aoi().grid(),
            values: Array2::ones((10, 10)),
        };
        cell.init(mask.clone()).unwrap();
        let shared = cell.clone();
        assert!(shared.is_ready());
        assert_eq!(shared.get().unwrap().covered_pixels(), 100);
        assert!(matches!(
            cell.init(mask),
            Err(PipelineError::Initialization(_))
        ));
    }
}
