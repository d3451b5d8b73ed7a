//! Temporal Compositor: per-pixel median over a month of imagery.

use log::{debug, info};
use ndarray::parallel::prelude::*;
use ndarray::{Array2, Axis};

use super::collection::{ImageCollection, Step};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{
    composite_band_names, is_no_data, AreaOfInterest, DateRange, GridSpec, ImageryRecord, NO_DATA,
};

/// Single set of bands on the AOI grid, reduced from a filtered collection.
#[derive(Debug, Clone)]
pub struct Composite {
    grid: GridSpec,
    bands: Vec<(String, Array2<f32>)>,
    image_count: usize,
    period: DateRange,
}

impl Composite {
    pub(crate) fn from_parts(
        grid: GridSpec,
        bands: Vec<(String, Array2<f32>)>,
        image_count: usize,
        period: DateRange,
    ) -> PipelineResult<Self> {
        let (er, ec) = grid.shape();
        for (_, data) in &bands {
            let (ar, ac) = data.dim();
            if (ar, ac) != (er, ec) {
                return Err(PipelineError::ShapeMismatch { er, ec, ar, ac });
            }
        }
        Ok(Self {
            grid,
            bands,
            image_count,
            period,
        })
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    /// Number of images that survived filtering and fed the median.
    pub fn image_count(&self) -> usize {
        self.image_count
    }

    pub fn period(&self) -> DateRange {
        self.period
    }

    pub fn band(&self, name: &str) -> Option<&Array2<f32>> {
        self.bands
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data)
    }

    pub fn require_band(&self, name: &str) -> PipelineResult<&Array2<f32>> {
        self.band(name).ok_or_else(|| PipelineError::MissingBand {
            band: name.to_string(),
            record: format!("composite {}", self.period),
        })
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub(crate) fn bands(&self) -> &[(String, Array2<f32>)] {
        &self.bands
    }

    pub fn valid_pixel_count(&self, band: &str) -> usize {
        self.band(band)
            .map(|data| data.iter().filter(|&&v| !is_no_data(v)).count())
            .unwrap_or(0)
    }

    /// True when no band holds a single valid pixel.
    pub fn is_empty(&self) -> bool {
        self.bands
            .iter()
            .all(|(_, data)| data.iter().all(|&v| is_no_data(v)))
    }
}

/// Filter each source to the month and AOI, harmonize it, merge the sources,
/// derive indices and reduce to a per-pixel median on the AOI grid.
///
/// An empty filtered collection yields an all-no-data composite.
pub fn composite(
    sources: &[ImageCollection],
    range: DateRange,
    aoi: &AreaOfInterest,
) -> PipelineResult<Composite> {
    let merged = sources
        .iter()
        .map(|source| {
            source
                .filter_date(range)
                .filter_bounds(aoi)
                .map(Step::Harmonize)
        })
        .fold(ImageCollection::empty(), |acc, c| acc.merge(&c));

    let records = merged.map(Step::DeriveIndices).evaluate()?;
    info!(
        "Compositing {} record(s) for {} over '{}'",
        records.len(),
        range,
        aoi.name()
    );
    median_reduce(&records, range, aoi)
}

/// Per-band, per-pixel median of `records` resampled (nearest) onto the AOI
/// grid. Pixels whose centre lies outside the AOI polygon stay no-data.
pub fn median_reduce(
    records: &[ImageryRecord],
    range: DateRange,
    aoi: &AreaOfInterest,
) -> PipelineResult<Composite> {
    let grid = *aoi.grid();
    let mut bands = Vec::new();
    for name in composite_band_names() {
        let inputs = records
            .iter()
            .map(|r| Ok((r.grid(), r.require_band(name)?)))
            .collect::<PipelineResult<Vec<_>>>()?;

        let mut out = Array2::from_elem(grid.shape(), NO_DATA);
        out.axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, mut line)| {
                let mut values = Vec::with_capacity(inputs.len());
                for col in 0..grid.cols {
                    if !aoi.covers_pixel(row, col) {
                        continue;
                    }
                    let (lon, lat) = grid.pixel_center(row, col);
                    values.clear();
                    values.extend(inputs.iter().filter_map(|(g, data)| {
                        g.locate(lon, lat)
                            .map(|rc| data[rc])
                            .filter(|v| !is_no_data(*v))
                    }));
                    if let Some(m) = median(&mut values) {
                        line[col] = m;
                    }
                }
            });
        debug!(
            "Band {}: {} valid pixel(s)",
            name,
            out.iter().filter(|&&v| !is_no_data(v)).count()
        );
        bands.push((name.to_string(), out));
    }
    Composite::from_parts(grid, bands, records.len(), range)
}

/// Median of the values, averaging the middle pair for even counts.
pub fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
#[path = "composite_tests.rs"]
mod composite_tests;
