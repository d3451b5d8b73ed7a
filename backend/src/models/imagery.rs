//! Imagery records: named raster bands on a shared grid.

use std::sync::Arc;

use chrono::NaiveDate;
use ndarray::Array2;

use super::grid::GridSpec;
use crate::error::{PipelineError, PipelineResult};

/// Explicit no-data value written into every output raster.
pub const NO_DATA: f32 = -9999.0;

/// True for the no-data sentinel and for any non-finite input value.
#[inline]
pub fn is_no_data(value: f32) -> bool {
    !value.is_finite() || value == NO_DATA
}

/// Shared, immutable band pixels.
pub type BandData = Arc<Array2<f32>>;

/// A single acquisition from one sensor collection.
///
/// Records are immutable: every transform returns a new record and band
/// pixels are shared between the old and new record through `Arc`.
#[derive(Debug, Clone)]
pub struct ImageryRecord {
    id: String,
    platform: String,
    acquired: NaiveDate,
    grid: GridSpec,
    bands: Vec<(String, BandData)>,
}

impl ImageryRecord {
    /// Create a record, checking every band against the grid shape.
    pub fn new(
        id: impl Into<String>,
        platform: impl Into<String>,
        acquired: NaiveDate,
        grid: GridSpec,
        bands: Vec<(String, Array2<f32>)>,
    ) -> PipelineResult<Self> {
        let mut record = Self {
            id: id.into(),
            platform: platform.into(),
            acquired,
            grid,
            bands: Vec::with_capacity(bands.len()),
        };
        for (name, data) in bands {
            record.push_band(name, Arc::new(data))?;
        }
        Ok(record)
    }

    fn push_band(&mut self, name: String, data: BandData) -> PipelineResult<()> {
        let (er, ec) = self.grid.shape();
        let (ar, ac) = data.dim();
        if (er, ec) != (ar, ac) {
            return Err(PipelineError::ShapeMismatch { er, ec, ar, ac });
        }
        match self.bands.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = data,
            None => self.bands.push((name, data)),
        }
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Source collection identifier (e.g. `COPERNICUS/S2_SR_HARMONIZED`).
    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn acquired(&self) -> NaiveDate {
        self.acquired
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn band(&self, name: &str) -> Option<&Array2<f32>> {
        self.bands
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_ref())
    }

    /// Like [`band`](Self::band) but reports which record lacked it.
    pub fn require_band(&self, name: &str) -> PipelineResult<&Array2<f32>> {
        self.band(name).ok_or_else(|| PipelineError::MissingBand {
            band: name.to_string(),
            record: self.id.clone(),
        })
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// New record with `data` added as `name` (replacing a band of that name).
    pub fn with_band(&self, name: impl Into<String>, data: Array2<f32>) -> PipelineResult<Self> {
        let mut next = self.clone();
        next.push_band(name.into(), Arc::new(data))?;
        Ok(next)
    }

    /// New record holding only the listed bands, each renamed from
    /// `(native, renamed)`. Output band order follows `mapping`.
    pub fn select_renamed(&self, mapping: &[(&str, &str)]) -> PipelineResult<Self> {
        let mut bands = Vec::with_capacity(mapping.len());
        for (native, renamed) in mapping {
            let data = self
                .bands
                .iter()
                .find(|(n, _)| n == native)
                .map(|(_, data)| Arc::clone(data))
                .ok_or_else(|| PipelineError::MissingBand {
                    band: native.to_string(),
                    record: self.id.clone(),
                })?;
            bands.push((renamed.to_string(), data));
        }
        Ok(Self {
            id: self.id.clone(),
            platform: self.platform.clone(),
            acquired: self.acquired,
            grid: self.grid,
            bands,
        })
    }
}
