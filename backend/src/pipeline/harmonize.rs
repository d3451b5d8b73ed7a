//! Band Harmonizer: native sensor bands to canonical `B8`/`B4`/`B5`.

use crate::error::PipelineResult;
use crate::models::{ImageryRecord, Sensor};

/// Select and rename a record's native bands onto the canonical scheme.
///
/// The sensor is resolved from the record's platform. Values are copied
/// unchanged; no radiometric cross-calibration is applied.
pub fn harmonize(record: &ImageryRecord) -> PipelineResult<ImageryRecord> {
    let sensor: Sensor = record.platform().parse()?;
    record.select_renamed(&sensor.band_mapping())
}
