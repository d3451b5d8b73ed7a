//! Index Deriver: normalized difference indices appended as bands.

use ndarray::{Array2, Zip};

use crate::error::PipelineResult;
use crate::models::{is_no_data, ImageryRecord, SpectralIndex, NO_DATA};

/// Denominators smaller than this are treated as zero.
const EPSILON: f32 = 1e-10;

/// Per-pixel `(a - b) / (a + b)`.
///
/// A pixel is [`NO_DATA`] when either input is no-data or the denominator is
/// zero. Valid results are clamped to `[-1, 1]`.
pub fn normalized_difference(a: &Array2<f32>, b: &Array2<f32>) -> Array2<f32> {
    let mut out = Array2::from_elem(a.dim(), NO_DATA);
    Zip::from(&mut out)
        .and(a)
        .and(b)
        .par_for_each(|o, &a, &b| {
            if is_no_data(a) || is_no_data(b) {
                return;
            }
            let sum = a + b;
            if sum.abs() < EPSILON {
                return;
            }
            *o = ((a - b) / sum).clamp(-1.0, 1.0);
        });
    out
}

/// Append `NDVI` and `NDRE` to a harmonized record.
pub fn derive_indices(record: &ImageryRecord) -> PipelineResult<ImageryRecord> {
    let mut out = record.clone();
    for index in SpectralIndex::ALL {
        let (pos, neg) = index.operands();
        let values = normalized_difference(
            record.require_band(pos.name())?,
            record.require_band(neg.name())?,
        );
        out = out.with_band(index.band_name(), values)?;
    }
    Ok(out)
}
