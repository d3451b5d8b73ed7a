//! Canonical band and spectral index names.

use serde::{Deserialize, Serialize};

/// Sensor-agnostic band names produced by harmonization.
///
/// Names follow the Sentinel-2 convention so the reference sensor needs no
/// renaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalBand {
    Red,
    NearInfrared,
    RedEdge,
}

impl CanonicalBand {
    /// Harmonized output order.
    pub const ALL: [CanonicalBand; 3] = [Self::NearInfrared, Self::Red, Self::RedEdge];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Red => "B4",
            Self::NearInfrared => "B8",
            Self::RedEdge => "B5",
        }
    }
}

/// Normalized difference indices derived from canonical bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpectralIndex {
    /// (near-infrared - red) / (near-infrared + red)
    Ndvi,
    /// (near-infrared - red-edge) / (near-infrared + red-edge)
    Ndre,
}

impl SpectralIndex {
    pub const ALL: [SpectralIndex; 2] = [Self::Ndvi, Self::Ndre];

    /// Name of the band the index is stored under.
    pub fn band_name(&self) -> &'static str {
        match self {
            Self::Ndvi => "NDVI",
            Self::Ndre => "NDRE",
        }
    }

    /// `(positive, negative)` operands of the normalized difference.
    pub fn operands(&self) -> (CanonicalBand, CanonicalBand) {
        match self {
            Self::Ndvi => (CanonicalBand::NearInfrared, CanonicalBand::Red),
            Self::Ndre => (CanonicalBand::NearInfrared, CanonicalBand::RedEdge),
        }
    }
}

/// Bands carried by every composite, in output order.
pub fn composite_band_names() -> Vec<&'static str> {
    CanonicalBand::ALL
        .iter()
        .map(CanonicalBand::name)
        .chain(SpectralIndex::ALL.iter().map(SpectralIndex::band_name))
        .collect()
}
