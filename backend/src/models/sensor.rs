//! Supported sensors and their native band layouts.

use std::fmt;
use std::str::FromStr;

use super::band::CanonicalBand;
use crate::error::PipelineError;

/// Sensor families the harmonizer knows how to map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sensor {
    /// Sentinel-2 surface reflectance (reference naming)
    Sentinel2,
    /// Landsat 8 Collection 2 Level 2 surface reflectance
    Landsat8,
}

impl Sensor {
    pub const ALL: [Sensor; 2] = [Self::Sentinel2, Self::Landsat8];

    /// Collection identifier used by the compute backend.
    pub fn collection_id(&self) -> &'static str {
        match self {
            Self::Sentinel2 => "COPERNICUS/S2_SR_HARMONIZED",
            Self::Landsat8 => "LANDSAT/LC08/C02/T1_L2",
        }
    }

    /// Native band name feeding each canonical band.
    ///
    /// Landsat 8 has no red-edge channel; its green band (`SR_B3`) stands in.
    pub fn native_band(&self, band: CanonicalBand) -> &'static str {
        match (self, band) {
            (Self::Sentinel2, b) => b.name(),
            (Self::Landsat8, CanonicalBand::Red) => "SR_B4",
            (Self::Landsat8, CanonicalBand::NearInfrared) => "SR_B5",
            (Self::Landsat8, CanonicalBand::RedEdge) => "SR_B3",
        }
    }

    /// `(native, canonical)` pairs in harmonized output order.
    pub fn band_mapping(&self) -> [(&'static str, &'static str); 3] {
        CanonicalBand::ALL.map(|band| (self.native_band(band), band.name()))
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection_id())
    }
}

impl FromStr for Sensor {
    type Err = PipelineError;

    /// Accepts collection ids as well as short aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "copernicus/s2_sr_harmonized" | "copernicus/s2_sr" | "sentinel-2" | "sentinel2"
            | "s2" => Ok(Self::Sentinel2),
            "landsat/lc08/c02/t1_l2" | "landsat-8" | "landsat8" | "l8" => Ok(Self::Landsat8),
            _ => Err(PipelineError::UnsupportedSensor(s.to_string())),
        }
    }
}
