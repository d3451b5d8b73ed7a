//! JSON catalog files for the local backend.
//!
//! A catalog lists imagery records per collection and maps vector asset
//! paths to GeoJSON files:
//!
//! ```json
//! {
//!   "collections": {
//!     "COPERNICUS/S2_SR_HARMONIZED": [
//!       {
//!         "id": "S2_20230603",
//!         "date": "2023-06-03",
//!         "grid": {"origin_lon": -103.95, "origin_lat": 21.05, "pixel_size": 0.01, "rows": 30, "cols": 30},
//!         "bands": [{"name": "B8", "fill": 0.45}, {"name": "B4", "values": [[0.1, 0.2], [0.1, 0.1]]}]
//!       }
//!     ]
//!   },
//!   "assets": {"projects/ee-antartida-hackathon/assets/vegetacion": "vegetacion.geojson"}
//! }
//! ```
//!
//! Relative asset paths are resolved against the catalog file's directory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use ndarray::Array2;
use serde::Deserialize;

use super::error::{ComputeError, ComputeResult};
use crate::models::{GridSpec, ImageryRecord, VectorLayer};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    collections: HashMap<String, Vec<RecordEntry>>,
    #[serde(default)]
    assets: HashMap<String, PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RecordEntry {
    id: String,
    date: NaiveDate,
    grid: GridSpec,
    bands: Vec<BandEntry>,
}

#[derive(Debug, Deserialize)]
struct BandEntry {
    name: String,
    #[serde(default)]
    fill: Option<f32>,
    #[serde(default)]
    values: Option<Vec<Vec<f32>>>,
}

/// Loaded catalog contents.
#[derive(Debug, Default)]
pub struct Catalog {
    pub collections: HashMap<String, Vec<ImageryRecord>>,
    pub assets: HashMap<String, VectorLayer>,
}

impl Catalog {
    /// Read a catalog and every GeoJSON asset it references.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ComputeResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ComputeError::configuration(format!("catalog {}", path.display()), e)
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_json_str(&content, base)
    }

    /// Parse catalog JSON, resolving relative asset paths against `base`.
    pub fn from_json_str(content: &str, base: &Path) -> ComputeResult<Self> {
        let file: CatalogFile =
            serde_json::from_str(content).map_err(|e| ComputeError::configuration("catalog", e))?;

        let mut collections = HashMap::new();
        for (collection_id, entries) in file.collections {
            let records = entries
                .into_iter()
                .map(|entry| entry.into_record(&collection_id))
                .collect::<ComputeResult<Vec<_>>>()?;
            collections.insert(collection_id, records);
        }

        let mut assets = HashMap::new();
        for (asset_path, file_path) in file.assets {
            let resolved = if file_path.is_absolute() {
                file_path
            } else {
                base.join(file_path)
            };
            let layer = load_geojson(&resolved)
                .map_err(|e| ComputeError::configuration(format!("asset '{}'", asset_path), e))?;
            assets.insert(asset_path, layer);
        }

        Ok(Self {
            collections,
            assets,
        })
    }
}

impl RecordEntry {
    fn into_record(self, collection_id: &str) -> ComputeResult<ImageryRecord> {
        let invalid =
            |message: String| ComputeError::configuration(format!("record '{}'", self.id), message);
        let grid = GridSpec::new(
            self.grid.origin_lon,
            self.grid.origin_lat,
            self.grid.pixel_size,
            self.grid.rows,
            self.grid.cols,
        )
        .map_err(|e| invalid(e.to_string()))?;
        let shape = grid.shape();
        let mut bands = Vec::with_capacity(self.bands.len());
        for band in &self.bands {
            let data = match (band.fill, &band.values) {
                (Some(fill), None) => Array2::from_elem(shape, fill),
                (None, Some(rows)) => {
                    let flat: Vec<f32> = rows.iter().flatten().copied().collect();
                    if rows.len() != shape.0 || rows.iter().any(|r| r.len() != shape.1) {
                        return Err(invalid(format!(
                            "band '{}' does not match a {}x{} grid",
                            band.name, shape.0, shape.1
                        )));
                    }
                    Array2::from_shape_vec(shape, flat).map_err(|e| invalid(e.to_string()))?
                }
                _ => {
                    return Err(invalid(format!(
                        "band '{}' needs exactly one of 'fill' or 'values'",
                        band.name
                    )))
                }
            };
            bands.push((band.name.clone(), data));
        }
        ImageryRecord::new(self.id.clone(), collection_id, self.date, grid, bands)
            .map_err(|e| invalid(e.to_string()))
    }
}

fn load_geojson(path: &Path) -> Result<VectorLayer, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    VectorLayer::from_geojson_str(&text).map_err(|e| format!("{}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = r#"{
        "collections": {
            "COPERNICUS/S2_SR_HARMONIZED": [
                {
                    "id": "S2_A",
                    "date": "2023-06-03",
                    "grid": {"origin_lon": -103.9, "origin_lat": 21.0, "pixel_size": 0.1, "rows": 2, "cols": 2},
                    "bands": [
                        {"name": "B8", "fill": 0.5},
                        {"name": "B4", "values": [[0.1, 0.2], [0.3, 0.4]]},
                        {"name": "B5", "fill": 0.2}
                    ]
                }
            ]
        },
        "assets": {"projects/demo/assets/vegetacion": "veg.geojson"}
    }"#;

    const LAYER: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"Clasif2014": "Agrícola"},
         "geometry": {"type": "Polygon", "coordinates": [[[-103.9,20.8],[-103.8,20.8],[-103.8,20.9],[-103.9,20.8]]]}}
    ]}"#;

    #[test]
    fn test_load_catalog_with_assets() {
        let dir = tempfile::tempdir().unwrap();
        let mut geojson = fs::File::create(dir.path().join("veg.geojson")).unwrap();
        geojson.write_all(LAYER.as_bytes()).unwrap();
        let catalog_path = dir.path().join("catalog.json");
        fs::write(&catalog_path, CATALOG).unwrap();

        let catalog = Catalog::from_file(&catalog_path).unwrap();
        let records = &catalog.collections["COPERNICUS/S2_SR_HARMONIZED"];
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].platform(), "COPERNICUS/S2_SR_HARMONIZED");
        assert_eq!(records[0].band("B4").unwrap()[[1, 0]], 0.3);
        assert_eq!(records[0].band("B8").unwrap()[[1, 1]], 0.5);
        assert_eq!(catalog.assets["projects/demo/assets/vegetacion"].len(), 1);
    }

    #[test]
    fn test_missing_asset_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::from_json_str(CATALOG, dir.path()).unwrap_err();
        match err {
            ComputeError::Configuration { origin, .. } => {
                assert_eq!(origin, "asset 'projects/demo/assets/vegetacion'")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_band_shape_is_checked() {
        let text = r#"{"collections": {"X": [{
            "id": "bad", "date": "2023-06-01",
            "grid": {"origin_lon": 0, "origin_lat": 0, "pixel_size": 1, "rows": 2, "cols": 2},
            "bands": [{"name": "B4", "values": [[1, 2, 3]]}]
        }]}}"#;
        assert!(Catalog::from_json_str(text, Path::new(".")).is_err());
    }

    #[test]
    fn test_band_needs_one_source() {
        let text = r#"{"collections": {"X": [{
            "id": "bad", "date": "2023-06-01",
            "grid": {"origin_lon": 0, "origin_lat": 0, "pixel_size": 1, "rows": 1, "cols": 1},
            "bands": [{"name": "B4"}]
        }]}}"#;
        assert!(Catalog::from_json_str(text, Path::new(".")).is_err());
    }

    #[test]
    fn test_missing_catalog_file() {
        let err = Catalog::from_file("/nonexistent/catalog.json").unwrap_err();
        assert!(err.to_string().starts_with("Invalid catalog /nonexistent/catalog.json"));
    }

    #[test]
    fn test_degenerate_grid_is_rejected() {
        for grid in [
            r#"{"origin_lon": 0, "origin_lat": 0, "pixel_size": 0.0, "rows": 1, "cols": 1}"#,
            r#"{"origin_lon": 0, "origin_lat": 0, "pixel_size": 0.1, "rows": 0, "cols": 0}"#,
            r#"{"origin_lon": 0, "origin_lat": 0, "pixel_size": -0.1, "rows": 2, "cols": 2}"#,
        ] {
            let text = format!(
                r#"{{"collections": {{"X": [{{
                    "id": "flat", "date": "2023-06-01", "grid": {},
                    "bands": [{{"name": "B4", "fill": 0.1}}]
                }}]}}}}"#,
                grid
            );
            match Catalog::from_json_str(&text, Path::new(".")) {
                Err(ComputeError::Configuration { origin, .. }) => assert_eq!(origin, "record 'flat'"),
                other => panic!("{} loaded as {:?}", grid, other),
            }
        }
    }
}
