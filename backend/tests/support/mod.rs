#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use bloomwatch::compute::LocalBackend;
use bloomwatch::config::ServiceConfig;
use bloomwatch::models::{Feature, GridSpec, ImageryRecord, VectorLayer};
use bloomwatch::services::VegetationService;
use chrono::NaiveDate;
use geo::{polygon, Geometry};
use ndarray::Array2;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// =============================================================================
// Synthetic imagery and service builders
// =============================================================================

pub const S2: &str = "COPERNICUS/S2_SR_HARMONIZED";
pub const L8: &str = "LANDSAT/LC08/C02/T1_L2";
pub const BASE_URL: &str = "http://tiles.test";

/// 30x30 grid at 0.01 degrees covering the Tequila region with margin.
pub fn scene_grid() -> GridSpec {
    GridSpec::new(-103.95, 21.05, 0.01, 30, 30).unwrap()
}

/// Constant-valued scene with `names` carrying `values`.
pub fn scene(
    id: &str,
    platform: &str,
    date: (i32, u32, u32),
    names: [&str; 3],
    values: [f32; 3],
) -> ImageryRecord {
    let grid = scene_grid();
    ImageryRecord::new(
        id,
        platform,
        NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        grid,
        names
            .iter()
            .zip(values)
            .map(|(n, v)| (n.to_string(), Array2::from_elem(grid.shape(), v)))
            .collect(),
    )
    .unwrap()
}

pub fn s2_scene(id: &str, date: (i32, u32, u32), values: [f32; 3]) -> ImageryRecord {
    scene(id, S2, date, ["B8", "B4", "B5"], values)
}

pub fn l8_scene(id: &str, date: (i32, u32, u32), values: [f32; 3]) -> ImageryRecord {
    scene(id, L8, date, ["SR_B5", "SR_B4", "SR_B3"], values)
}

/// Configuration with a coarse analysis grid so tests stay fast.
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.region.pixel_size = 0.01;
    config.server.public_base_url = BASE_URL.to_string();
    config
}

/// Backend holding one June 2023 scene per sensor.
pub fn seeded_backend() -> Arc<LocalBackend> {
    let backend = Arc::new(LocalBackend::new(BASE_URL));
    backend.insert_records(S2, vec![s2_scene("S2_0612", (2023, 6, 12), [0.6, 0.1, 0.3])]);
    backend.insert_records(L8, vec![l8_scene("L8_0620", (2023, 6, 20), [0.5, 0.1, 0.2])]);
    backend
}

/// One agricultural polygon over the western half of the region and one
/// non-agricultural polygon over the eastern half.
pub fn vegetation_layer(class: &str) -> VectorLayer {
    VectorLayer::new(vec![
        Feature::new(Geometry::Polygon(polygon![
            (x: -103.9, y: 20.8),
            (x: -103.8, y: 20.8),
            (x: -103.8, y: 21.0),
            (x: -103.9, y: 21.0),
        ]))
        .with_property("Clasif2014", class),
        Feature::new(Geometry::Polygon(polygon![
            (x: -103.8, y: 20.8),
            (x: -103.7, y: 20.8),
            (x: -103.7, y: 21.0),
            (x: -103.8, y: 21.0),
        ]))
        .with_property("Clasif2014", "Bosque"),
    ])
}

pub fn vegetation_service(backend: Arc<LocalBackend>, config: &ServiceConfig) -> VegetationService {
    let aoi = config.region.area_of_interest().unwrap();
    VegetationService::new(backend, aoi, config)
}
