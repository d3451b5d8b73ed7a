//! In-memory local compute backend.
//!
//! Imagery collections and vector assets live in HashMaps (optionally loaded
//! from a [`Catalog`] file); rendered layers are kept in a bounded LRU tile
//! registry and served back as PNG tiles under the configured public base URL.
//! A map id evicted from the registry answers tile requests with not-found.

use async_trait::async_trait;
use log::{debug, info};
use lru::LruCache;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use super::catalog::Catalog;
use super::error::{ComputeError, ComputeResult};
use super::tiles::render_png;
use super::ComputeBackend;
use crate::models::{ImageryRecord, Sensor, TileCoord, TileUrlTemplate, VectorLayer};
use crate::pipeline::{ImageCollection, RenderedLayer};

/// In-memory compute backend.
///
/// # Example
/// ```
/// use bloomwatch::compute::{ComputeBackend, LocalBackend};
///
/// let backend = LocalBackend::new("http://localhost:8080");
/// assert_eq!(backend.name(), "local");
/// assert_eq!(backend.layer_count(), 0);
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    data: Arc<RwLock<LocalData>>,
    base_url: String,
}

struct LocalData {
    collections: HashMap<String, Arc<Vec<ImageryRecord>>>,
    assets: HashMap<String, VectorLayer>,
    layers: LruCache<String, RenderedLayer>,
}

/// Layers kept in the tile registry unless configured otherwise.
pub const DEFAULT_MAX_LAYERS: usize = 256;

fn layer_capacity(max_layers: usize) -> NonZeroUsize {
    NonZeroUsize::new(max_layers).unwrap_or(NonZeroUsize::MIN)
}

impl LocalBackend {
    /// Empty backend. Every supported sensor collection exists and is empty.
    pub fn new(base_url: impl Into<String>) -> Self {
        let collections = Sensor::ALL
            .iter()
            .map(|s| (s.collection_id().to_string(), Arc::new(Vec::new())))
            .collect();
        Self {
            data: Arc::new(RwLock::new(LocalData {
                collections,
                assets: HashMap::new(),
                layers: LruCache::new(layer_capacity(DEFAULT_MAX_LAYERS)),
            })),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Bound the tile registry to `max_layers` layers (at least one). The
    /// least recently issued or rendered layers are evicted first.
    pub fn with_max_layers(self, max_layers: usize) -> Self {
        self.data.write().layers.resize(layer_capacity(max_layers));
        self
    }

    pub fn from_catalog(catalog: Catalog, base_url: impl Into<String>) -> Self {
        let backend = Self::new(base_url);
        for (collection_id, records) in catalog.collections {
            backend.insert_records(collection_id, records);
        }
        for (path, layer) in catalog.assets {
            backend.insert_asset(path, layer);
        }
        backend
    }

    /// Append records to a collection, creating it if needed.
    pub fn insert_records(&self, collection_id: impl Into<String>, records: Vec<ImageryRecord>) {
        let collection_id = collection_id.into();
        let mut data = self.data.write();
        let slot = data
            .collections
            .entry(collection_id.clone())
            .or_insert_with(|| Arc::new(Vec::new()));
        let mut merged = slot.as_ref().clone();
        merged.extend(records);
        info!(
            "Collection '{}' now holds {} record(s)",
            collection_id,
            merged.len()
        );
        *slot = Arc::new(merged);
    }

    pub fn insert_asset(&self, asset_path: impl Into<String>, layer: VectorLayer) {
        self.data.write().assets.insert(asset_path.into(), layer);
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Number of layers currently in the tile registry.
    pub fn layer_count(&self) -> usize {
        self.data.read().layers.len()
    }

    fn template_for(&self, map_id: &str) -> TileUrlTemplate {
        TileUrlTemplate::new(format!(
            "{}/v1/maps/{}/tiles/{{z}}/{{x}}/{{y}}",
            self.base_url, map_id
        ))
    }
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}

#[async_trait]
impl ComputeBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn image_collection(&self, collection_id: &str) -> ComputeResult<ImageCollection> {
        let data = self.data.read();
        let records = data
            .collections
            .get(collection_id)
            .ok_or_else(|| ComputeError::not_found("image collection", collection_id))?;
        Ok(ImageCollection::from_shared(Arc::clone(records)))
    }

    async fn feature_collection(&self, asset_path: &str) -> ComputeResult<VectorLayer> {
        self.data
            .read()
            .assets
            .get(asset_path)
            .cloned()
            .ok_or_else(|| ComputeError::not_found("asset", asset_path))
    }

    async fn issue_tiles(&self, layer: RenderedLayer) -> ComputeResult<TileUrlTemplate> {
        let map_id = layer.id().to_string();
        let template = self.template_for(&map_id);
        let mut data = self.data.write();
        if data.layers.get(&map_id).is_some() {
            debug!("Reusing map layer {}", map_id);
        } else if let Some((evicted, _)) = data.layers.push(map_id.clone(), layer) {
            debug!("Registered map layer {}, evicted {}", map_id, evicted);
        } else {
            debug!("Registered map layer {}", map_id);
        }
        Ok(template)
    }

    async fn render_tile(&self, map_id: &str, tile: TileCoord) -> ComputeResult<Vec<u8>> {
        let layer = self
            .data
            .write()
            .layers
            .get(map_id)
            .cloned()
            .ok_or_else(|| ComputeError::not_found("map", map_id))?;
        tokio::task::spawn_blocking(move || render_png(&layer, tile))
            .await
            .map_err(|e| ComputeError::Internal(format!("Task join error: {}", e)))?
    }

    async fn health_check(&self) -> ComputeResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Feature, GridSpec, VisualizationStyle};
    use crate::pipeline::render;
    use chrono::NaiveDate;
    use geo::{Geometry, Point};
    use ndarray::Array2;

    fn layer(value: f32) -> RenderedLayer {
        let grid = GridSpec::new(-103.9, 21.0, 0.01, 20, 20).unwrap();
        render(
            &Array2::from_elem((20, 20), value),
            &grid,
            &VisualizationStyle::ndvi(),
        )
        .unwrap()
    }

    fn record(id: &str) -> ImageryRecord {
        ImageryRecord::new(
            id,
            "COPERNICUS/S2_SR_HARMONIZED",
            NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            GridSpec::new(0.0, 1.0, 0.5, 2, 2).unwrap(),
            vec![("B4".to_string(), Array2::zeros((2, 2)))],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_supported_collections_exist_empty() {
        let backend = LocalBackend::default();
        for sensor in Sensor::ALL {
            let collection = backend.image_collection(sensor.collection_id()).await.unwrap();
            assert_eq!(collection.source_len(), 0);
        }
    }

    #[tokio::test]
    async fn test_unknown_collection_is_not_found() {
        let backend = LocalBackend::default();
        let err = backend.image_collection("MODIS/061").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("MODIS/061"));
    }

    #[tokio::test]
    async fn test_insert_records_appends() {
        let backend = LocalBackend::default();
        backend.insert_records("COPERNICUS/S2_SR_HARMONIZED", vec![record("a")]);
        backend.insert_records("COPERNICUS/S2_SR_HARMONIZED", vec![record("b")]);
        let collection = backend
            .image_collection("COPERNICUS/S2_SR_HARMONIZED")
            .await
            .unwrap();
        assert_eq!(collection.source_len(), 2);
    }

    #[tokio::test]
    async fn test_assets_round_trip() {
        let backend = LocalBackend::default();
        assert!(backend.feature_collection("x").await.unwrap_err().is_not_found());
        let features = VectorLayer::new(vec![Feature::new(Geometry::Point(Point::new(0.0, 0.0)))]);
        backend.insert_asset("x", features);
        assert_eq!(backend.feature_collection("x").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_issue_tiles_is_idempotent() {
        let backend = LocalBackend::new("http://example.test/");
        let first = backend.issue_tiles(layer(0.5)).await.unwrap();
        let second = backend.issue_tiles(layer(0.5)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(backend.layer_count(), 1);
        assert!(first.as_str().starts_with("http://example.test/v1/maps/"));
        assert!(first.as_str().ends_with("/tiles/{z}/{x}/{y}"));
    }

    #[tokio::test]
    async fn test_render_tile_for_issued_layer() {
        let backend = LocalBackend::default();
        let rendered = layer(0.5);
        let map_id = rendered.id().to_string();
        backend.issue_tiles(rendered).await.unwrap();
        let png = backend
            .render_tile(&map_id, TileCoord::new(8, 54, 112).unwrap())
            .await
            .unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let missing = backend
            .render_tile("nope", TileCoord::new(0, 0, 0).unwrap())
            .await
            .unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn test_registry_evicts_least_recent_layer() {
        let backend = LocalBackend::default().with_max_layers(2);
        let ids: Vec<String> = [0.1, 0.5, 0.9]
            .iter()
            .map(|&v| layer(v).id().to_string())
            .collect();

        backend.issue_tiles(layer(0.1)).await.unwrap();
        backend.issue_tiles(layer(0.5)).await.unwrap();
        // Rendering marks the first layer as recently used.
        let tile = TileCoord::new(8, 54, 112).unwrap();
        backend.render_tile(&ids[0], tile).await.unwrap();
        backend.issue_tiles(layer(0.9)).await.unwrap();

        assert_eq!(backend.layer_count(), 2);
        assert!(backend.render_tile(&ids[1], tile).await.unwrap_err().is_not_found());
        backend.render_tile(&ids[0], tile).await.unwrap();
        backend.render_tile(&ids[2], tile).await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_capacity_keeps_one_layer() {
        let backend = LocalBackend::default().with_max_layers(0);
        backend.issue_tiles(layer(0.1)).await.unwrap();
        backend.issue_tiles(layer(0.5)).await.unwrap();
        assert_eq!(backend.layer_count(), 1);
    }
}
