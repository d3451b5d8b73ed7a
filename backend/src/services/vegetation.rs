//! Vegetation map orchestration.
//!
//! Two variants are served:
//! - the plain index map (reference sensor only, clipped to the AOI), and
//! - the agricultural map (reference and secondary sensors merged, clipped
//!   and masked to agricultural land).

use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

use super::map_facade::MapServiceFacade;
use super::run_blocking;
use crate::compute::ComputeBackend;
use crate::config::{MaskSettings, ServiceConfig, SourceSettings, StyleSettings};
use crate::error::PipelineResult;
use crate::models::{AreaOfInterest, DateRange, SpectralIndex, TileUrlTemplate};
use crate::pipeline::{composite, Composite, ImageCollection, Mask, MaskCell};

/// Tile templates of the plain index map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMapUrls {
    pub ndvi: TileUrlTemplate,
    pub ndre: TileUrlTemplate,
}

/// Tile templates of the agricultural map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgaveMapUrls {
    pub ndvi_vigor: TileUrlTemplate,
    pub ndre_salud: TileUrlTemplate,
}

/// Runs the composition pipeline for each map variant.
#[derive(Clone)]
pub struct VegetationService {
    backend: Arc<dyn ComputeBackend>,
    facade: MapServiceFacade,
    aoi: Arc<AreaOfInterest>,
    sources: SourceSettings,
    styles: StyleSettings,
    mask: MaskCell,
}

impl VegetationService {
    pub fn new(
        backend: Arc<dyn ComputeBackend>,
        aoi: AreaOfInterest,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            facade: MapServiceFacade::new(Arc::clone(&backend)),
            backend,
            aoi: Arc::new(aoi),
            sources: config.sources.clone(),
            styles: config.styles.clone(),
            mask: MaskCell::new(),
        }
    }

    pub fn backend(&self) -> &Arc<dyn ComputeBackend> {
        &self.backend
    }

    pub fn aoi(&self) -> &AreaOfInterest {
        &self.aoi
    }

    pub fn mask(&self) -> &MaskCell {
        &self.mask
    }

    /// Load the mask asset, rasterize it on the AOI grid and store it.
    ///
    /// Meant to run once at startup, before the listener accepts requests.
    pub async fn build_mask(&self, settings: &MaskSettings) -> PipelineResult<Arc<Mask>> {
        let layer = self.backend.feature_collection(&settings.asset).await?;
        let predicate = settings.predicate();
        let aoi = Arc::clone(&self.aoi);
        let mask = run_blocking(move || Mask::build(&layer, &predicate, &aoi)).await?;
        info!(
            "Mask '{}' covers {} pixel(s)",
            settings.asset,
            mask.covered_pixels()
        );
        self.mask.init(mask)
    }

    /// NDVI and NDRE over the reference sensor, clipped to the AOI.
    pub async fn index_map(&self, range: DateRange) -> PipelineResult<IndexMapUrls> {
        let reference = self.backend.image_collection(&self.sources.reference).await?;
        let composite = self.compose(vec![reference], range).await?;
        let (ndvi, ndre) = futures::try_join!(
            self.facade
                .publish(composite.clone(), SpectralIndex::Ndvi, self.styles.ndvi.clone()),
            self.facade
                .publish(composite, SpectralIndex::Ndre, self.styles.ndre.clone()),
        )?;
        Ok(IndexMapUrls { ndvi, ndre })
    }

    /// Vigor and health maps over both sensors, restricted to agricultural land.
    pub async fn agave_map(&self, range: DateRange) -> PipelineResult<AgaveMapUrls> {
        let mask = self.mask.get()?;
        let reference = self.backend.image_collection(&self.sources.reference).await?;
        let secondary = self.backend.image_collection(&self.sources.secondary).await?;
        let composite = self.compose(vec![reference, secondary], range).await?;
        let masked = Arc::new(run_blocking(move || mask.apply(&composite)).await?);
        let (ndvi_vigor, ndre_salud) = futures::try_join!(
            self.facade.publish(
                masked.clone(),
                SpectralIndex::Ndvi,
                self.styles.ndvi_vigor.clone()
            ),
            self.facade
                .publish(masked, SpectralIndex::Ndre, self.styles.ndre_health.clone()),
        )?;
        Ok(AgaveMapUrls {
            ndvi_vigor,
            ndre_salud,
        })
    }

    async fn compose(
        &self,
        sources: Vec<ImageCollection>,
        range: DateRange,
    ) -> PipelineResult<Arc<Composite>> {
        let aoi = Arc::clone(&self.aoi);
        let result = run_blocking(move || composite(&sources, range, &aoi)).await?;
        if result.is_empty() {
            info!("No imagery for {}; publishing empty layers", range);
        }
        Ok(Arc::new(result))
    }
}
