//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to
//! [`VegetationService`](crate::services::VegetationService) or, for tiles,
//! straight to the compute backend.

use std::future::Future;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use super::dto::{AgaveMapResponse, HealthResponse, MapQuery, MapUrlResponse};
use super::error::AppError;
use super::state::AppState;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{DateRange, TileCoord};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Bound a pipeline run by the configured request timeout.
///
/// Expiry only abandons the future. Work already handed to the blocking pool
/// runs to completion and its result is dropped.
async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = PipelineResult<T>>,
) -> PipelineResult<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| PipelineError::Timeout(limit.as_millis() as u64))?
}

fn requested_range(state: &AppState, query: &MapQuery) -> Result<(i32, i32, DateRange), AppError> {
    let (year, month) = query.resolve(state.defaults);
    let range = DateRange::for_month(year, month)?;
    Ok((year, month, range))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let backend = state.vegetation.backend();
    let backend_status = match backend.health_check().await {
        Ok(true) => format!("{}: healthy", backend.name()),
        Ok(false) => format!("{}: unhealthy", backend.name()),
        Err(e) => format!("{}: error: {}", backend.name(), e),
    };
    let mask = if state.vegetation.mask().is_ready() {
        "ready"
    } else {
        "unavailable"
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: backend_status,
        mask: mask.to_string(),
    }))
}

// =============================================================================
// Vegetation maps
// =============================================================================

/// GET /getMapUrl?year=&month=
///
/// NDVI and NDRE tile templates for the monthly reference-sensor composite.
pub async fn get_map_url(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> HandlerResult<MapUrlResponse> {
    let (year, month, range) = requested_range(&state, &MapQuery::from_pairs(pairs))?;
    tracing::info!("Index map requested for {}", range);

    let urls = with_timeout(state.request_timeout, state.vegetation.index_map(range)).await?;

    Ok(Json(MapUrlResponse {
        status: "success".to_string(),
        year,
        month,
        urls,
    }))
}

/// GET /getAgaveMap?year=&month=
///
/// Vigor and health tile templates over agricultural land, both sensors merged.
pub async fn get_agave_map(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> HandlerResult<AgaveMapResponse> {
    let (_, _, range) = requested_range(&state, &MapQuery::from_pairs(pairs))?;
    tracing::info!("Agricultural map requested for {}", range);

    let urls = with_timeout(state.request_timeout, state.vegetation.agave_map(range)).await?;

    Ok(Json(AgaveMapResponse {
        status: "success".to_string(),
        urls,
    }))
}

// =============================================================================
// Tiles
// =============================================================================

/// GET /v1/maps/{map_id}/tiles/{z}/{x}/{y}
pub async fn get_tile(
    State(state): State<AppState>,
    Path((map_id, z, x, y)): Path<(String, u32, u32, u32)>,
) -> Result<Response, AppError> {
    let tile = TileCoord::new(z, x, y)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid tile {}/{}/{}", z, x, y)))?;
    let png = state.vegetation.backend().render_tile(&map_id, tile).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}
