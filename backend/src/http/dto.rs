//! Data Transfer Objects for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::config::RequestDefaults;
pub use crate::services::{AgaveMapUrls, IndexMapUrls};

/// `?year=&month=` query of both map endpoints.
///
/// Values are kept as raw strings: a missing or non-integer value falls back
/// to the configured default instead of failing the request.
#[derive(Debug, Clone, Default)]
pub struct MapQuery {
    pub year: Option<String>,
    pub month: Option<String>,
}

impl MapQuery {
    /// Build from raw query pairs. A repeated key keeps its first value and
    /// unknown keys are ignored.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "year" => &mut query.year,
                "month" => &mut query.month,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }

    /// `(year, month)` with defaults applied. The month is not range-checked
    /// here.
    pub fn resolve(&self, defaults: RequestDefaults) -> (i32, i32) {
        let parse = |raw: &Option<String>, fallback: i32| {
            raw.as_deref()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(fallback)
        };
        (
            parse(&self.year, defaults.year),
            parse(&self.month, defaults.month),
        )
    }
}

/// Response of `GET /getMapUrl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapUrlResponse {
    pub status: String,
    pub year: i32,
    pub month: i32,
    pub urls: IndexMapUrls,
}

/// Response of `GET /getAgaveMap`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgaveMapResponse {
    pub status: String,
    pub urls: AgaveMapUrls,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Compute backend name and state
    pub backend: String,
    /// `ready` once the agricultural mask is built, `unavailable` otherwise
    pub mask: String,
}
