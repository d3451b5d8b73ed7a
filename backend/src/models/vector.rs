//! Vector layers (feature geometries with attributes).

use std::fmt;

use geo::Geometry;
use geojson::GeoJson;
use serde_json::{Map, Value};

use crate::error::{PipelineError, PipelineResult};

/// A geographic feature with geometry and attributes.
#[derive(Debug, Clone)]
pub struct Feature {
    pub id: Option<String>,
    pub geometry: Geometry<f64>,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            id: None,
            geometry,
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// Attribute-equality filter, e.g. `Clasif2014 == "Agrícola"`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributePredicate {
    pub property: String,
    pub value: Value,
}

impl AttributePredicate {
    pub fn equals(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, feature: &Feature) -> bool {
        feature.property(&self.property) == Some(&self.value)
    }
}

impl fmt::Display for AttributePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} == {}", self.property, self.value)
    }
}

/// An ordered set of features, typically loaded from a GeoJSON asset.
#[derive(Debug, Clone, Default)]
pub struct VectorLayer {
    features: Vec<Feature>,
}

impl VectorLayer {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// Parse a GeoJSON `FeatureCollection` (or a single `Feature`).
    ///
    /// Features without geometry are skipped.
    pub fn from_geojson_str(text: &str) -> PipelineResult<Self> {
        let geojson: GeoJson = text
            .parse()
            .map_err(|e| PipelineError::InvalidGeometry(format!("invalid GeoJSON: {}", e)))?;
        let raw = match geojson {
            GeoJson::FeatureCollection(fc) => fc.features,
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::Geometry(_) => {
                return Err(PipelineError::InvalidGeometry(
                    "expected a Feature or FeatureCollection, got a bare geometry".to_string(),
                ))
            }
        };

        let mut features = Vec::with_capacity(raw.len());
        for feature in raw {
            let Some(geometry) = feature.geometry else {
                continue;
            };
            let geometry = Geometry::<f64>::try_from(geometry)
                .map_err(|e| PipelineError::InvalidGeometry(e.to_string()))?;
            let id = feature.id.map(|id| match id {
                geojson::feature::Id::String(s) => s,
                geojson::feature::Id::Number(n) => n.to_string(),
            });
            features.push(Feature {
                id,
                geometry,
                properties: feature.properties.unwrap_or_default(),
            });
        }
        Ok(Self { features })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// New layer holding the features that satisfy `predicate`.
    pub fn filter(&self, predicate: &AttributePredicate) -> VectorLayer {
        VectorLayer {
            features: self
                .features
                .iter()
                .filter(|f| predicate.matches(f))
                .cloned()
                .collect(),
        }
    }
}
