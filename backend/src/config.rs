//! Service configuration file support.
//!
//! This module reads the service configuration from a TOML file and applies
//! environment overrides on top of it.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineResult;
use crate::models::{AreaOfInterest, AttributePredicate, Sensor, VisualizationStyle, TEQUILA_RING};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "BLOOMWATCH_CONFIG";

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("No bloomwatch.toml found in standard locations")]
    NotFound,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Full service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub region: RegionSettings,
    #[serde(default)]
    pub sources: SourceSettings,
    /// Agricultural mask; the masked endpoint is unavailable without it.
    #[serde(default)]
    pub mask: Option<MaskSettings>,
    #[serde(default)]
    pub defaults: RequestDefaults,
    #[serde(default)]
    pub styles: StyleSettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Prefix of issued tile URL templates.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Compute backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    #[serde(rename = "type", default = "default_backend_type")]
    pub backend_type: String,
    /// JSON catalog loaded into the local backend at startup.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    /// Rendered layers kept servable before the least recently used is dropped.
    #[serde(default = "default_max_layers")]
    pub max_layers: usize,
}

/// Area of interest settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionSettings {
    #[serde(default = "default_region_name")]
    pub name: String,
    /// Exterior ring as `[lon, lat]` pairs.
    #[serde(default = "default_ring")]
    pub ring: Vec<[f64; 2]>,
    /// Analysis grid cell size in degrees.
    #[serde(default = "default_pixel_size")]
    pub pixel_size: f64,
}

/// Collection ids of the sensors feeding the maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    #[serde(default = "default_reference")]
    pub reference: String,
    #[serde(default = "default_secondary")]
    pub secondary: String,
}

/// Vector asset and predicate used to build the agricultural mask.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskSettings {
    #[serde(default = "default_mask_asset")]
    pub asset: String,
    #[serde(default = "default_mask_property")]
    pub property: String,
    #[serde(default = "default_mask_value")]
    pub value: serde_json::Value,
}

/// Values used when a request omits (or garbles) `year` / `month`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RequestDefaults {
    #[serde(default = "default_year")]
    pub year: i32,
    #[serde(default = "default_month")]
    pub month: i32,
}

/// Visualization styles of the four published layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleSettings {
    #[serde(default = "VisualizationStyle::ndvi")]
    pub ndvi: VisualizationStyle,
    #[serde(default = "VisualizationStyle::ndre")]
    pub ndre: VisualizationStyle,
    #[serde(default = "VisualizationStyle::ndvi_vigor")]
    pub ndvi_vigor: VisualizationStyle,
    #[serde(default = "VisualizationStyle::ndre_health")]
    pub ndre_health: VisualizationStyle,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_backend_type() -> String {
    "local".to_string()
}

fn default_max_layers() -> usize {
    crate::compute::local::DEFAULT_MAX_LAYERS
}

fn default_region_name() -> String {
    "tequila".to_string()
}

fn default_ring() -> Vec<[f64; 2]> {
    TEQUILA_RING.to_vec()
}

fn default_pixel_size() -> f64 {
    0.001
}

fn default_reference() -> String {
    Sensor::Sentinel2.collection_id().to_string()
}

fn default_secondary() -> String {
    Sensor::Landsat8.collection_id().to_string()
}

fn default_mask_asset() -> String {
    "projects/ee-antartida-hackathon/assets/vegetacion".to_string()
}

fn default_mask_property() -> String {
    "Clasif2014".to_string()
}

fn default_mask_value() -> serde_json::Value {
    serde_json::Value::String("Agrícola".to_string())
}

fn default_year() -> i32 {
    2024
}

fn default_month() -> i32 {
    4
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_base_url: default_public_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            backend_type: default_backend_type(),
            catalog_path: None,
            max_layers: default_max_layers(),
        }
    }
}

impl Default for RegionSettings {
    fn default() -> Self {
        Self {
            name: default_region_name(),
            ring: default_ring(),
            pixel_size: default_pixel_size(),
        }
    }
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            reference: default_reference(),
            secondary: default_secondary(),
        }
    }
}

impl Default for MaskSettings {
    fn default() -> Self {
        Self {
            asset: default_mask_asset(),
            property: default_mask_property(),
            value: default_mask_value(),
        }
    }
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            year: default_year(),
            month: default_month(),
        }
    }
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            ndvi: VisualizationStyle::ndvi(),
            ndre: VisualizationStyle::ndre(),
            ndvi_vigor: VisualizationStyle::ndvi_vigor(),
            ndre_health: VisualizationStyle::ndre_health(),
        }
    }
}

impl MaskSettings {
    pub fn predicate(&self) -> AttributePredicate {
        AttributePredicate::equals(self.property.clone(), self.value.clone())
    }
}

impl RegionSettings {
    pub fn area_of_interest(&self) -> PipelineResult<AreaOfInterest> {
        AreaOfInterest::from_ring(self.name.clone(), &self.ring, self.pixel_size)
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `bloomwatch.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let search_paths = [
            PathBuf::from("bloomwatch.toml"),
            PathBuf::from("backend/bloomwatch.toml"),
            PathBuf::from("../bloomwatch.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                log::info!("Loading configuration from {}", path.display());
                return Self::from_file(&path);
            }
        }

        Err(ConfigError::NotFound)
    }

    /// Resolve the configuration the server runs with.
    ///
    /// `BLOOMWATCH_CONFIG` names an explicit file; otherwise the default
    /// locations are searched and built-in defaults are used when none
    /// exists. Environment overrides are applied last.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => match Self::from_default_location() {
                Ok(config) => config,
                Err(ConfigError::NotFound) => {
                    log::info!("No configuration file found, using built-in defaults");
                    Self::default()
                }
                Err(e) => return Err(e),
            },
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `HOST`, `PORT`, `PUBLIC_BASE_URL` and `CATALOG_PATH` overrides.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT must be a port number, got '{}'", port)))?;
        }
        if let Some(url) = lookup("PUBLIC_BASE_URL") {
            self.server.public_base_url = url;
        }
        if let Some(path) = lookup("CATALOG_PATH") {
            self.backend.catalog_path = Some(PathBuf::from(path));
        }
        Ok(())
    }

    /// Reject settings the service cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.backend_type != "local" {
            return Err(ConfigError::Invalid(format!(
                "unknown backend type '{}'",
                self.backend.backend_type
            )));
        }
        if self.backend.max_layers == 0 {
            return Err(ConfigError::Invalid(
                "backend.max_layers must be positive".to_string(),
            ));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "server.request_timeout_secs must be positive".to_string(),
            ));
        }
        for id in [&self.sources.reference, &self.sources.secondary] {
            id.parse::<Sensor>()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        self.region
            .area_of_interest()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: ServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout_secs, 120);
        assert_eq!(config.backend.max_layers, 256);
        assert_eq!(config.defaults.year, 2024);
        assert_eq!(config.defaults.month, 4);
        assert_eq!(config.sources.reference, "COPERNICUS/S2_SR_HARMONIZED");
        assert!(config.mask.is_none());
        assert_eq!(config.styles.ndvi_vigor.palette().len(), 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r##"
[server]
host = "127.0.0.1"
port = 9000
public_base_url = "https://maps.example.org"
request_timeout_secs = 30

[backend]
type = "local"
catalog_path = "data/catalog.json"

[region]
name = "demo"
ring = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]
pixel_size = 0.05

[mask]

[defaults]
year = 2023
month = 6

[styles.ndvi]
min = 0.0
max = 1.0
palette = ["white", "#00FF00"]
"##;
        let config: ServiceConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(
            config.backend.catalog_path.as_deref(),
            Some(Path::new("data/catalog.json"))
        );
        let mask = config.mask.as_ref().unwrap();
        assert_eq!(mask.asset, "projects/ee-antartida-hackathon/assets/vegetacion");
        assert_eq!(mask.predicate().to_string(), "Clasif2014 == \"Agrícola\"");
        assert_eq!(config.styles.ndvi.max(), 1.0);
        assert_eq!(config.styles.ndre.max(), 0.5);
        let aoi = config.region.area_of_interest().unwrap();
        assert_eq!(aoi.grid().shape(), (20, 20));
    }

    #[test]
    fn test_bad_style_fails_to_parse() {
        let toml = "[styles.ndre]\nmin = 1.0\nmax = 0.0\npalette = [\"red\"]\n";
        assert!(toml::from_str::<ServiceConfig>(toml).is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("HOST", "127.0.0.1"),
            ("PORT", "3000"),
            ("PUBLIC_BASE_URL", "http://tiles.local"),
            ("CATALOG_PATH", "/srv/catalog.json"),
        ]
        .into_iter()
        .collect();
        let mut config = ServiceConfig::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.public_base_url, "http://tiles.local");
        assert_eq!(
            config.backend.catalog_path.as_deref(),
            Some(Path::new("/srv/catalog.json"))
        );
    }

    #[test]
    fn test_invalid_port_override() {
        let mut config = ServiceConfig::default();
        let result = config.apply_overrides(|k| (k == "PORT").then(|| "http".to_string()));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_sensor_and_backend() {
        let mut config = ServiceConfig::default();
        config.sources.secondary = "MODIS/061/MOD09GA".to_string();
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.backend.backend_type = "earth-engine".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_layer_registry_size() {
        let config: ServiceConfig = toml::from_str("[backend]\nmax_layers = 8\n").unwrap();
        assert_eq!(config.backend.max_layers, 8);
        assert!(config.validate().is_ok());

        let config: ServiceConfig = toml::from_str("[backend]\nmax_layers = 0\n").unwrap();
        match config.validate() {
            Err(ConfigError::Invalid(message)) => assert!(message.contains("max_layers")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_example_config_is_valid() {
        let config: ServiceConfig =
            toml::from_str(include_str!("../bloomwatch.example.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert!(config.mask.is_some());
        assert_eq!(config.styles.ndvi, VisualizationStyle::ndvi());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bloomwatch.toml");
        fs::write(&path, "[defaults]\nmonth = 9\n").unwrap();
        let config = ServiceConfig::from_file(&path).unwrap();
        assert_eq!(config.defaults.month, 9);
        assert_eq!(config.defaults.year, 2024);

        let missing = ServiceConfig::from_file(dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
