use std::collections::BTreeSet;
use std::fs;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

pub const DEFAULT_CONFIG_FILE: &str = "imagery-catalog.json";
pub const DEFAULT_SIMPLIFY_TOLERANCE: f64 = 0.01;
pub const DEFAULT_MAX_AGE_YEARS: i32 = 20;
pub const DEFAULT_COORDINATE_PRECISION: u32 = 4;

/// Which record decides whether the zoom defaults are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomDefaultPolicy {
    /// Look for `min_zoom`/`max_zoom` on the top-level descriptor record. Descriptors keep
    /// zoom bounds in `properties`, so the defaults end up replacing them.
    #[default]
    Record,
    /// Only fill zoom bounds the `properties` record does not carry.
    Properties,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub denylist: Option<Vec<String>>,
    #[serde(default)]
    pub extend_denylist: Vec<String>,
    #[serde(default)]
    pub supported_projections: Option<Vec<String>>,
    #[serde(default)]
    pub extend_projections: Vec<String>,
    #[serde(default)]
    pub simplify_tolerance: Option<f64>,
    #[serde(default)]
    pub max_age_years: Option<i32>,
    #[serde(default)]
    pub coordinate_precision: Option<u32>,
    #[serde(default)]
    pub zoom_defaults: Option<ZoomDefaultPolicy>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogConfig {
    pub denylist: BTreeSet<String>,
    pub supported_projections: BTreeSet<String>,
    pub simplify_tolerance: f64,
    pub max_age_years: i32,
    pub coordinate_precision: u32,
    pub zoom_defaults: ZoomDefaultPolicy,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            denylist: default_denylist(),
            supported_projections: default_supported_projections(),
            simplify_tolerance: DEFAULT_SIMPLIFY_TOLERANCE,
            max_age_years: DEFAULT_MAX_AGE_YEARS,
            coordinate_precision: DEFAULT_COORDINATE_PRECISION,
            zoom_defaults: ZoomDefaultPolicy::default(),
        }
    }
}

impl CatalogConfig {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if !self.simplify_tolerance.is_finite() || self.simplify_tolerance < 0.0 {
            return Err(CatalogError::InvalidConfig(format!(
                "simplify_tolerance must be a finite, non-negative number (got {})",
                self.simplify_tolerance
            )));
        }
        if self.max_age_years <= 0 {
            return Err(CatalogError::InvalidConfig(format!(
                "max_age_years must be positive (got {})",
                self.max_age_years
            )));
        }
        if self.coordinate_precision > 15 {
            return Err(CatalogError::InvalidConfig(format!(
                "coordinate_precision must be at most 15 (got {})",
                self.coordinate_precision
            )));
        }
        Ok(())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<CatalogConfig, CatalogError> {
        let config_path = match path {
            Some(path) => Utf8PathBuf::from(path),
            None => Utf8PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.as_std_path().exists() {
            tracing::debug!("no {DEFAULT_CONFIG_FILE} found, using built-in configuration");
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(config_path.as_std_path())
            .map_err(|_| CatalogError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| CatalogError::ConfigParse(err.to_string()))?;
        tracing::debug!("loaded configuration from {config_path}");

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<CatalogConfig, CatalogError> {
        let defaults = CatalogConfig::default();

        let mut denylist = match config.denylist {
            Some(ids) => ids.into_iter().collect(),
            None => defaults.denylist,
        };
        denylist.extend(config.extend_denylist);

        let mut supported_projections = match config.supported_projections {
            Some(codes) => codes.into_iter().collect(),
            None => defaults.supported_projections,
        };
        supported_projections.extend(config.extend_projections);

        let resolved = CatalogConfig {
            denylist,
            supported_projections,
            simplify_tolerance: config
                .simplify_tolerance
                .unwrap_or(defaults.simplify_tolerance),
            max_age_years: config.max_age_years.unwrap_or(defaults.max_age_years),
            coordinate_precision: config
                .coordinate_precision
                .unwrap_or(defaults.coordinate_precision),
            zoom_defaults: config.zoom_defaults.unwrap_or(defaults.zoom_defaults),
        };
        resolved.validate()?;
        Ok(resolved)
    }
}

pub fn default_denylist() -> BTreeSet<String> {
    [
        "osmbe",
        "osmfr",
        "osm-mapnik-german_style",
        "HDM_HOT",
        "osm-mapnik-black_and_white",
        "osm-mapnik-no_labels",
        "OpenStreetMap-turistautak",
        "hike_n_bike",
        "landsat",
        "skobbler",
        "public_transport_oepnv",
        "tf-cycle",
        "tf-landscape",
        "tf-outdoors",
        "qa_no_address",
        "wikimedia-map",
        "openinframap-petroleum",
        "openinframap-power",
        "openinframap-telecoms",
        "openpt_map",
        "openrailwaymap",
        "openseamap",
        "opensnowmap-overlay",
        "US-TIGER-Roads-2012",
        "US-TIGER-Roads-2014",
        "Waymarked_Trails-Cycling",
        "Waymarked_Trails-Hiking",
        "Waymarked_Trails-Horse_Riding",
        "Waymarked_Trails-MTB",
        "Waymarked_Trails-Skating",
        "Waymarked_Trails-Winter_Sports",
        "OSM_Inspector-Addresses",
        "OSM_Inspector-Geometry",
        "OSM_Inspector-Highways",
        "OSM_Inspector-Multipolygon",
        "OSM_Inspector-Places",
        "OSM_Inspector-Routing",
        "OSM_Inspector-Tagging",
        "EOXAT2018CLOUDLESS",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

pub fn default_supported_projections() -> BTreeSet<String> {
    [
        // Web Mercator and its alternate codes
        "EPSG:3857",
        "EPSG:900913",
        "EPSG:3587",
        "EPSG:54004",
        "EPSG:41001",
        "EPSG:102113",
        "EPSG:102100",
        "EPSG:3785",
        // WGS 84
        "EPSG:4326",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}
