//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the tide-almanac.toml
//! file. It provides a centralized way to configure the station catalogs, the
//! observer location, page geometry, layout metrics and the data provider.
//!
//! Station catalogs are ordered lists: the order in the file is the order the
//! stations appear on the page.

use crate::curve::LabelMode;
use crate::layout::LayoutMetrics;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tide-almanac.toml";

/// Errors from strict configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config IO: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config serialization: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Application configuration loaded from tide-almanac.toml
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Observer location for sun and moon calculations
    pub location: LocationConfig,
    /// Page size and column split
    #[serde(default)]
    pub page: PageConfig,
    /// Line heights and spacing of the station columns
    #[serde(default)]
    pub layout: LayoutMetrics,
    /// Tide curve options
    #[serde(default)]
    pub graph: GraphConfig,
    /// NOAA CO-OPS endpoint settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// On-disk cache of provider responses
    #[serde(default)]
    pub cache: CacheConfig,
    /// Current stations in display order (left column)
    #[serde(default)]
    pub current_stations: Vec<StationEntry>,
    /// Tide stations in display order (right column)
    #[serde(default)]
    pub tide_stations: Vec<StationEntry>,
}

/// Geographic coordinate used for sunrise, sunset and moon phase
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocationConfig {
    /// Human-readable place name for reference
    pub name: String,
    /// Degrees north
    pub latitude: f64,
    /// Degrees east (west is negative)
    pub longitude: f64,
}

/// Page geometry in PDF points (1/72 inch)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageConfig {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    /// Height reserved for the date, moon and sun header
    pub header_height: f64,
    /// Share of the content width given to the current column
    pub current_column_fraction: f64,
    /// Horizontal gap on each side of the vertical divider
    pub column_gutter: f64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            width: 612.0, // US Letter
            height: 792.0,
            margin: 36.0,
            header_height: 78.0,
            current_column_fraction: 0.42,
            column_gutter: 10.0,
        }
    }
}

/// Tide curve options
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphConfig {
    /// How points on the curve are labelled
    pub labels: LabelMode,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            labels: LabelMode::Values,
        }
    }
}

/// NOAA CO-OPS endpoint settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Sent as the `application` query parameter
    pub application: String,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.tidesandcurrents.noaa.gov/api/prod/datagetter".to_string(),
            application: "tide_almanac".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Provider response cache
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub dir: PathBuf,
    pub ttl_minutes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("/tmp/tide_almanac_cache"),
            ttl_minutes: 360,
        }
    }
}

/// One catalog entry: display name and provider station id
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StationEntry {
    pub name: String,
    pub id: String,
    /// Draw an hourly tide curve for this station (tide stations only)
    #[serde(default)]
    pub graph: bool,
}

impl StationEntry {
    pub fn new(name: &str, id: &str) -> Self {
        Self {
            name: name.to_string(),
            id: id.to_string(),
            graph: false,
        }
    }

    pub fn with_graph(mut self) -> Self {
        self.graph = true;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            location: LocationConfig {
                name: "Seattle, WA".to_string(),
                latitude: 47.6062,
                longitude: -122.3321,
            },
            page: PageConfig::default(),
            layout: LayoutMetrics::default(),
            graph: GraphConfig::default(),
            provider: ProviderConfig::default(),
            cache: CacheConfig::default(),
            current_stations: vec![
                StationEntry::new("Admiralty Inlet", "PUG1515"),
                StationEntry::new("Point No Point", "PUG1516"),
                StationEntry::new("Tacoma Narrows", "PUG1527"),
                StationEntry::new("Rich Passage", "PUG1536"),
            ],
            tide_stations: vec![
                StationEntry::new("Seattle", "9447130").with_graph(),
                StationEntry::new("Port Townsend", "9444900"),
                StationEntry::new("Tacoma", "9446484"),
                StationEntry::new("Everett", "9447659"),
            ],
        }
    }
}

impl Config {
    /// Load configuration from tide-almanac.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::try_load(&path) {
            Ok(config) => {
                info!(location = %config.location.name, "loaded configuration");
                config
            }
            Err(ConfigError::Io(_)) => {
                info!("no config file found, using default configuration (Seattle, WA)");
                Self::default()
            }
            Err(e) => {
                warn!("{e}; using default configuration (Seattle, WA)");
                Self::default()
            }
        }
    }

    /// Load configuration from specified path, reporting any failure
    pub fn try_load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str::<Config>(&contents)?)
    }

    /// Save current configuration as pretty TOML
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}
