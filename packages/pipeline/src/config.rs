//! Pipeline configuration.
//!
//! Defaults are embedded from `config/default.toml`. A user file is
//! merged on top of them key by key, so it only needs the values it
//! changes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tartu_housing_dataset_models::Coordinates;
use tartu_housing_scraper::ScrapeConfig;

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Errors from loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// Path of the config file.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The config is not valid TOML or does not fit the schema.
    #[error("Invalid configuration in {origin}: {source}")]
    Toml {
        /// Where the TOML came from.
        origin: String,
        /// Underlying error.
        source: toml::de::Error,
    },
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// City used to filter the noise survey and to prefix geocoder
    /// queries.
    pub city: String,
    /// Point distances are measured from.
    pub reference_point: ReferencePoint,
    /// Input and output tables.
    pub paths: PathsConfig,
    /// Listing harvester settings.
    pub scraper: ScraperConfig,
    /// Geocoder settings.
    pub geocoder: GeocoderConfig,
}

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl From<ReferencePoint> for Coordinates {
    fn from(point: ReferencePoint) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
        }
    }
}

/// File locations of every table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Listings table written by `scrape`, read by `geocode` and `combine`.
    pub listings: PathBuf,
    /// Accessibility survey.
    pub accessibility: PathBuf,
    /// Noise survey.
    pub noise: PathBuf,
    /// Coordinates table written by `geocode`, optional for `combine`.
    pub coordinates: PathBuf,
    /// Enriched dataset written by `combine`.
    pub output: PathBuf,
}

/// Listing harvester settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Search URL with a `{start}` offset placeholder.
    pub base_url: String,
    /// Listings per page.
    pub page_size: u32,
    /// Pages to fetch.
    pub total_pages: u32,
    /// Delay after each page fetch, in milliseconds.
    pub delay_ms: u64,
    /// `User-Agent` sent to the listing site.
    pub user_agent: String,
}

impl ScraperConfig {
    /// Converts to the scraper crate's configuration.
    #[must_use]
    pub fn to_scrape_config(&self) -> ScrapeConfig {
        ScrapeConfig::new(&self.base_url)
            .with_page_size(self.page_size)
            .with_total_pages(self.total_pages)
            .with_delay_ms(self.delay_ms)
            .with_user_agent(&self.user_agent)
    }
}

/// Geocoder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Nominatim search endpoint.
    pub base_url: String,
    /// ISO country code results are restricted to.
    pub country_code: String,
    /// `User-Agent` identifying this tool to Nominatim.
    pub user_agent: String,
    /// Delay before each request, in milliseconds.
    pub rate_limit_ms: u64,
}

impl PipelineConfig {
    /// Returns the built-in defaults.
    ///
    /// # Panics
    ///
    /// Panics if the embedded default TOML is malformed (a build-time
    /// guarantee covered by tests).
    #[must_use]
    pub fn defaults() -> Self {
        toml::from_str(DEFAULT_CONFIG)
            .unwrap_or_else(|e| panic!("Failed to parse built-in configuration: {e}"))
    }

    /// Loads the defaults, overridden by the TOML file at `path` if given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or the merged
    /// configuration is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::defaults());
        };

        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let config = Self::from_override(&contents, &path.display().to_string())?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Merges the TOML document `contents` over the defaults. `origin`
    /// names the document in errors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if `contents` is not valid TOML or the
    /// merged configuration does not fit the schema.
    pub fn from_override(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        let toml_err = |source| ConfigError::Toml {
            origin: origin.to_owned(),
            source,
        };

        let mut merged: toml::Table = toml::from_str(DEFAULT_CONFIG).map_err(|source| {
            ConfigError::Toml {
                origin: "built-in defaults".to_owned(),
                source,
            }
        })?;
        let overrides: toml::Table = toml::from_str(contents).map_err(toml_err)?;
        merge_tables(&mut merged, overrides);

        toml::Value::Table(merged).try_into().map_err(toml_err)
    }
}

/// Recursively overlays `overrides` onto `base`.
fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_built_in_defaults() {
        let config = PipelineConfig::defaults();
        assert_eq!(config.city, "Tartu");
        assert_eq!(config.scraper.page_size, 50);
        assert_eq!(config.scraper.total_pages, 19);
        assert_eq!(config.geocoder.rate_limit_ms, 1000);
        assert!(config.scraper.base_url.contains("{start}"));
    }

    #[test]
    fn overrides_single_nested_key() {
        let config = PipelineConfig::from_override(
            "[paths]\noutput = \"out/combined.csv\"\n",
            "test",
        )
        .unwrap();
        assert_eq!(config.paths.output, PathBuf::from("out/combined.csv"));
        assert_eq!(config.paths.listings, PathBuf::from("data/kv_listings.csv"));
        assert_eq!(config.city, "Tartu");
    }

    #[test]
    fn overrides_top_level_key() {
        let config = PipelineConfig::from_override("city = \"Elva\"\n", "test").unwrap();
        assert_eq!(config.city, "Elva");
    }

    #[test]
    fn rejects_wrong_types() {
        let err = PipelineConfig::from_override("[scraper]\npage_size = \"fifty\"\n", "test")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Toml { ref origin, .. } if origin == "test"));
    }

    #[test]
    fn rejects_invalid_toml() {
        assert!(PipelineConfig::from_override("city = ", "test").is_err());
    }

    #[test]
    fn empty_override_keeps_defaults() {
        assert_eq!(
            PipelineConfig::from_override("", "test").unwrap(),
            PipelineConfig::defaults()
        );
    }

    #[test]
    fn builds_scrape_config() {
        let scrape = PipelineConfig::defaults().scraper.to_scrape_config();
        assert_eq!(scrape.delay_ms, 5000);
        assert!(scrape.page_url(2).ends_with("start=100"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = PipelineConfig::load(Some(Path::new("/nonexistent/config.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
