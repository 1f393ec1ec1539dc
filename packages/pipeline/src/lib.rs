#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The Tartu housing dataset pipeline.
//!
//! Three steps, each reading and writing CSV tables named by
//! [`PipelineConfig::paths`]:
//!
//! 1. [`scrape`] harvests kv.ee listings into the listings table.
//! 2. [`geocode`] resolves each listing address into the coordinates table.
//! 3. [`combine`] joins listings with the accessibility survey, the noise
//!    survey, and the coordinates table into the enriched dataset.
//!
//! [`run`] chains them.

pub mod config;
pub mod interactive;

use std::sync::Arc;
use std::time::Duration;

use tartu_housing_dataset::{AssemblyReport, DatasetError, JoinContext, assemble, table};
use tartu_housing_dataset_models::progress::ProgressCallback;
use tartu_housing_geocoder::GeocodeError;
use tartu_housing_geocoder::nominatim::NominatimGeocoder;
use tartu_housing_scraper::kv::KvScraper;
use tartu_housing_scraper::{ScrapeError, scrape_all};

pub use config::{ConfigError, PipelineConfig};

/// Errors from any pipeline step.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Loading the configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Reading or writing a table failed.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Harvesting listings failed.
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    /// The geocoder could not be set up.
    #[error(transparent)]
    Geocode(#[from] GeocodeError),
}

/// Which steps [`run`] performs besides `combine`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Reuse the existing listings table instead of scraping.
    pub skip_scrape: bool,
    /// Regenerate the coordinates table before combining.
    pub geocode: bool,
}

/// Harvests every configured page and writes the listings table.
///
/// Returns the number of listings written.
///
/// # Errors
///
/// Returns [`PipelineError`] if a page fetch fails or the table cannot
/// be written.
pub async fn scrape(
    config: &PipelineConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<usize, PipelineError> {
    let scraper = KvScraper::new(config.scraper.to_scrape_config())?;
    log::info!(
        "Scraping {} pages of {} listings",
        scraper.config().total_pages,
        scraper.config().page_size
    );

    let listings = scrape_all(&scraper, scraper.config().delay_ms, progress).await?;
    table::write_listings(&config.paths.listings, &listings)?;

    Ok(listings.len())
}

/// Geocodes the listings table and writes the coordinates table.
///
/// Returns the number of listings that received coordinates.
///
/// # Errors
///
/// Returns [`PipelineError`] if the listings table cannot be read, the
/// HTTP client cannot be built, or the coordinates table cannot be
/// written. Individual lookups never fail the step.
pub async fn geocode(
    config: &PipelineConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<usize, PipelineError> {
    let listings = table::read_listings(&config.paths.listings)?;
    let geocoder = NominatimGeocoder::new(
        &config.geocoder.base_url,
        &config.geocoder.country_code,
        &config.geocoder.user_agent,
    )?;

    let rows = tartu_housing_geocoder::geocode_listings(
        &geocoder,
        &config.city,
        Duration::from_millis(config.geocoder.rate_limit_ms),
        &listings,
        progress,
    )
    .await;
    table::write_coordinates(&config.paths.coordinates, &rows)?;

    Ok(rows.iter().filter(|row| row.coordinates().is_some()).count())
}

/// Joins the listings with every side table and writes the enriched
/// dataset.
///
/// A missing coordinates table is not an error: every listing then has
/// empty coordinates and distance.
///
/// # Errors
///
/// Returns [`PipelineError`] if a required table cannot be read or the
/// output cannot be written.
pub fn combine(config: &PipelineConfig) -> Result<AssemblyReport, PipelineError> {
    let paths = &config.paths;

    let listings = table::read_listings(&paths.listings)?;
    let accessibility = table::read_accessibility(&paths.accessibility)?;
    let noise = table::read_noise(&paths.noise)?;
    let coordinates = if paths.coordinates.is_file() {
        table::read_coordinates(&paths.coordinates)?
    } else {
        log::warn!(
            "No coordinates table at {}; run `geocode` first to fill distances",
            paths.coordinates.display()
        );
        Vec::new()
    };

    let context = JoinContext::new(&accessibility, &noise, &config.city);
    let (enriched, report) = assemble(
        &listings,
        &coordinates,
        &context,
        config.reference_point.into(),
    );
    table::write_enriched(&paths.output, &enriched)?;

    Ok(report)
}

/// Runs the whole pipeline: scrape, optionally geocode, then combine.
///
/// # Errors
///
/// Returns the first [`PipelineError`] from any step.
pub async fn run(
    config: &PipelineConfig,
    options: RunOptions,
    scrape_progress: &Arc<dyn ProgressCallback>,
    geocode_progress: &Arc<dyn ProgressCallback>,
) -> Result<AssemblyReport, PipelineError> {
    if options.skip_scrape {
        log::info!("Skipping scrape, using {}", config.paths.listings.display());
    } else {
        scrape(config, scrape_progress).await?;
    }

    if options.geocode {
        geocode(config, geocode_progress).await?;
    }

    combine(config)
}
