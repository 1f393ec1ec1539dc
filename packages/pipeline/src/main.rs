#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the Tartu housing dataset pipeline.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tartu_housing_cli_utils::IndicatifProgress;
use tartu_housing_pipeline::{PipelineConfig, RunOptions};

#[derive(Parser)]
#[command(name = "tartu_housing", about = "Tartu housing dataset pipeline")]
struct Cli {
    /// TOML file overriding the built-in configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape kv.ee apartment listings into the listings table
    Scrape {
        /// Number of result pages to fetch
        #[arg(long)]
        pages: Option<u32>,
        /// Listings table to write
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Geocode every listing address into the coordinates table
    Geocode {
        /// Listings table to read
        #[arg(long)]
        listings: Option<PathBuf>,
        /// Coordinates table to write
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Join listings with accessibility, noise, and coordinates
    Combine {
        /// Listings table to read
        #[arg(long)]
        listings: Option<PathBuf>,
        /// Accessibility survey to read
        #[arg(long)]
        accessibility: Option<PathBuf>,
        /// Noise survey to read
        #[arg(long)]
        noise: Option<PathBuf>,
        /// Coordinates table to read (skipped if the file does not exist)
        #[arg(long)]
        coordinates: Option<PathBuf>,
        /// Enriched dataset to write
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Scrape, optionally geocode, then combine
    Run {
        /// Reuse the existing listings table
        #[arg(long)]
        skip_scrape: bool,
        /// Regenerate the coordinates table before combining
        #[arg(long)]
        geocode: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = tartu_housing_cli_utils::init_logger();
    let cli = Cli::parse();
    let mut config = PipelineConfig::load(cli.config.as_deref())?;

    let Some(command) = cli.command else {
        return tartu_housing_pipeline::interactive::run(&multi, &config).await;
    };

    let start = Instant::now();

    match command {
        Commands::Scrape { pages, output } => {
            if let Some(pages) = pages {
                config.scraper.total_pages = pages;
            }
            override_path(&mut config.paths.listings, output);

            let progress = IndicatifProgress::steps_bar(&multi, "Scraping");
            let count = tartu_housing_pipeline::scrape(&config, &progress).await?;
            log::info!("Scraped {count} listings");
        }
        Commands::Geocode { listings, output } => {
            override_path(&mut config.paths.listings, listings);
            override_path(&mut config.paths.coordinates, output);

            let progress = IndicatifProgress::steps_bar(&multi, "Geocoding");
            let found = tartu_housing_pipeline::geocode(&config, &progress).await?;
            log::info!("Resolved coordinates for {found} listings");
        }
        Commands::Combine {
            listings,
            accessibility,
            noise,
            coordinates,
            output,
        } => {
            override_path(&mut config.paths.listings, listings);
            override_path(&mut config.paths.accessibility, accessibility);
            override_path(&mut config.paths.noise, noise);
            override_path(&mut config.paths.coordinates, coordinates);
            override_path(&mut config.paths.output, output);

            tartu_housing_pipeline::combine(&config)?;
        }
        Commands::Run {
            skip_scrape,
            geocode,
        } => {
            let options = RunOptions {
                skip_scrape,
                geocode,
            };
            let scrape_progress =
                IndicatifProgress::steps_bar_if(!options.skip_scrape, &multi, "Scraping");
            let geocode_progress =
                IndicatifProgress::steps_bar_if(options.geocode, &multi, "Geocoding");
            tartu_housing_pipeline::run(&config, options, &scrape_progress, &geocode_progress)
                .await?;
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
            return Ok(());
        }
    }

    log::info!("Done in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn override_path(target: &mut PathBuf, value: Option<PathBuf>) {
    if let Some(value) = value {
        *target = value;
    }
}
