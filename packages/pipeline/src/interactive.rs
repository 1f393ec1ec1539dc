#![allow(clippy::module_name_repetitions)]

//! Interactive menu for the pipeline binary.
//!
//! Runs when no subcommand is given, so the steps can be driven without
//! remembering the CLI flags.

use std::time::Instant;

use dialoguer::{Confirm, Select};
use tartu_housing_cli_utils::{IndicatifProgress, MultiProgress};

use crate::{PipelineConfig, RunOptions};

/// Top-level actions available in the menu.
enum PipelineAction {
    RunAll,
    Scrape,
    Geocode,
    Combine,
    ShowConfig,
}

impl PipelineAction {
    const ALL: &[Self] = &[
        Self::RunAll,
        Self::Scrape,
        Self::Geocode,
        Self::Combine,
        Self::ShowConfig,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::RunAll => "Run the whole pipeline",
            Self::Scrape => "Scrape listings",
            Self::Geocode => "Geocode listings",
            Self::Combine => "Combine tables into the dataset",
            Self::ShowConfig => "Show configuration",
        }
    }
}

/// Prompts for one action and runs it.
///
/// # Errors
///
/// Returns an error if the prompt fails or the selected step fails.
pub async fn run(
    multi: &MultiProgress,
    config: &PipelineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = PipelineAction::ALL
        .iter()
        .map(PipelineAction::label)
        .collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    let start = Instant::now();

    match PipelineAction::ALL[idx] {
        PipelineAction::RunAll => {
            let options = RunOptions {
                skip_scrape: !Confirm::new()
                    .with_prompt("Scrape fresh listings? (takes several minutes)")
                    .default(true)
                    .interact()?,
                geocode: Confirm::new()
                    .with_prompt("Geocode listings? (one request per second)")
                    .default(false)
                    .interact()?,
            };
            let scrape_progress =
                IndicatifProgress::steps_bar_if(!options.skip_scrape, multi, "Scraping");
            let geocode_progress =
                IndicatifProgress::steps_bar_if(options.geocode, multi, "Geocoding");
            crate::run(config, options, &scrape_progress, &geocode_progress).await?;
        }
        PipelineAction::Scrape => {
            let progress = IndicatifProgress::steps_bar(multi, "Scraping");
            let count = crate::scrape(config, &progress).await?;
            log::info!("Scraped {count} listings");
        }
        PipelineAction::Geocode => {
            let progress = IndicatifProgress::steps_bar(multi, "Geocoding");
            let found = crate::geocode(config, &progress).await?;
            log::info!("Resolved coordinates for {found} listings");
        }
        PipelineAction::Combine => {
            crate::combine(config)?;
        }
        PipelineAction::ShowConfig => {
            println!("{}", toml::to_string_pretty(config)?);
            return Ok(());
        }
    }

    log::info!("Done in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}
