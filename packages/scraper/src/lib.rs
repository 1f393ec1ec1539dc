#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Listing harvester for the Tartu housing dataset.
//!
//! Provides the [`ListingSource`] trait, the kv.ee implementation
//! ([`kv::KvScraper`]), and [`scrape_all`], which walks every page with
//! a fixed delay between requests and numbers the listings in harvest
//! order.
//!
//! Page layout knowledge lives entirely in [`kv`]; the rest of the
//! pipeline only sees [`RawListing`] rows.

pub mod kv;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tartu_housing_dataset_models::RawListing;
use tartu_housing_dataset_models::progress::ProgressCallback;

/// Errors that can occur during scraping operations.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// An HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Parsing the response body failed.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Text fields of one listing, before it is assigned an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedListing {
    /// Free-text address.
    pub address: String,
    /// Room count text.
    pub rooms: String,
    /// Area text.
    pub size: String,
    /// Price text.
    pub price: String,
}

/// A single page of scraped listings.
#[derive(Debug, Clone, Default)]
pub struct ScrapedPage {
    /// Listings extracted from this page, in page order.
    pub listings: Vec<ScrapedListing>,
    /// Entries on the page that could not be extracted.
    pub skipped: usize,
}

/// Pagination and politeness settings shared by listing sources.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Search URL with a `{start}` placeholder for the result offset.
    pub url: String,
    /// Listings per page.
    pub page_size: u32,
    /// Number of pages to fetch.
    pub total_pages: u32,
    /// Delay in milliseconds after each page fetch.
    pub delay_ms: u64,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl ScrapeConfig {
    /// Creates a `ScrapeConfig` for the given URL template with the kv.ee
    /// defaults (19 pages of 50, 5 s apart).
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            page_size: 50,
            total_pages: 19,
            delay_ms: 5000,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Gecko/20100101 Firefox/115.0"
                .to_owned(),
        }
    }

    /// Sets the page size.
    #[must_use]
    pub const fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    /// Sets the number of pages to fetch.
    #[must_use]
    pub const fn with_total_pages(mut self, pages: u32) -> Self {
        self.total_pages = pages;
        self
    }

    /// Sets the delay between page fetches.
    #[must_use]
    pub const fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Sets the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        user_agent.clone_into(&mut self.user_agent);
        self
    }

    /// Returns the URL of the zero-indexed `page`.
    #[must_use]
    pub fn page_url(&self, page: u32) -> String {
        let start = u64::from(page) * u64::from(self.page_size);
        self.url.replace("{start}", &start.to_string())
    }
}

/// A paginated source of listings.
pub trait ListingSource: Send + Sync {
    /// Fetches the zero-indexed `page`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the HTTP request or page parsing fails.
    fn fetch_page(&self, page: u32) -> impl Future<Output = Result<ScrapedPage, ScrapeError>> + Send;

    /// Number of pages to fetch.
    fn page_count(&self) -> u32;
}

/// Fetches every page of `source` in order, sleeping `delay_ms` between
/// pages, and assigns 1-based indices in harvest order.
///
/// # Errors
///
/// Returns the first [`ScrapeError`] encountered during fetching.
pub async fn scrape_all(
    source: &impl ListingSource,
    delay_ms: u64,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<RawListing>, ScrapeError> {
    let pages = source.page_count();
    let mut listings = Vec::new();
    let mut skipped = 0;

    progress.set_total(u64::from(pages));

    for page in 0..pages {
        log::info!("Scraping page {}...", page + 1);
        progress.set_message(format!("page {}/{pages}", page + 1));

        let result = source.fetch_page(page).await?;
        skipped += result.skipped;

        for scraped in result.listings {
            listings.push(RawListing {
                index: listings.len() as u64 + 1,
                address: scraped.address,
                rooms: scraped.rooms,
                size: scraped.size,
                price: scraped.price,
            });
        }

        progress.inc(1);

        if page + 1 < pages {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }

    progress.finish(format!("Scraped {} listings", listings.len()));
    log::info!(
        "Scrape complete: {} listings, {skipped} skipped",
        listings.len()
    );
    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tartu_housing_dataset_models::progress::null_progress;

    struct FakeSource {
        pages: Vec<Vec<&'static str>>,
        fetched: Mutex<Vec<u32>>,
    }

    impl ListingSource for FakeSource {
        async fn fetch_page(&self, page: u32) -> Result<ScrapedPage, ScrapeError> {
            self.fetched.lock().unwrap().push(page);
            let listings = self.pages[page as usize]
                .iter()
                .map(|address| ScrapedListing {
                    address: (*address).to_string(),
                    rooms: "2".to_string(),
                    size: "40 m²".to_string(),
                    price: "90 000 €".to_string(),
                })
                .collect();
            Ok(ScrapedPage {
                listings,
                skipped: 1,
            })
        }

        fn page_count(&self) -> u32 {
            u32::try_from(self.pages.len()).unwrap()
        }
    }

    #[test]
    fn builds_page_urls() {
        let config = ScrapeConfig::new("https://example.test/list?limit=50&start={start}");
        assert_eq!(config.page_url(0), "https://example.test/list?limit=50&start=0");
        assert_eq!(config.page_url(3), "https://example.test/list?limit=50&start=150");
    }

    #[tokio::test]
    async fn numbers_listings_across_pages() {
        let source = FakeSource {
            pages: vec![vec!["Riia 15-3", "Tähe 10"], vec![], vec!["Kalda tee 5"]],
            fetched: Mutex::new(Vec::new()),
        };

        let listings = scrape_all(&source, 0, &null_progress()).await.unwrap();

        let numbered: Vec<(u64, &str)> = listings
            .iter()
            .map(|l| (l.index, l.address.as_str()))
            .collect();
        assert_eq!(
            numbered,
            vec![(1, "Riia 15-3"), (2, "Tähe 10"), (3, "Kalda tee 5")]
        );
        assert_eq!(*source.fetched.lock().unwrap(), vec![0, 1, 2]);
    }
}
