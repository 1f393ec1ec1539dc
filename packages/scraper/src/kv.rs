//! kv.ee search result pages.
//!
//! Each listing is an `<article>` holding `.description` (address on its
//! first line), `.rooms`, `.area`, and `.price` (asking price on its first
//! line, older price or price per m² below it).

use scraper::{ElementRef, Html, Selector};

use crate::{ListingSource, ScrapeConfig, ScrapeError, ScrapedListing, ScrapedPage};

/// Scraper for kv.ee apartment search results.
#[derive(Debug, Clone)]
pub struct KvScraper {
    config: ScrapeConfig,
    client: reqwest::Client,
}

impl KvScraper {
    /// Creates a scraper for the search URL in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the HTTP client cannot be built.
    pub fn new(config: ScrapeConfig) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self { config, client })
    }

    /// Returns a reference to the underlying scrape configuration.
    #[must_use]
    pub const fn config(&self) -> &ScrapeConfig {
        &self.config
    }
}

impl ListingSource for KvScraper {
    async fn fetch_page(&self, page: u32) -> Result<ScrapedPage, ScrapeError> {
        let url = self.config.page_url(page);
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        log::debug!("Fetched {} bytes from {url}", body.len());
        parse_page(&body)
    }

    fn page_count(&self) -> u32 {
        self.config.total_pages
    }
}

/// CSS selectors for the listing fields.
struct Selectors {
    article: Selector,
    description: Selector,
    rooms: Selector,
    area: Selector,
    price: Selector,
}

impl Selectors {
    fn new() -> Result<Self, ScrapeError> {
        Ok(Self {
            article: parse_selector("article")?,
            description: parse_selector(".description")?,
            rooms: parse_selector(".rooms")?,
            area: parse_selector(".area")?,
            price: parse_selector(".price")?,
        })
    }
}

/// Parses a CSS selector string, returning a [`ScrapeError`] on failure.
fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector)
        .map_err(|e| ScrapeError::Parse(format!("invalid CSS selector '{selector}': {e}")))
}

/// Extracts every listing from a search result page.
///
/// Articles missing a field are logged and counted in
/// [`ScrapedPage::skipped`].
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] if a selector fails to compile.
pub fn parse_page(html: &str) -> Result<ScrapedPage, ScrapeError> {
    let selectors = Selectors::new()?;
    let document = Html::parse_document(html);
    let mut page = ScrapedPage::default();

    for article in document.select(&selectors.article) {
        match parse_article(article, &selectors) {
            Ok(listing) => page.listings.push(listing),
            Err(e) => {
                log::warn!("Error extracting article: {e}");
                page.skipped += 1;
            }
        }
    }

    Ok(page)
}

fn parse_article(article: ElementRef<'_>, selectors: &Selectors) -> Result<ScrapedListing, String> {
    let field = |selector: &Selector, name: &str| {
        article
            .select(selector)
            .next()
            .ok_or_else(|| format!("missing {name}"))
    };

    let address = first_line(field(&selectors.description, ".description")?)
        .ok_or("empty .description")?;
    // A leading digit is a badge rendered before the address text.
    let address = if address.starts_with(|c: char| c.is_ascii_digit()) {
        address[1..].trim().to_owned()
    } else {
        address
    };
    if address.is_empty() {
        return Err("empty address".to_owned());
    }

    Ok(ScrapedListing {
        address,
        rooms: collapsed_text(field(&selectors.rooms, ".rooms")?),
        size: collapsed_text(field(&selectors.area, ".area")?),
        price: first_line(field(&selectors.price, ".price")?).unwrap_or_default(),
    })
}

/// First non-empty line of an element's text.
fn first_line(element: ElementRef<'_>) -> Option<String> {
    element
        .text()
        .collect::<String>()
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_owned)
}

/// All of an element's text with whitespace collapsed.
fn collapsed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <article data-object-id="1">
            <div class="description">
              <h2><a href="/1">Riia 15-3</a></h2>
              <p>Tartu, Kesklinn</p>
            </div>
            <div class="rooms">2</div>
            <div class="area">54.2 m²</div>
            <div class="price">129 000 €
              <small>2 380 €/m²</small>
            </div>
          </article>
          <article data-object-id="2">
            <div class="description"><h2><span class="badge">1</span>Tähe 12-5</h2></div>
            <div class="rooms">3</div>
            <div class="area">61 m²</div>
            <div class="price">150 000 €</div>
          </article>
          <article data-object-id="3">
            <div class="description"><h2>Kalda tee 5</h2></div>
            <div class="area">30 m²</div>
            <div class="price">90 000 €</div>
          </article>
        </body></html>
    "#;

    #[test]
    fn extracts_listing_fields() {
        let page = parse_page(PAGE).unwrap();
        assert_eq!(
            page.listings[0],
            ScrapedListing {
                address: "Riia 15-3".to_string(),
                rooms: "2".to_string(),
                size: "54.2 m²".to_string(),
                price: "129 000 €".to_string(),
            }
        );
    }

    #[test]
    fn drops_leading_badge_digit() {
        let page = parse_page(PAGE).unwrap();
        assert_eq!(page.listings[1].address, "Tähe 12-5");
    }

    #[test]
    fn skips_incomplete_articles() {
        let page = parse_page(PAGE).unwrap();
        assert_eq!(page.listings.len(), 2);
        assert_eq!(page.skipped, 1);
    }

    #[test]
    fn empty_page_has_no_listings() {
        let page = parse_page("<html><body><p>Nothing here</p></body></html>").unwrap();
        assert!(page.listings.is_empty());
        assert_eq!(page.skipped, 0);
    }
}
