//! Rate-limited, deduplicated address resolution.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tartu_housing_address::{alternate_form, normalize};
use tartu_housing_dataset_models::progress::ProgressCallback;
use tartu_housing_dataset_models::{Coordinates, CoordinatesRow, RawListing};

use crate::{GeocodeError, Geocoder};

/// Pause after the provider reports HTTP 429.
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(60);

/// Resolves normalized addresses to coordinates for one city.
///
/// Every distinct query string reaches the geocoder at most once per
/// resolver, and each remote request is preceded by `delay`.
pub struct AddressResolver<'a, G: Geocoder> {
    geocoder: &'a G,
    city: String,
    delay: Duration,
    cache: BTreeMap<String, Option<Coordinates>>,
}

impl<'a, G: Geocoder> AddressResolver<'a, G> {
    /// Creates a resolver that prefixes every query with `city`.
    #[must_use]
    pub fn new(geocoder: &'a G, city: &str, delay: Duration) -> Self {
        Self {
            geocoder,
            city: city.to_owned(),
            delay,
            cache: BTreeMap::new(),
        }
    }

    /// Number of remote requests issued so far.
    #[must_use]
    pub fn requests(&self) -> usize {
        self.cache.len()
    }

    /// Resolves `address` (already normalized), retrying once with its
    /// alternate form.
    pub async fn resolve(&mut self, address: &str) -> Option<Coordinates> {
        let primary = format!("{} {address}", self.city);
        if let Some(found) = self.query(primary).await {
            return Some(found);
        }

        let alternate = format!("{} {}", self.city, alternate_form(address));
        if let Some(found) = self.query(alternate).await {
            return Some(found);
        }

        log::info!("Address not found: {address}");
        None
    }

    async fn query(&mut self, query: String) -> Option<Coordinates> {
        if let Some(cached) = self.cache.get(&query) {
            return *cached;
        }

        tokio::time::sleep(self.delay).await;
        log::debug!("Looking for: {query}");

        let result = match self.geocoder.geocode(&query).await {
            Ok(found) => found.map(|g| Coordinates {
                latitude: g.latitude,
                longitude: g.longitude,
            }),
            Err(GeocodeError::RateLimited) => {
                log::warn!("Rate limited while looking up '{query}', waiting {RATE_LIMIT_BACKOFF:?}...");
                tokio::time::sleep(RATE_LIMIT_BACKOFF).await;
                None
            }
            Err(e) => {
                log::warn!("Geocoding '{query}' failed: {e}");
                None
            }
        };

        self.cache.insert(query, result);
        result
    }
}

/// Geocodes every listing in order, producing the coordinates table.
///
/// Listings that cannot be resolved get empty coordinates; geocoding
/// failures never abort the run.
pub async fn geocode_listings<G: Geocoder>(
    geocoder: &G,
    city: &str,
    delay: Duration,
    listings: &[RawListing],
    progress: &Arc<dyn ProgressCallback>,
) -> Vec<CoordinatesRow> {
    let mut resolver = AddressResolver::new(geocoder, city, delay);
    let mut rows = Vec::with_capacity(listings.len());
    let mut found = 0_usize;

    progress.set_total(listings.len() as u64);

    for listing in listings {
        let address = normalize(&listing.address);
        progress.set_message(address.clone());

        let coordinates = resolver.resolve(&address).await;
        if coordinates.is_some() {
            found += 1;
        }
        rows.push(CoordinatesRow {
            index: Some(listing.index),
            longitude: coordinates.map(|c| c.longitude),
            latitude: coordinates.map(|c| c.latitude),
        });

        progress.inc(1);
    }

    progress.finish(format!("Geocoded {found} of {} listings", listings.len()));
    log::info!(
        "Geocoded {found} of {} listings with {} requests",
        listings.len(),
        resolver.requests()
    );

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeocodedAddress;
    use std::sync::Mutex;
    use tartu_housing_dataset_models::progress::null_progress;

    /// Answers from a fixed table and records every query.
    struct FakeGeocoder {
        known: BTreeMap<String, (f64, f64)>,
        queries: Mutex<Vec<String>>,
    }

    impl FakeGeocoder {
        fn new(known: &[(&str, (f64, f64))]) -> Self {
            Self {
                known: known
                    .iter()
                    .map(|(q, c)| ((*q).to_string(), *c))
                    .collect(),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    impl Geocoder for FakeGeocoder {
        async fn geocode(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
            self.queries.lock().unwrap().push(query.to_string());
            if query.contains("broken") {
                return Err(GeocodeError::Parse {
                    message: "boom".to_string(),
                });
            }
            Ok(self.known.get(query).map(|&(latitude, longitude)| GeocodedAddress {
                latitude,
                longitude,
                matched_address: None,
            }))
        }
    }

    fn listing(index: u64, address: &str) -> RawListing {
        RawListing {
            index,
            address: address.to_string(),
            rooms: "1".to_string(),
            size: String::new(),
            price: String::new(),
        }
    }

    #[tokio::test]
    async fn resolves_primary_form_first() {
        let geocoder = FakeGeocoder::new(&[("Tartu Riia 15", (58.37, 26.73))]);
        let mut resolver = AddressResolver::new(&geocoder, "Tartu", Duration::ZERO);

        let found = resolver.resolve("Riia 15").await.unwrap();
        assert!((found.latitude - 58.37).abs() < 1e-9);
        assert_eq!(geocoder.queries(), vec!["Tartu Riia 15"]);
    }

    #[tokio::test]
    async fn retries_with_alternate_form() {
        let geocoder = FakeGeocoder::new(&[("Tartu Riia tn 15", (58.37, 26.73))]);
        let mut resolver = AddressResolver::new(&geocoder, "Tartu", Duration::ZERO);

        assert!(resolver.resolve("Riia 15").await.is_some());
        assert_eq!(geocoder.queries(), vec!["Tartu Riia 15", "Tartu Riia tn 15"]);
    }

    #[tokio::test]
    async fn gives_up_after_alternate_miss() {
        let geocoder = FakeGeocoder::new(&[]);
        let mut resolver = AddressResolver::new(&geocoder, "Tartu", Duration::ZERO);

        assert!(resolver.resolve("Riia 15").await.is_none());
        assert_eq!(geocoder.queries().len(), 2);
    }

    #[tokio::test]
    async fn never_repeats_a_query() {
        let geocoder = FakeGeocoder::new(&[("Tartu Tähe 10", (58.36, 26.70))]);
        let mut resolver = AddressResolver::new(&geocoder, "Tartu", Duration::ZERO);

        resolver.resolve("Tähe 10").await;
        resolver.resolve("Tähe 10").await;
        resolver.resolve("Kalda tee 5").await;
        resolver.resolve("Kalda tee 5").await;

        assert_eq!(
            geocoder.queries(),
            vec!["Tartu Tähe 10", "Tartu Kalda tee 5", "Tartu Kalda tee tn 5"]
        );
        assert_eq!(resolver.requests(), 3);
    }

    #[tokio::test]
    async fn errors_degrade_to_absent() {
        let geocoder = FakeGeocoder::new(&[]);
        let mut resolver = AddressResolver::new(&geocoder, "Tartu", Duration::ZERO);

        assert!(resolver.resolve("broken 1").await.is_none());
    }

    #[tokio::test]
    async fn geocodes_listings_in_order() {
        let geocoder = FakeGeocoder::new(&[
            ("Tartu Riia 15", (58.37, 26.73)),
            ("Tartu Tähe tn 12", (58.36, 26.71)),
        ]);
        let rows = geocode_listings(
            &geocoder,
            "Tartu",
            Duration::ZERO,
            &[
                listing(1, "Riia 15-3"),
                listing(2, "Raekoja plats"),
                listing(3, "Tähe 12-5"),
            ],
            &null_progress(),
        )
        .await;

        let indices: Vec<Option<u64>> = rows.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(rows[0].latitude, Some(58.37));
        assert_eq!(rows[1].coordinates(), None);
        assert_eq!(rows[2].longitude, Some(26.71));
    }
}
