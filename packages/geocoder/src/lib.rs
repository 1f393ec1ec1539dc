#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding of listing addresses.
//!
//! Resolves `"<city> <normalized address>"` to coordinates through a
//! [`Geocoder`] (in production, [`nominatim::NominatimGeocoder`]). A miss
//! is retried once with the address's alternate `tn` form; a second miss
//! leaves the listing without coordinates.
//!
//! Public Nominatim allows one request per second, so [`resolve`] sleeps
//! a fixed delay before every remote request and never sends the same
//! query twice in a run.

pub mod nominatim;
pub mod resolve;

use std::future::Future;

use thiserror::Error;

pub use resolve::{AddressResolver, geocode_listings};

/// A geocoding hit.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// The canonical address reported by the provider.
    pub matched_address: Option<String>,
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,
}

/// A free-form address lookup service.
pub trait Geocoder: Send + Sync {
    /// Looks up a free-form query. `Ok(None)` means the provider answered
    /// but found nothing.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request or response parsing fails.
    fn geocode(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Option<GeocodedAddress>, GeocodeError>> + Send;
}
