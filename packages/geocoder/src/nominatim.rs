//! Nominatim / OpenStreetMap geocoder client.
//!
//! The public instance allows **1 request per second** and requires an
//! identifying `User-Agent`. Rate limiting is the caller's job (see
//! [`crate::resolve`]).
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use crate::{GeocodeError, GeocodedAddress, Geocoder};

/// Free-form Nominatim search restricted to one country.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    country_code: String,
}

impl NominatimGeocoder {
    /// Creates a client for the search endpoint at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, country_code: &str, user_agent: &str) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            client,
            base_url: base_url.to_owned(),
            country_code: country_code.to_owned(),
        })
    }
}

impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("countrycodes", self.country_code.as_str()),
                ("format", "jsonv2"),
                ("limit", "1"),
            ])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        let body: serde_json::Value = resp.error_for_status()?.json().await?;
        parse_response(&body)
    }
}

/// Parses a Nominatim JSON response, taking the first result.
fn parse_response(body: &serde_json::Value) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let coordinate = |key: &str| {
        first[key]
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| GeocodeError::Parse {
                message: format!("Missing {key} in Nominatim response"),
            })
    };

    Ok(Some(GeocodedAddress {
        latitude: coordinate("lat")?,
        longitude: coordinate("lon")?,
        matched_address: first["display_name"].as_str().map(String::from),
    }))
}
