#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared record types for the Tartu housing dataset.
//!
//! This crate contains only data types, column names, and simple
//! conversions. It has no I/O and no heavyweight dependencies.

pub mod progress;

use serde::{Deserialize, Serialize};

/// Column names of the input and output tables.
pub mod columns {
    /// Positional listing identifier assigned while scraping.
    pub const INDEX: &str = "Index";
    /// Free-text listing address.
    pub const ADDRESS: &str = "Address";
    /// Room count as scraped.
    pub const ROOM_COUNT: &str = "Room Count";
    /// Floor area (`m²` suffix on input, numeric on output).
    pub const SIZE: &str = "Size";
    /// Asking price (currency symbol on input, numeric on output).
    pub const PRICE: &str = "Price";
    /// Noise class joined from the noise survey.
    pub const NOISE_CLASS: &str = "MYRAKLASS";
    /// WGS84 longitude.
    pub const LONGITUDE: &str = "Longitude";
    /// WGS84 latitude.
    pub const LATITUDE: &str = "Latitude";
    /// Distance to the reference point, in meters.
    pub const DISTANCE: &str = "Distance";
}

/// A listing exactly as harvested from the listing site.
///
/// This is both the scraper's output row and the listings table's input
/// row. Older listing files name the room column `Rooms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawListing {
    /// 1-based position in harvest order.
    #[serde(rename = "Index")]
    pub index: u64,
    /// Free-text address, possibly with a unit suffix.
    #[serde(rename = "Address")]
    pub address: String,
    /// Room count text.
    #[serde(rename = "Room Count", alias = "Rooms")]
    pub rooms: String,
    /// Area text, e.g. `"54.2 m²"`.
    #[serde(rename = "Size")]
    pub size: String,
    /// Price text, e.g. `"129 000 €"`.
    #[serde(rename = "Price")]
    pub price: String,
}

/// A listing with its numeric fields parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    /// Positional identifier from the listings table.
    pub index: u64,
    /// Address as it appeared in the listings table.
    pub address: String,
    /// Room count, passed through untouched.
    pub rooms: String,
    /// Area in square meters, `None` when unparseable.
    pub size: Option<f64>,
    /// Price in euros, `None` when unparseable.
    pub price: Option<f64>,
}

/// Accessibility survey metrics shared by every building of a survey row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccessibilityMetrics {
    /// `Teenus_arv`: number of services in reach.
    pub service_count: Option<f64>,
    /// `Teenustase`: service level.
    pub service_level: Option<f64>,
    /// `Tookoht_protsent`: share of workplaces in reach.
    pub workplace_percent: Option<f64>,
    /// `Kool_arv`: schools in reach.
    pub school_count: Option<f64>,
    /// `Lasteaed_arv`: kindergartens in reach.
    pub kindergarten_count: Option<f64>,
    /// `Toidupood_arv`: grocery stores in reach.
    pub grocery_count: Option<f64>,
    /// `Toidukoht_arv`: eateries in reach.
    pub eatery_count: Option<f64>,
    /// `Parkimisnorm`: parking norm.
    pub parking_norm: Option<f64>,
    /// `Parkimis_koefitsent`: parking coefficient.
    pub parking_coefficient: Option<f64>,
}

impl AccessibilityMetrics {
    /// Survey column names, in output order.
    pub const COLUMNS: [&'static str; 9] = [
        "Teenus_arv",
        "Teenustase",
        "Tookoht_protsent",
        "Kool_arv",
        "Lasteaed_arv",
        "Toidupood_arv",
        "Toidukoht_arv",
        "Parkimisnorm",
        "Parkimis_koefitsent",
    ];

    /// The record bound to listings with no accessibility match.
    pub const ZERO: Self = Self {
        service_count: Some(0.0),
        service_level: Some(0.0),
        workplace_percent: Some(0.0),
        school_count: Some(0.0),
        kindergarten_count: Some(0.0),
        grocery_count: Some(0.0),
        eatery_count: Some(0.0),
        parking_norm: Some(0.0),
        parking_coefficient: Some(0.0),
    };

    /// Builds metrics from values in [`Self::COLUMNS`] order.
    #[must_use]
    pub const fn from_values(values: [Option<f64>; 9]) -> Self {
        Self {
            service_count: values[0],
            service_level: values[1],
            workplace_percent: values[2],
            school_count: values[3],
            kindergarten_count: values[4],
            grocery_count: values[5],
            eatery_count: values[6],
            parking_norm: values[7],
            parking_coefficient: values[8],
        }
    }

    /// Values in [`Self::COLUMNS`] order.
    #[must_use]
    pub const fn values(&self) -> [Option<f64>; 9] {
        [
            self.service_count,
            self.service_level,
            self.workplace_percent,
            self.school_count,
            self.kindergarten_count,
            self.grocery_count,
            self.eatery_count,
            self.parking_norm,
            self.parking_coefficient,
        ]
    }
}

/// One building of an accessibility survey row.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessibilityEntry {
    /// Normalized building address.
    pub address: String,
    /// Metrics of the survey row the building came from.
    pub metrics: AccessibilityMetrics,
}

/// One row of the city-filtered noise survey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseRecord {
    /// Normalized short (in-city) address.
    pub short_address: String,
    /// Noise class, `None` when unparseable.
    pub noise_class: Option<u32>,
}

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// A row of the coordinates cache, positionally aligned with listings.
///
/// The join pairs rows with listings by position, so `index` is
/// informational only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinatesRow {
    /// Listing index the coordinates were resolved for.
    #[serde(rename = "Index")]
    pub index: Option<u64>,
    /// Longitude, empty when the address was not found.
    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,
    /// Latitude, empty when the address was not found.
    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,
}

impl CoordinatesRow {
    /// Returns the coordinate pair when both halves are present.
    #[must_use]
    pub const fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

/// A listing joined with every auxiliary dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedListing {
    /// The parsed listing.
    pub listing: Listing,
    /// Matched accessibility metrics, or [`AccessibilityMetrics::ZERO`].
    pub accessibility: AccessibilityMetrics,
    /// Matched noise class, or the city-wide mean.
    pub noise_class: Option<f64>,
    /// Coordinates from the coordinates table.
    pub coordinates: Option<Coordinates>,
    /// Distance to the reference point in meters.
    pub distance_m: Option<f64>,
}

impl EnrichedListing {
    /// Output table header.
    #[must_use]
    pub fn header() -> Vec<&'static str> {
        let mut header = vec![
            columns::INDEX,
            columns::ADDRESS,
            columns::ROOM_COUNT,
            columns::SIZE,
            columns::PRICE,
        ];
        header.extend(AccessibilityMetrics::COLUMNS);
        header.extend([
            columns::NOISE_CLASS,
            columns::LONGITUDE,
            columns::LATITUDE,
            columns::DISTANCE,
        ]);
        header
    }

    /// Output row, aligned with [`Self::header`]. Missing values are empty.
    #[must_use]
    pub fn to_record(&self) -> Vec<String> {
        let mut record = vec![
            self.listing.index.to_string(),
            self.listing.address.clone(),
            self.listing.rooms.clone(),
            format_optional(self.listing.size),
            format_optional(self.listing.price),
        ];
        record.extend(self.accessibility.values().into_iter().map(format_optional));
        record.extend([
            format_optional(self.noise_class),
            format_optional(self.coordinates.map(|c| c.longitude)),
            format_optional(self.coordinates.map(|c| c.latitude)),
            format_optional(self.distance_m),
        ]);
        record
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(String::new, |v| v.to_string())
}
