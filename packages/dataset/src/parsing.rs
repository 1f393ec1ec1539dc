//! Numeric field parsing for scraped and survey values.
//!
//! Scraped listings carry units and formatting (`"129 000 €"`,
//! `"54.2 m²"`). Anything that is not a finite number once the noise is
//! stripped becomes `None` instead of an error.

use regex::Regex;
use std::sync::LazyLock;

use tartu_housing_dataset_models::{Listing, RawListing};

/// Currency symbol, thousands separators, and whitespace in prices.
static PRICE_NOISE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[€,\s]").expect("valid regex"));

/// Area unit characters and whitespace in sizes.
static SIZE_UNIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[m²\s]").expect("valid regex"));

/// Parses a price such as `"129 000 €"` or `"€129,000"`.
#[must_use]
pub fn parse_price(raw: &str) -> Option<f64> {
    parse_number(&PRICE_NOISE_RE.replace_all(raw, ""))
}

/// Parses an area such as `"54.2 m²"`.
#[must_use]
pub fn parse_size(raw: &str) -> Option<f64> {
    parse_number(&SIZE_UNIT_RE.replace_all(raw, ""))
}

/// Parses a survey noise class. Integral decimals like `"3.0"` are
/// accepted.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_noise_class(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if let Ok(class) = raw.parse::<u32>() {
        return Some(class);
    }
    parse_number(raw)
        .filter(|v| v.fract() == 0.0 && *v >= 0.0 && *v <= f64::from(u32::MAX))
        .map(|v| v as u32)
}

/// Parses a plain decimal number, rejecting empty and non-finite input.
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses the numeric fields of a scraped listing.
#[must_use]
pub fn parse_listing(raw: &RawListing) -> Listing {
    let size = parse_size(&raw.size);
    if size.is_none() && !raw.size.trim().is_empty() {
        log::debug!("Listing {}: unparseable size {:?}", raw.index, raw.size);
    }
    let price = parse_price(&raw.price);
    if price.is_none() && !raw.price.trim().is_empty() {
        log::debug!("Listing {}: unparseable price {:?}", raw.index, raw.price);
    }

    Listing {
        index: raw.index,
        address: raw.address.clone(),
        rooms: raw.rooms.clone(),
        size,
        price,
    }
}
