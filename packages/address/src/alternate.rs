//! Alternate spelling of a normalized address.
//!
//! Some surveys write the street type (`tn`, short for "tänav") and some
//! do not: `"Riia 15"` and `"Riia tn 15"` are the same building.

/// Street-type marker, with its leading space.
const STREET_MARKER: &str = " tn";

/// Returns the single alternate spelling of `address`.
///
/// If the address contains `" tn"`, every occurrence is removed.
/// Otherwise `" tn "` is inserted between the street name and the first
/// digit run. Addresses without a street name before a digit come back
/// unchanged.
///
/// For addresses with a house number, applying this twice returns the
/// original.
#[must_use]
pub fn alternate_form(address: &str) -> String {
    if address.contains(STREET_MARKER) {
        return address.replace(STREET_MARKER, "");
    }

    let Some(digit_at) = address.find(|c: char| c.is_ascii_digit()) else {
        return address.to_owned();
    };

    let street = address[..digit_at].trim_end();
    if street.is_empty() {
        return address.to_owned();
    }

    format!("{street}{STREET_MARKER} {}", &address[digit_at..])
}
