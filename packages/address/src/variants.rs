//! Expansion of multi-building survey addresses.
//!
//! The accessibility survey lists several buildings in one cell, joined
//! by `//`, and usually spells the street only once:
//! `"Tähe 10//12//14"` covers `Tähe 10`, `Tähe 12` and `Tähe 14`.

use crate::normalize::{find_street_number, normalize};

/// Separator between building addresses in a single survey cell.
pub const SEGMENT_SEPARATOR: &str = "//";

/// Splits a survey address cell into one normalized address per building,
/// in cell order.
///
/// A segment without its own street name inherits the most recently seen
/// one. Segments that appear before any street name is known are dropped,
/// as are segments that normalize to nothing.
#[must_use]
pub fn expand_addresses(raw: &str) -> Vec<String> {
    let mut street: Option<String> = None;
    let mut addresses = Vec::new();

    for segment in raw.split(SEGMENT_SEPARATOR) {
        let normalized = normalize(segment);
        if normalized.is_empty() {
            continue;
        }

        if let Some(span) = find_street_number(&normalized) {
            street = Some(normalized[span.start..span.street_end].to_owned());
            addresses.push(normalized);
        } else if let Some(street) = &street {
            addresses.push(format!("{street} {normalized}"));
        } else {
            log::trace!("Dropping segment {normalized:?} of {raw:?}: no street name yet");
        }
    }

    addresses
}

/// Pairs every building address in `raw` with a copy of the row's shared
/// fields.
#[must_use]
pub fn expand<T: Clone>(shared: &T, raw: &str) -> Vec<(String, T)> {
    expand_addresses(raw)
        .into_iter()
        .map(|address| (address, shared.clone()))
        .collect()
}
