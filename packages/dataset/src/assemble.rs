//! Joins listings with the accessibility, noise, and coordinates tables.
//!
//! Tables are loaded by the caller and handed in explicitly; the join
//! itself is a pure in-memory pass over the listings in file order.

use tartu_housing_address::{JoinStats, JoinTable, normalize};
use tartu_housing_dataset_models::{
    AccessibilityMetrics, Coordinates, CoordinatesRow, EnrichedListing, RawListing,
};

use crate::accessibility::{self, AccessibilitySurveyRow};
use crate::distance::distance_m;
use crate::noise::{self, NoiseSurveyRow};
use crate::parsing::parse_listing;

/// Prepared lookup tables for enriching listings.
#[derive(Debug, Clone)]
pub struct JoinContext {
    accessibility: JoinTable<AccessibilityMetrics>,
    noise: JoinTable<Option<f64>>,
    noise_fallback: Option<f64>,
}

impl JoinContext {
    /// Expands the accessibility survey, filters the noise survey to
    /// `city`, and precomputes the mean noise class used as the noise
    /// fallback.
    #[must_use]
    pub fn new(
        accessibility_rows: &[AccessibilitySurveyRow],
        noise_rows: &[NoiseSurveyRow],
        city: &str,
    ) -> Self {
        let accessibility = accessibility::build_table(accessibility::expand_survey(
            accessibility_rows,
        ));

        let noise_records = noise::filter_city(noise_rows, city);
        let noise_fallback = noise::mean_noise_class(&noise_records);
        match noise_fallback {
            Some(mean) => log::info!("Mean noise class for '{city}': {mean:.3}"),
            None => log::warn!("No noise classes for '{city}'; unmatched listings get none"),
        }

        Self {
            accessibility,
            noise: noise::build_table(&noise_records),
            noise_fallback,
        }
    }

    /// The noise class bound to listings without a noise match.
    #[must_use]
    pub const fn noise_fallback(&self) -> Option<f64> {
        self.noise_fallback
    }
}

/// Per-run join counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    /// Accessibility join outcomes.
    pub accessibility: JoinStats,
    /// Noise join outcomes.
    pub noise: JoinStats,
    /// Listings that received coordinates.
    pub with_coordinates: u64,
}

/// Enriches every listing, in listing order.
///
/// `coordinates` is aligned with `listings` by position; listings past
/// its end get no coordinates and no distance.
#[must_use]
pub fn assemble(
    listings: &[RawListing],
    coordinates: &[CoordinatesRow],
    context: &JoinContext,
    reference_point: Coordinates,
) -> (Vec<EnrichedListing>, AssemblyReport) {
    let mut report = AssemblyReport::default();

    let enriched = listings
        .iter()
        .enumerate()
        .map(|(position, raw)| {
            let address = normalize(&raw.address);

            let accessibility = context
                .accessibility
                .resolve(&address, &AccessibilityMetrics::ZERO);
            report.accessibility.record(accessibility.tier);

            let noise = context.noise.resolve(&address, &context.noise_fallback);
            report.noise.record(noise.tier);

            let coordinates = coordinates
                .get(position)
                .and_then(CoordinatesRow::coordinates);
            if coordinates.is_some() {
                report.with_coordinates += 1;
            }

            EnrichedListing {
                listing: parse_listing(raw),
                accessibility: *accessibility.value,
                noise_class: *noise.value,
                coordinates,
                distance_m: coordinates.map(|c| distance_m(reference_point, c)),
            }
        })
        .collect();

    log::info!("Accessibility join: {}", report.accessibility);
    log::info!("Noise join: {}", report.noise);
    log::info!(
        "Coordinates for {} of {} listings",
        report.with_coordinates,
        listings.len()
    );

    (enriched, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tartu_housing_address::MatchTier;

    const REFERENCE: Coordinates = Coordinates {
        latitude: 58.380_099_644_611_306,
        longitude: 26.722_268_271_243_39,
    };

    fn listing(index: u64, address: &str) -> RawListing {
        RawListing {
            index,
            address: address.to_string(),
            rooms: "2".to_string(),
            size: "50 m²".to_string(),
            price: "100 000 €".to_string(),
        }
    }

    fn survey(address: &str, service_level: &str) -> AccessibilitySurveyRow {
        AccessibilitySurveyRow {
            address: address.to_string(),
            service_count: "10".to_string(),
            service_level: service_level.to_string(),
            workplace_percent: "50".to_string(),
            school_count: "1".to_string(),
            kindergarten_count: "2".to_string(),
            grocery_count: "3".to_string(),
            eatery_count: "4".to_string(),
            parking_norm: "0.5".to_string(),
            parking_coefficient: "1".to_string(),
        }
    }

    fn noise(short: &str, class: &str) -> NoiseSurveyRow {
        NoiseSurveyRow {
            full_address: format!("Tartu maakond, Tartu linn, {short}"),
            short_address: short.to_string(),
            noise_class: class.to_string(),
        }
    }

    fn context() -> JoinContext {
        JoinContext::new(
            &[survey("Tähe 10//12", "3")],
            &[noise("Riia tn 15", "4"), noise("Tähe 12", "1"), noise("Kalda tee 5", "2")],
            "Tartu",
        )
    }

    #[test]
    fn joins_through_expansion_and_unit_suffix() {
        let (rows, report) = assemble(&[listing(1, "Tähe 12-5")], &[], &context(), REFERENCE);
        assert_eq!(rows[0].accessibility.service_level, Some(3.0));
        assert_eq!(rows[0].noise_class, Some(1.0));
        assert_eq!(report.accessibility.exact, 1);
    }

    #[test]
    fn unmatched_listing_gets_defaults() {
        let context = context();
        let (rows, report) = assemble(&[listing(1, "Võru 99")], &[], &context, REFERENCE);
        assert_eq!(rows[0].accessibility, AccessibilityMetrics::ZERO);

        let expected_mean = (4.0 + 1.0 + 2.0) / 3.0;
        let noise_class = rows[0].noise_class.unwrap();
        assert!((noise_class - expected_mean).abs() < 1e-9);
        assert!((context.noise_fallback().unwrap() - expected_mean).abs() < 1e-9);
        assert_eq!(report.accessibility.fallback, 1);
        assert_eq!(report.noise.fallback, 1);
    }

    #[test]
    fn noise_joins_through_alternate_form() {
        let context = context();
        let (rows, report) = assemble(&[listing(1, "Riia 15-3")], &[], &context, REFERENCE);
        assert_eq!(rows[0].noise_class, Some(4.0));
        assert_eq!(report.noise.alternate, 1);
        assert_eq!(
            context.noise.resolve("Riia 15", &None).tier,
            MatchTier::Alternate
        );
    }

    #[test]
    fn every_listing_is_kept_in_order() {
        let listings = [
            listing(1, "Tähe 10"),
            listing(2, "nowhere"),
            listing(3, "Tähe 12-1"),
        ];
        let (rows, report) = assemble(&listings, &[], &context(), REFERENCE);
        let indices: Vec<u64> = rows.iter().map(|r| r.listing.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(report.accessibility.total(), 3);
    }

    #[test]
    fn attaches_coordinates_by_position() {
        let listings = [listing(1, "Tähe 10"), listing(2, "Tähe 12")];
        let coordinates = [CoordinatesRow {
            index: Some(1),
            longitude: Some(REFERENCE.longitude),
            latitude: Some(REFERENCE.latitude),
        }];
        let (rows, report) = assemble(&listings, &coordinates, &context(), REFERENCE);

        assert!(rows[0].distance_m.unwrap().abs() < 1e-6);
        assert!(rows[1].coordinates.is_none());
        assert!(rows[1].distance_m.is_none());
        assert_eq!(report.with_coordinates, 1);
    }

    #[test]
    fn parses_listing_numbers() {
        let (rows, _) = assemble(&[listing(1, "Tähe 10")], &[], &context(), REFERENCE);
        assert_eq!(rows[0].listing.size, Some(50.0));
        assert_eq!(rows[0].listing.price, Some(100_000.0));
    }

    #[test]
    fn empty_noise_table_falls_back_to_none() {
        let context = JoinContext::new(&[], &[], "Tartu");
        let (rows, _) = assemble(&[listing(1, "Tähe 10")], &[], &context, REFERENCE);
        assert_eq!(rows[0].noise_class, None);
        assert_eq!(rows[0].accessibility, AccessibilityMetrics::ZERO);
    }
}
