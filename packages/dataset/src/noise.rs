//! Noise survey filtering and the city-wide fallback class.

use serde::Deserialize;
use tartu_housing_address::{JoinTable, normalize};
use tartu_housing_dataset_models::NoiseRecord;

use crate::parsing::parse_noise_class;

/// One row of the national noise survey, as read from disk. Other
/// columns of the file are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NoiseSurveyRow {
    /// Full address including settlement and county.
    #[serde(rename = "taisaadres")]
    pub full_address: String,
    /// Short in-settlement address.
    #[serde(rename = "lahiaadres")]
    pub short_address: String,
    /// Noise class code.
    #[serde(rename = "MYRAKLASS")]
    pub noise_class: String,
}

impl NoiseSurveyRow {
    /// Columns the noise table must have.
    pub const REQUIRED_COLUMNS: &'static [&'static str] =
        &["taisaadres", "lahiaadres", "MYRAKLASS"];
}

/// Keeps rows whose full address mentions `city` (case-insensitive) and
/// reduces them to normalized short address and parsed class.
#[must_use]
pub fn filter_city(rows: &[NoiseSurveyRow], city: &str) -> Vec<NoiseRecord> {
    let city = city.to_lowercase();
    let records: Vec<NoiseRecord> = rows
        .iter()
        .filter(|row| row.full_address.to_lowercase().contains(&city))
        .map(|row| NoiseRecord {
            short_address: normalize(&row.short_address),
            noise_class: parse_noise_class(&row.noise_class),
        })
        .collect();

    log::info!(
        "Kept {} of {} noise rows for '{city}'",
        records.len(),
        rows.len()
    );
    records
}

/// Mean noise class over the records that have one.
///
/// Returns `None` if no record has a class.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_noise_class(records: &[NoiseRecord]) -> Option<f64> {
    let (sum, count) = records
        .iter()
        .filter_map(|r| r.noise_class)
        .fold((0_u64, 0_u64), |(sum, count), class| {
            (sum + u64::from(class), count + 1)
        });

    (count > 0).then(|| sum as f64 / count as f64)
}

/// Builds the noise join table. The first record for an address wins.
///
/// Records without a class are left out, so a listing at such an address
/// falls through to the alternate form and then to the city-wide mean.
#[must_use]
pub fn build_table(records: &[NoiseRecord]) -> JoinTable<Option<f64>> {
    let table: JoinTable<Option<f64>> = records
        .iter()
        .filter_map(|r| {
            r.noise_class
                .map(|class| (r.short_address.clone(), Some(f64::from(class))))
        })
        .collect();

    if table.duplicate_keys() > 0 {
        log::warn!(
            "{} noise records repeat an earlier address; keeping the first occurrence",
            table.duplicate_keys()
        );
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(full: &str, short: &str, class: &str) -> NoiseSurveyRow {
        NoiseSurveyRow {
            full_address: full.to_string(),
            short_address: short.to_string(),
            noise_class: class.to_string(),
        }
    }

    #[test]
    fn filters_by_city_case_insensitively() {
        let records = filter_city(
            &[
                row("Tartu maakond, Tartu linn, Riia tn 15", "Riia tn 15", "3"),
                row("Harju maakond, Tallinn, Narva mnt 5", "Narva mnt 5", "4"),
                row("TARTU LINN, Tähe tn 10", "Tähe tn 10", "2"),
            ],
            "Tartu",
        );
        let addresses: Vec<&str> = records.iter().map(|r| r.short_address.as_str()).collect();
        assert_eq!(addresses, vec!["Riia tn 15", "Tähe tn 10"]);
    }

    #[test]
    fn normalizes_short_addresses() {
        let records = filter_city(&[row("Tartu linn", " Riia tn  15 ", "3")], "tartu");
        assert_eq!(records[0].short_address, "Riia tn 15");
    }

    #[test]
    fn mean_skips_missing_classes() {
        let records = filter_city(
            &[
                row("Tartu", "Riia tn 15", "3"),
                row("Tartu", "Tähe tn 10", "x"),
                row("Tartu", "Kalda tee 5", "2"),
            ],
            "Tartu",
        );
        let mean = mean_noise_class(&records).unwrap();
        assert!((mean - 2.5).abs() < 1e-9);
    }

    #[test]
    fn mean_of_nothing_is_missing() {
        assert_eq!(mean_noise_class(&[]), None);
    }

    #[test]
    fn table_skips_records_without_class() {
        let records = filter_city(
            &[row("Tartu", "Riia tn 15", "n/a"), row("Tartu", "Tähe 10", "2")],
            "Tartu",
        );
        let table = build_table(&records);
        assert_eq!(table.get("Riia tn 15"), None);
        assert_eq!(table.len(), 1);

        let fallback = mean_noise_class(&records);
        assert_eq!(table.lookup("Riia tn 15", &fallback), &Some(2.0));
    }

    #[test]
    fn table_counts_duplicate_addresses() {
        let records = filter_city(
            &[
                row("Tartu", "Riia tn 15", "3"),
                row("Tartu", "Riia tn 15-2", "5"),
            ],
            "Tartu",
        );
        let table = build_table(&records);
        assert_eq!(table.duplicate_keys(), 1);
        assert_eq!(table.get("Riia tn 15"), Some(&Some(3.0)));
    }

    #[test]
    fn table_maps_classes() {
        let records = filter_city(&[row("Tartu", "Riia tn 15", "3")], "Tartu");
        let table = build_table(&records);
        assert_eq!(table.get("Riia tn 15"), Some(&Some(3.0)));
    }
}
