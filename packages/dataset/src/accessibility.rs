//! Accessibility survey rows and their expansion into join entries.

use serde::Deserialize;
use tartu_housing_address::{JoinTable, expand};
use tartu_housing_dataset_models::{AccessibilityEntry, AccessibilityMetrics};

use crate::parsing::parse_number;

/// One row of the accessibility survey, as read from disk.
///
/// `Aadress` may list several buildings joined by `//`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AccessibilitySurveyRow {
    /// Raw, possibly multi-building, address cell.
    #[serde(rename = "Aadress")]
    pub address: String,
    #[serde(rename = "Teenus_arv")]
    pub service_count: String,
    #[serde(rename = "Teenustase")]
    pub service_level: String,
    #[serde(rename = "Tookoht_protsent")]
    pub workplace_percent: String,
    #[serde(rename = "Kool_arv")]
    pub school_count: String,
    #[serde(rename = "Lasteaed_arv")]
    pub kindergarten_count: String,
    #[serde(rename = "Toidupood_arv")]
    pub grocery_count: String,
    #[serde(rename = "Toidukoht_arv")]
    pub eatery_count: String,
    #[serde(rename = "Parkimisnorm")]
    pub parking_norm: String,
    #[serde(rename = "Parkimis_koefitsent")]
    pub parking_coefficient: String,
}

impl AccessibilitySurveyRow {
    /// Columns the survey table must have.
    pub const REQUIRED_COLUMNS: &'static [&'static str] = &[
        "Aadress",
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

    /// Parses the metric cells. Unparseable cells become `None`.
    #[must_use]
    pub fn metrics(&self) -> AccessibilityMetrics {
        AccessibilityMetrics::from_values([
            parse_number(&self.service_count),
            parse_number(&self.service_level),
            parse_number(&self.workplace_percent),
            parse_number(&self.school_count),
            parse_number(&self.kindergarten_count),
            parse_number(&self.grocery_count),
            parse_number(&self.eatery_count),
            parse_number(&self.parking_norm),
            parse_number(&self.parking_coefficient),
        ])
    }
}

/// Expands every survey row into one entry per building, preserving row
/// order and, within a row, segment order.
#[must_use]
pub fn expand_survey(rows: &[AccessibilitySurveyRow]) -> Vec<AccessibilityEntry> {
    let entries: Vec<AccessibilityEntry> = rows
        .iter()
        .flat_map(|row| expand(&row.metrics(), &row.address))
        .map(|(address, metrics)| AccessibilityEntry { address, metrics })
        .collect();

    log::info!(
        "Expanded {} accessibility rows into {} building entries",
        rows.len(),
        entries.len()
    );
    entries
}

/// Builds the accessibility join table. The first entry for an address
/// wins.
#[must_use]
pub fn build_table(entries: Vec<AccessibilityEntry>) -> JoinTable<AccessibilityMetrics> {
    let table: JoinTable<AccessibilityMetrics> = entries
        .into_iter()
        .map(|entry| (entry.address, entry.metrics))
        .collect();

    if table.duplicate_keys() > 0 {
        log::warn!(
            "{} accessibility entries repeat an earlier address; keeping the first occurrence",
            table.duplicate_keys()
        );
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(address: &str, service_level: &str) -> AccessibilitySurveyRow {
        AccessibilitySurveyRow {
            address: address.to_string(),
            service_count: "12".to_string(),
            service_level: service_level.to_string(),
            workplace_percent: "45.5".to_string(),
            school_count: "2".to_string(),
            kindergarten_count: "3".to_string(),
            grocery_count: "4".to_string(),
            eatery_count: "5".to_string(),
            parking_norm: "0.8".to_string(),
            parking_coefficient: "1.1".to_string(),
        }
    }

    #[test]
    fn parses_metrics() {
        let metrics = row("Tähe 10", "3").metrics();
        assert_eq!(metrics.service_level, Some(3.0));
        assert_eq!(metrics.workplace_percent, Some(45.5));
        assert_eq!(metrics.parking_coefficient, Some(1.1));
    }

    #[test]
    fn blank_metric_is_missing() {
        assert_eq!(row("Tähe 10", "").metrics().service_level, None);
    }

    #[test]
    fn expands_rows_in_order() {
        let entries = expand_survey(&[row("Tähe 10//12", "3"), row("Riia tn 15", "2")]);
        let addresses: Vec<&str> = entries.iter().map(|e| e.address.as_str()).collect();
        assert_eq!(addresses, vec!["Tähe 10", "Tähe 12", "Riia tn 15"]);
        assert_eq!(entries[1].metrics.service_level, Some(3.0));
        assert_eq!(entries[2].metrics.service_level, Some(2.0));
    }

    #[test]
    fn orphan_rows_contribute_nothing() {
        assert!(expand_survey(&[row("12//14", "3")]).is_empty());
    }

    #[test]
    fn table_keeps_first_duplicate() {
        let table = build_table(expand_survey(&[row("Tähe 10", "3"), row("Tähe 10", "5")]));
        assert_eq!(table.get("Tähe 10").unwrap().service_level, Some(3.0));
        assert_eq!(table.duplicate_keys(), 1);
    }
}
