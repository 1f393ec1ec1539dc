//! CSV reading and writing for every table the pipeline touches.
//!
//! Readers check that the required header columns exist up front. The
//! survey tables are joined by address, so a malformed survey row is
//! logged and skipped. The listings and coordinates tables are paired by
//! row position, so they never lose a row: their cells are read
//! leniently, and a row that still cannot be read fails the load.

use std::io::{Read, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tartu_housing_dataset_models::{CoordinatesRow, EnrichedListing, RawListing, columns};

use crate::DatasetError;
use crate::accessibility::AccessibilitySurveyRow;
use crate::noise::NoiseSurveyRow;

/// Columns a listings table must have. The room column may be named
/// either `Room Count` or `Rooms`, so it is not checked here.
const LISTING_COLUMNS: &[&str] = &[
    columns::INDEX,
    columns::ADDRESS,
    columns::SIZE,
    columns::PRICE,
];

/// Columns a coordinates table must have.
const COORDINATE_COLUMNS: &[&str] = &[columns::LONGITUDE, columns::LATITUDE];

/// What a reader does with a row that fails to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPolicy {
    /// Log the row and leave it out.
    Skip,
    /// Fail the whole read with [`DatasetError::MalformedRow`].
    Reject,
}

/// A coordinates table row as written on disk. Unparseable cells read as
/// empty, so every line yields a row.
#[derive(Debug, Deserialize)]
struct CoordinatesRecord {
    #[serde(rename = "Index", default, deserialize_with = "csv::invalid_option")]
    index: Option<u64>,
    #[serde(rename = "Longitude", default, deserialize_with = "csv::invalid_option")]
    longitude: Option<f64>,
    #[serde(rename = "Latitude", default, deserialize_with = "csv::invalid_option")]
    latitude: Option<f64>,
}

impl From<CoordinatesRecord> for CoordinatesRow {
    fn from(record: CoordinatesRecord) -> Self {
        Self {
            index: record.index,
            longitude: record.longitude.filter(|v| v.is_finite()),
            latitude: record.latitude.filter(|v| v.is_finite()),
        }
    }
}

/// Reads the listings table.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be opened, lacks a
/// required column, or has a row whose `Index` is not an integer.
pub fn read_listings(path: &Path) -> Result<Vec<RawListing>, DatasetError> {
    read_path(path, LISTING_COLUMNS, RowPolicy::Reject)
}

/// Reads the accessibility survey table.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be opened or lacks a
/// required column.
pub fn read_accessibility(path: &Path) -> Result<Vec<AccessibilitySurveyRow>, DatasetError> {
    read_path(path, AccessibilitySurveyRow::REQUIRED_COLUMNS, RowPolicy::Skip)
}

/// Reads the noise survey table.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be opened or lacks a
/// required column.
pub fn read_noise(path: &Path) -> Result<Vec<NoiseSurveyRow>, DatasetError> {
    read_path(path, NoiseSurveyRow::REQUIRED_COLUMNS, RowPolicy::Skip)
}

/// Reads the pre-geocoded coordinates table, one row per line.
///
/// Unparseable `Index`, `Longitude`, or `Latitude` cells become empty
/// instead of dropping the row.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be opened or lacks a
/// required column.
pub fn read_coordinates(path: &Path) -> Result<Vec<CoordinatesRow>, DatasetError> {
    let records: Vec<CoordinatesRecord> =
        read_path(path, COORDINATE_COLUMNS, RowPolicy::Reject)?;
    Ok(records.into_iter().map(CoordinatesRow::from).collect())
}

fn read_path<T: DeserializeOwned>(
    path: &Path,
    required: &[&str],
    policy: RowPolicy,
) -> Result<Vec<T>, DatasetError> {
    let file = std::fs::File::open(path).map_err(|e| DatasetError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let rows = read_records(file, &path.display().to_string(), required, policy)?;
    log::info!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Deserializes the rows of a CSV stream, handling rows that fail to
/// deserialize according to `policy`. Rows shorter than the header are
/// padded with empty cells.
///
/// `name` identifies the stream in errors and logs.
///
/// # Errors
///
/// Returns [`DatasetError`] if the header row cannot be read or lacks a
/// column from `required`, or if a row is malformed under
/// [`RowPolicy::Reject`].
pub fn read_records<T: DeserializeOwned>(
    reader: impl Read,
    name: &str,
    required: &[&str],
    policy: RowPolicy,
) -> Result<Vec<T>, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| DatasetError::Csv {
            path: name.to_owned(),
            source: e,
        })?
        .clone();
    if let Some(column) = required.iter().find(|c| !headers.iter().any(|h| h == **c)) {
        return Err(DatasetError::MissingColumn {
            path: name.to_owned(),
            column: (*column).to_owned(),
        });
    }

    let mut rows = Vec::new();
    for (line, result) in (1_u64..).zip(reader.records()) {
        // Short rows read their missing trailing cells as empty.
        let result = result.and_then(|mut record| {
            while record.len() < headers.len() {
                record.push_field("");
            }
            record.deserialize::<T>(Some(&headers))
        });

        match (result, policy) {
            (Ok(row), _) => rows.push(row),
            (Err(e), RowPolicy::Skip) => log::warn!("{name}: skipping malformed row {line}: {e}"),
            (Err(e), RowPolicy::Reject) => {
                return Err(DatasetError::MalformedRow {
                    path: name.to_owned(),
                    row: line,
                    source: e,
                });
            }
        }
    }

    Ok(rows)
}

/// Writes the listings table produced by the scraper.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be created or written.
pub fn write_listings(path: &Path, listings: &[RawListing]) -> Result<(), DatasetError> {
    write_serialized(path, listings)
}

/// Writes the coordinates table produced by the geocoder.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be created or written.
pub fn write_coordinates(path: &Path, rows: &[CoordinatesRow]) -> Result<(), DatasetError> {
    write_serialized(path, rows)
}

/// Writes the enriched dataset.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be created or written.
pub fn write_enriched(path: &Path, listings: &[EnrichedListing]) -> Result<(), DatasetError> {
    let file = create(path)?;
    write_enriched_to(file, listings).map_err(|e| DatasetError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    log::info!("Wrote {} rows to {}", listings.len(), path.display());
    Ok(())
}

/// Writes the enriched dataset to any sink.
///
/// # Errors
///
/// Returns [`csv::Error`] if writing fails.
pub fn write_enriched_to(
    writer: impl Write,
    listings: &[EnrichedListing],
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(EnrichedListing::header())?;
    for listing in listings {
        writer.write_record(listing.to_record())?;
    }
    writer.flush()?;
    Ok(())
}

fn write_serialized<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), DatasetError> {
    let file = create(path)?;
    let csv_err = |e| DatasetError::Csv {
        path: path.display().to_string(),
        source: e,
    };

    let mut writer = csv::Writer::from_writer(file);
    for row in rows {
        writer.serialize(row).map_err(csv_err)?;
    }
    writer.flush().map_err(|e| DatasetError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    log::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

fn create(path: &Path) -> Result<std::fs::File, DatasetError> {
    let io_err = |e| DatasetError::Io {
        path: path.display().to_string(),
        source: e,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::File::create(path).map_err(io_err)
}
