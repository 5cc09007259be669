use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use thiserror::Error;

use super::model::{timestamp_from_parts, Dataset, Reading, RowError, SourceReport, Station};
use super::sources::SourceConfig;

/// Columns every station file must carry.  Names are case-sensitive.
pub const REQUIRED_COLUMNS: [&str; 5] = ["year", "month", "day", "hour", "PM2.5"];

/// Fatal load failure.  Any of these aborts the whole load; no partial
/// dataset is ever returned.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("source for {} not found at {}: {}", .station, .path.display(), .source)]
    SourceNotFound {
        station: Station,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("source for {} at {} is missing required column '{}'", .station, .path.display(), .column)]
    MissingColumn {
        station: Station,
        path: PathBuf,
        column: &'static str,
    },

    #[error("source for {} at {} has an unsupported extension", .station, .path.display())]
    UnsupportedFormat { station: Station, path: PathBuf },

    #[error("{}: {}", .path.display(), .source)]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: parquet error: {}", .path.display(), .source)]
    Parquet {
        path: PathBuf,
        #[source]
        source: parquet::errors::ParquetError,
    },

    #[error("{}: arrow error: {}", .path.display(), .source)]
    Arrow {
        path: PathBuf,
        #[source]
        source: arrow::error::ArrowError,
    },
}

impl LoadError {
    /// True for the "declared input is missing or unusable" class.
    pub fn is_source_not_found(&self) -> bool {
        matches!(
            self,
            LoadError::SourceNotFound { .. }
                | LoadError::MissingColumn { .. }
                | LoadError::UnsupportedFormat { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load every declared source and concatenate them in declaration order.
pub fn load_sources(config: &SourceConfig) -> Result<Dataset, LoadError> {
    config.log_anomalies();

    let mut dataset = Dataset::default();
    for source in &config.sources {
        let path = config.resolve(source);
        let (readings, report) = load_station_file(&path, &source.station)?;
        log::info!(
            "Loaded {} rows for {} from {} ({} malformed timestamps dropped, {} without PM2.5)",
            report.rows_read,
            report.station,
            path.display(),
            report.malformed_timestamps,
            report.missing_measurements
        );
        dataset.readings.extend(readings);
        dataset.reports.push(report);
    }
    Ok(dataset)
}

/// Load one station file.  Dispatch by extension: `.parquet` / `.pq` are read
/// as Parquet, `.csv` / `.txt` (or no extension) as CSV.
pub fn load_station_file(
    path: &Path,
    station: &Station,
) -> Result<(Vec<Reading>, SourceReport), LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let file = File::open(path).map_err(|source| LoadError::SourceNotFound {
        station: station.clone(),
        path: path.to_path_buf(),
        source,
    })?;

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(file, path, station),
        "csv" | "txt" | "" => load_csv(file, path, station),
        _ => Err(LoadError::UnsupportedFormat {
            station: station.clone(),
            path: path.to_path_buf(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Row assembly shared by both formats
// ---------------------------------------------------------------------------

struct RowBuilder<'a> {
    station: &'a Station,
    path: &'a Path,
    readings: Vec<Reading>,
    report: SourceReport,
}

impl<'a> RowBuilder<'a> {
    fn new(station: &'a Station, path: &'a Path) -> Self {
        RowBuilder {
            station,
            path,
            readings: Vec::new(),
            report: SourceReport {
                station: station.clone(),
                ..SourceReport::default()
            },
        }
    }

    fn push(
        &mut self,
        row: usize,
        year: Option<i64>,
        month: Option<i64>,
        day: Option<i64>,
        hour: Option<i64>,
        pm25: Option<f64>,
    ) {
        self.report.rows_read += 1;
        match timestamp_from_parts(year, month, day, hour) {
            Ok(timestamp) => {
                if pm25.filter(|v| v.is_finite()).is_none() {
                    self.report.missing_measurements += 1;
                }
                self.readings.push(Reading {
                    station: self.station.clone(),
                    timestamp,
                    pm25,
                });
            }
            Err(e @ RowError::MalformedTimestamp { .. }) => {
                log::debug!("{} row {row}: dropped, {e}", self.path.display());
                self.report.malformed_timestamps += 1;
            }
        }
    }

    /// A row that could not be read at all (short, ragged, bad encoding).
    fn reject(&mut self, row: usize, reason: &dyn std::fmt::Display) {
        log::debug!("{} row {row}: dropped, {reason}", self.path.display());
        self.report.rows_read += 1;
        self.report.unreadable_rows += 1;
    }

    fn finish(self) -> (Vec<Reading>, SourceReport) {
        if self.report.unreadable_rows > 0 {
            log::warn!(
                "{}: dropped {} unreadable rows",
                self.path.display(),
                self.report.unreadable_rows
            );
        }
        if self.report.malformed_timestamps > 0 {
            log::warn!(
                "{}: dropped {} rows with malformed timestamps",
                self.path.display(),
                self.report.malformed_timestamps
            );
        }
        (self.readings, self.report)
    }
}

fn missing_column(station: &Station, path: &Path, column: &'static str) -> LoadError {
    LoadError::MissingColumn {
        station: station.clone(),
        path: path.to_path_buf(),
        column,
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// One PRSA row.  Unparseable cells (e.g. `NA`) become `None`; extra columns
/// are ignored.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(deserialize_with = "csv::invalid_option")]
    year: Option<i64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    month: Option<i64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    day: Option<i64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    hour: Option<i64>,
    #[serde(rename = "PM2.5", deserialize_with = "csv::invalid_option")]
    pm25: Option<f64>,
}

fn load_csv(
    file: File,
    path: &Path,
    station: &Station,
) -> Result<(Vec<Reading>, SourceReport), LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(file);
    let headers = reader.headers().map_err(csv_err)?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(missing_column(station, path, column));
        }
    }

    let mut rows = RowBuilder::new(station, path);
    for (row_no, result) in reader.deserialize::<CsvRow>().enumerate() {
        match result {
            Ok(row) => rows.push(row_no, row.year, row.month, row.day, row.hour, row.pm25),
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(csv_err(e)),
            Err(e) => rows.reject(row_no, &e),
        }
    }
    Ok(rows.finish())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet station file.
///
/// Integer columns may be stored as any integer or float type; `PM2.5` as any
/// numeric type (or text with `NA`).  Values that do not cast become nulls,
/// which the row builder treats like empty CSV cells.
fn load_parquet(
    file: File,
    path: &Path,
    station: &Station,
) -> Result<(Vec<Reading>, SourceReport), LoadError> {
    let parquet_err = |source| LoadError::Parquet {
        path: path.to_path_buf(),
        source,
    };
    let arrow_err = |source| LoadError::Arrow {
        path: path.to_path_buf(),
        source,
    };

    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(parquet_err)?;
    for column in REQUIRED_COLUMNS {
        if builder.schema().index_of(column).is_err() {
            return Err(missing_column(station, path, column));
        }
    }
    let reader = builder.build().map_err(parquet_err)?;

    let mut rows = RowBuilder::new(station, path);
    let mut offset = 0;

    for batch_result in reader {
        let batch = batch_result.map_err(arrow_err)?;
        let column = |name: &'static str| -> Result<ArrayRef, LoadError> {
            batch
                .column_by_name(name)
                .cloned()
                .ok_or_else(|| missing_column(station, path, name))
        };

        let year = cast(&column("year")?, &DataType::Int64).map_err(arrow_err)?;
        let month = cast(&column("month")?, &DataType::Int64).map_err(arrow_err)?;
        let day = cast(&column("day")?, &DataType::Int64).map_err(arrow_err)?;
        let hour = cast(&column("hour")?, &DataType::Int64).map_err(arrow_err)?;
        let pm25 = cast(&column("PM2.5")?, &DataType::Float64).map_err(arrow_err)?;

        let year = year.as_primitive::<Int64Type>();
        let month = month.as_primitive::<Int64Type>();
        let day = day.as_primitive::<Int64Type>();
        let hour = hour.as_primitive::<Int64Type>();
        let pm25 = pm25.as_primitive::<Float64Type>();

        for row in 0..batch.num_rows() {
            let int_at = |arr: &arrow::array::Int64Array| {
                (!arr.is_null(row)).then(|| arr.value(row))
            };
            let value = (!pm25.is_null(row)).then(|| pm25.value(row));
            rows.push(
                offset + row,
                int_at(year),
                int_at(month),
                int_at(day),
                int_at(hour),
                value,
            );
        }
        offset += batch.num_rows();
    }
    Ok(rows.finish())
}
