use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Station – categorical label attached at load time
// ---------------------------------------------------------------------------

/// A monitoring station label.  Ordered by label so it can key `BTreeMap`s.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Station(String);

impl Station {
    pub fn new(label: impl Into<String>) -> Self {
        Station(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Station {
    fn from(label: &str) -> Self {
        Station::new(label)
    }
}

// ---------------------------------------------------------------------------
// Timestamp construction
// ---------------------------------------------------------------------------

/// Row-level data-quality problem.  Always absorbed by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("malformed timestamp {year:?}-{month:?}-{day:?} {hour:?}h")]
    MalformedTimestamp {
        year: Option<i64>,
        month: Option<i64>,
        day: Option<i64>,
        hour: Option<i64>,
    },
}

/// Compose a timestamp from the four separate source fields.
///
/// Any absent or out-of-range component (month 13, day 32, hour 25, Feb 30 …)
/// yields [`RowError::MalformedTimestamp`].
pub fn timestamp_from_parts(
    year: Option<i64>,
    month: Option<i64>,
    day: Option<i64>,
    hour: Option<i64>,
) -> Result<NaiveDateTime, RowError> {
    let malformed = || RowError::MalformedTimestamp {
        year,
        month,
        day,
        hour,
    };

    let (Some(y), Some(m), Some(d), Some(h)) = (year, month, day, hour) else {
        return Err(malformed());
    };
    let y = i32::try_from(y).map_err(|_| malformed())?;
    let m = u32::try_from(m).map_err(|_| malformed())?;
    let d = u32::try_from(d).map_err(|_| malformed())?;
    let h = u32::try_from(h).map_err(|_| malformed())?;

    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, 0, 0))
        .ok_or_else(malformed)
}

// ---------------------------------------------------------------------------
// Reading – one station-hour as ingested
// ---------------------------------------------------------------------------

/// One station-hour observation.  `pm25` is `None` when the source cell was
/// empty or `NA`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub station: Station,
    pub timestamp: NaiveDateTime,
    pub pm25: Option<f64>,
}

// ---------------------------------------------------------------------------
// Dataset – combined readings of every configured source
// ---------------------------------------------------------------------------

/// Per-source counters collected while loading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub station: Station,
    pub rows_read: usize,
    pub malformed_timestamps: usize,
    pub unreadable_rows: usize,
    pub missing_measurements: usize,
}

/// The concatenation of every source, in source order then row order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub readings: Vec<Reading>,
    pub reports: Vec<SourceReport>,
}

impl Dataset {
    /// Number of readings (including those without a measurement).
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Readings with a defined PM2.5 value, paired with that value.
    pub fn measured(&self) -> impl Iterator<Item = (&Reading, f64)> {
        self.readings
            .iter()
            .filter_map(|r| r.pm25.filter(|v| v.is_finite()).map(|v| (r, v)))
    }
}

// ---------------------------------------------------------------------------
// Season
// ---------------------------------------------------------------------------

/// Meteorological season of the northern hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Fall];

    /// Numeric bucket `(month % 12) / 3 + 1`: 1 = Winter … 4 = Fall.
    pub fn bucket(month: u32) -> u32 {
        month % 12 / 3 + 1
    }

    /// Season of a calendar month (1–12).  Any month value maps through the
    /// `% 12` bucket, so the result is always defined.
    pub fn from_month(month: u32) -> Season {
        match Season::bucket(month) {
            1 => Season::Winter,
            2 => Season::Spring,
            3 => Season::Summer,
            _ => Season::Fall,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Observation – a measured reading with its calendar attributes
// ---------------------------------------------------------------------------

/// A reading with a defined measurement and the derived `year` / `season`.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub station: Station,
    pub timestamp: NaiveDateTime,
    pub pm25: f64,
    pub year: i32,
    pub season: Season,
}

impl Observation {
    pub fn month(&self) -> u32 {
        self.timestamp.month()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_timestamp_from_valid_parts() {
        let ts = timestamp_from_parts(Some(2013), Some(3), Some(1), Some(23)).unwrap();
        assert_eq!(ts.to_string(), "2013-03-01 23:00:00");
    }

    #[test]
    fn rejects_out_of_range_parts() {
        for (y, m, d, h) in [
            (2013, 13, 1, 0),
            (2013, 0, 1, 0),
            (2013, 1, 32, 0),
            (2013, 1, 1, 25),
            (2013, 1, 1, 24),
            (2014, 2, 29, 0),
            (2013, -1, 1, 0),
        ] {
            let err = timestamp_from_parts(Some(y), Some(m), Some(d), Some(h)).unwrap_err();
            assert!(matches!(err, RowError::MalformedTimestamp { .. }), "{y}-{m}-{d} {h}");
        }
    }

    #[test]
    fn missing_component_is_malformed() {
        assert!(timestamp_from_parts(Some(2013), None, Some(1), Some(0)).is_err());
    }

    #[test]
    fn leap_day_is_valid() {
        assert!(timestamp_from_parts(Some(2016), Some(2), Some(29), Some(0)).is_ok());
    }

    #[test]
    fn season_table() {
        let expected = [
            (Season::Winter, [12, 1, 2]),
            (Season::Spring, [3, 4, 5]),
            (Season::Summer, [6, 7, 8]),
            (Season::Fall, [9, 10, 11]),
        ];
        for month in 1..=12 {
            let matches: Vec<Season> = expected
                .iter()
                .filter(|(_, months)| months.contains(&month))
                .map(|(s, _)| *s)
                .collect();
            assert_eq!(matches, vec![Season::from_month(month)], "month {month}");
        }
    }

    #[test]
    fn buckets_run_one_to_four() {
        let buckets: Vec<u32> = (1..=12).map(Season::bucket).collect();
        assert_eq!(buckets, vec![1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4, 1]);
    }

    #[test]
    fn measured_skips_missing_and_nan() {
        let ts = timestamp_from_parts(Some(2013), Some(1), Some(1), Some(0)).unwrap();
        let station = Station::from("A");
        let ds = Dataset {
            readings: vec![
                Reading { station: station.clone(), timestamp: ts, pm25: Some(4.0) },
                Reading { station: station.clone(), timestamp: ts, pm25: None },
                Reading { station, timestamp: ts, pm25: Some(f64::NAN) },
            ],
            reports: Vec::new(),
        };
        let values: Vec<f64> = ds.measured().map(|(_, v)| v).collect();
        assert_eq!(values, vec![4.0]);
    }
}
