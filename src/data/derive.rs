use chrono::Datelike;

use super::model::{Dataset, Observation, Reading, Season};

// ---------------------------------------------------------------------------
// Calendar derivation
// ---------------------------------------------------------------------------

/// Attach `year` and `season` to a measured reading.
pub fn derive(reading: &Reading, pm25: f64) -> Observation {
    let ts = reading.timestamp;
    Observation {
        station: reading.station.clone(),
        timestamp: ts,
        pm25,
        year: ts.year(),
        season: Season::from_month(ts.month()),
    }
}

/// Drop readings without a measurement, then derive calendar fields for the
/// remainder.  Order is preserved.
pub fn observations(dataset: &Dataset) -> Vec<Observation> {
    dataset
        .measured()
        .map(|(reading, pm25)| derive(reading, pm25))
        .collect()
}
