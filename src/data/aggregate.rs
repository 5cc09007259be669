use std::collections::BTreeMap;

use super::model::{Observation, Season, Station};

// ---------------------------------------------------------------------------
// Running mean
// ---------------------------------------------------------------------------

/// Sum and count of one group.  Only ever created from a value, so the mean
/// is always defined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupMean {
    sum: f64,
    count: usize,
}

impl GroupMean {
    fn new(value: f64) -> Self {
        GroupMean { sum: value, count: 1 }
    }

    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

fn group_by<'a, K, I>(rows: I, key: impl Fn(&Observation) -> K) -> BTreeMap<K, GroupMean>
where
    K: Ord,
    I: IntoIterator<Item = &'a Observation>,
{
    let mut groups: BTreeMap<K, GroupMean> = BTreeMap::new();
    for obs in rows {
        groups
            .entry(key(obs))
            .and_modify(|g| g.push(obs.pm25))
            .or_insert_with(|| GroupMean::new(obs.pm25));
    }
    groups
}

// ---------------------------------------------------------------------------
// The three views
// ---------------------------------------------------------------------------

/// Mean PM2.5 of one station.
#[derive(Debug, Clone, PartialEq)]
pub struct StationMean {
    pub station: Station,
    pub mean: f64,
    pub count: usize,
}

/// Per-station means, ascending by mean.  Ties keep label order.
pub fn by_station<'a>(rows: impl IntoIterator<Item = &'a Observation>) -> Vec<StationMean> {
    let mut means: Vec<StationMean> = group_by(rows, |o| o.station.clone())
        .into_iter()
        .map(|(station, g)| StationMean {
            station,
            mean: g.mean(),
            count: g.count(),
        })
        .collect();
    // stable: BTreeMap already yields label order
    means.sort_by(|a, b| a.mean.total_cmp(&b.mean));
    means
}

/// Mean PM2.5 per (year, station).
pub fn by_year_station<'a>(
    rows: impl IntoIterator<Item = &'a Observation>,
) -> BTreeMap<(i32, Station), GroupMean> {
    group_by(rows, |o| (o.year, o.station.clone()))
}

/// Mean PM2.5 per (season, station).  Keyed by the named season, recomputed
/// from the timestamp so every reading of the same calendar season lands in
/// the same group.
pub fn by_season_station<'a>(
    rows: impl IntoIterator<Item = &'a Observation>,
) -> BTreeMap<(Season, Station), GroupMean> {
    group_by(rows, |o| (Season::from_month(o.month()), o.station.clone()))
}

/// All three views computed over the same filtered rows.
#[derive(Debug, Clone, Default)]
pub struct Aggregates {
    pub by_station: Vec<StationMean>,
    pub by_year_station: BTreeMap<(i32, Station), GroupMean>,
    pub by_season_station: BTreeMap<(Season, Station), GroupMean>,
}

impl Aggregates {
    pub fn compute(rows: &[&Observation]) -> Self {
        Aggregates {
            by_station: by_station(rows.iter().copied()),
            by_year_station: by_year_station(rows.iter().copied()),
            by_season_station: by_season_station(rows.iter().copied()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_station.is_empty()
    }
}
