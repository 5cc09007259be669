use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::aggregate::Aggregates;
use super::filter::Selection;
use super::model::{Season, Station};

// ---------------------------------------------------------------------------
// JSON export of the current aggregate views
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct StationRecord<'a> {
    pub station: &'a Station,
    pub mean_pm25: f64,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct YearRecord<'a> {
    pub year: i32,
    pub station: &'a Station,
    pub mean_pm25: f64,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct SeasonRecord<'a> {
    pub season: Season,
    pub station: &'a Station,
    pub mean_pm25: f64,
    pub count: usize,
}

/// Records-oriented document, one array per view.
#[derive(Debug, Serialize)]
pub struct AggregateExport<'a> {
    pub stations: Vec<&'a Station>,
    pub years: Vec<i32>,
    pub by_station: Vec<StationRecord<'a>>,
    pub by_year_station: Vec<YearRecord<'a>>,
    pub by_season_station: Vec<SeasonRecord<'a>>,
}

impl<'a> AggregateExport<'a> {
    pub fn new(selection: &'a Selection, aggregates: &'a Aggregates) -> Self {
        AggregateExport {
            stations: selection.stations.iter().collect(),
            years: selection.years.iter().copied().collect(),
            by_station: aggregates
                .by_station
                .iter()
                .map(|m| StationRecord {
                    station: &m.station,
                    mean_pm25: m.mean,
                    count: m.count,
                })
                .collect(),
            by_year_station: aggregates
                .by_year_station
                .iter()
                .map(|((year, station), g)| YearRecord {
                    year: *year,
                    station,
                    mean_pm25: g.mean(),
                    count: g.count(),
                })
                .collect(),
            by_season_station: aggregates
                .by_season_station
                .iter()
                .map(|((season, station), g)| SeasonRecord {
                    season: *season,
                    station,
                    mean_pm25: g.mean(),
                    count: g.count(),
                })
                .collect(),
        }
    }
}

/// Write the aggregates as pretty-printed JSON.
pub fn write_json(path: &Path, selection: &Selection, aggregates: &Aggregates) -> Result<()> {
    let doc = AggregateExport::new(selection, aggregates);
    let text = serde_json::to_string_pretty(&doc).context("serialising aggregates")?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Exported aggregates to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::derive::derive;
    use crate::data::filter::{filtered_indices, init_selection, FilterOptions};
    use crate::data::model::{timestamp_from_parts, Observation, Reading};

    #[test]
    fn writes_records_for_each_view() {
        let data: Vec<Observation> = [("A", 1, 10.0), ("A", 6, 30.0), ("B", 1, 20.0)]
            .into_iter()
            .map(|(s, m, v)| {
                let reading = Reading {
                    station: Station::from(s),
                    timestamp: timestamp_from_parts(Some(2013), Some(m), Some(1), Some(0)).unwrap(),
                    pm25: Some(v),
                };
                derive(&reading, v)
            })
            .collect();
        let selection = init_selection(&FilterOptions::from_observations(&data));
        let rows: Vec<&Observation> = filtered_indices(&data, &selection)
            .into_iter()
            .map(|i| &data[i])
            .collect();
        let aggregates = Aggregates::compute(&rows);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agg.json");
        write_json(&path, &selection, &aggregates).unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["stations"], serde_json::json!(["A", "B"]));
        assert_eq!(doc["by_station"].as_array().unwrap().len(), 2);
        assert_eq!(doc["by_year_station"][0]["year"], 2013);
        assert_eq!(doc["by_season_station"][0]["season"], "Winter");
        assert_eq!(doc["by_season_station"].as_array().unwrap().len(), 3);
    }
}
