use std::collections::BTreeSet;

use super::model::{Observation, Station};

// ---------------------------------------------------------------------------
// Filter predicate: which stations and years are selected
// ---------------------------------------------------------------------------

/// Current multi-select state.  An empty set selects nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub stations: BTreeSet<Station>,
    pub years: BTreeSet<i32>,
}

impl Selection {
    pub fn matches(&self, obs: &Observation) -> bool {
        self.stations.contains(&obs.station) && self.years.contains(&obs.year)
    }
}

/// Sorted unique station labels and years present in the observations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub stations: BTreeSet<Station>,
    pub years: BTreeSet<i32>,
}

impl FilterOptions {
    pub fn from_observations(observations: &[Observation]) -> Self {
        let mut options = FilterOptions::default();
        for obs in observations {
            options.stations.insert(obs.station.clone());
            options.years.insert(obs.year);
        }
        options
    }
}

/// Initialise a [`Selection`] with every option selected (i.e., show everything).
pub fn init_selection(options: &FilterOptions) -> Selection {
    Selection {
        stations: options.stations.clone(),
        years: options.years.clone(),
    }
}

/// Return indices of observations whose station *and* year are selected.
pub fn filtered_indices(observations: &[Observation], selection: &Selection) -> Vec<usize> {
    if selection.stations.is_empty() || selection.years.is_empty() {
        return Vec::new();
    }
    observations
        .iter()
        .enumerate()
        .filter(|(_, obs)| selection.matches(obs))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{timestamp_from_parts, Season};

    fn obs(station: &str, year: i32, pm25: f64) -> Observation {
        Observation {
            station: Station::from(station),
            timestamp: timestamp_from_parts(Some(year as i64), Some(1), Some(1), Some(0)).unwrap(),
            pm25,
            year,
            season: Season::Winter,
        }
    }

    fn apply<'a>(data: &'a [Observation], selection: &Selection) -> Vec<&'a Observation> {
        filtered_indices(data, selection).into_iter().map(|i| &data[i]).collect()
    }

    fn sample() -> Vec<Observation> {
        vec![
            obs("B", 2014, 1.0),
            obs("A", 2013, 2.0),
            obs("C", 2015, 3.0),
            obs("A", 2015, 4.0),
        ]
    }

    #[test]
    fn full_selection_keeps_everything_in_order() {
        let data = sample();
        let selection = init_selection(&FilterOptions::from_observations(&data));
        let kept: Vec<Observation> = apply(&data, &selection).into_iter().cloned().collect();
        assert_eq!(kept, data);
    }

    #[test]
    fn empty_station_or_year_set_selects_nothing() {
        let data = sample();
        let full = init_selection(&FilterOptions::from_observations(&data));

        let no_stations = Selection { stations: BTreeSet::new(), ..full.clone() };
        assert!(apply(&data, &no_stations).is_empty());

        let no_years = Selection { years: BTreeSet::new(), ..full };
        assert!(apply(&data, &no_years).is_empty());
    }

    #[test]
    fn station_and_year_are_conjunctive() {
        let data = sample();
        let selection = Selection {
            stations: [Station::from("A")].into_iter().collect(),
            years: [2015].into_iter().collect(),
        };
        assert_eq!(filtered_indices(&data, &selection), vec![3]);
    }

    #[test]
    fn unknown_values_select_nothing() {
        let data = sample();
        let selection = Selection {
            stations: [Station::from("Z")].into_iter().collect(),
            years: [2013, 2014, 2015].into_iter().collect(),
        };
        assert!(filtered_indices(&data, &selection).is_empty());
    }

    #[test]
    fn options_are_sorted_and_unique() {
        let options = FilterOptions::from_observations(&sample());
        let stations: Vec<&str> = options.stations.iter().map(Station::as_str).collect();
        assert_eq!(stations, vec!["A", "B", "C"]);
        assert_eq!(options.years.into_iter().collect::<Vec<_>>(), vec![2013, 2014, 2015]);
    }
}
