use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::color::StationColors;
use crate::data::aggregate::Aggregates;
use crate::data::cache::DatasetCache;
use crate::data::derive::observations;
use crate::data::filter::{filtered_indices, init_selection, FilterOptions, Selection};
use crate::data::model::{Dataset, Observation, Station};
use crate::data::sources::{ConfigError, SourceConfig};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Declared input set.  `None` when the configured sources could not be
    /// read; nothing is loaded until a config is opened.
    pub config: Option<SourceConfig>,

    /// Owns the combined dataset for `config`.
    pub cache: DatasetCache,

    /// Last successfully loaded dataset.
    pub dataset: Option<Arc<Dataset>>,

    /// Measured readings with year/season, in dataset order.
    pub observations: Vec<Observation>,

    /// Sorted unique stations / years offered by the multi-selects.
    pub options: FilterOptions,

    /// Current multi-select state.
    pub selection: Selection,

    /// Indices of observations passing the current selection (cached).
    pub visible_indices: Vec<usize>,

    /// Aggregates over `visible_indices`.
    pub aggregates: Aggregates,

    pub colors: StationColors,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: SourceConfig) -> Self {
        Self::with_config(Ok(config))
    }

    /// Start from the result of resolving the source config.  A config error
    /// is kept as the status message instead of falling back to other sources.
    pub fn with_config(config: Result<SourceConfig, ConfigError>) -> Self {
        let (config, status_message) = match config {
            Ok(config) => (Some(config), None),
            Err(e) => {
                log::error!("Failed to read source config: {e}");
                (None, Some(format!("Error: {e}")))
            }
        };
        Self {
            config,
            cache: DatasetCache::new(),
            dataset: None,
            observations: Vec::new(),
            options: FilterOptions::default(),
            selection: Selection::default(),
            visible_indices: Vec::new(),
            aggregates: Aggregates::default(),
            colors: StationColors::default(),
            status_message,
        }
    }

    /// Load (or reuse) the dataset for the current config.
    pub fn load(&mut self) {
        let Some(config) = &self.config else {
            return;
        };
        match self.cache.get_or_load(config) {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load sources: {e:#}");
                let prefix = if e.is_source_not_found() {
                    "Missing source"
                } else {
                    "Error"
                };
                self.status_message = Some(format!("{prefix}: {e}"));
            }
        }
    }

    /// Drop the cached dataset and read the sources again.
    pub fn reload(&mut self) {
        self.cache.invalidate();
        self.load();
    }

    /// Replace the source configuration with one read from a JSON file.
    pub fn open_config(&mut self, path: &Path) -> Result<()> {
        let config = SourceConfig::from_json_file(path)
            .with_context(|| format!("opening source config {}", path.display()))?;
        self.config = Some(config);
        self.load();
        Ok(())
    }

    /// Ingest a newly loaded dataset, initialise filters and colours.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        let unchanged = self
            .dataset
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &dataset));
        if unchanged {
            return;
        }

        self.observations = observations(&dataset);
        self.options = FilterOptions::from_observations(&self.observations);
        self.selection = init_selection(&self.options);
        self.colors = StationColors::new(&self.options.stations);
        self.status_message = None;

        log::info!(
            "{} readings loaded, {} with PM2.5, {} stations, {} years",
            dataset.len(),
            self.observations.len(),
            self.options.stations.len(),
            self.options.years.len()
        );
        self.dataset = Some(dataset);
        self.refilter();
    }

    /// Recompute `visible_indices` and the aggregates after a selection change.
    pub fn refilter(&mut self) {
        self.visible_indices = filtered_indices(&self.observations, &self.selection);
        let rows: Vec<&Observation> = self
            .visible_indices
            .iter()
            .map(|&i| &self.observations[i])
            .collect();
        self.aggregates = Aggregates::compute(&rows);
    }

    pub fn toggle_station(&mut self, station: &Station) {
        if !self.selection.stations.remove(station) {
            self.selection.stations.insert(station.clone());
        }
        self.refilter();
    }

    pub fn toggle_year(&mut self, year: i32) {
        if !self.selection.years.remove(&year) {
            self.selection.years.insert(year);
        }
        self.refilter();
    }

    pub fn select_all_stations(&mut self) {
        self.selection.stations = self.options.stations.clone();
        self.refilter();
    }

    pub fn select_no_stations(&mut self) {
        self.selection.stations.clear();
        self.refilter();
    }

    pub fn select_all_years(&mut self) {
        self.selection.years = self.options.years.clone();
        self.refilter();
    }

    pub fn select_no_years(&mut self) {
        self.selection.years.clear();
        self.refilter();
    }

    /// One-line summary of the last load for the top bar.
    pub fn load_summary(&self) -> Option<String> {
        let ds = self.dataset.as_ref()?;
        let malformed: usize = ds
            .reports
            .iter()
            .map(|r| r.malformed_timestamps + r.unreadable_rows)
            .sum();
        let missing: usize = ds.reports.iter().map(|r| r.missing_measurements).sum();
        Some(format!(
            "{} readings ({} without PM2.5, {} malformed dropped), {} visible",
            ds.len(),
            missing,
            malformed,
            self.visible_indices.len()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Season;
    use crate::data::sources::StationSource;

    const HEADER: &str = "No,year,month,day,hour,PM2.5";

    fn state(dir: &Path) -> AppState {
        std::fs::write(
            dir.join("a.csv"),
            [HEADER, "1,2013,1,1,0,10", "2,2013,6,1,0,30", "3,2014,0,1,0,99"].join("\n"),
        )
        .unwrap();
        std::fs::write(dir.join("b.csv"), [HEADER, "1,2013,1,1,0,20"].join("\n")).unwrap();
        std::fs::write(dir.join("c.csv"), [HEADER, "1,2014,1,1,0,NA"].join("\n")).unwrap();

        let config = SourceConfig {
            data_dir: dir.to_path_buf(),
            sources: vec![
                StationSource { station: "A".into(), file: "a.csv".into() },
                StationSource { station: "B".into(), file: "b.csv".into() },
                StationSource { station: "C".into(), file: "c.csv".into() },
            ],
        };
        let mut state = AppState::new(config);
        state.load();
        state
    }

    #[test]
    fn load_selects_everything() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());

        assert!(state.status_message.is_none());
        assert_eq!(state.dataset.as_ref().unwrap().len(), 4);
        assert_eq!(state.observations.len(), 3);
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
        // C's only reading has no PM2.5, so it is not offered at all.
        let stations: Vec<&str> = state.options.stations.iter().map(Station::as_str).collect();
        assert_eq!(stations, vec!["A", "B"]);
        assert_eq!(state.options.years.iter().copied().collect::<Vec<_>>(), vec![2013]);
    }

    #[test]
    fn dropped_rows_never_reach_aggregates() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        let agg = &state.aggregates;

        assert_eq!(agg.by_station.len(), 2);
        assert!(agg.by_station.iter().all(|m| m.station.as_str() != "C"));
        assert!(agg.by_year_station.keys().all(|(y, s)| *y == 2013 && s.as_str() != "C"));
        assert_eq!(agg.by_season_station[&(Season::Summer, Station::from("A"))].mean(), 30.0);
        assert_eq!(agg.by_station[0].mean, 20.0);
    }

    #[test]
    fn toggling_recomputes_aggregates() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state(dir.path());

        state.toggle_station(&Station::from("A"));
        assert_eq!(state.visible_indices, vec![2]);
        assert_eq!(state.aggregates.by_station.len(), 1);

        state.select_no_years();
        assert!(state.visible_indices.is_empty());
        assert!(state.aggregates.is_empty());

        state.select_all_years();
        state.select_all_stations();
        assert_eq!(state.visible_indices.len(), 3);

        state.toggle_year(2013);
        assert!(state.aggregates.by_year_station.is_empty());
    }

    #[test]
    fn reload_reads_sources_again() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state(dir.path());
        state.load();
        assert_eq!(state.cache.loads(), 1);
        state.reload();
        assert_eq!(state.cache.loads(), 2);
    }

    #[test]
    fn config_error_is_shown_and_nothing_loads() {
        let dir = tempfile::tempdir().unwrap();
        let err = SourceConfig::from_json_file(&dir.path().join("missing.json")).unwrap_err();

        let mut state = AppState::with_config(Err(err));
        state.load();
        state.reload();
        assert!(state.config.is_none());
        assert!(state.dataset.is_none());
        assert_eq!(state.cache.loads(), 0);
        let msg = state.status_message.unwrap();
        assert!(msg.starts_with("Error: cannot read source config"), "{msg}");
    }

    #[test]
    fn opening_a_config_recovers_from_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.csv"), [HEADER, "1,2013,1,1,0,10"].join("\n")).unwrap();
        let path = dir.path().join("sources.json");
        std::fs::write(
            &path,
            format!(
                r#"{{ "data_dir": {:?}, "sources": [ {{ "station": "A", "file": "a.csv" }} ] }}"#,
                dir.path().display().to_string()
            ),
        )
        .unwrap();

        let err = SourceConfig::from_json_file(&dir.path().join("missing.json")).unwrap_err();
        let mut state = AppState::with_config(Err(err));
        state.open_config(&path).unwrap();
        assert!(state.status_message.is_none());
        assert_eq!(state.observations.len(), 1);
    }

    #[test]
    fn missing_source_sets_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::new(SourceConfig {
            data_dir: dir.path().to_path_buf(),
            sources: vec![StationSource { station: "A".into(), file: "nope.csv".into() }],
        });
        state.load();
        assert!(state.dataset.is_none());
        assert!(state.status_message.unwrap().contains("not found"));
    }
}
