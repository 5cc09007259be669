use std::sync::Arc;

use super::loader::{load_sources, LoadError};
use super::model::Dataset;
use super::sources::SourceConfig;

// ---------------------------------------------------------------------------
// Dataset cache
// ---------------------------------------------------------------------------

/// Holds the combined dataset for the declared input set it was built from.
///
/// `get_or_load` reads the sources at most once per distinct
/// [`SourceConfig`]; asking again with an equal config returns the same
/// `Arc`.  A failed load leaves the cache empty.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entry: Option<(SourceConfig, Arc<Dataset>)>,
    loads: usize,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&mut self, config: &SourceConfig) -> Result<Arc<Dataset>, LoadError> {
        if let Some((key, dataset)) = &self.entry {
            if key == config {
                log::debug!("dataset cache hit ({} readings)", dataset.len());
                return Ok(Arc::clone(dataset));
            }
        }

        log::info!("loading {} sources", config.sources.len());
        self.entry = None;
        self.loads += 1;
        let dataset = Arc::new(load_sources(config)?);
        self.entry = Some((config.clone(), Arc::clone(&dataset)));
        Ok(dataset)
    }

    /// Forget the cached dataset so the next request re-reads the files.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// How many times the sources were actually read.
    pub fn loads(&self) -> usize {
        self.loads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sources::StationSource;

    fn config(dir: &std::path::Path) -> SourceConfig {
        std::fs::write(
            dir.join("a.csv"),
            "year,month,day,hour,PM2.5\n2013,3,1,0,4\n2013,3,1,1,6\n",
        )
        .unwrap();
        SourceConfig {
            data_dir: dir.to_path_buf(),
            sources: vec![StationSource { station: "A".into(), file: "a.csv".into() }],
        }
    }

    #[test]
    fn loads_once_per_config() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let mut cache = DatasetCache::new();

        let first = cache.get_or_load(&cfg).unwrap();
        let second = cache.get_or_load(&cfg.clone()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.loads(), 1);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn reloads_when_inputs_change() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let mut cache = DatasetCache::new();
        cache.get_or_load(&cfg).unwrap();

        let mut relabelled = cfg.clone();
        relabelled.sources[0].station = "B".into();
        let ds = cache.get_or_load(&relabelled).unwrap();
        assert_eq!(cache.loads(), 2);
        assert_eq!(ds.readings[0].station.as_str(), "B");
    }

    #[test]
    fn invalidate_forces_reload() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let mut cache = DatasetCache::new();
        cache.get_or_load(&cfg).unwrap();
        cache.invalidate();
        cache.get_or_load(&cfg).unwrap();
        assert_eq!(cache.loads(), 2);
    }

    #[test]
    fn failed_load_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = SourceConfig {
            data_dir: dir.path().to_path_buf(),
            sources: vec![StationSource { station: "A".into(), file: "missing.csv".into() }],
        };
        let mut cache = DatasetCache::new();
        assert!(cache.get_or_load(&cfg).is_err());
        assert!(cache.get_or_load(&cfg).is_err());
        assert_eq!(cache.loads(), 2);
    }
}
