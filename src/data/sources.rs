use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use super::model::Station;

/// Environment variable pointing at a JSON source configuration.
pub const SOURCES_ENV: &str = "AIRQ_SOURCES";
/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "AIRQ_DATA_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read source config {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid source config {}: {}", .path.display(), .source)]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("source config {} declares no sources", .path.display())]
    Empty { path: PathBuf },
}

// ---------------------------------------------------------------------------
// Station → file association
// ---------------------------------------------------------------------------

/// One declared input: every row of `file` is labelled `station`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct StationSource {
    pub station: Station,
    pub file: PathBuf,
}

/// The declared input set of the pipeline.
///
/// JSON form:
/// ```json
/// {
///   "data_dir": "data",
///   "sources": [
///     { "station": "Dingling", "file": "PRSA_Data_Dingling_20130301-20170228.csv" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    pub sources: Vec<StationSource>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

const BUILTIN: &[(&str, &str)] = &[
    ("Dingling", "PRSA_Data_Dingling_20130301-20170228.csv"),
    ("Dongsi", "PRSA_Data_Dongsi_20130301-20170228.csv"),
    ("Gucheng", "PRSA_Data_Gucheng_20130301-20170228.csv"),
    // Tiantan reads the Dongsi file and Wanliu reads the Tiantan file.
    // Kept as shipped; see `shared_paths`.
    ("Tiantan", "PRSA_Data_Dongsi_20130301-20170228.csv"),
    ("Wanliu", "PRSA_Data_Tiantan_20130301-20170228.csv"),
];

impl SourceConfig {
    /// The dashboard's historical station/file associations.
    pub fn builtin() -> Self {
        SourceConfig {
            data_dir: default_data_dir(),
            sources: BUILTIN
                .iter()
                .map(|(station, file)| StationSource {
                    station: Station::from(*station),
                    file: PathBuf::from(file),
                })
                .collect(),
        }
    }

    /// Parse a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SourceConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        if config.sources.is_empty() {
            return Err(ConfigError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(config)
    }

    /// `AIRQ_SOURCES` if set, else the built-in table; `AIRQ_DATA_DIR`
    /// overrides the data directory either way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(SOURCES_ENV) {
            Some(path) => Self::from_json_file(Path::new(&path))?,
            None => Self::builtin(),
        };
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            config = config.with_data_dir(dir);
        }
        Ok(config)
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Resolved path of a source (relative entries are under `data_dir`).
    pub fn resolve(&self, source: &StationSource) -> PathBuf {
        if source.file.is_absolute() {
            source.file.clone()
        } else {
            self.data_dir.join(&source.file)
        }
    }

    /// Files declared for more than one station, with the stations using them.
    pub fn shared_paths(&self) -> BTreeMap<PathBuf, Vec<Station>> {
        let mut by_path: BTreeMap<PathBuf, Vec<Station>> = BTreeMap::new();
        for source in &self.sources {
            by_path
                .entry(self.resolve(source))
                .or_default()
                .push(source.station.clone());
        }
        by_path.retain(|_, stations| stations.len() > 1);
        by_path
    }

    /// Station labels declared more than once.  Their rows are appended, not
    /// merged.
    pub fn duplicate_stations(&self) -> Vec<Station> {
        let mut counts: BTreeMap<&Station, usize> = BTreeMap::new();
        for source in &self.sources {
            *counts.entry(&source.station).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(s, _)| s.clone())
            .collect()
    }

    /// Emit a warning for every association anomaly.
    pub fn log_anomalies(&self) {
        for (path, stations) in self.shared_paths() {
            let labels: Vec<&str> = stations.iter().map(Station::as_str).collect();
            log::warn!("{} is read for several stations: {labels:?}", path.display());
        }
        for station in self.duplicate_stations() {
            log::warn!("station {station} is declared more than once; rows will be appended");
        }
    }
}
