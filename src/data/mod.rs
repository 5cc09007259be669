/// Data layer: configuration, loading, derivation, filtering and aggregation.
///
/// Architecture:
/// ```text
///   SourceConfig  (station → file)
///        │
///        ▼
///   ┌──────────────┐
///   │ DatasetCache  │  at most one load per distinct config
///   │   └ loader    │  csv / parquet → Readings, tagged by station
///   └──────────────┘
///        │  Dataset (Vec<Reading>)
///        ▼
///   ┌──────────┐
///   │  derive   │  drop missing PM2.5, add year + season
///   └──────────┘
///        │  Vec<Observation>
///        ▼
///   ┌──────────┐
///   │  filter   │  station ∈ S  ∧  year ∈ Y  → indices
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  by_station / by_year_station / by_season_station
///   └───────────┘
/// ```

pub mod aggregate;
pub mod cache;
pub mod derive;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod sources;
