use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, Duration, NaiveDate, Timelike};
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One synthetic station-hour.
struct Row {
    year: i64,
    month: i64,
    day: i64,
    hour: i64,
    pm25: Option<f64>,
    pm10: Option<f64>,
}

/// Hourly PM2.5 with a winter peak, a diurnal cycle, log-normal noise and
/// about 2% gaps, 2013-03-01 00:00 → 2017-02-28 23:00.
fn generate_station(base: f64, rng: &mut SimpleRng) -> Vec<Row> {
    let start = NaiveDate::from_ymd_opt(2013, 3, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid start date");
    let end = NaiveDate::from_ymd_opt(2017, 3, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid end date");

    let mut rows = Vec::new();
    let mut ts = start;
    while ts < end {
        let doy = ts.ordinal() as f64;
        let seasonal = 1.0 + 0.6 * (2.0 * std::f64::consts::PI * (doy + 10.0) / 365.25).cos();
        let diurnal = 1.0 + 0.2 * (2.0 * std::f64::consts::PI * (ts.hour() as f64 - 21.0) / 24.0).cos();
        let trend = 1.0 - 0.05 * (ts.year() - 2013) as f64;
        let value = base * seasonal * diurnal * trend * rng.gauss(0.0, 0.35).exp();

        let missing = rng.next_f64() < 0.02;
        rows.push(Row {
            year: ts.year() as i64,
            month: ts.month() as i64,
            day: ts.day() as i64,
            hour: ts.hour() as i64,
            pm25: (!missing).then(|| value.max(2.0).round()),
            pm10: (!missing).then(|| (value * 1.3).max(3.0).round()),
        });
        ts += Duration::hours(1);
    }
    rows
}

fn write_csv(path: &Path, station: &str, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["No", "year", "month", "day", "hour", "PM2.5", "PM10", "station"])?;
    let na = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_else(|| "NA".to_string());
    for (i, row) in rows.iter().enumerate() {
        writer.write_record([
            (i + 1).to_string(),
            row.year.to_string(),
            row.month.to_string(),
            row.day.to_string(),
            row.hour.to_string(),
            na(row.pm25),
            na(row.pm10),
            station.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, station: &str, rows: &[Row]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("year", DataType::Int64, false),
        Field::new("month", DataType::Int64, false),
        Field::new("day", DataType::Int64, false),
        Field::new("hour", DataType::Int64, false),
        Field::new("PM2.5", DataType::Float64, true),
        Field::new("PM10", DataType::Float64, true),
        Field::new("station", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.year))),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.month))),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.day))),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.hour))),
            Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.pm25))),
            Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.pm10))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|_| station))),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let parquet = std::env::args().any(|a| a == "--parquet");
    let out_dir = Path::new("data");
    std::fs::create_dir_all(out_dir).context("creating data directory")?;

    let mut rng = SimpleRng::new(42);
    let stations = [
        ("Dingling", 65.0),
        ("Dongsi", 85.0),
        ("Gucheng", 82.0),
        ("Tiantan", 80.0),
        ("Wanliu", 82.0),
    ];

    for (station, base) in stations {
        let rows = generate_station(base, &mut rng);
        let stem = format!("PRSA_Data_{station}_20130301-20170228");

        let csv_path = out_dir.join(format!("{stem}.csv"));
        write_csv(&csv_path, station, &rows)?;
        println!("Wrote {} rows to {}", rows.len(), csv_path.display());

        if parquet {
            let pq_path = out_dir.join(format!("{stem}.parquet"));
            write_parquet(&pq_path, station, &rows)?;
            println!("Wrote {} rows to {}", rows.len(), pq_path.display());
        }
    }
    Ok(())
}
