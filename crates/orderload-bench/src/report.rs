//! Benchmark results and their renderings.

use std::time::Duration;

use comfy_table::{Cell, Table};
use serde::{Serialize, Serializer};

use crate::strategy::Strategy;

/// Timing and allocation of one measured iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    pub elapsed: Duration,
    pub allocated_bytes: u64,
    pub rows: u64,
}

/// Aggregate over the measured iterations of a configuration.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Measurement {
    pub iterations: usize,
    /// Rows written per iteration.
    pub rows: u64,
    #[serde(serialize_with = "as_millis")]
    pub mean: Duration,
    #[serde(serialize_with = "as_millis")]
    pub min: Duration,
    #[serde(serialize_with = "as_millis")]
    pub max: Duration,
    /// Mean bytes allocated per iteration.
    pub allocated_bytes: u64,
}

impl Measurement {
    /// Aggregate `samples`. Returns `None` for an empty slice.
    pub fn from_samples(samples: &[Sample]) -> Option<Self> {
        let first = samples.first()?;
        let count = samples.len();

        let total: Duration = samples.iter().map(|s| s.elapsed).sum();
        let allocated: u64 = samples.iter().map(|s| s.allocated_bytes).sum();

        Some(Self {
            iterations: count,
            rows: first.rows,
            mean: total / count as u32,
            min: samples.iter().map(|s| s.elapsed).min().unwrap_or_default(),
            max: samples.iter().map(|s| s.elapsed).max().unwrap_or_default(),
            allocated_bytes: allocated / count as u64,
        })
    }

    /// Rows per second at the mean elapsed time.
    pub fn throughput(&self) -> f64 {
        let secs = self.mean.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.rows as f64 / secs
        }
    }
}

/// How a configuration ended.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Succeeded(Measurement),
    Failed {
        /// Zero-based iteration that failed, counting warm-up iterations.
        iteration: usize,
        error: String,
    },
}

/// Result of one strategy at one batch size.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BenchmarkResult {
    pub strategy: Strategy,
    pub batch_size: usize,
    pub outcome: Outcome,
}

impl BenchmarkResult {
    /// Whether the configuration completed every iteration.
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, Outcome::Succeeded(_))
    }

    /// The measurement, if the configuration succeeded.
    pub fn measurement(&self) -> Option<&Measurement> {
        match &self.outcome {
            Outcome::Succeeded(m) => Some(m),
            Outcome::Failed { .. } => None,
        }
    }
}

/// Every result of a harness run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Report {
    pub backend: String,
    pub results: Vec<BenchmarkResult>,
}

impl Report {
    /// Create an empty report for `backend`.
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            results: Vec::new(),
        }
    }

    /// Number of failed configurations.
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.succeeded()).count()
    }

    /// Look up the result for a configuration.
    pub fn get(&self, strategy: Strategy, batch_size: usize) -> Option<&BenchmarkResult> {
        self.results
            .iter()
            .find(|r| r.strategy == strategy && r.batch_size == batch_size)
    }

    /// Render as an ASCII table.
    pub fn to_table(&self) -> String {
        let mut table = Table::new();
        table.set_header(vec![
            "Strategy",
            "Batch size",
            "Status",
            "Mean",
            "Min",
            "Max",
            "Rows/s",
            "Allocated",
        ]);

        for result in &self.results {
            let mut row = vec![
                Cell::new(result.strategy),
                Cell::new(result.batch_size),
            ];
            match &result.outcome {
                Outcome::Succeeded(m) => {
                    row.push(Cell::new("ok"));
                    row.push(Cell::new(format_duration(m.mean)));
                    row.push(Cell::new(format_duration(m.min)));
                    row.push(Cell::new(format_duration(m.max)));
                    row.push(Cell::new(format!("{:.0}", m.throughput())));
                    row.push(Cell::new(format_bytes(m.allocated_bytes)));
                }
                Outcome::Failed { iteration, error } => {
                    row.push(Cell::new(format!("failed at iteration {}", iteration)));
                    row.push(Cell::new(error));
                }
            }
            table.add_row(row);
        }

        table.to_string()
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}

fn format_duration(duration: Duration) -> String {
    format!("{:.2} ms", duration.as_secs_f64() * 1000.0)
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ms: u64, bytes: u64) -> Sample {
        Sample {
            elapsed: Duration::from_millis(ms),
            allocated_bytes: bytes,
            rows: 1_000,
        }
    }

    fn report() -> Report {
        let measurement =
            Measurement::from_samples(&[sample(10, 1_000), sample(30, 3_000)]).unwrap();
        Report {
            backend: "sqlite".to_string(),
            results: vec![
                BenchmarkResult {
                    strategy: Strategy::Stream,
                    batch_size: 1_000,
                    outcome: Outcome::Succeeded(measurement),
                },
                BenchmarkResult {
                    strategy: Strategy::RowInsert,
                    batch_size: 1_000,
                    outcome: Outcome::Failed {
                        iteration: 2,
                        error: "execution error: row 500".to_string(),
                    },
                },
            ],
        }
    }

    #[test]
    fn test_measurement_from_samples() {
        let m = Measurement::from_samples(&[sample(10, 100), sample(20, 300), sample(30, 200)])
            .unwrap();
        assert_eq!(m.iterations, 3);
        assert_eq!(m.rows, 1_000);
        assert_eq!(m.mean, Duration::from_millis(20));
        assert_eq!(m.min, Duration::from_millis(10));
        assert_eq!(m.max, Duration::from_millis(30));
        assert_eq!(m.allocated_bytes, 200);
        assert!((m.throughput() - 50_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_measurement_empty() {
        assert!(Measurement::from_samples(&[]).is_none());
    }

    #[test]
    fn test_report_failures_and_lookup() {
        let report = report();
        assert_eq!(report.failures(), 1);
        assert!(report.get(Strategy::Stream, 1_000).unwrap().succeeded());
        assert!(report.get(Strategy::RowInsert, 1_000).unwrap().measurement().is_none());
        assert!(report.get(Strategy::CsvFile, 1_000).is_none());
    }

    #[test]
    fn test_report_table() {
        let table = report().to_table();
        assert!(table.contains("stream"));
        assert!(table.contains("20.00 ms"));
        assert!(table.contains("1.95 KB"));
        assert!(table.contains("failed at iteration 2"));
    }

    #[test]
    fn test_report_json() {
        let json: serde_json::Value = serde_json::from_str(&report().to_json().unwrap()).unwrap();
        let results = json["results"].as_array().unwrap();

        assert_eq!(json["backend"], "sqlite");
        assert_eq!(results[0]["strategy"], "stream");
        assert_eq!(results[0]["outcome"]["status"], "succeeded");
        assert!((results[0]["outcome"]["mean"].as_f64().unwrap() - 20.0).abs() < 1e-9);
        assert_eq!(results[1]["outcome"]["status"], "failed");
        assert_eq!(results[1]["outcome"]["iteration"], 2);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MB");
    }
}
