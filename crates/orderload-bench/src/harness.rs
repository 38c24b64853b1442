//! Benchmark driver.
//!
//! Runs every (batch size, strategy) configuration in turn: warm-up
//! iterations first, then measured ones. An iteration generates the batch,
//! serializes it when the strategy needs to, and pushes it to the store, all
//! inside the timed region. The first error ends the configuration and is
//! recorded in the report; the next configuration still runs.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::alloc::AllocationSnapshot;
use crate::backends::OrderStore;
use crate::config::BenchConfig;
use crate::error::{Error, Result};
use crate::fixtures::OrderGenerator;
use crate::report::{BenchmarkResult, Measurement, Outcome, Report, Sample};
use crate::strategy::{run_strategy, Strategy, StrategyContext};

/// Where the driver is in a configuration's lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// Drives benchmark runs against one store.
pub struct Harness<'a> {
    store: &'a dyn OrderStore,
    state: RunState,
}

impl<'a> Harness<'a> {
    /// Create an idle harness for `store`.
    pub fn new(store: &'a dyn OrderStore) -> Self {
        Self {
            store,
            state: RunState::Idle,
        }
    }

    /// Current state. After a configuration finishes this holds its terminal
    /// state until the next one starts; [`Harness::run`] ends in `Idle`.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run every configuration in `config` and collect the results.
    pub fn run(&mut self, config: &BenchConfig) -> Report {
        info!(
            backend = self.store.name(),
            configurations = config.configuration_count(),
            warmup = config.warmup_iterations,
            iterations = config.measured_iterations,
            "starting benchmark run"
        );

        let mut report = Report::new(self.store.name());
        for &batch_size in &config.batch_sizes {
            for &strategy in &config.strategies {
                report
                    .results
                    .push(self.run_configuration(config, strategy, batch_size));
            }
        }

        self.state = RunState::Idle;
        info!(
            configurations = report.results.len(),
            failures = report.failures(),
            "benchmark run complete"
        );
        report
    }

    /// Run one configuration to its terminal state.
    pub fn run_configuration(
        &mut self,
        config: &BenchConfig,
        strategy: Strategy,
        batch_size: usize,
    ) -> BenchmarkResult {
        self.state = RunState::Running;
        info!(%strategy, batch_size, "running configuration");

        let outcome = match self.measure(config, strategy, batch_size) {
            Ok(measurement) => {
                self.state = RunState::Succeeded;
                info!(
                    %strategy,
                    batch_size,
                    mean_ms = measurement.mean.as_secs_f64() * 1000.0,
                    allocated_bytes = measurement.allocated_bytes,
                    "configuration succeeded"
                );
                Outcome::Succeeded(measurement)
            }
            Err((iteration, err)) => {
                self.state = RunState::Failed;
                warn!(%strategy, batch_size, iteration, error = %err, "configuration failed");
                Outcome::Failed {
                    iteration,
                    error: err.to_string(),
                }
            }
        };

        BenchmarkResult {
            strategy,
            batch_size,
            outcome,
        }
    }

    fn measure(
        &self,
        config: &BenchConfig,
        strategy: Strategy,
        batch_size: usize,
    ) -> std::result::Result<Measurement, (usize, Error)> {
        let ctx = StrategyContext {
            table: &config.table,
            csv_path: &config.csv_path,
            options: &config.load_options,
        };
        let mut generator = OrderGenerator::new(config.seed);
        let total = config.warmup_iterations + config.measured_iterations;
        let mut samples = Vec::with_capacity(config.measured_iterations);

        for iteration in 0..total {
            let sample = self
                .iteration(config, strategy, batch_size, &ctx, &mut generator)
                .map_err(|e| (iteration, e))?;

            let warmup = iteration < config.warmup_iterations;
            debug!(
                %strategy,
                batch_size,
                iteration,
                warmup,
                elapsed_ms = sample.elapsed.as_secs_f64() * 1000.0,
                allocated_bytes = sample.allocated_bytes,
                "iteration complete"
            );
            if !warmup {
                samples.push(sample);
            }
        }

        Measurement::from_samples(&samples).ok_or_else(|| {
            (
                total,
                Error::Config("no measured iterations configured".to_string()),
            )
        })
    }

    fn iteration(
        &self,
        config: &BenchConfig,
        strategy: Strategy,
        batch_size: usize,
        ctx: &StrategyContext<'_>,
        generator: &mut OrderGenerator,
    ) -> Result<Sample> {
        if config.truncate_between_iterations {
            self.store.truncate(&config.table)?;
        }

        let allocations = AllocationSnapshot::now();
        let start = Instant::now();

        let orders = generator.generate(batch_size);
        let rows = run_strategy(strategy, self.store, &orders, ctx)?;

        let elapsed = start.elapsed();
        let allocated_bytes = allocations.elapsed().bytes;

        if rows != batch_size as u64 {
            return Err(Error::Format(format!(
                "expected {} rows, store reported {}",
                batch_size, rows
            )));
        }

        Ok(Sample {
            elapsed,
            allocated_bytes,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::SqliteStore;

    fn sqlite_config(dir: &tempfile::TempDir) -> (SqliteStore, BenchConfig) {
        let store = SqliteStore::open(dir.path().join("orders.db"));
        store.create_table("orders").unwrap();
        let config = BenchConfig::new()
            .with_batch_sizes(vec![0, 50])
            .with_iterations(1, 2)
            .with_csv_path(dir.path().join("orders.csv"));
        (store, config)
    }

    #[test]
    fn test_new_harness_is_idle() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = sqlite_config(&dir);
        assert_eq!(Harness::new(&store).state(), RunState::Idle);
    }

    #[test]
    fn test_run_all_strategies() {
        let dir = tempfile::tempdir().unwrap();
        let (store, config) = sqlite_config(&dir);
        let mut harness = Harness::new(&store);

        let report = harness.run(&config);

        assert_eq!(harness.state(), RunState::Idle);
        assert_eq!(report.backend, "sqlite");
        assert_eq!(report.results.len(), 6);
        assert_eq!(report.failures(), 0);

        for strategy in Strategy::ALL {
            let m = report.get(strategy, 50).unwrap().measurement().unwrap();
            assert_eq!(m.iterations, 2);
            assert_eq!(m.rows, 50);

            let empty = report.get(strategy, 0).unwrap().measurement().unwrap();
            assert_eq!(empty.rows, 0);
        }
        // Truncated before each iteration, so only the last batch remains.
        assert_eq!(store.row_count("orders").unwrap(), 50);
    }

    #[test]
    fn test_failed_configuration_does_not_stop_run() {
        let dir = tempfile::tempdir().unwrap();
        let (store, config) = sqlite_config(&dir);
        let config = config.with_table("missing_table").without_truncate();
        let mut harness = Harness::new(&store);

        let result = harness.run_configuration(&config, Strategy::Stream, 10);
        assert_eq!(harness.state(), RunState::Failed);
        match result.outcome {
            Outcome::Failed { iteration, .. } => assert_eq!(iteration, 0),
            other => panic!("expected failure, got {:?}", other),
        }

        let report = harness.run(&config);
        assert_eq!(report.results.len(), 6);
        // Zero-row batches never touch the table.
        assert_eq!(report.failures(), 3);
    }

    #[test]
    fn test_successful_configuration_state() {
        let dir = tempfile::tempdir().unwrap();
        let (store, config) = sqlite_config(&dir);
        let mut harness = Harness::new(&store);

        let result = harness.run_configuration(&config, Strategy::RowInsert, 20);
        assert!(result.succeeded());
        assert_eq!(harness.state(), RunState::Succeeded);
    }
}
