//! Orderload Benchmark Suite
//!
//! Compares three ways of loading synthetic orders into a MySQL-compatible store:
//!
//! - **CSV file**: write the batch to a CSV file and hand its path to the bulk loader
//! - **Stream**: write the batch to an in-memory buffer and stream it to the bulk loader
//! - **Row insert**: one parameterized INSERT per row through a reused prepared statement
//!
//! Each strategy is timed across batch sizes, with allocated bytes reported
//! alongside wall-clock time.

pub mod alloc;
pub mod backends;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod harness;
pub mod report;
pub mod serializer;
pub mod strategy;

pub use backends::{
    BulkLoader, LoadOptions, LoadSource, MySqlStore, OrderStore, RowInserter, SqliteStore,
};
pub use config::{BenchConfig, StoreConfig};
pub use error::{Error, Result};
pub use fixtures::{generate_orders, Amount, Order, OrderFields, OrderGenerator, ORDER_COLUMNS};
pub use harness::{Harness, RunState};
pub use report::{BenchmarkResult, Measurement, Outcome, Report};
pub use serializer::{parse_orders, serialize, to_csv_bytes, write_orders, CsvDestination};
pub use strategy::{run_strategy, Strategy, StrategyContext};
