//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use orderload_bench::config::{
    DEFAULT_BATCH_SIZES, DEFAULT_CSV_PATH, DEFAULT_DATABASE, DEFAULT_HOST,
    DEFAULT_MEASURED_ITERATIONS, DEFAULT_PORT, DEFAULT_TABLE, DEFAULT_USER,
    DEFAULT_WARMUP_ITERATIONS,
};
use orderload_bench::{BenchConfig, StoreConfig, Strategy};

/// Store the benchmark runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// MySQL server, bulk loads via LOAD DATA LOCAL INFILE.
    Mysql,
    /// Local SQLite file, bulk loads emulated in one transaction.
    Sqlite,
}

/// Report rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Compare CSV file, stream and row-by-row loading of synthetic orders.
#[derive(Parser, Debug)]
#[command(name = "orderload")]
#[command(version, about = "Bulk-insert strategy benchmark")]
pub struct Args {
    /// Store to benchmark.
    #[arg(long, value_enum, default_value = "mysql")]
    pub backend: Backend,

    /// MySQL host.
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// MySQL port.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// MySQL database.
    #[arg(long, default_value = DEFAULT_DATABASE)]
    pub database: String,

    /// MySQL user.
    #[arg(long, default_value = DEFAULT_USER)]
    pub user: String,

    /// MySQL password.
    #[arg(long, env = "ORDERLOAD_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Refuse LOAD DATA LOCAL INFILE. Bulk-load strategies then fail.
    #[arg(long)]
    pub no_local_infile: bool,

    /// SQLite database file, for `--backend sqlite`.
    #[arg(long, default_value = "./orderload.db")]
    pub sqlite_path: PathBuf,

    /// Target table.
    #[arg(long, default_value = DEFAULT_TABLE)]
    pub table: String,

    /// Where the CSV file strategy writes its artifact.
    #[arg(long, default_value = DEFAULT_CSV_PATH)]
    pub csv_path: PathBuf,

    /// Comma-separated batch sizes.
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_BATCH_SIZES)]
    pub batch_sizes: Vec<usize>,

    /// Comma-separated strategies.
    #[arg(long, value_delimiter = ',', default_values_t = Strategy::ALL)]
    pub strategies: Vec<Strategy>,

    /// Untimed iterations before measuring.
    #[arg(long, default_value_t = DEFAULT_WARMUP_ITERATIONS)]
    pub warmup: usize,

    /// Measured iterations per configuration.
    #[arg(long, default_value_t = DEFAULT_MEASURED_ITERATIONS)]
    pub iterations: usize,

    /// Keep rows between iterations instead of truncating.
    #[arg(long)]
    pub no_truncate: bool,

    /// Create the target table if it does not exist.
    #[arg(long)]
    pub setup_table: bool,

    /// Report format.
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

impl Args {
    /// Connection settings for the MySQL backend.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.host.clone())
            .with_port(self.port)
            .with_database(self.database.clone())
            .with_credentials(self.user.clone(), self.password.clone())
            .with_local_infile(!self.no_local_infile)
    }

    /// Convert command-line arguments to a benchmark configuration.
    pub fn into_config(self) -> BenchConfig {
        let config = BenchConfig::new()
            .with_batch_sizes(self.batch_sizes)
            .with_strategies(self.strategies)
            .with_iterations(self.warmup, self.iterations)
            .with_table(self.table)
            .with_csv_path(self.csv_path);

        if self.no_truncate {
            config.without_truncate()
        } else {
            config
        }
    }
}
