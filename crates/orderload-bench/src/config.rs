//! Store and benchmark configuration.

use std::path::PathBuf;

use crate::backends::LoadOptions;
use crate::fixtures::DEFAULT_SEED;
use crate::strategy::Strategy;

/// Default store host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default MySQL port.
pub const DEFAULT_PORT: u16 = 3306;

/// Default database name.
pub const DEFAULT_DATABASE: &str = "test";

/// Default user.
pub const DEFAULT_USER: &str = "root";

/// Default target table.
pub const DEFAULT_TABLE: &str = "orders";

/// Default path of the CSV artifact written by the file strategy.
pub const DEFAULT_CSV_PATH: &str = "./orders.csv";

/// Batch sizes measured when none are given.
pub const DEFAULT_BATCH_SIZES: [usize; 3] = [1_000, 10_000, 100_000];

/// Default number of unmeasured warm-up iterations.
pub const DEFAULT_WARMUP_ITERATIONS: usize = 1;

/// Default number of measured iterations.
pub const DEFAULT_MEASURED_ITERATIONS: usize = 5;

/// Connection settings for a MySQL-compatible store.
#[derive(Clone)]
pub struct StoreConfig {
    /// Host name or IP address.
    pub host: String,

    /// TCP port.
    pub port: u16,

    /// Database (schema) name.
    pub database: String,

    /// User name.
    pub user: String,

    /// Password, if any.
    pub password: Option<String>,

    /// Whether `LOAD DATA LOCAL INFILE` may be used.
    pub allow_local_infile: bool,
}

impl StoreConfig {
    /// Create a configuration for `host` with defaults for everything else.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            database: DEFAULT_DATABASE.to_string(),
            user: DEFAULT_USER.to_string(),
            password: None,
            allow_local_infile: true,
        }
    }

    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the database name.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set user and password.
    pub fn with_credentials(mut self, user: impl Into<String>, password: Option<String>) -> Self {
        self.user = user.into();
        self.password = password;
        self
    }

    /// Enable or disable local infile bulk loads.
    pub fn with_local_infile(mut self, allow: bool) -> Self {
        self.allow_local_infile = allow;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST)
    }
}

// Keeps the password out of logs.
impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("allow_local_infile", &self.allow_local_infile)
            .finish()
    }
}

/// What the driver measures and how.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Batch sizes, measured in order.
    pub batch_sizes: Vec<usize>,

    /// Strategies run for every batch size, in order.
    pub strategies: Vec<Strategy>,

    /// Unmeasured iterations before measuring.
    pub warmup_iterations: usize,

    /// Measured iterations per configuration.
    pub measured_iterations: usize,

    /// Target table.
    pub table: String,

    /// Path of the CSV artifact for the file strategy.
    pub csv_path: PathBuf,

    /// Seed for order generation.
    pub seed: u64,

    /// Empty the table before every iteration (untimed).
    pub truncate_between_iterations: bool,

    /// Bulk loader terminators and header handling.
    pub load_options: LoadOptions,
}

impl BenchConfig {
    /// Create a configuration with the default batch sizes and all strategies.
    pub fn new() -> Self {
        Self {
            batch_sizes: DEFAULT_BATCH_SIZES.to_vec(),
            strategies: Strategy::ALL.to_vec(),
            warmup_iterations: DEFAULT_WARMUP_ITERATIONS,
            measured_iterations: DEFAULT_MEASURED_ITERATIONS,
            table: DEFAULT_TABLE.to_string(),
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            seed: DEFAULT_SEED,
            truncate_between_iterations: true,
            load_options: LoadOptions::default(),
        }
    }

    /// Set the batch sizes.
    pub fn with_batch_sizes(mut self, sizes: impl Into<Vec<usize>>) -> Self {
        self.batch_sizes = sizes.into();
        self
    }

    /// Set the strategies.
    pub fn with_strategies(mut self, strategies: impl Into<Vec<Strategy>>) -> Self {
        self.strategies = strategies.into();
        self
    }

    /// Set warm-up and measured iteration counts. At least one iteration is measured.
    pub fn with_iterations(mut self, warmup: usize, measured: usize) -> Self {
        self.warmup_iterations = warmup;
        self.measured_iterations = measured.max(1);
        self
    }

    /// Set the target table.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Set the CSV artifact path.
    pub fn with_csv_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.csv_path = path.into();
        self
    }

    /// Set the generator seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Keep rows between iterations instead of truncating.
    pub fn without_truncate(mut self) -> Self {
        self.truncate_between_iterations = false;
        self
    }

    /// Number of configurations (batch size × strategy) this config runs.
    pub fn configuration_count(&self) -> usize {
        self.batch_sizes.len() * self.strategies.len()
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self::new()
    }
}
