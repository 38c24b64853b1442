//! Loading strategy benchmarks.
//!
//! Runs every strategy at each default batch size against SQLite, and
//! against MySQL when `ORDERLOAD_MYSQL_HOST` is set. Each iteration starts
//! from an empty table; generation and serialization are part of the
//! measured work.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use orderload_bench::backends::{LoadOptions, OrderStore};
use orderload_bench::config::{StoreConfig, DEFAULT_BATCH_SIZES};
use orderload_bench::fixtures::OrderGenerator;
use orderload_bench::strategy::{run_strategy, Strategy, StrategyContext};
use orderload_bench::{MySqlStore, SqliteStore};

const TABLE: &str = "orders";

fn bench_store(c: &mut Criterion, group_name: &str, store: &dyn OrderStore) {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("orders.csv");
    let options = LoadOptions::default();
    let ctx = StrategyContext {
        table: TABLE,
        csv_path: &csv_path,
        options: &options,
    };

    store.create_table(TABLE).unwrap();

    for strategy in Strategy::ALL {
        let mut group = c.benchmark_group(format!("{}/{}", group_name, strategy));
        group.sample_size(10);

        for size in DEFAULT_BATCH_SIZES {
            group.bench_with_input(BenchmarkId::new(strategy.name(), size), &size, |b, &size| {
                let mut generator = OrderGenerator::default();
                b.iter_batched(
                    || store.truncate(TABLE).unwrap(),
                    |_| {
                        let orders = generator.generate(size);
                        black_box(run_strategy(strategy, store, &orders, &ctx).unwrap())
                    },
                    BatchSize::PerIteration,
                );
            });
        }

        group.finish();
    }
}

fn bench_sqlite(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("orders.db"));
    bench_store(c, "sqlite", &store);
}

fn bench_mysql(c: &mut Criterion) {
    let Ok(host) = std::env::var("ORDERLOAD_MYSQL_HOST") else {
        return;
    };

    let mut config = StoreConfig::new(host);
    if let Some(port) = std::env::var("ORDERLOAD_MYSQL_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
    {
        config = config.with_port(port);
    }
    if let Ok(database) = std::env::var("ORDERLOAD_MYSQL_DATABASE") {
        config = config.with_database(database);
    }
    if let Ok(user) = std::env::var("ORDERLOAD_MYSQL_USER") {
        config = config.with_credentials(user, std::env::var("ORDERLOAD_MYSQL_PASSWORD").ok());
    }

    let store = MySqlStore::new(config).unwrap();
    bench_store(c, "mysql", &store);
}

criterion_group!(benches, bench_sqlite, bench_mysql);
criterion_main!(benches);
