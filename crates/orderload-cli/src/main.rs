//! orderload - run the bulk-insert strategy benchmarks.

mod args;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orderload_bench::alloc::{BaseAllocator, CountingAllocator, BASE_ALLOCATOR};
use orderload_bench::{Harness, MySqlStore, OrderStore, SqliteStore};

use crate::args::{Args, Backend, OutputFormat};

#[global_allocator]
static GLOBAL: CountingAllocator<BaseAllocator> = CountingAllocator::new(BASE_ALLOCATOR);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orderload=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let format = args.format;
    let setup_table = args.setup_table;

    let store: Box<dyn OrderStore> = match args.backend {
        Backend::Mysql => Box::new(MySqlStore::new(args.store_config())?),
        Backend::Sqlite => Box::new(SqliteStore::open(args.sqlite_path.clone())),
    };
    let config = args.into_config();

    tracing::info!(
        backend = store.name(),
        table = %config.table,
        csv_path = %config.csv_path.display(),
        "configuration loaded"
    );

    store.ping()?;
    if setup_table {
        store.create_table(&config.table)?;
        tracing::info!(table = %config.table, "table ready");
    }

    let report = Harness::new(&*store).run(&config);

    match format {
        OutputFormat::Table => println!("{}", report.to_table()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    if report.failures() > 0 {
        tracing::error!(failures = report.failures(), "benchmark finished with failures");
        std::process::exit(1);
    }
    Ok(())
}
