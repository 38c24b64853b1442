//! End-to-end loading scenarios against the SQLite backend.

use orderload_bench::backends::{BulkLoader, LoadOptions, LoadSource, OrderStore, RowInserter};
use orderload_bench::fixtures::{generate_orders, ORDER_COLUMNS};
use orderload_bench::serializer::{serialize, to_csv_bytes, CsvDestination};
use orderload_bench::strategy::{run_strategy, Strategy, StrategyContext};
use orderload_bench::{Error, SqliteStore};

const TABLE: &str = "orders";

struct TestContext {
    store: SqliteStore,
    dir: tempfile::TempDir,
}

impl TestContext {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("orders.db"));
        store.create_table(TABLE).unwrap();
        Self { store, dir }
    }
}

#[test]
fn stream_bulk_load_of_1000_orders() {
    let ctx = TestContext::new();
    let orders = generate_orders(1_000);

    let mut buffer = Vec::new();
    serialize(&orders, CsvDestination::Buffer(&mut buffer)).unwrap();

    let loaded = ctx
        .store
        .bulk_load(
            LoadSource::Stream(buffer.into()),
            TABLE,
            &ORDER_COLUMNS,
            &LoadOptions::default(),
        )
        .unwrap();

    assert_eq!(loaded, 1_000);
    assert_eq!(ctx.store.row_count(TABLE).unwrap(), 1_000);
}

#[test]
fn file_bulk_load_matches_batch_size() {
    let ctx = TestContext::new();
    let path = ctx.dir.path().join("orders.csv");
    let orders = generate_orders(2_500);
    serialize(&orders, CsvDestination::File(&path)).unwrap();

    let loaded = ctx
        .store
        .bulk_load(
            LoadSource::File(path),
            TABLE,
            &ORDER_COLUMNS,
            &LoadOptions::default(),
        )
        .unwrap();

    assert_eq!(loaded, 2_500);
    assert_eq!(ctx.store.row_count(TABLE).unwrap(), 2_500);
}

#[test]
fn row_insert_counts_every_row() {
    let ctx = TestContext::new();
    let orders = generate_orders(400);

    assert_eq!(ctx.store.insert_rows(&orders, TABLE).unwrap(), 400);
    assert_eq!(ctx.store.row_count(TABLE).unwrap(), 400);
}

#[test]
fn row_insert_aborts_on_invalid_row_without_partial_commit() {
    let ctx = TestContext::new();
    let mut orders = generate_orders(200);
    // Outside the CHECK range of order_type.
    orders[100].order_type = -1;

    let err = ctx.store.insert_rows(&orders, TABLE).unwrap_err();

    assert!(matches!(err, Error::Execution(_)), "{:?}", err);
    assert!(err.to_string().contains("row 100"), "{}", err);
    assert_eq!(ctx.store.row_count(TABLE).unwrap(), 0);
}

#[test]
fn empty_batch_is_a_no_op_for_every_strategy() {
    let ctx = TestContext::new();
    let csv_path = ctx.dir.path().join("orders.csv");
    let options = LoadOptions::default();
    let strategy_ctx = StrategyContext {
        table: TABLE,
        csv_path: &csv_path,
        options: &options,
    };

    for strategy in Strategy::ALL {
        let rows = run_strategy(strategy, &ctx.store, &[], &strategy_ctx).unwrap();
        assert_eq!(rows, 0, "{}", strategy);
    }
    assert_eq!(ctx.store.row_count(TABLE).unwrap(), 0);
    assert!(!csv_path.exists());
}

#[test]
fn strategies_load_identical_rows() {
    let ctx = TestContext::new();
    let csv_path = ctx.dir.path().join("orders.csv");
    let options = LoadOptions::default();
    let strategy_ctx = StrategyContext {
        table: TABLE,
        csv_path: &csv_path,
        options: &options,
    };
    let orders = generate_orders(100);

    for strategy in Strategy::ALL {
        ctx.store.truncate(TABLE).unwrap();
        let rows = run_strategy(strategy, &ctx.store, &orders, &strategy_ctx).unwrap();
        assert_eq!(rows, 100, "{}", strategy);
        assert_eq!(ctx.store.row_count(TABLE).unwrap(), 100, "{}", strategy);
    }
}

#[test]
fn unknown_table_is_an_execution_error() {
    let ctx = TestContext::new();
    let err = ctx
        .store
        .bulk_load(
            LoadSource::Stream(to_csv_bytes(&generate_orders(5)).unwrap()),
            "no_such_table",
            &ORDER_COLUMNS,
            &LoadOptions::default(),
        )
        .unwrap_err();

    assert!(matches!(err, Error::Execution(_)), "{:?}", err);
}
