//! Allocation accounting with the counting allocator installed.

use orderload_bench::alloc::{AllocationSnapshot, CountingAllocator};
use orderload_bench::fixtures::generate_orders;
use orderload_bench::serializer::to_csv_bytes;
use orderload_bench::{BenchConfig, Harness, OrderStore, SqliteStore, Strategy};

#[global_allocator]
static GLOBAL: CountingAllocator<std::alloc::System> = CountingAllocator::new(std::alloc::System);

#[test]
fn vec_allocation_is_counted() {
    let before = AllocationSnapshot::now();
    let buffer: Vec<u8> = Vec::with_capacity(1 << 20);
    let delta = before.elapsed();

    assert!(buffer.capacity() >= 1 << 20);
    assert!(delta.bytes >= 1 << 20, "counted {} bytes", delta.bytes);
    assert!(delta.allocations >= 1);
}

#[test]
fn serializing_allocates_at_least_the_payload() {
    let orders = generate_orders(1_000);

    let before = AllocationSnapshot::now();
    let payload = to_csv_bytes(&orders).unwrap();
    let delta = before.elapsed();

    assert!(delta.bytes >= payload.len() as u64);
}

#[test]
fn harness_reports_allocated_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("orders.db"));
    store.create_table("orders").unwrap();
    let config = BenchConfig::new()
        .with_batch_sizes(vec![100])
        .with_iterations(0, 2)
        .with_csv_path(dir.path().join("orders.csv"));

    let report = Harness::new(&store).run(&config);

    assert_eq!(report.failures(), 0, "{}", report.to_table());
    for strategy in Strategy::ALL {
        let measurement = report.get(strategy, 100).unwrap().measurement().unwrap();
        assert!(
            measurement.allocated_bytes > 0,
            "{} reported no allocation",
            strategy
        );
    }
}
