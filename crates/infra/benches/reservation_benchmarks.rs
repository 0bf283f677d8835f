use criterion::{Criterion, criterion_group, criterion_main};
use tokio::runtime::Builder;

use logiflow_core::Sku;
use logiflow_infra::{InMemoryStockStore, ReservationEngine};

fn bench_add_stock(c: &mut Criterion) {
    let rt = Builder::new_current_thread().enable_time().build().unwrap();
    let store = InMemoryStockStore::new();
    let engine = ReservationEngine::new(store);
    let sku = Sku::new("BENCH-ADD").unwrap();

    c.bench_function("add_stock", |b| {
        b.iter(|| rt.block_on(engine.add_stock(&sku, 1)).unwrap());
    });
}

fn bench_reserve_stock(c: &mut Criterion) {
    let rt = Builder::new_current_thread().enable_time().build().unwrap();
    let store = InMemoryStockStore::new();
    let engine = ReservationEngine::new(store);
    let sku = Sku::new("BENCH-RESERVE").unwrap();
    rt.block_on(engine.add_stock(&sku, i64::MAX / 2)).unwrap();

    c.bench_function("reserve_stock", |b| {
        b.iter(|| rt.block_on(engine.reserve_stock(&sku, 1)).unwrap());
    });
}

criterion_group!(benches, bench_add_stock, bench_reserve_stock);
criterion_main!(benches);
