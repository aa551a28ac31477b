use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rand::Rng;

use flatcache::{FlatMap, MapConfig};

const INSERT_COUNT: u64 = 1000;
const MAX_BUCKETS: u32 = 4096;

fn keys(count: u64) -> Vec<Vec<u8>> {
    (0..count).map(|i| format!("key-{i}").into_bytes()).collect()
}

fn fresh_map() -> FlatMap {
    FlatMap::init(MapConfig::new().max_buckets(MAX_BUCKETS).record_kv_size(16)).unwrap()
}

fn bench_insert(c: &mut Criterion) {
    let keys = keys(INSERT_COUNT);
    let mut group = c.benchmark_group("insert");
    group.throughput(Throughput::Elements(INSERT_COUNT));

    group.bench_function("ordered insert", |b| {
        b.iter(|| {
            let map = fresh_map();
            for key in &keys {
                map.insert(black_box(key), b"value").unwrap();
            }
        });
    });

    group.bench_function("random order insert", |b| {
        let mut rng = rand::thread_rng();
        b.iter(|| {
            let map = fresh_map();
            let mut shuffled = keys.clone();
            for i in (1..shuffled.len()).rev() {
                let j = rng.gen_range(0..=i);
                shuffled.swap(i, j);
            }
            for key in &shuffled {
                map.insert(black_box(key), b"value").unwrap();
            }
        });
    });

    group.finish();
}

fn bench_overwrite(c: &mut Criterion) {
    let keys = keys(INSERT_COUNT);
    let map = fresh_map();
    for key in &keys {
        map.insert(key, b"value").unwrap();
    }

    let mut group = c.benchmark_group("overwrite");
    group.throughput(Throughput::Elements(INSERT_COUNT));
    group.bench_function("same-size overwrite", |b| {
        b.iter(|| {
            for key in &keys {
                map.insert(black_box(key), b"VALUE").unwrap();
            }
        });
    });
    group.finish();
}

fn bench_delete(c: &mut Criterion) {
    let keys = keys(INSERT_COUNT);

    let mut group = c.benchmark_group("delete");
    group.throughput(Throughput::Elements(INSERT_COUNT));
    group.bench_function("sequential delete", |b| {
        b.iter(|| {
            let map = fresh_map();
            for key in &keys {
                map.insert(key, b"value").unwrap();
            }
            for key in &keys {
                map.delete(black_box(key)).unwrap();
            }
        });
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_overwrite, bench_delete);
criterion_main!(benches);
