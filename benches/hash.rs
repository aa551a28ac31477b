use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use flatcache::region::buckets::djb2;

const KEY_SIZES: [usize; 4] = [4, 16, 64, 256];

fn bench_djb2(c: &mut Criterion) {
    let mut group = c.benchmark_group("djb2");
    for &size in &KEY_SIZES {
        let key = vec![b'k'; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &key, |b, key| {
            b.iter(|| djb2(black_box(key)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_djb2);
criterion_main!(benches);
