use gbcore_common::bench::generate_data;
use gbcore_hashing::{crc32::crc32, sha256::sha256};
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

fn benchmark_hashing(c: &mut Criterion) {
    let data = generate_data(10_000_000_usize);

    let mut group = c.benchmark_group("hashing");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("crc32", |b| {
        b.iter(|| {
            let encoded = crc32(black_box(&data));
            black_box(encoded);
        })
    });

    group.bench_function("sha256", |b| {
        b.iter(|| {
            let encoded = sha256(black_box(&data));
            black_box(encoded);
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_hashing);
criterion_main!(benches);
