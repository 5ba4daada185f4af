use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use highstand::Buffer;

const SIZES: [usize; 3] = [64, 4096, 65536];

fn benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_write_read");
    for size in SIZES {
        let payload = vec![0xABu8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("roundtrip", size), &payload, |b, payload| {
            b.iter(|| {
                let mut buf = Buffer::new(size);
                let mut sink = vec![0u8; size];
                buf.write(payload);
                buf.read(&mut sink);
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
