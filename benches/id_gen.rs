//! ID generation throughput.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::thread;
use synckit::{snowflake, ObjectId, Snowflake};

fn bench_single_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    let sf = Snowflake::new(snowflake::DEFAULT_EPOCH, 1);
    group.bench_function("Snowflake", |b| b.iter(|| black_box(sf.generate().unwrap())));
    group.bench_function("ObjectId", |b| b.iter(|| black_box(ObjectId::new())));

    group.finish();
}

fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_contended");
    let sf = Snowflake::new(snowflake::DEFAULT_EPOCH, 1);

    for threads in [2usize, 4, 8].iter() {
        group.bench_with_input(BenchmarkId::new("Snowflake", threads), threads, |b, &n| {
            b.iter(|| {
                thread::scope(|s| {
                    for _ in 0..n {
                        s.spawn(|| {
                            for _ in 0..1_000 {
                                black_box(sf.generate().unwrap());
                            }
                        });
                    }
                });
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_thread, bench_contended);
criterion_main!(benches);
