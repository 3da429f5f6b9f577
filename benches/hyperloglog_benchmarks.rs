use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hyperloglog_rs::cardinality::{Format, HllDruid, HyperLogLogClassic};

/// Benchmark: add operations, Classic engine
fn bench_classic_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("classic_add");

    for precision in [10, 12, 14] {
        group.bench_with_input(
            BenchmarkId::new("add", precision),
            &precision,
            |b, &p| {
                let mut hll = HyperLogLogClassic::with_owned_buffer(p).unwrap();
                let mut counter = 0u64;
                b.iter(|| {
                    hll.add(black_box(counter));
                    counter += 1;
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: estimate operations, Classic engine (both estimators)
fn bench_classic_estimate(c: &mut Criterion) {
    let mut group = c.benchmark_group("classic_estimate");

    for (n, precision) in [(1000, 12), (10000, 12), (100000, 14)] {
        let mut hll = HyperLogLogClassic::with_owned_buffer(precision).unwrap();
        for i in 0..n {
            hll.add(i);
        }

        group.bench_with_input(
            BenchmarkId::new("approximate_count_distinct", format!("n={}_p={}", n, precision)),
            &(),
            |b, _| {
                b.iter(|| black_box(hll.approximate_count_distinct()));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("approximate_count_distinct_beta", format!("n={}_p={}", n, precision)),
            &(),
            |b, _| {
                b.iter(|| black_box(hll.approximate_count_distinct_beta()));
            },
        );
    }

    group.finish();
}

/// Benchmark: merge operations, Classic engine
fn bench_classic_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("classic_merge");

    group.bench_function("merge_two", |b| {
        b.iter_batched(
            || {
                let mut a = HyperLogLogClassic::with_owned_buffer(12).unwrap();
                let mut bb = HyperLogLogClassic::with_owned_buffer(12).unwrap();
                for i in 0..5000u64 {
                    a.add(i);
                    bb.add(i + 5000);
                }
                (a, bb)
            },
            |(mut a, bb)| {
                a.merge(&bb).unwrap();
                black_box(a);
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

/// Benchmark: serialization/fold round trip, Classic engine, per wire format
fn bench_classic_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("classic_serialization");

    let mut hll = HyperLogLogClassic::with_owned_buffer(12).unwrap();
    for i in 0..10000u64 {
        hll.add(i);
    }

    for format in [
        Format::Normal,
        Format::Compact6Bits,
        Format::Compact5Bits,
        Format::Compact4Bits,
        Format::Sparse,
    ] {
        let size = hll.serialized_size(format);
        let mut buf = vec![0u8; size];

        group.bench_with_input(BenchmarkId::new("serialize", format!("{:?}", format)), &format, |b, &f| {
            b.iter(|| hll.serialize(f, black_box(&mut buf)));
        });

        hll.serialize(format, &mut buf);
        group.bench_with_input(BenchmarkId::new("fold", format!("{:?}", format)), &format, |b, _| {
            b.iter_batched(
                || HyperLogLogClassic::with_owned_buffer(12).unwrap(),
                |mut peer| {
                    peer.fold(black_box(&buf)).unwrap();
                    black_box(peer);
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark: full pipeline, Classic engine
fn bench_classic_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("classic_pipeline");

    for n in [1000, 10000, 100000] {
        group.bench_with_input(BenchmarkId::new("full_pipeline", n), &n, |b, &n| {
            b.iter(|| {
                let mut hll = HyperLogLogClassic::with_owned_buffer(12).unwrap();
                for i in 0..n {
                    hll.add(i);
                }
                black_box(hll.approximate_count_distinct())
            });
        });
    }

    group.finish();
}

/// Benchmark: add/estimate/fold operations, Druid engine
fn bench_druid(c: &mut Criterion) {
    let mut group = c.benchmark_group("druid");

    group.bench_function("add", |b| {
        let mut druid = HllDruid::with_owned_buffer();
        let mut counter = 0u64;
        b.iter(|| {
            druid.add(black_box(counter));
            counter += 1;
        });
    });

    let mut druid = HllDruid::with_owned_buffer();
    for i in 0..10000u64 {
        druid.add(i);
    }
    group.bench_function("estimate", |b| {
        b.iter(|| black_box(druid.approximate_count_distinct()));
    });

    let mut out = Vec::new();
    druid.serialize(&mut out);
    group.bench_function("fold", |b| {
        b.iter_batched(
            HllDruid::with_owned_buffer,
            |mut peer| {
                peer.fold(black_box(&out)).unwrap();
                black_box(peer);
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_classic_add,
    bench_classic_estimate,
    bench_classic_merge,
    bench_classic_serialization,
    bench_classic_full_pipeline,
    bench_druid,
);

criterion_main!(benches);
