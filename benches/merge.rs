use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use watch_progress::model::{completion_percent, merge, Interval};

/// A viewing session with lots of seeking: short overlapping ranges in a scrambled order.
fn session(len: usize) -> Vec<Interval> {
    (0..len)
        .map(|i| {
            let start = ((i * 7919) % len) as f64 * 3.0;
            Interval::new(start, start + 4.5).unwrap()
        })
        .collect()
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for len in [10, 100, 1_000, 10_000] {
        let intervals = session(len);

        group.bench_with_input(BenchmarkId::from_parameter(len), &intervals, |b, intervals| {
            b.iter(|| merge(black_box(intervals.iter().copied())))
        });
    }

    group.finish();
}

fn bench_percent(c: &mut Criterion) {
    let merged = merge(session(1_000));
    let duration = 3_000.0;

    c.bench_function("completion_percent", |b| {
        b.iter(|| completion_percent(black_box(&merged), black_box(duration)))
    });
}

criterion_group!(benches, bench_merge, bench_percent);
criterion_main!(benches);
