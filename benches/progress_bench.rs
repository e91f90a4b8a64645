//! Benchmarks for progress reporting
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use std::thread;

use mimic_tts::progress::{ProgressOutput, ProgressReporter, ProgressSink, ReporterOptions};

/// Benchmark single-threaded increments while the render thread runs
fn bench_increment(c: &mut Criterion) {
    let reporter = ProgressReporter::new(ReporterOptions::default(), ProgressOutput::Hidden);
    reporter.start();

    c.bench_function("increment", |b| b.iter(|| reporter.increment(black_box(1))));

    reporter.stop();
}

/// Benchmark increments through the sink trait object
fn bench_sink_dispatch(c: &mut Criterion) {
    let reporter = ProgressReporter::hidden();
    reporter.start();
    let sink: &dyn ProgressSink = &reporter;

    c.bench_function("sink_on_progress", |b| b.iter(|| sink.on_progress(black_box(1))));

    reporter.stop();
}

/// Benchmark contended increments from several threads
fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_increment");
    for threads in [2usize, 4, 8] {
        group.bench_with_input(BenchmarkId::new("threads", threads), &threads, |b, &threads| {
            b.iter(|| {
                let reporter = Arc::new(ProgressReporter::hidden());
                reporter.start();
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let reporter = Arc::clone(&reporter);
                        thread::spawn(move || {
                            for _ in 0..1000 {
                                reporter.increment(1);
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    let _ = handle.join();
                }
                reporter.stop();
                black_box(reporter.units())
            })
        });
    }
    group.finish();
}

/// Benchmark a full start/stop cycle
fn bench_lifecycle(c: &mut Criterion) {
    c.bench_function("start_stop", |b| {
        b.iter(|| {
            let reporter = ProgressReporter::hidden();
            reporter.start();
            reporter.increment(1);
            black_box(reporter.stop())
        })
    });
}

criterion_group!(
    benches,
    bench_increment,
    bench_sink_dispatch,
    bench_contended,
    bench_lifecycle,
);
criterion_main!(benches);
