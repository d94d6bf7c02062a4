//! Performance benchmarks for metrics aggregation
//!
//! End-of-test aggregation sorts every recorded duration, so its cost
//! grows with the main plan's 100k requests.

use books_load_tester::{
    models::{CheckRecord, RequestSample, TrendStats},
    stats::{percentile, MetricsSnapshot, Threshold},
    types::Endpoint,
    TestPlan,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::time::Duration;

/// Durations spread over 5..1005ms
fn sample_durations(count: usize) -> Vec<f64> {
    (0..count).map(|i| 5.0 + ((i * 7919) % 1000) as f64).collect()
}

fn sample_snapshot(count: usize) -> MetricsSnapshot {
    let mut snapshot = MetricsSnapshot::default();
    for i in 0..count {
        let endpoint = if i % 2 == 0 { Endpoint::ListBooks } else { Endpoint::NewBooks };
        let status = if i % 97 == 0 { 500 } else { 200 };
        snapshot.samples.push(RequestSample::completed(
            "main",
            endpoint,
            status,
            Duration::from_millis(5 + ((i * 7919) % 1000) as u64),
        ));
        snapshot.checks.push(CheckRecord {
            name: "status was 200".to_string(),
            scenario: "main".to_string(),
            endpoint,
            passed: status == 200,
        });
    }
    snapshot.iterations.insert("main".to_string(), count as u64);
    snapshot.elapsed = Duration::from_secs(60);
    snapshot
}

fn benchmark_trend_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("trend_stats");

    for size in [1_000, 10_000, 100_000] {
        let values = sample_durations(size);
        group.bench_with_input(BenchmarkId::new("from_values", size), &values, |b, values| {
            b.iter(|| TrendStats::from_values(black_box(values)))
        });

        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        group.bench_with_input(BenchmarkId::new("p99_sorted", size), &sorted, |b, sorted| {
            b.iter(|| percentile(black_box(sorted), black_box(99.0)))
        });
    }

    group.finish();
}

fn benchmark_threshold_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("thresholds");
    let plan = match TestPlan::main() {
        Ok(plan) => plan,
        Err(e) => panic!("main plan: {}", e),
    };

    for size in [10_000, 100_000] {
        let snapshot = sample_snapshot(size);
        group.bench_with_input(BenchmarkId::new("main_plan", size), &snapshot, |b, snapshot| {
            b.iter(|| {
                plan.thresholds
                    .iter()
                    .flat_map(|t| t.evaluate(black_box(snapshot)))
                    .count()
            })
        });

        group.bench_with_input(BenchmarkId::new("endpoint_summaries", size), &snapshot, |b, snapshot| {
            b.iter(|| black_box(snapshot).endpoint_summaries())
        });
    }

    group.bench_function("parse_assignment", |b| {
        b.iter(|| Threshold::from_assignment(black_box("http_req_duration{books:list-books}=p(99)<1000;avg<200")))
    });

    group.finish();
}

criterion_group!(benches, benchmark_trend_stats, benchmark_threshold_evaluation);
criterion_main!(benches);
