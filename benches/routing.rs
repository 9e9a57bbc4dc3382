//! Benchmarks for ranking latency with varying candidate counts.
//!
//! Ranking sits on every request's hot path; it should stay well under a
//! millisecond even with many registered paths.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dualroute::circuit::{CircuitBreaker, CircuitScope};
use dualroute::config::{CircuitBreakerConfig, RoutingConfig};
use dualroute::registry::{Capabilities, Path, ProviderKind};
use dualroute::routing::{DecisionEngine, OperationRequest, Priority, RequiredCapabilities};
use std::sync::Arc;

fn create_path(id: usize) -> Path {
    let provider = if id % 2 == 0 {
        ProviderKind::Direct
    } else {
        ProviderKind::Broker
    };
    Path::new(
        format!("path-{}", id),
        provider,
        "bench",
        Capabilities {
            supports_tools: id % 3 != 0,
            supports_streaming: id % 2 == 0,
            max_tokens: 4096 + (id as u32 * 1024),
        },
        0.5 + (id % 7) as f64 * 0.25,
        200 + (id as u32 * 37) % 1500,
    )
}

fn create_engine() -> (DecisionEngine, Arc<CircuitBreaker>) {
    let circuits = Arc::new(CircuitBreaker::new(CircuitBreakerConfig::default()));
    let engine = DecisionEngine::new(&RoutingConfig::default(), Arc::clone(&circuits));
    (engine, circuits)
}

/// Rank every candidate; no filtering.
fn bench_rank_by_path_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");
    let (engine, _) = create_engine();
    let request = OperationRequest::new("chat").with_priority(Priority::High);

    for count in [2, 10, 50, 200] {
        let paths: Vec<Path> = (0..count).map(create_path).collect();
        group.bench_with_input(BenchmarkId::new("paths", count), &paths, |b, paths| {
            b.iter(|| {
                black_box(engine.rank(&request, paths, None).unwrap());
            });
        });
    }

    group.finish();
}

/// Capability filter drops about a third of the candidates first.
fn bench_rank_with_requirements(c: &mut Criterion) {
    let (engine, _) = create_engine();
    let paths: Vec<Path> = (0..50).map(create_path).collect();
    let request = OperationRequest::new("chat").with_requirements(RequiredCapabilities {
        tools: true,
        streaming: false,
        min_tokens: 8192,
    });

    c.bench_function("rank_filtered_50_paths", |b| {
        b.iter(|| {
            black_box(engine.rank(&request, &paths, None).unwrap());
        });
    });
}

/// Explicit provider order plus a handful of open circuits.
fn bench_decide_with_priority_order(c: &mut Criterion) {
    let (engine, circuits) = create_engine();
    let paths: Vec<Path> = (0..50).map(create_path).collect();
    for id in (0..50).step_by(10) {
        let scope = CircuitScope::path(format!("path-{}", id));
        for _ in 0..5 {
            circuits.record_failure(&scope);
        }
    }
    let order = [ProviderKind::Broker, ProviderKind::Direct];
    let request = OperationRequest::new("chat").with_latency_budget_ms(800);

    c.bench_function("decide_ordered_50_paths_5_open", |b| {
        b.iter(|| {
            black_box(engine.decide(&request, &paths, Some(&order)).unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_rank_by_path_count,
    bench_rank_with_requirements,
    bench_decide_with_priority_order
);
criterion_main!(benches);
