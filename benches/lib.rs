use criterion::{criterion_group, criterion_main, Criterion};
use gmetric::protocol::{encode_metadata, encode_value};
use gmetric::{GmetricClient, MetricIdentity, NopMetricSink, Registry, Slope, ValueType};
use std::hint::black_box;

fn new_identity(name: &str) -> MetricIdentity {
    MetricIdentity::new("web01.example.com", name, ValueType::Double, "requests/sec", Slope::Both)
        .unwrap()
        .with_tmax(60)
}

fn benchmark_encoder(c: &mut Criterion) {
    let id = new_identity("http_requests");

    c.bench_function("encode_metadata", |b| b.iter(|| encode_metadata(black_box(&id))));
    c.bench_function("encode_value", |b| b.iter(|| encode_value(black_box(&id), black_box("1234.5"))));
}

fn benchmark_registry(c: &mut Criterion) {
    let registry = Registry::new(GmetricClient::from_sink(NopMetricSink), 5);
    let metrics: Vec<_> = (0..100)
        .map(|i| registry.register(new_identity(&format!("metric_{}", i)), i % 2 == 0))
        .collect();

    c.bench_function("registry_tick_100_metrics", |b| {
        b.iter(|| {
            for m in &metrics {
                m.increment(1.5).unwrap();
            }
            registry.tick()
        })
    });

    c.bench_function("metric_incr_double", |b| b.iter(|| metrics[0].incr()));
}

criterion_group!(benches, benchmark_encoder, benchmark_registry);

criterion_main!(benches);
