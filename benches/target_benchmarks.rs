//! Criterion benchmarks for json_log_target

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use json_log_target::exporters::JsonLinesExporter;
use json_log_target::prelude::*;
use json_log_target::{normalize, RecordFormatter, Redactor};
use serde_json::json;

fn sample_payload() -> serde_json::Value {
    json!({
        "user": {"id": 42, "email": "ann@example.com", "password": "hunter2"},
        "request": {"method": "POST", "path": "/api/orders", "card": "4111111111111111"},
        "items": [1, 2, 3],
    })
}

// ============================================================================
// Normalization Benchmarks
// ============================================================================

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    group.throughput(Throughput::Elements(1));

    let text = Payload::text(sample_payload().to_string());
    let plain = Payload::text("User 42 placed an order");
    let structured = Payload::structured(sample_payload());

    group.bench_function("decode_json_text", |b| {
        b.iter(|| normalize(black_box(&text), true));
    });

    group.bench_function("decode_fallback", |b| {
        b.iter(|| normalize(black_box(&plain), true));
    });

    group.bench_function("structured", |b| {
        b.iter(|| normalize(black_box(&structured), true));
    });

    group.finish();
}

// ============================================================================
// Formatting and Masking Benchmarks
// ============================================================================

fn bench_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("format");
    group.throughput(Throughput::Elements(1));

    let formatter = RecordFormatter::new();
    let record = RawRecord::new(sample_payload(), LogLevel::Info, "app.orders", 1_736_332_245)
        .with_frame("src/orders.rs", 120);

    group.bench_function("format_record", |b| {
        b.iter(|| formatter.format(black_box(&record)));
    });

    let formatted = formatter.format(&record);
    group.bench_function("to_json", |b| {
        b.iter(|| black_box(&formatted).to_json());
    });

    let redactor = Redactor::from_paths([
        "message.user.password",
        "message.request.card",
        "message.absent.path",
    ])
    .unwrap();
    let value = formatted.to_value().unwrap();
    group.bench_function("mask_three_paths", |b| {
        b.iter_batched(
            || value.clone(),
            |mut v| redactor.mask(&mut v),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

// ============================================================================
// Batching Benchmarks
// ============================================================================

fn bench_collect(c: &mut Criterion) {
    let mut group = c.benchmark_group("collect");

    for interval in [1usize, 100, 1000] {
        group.throughput(Throughput::Elements(1));
        group.bench_function(format!("interval_{}", interval), |b| {
            let mut target = JsonTarget::builder()
                .exporter(JsonLinesExporter::new(std::io::sink()))
                .export_interval(interval)
                .mask_vars(["message.user.password"])
                .build()
                .unwrap();

            b.iter(|| {
                let record = RawRecord::new(sample_payload(), LogLevel::Info, "app", 0);
                target.collect(vec![record], false).unwrap();
            });
        });
    }

    group.finish();
}

fn bench_level_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_filtering");

    let mut target = JsonTarget::builder()
        .exporter(JsonLinesExporter::new(std::io::sink()))
        .min_level(LogLevel::Error)
        .build()
        .unwrap();

    group.bench_function("filtered_out", |b| {
        b.iter(|| {
            let record = RawRecord::new("debug noise", LogLevel::Debug, "app", 0);
            target.collect(black_box(vec![record]), false).unwrap();
        });
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_normalize,
    bench_format,
    bench_collect,
    bench_level_filtering
);

criterion_main!(benches);
