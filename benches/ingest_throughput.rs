//! Throughput benchmark for the ingestion pipeline (spec §4.1 performance
//! contract, §8 property 15: >= 58,333 rows/sec median, <=10% variance).

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ohlcv_engine::{ingest, Cadence, IngestMode, NoopProgressSink, RawBatch, RawColumn, RawTimestamp};

fn clean_batch(rows: usize) -> RawBatch {
    let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let timestamps: Vec<_> = (0..rows)
        .map(|i| RawTimestamp::Utc(base + chrono::Duration::minutes(i as i64)))
        .collect();
    let close: Vec<f64> = (0..rows).map(|i| 100.0 + (i as f64 * 0.001).sin()).collect();

    RawBatch::new()
        .with_column("timestamp", RawColumn::Timestamp(timestamps))
        .with_column("open", RawColumn::F64(close.clone()))
        .with_column("high", RawColumn::F64(close.iter().map(|c| c + 0.1).collect()))
        .with_column("low", RawColumn::F64(close.iter().map(|c| c - 0.1).collect()))
        .with_column("close", RawColumn::F64(close))
        .with_column("volume", RawColumn::F64(vec![500.0; rows]))
}

fn benchmark_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest_columnar");
    group.sample_size(10);

    for rows in [10_000usize, 100_000, 1_000_000] {
        let batch = clean_batch(rows);
        let cadence = Cadence::minutes(1).unwrap();
        group.throughput(criterion::Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &batch, |b, batch| {
            b.iter_batched(
                || batch.clone(),
                |batch| {
                    let mut sink = NoopProgressSink;
                    black_box(ingest(batch, cadence, IngestMode::Columnar, false, &mut sink).unwrap())
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn benchmark_ingest_with_downcast(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest_downcast");
    group.sample_size(10);

    let rows = 100_000;
    let batch = clean_batch(rows);
    let cadence = Cadence::minutes(1).unwrap();
    group.throughput(criterion::Throughput::Elements(rows as u64));
    group.bench_function("downcast_enabled", |b| {
        b.iter_batched(
            || batch.clone(),
            |batch| {
                let mut sink = NoopProgressSink;
                black_box(ingest(batch, cadence, IngestMode::Columnar, true, &mut sink).unwrap())
            },
            criterion::BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(benches, benchmark_ingest, benchmark_ingest_with_downcast);
criterion_main!(benches);
