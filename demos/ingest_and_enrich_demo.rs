//! End-to-end demo: build a raw batch, ingest it, then enrich the result
//! with the built-in indicators.
//!
//! Run with:
//!   cargo run --example ingest_and_enrich_demo

use chrono::{TimeZone, Utc};
use ohlcv_engine::{
    enrich, ingest, Cadence, EnrichmentRequest, IndicatorRegistry, IngestMode, NoopProgressSink,
    RawBatch, RawColumn, RawTimestamp,
};

fn synthetic_batch(rows: usize) -> RawBatch {
    let timestamps: Vec<_> = (0..rows)
        // Row 3 is skipped to exercise the gap filler in the demo output.
        .filter(|&i| i != 3)
        .map(|i| RawTimestamp::Utc(Utc.timestamp_opt(1_700_000_000 + i as i64 * 60, 0).unwrap()))
        .collect();
    let n = timestamps.len();
    let close: Vec<f64> = (0..n).map(|i| 100.0 + (i as f64 * 0.05).sin()).collect();

    RawBatch::new()
        .with_column("timestamp", RawColumn::Timestamp(timestamps))
        .with_column("open", RawColumn::F64(close.clone()))
        .with_column("high", RawColumn::F64(close.iter().map(|c| c + 0.25).collect()))
        .with_column("low", RawColumn::F64(close.iter().map(|c| c - 0.25).collect()))
        .with_column("close", RawColumn::F64(close))
        .with_column("volume", RawColumn::F64(vec![1_000.0; n]))
}

fn main() {
    tracing_subscriber::fmt::init();

    let batch = synthetic_batch(20);
    let cadence = Cadence::minutes(1).expect("1 minute is a valid cadence");

    let mut sink = NoopProgressSink;
    let (output, metrics) = ingest(batch, cadence, IngestMode::Columnar, true, &mut sink)
        .expect("demo batch is well-formed");
    let core = output.into_frame().expect("columnar mode always returns a frame");

    println!("=== Ingestion ===");
    println!("rows_in:            {}", metrics.rows_in);
    println!("rows_out:           {}", metrics.rows_out);
    println!("gaps_inserted:      {}", metrics.gaps_inserted);
    println!("duplicates_removed: {}", metrics.duplicates_removed);
    println!(
        "throughput:         {:.0} rows/sec",
        metrics.throughput_rows_per_sec
    );
    println!("backend_tag:        {:?}", metrics.backend_tag);
    println!("downcast_applied:   {}", metrics.downcast_applied);

    let registry = IndicatorRegistry::init();
    let request = EnrichmentRequest::new(
        vec!["ema".to_string(), "atr".to_string(), "stoch_rsi".to_string()],
        true,
    );

    let mut sink = NoopProgressSink;
    let enriched =
        enrich(&core, &request, &registry, &mut sink).expect("built-ins compute over this frame");

    println!("\n=== Enrichment ===");
    println!("indicators_applied: {:?}", enriched.indicators_applied);
    println!("failed_indicators:  {:?}", enriched.failed_indicators);
    if let Some(ema) = enriched.column("ema") {
        let tail: Vec<f64> = ema.iter().rev().take(3).rev().copied().collect();
        println!("ema (last 3):       {:?}", tail);
    }
}
