//! Boundary conversion to `polars::frame::DataFrame` (spec §6 extension).
//!
//! This is the only file in the crate that touches `polars`. The internal
//! pipeline (`ingest`, `enrich`) works entirely on the plain `Vec<f64>` /
//! `Vec<DateTime<Utc>>` columns in [`crate::frame::CoreFrame`]; this module
//! exists purely so a caller that wants a `DataFrame` for downstream
//! analysis (joins, groupby, parquet export) doesn't have to hand-roll the
//! conversion. Confining the dependency here bounds the blast radius of a
//! polars API change to one file instead of the whole engine.

use polars::prelude::*;

use crate::enrich::EnrichedFrame;
use crate::frame::CoreFrame;

/// Converts a [`CoreFrame`] to a `DataFrame` with the canonical core column
/// order and names. Timestamps are emitted as i64 UTC nanoseconds since
/// epoch under `timestamp`; downstream consumers that want a polars
/// `Datetime` dtype can cast it.
pub fn to_polars(frame: &CoreFrame) -> PolarsResult<DataFrame> {
    let timestamp_ns: Vec<i64> = frame
        .timestamps()
        .iter()
        .map(|ts| ts.timestamp_nanos_opt().unwrap_or(i64::MIN))
        .collect();

    DataFrame::new(vec![
        Series::new("timestamp".into(), timestamp_ns).into(),
        Series::new("open".into(), frame.open().to_vec()).into(),
        Series::new("high".into(), frame.high().to_vec()).into(),
        Series::new("low".into(), frame.low().to_vec()).into(),
        Series::new("close".into(), frame.close().to_vec()).into(),
        Series::new("volume".into(), frame.volume().to_vec()).into(),
        Series::new("is_gap".into(), frame.is_gap().to_vec()).into(),
    ])
}

/// Converts an [`EnrichedFrame`] to a `DataFrame`: the core columns plus one
/// column per successfully computed indicator, in application order.
pub fn enriched_to_polars(frame: &EnrichedFrame) -> PolarsResult<DataFrame> {
    let mut df = to_polars(&frame.core)?;
    for name in frame.indicator_columns() {
        let values = frame
            .column(name)
            .expect("indicator_columns() names must be present")
            .to_vec();
        df.with_column(Series::new(name.into(), values))?;
    }
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(i: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + i * 60, 0).unwrap()
    }

    #[test]
    fn to_polars_preserves_row_count_and_columns() {
        let frame = CoreFrame::from_columns(
            vec![ts(0), ts(1)],
            vec![1.0, 1.1],
            vec![1.2, 1.2],
            vec![0.9, 1.0],
            vec![1.1, 1.15],
            vec![10.0, 20.0],
            vec![false, false],
        );
        let df = to_polars(&frame).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(
            df.get_column_names(),
            vec!["timestamp", "open", "high", "low", "close", "volume", "is_gap"]
        );
    }
}
