//! The normalized core dataset produced by ingestion.
//!
//! `CoreFrame` is a struct-of-arrays: each field is a contiguous column, not
//! a `Vec<CoreBar>`. Stage functions in [`crate::gapfill`], [`crate::hash`]
//! and the built-in indicators ([`crate::indicator`]) all operate on the
//! column slices directly — there is no per-row object in the hot path.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// One OHLCV observation. Only materialized by [`crate::iter::CoreFrameIter`]
/// and in test fixtures; never the pipeline's internal representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoreBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub is_gap: bool,
}

/// The canonical column order. `CoreFrame::columns()` returns this; every
/// external representation (hashing, polars export) iterates in this order.
pub const CORE_COLUMNS: [&str; 7] = [
    "timestamp", "open", "high", "low", "close", "volume", "is_gap",
];

/// The expected inter-bar interval. Must be strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence(Duration);

impl Cadence {
    /// Infallible constructor for callers who already know the duration is
    /// positive (tests, internal helpers).
    pub fn from_duration(d: Duration) -> Option<Self> {
        if d > Duration::zero() {
            Some(Self(d))
        } else {
            None
        }
    }

    /// Fallible constructor matching `ingest`'s own validation: a cadence
    /// must be a strictly positive duration (spec §4.1, `InvalidCadence`).
    pub fn try_new(d: Duration) -> Result<Self, crate::error::IngestError> {
        Self::from_duration(d).ok_or(crate::error::IngestError::InvalidCadence {
            value_millis: d.num_milliseconds(),
        })
    }

    pub fn minutes(n: i64) -> Option<Self> {
        Self::from_duration(Duration::minutes(n))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub(crate) fn as_millis(&self) -> i64 {
        self.0.num_milliseconds()
    }
}

/// Whether a column's 64-bit storage was downcast to 32-bit precision on
/// export. Internal arithmetic always happens in `f64`; this only affects
/// what [`CoreFrame::to_polars`] emits and what [`crate::metrics::IngestionMetrics`]
/// reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricePrecision {
    F64,
    F32,
}

/// The normalized, gap-marked, chronologically ordered core dataset.
///
/// Invariants (enforced by construction — only [`crate::ingest::ingest`] and
/// test helpers build these):
/// - `timestamps` is strictly increasing with no duplicates.
/// - every timestamp lies on the cadence grid the frame was built with.
/// - for every row where `is_gap[i]` is true: `open[i] == high[i] == low[i]
///   == close[i]` and that value equals the previous row's `close`, and
///   `volume[i] == 0.0`.
#[derive(Debug, Clone)]
pub struct CoreFrame {
    timestamps: Vec<DateTime<Utc>>,
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<f64>,
    is_gap: Vec<bool>,
    precision: PricePrecision,
}

impl CoreFrame {
    /// Builds a frame from already-validated, already-gap-filled columns.
    /// Only called by [`crate::gapfill::fill`] and tests; does not
    /// re-validate invariants (callers are trusted to have checked them).
    pub(crate) fn from_columns(
        timestamps: Vec<DateTime<Utc>>,
        open: Vec<f64>,
        high: Vec<f64>,
        low: Vec<f64>,
        close: Vec<f64>,
        volume: Vec<f64>,
        is_gap: Vec<bool>,
    ) -> Self {
        debug_assert_eq!(timestamps.len(), open.len());
        debug_assert_eq!(timestamps.len(), high.len());
        debug_assert_eq!(timestamps.len(), low.len());
        debug_assert_eq!(timestamps.len(), close.len());
        debug_assert_eq!(timestamps.len(), volume.len());
        debug_assert_eq!(timestamps.len(), is_gap.len());
        debug_assert!(timestamps.windows(2).all(|w| w[0] < w[1]));
        Self {
            timestamps,
            open,
            high,
            low,
            close,
            volume,
            is_gap,
            precision: PricePrecision::F64,
        }
    }

    /// Empty frame (used for the empty-input case of ingestion).
    pub fn empty() -> Self {
        Self {
            timestamps: Vec::new(),
            open: Vec::new(),
            high: Vec::new(),
            low: Vec::new(),
            close: Vec::new(),
            volume: Vec::new(),
            is_gap: Vec::new(),
            precision: PricePrecision::F64,
        }
    }

    pub fn columns() -> &'static [&'static str; 7] {
        &CORE_COLUMNS
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn open(&self) -> &[f64] {
        &self.open
    }

    pub fn high(&self) -> &[f64] {
        &self.high
    }

    pub fn low(&self) -> &[f64] {
        &self.low
    }

    pub fn close(&self) -> &[f64] {
        &self.close
    }

    pub fn volume(&self) -> &[f64] {
        &self.volume
    }

    pub fn is_gap(&self) -> &[bool] {
        &self.is_gap
    }

    pub fn precision(&self) -> PricePrecision {
        self.precision
    }

    pub(crate) fn set_precision(&mut self, precision: PricePrecision) {
        self.precision = precision;
    }

    pub fn row(&self, index: usize) -> Option<CoreBar> {
        if index >= self.len() {
            return None;
        }
        Some(CoreBar {
            timestamp: self.timestamps[index],
            open: self.open[index],
            high: self.high[index],
            low: self.low[index],
            close: self.close[index],
            volume: self.volume[index],
            is_gap: self.is_gap[index],
        })
    }

    /// A byte-equal deep copy. Used by the enrichment engine to build a
    /// working frame without ever mutating `self`.
    pub fn deep_clone(&self) -> Self {
        self.clone()
    }
}

impl fmt::Display for CoreFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CoreFrame({} rows)", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(i: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + i * 60, 0).unwrap()
    }

    #[test]
    fn columns_are_canonical_order() {
        assert_eq!(
            CoreFrame::columns(),
            &["timestamp", "open", "high", "low", "close", "volume", "is_gap"]
        );
    }

    #[test]
    fn empty_frame_has_zero_rows() {
        let frame = CoreFrame::empty();
        assert_eq!(frame.len(), 0);
        assert!(frame.is_empty());
    }

    #[test]
    fn row_materializes_a_core_bar() {
        let frame = CoreFrame::from_columns(
            vec![ts(0), ts(1)],
            vec![1.0, 1.1],
            vec![1.2, 1.2],
            vec![0.9, 1.0],
            vec![1.1, 1.15],
            vec![10.0, 20.0],
            vec![false, false],
        );
        let bar = frame.row(1).unwrap();
        assert_eq!(bar.close, 1.15);
        assert!(frame.row(2).is_none());
    }
}
