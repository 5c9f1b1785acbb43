//! Schema validation (§4.1 pipeline stages 1–2): required columns present,
//! correctly typed, and UTC-qualified.

use std::collections::HashMap;

use crate::error::IngestError;
use crate::timestamp::RawTimestamp;

/// One column of a raw input batch, as produced by an (out-of-scope) input
/// adapter. Untyped at the Rust level on purpose — an adapter may hand the
/// engine a column of the wrong type, and the schema validator exists to
/// catch that at the ingestion boundary rather than let it panic downstream.
#[derive(Debug, Clone)]
pub enum RawColumn {
    F64(Vec<f64>),
    I64(Vec<i64>),
    Bool(Vec<bool>),
    Utf8(Vec<String>),
    Timestamp(Vec<RawTimestamp>),
}

impl RawColumn {
    fn type_name(&self) -> &'static str {
        match self {
            Self::F64(_) => "f64",
            Self::I64(_) => "i64",
            Self::Bool(_) => "bool",
            Self::Utf8(_) => "utf8",
            Self::Timestamp(_) => "timestamp",
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::F64(v) => v.len(),
            Self::I64(v) => v.len(),
            Self::Bool(v) => v.len(),
            Self::Utf8(v) => v.len(),
            Self::Timestamp(v) => v.len(),
        }
    }
}

/// The raw columnar batch handed to [`crate::ingest::ingest`] by an input
/// adapter. Columns beyond the required six are carried along but never
/// inspected — "extra columns are ignored" (spec §4.1 stage 1).
#[derive(Debug, Clone, Default)]
pub struct RawBatch {
    columns: HashMap<String, RawColumn>,
}

pub const REQUIRED_COLUMNS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

impl RawBatch {
    pub fn new() -> Self {
        Self {
            columns: HashMap::new(),
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, column: RawColumn) -> Self {
        self.columns.insert(name.into(), column);
        self
    }

    pub fn column(&self, name: &str) -> Option<&RawColumn> {
        self.columns.get(name)
    }

    /// Row count, taken from the `timestamp` column if present, else zero.
    pub fn row_count(&self) -> usize {
        self.columns.get("timestamp").map(RawColumn::len).unwrap_or(0)
    }
}

/// Stage 1: required columns present and numerically typed.
pub fn check_schema(batch: &RawBatch) -> Result<(), IngestError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| batch.column(c).is_none())
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns {
            missing,
            expected: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        });
    }

    match batch.column("timestamp") {
        Some(RawColumn::Timestamp(_)) => {}
        Some(other) => {
            return Err(IngestError::InvalidColumnType {
                column: "timestamp".to_string(),
                expected: "timestamp",
                actual: other.type_name(),
            })
        }
        None => unreachable!("presence already checked above"),
    }

    for numeric in ["open", "high", "low", "close", "volume"] {
        match batch.column(numeric) {
            Some(RawColumn::F64(_)) | Some(RawColumn::I64(_)) => {}
            Some(other) => {
                return Err(IngestError::InvalidColumnType {
                    column: numeric.to_string(),
                    expected: "numeric",
                    actual: other.type_name(),
                })
            }
            None => unreachable!("presence already checked above"),
        }
    }

    Ok(())
}

/// Stage 2: every timestamp is UTC-qualified. Returns up to `sample_limit`
/// offenders for the error payload (spec: "at least one sample").
pub fn check_utc(batch: &RawBatch, sample_limit: usize) -> Result<(), IngestError> {
    let Some(RawColumn::Timestamp(timestamps)) = batch.column("timestamp") else {
        unreachable!("check_schema must run before check_utc")
    };

    let sample_offenders: Vec<_> = timestamps
        .iter()
        .filter_map(RawTimestamp::offending_kind)
        .take(sample_limit)
        .collect();

    if sample_offenders.is_empty() {
        Ok(())
    } else {
        Err(IngestError::NonUtcTimestamps { sample_offenders })
    }
}

/// A fully-typed numeric column extracted after schema/UTC checks pass.
fn to_f64(column: &RawColumn) -> Vec<f64> {
    match column {
        RawColumn::F64(v) => v.clone(),
        RawColumn::I64(v) => v.iter().map(|&i| i as f64).collect(),
        _ => unreachable!("caller must validate numeric type first"),
    }
}

/// Extracts the six required columns into plain vectors, assuming
/// `check_schema`/`check_utc` already passed.
pub(crate) fn extract_columns(
    batch: &RawBatch,
) -> (Vec<chrono::DateTime<chrono::Utc>>, Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>) {
    let Some(RawColumn::Timestamp(raw_ts)) = batch.column("timestamp") else {
        unreachable!()
    };
    let timestamps = raw_ts
        .iter()
        .map(|t| t.as_utc().expect("UTC check already passed"))
        .collect();

    let open = to_f64(batch.column("open").unwrap());
    let high = to_f64(batch.column("high").unwrap());
    let low = to_f64(batch.column("low").unwrap());
    let close = to_f64(batch.column("close").unwrap());
    let volume = to_f64(batch.column("volume").unwrap());

    (timestamps, open, high, low, close, volume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::RawTimestamp;
    use chrono::{TimeZone, Utc};

    fn valid_batch(n: usize) -> RawBatch {
        let ts: Vec<_> = (0..n)
            .map(|i| RawTimestamp::Utc(Utc.timestamp_opt(1_700_000_000 + i as i64 * 60, 0).unwrap()))
            .collect();
        RawBatch::new()
            .with_column("timestamp", RawColumn::Timestamp(ts))
            .with_column("open", RawColumn::F64(vec![1.0; n]))
            .with_column("high", RawColumn::F64(vec![1.0; n]))
            .with_column("low", RawColumn::F64(vec![1.0; n]))
            .with_column("close", RawColumn::F64(vec![1.0; n]))
            .with_column("volume", RawColumn::F64(vec![1.0; n]))
    }

    #[test]
    fn missing_columns_are_reported() {
        let batch = RawBatch::new().with_column(
            "timestamp",
            RawColumn::Timestamp(vec![RawTimestamp::Utc(Utc.timestamp_opt(0, 0).unwrap())]),
        );
        let err = check_schema(&batch).unwrap_err();
        match err {
            IngestError::MissingColumns { missing, .. } => {
                assert_eq!(missing.len(), 5);
            }
            _ => panic!("expected MissingColumns"),
        }
    }

    #[test]
    fn wrong_type_is_reported() {
        let batch = valid_batch(2).with_column("volume", RawColumn::Utf8(vec!["x".into(), "y".into()]));
        let err = check_schema(&batch).unwrap_err();
        assert!(matches!(err, IngestError::InvalidColumnType { column, .. } if column == "volume"));
    }

    #[test]
    fn clean_batch_passes_both_checks() {
        let batch = valid_batch(5);
        check_schema(&batch).unwrap();
        check_utc(&batch, 5).unwrap();
    }

    #[test]
    fn non_utc_timestamps_are_rejected() {
        use chrono::FixedOffset;
        let offset = FixedOffset::east_opt(3600).unwrap();
        let batch = valid_batch(1).with_column(
            "timestamp",
            RawColumn::Timestamp(vec![RawTimestamp::FixedOffset(
                offset.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            )]),
        );
        let err = check_utc(&batch, 5).unwrap_err();
        assert!(matches!(err, IngestError::NonUtcTimestamps { .. }));
    }
}
