//! Deterministic core-hash utility (spec §4.5).
//!
//! `core_hash` digests a frame's columns in canonical order, incorporating
//! column names and dtypes alongside the binary representation of values —
//! two frames with the same data but different internal layout hash
//! identically. NaN bit patterns are canonicalized first so a NaN column
//! hashes deterministically regardless of which NaN payload produced it.

use sha2::{Digest, Sha256};

use crate::frame::CoreFrame;

/// Canonical NaN bit pattern used before hashing any `f64` column. Without
/// this, two semantically-equal NaN values with different payload bits
/// would hash differently.
const CANONICAL_NAN_BITS: u64 = 0x7ff8_0000_0000_0000;

fn canonical_bits(v: f64) -> u64 {
    if v.is_nan() {
        CANONICAL_NAN_BITS
    } else {
        v.to_bits()
    }
}

/// Which of the core columns to include in a [`core_hash`] call. The core
/// pipeline always hashes all seven; [`crate::enrich`] uses this to compare
/// only the original core columns of an enriched frame against the
/// pre-enrichment hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashedColumns {
    /// `timestamp, open, high, low, close, volume, is_gap`.
    All,
}

/// Digests `frame`'s columns into a 32-byte SHA-256 hash, hex-encoded.
///
/// The digest incorporates, in order: a version tag, each column's name,
/// each column's logical dtype, and then its values. Column order is always
/// [`crate::frame::CORE_COLUMNS`] — never the frame's internal field order,
/// which happens to match it today but is not part of the contract.
pub fn core_hash(frame: &CoreFrame, columns: HashedColumns) -> String {
    let HashedColumns::All = columns;
    let mut hasher = Sha256::new();
    hasher.update(b"CORE_HASH_V1");

    hasher.update(b"timestamp:i64");
    for ts in frame.timestamps() {
        hasher.update(ts.timestamp_nanos_opt().unwrap_or(i64::MIN).to_le_bytes());
    }

    for (name, column) in [
        ("open", frame.open()),
        ("high", frame.high()),
        ("low", frame.low()),
        ("close", frame.close()),
        ("volume", frame.volume()),
    ] {
        hasher.update(format!("{name}:f64").as_bytes());
        for &v in column {
            hasher.update(canonical_bits(v).to_le_bytes());
        }
    }

    hasher.update(b"is_gap:bool");
    for &gap in frame.is_gap() {
        hasher.update([gap as u8]);
    }

    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(i: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + i * 60, 0).unwrap()
    }

    fn sample_frame() -> CoreFrame {
        CoreFrame::from_columns(
            vec![ts(0), ts(1)],
            vec![1.0, 1.1],
            vec![1.2, 1.2],
            vec![0.9, 1.0],
            vec![1.1, 1.15],
            vec![10.0, 20.0],
            vec![false, false],
        )
    }

    #[test]
    fn identical_frames_hash_identically() {
        let a = sample_frame();
        let b = sample_frame();
        assert_eq!(core_hash(&a, HashedColumns::All), core_hash(&b, HashedColumns::All));
    }

    #[test]
    fn differing_values_change_the_hash() {
        let a = sample_frame();
        let mut b = sample_frame();
        let mut close = b.close().to_vec();
        close[0] += 1e-9;
        let b = CoreFrame::from_columns(
            b.timestamps().to_vec(),
            b.open().to_vec(),
            b.high().to_vec(),
            b.low().to_vec(),
            close,
            b.volume().to_vec(),
            b.is_gap().to_vec(),
        );
        assert_ne!(core_hash(&a, HashedColumns::All), core_hash(&b, HashedColumns::All));
    }

    #[test]
    fn different_nan_payloads_hash_the_same() {
        let quiet_nan = f64::from_bits(0x7ff8_0000_0000_0001);
        let other_nan = f64::from_bits(0x7ff8_0000_0000_0002);
        assert_ne!(quiet_nan.to_bits(), other_nan.to_bits());
        assert_eq!(canonical_bits(quiet_nan), canonical_bits(other_nan));
    }
}
