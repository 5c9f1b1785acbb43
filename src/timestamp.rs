//! Timestamp qualification.
//!
//! The schema validator (§4.1 stage 2 of the ingestion pipeline) must reject
//! any timestamp that is not explicitly UTC — naive (no offset) and
//! fixed-offset (non-UTC) timestamps are both rejected. Modeling the three
//! possibilities as a sum type lets the UTC check be a single exhaustive
//! match rather than an ad-hoc string/flag inspection.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use std::fmt;

/// A timestamp as it arrived from the input adapter, before UTC
/// qualification has been enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTimestamp {
    Utc(DateTime<Utc>),
    FixedOffset(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

/// A redacted description of an offending timestamp, safe to surface in an
/// error payload without leaking unrelated row data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTimestampKind {
    FixedOffset { utc_offset_seconds: i32 },
    Naive,
}

impl fmt::Display for RawTimestampKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FixedOffset { utc_offset_seconds } => {
                write!(f, "fixed-offset timestamp ({}s from UTC)", utc_offset_seconds)
            }
            Self::Naive => write!(f, "naive (timezone-less) timestamp"),
        }
    }
}

impl RawTimestamp {
    /// Returns the UTC instant if this timestamp is already UTC-qualified.
    pub fn as_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Utc(ts) => Some(*ts),
            Self::FixedOffset(_) | Self::Naive(_) => None,
        }
    }

    pub fn offending_kind(&self) -> Option<RawTimestampKind> {
        match self {
            Self::Utc(_) => None,
            Self::FixedOffset(ts) => Some(RawTimestampKind::FixedOffset {
                utc_offset_seconds: ts.offset().local_minus_utc(),
            }),
            Self::Naive(_) => Some(RawTimestampKind::Naive),
        }
    }
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Utc(ts)
    }
}
