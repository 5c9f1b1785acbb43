//! Stage 5: cadence validation (spec §4.1 stage 5).

use chrono::{DateTime, Utc};

use crate::error::IngestError;
use crate::frame::Cadence;

/// Maximum tolerated deviation between the expected and actual interval
/// count, expressed as a percentage (spec §4.1: "If deviation_pct > 2.0").
pub const MAX_DEVIATION_PCT: f64 = 2.0;

pub(crate) struct CadenceReport {
    pub expected_intervals: u64,
    pub missing_intervals: u64,
    pub deviation_pct: f64,
}

/// Computes the cadence deviation report for a sorted, deduplicated
/// timestamp column. Returns `Ok` with the report for an empty or
/// single-row input (no intervals to deviate).
pub(crate) fn validate(
    timestamps: &[DateTime<Utc>],
    cadence: Cadence,
) -> Result<CadenceReport, IngestError> {
    if timestamps.len() < 2 {
        return Ok(CadenceReport {
            expected_intervals: 0,
            missing_intervals: 0,
            deviation_pct: 0.0,
        });
    }

    let span_millis = (timestamps[timestamps.len() - 1] - timestamps[0]).num_milliseconds();
    let cadence_millis = cadence.as_millis();
    let expected_intervals = (span_millis / cadence_millis) as u64;
    let actual_intervals = (timestamps.len() - 1) as u64;
    let missing_intervals = expected_intervals.saturating_sub(actual_intervals);
    let deviation_pct = if expected_intervals == 0 {
        0.0
    } else {
        100.0 * missing_intervals as f64 / expected_intervals as f64
    };

    if deviation_pct > MAX_DEVIATION_PCT {
        return Err(IngestError::CadenceDeviation {
            expected_intervals,
            missing_intervals,
            deviation_pct,
        });
    }

    Ok(CadenceReport {
        expected_intervals,
        missing_intervals,
        deviation_pct,
    })
}
