//! Precision-guarded downcast (spec §4.1 stage 7, §9 Design Notes).
//!
//! Never an automatic silent conversion: the four price columns are
//! downcast to `f32` together only if every value round-trips through
//! `f32` with absolute error ≤ 1e-6. Internal arithmetic stays `f64`
//! regardless — this only changes [`crate::frame::CoreFrame::precision`],
//! which governs what `to_polars()` emits.

use rayon::prelude::*;

use crate::frame::PricePrecision;

/// Maximum tolerated round-trip error for a downcast to be considered safe.
pub const MAX_ROUND_TRIP_ERROR: f64 = 1e-6;

fn round_trip_safe(column: &[f64]) -> bool {
    column
        .par_iter()
        .all(|&v| ((v as f32) as f64 - v).abs() <= MAX_ROUND_TRIP_ERROR)
}

/// Decides whether all four price columns can be safely downcast. Returns
/// the precision to record and whether the downcast was actually applied.
pub(crate) fn decide(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> (PricePrecision, bool) {
    let safe = [open, high, low, close]
        .into_iter()
        .all(round_trip_safe);
    if safe {
        (PricePrecision::F32, true)
    } else {
        (PricePrecision::F64, false)
    }
}
