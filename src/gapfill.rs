//! Stage 6: gap filling (spec §4.1 stage 6).
//!
//! Reindexes the sorted, deduplicated columns onto the full cadence grid
//! `[t_first, t_first+Δ, ..., t_last]`. Synthesized rows get
//! `open = high = low = close = previous_close`, `volume = 0`,
//! `is_gap = true`. This is a single forward pass over the existing column
//! merging into a pre-sized grid — never a lookup keyed by row object.

use chrono::{DateTime, Utc};

use crate::frame::{Cadence, CoreFrame};

pub(crate) struct GapFillResult {
    pub frame: CoreFrame,
    pub gaps_inserted: u64,
}

pub(crate) fn fill(
    timestamps: Vec<DateTime<Utc>>,
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<f64>,
    cadence: Cadence,
) -> GapFillResult {
    if timestamps.is_empty() {
        return GapFillResult {
            frame: CoreFrame::empty(),
            gaps_inserted: 0,
        };
    }

    let step = cadence.as_duration();
    let t_first = timestamps[0];
    let t_last = *timestamps.last().unwrap();

    let grid_len = (((t_last - t_first).num_milliseconds() / cadence.as_millis()) + 1) as usize;

    let mut out_ts = Vec::with_capacity(grid_len);
    let mut out_open = Vec::with_capacity(grid_len);
    let mut out_high = Vec::with_capacity(grid_len);
    let mut out_low = Vec::with_capacity(grid_len);
    let mut out_close = Vec::with_capacity(grid_len);
    let mut out_volume = Vec::with_capacity(grid_len);
    let mut out_is_gap = Vec::with_capacity(grid_len);

    let mut source_idx = 0usize;
    let mut grid_time = t_first;
    let mut previous_close = close[0];
    let mut gaps_inserted = 0u64;

    while grid_time <= t_last {
        if source_idx < timestamps.len() && timestamps[source_idx] == grid_time {
            out_ts.push(grid_time);
            out_open.push(open[source_idx]);
            out_high.push(high[source_idx]);
            out_low.push(low[source_idx]);
            out_close.push(close[source_idx]);
            out_volume.push(volume[source_idx]);
            out_is_gap.push(false);
            previous_close = close[source_idx];
            source_idx += 1;
        } else {
            out_ts.push(grid_time);
            out_open.push(previous_close);
            out_high.push(previous_close);
            out_low.push(previous_close);
            out_close.push(previous_close);
            out_volume.push(0.0);
            out_is_gap.push(true);
            gaps_inserted += 1;
        }
        grid_time = grid_time + step;
    }

    GapFillResult {
        frame: CoreFrame::from_columns(out_ts, out_open, out_high, out_low, out_close, out_volume, out_is_gap),
        gaps_inserted,
    }
}
