//! Stage 3–4: stable chronological sort, then keep-first deduplication on
//! equal timestamps (spec §4.1 stages 3–4; these are one pipeline component,
//! "Sort + Deduplicator", per spec §2).

use chrono::{DateTime, Utc};

pub(crate) struct SortedColumns {
    pub timestamps: Vec<DateTime<Utc>>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
    pub duplicates_removed: usize,
}

/// Sorts by timestamp (stable — ties keep input order) then removes all but
/// the first occurrence of each timestamp. Because the sort is stable, equal
/// timestamps land in a contiguous run in their original relative order, so
/// "keep first occurrence" reduces to "keep the first element of each run".
pub(crate) fn sort_and_dedupe(
    timestamps: Vec<DateTime<Utc>>,
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<f64>,
) -> SortedColumns {
    let n = timestamps.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| timestamps[i]);

    let mut out_ts = Vec::with_capacity(n);
    let mut out_open = Vec::with_capacity(n);
    let mut out_high = Vec::with_capacity(n);
    let mut out_low = Vec::with_capacity(n);
    let mut out_close = Vec::with_capacity(n);
    let mut out_volume = Vec::with_capacity(n);
    let mut duplicates_removed = 0usize;

    let mut last: Option<DateTime<Utc>> = None;
    for &i in &order {
        let t = timestamps[i];
        if last == Some(t) {
            duplicates_removed += 1;
            continue;
        }
        last = Some(t);
        out_ts.push(t);
        out_open.push(open[i]);
        out_high.push(high[i]);
        out_low.push(low[i]);
        out_close.push(close[i]);
        out_volume.push(volume[i]);
    }

    SortedColumns {
        timestamps: out_ts,
        open: out_open,
        high: out_high,
        low: out_low,
        close: out_close,
        volume: out_volume,
        duplicates_removed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn stable_sort_orders_by_timestamp() {
        let timestamps = vec![ts(60), ts(0), ts(120)];
        let result = sort_and_dedupe(
            timestamps,
            vec![1.0, 2.0, 3.0],
            vec![1.0, 2.0, 3.0],
            vec![1.0, 2.0, 3.0],
            vec![1.0, 2.0, 3.0],
            vec![1.0, 2.0, 3.0],
        );
        assert_eq!(result.timestamps, vec![ts(0), ts(60), ts(120)]);
        assert_eq!(result.close, vec![2.0, 1.0, 3.0]);
        assert_eq!(result.duplicates_removed, 0);
    }

    #[test]
    fn duplicate_resolution_keeps_first_occurrence() {
        // S2: [00:00, 00:01, 00:01] with differing OHLC on the collision.
        let timestamps = vec![ts(0), ts(60), ts(60)];
        let result = sort_and_dedupe(
            timestamps,
            vec![1.0, 1.1, 9.9],
            vec![1.0, 1.1, 9.9],
            vec![1.0, 1.1, 9.9],
            vec![1.0, 1.1, 9.9],
            vec![1.0, 1.1, 9.9],
        );
        assert_eq!(result.timestamps, vec![ts(0), ts(60)]);
        assert_eq!(result.close, vec![1.0, 1.1]);
        assert_eq!(result.duplicates_removed, 1);
    }
}
