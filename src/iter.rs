//! Row-iterator view over a [`CoreFrame`] (spec §4.2).
//!
//! Requesting [`crate::ingest::IngestMode::Iterator`] does not re-layout the
//! data into a `Vec<CoreBar>` — it wraps the same columns in an `Rc` and
//! walks them forward, materializing one `CoreBar` per `next()` call. Cloning
//! a `CoreFrameIter` (e.g. to peek ahead) is an `Rc` bump, not a buffer copy.

use std::rc::Rc;

use crate::frame::{CoreBar, CoreFrame};

/// A forward-only, non-restartable view over a [`CoreFrame`]'s rows.
#[derive(Debug, Clone)]
pub struct CoreFrameIter {
    frame: Rc<CoreFrame>,
    cursor: usize,
}

impl CoreFrameIter {
    pub(crate) fn new(frame: CoreFrame) -> Self {
        Self {
            frame: Rc::new(frame),
            cursor: 0,
        }
    }

    /// Rows remaining, including the one `next()` would return.
    pub fn remaining(&self) -> usize {
        self.frame.len().saturating_sub(self.cursor)
    }
}

impl Iterator for CoreFrameIter {
    type Item = CoreBar;

    fn next(&mut self) -> Option<CoreBar> {
        let bar = self.frame.row(self.cursor)?;
        self.cursor += 1;
        Some(bar)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CoreFrameIter {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(i: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + i * 60, 0).unwrap()
    }

    fn sample_frame() -> CoreFrame {
        CoreFrame::from_columns(
            vec![ts(0), ts(1), ts(2)],
            vec![1.0, 1.1, 1.2],
            vec![1.2, 1.2, 1.3],
            vec![0.9, 1.0, 1.1],
            vec![1.1, 1.15, 1.25],
            vec![10.0, 20.0, 30.0],
            vec![false, false, false],
        )
    }

    #[test]
    fn iterates_rows_in_order_then_terminates() {
        let mut it = CoreFrameIter::new(sample_frame());
        assert_eq!(it.len(), 3);
        let closes: Vec<f64> = it.by_ref().map(|bar| bar.close).collect();
        assert_eq!(closes, vec![1.1, 1.15, 1.25]);
        assert_eq!(it.next(), None);
        assert_eq!(it.remaining(), 0);
    }

    #[test]
    fn cloning_shares_the_underlying_columns_without_copying() {
        let mut it = CoreFrameIter::new(sample_frame());
        it.next();
        let clone = it.clone();
        assert_eq!(Rc::strong_count(&it.frame), 2);
        assert_eq!(clone.remaining(), it.remaining());
    }
}
