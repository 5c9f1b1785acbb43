//! The ingestion pipeline entry point (spec §4.1).
//!
//! `ingest` runs the seven stages in order — schema, UTC, sort+dedupe,
//! cadence, gap fill, schema enforcement (downcast), metrics — failing fast
//! with a typed [`IngestError`] at the first stage that rejects the input.
//! No partial output is ever returned.

use std::time::Instant;

use tracing::{debug, info, instrument};

use crate::cadence;
use crate::downcast;
use crate::error::IngestError;
use crate::frame::{Cadence, CoreFrame};
use crate::gapfill;
use crate::iter::CoreFrameIter;
use crate::metrics::IngestionMetrics;
use crate::progress::{GuardedSink, ProgressSink, ProgressStage};
use crate::schema::{self, RawBatch};
use crate::sort_dedup;

/// Output representation requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    Columnar,
    Iterator,
}

impl IngestMode {
    pub const VALID: [&'static str; 2] = ["columnar", "iterator"];

    pub fn parse(value: &str) -> Result<Self, IngestError> {
        match value {
            "columnar" => Ok(Self::Columnar),
            "iterator" => Ok(Self::Iterator),
            other => Err(IngestError::InvalidMode {
                value: other.to_string(),
                expected: &Self::VALID,
            }),
        }
    }
}

/// Either a fully materialized frame or a lazy row view over the same
/// underlying columns, per the requested [`IngestMode`].
pub enum IngestOutput {
    Columnar(CoreFrame),
    Iterator(CoreFrameIter),
}

impl IngestOutput {
    /// Convenience accessor for callers that only ever request
    /// [`IngestMode::Columnar`].
    pub fn into_frame(self) -> Option<CoreFrame> {
        match self {
            Self::Columnar(frame) => Some(frame),
            Self::Iterator(_) => None,
        }
    }
}

/// Maximum sample offenders recorded in a duplicate/timestamp error payload.
const SAMPLE_LIMIT: usize = 5;

/// Runs the full ingestion pipeline on a raw batch.
///
/// `mode` must be one of [`IngestMode::VALID`]; `cadence` must be a positive
/// duration. Both checks happen before any column is read (spec §4.2:
/// "ingestion fails with InvalidMode before reading the input").
#[instrument(skip_all, fields(rows_in = source.row_count(), mode = ?mode))]
pub fn ingest(
    source: RawBatch,
    cadence: Cadence,
    mode: IngestMode,
    downcast_requested: bool,
    progress_sink: &mut dyn ProgressSink,
) -> Result<(IngestOutput, IngestionMetrics), IngestError> {
    let start = Instant::now();
    let mut progress = GuardedSink::new(progress_sink);

    let rows_in = source.row_count() as u64;
    info!(rows_in, "starting ingestion");
    progress.emit(ProgressStage::Read, format!("read {} rows", rows_in))?;

    schema::check_schema(&source)?;
    schema::check_utc(&source, SAMPLE_LIMIT)?;

    if source.row_count() == 0 {
        progress.emit(ProgressStage::Sort, "empty input, nothing to sort")?;
        progress.emit(ProgressStage::Cadence, "empty input, nothing to validate")?;
        progress.emit(ProgressStage::GapFill, "empty input, nothing to fill")?;
        progress.emit(ProgressStage::Finalize, "finalized empty frame")?;
        let metrics = IngestionMetrics::finalize(0, 0, 0, 0, start.elapsed().as_secs_f64().max(f64::EPSILON), false);
        let frame = CoreFrame::empty();
        return Ok((wrap_output(frame, mode), metrics));
    }

    let (timestamps, open, high, low, close, volume) = schema::extract_columns(&source);

    let sorted = sort_dedup::sort_and_dedupe(timestamps, open, high, low, close, volume);
    debug!(duplicates_removed = sorted.duplicates_removed, "sorted and deduplicated");
    progress.emit(
        ProgressStage::Sort,
        format!("sorted and removed {} duplicates", sorted.duplicates_removed),
    )?;

    let cadence_report = cadence::validate(&sorted.timestamps, cadence)?;
    progress.emit(
        ProgressStage::Cadence,
        format!(
            "cadence deviation {:.3}% ({} missing of {} expected)",
            cadence_report.deviation_pct, cadence_report.missing_intervals, cadence_report.expected_intervals
        ),
    )?;

    let duplicates_removed = sorted.duplicates_removed as u64;

    let gapfill::GapFillResult {
        mut frame,
        gaps_inserted,
    } = gapfill::fill(
        sorted.timestamps,
        sorted.open,
        sorted.high,
        sorted.low,
        sorted.close,
        sorted.volume,
        cadence,
    );
    debug!(gaps_inserted, "gap fill complete");
    progress.emit(ProgressStage::GapFill, format!("inserted {} gap rows", gaps_inserted))?;

    let downcast_applied = if downcast_requested {
        let (precision, applied) = downcast::decide(frame.open(), frame.high(), frame.low(), frame.close());
        frame.set_precision(precision);
        applied
    } else {
        false
    };

    let rows_out = frame.len() as u64;
    let runtime_seconds = start.elapsed().as_secs_f64().max(f64::EPSILON);
    progress.emit(
        ProgressStage::Finalize,
        format!("finalized {} rows in {:.3}s", rows_out, runtime_seconds),
    )?;
    info!(rows_out, runtime_seconds, "ingestion finished");

    let metrics = IngestionMetrics::finalize(
        rows_in,
        rows_out,
        duplicates_removed,
        gaps_inserted,
        runtime_seconds,
        downcast_applied,
    );

    Ok((wrap_output(frame, mode), metrics))
}

fn wrap_output(frame: CoreFrame, mode: IngestMode) -> IngestOutput {
    match mode {
        IngestMode::Columnar => IngestOutput::Columnar(frame),
        IngestMode::Iterator => IngestOutput::Iterator(CoreFrameIter::new(frame)),
    }
}
