//! A deterministic, high-throughput OHLCV ingestion and enrichment engine.
//!
//! Two tightly coupled subsystems: [`ingest`] turns a raw columnar batch
//! into a normalized, gap-marked, chronologically ordered [`frame::CoreFrame`];
//! [`enrich`] extends that frame with registry-resolved indicator columns
//! without ever mutating the core. See each module for its contract.

pub mod cadence;
pub mod downcast;
pub mod enrich;
pub mod error;
pub mod frame;
pub mod gapfill;
pub mod hash;
pub mod indicator;
pub mod ingest;
pub mod iter;
pub mod metrics;
pub mod polars_interop;
pub mod progress;
pub mod registry;
pub mod schema;
pub mod sort_dedup;
pub mod timestamp;

pub use enrich::{enrich, EnrichedFrame, EnrichmentRequest};
pub use error::{EnrichError, IngestError, RegistryError};
pub use frame::{Cadence, CoreBar, CoreFrame, PricePrecision};
pub use hash::{core_hash, HashedColumns};
pub use ingest::{ingest, IngestMode, IngestOutput};
pub use iter::CoreFrameIter;
pub use metrics::{BackendTag, IngestionMetrics};
pub use progress::{NoopProgressSink, ProgressEvent, ProgressSink, ProgressStage};
pub use registry::IndicatorRegistry;
pub use schema::{RawBatch, RawColumn};
pub use timestamp::{RawTimestamp, RawTimestampKind};
