//! Ingestion metrics (spec §3, §6).

use serde::{Deserialize, Serialize};

/// Created once per [`crate::ingest::ingest`] call; immutable after
/// emission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IngestionMetrics {
    pub rows_in: u64,
    pub rows_out: u64,
    pub duplicates_removed: u64,
    pub gaps_inserted: u64,
    pub runtime_seconds: f64,
    pub throughput_rows_per_sec: f64,
    pub backend_tag: BackendTag,
    pub downcast_applied: bool,
}

/// Identifies which numeric backend produced a run, for audit purposes.
/// `Scalar` is the only backend today; the variant exists so a future
/// SIMD/columnar backend can be distinguished without an API break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendTag {
    Scalar,
}

impl std::fmt::Display for BackendTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar => write!(f, "scalar"),
        }
    }
}

impl IngestionMetrics {
    /// Renders this snapshot as the JSON shape consumers (dashboards, audit
    /// logs) poll or persist — a plain `serde_json::to_string` over the
    /// derived `Serialize` impl, no custom shape massaging.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub(crate) fn finalize(
        rows_in: u64,
        rows_out: u64,
        duplicates_removed: u64,
        gaps_inserted: u64,
        runtime_seconds: f64,
        downcast_applied: bool,
    ) -> Self {
        let throughput_rows_per_sec = if runtime_seconds > 0.0 {
            rows_out as f64 / runtime_seconds
        } else {
            0.0
        };
        Self {
            rows_in,
            rows_out,
            duplicates_removed,
            gaps_inserted,
            runtime_seconds,
            throughput_rows_per_sec,
            backend_tag: BackendTag::Scalar,
            downcast_applied,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_json_round_trips_through_serde_json() {
        let metrics = IngestionMetrics::finalize(100, 99, 1, 0, 0.5, false);
        let json = metrics.to_json().unwrap();
        let parsed: IngestionMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, metrics);
        assert!(json.contains("\"rows_in\":100"));
    }
}
