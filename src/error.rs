//! Error taxonomy for ingestion and enrichment.
//!
//! Every failure is a typed variant with enough payload to reproduce it
//! without reading logs. No variant here is ever silently swallowed;
//! `enrich` in non-strict mode is the one place a subset of these
//! (`UnknownIndicator`, `IndicatorComputeFailure`) are captured rather than
//! propagated — see `enrich::enrich`.

use std::fmt;

use crate::timestamp::RawTimestampKind;

/// Errors raised while turning a raw batch into a [`crate::frame::CoreFrame`].
#[derive(Debug, Clone)]
pub enum IngestError {
    MissingColumns {
        missing: Vec<String>,
        expected: Vec<String>,
    },
    InvalidColumnType {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },
    NonUtcTimestamps {
        sample_offenders: Vec<RawTimestampKind>,
    },
    CadenceDeviation {
        expected_intervals: u64,
        missing_intervals: u64,
        deviation_pct: f64,
    },
    InvalidMode {
        value: String,
        expected: &'static [&'static str],
    },
    InvalidCadence {
        value_millis: i64,
    },
    ProgressContractViolation {
        reason: String,
    },
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumns { missing, expected } => write!(
                f,
                "missing required columns {:?} (expected {:?})",
                missing, expected
            ),
            Self::InvalidColumnType {
                column,
                expected,
                actual,
            } => write!(
                f,
                "column '{}' has type {} but {} was expected",
                column, actual, expected
            ),
            Self::NonUtcTimestamps { sample_offenders } => write!(
                f,
                "timestamps are not UTC-qualified, e.g. {:?}",
                sample_offenders
            ),
            Self::CadenceDeviation {
                expected_intervals,
                missing_intervals,
                deviation_pct,
            } => write!(
                f,
                "cadence deviation {:.3}% exceeds threshold ({} of {} expected intervals missing)",
                deviation_pct, missing_intervals, expected_intervals
            ),
            Self::InvalidMode { value, expected } => {
                write!(f, "invalid mode '{}', expected one of {:?}", value, expected)
            }
            Self::InvalidCadence { value_millis } => {
                write!(f, "cadence must be a positive duration, got {}ms", value_millis)
            }
            Self::ProgressContractViolation { reason } => {
                write!(f, "progress contract violated: {}", reason)
            }
        }
    }
}

impl std::error::Error for IngestError {}

/// Errors raised while resolving or executing an enrichment request.
#[derive(Debug, Clone)]
pub enum EnrichError {
    DuplicateIndicators {
        names: Vec<String>,
    },
    UnknownIndicator {
        name: String,
    },
    CyclicDependency {
        cycle: Vec<String>,
    },
    ProvidesConflict {
        column: String,
        existing_owner: String,
        attempted_owner: String,
    },
    IndicatorComputeFailure {
        name: String,
        cause: String,
    },
    CoreMutationDetected {
        expected_hash: String,
        actual_hash: String,
    },
}

impl fmt::Display for EnrichError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateIndicators { names } => {
                write!(f, "request lists the same indicator more than once: {:?}", names)
            }
            Self::UnknownIndicator { name } => {
                write!(f, "indicator '{}' is not registered", name)
            }
            Self::CyclicDependency { cycle } => {
                write!(f, "cyclic indicator dependency: {}", cycle.join(" -> "))
            }
            Self::ProvidesConflict {
                column,
                existing_owner,
                attempted_owner,
            } => write!(
                f,
                "column '{}' would be produced by both '{}' and '{}'",
                column, existing_owner, attempted_owner
            ),
            Self::IndicatorComputeFailure { name, cause } => {
                write!(f, "indicator '{}' failed to compute: {}", name, cause)
            }
            Self::CoreMutationDetected {
                expected_hash,
                actual_hash,
            } => write!(
                f,
                "core columns mutated during enrichment (expected hash {}, got {})",
                expected_hash, actual_hash
            ),
        }
    }
}

impl std::error::Error for EnrichError {}

/// Errors raised while registering an indicator specification.
#[derive(Debug, Clone)]
pub enum RegistryError {
    DuplicateIndicator {
        name: String,
    },
    ProvidesConflict {
        column: String,
        existing_owner: String,
    },
    UnknownIndicator {
        name: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateIndicator { name } => {
                write!(f, "indicator '{}' is already registered", name)
            }
            Self::ProvidesConflict {
                column,
                existing_owner,
            } => write!(
                f,
                "column '{}' is already provided by registered indicator '{}'",
                column, existing_owner
            ),
            Self::UnknownIndicator { name } => write!(f, "no indicator named '{}'", name),
        }
    }
}

impl std::error::Error for RegistryError {}
