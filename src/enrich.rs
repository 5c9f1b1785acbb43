//! The enrichment engine (spec §4.4).
//!
//! `enrich` validates a request against a registry, resolves indicator
//! dependencies into a deterministic execution order, runs each indicator's
//! compute function against a read-only view of the core plus
//! already-computed columns, and verifies — by hash comparison — that the
//! core it was handed was never touched.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use crate::error::EnrichError;
use crate::frame::{CoreFrame, CORE_COLUMNS};
use crate::hash::{core_hash, HashedColumns};
use crate::indicator::{ColumnTable, Params};
use crate::progress::{GuardedSink, ProgressSink, ProgressStage};
use crate::registry::IndicatorRegistry;

/// `{indicators, params, strict}` (spec §3). `indicators` must not contain
/// duplicates; in strict mode every name must resolve in the registry.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentRequest {
    pub indicators: Vec<String>,
    pub params: HashMap<String, HashMap<String, f64>>,
    pub strict: bool,
}

impl EnrichmentRequest {
    pub fn new(indicators: Vec<String>, strict: bool) -> Self {
        Self {
            indicators,
            params: HashMap::new(),
            strict,
        }
    }

    fn params_for(&self, name: &str) -> HashMap<String, f64> {
        self.params.get(name).cloned().unwrap_or_default()
    }
}

/// The result of an `enrich` call: the untouched core, the set of indicator
/// columns computed on top of it, and the bookkeeping spec §3 requires.
#[derive(Debug, Clone)]
pub struct EnrichedFrame {
    pub core: CoreFrame,
    pub indicators_applied: Vec<String>,
    pub failed_indicators: Vec<(String, EnrichError)>,
    pub runtime_seconds: f64,
    extra_columns: HashMap<String, Vec<f64>>,
    extra_column_order: Vec<String>,
}

impl EnrichedFrame {
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.extra_columns.get(name).map(|v| v.as_slice())
    }

    /// Indicator-provided column names, in the order they were appended.
    pub fn indicator_columns(&self) -> &[String] {
        &self.extra_column_order
    }
}

/// Runs the full enrichment pipeline. `progress_sink` receives a single
/// completion event; enrichment has no multi-stage progress vocabulary of
/// its own in the spec, so it reuses [`crate::progress::ProgressStage`]
/// rather than inventing a parallel one (see DESIGN.md).
#[instrument(skip_all, fields(requested = request.indicators.len(), strict = request.strict))]
pub fn enrich(
    core: &CoreFrame,
    request: &EnrichmentRequest,
    registry: &IndicatorRegistry,
    progress_sink: &mut dyn ProgressSink,
) -> Result<EnrichedFrame, EnrichError> {
    let start = Instant::now();
    let pre_hash = core_hash(core, HashedColumns::All);
    info!(requested = ?request.indicators, "starting enrichment");

    check_no_duplicates(&request.indicators)?;

    let (order, edges, mut failed) = resolve_order(&request.indicators, registry, request.strict)?;
    check_no_provides_conflicts(&order, registry)?;

    let requested: HashSet<&str> = request.indicators.iter().map(String::as_str).collect();

    let mut working: HashMap<String, Vec<f64>> = HashMap::new();
    let mut indicators_applied = Vec::new();
    let mut extra_column_order = Vec::new();

    for name in &order {
        if let Some(err) = failed.get(name) {
            if request.strict {
                return Err(err.clone());
            }
            continue;
        }
        let deps_failed = edges[name].iter().find_map(|dep| failed.get(dep).cloned());
        if let Some(_dep_err) = deps_failed {
            let err = EnrichError::IndicatorComputeFailure {
                name: name.clone(),
                cause: format!(
                    "skipped: depends on a failed indicator among {:?}",
                    edges[name]
                ),
            };
            failed.insert(name.clone(), err);
            continue;
        }

        let spec = registry.lookup(name).expect("resolved name must be registered");
        let params = Params::new(spec.default_params.clone()).merged(&request.params_for(name));

        let table = build_column_table(core, &working);
        match (spec.compute)(&table, &params) {
            Ok(columns) => {
                for (col_name, values) in columns {
                    if values.len() != core.len() {
                        let err = EnrichError::IndicatorComputeFailure {
                            name: name.clone(),
                            cause: format!(
                                "column '{}' has {} rows, expected {}",
                                col_name,
                                values.len(),
                                core.len()
                            ),
                        };
                        if request.strict {
                            return Err(err);
                        }
                        failed.insert(name.clone(), err);
                        continue;
                    }
                    working.insert(col_name.clone(), values);
                    extra_column_order.push(col_name);
                }
                indicators_applied.push(name.clone());
            }
            Err(cause) => {
                warn!(indicator = %name, %cause, "indicator compute failed");
                let err = EnrichError::IndicatorComputeFailure {
                    name: name.clone(),
                    cause,
                };
                if request.strict {
                    return Err(err);
                }
                failed.insert(name.clone(), err);
            }
        }
    }

    // Only indicators explicitly requested (not purely-transitive dependency
    // helpers) are surfaced in `failed_indicators` — a dependency pulled in
    // solely to satisfy another indicator's `requires` is an implementation
    // detail, not something the caller asked for.
    let failed_indicators: Vec<(String, EnrichError)> = failed
        .into_iter()
        .filter(|(name, _)| requested.contains(name.as_str()))
        .collect();

    let post_hash = core_hash(core, HashedColumns::All);
    if post_hash != pre_hash {
        return Err(EnrichError::CoreMutationDetected {
            expected_hash: pre_hash,
            actual_hash: post_hash,
        });
    }

    let runtime_seconds = start.elapsed().as_secs_f64().max(f64::EPSILON);
    let mut progress = GuardedSink::new(progress_sink);
    progress.emit(
        ProgressStage::Finalize,
        format!(
            "enriched {} of {} requested indicators",
            indicators_applied.len(),
            request.indicators.len()
        ),
    )
    .map_err(|_| EnrichError::CoreMutationDetected {
        expected_hash: pre_hash.clone(),
        actual_hash: pre_hash,
    })?;

    debug!(
        applied = indicators_applied.len(),
        failed = failed_indicators.len(),
        runtime_seconds,
        "enrichment finished"
    );

    Ok(EnrichedFrame {
        core: core.deep_clone(),
        indicators_applied,
        failed_indicators,
        runtime_seconds,
        extra_columns: working,
        extra_column_order,
    })
}

fn check_no_duplicates(indicators: &[String]) -> Result<(), EnrichError> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for name in indicators {
        if !seen.insert(name.as_str()) && !duplicates.iter().any(|d: &String| d == name) {
            duplicates.push(name.clone());
        }
    }
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(EnrichError::DuplicateIndicators { names: duplicates })
    }
}

fn check_no_provides_conflicts(order: &[String], registry: &IndicatorRegistry) -> Result<(), EnrichError> {
    let mut owners: HashMap<&str, &str> = HashMap::new();
    for name in order {
        let spec = registry.lookup(name).expect("resolved name must be registered");
        for provided in &spec.provides {
            if let Some(existing) = owners.get(provided.as_str()) {
                return Err(EnrichError::ProvidesConflict {
                    column: provided.clone(),
                    existing_owner: existing.to_string(),
                    attempted_owner: name.clone(),
                });
            }
            owners.insert(provided, name);
        }
    }
    Ok(())
}

fn build_column_table<'a>(core: &'a CoreFrame, working: &'a HashMap<String, Vec<f64>>) -> ColumnTable<'a> {
    let mut columns: HashMap<&'a str, &'a [f64]> = HashMap::new();
    columns.insert("open", core.open());
    columns.insert("high", core.high());
    columns.insert("low", core.low());
    columns.insert("close", core.close());
    columns.insert("volume", core.volume());
    for (name, values) in working {
        columns.insert(name.as_str(), values.as_slice());
    }
    ColumnTable::new(columns, core.is_gap(), core.len())
}

/// Resolves the transitive closure of `requested` over the registry into a
/// topological order, ties broken by requested order then registration
/// order. Returns the order, each resolved node's direct dependency names
/// (for propagating runtime compute failures forward), and the set of
/// indicators that failed to resolve (unknown name or, in non-strict mode,
/// a cyclic/unknown transitive dependency).
fn resolve_order(
    requested: &[String],
    registry: &IndicatorRegistry,
    strict: bool,
) -> Result<(Vec<String>, HashMap<String, Vec<String>>, HashMap<String, EnrichError>), EnrichError> {
    let mut edges: HashMap<String, Vec<String>> = HashMap::new();
    let mut failed: HashMap<String, EnrichError> = HashMap::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut stack: Vec<String> = Vec::new();

    for name in requested {
        visit(name, registry, strict, &mut edges, &mut failed, &mut visited, &mut stack)?;
    }

    let requested_index: HashMap<&str, usize> =
        requested.iter().enumerate().map(|(i, n)| (n.as_str(), i)).collect();

    let mut remaining: HashSet<String> = edges.keys().cloned().collect();
    let mut order: Vec<String> = Vec::new();
    while !remaining.is_empty() {
        let mut ready: Vec<&String> = remaining
            .iter()
            .filter(|n| edges[*n].iter().all(|d| order.contains(d) || failed.contains_key(d)))
            .collect();
        if ready.is_empty() {
            return Err(EnrichError::CyclicDependency {
                cycle: remaining.into_iter().collect(),
            });
        }
        ready.sort_by_key(|n| {
            (
                requested_index.get(n.as_str()).copied().unwrap_or(usize::MAX),
                registry.insertion_index(n).unwrap_or(usize::MAX),
            )
        });
        let chosen = ready[0].clone();
        order.push(chosen.clone());
        remaining.remove(&chosen);
    }

    Ok((order, edges, failed))
}

fn visit(
    name: &str,
    registry: &IndicatorRegistry,
    strict: bool,
    edges: &mut HashMap<String, Vec<String>>,
    failed: &mut HashMap<String, EnrichError>,
    visited: &mut HashSet<String>,
    stack: &mut Vec<String>,
) -> Result<(), EnrichError> {
    if failed.contains_key(name) || visited.contains(name) {
        return Ok(());
    }
    if stack.iter().any(|n| n == name) {
        let mut cycle = stack.clone();
        cycle.push(name.to_string());
        return Err(EnrichError::CyclicDependency { cycle });
    }

    let spec = match registry.lookup(name) {
        Ok(spec) => spec,
        Err(_) => {
            let err = EnrichError::UnknownIndicator { name: name.to_string() };
            if strict {
                return Err(err);
            }
            failed.insert(name.to_string(), err);
            return Ok(());
        }
    };

    stack.push(name.to_string());
    let mut deps = Vec::new();
    for required in &spec.requires {
        if CORE_COLUMNS.contains(&required.as_str()) {
            continue;
        }
        visit(required, registry, strict, edges, failed, visited, stack)?;
        if failed.contains_key(required) {
            stack.pop();
            let err = EnrichError::IndicatorComputeFailure {
                name: name.to_string(),
                cause: format!("depends on failed indicator '{}'", required),
            };
            failed.insert(name.to_string(), err);
            return Ok(());
        }
        deps.push(required.clone());
    }
    stack.pop();
    edges.insert(name.to_string(), deps);
    visited.insert(name.to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator;
    use crate::progress::NoopProgressSink;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(i: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + i * 60, 0).unwrap()
    }

    fn sample_frame(n: usize) -> CoreFrame {
        let timestamps: Vec<_> = (0..n as i64).map(ts).collect();
        let close: Vec<f64> = (0..n).map(|i| 100.0 + (i as f64 * 0.1)).collect();
        CoreFrame::from_columns(
            timestamps,
            close.clone(),
            close.iter().map(|c| c + 0.5).collect(),
            close.iter().map(|c| c - 0.5).collect(),
            close.clone(),
            vec![10.0; n],
            vec![false; n],
        )
    }

    #[test]
    fn selectivity_adds_exactly_the_requested_columns() {
        let core = sample_frame(1_000);
        let mut registry = IndicatorRegistry::new();
        registry.register(indicator::ema("ema_fast", 10)).unwrap();
        registry.register(indicator::ema("ema_slow", 20)).unwrap();
        let request = EnrichmentRequest::new(vec!["ema_fast".to_string(), "ema_slow".to_string()], true);

        let mut sink = NoopProgressSink;
        let result = enrich(&core, &request, &registry, &mut sink).unwrap();

        assert_eq!(result.indicators_applied, vec!["ema_fast", "ema_slow"]);
        assert!(result.column("ema_fast").unwrap()[..9].iter().all(|v| v.is_nan()));
        assert!(result.column("ema_slow").unwrap()[..19].iter().all(|v| v.is_nan()));
        assert!(result.failed_indicators.is_empty());
    }

    #[test]
    fn strict_unknown_indicator_aborts_with_no_side_effects() {
        let core = sample_frame(100);
        let mut registry = IndicatorRegistry::new();
        registry.register(indicator::ema("ema_fast", 10)).unwrap();
        let request = EnrichmentRequest::new(vec!["ema_fast".to_string(), "bogus".to_string()], true);

        let mut sink = NoopProgressSink;
        let err = enrich(&core, &request, &registry, &mut sink).unwrap_err();
        assert!(matches!(err, EnrichError::UnknownIndicator { name } if name == "bogus"));
    }

    #[test]
    fn non_strict_records_partial_failure_and_keeps_independent_indicators() {
        let core = sample_frame(100);
        let mut registry = IndicatorRegistry::new();
        registry.register(indicator::ema("ema_fast", 10)).unwrap();
        registry.register(indicator::atr("atr", 14)).unwrap();
        let request = EnrichmentRequest::new(
            vec!["ema_fast".to_string(), "bogus".to_string(), "atr".to_string()],
            false,
        );

        let mut sink = NoopProgressSink;
        let result = enrich(&core, &request, &registry, &mut sink).unwrap();

        assert_eq!(result.indicators_applied, vec!["ema_fast", "atr"]);
        assert_eq!(result.failed_indicators.len(), 1);
        assert!(matches!(
            &result.failed_indicators[0],
            (name, EnrichError::UnknownIndicator { name: inner }) if name == "bogus" && inner == "bogus"
        ));
    }

    #[test]
    fn core_hash_is_unchanged_after_enrichment() {
        let core = sample_frame(200);
        let mut registry = IndicatorRegistry::new();
        registry.register(indicator::ema("ema", 10)).unwrap();
        registry.register(indicator::atr("atr", 14)).unwrap();
        registry.register(indicator::stochastic_rsi("stoch_rsi", 14, 14)).unwrap();
        let pre = core_hash(&core, HashedColumns::All);

        let request = EnrichmentRequest::new(
            vec!["ema".to_string(), "atr".to_string(), "stoch_rsi".to_string()],
            true,
        );
        let mut sink = NoopProgressSink;
        let result = enrich(&core, &request, &registry, &mut sink).unwrap();

        assert_eq!(core_hash(&result.core, HashedColumns::All), pre);
    }

    #[test]
    fn cyclic_dependency_is_detected() {
        let core = sample_frame(10);
        let mut registry = IndicatorRegistry::new();
        let mut a = indicator::ema("a", 5);
        a.requires = vec!["b".to_string()];
        let mut b = indicator::ema("b", 5);
        b.name = "b".to_string();
        b.provides = vec!["b".to_string()];
        b.requires = vec!["a".to_string()];
        registry.register(a).unwrap();
        registry.register(b).unwrap();

        let request = EnrichmentRequest::new(vec!["a".to_string()], true);
        let mut sink = NoopProgressSink;
        let err = enrich(&core, &request, &registry, &mut sink).unwrap_err();
        assert!(matches!(err, EnrichError::CyclicDependency { .. }));
    }
}
