//! Indicator specifications and the three built-in kernels (spec §4.3, §4.4).
//!
//! Each [`IndicatorSpec`] is data, not an inheritance hierarchy: a name, the
//! columns it requires and provides, default parameters, a declared gap
//! policy, and a compute closure operating on whole column slices. Built-ins
//! are ordinary [`IndicatorSpec`] values produced by factory functions —
//! there is no import-time registration magic (spec §9, "Pluggable registry
//! → explicit registration API").

use std::collections::HashMap;
use std::sync::Arc;

/// Whether an indicator's synthesized-row (`is_gap = true`) output should be
/// computed from the forward-filled OHLC like any other row, or forced to
/// NaN because its definition is undefined on a synthesized bar.
///
/// All three built-ins operate on close/high/low, which are well-defined on
/// gap rows (forward-filled by the gap filler), so they all declare
/// `ComputeNormally`. A volume-based momentum indicator — the kind of thing
/// the gap-row NaN carve-out in spec §4.4 is for — would declare
/// `PropagateNan` instead, since gap rows always carry `volume = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapPolicy {
    ComputeNormally,
    PropagateNan,
}

/// A named bag of numeric parameters merged from an indicator's
/// `default_params` and the caller-supplied overrides in
/// [`crate::enrich::EnrichmentRequest`].
#[derive(Debug, Clone, Default)]
pub struct Params(HashMap<String, f64>);

impl Params {
    pub fn new(values: HashMap<String, f64>) -> Self {
        Self(values)
    }

    pub fn get(&self, key: &str, default: f64) -> f64 {
        self.0.get(key).copied().unwrap_or(default)
    }

    pub fn get_period(&self, key: &str, default: usize) -> usize {
        self.get(key, default as f64).max(1.0) as usize
    }

    /// `self` overridden by `overrides` — `overrides` wins on key collision.
    pub fn merged(&self, overrides: &HashMap<String, f64>) -> Self {
        let mut merged = self.0.clone();
        merged.extend(overrides.iter().map(|(k, v)| (k.clone(), *v)));
        Self(merged)
    }
}

/// Read-only view over the working frame's columns, core and
/// already-computed indicator columns alike, as seen by a compute function.
pub struct ColumnTable<'a> {
    columns: HashMap<&'a str, &'a [f64]>,
    is_gap: &'a [bool],
    len: usize,
}

impl<'a> ColumnTable<'a> {
    pub fn new(columns: HashMap<&'a str, &'a [f64]>, is_gap: &'a [bool], len: usize) -> Self {
        Self { columns, is_gap, len }
    }

    pub fn column(&self, name: &str) -> Option<&'a [f64]> {
        self.columns.get(name).copied()
    }

    pub fn is_gap(&self) -> &'a [bool] {
        self.is_gap
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

pub type ComputeResult = Result<Vec<(String, Vec<f64>)>, String>;
pub type IndicatorFn = Arc<dyn Fn(&ColumnTable<'_>, &Params) -> ComputeResult + Send + Sync>;

/// `{name, requires, provides, version, compute, default_params, gap_policy}`
/// (spec §3). `provides` must be non-empty; enforced at registration by
/// [`crate::registry::IndicatorRegistry::register`], not here.
#[derive(Clone)]
pub struct IndicatorSpec {
    pub name: String,
    pub requires: Vec<String>,
    pub provides: Vec<String>,
    pub version: String,
    pub default_params: HashMap<String, f64>,
    pub gap_policy: GapPolicy,
    pub compute: IndicatorFn,
}

impl std::fmt::Debug for IndicatorSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndicatorSpec")
            .field("name", &self.name)
            .field("requires", &self.requires)
            .field("provides", &self.provides)
            .field("version", &self.version)
            .finish()
    }
}

fn apply_gap_policy(values: &mut [f64], is_gap: &[bool], policy: GapPolicy) {
    if policy == GapPolicy::PropagateNan {
        for (v, &gap) in values.iter_mut().zip(is_gap) {
            if gap {
                *v = f64::NAN;
            }
        }
    }
}

/// Exponential moving average over `close`. NaN for the first `period - 1`
/// rows; seeded with the simple average of the first `period` values.
pub fn ema(name: impl Into<String>, period: usize) -> IndicatorSpec {
    let name = name.into();
    let provides_name = name.clone();
    IndicatorSpec {
        name,
        requires: vec!["close".to_string()],
        provides: vec![provides_name.clone()],
        version: "1".to_string(),
        default_params: HashMap::from([("period".to_string(), period as f64)]),
        gap_policy: GapPolicy::ComputeNormally,
        compute: Arc::new(move |table, params| {
            let period = params.get_period("period", period);
            let close = table
                .column("close")
                .ok_or_else(|| "missing required column close".to_string())?;
            let mut out = ema_kernel(close, period);
            apply_gap_policy(&mut out, table.is_gap(), GapPolicy::ComputeNormally);
            Ok(vec![(provides_name.clone(), out)])
        }),
    }
}

fn ema_kernel(close: &[f64], period: usize) -> Vec<f64> {
    let n = close.len();
    let mut out = vec![f64::NAN; n];
    if n < period || period == 0 {
        return out;
    }
    let seed: f64 = close[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = seed;
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = seed;
    for i in period..n {
        let next = alpha * close[i] + (1.0 - alpha) * prev;
        out[i] = next;
        prev = next;
    }
    out
}

/// Average true range over `high, low, close`, Wilder-smoothed. NaN for the
/// first `period - 1` rows.
pub fn atr(name: impl Into<String>, period: usize) -> IndicatorSpec {
    let name = name.into();
    let provides_name = name.clone();
    IndicatorSpec {
        name,
        requires: vec!["high".to_string(), "low".to_string(), "close".to_string()],
        provides: vec![provides_name.clone()],
        version: "1".to_string(),
        default_params: HashMap::from([("period".to_string(), period as f64)]),
        gap_policy: GapPolicy::ComputeNormally,
        compute: Arc::new(move |table, params| {
            let period = params.get_period("period", period);
            let high = table.column("high").ok_or_else(|| "missing required column high".to_string())?;
            let low = table.column("low").ok_or_else(|| "missing required column low".to_string())?;
            let close = table.column("close").ok_or_else(|| "missing required column close".to_string())?;
            let mut out = atr_kernel(high, low, close, period);
            apply_gap_policy(&mut out, table.is_gap(), GapPolicy::ComputeNormally);
            Ok(vec![(provides_name.clone(), out)])
        }),
    }
}

fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let n = high.len();
    let mut tr = vec![0.0; n];
    if n == 0 {
        return tr;
    }
    tr[0] = high[0] - low[0];
    for i in 1..n {
        let hl = high[i] - low[i];
        let hc = (high[i] - close[i - 1]).abs();
        let lc = (low[i] - close[i - 1]).abs();
        tr[i] = hl.max(hc).max(lc);
    }
    tr
}

fn atr_kernel(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    let n = high.len();
    let mut out = vec![f64::NAN; n];
    if n < period || period == 0 {
        return out;
    }
    let tr = true_range(high, low, close);
    let seed: f64 = tr[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = seed;
    let mut prev = seed;
    for i in period..n {
        let next = (prev * (period - 1) as f64 + tr[i]) / period as f64;
        out[i] = next;
        prev = next;
    }
    out
}

/// Stochastic RSI: Wilder's RSI over `close` (period `rsi_period`), then a
/// min-max stochastic normalization over a trailing window of `stoch_period`
/// RSI values. NaN for the first `rsi_period + stoch_period - 2` rows.
pub fn stochastic_rsi(name: impl Into<String>, rsi_period: usize, stoch_period: usize) -> IndicatorSpec {
    let name = name.into();
    let provides_name = name.clone();
    IndicatorSpec {
        name,
        requires: vec!["close".to_string()],
        provides: vec![provides_name.clone()],
        version: "1".to_string(),
        default_params: HashMap::from([
            ("rsi_period".to_string(), rsi_period as f64),
            ("stoch_period".to_string(), stoch_period as f64),
        ]),
        gap_policy: GapPolicy::ComputeNormally,
        compute: Arc::new(move |table, params| {
            let rsi_period = params.get_period("rsi_period", rsi_period);
            let stoch_period = params.get_period("stoch_period", stoch_period);
            let close = table.column("close").ok_or_else(|| "missing required column close".to_string())?;
            let mut out = stochastic_rsi_kernel(close, rsi_period, stoch_period);
            apply_gap_policy(&mut out, table.is_gap(), GapPolicy::ComputeNormally);
            Ok(vec![(provides_name.clone(), out)])
        }),
    }
}

fn rsi_kernel(close: &[f64], period: usize) -> Vec<f64> {
    let n = close.len();
    let mut out = vec![f64::NAN; n];
    if n <= period || period == 0 {
        return out;
    }
    let mut gains = 0.0;
    let mut losses = 0.0;
    for i in 1..=period {
        let delta = close[i] - close[i - 1];
        if delta >= 0.0 {
            gains += delta;
        } else {
            losses -= delta;
        }
    }
    let mut avg_gain = gains / period as f64;
    let mut avg_loss = losses / period as f64;
    out[period] = rsi_from_averages(avg_gain, avg_loss);
    for i in (period + 1)..n {
        let delta = close[i] - close[i - 1];
        let (gain, loss) = if delta >= 0.0 { (delta, 0.0) } else { (0.0, -delta) };
        avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
        out[i] = rsi_from_averages(avg_gain, avg_loss);
    }
    out
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

fn stochastic_rsi_kernel(close: &[f64], rsi_period: usize, stoch_period: usize) -> Vec<f64> {
    let n = close.len();
    let rsi = rsi_kernel(close, rsi_period);
    let mut out = vec![f64::NAN; n];
    if stoch_period == 0 {
        return out;
    }
    for i in 0..n {
        if i + 1 < stoch_period {
            continue;
        }
        let window = &rsi[(i + 1 - stoch_period)..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        let lo = window.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = window.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        out[i] = if hi > lo { (rsi[i] - lo) / (hi - lo) } else { 0.0 };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_close<'a>(close: &'a [f64], is_gap: &'a [bool]) -> ColumnTable<'a> {
        let mut columns = HashMap::new();
        columns.insert("close", close);
        ColumnTable::new(columns, is_gap, close.len())
    }

    #[test]
    fn ema_first_period_minus_one_rows_are_nan() {
        let close: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let is_gap = vec![false; close.len()];
        let spec = ema("ema_fast", 10);
        let table = table_with_close(&close, &is_gap);
        let out = (spec.compute)(&table, &Params::default()).unwrap();
        let (col_name, values) = &out[0];
        assert_eq!(col_name, "ema_fast");
        assert!(values[..9].iter().all(|v| v.is_nan()));
        assert!(!values[9].is_nan());
    }

    #[test]
    fn atr_requires_high_low_close() {
        let spec = atr("atr", 14);
        assert_eq!(spec.requires, vec!["high", "low", "close"]);
        assert_eq!(spec.provides, vec!["atr"]);
    }

    #[test]
    fn stochastic_rsi_is_bounded_in_unit_interval() {
        let close: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.37).sin() * 5.0).collect();
        let is_gap = vec![false; close.len()];
        let spec = stochastic_rsi("stoch_rsi", 14, 14);
        let table = table_with_close(&close, &is_gap);
        let out = (spec.compute)(&table, &Params::default()).unwrap();
        let (_, values) = &out[0];
        for &v in values.iter().filter(|v| !v.is_nan()) {
            assert!((0.0..=1.0).contains(&v), "stoch rsi value {v} out of range");
        }
    }

    #[test]
    fn gap_rows_propagate_nan_when_policy_requests_it() {
        let mut values = vec![1.0, 2.0, 3.0];
        let is_gap = vec![false, true, false];
        apply_gap_policy(&mut values, &is_gap, GapPolicy::PropagateNan);
        assert_eq!(values[0], 1.0);
        assert!(values[1].is_nan());
        assert_eq!(values[2], 3.0);
    }
}
