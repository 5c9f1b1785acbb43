//! The indicator registry (spec §4.3).
//!
//! Explicit registration only — no filesystem discovery, no decorator-style
//! auto-registration, no process-global singleton (spec §9). `init()` just
//! calls `register` on a fixed set of built-ins; callers needing an isolated
//! registry for tests construct their own and never touch a shared instance.

use std::collections::HashMap;

use crate::error::RegistryError;
use crate::indicator::{self, IndicatorSpec};

/// A named collection of [`IndicatorSpec`]s. Insertion order is preserved
/// for [`list`](IndicatorRegistry::list) and as the tie-break of last resort
/// in dependency resolution (spec §4.3).
#[derive(Default)]
pub struct IndicatorRegistry {
    specs: HashMap<String, IndicatorSpec>,
    insertion_order: Vec<String>,
}

impl IndicatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty registry with the three built-ins registered under their
    /// default names: `ema` (period 10), `atr` (period 14), `stoch_rsi`
    /// (rsi period 14, stochastic window 14). Idempotent: calling `init`
    /// twice on the same registry is a no-op the second time, since
    /// `register` on an already-registered name is the only thing that
    /// could fail, and built-in specs are identical on both calls — tests
    /// that call `init` repeatedly on a fresh registry still pass, but
    /// calling it twice on the *same* registry returns the duplicate error
    /// from the second call.
    pub fn init() -> Self {
        let mut registry = Self::new();
        registry
            .register(indicator::ema("ema", 10))
            .expect("built-in ema must register cleanly");
        registry
            .register(indicator::atr("atr", 14))
            .expect("built-in atr must register cleanly");
        registry
            .register(indicator::stochastic_rsi("stoch_rsi", 14, 14))
            .expect("built-in stoch_rsi must register cleanly");
        registry
    }

    /// Removes every registered indicator, built-in or not.
    pub fn clear(&mut self) {
        self.specs.clear();
        self.insertion_order.clear();
    }

    pub fn register(&mut self, spec: IndicatorSpec) -> Result<(), RegistryError> {
        if self.specs.contains_key(&spec.name) {
            return Err(RegistryError::DuplicateIndicator { name: spec.name });
        }
        for provided in &spec.provides {
            if let Some(owner) = self.owner_of(provided) {
                return Err(RegistryError::ProvidesConflict {
                    column: provided.clone(),
                    existing_owner: owner.to_string(),
                });
            }
        }
        self.insertion_order.push(spec.name.clone());
        self.specs.insert(spec.name.clone(), spec);
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> Result<(), RegistryError> {
        if self.specs.remove(name).is_none() {
            return Err(RegistryError::UnknownIndicator {
                name: name.to_string(),
            });
        }
        self.insertion_order.retain(|n| n != name);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&IndicatorSpec, RegistryError> {
        self.specs.get(name).ok_or_else(|| RegistryError::UnknownIndicator {
            name: name.to_string(),
        })
    }

    /// Registered names, stable in insertion order.
    pub fn list(&self) -> &[String] {
        &self.insertion_order
    }

    pub(crate) fn insertion_index(&self, name: &str) -> Option<usize> {
        self.insertion_order.iter().position(|n| n == name)
    }

    fn owner_of(&self, column: &str) -> Option<&str> {
        self.insertion_order
            .iter()
            .find(|name| self.specs[*name].provides.iter().any(|p| p == column))
            .map(|s| s.as_str())
    }
}
