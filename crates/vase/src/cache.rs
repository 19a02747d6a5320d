//! Memoized formula compilation.
//!
//! Compiling is cheap next to a full surface pass, but hosts regenerate on
//! every slider move while the formulas rarely change. The cache keeps the
//! most recent compiled pair keyed by both source strings and drops it as
//! soon as either string changes.

use std::sync::Arc;

use tracing::debug;

use crate::formula::CompiledFormula;

/// The radius and vertical formulas used by one generation.
#[derive(Debug, Clone)]
pub struct FormulaPair {
    pub radius: Arc<CompiledFormula>,
    pub vertical: Arc<CompiledFormula>,
}

impl FormulaPair {
    /// Compile both formulas with their identity fallbacks.
    pub fn compile(radius_source: &str, vertical_source: &str) -> Self {
        Self {
            radius: Arc::new(CompiledFormula::radius(radius_source)),
            vertical: Arc::new(CompiledFormula::vertical(vertical_source)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    radius: String,
    vertical: String,
}

/// Single-entry cache of the compiled formula pair.
#[derive(Debug, Default)]
pub struct FormulaCache {
    entry: Option<(CacheKey, FormulaPair)>,
    hits: u64,
    misses: u64,
}

impl FormulaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the compiled pair for these sources, compiling on a miss.
    pub fn get_or_compile(&mut self, radius_source: &str, vertical_source: &str) -> FormulaPair {
        if let Some((key, pair)) = &self.entry {
            if key.radius == radius_source && key.vertical == vertical_source {
                self.hits += 1;
                return pair.clone();
            }
        }

        debug!(
            "Compiling formulas: radius='{}', vertical='{}'",
            radius_source, vertical_source
        );
        self.misses += 1;
        let pair = FormulaPair::compile(radius_source, vertical_source);
        self.entry = Some((
            CacheKey {
                radius: radius_source.to_string(),
                vertical: vertical_source.to_string(),
            },
            pair.clone(),
        ));
        pair
    }

    /// Drop the cached pair so the next lookup recompiles.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    /// Lookups served from the cache
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Lookups that compiled
    pub fn misses(&self) -> u64 {
        self.misses
    }
}
