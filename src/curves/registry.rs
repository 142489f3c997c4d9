use std::sync::Arc;

use log::debug;
use rustc_hash::FxHashMap;

use crate::{
    curves::{ConstantProduct, ConstantProduct2, CurveStrategy, Stable2},
    error::{EngineError, EngineResult},
};

/// Curve strategies keyed by curve id.
///
/// Ids and aliases are matched case-insensitively, so a well-function
/// address can be aliased in any hex casing.
#[derive(Debug, Clone, Default)]
pub struct CurveRegistry {
    strategies: FxHashMap<String, Arc<dyn CurveStrategy>>,
    aliases: FxHashMap<String, String>,
}

impl CurveRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in strategy.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ConstantProduct2));
        registry.register(Arc::new(ConstantProduct));
        registry.register(Arc::new(Stable2));
        registry
    }

    pub fn register(&mut self, strategy: Arc<dyn CurveStrategy>) {
        self.strategies
            .insert(strategy.id().to_ascii_lowercase(), strategy);
    }

    /// Route `alias` (e.g. a well-function address) to strategy `id`.
    pub fn add_alias(&mut self, alias: &str, id: &str) {
        debug!("Curve alias {} -> {}", alias, id);
        self.aliases
            .insert(alias.to_ascii_lowercase(), id.to_ascii_lowercase());
    }

    /// Resolve a curve id, following at most one alias hop.
    pub fn resolve(&self, curve_id: &str) -> EngineResult<Arc<dyn CurveStrategy>> {
        let key = curve_id.to_ascii_lowercase();
        let target = self.aliases.get(&key).unwrap_or(&key);
        self.strategies
            .get(target)
            .cloned()
            .ok_or_else(|| EngineError::StrategyUnavailable {
                curve_id: curve_id.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
