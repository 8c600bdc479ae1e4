//! Sharding Strategies
//!
//! This module contains the shard selection strategies:
//!
//! - `ModuloStrategy`: key modulo the table's shard count
//! - `LookupStrategy`: explicit key → shard table
//! - `RangeStrategy`: ordered integer ranges
//!
//! Strategies are registered by name in a `StrategyRegistry`; a table's
//! configuration refers to its strategy by that name.
//!
//! # Resolution
//!
//! ```text
//! (table config, sharding key)
//!        │
//!        ▼
//! ┌─────────────────────────┐
//! │   ShardingStrategy      │  Pure, deterministic
//! │   (Which shard id?)     │
//! └───────────┬─────────────┘
//!             │ Some(shard id) / None (not applicable)
//!             ▼
//! ┌─────────────────────────┐
//! │   SchemaManager         │  shard id → connection name
//! └─────────────────────────┘
//! ```

mod lookup;
mod modulo;
mod range;

pub use lookup::LookupStrategy;
pub use modulo::ModuloStrategy;
pub use range::RangeStrategy;

use std::collections::HashMap;
use std::sync::Arc;

use strata_core::TableConfig;
use strata_types::Value;

use crate::types::ShardId;

/// Trait for shard selection strategies
pub trait ShardingStrategy: Send + Sync {
    /// Map a sharding key to a shard identifier, or `None` when the strategy
    /// does not apply to this key
    fn shard_id(&self, table: &TableConfig, key: &Value) -> Option<ShardId>;

    /// Strategy name for logging
    fn name(&self) -> &'static str;
}

/// Named sharding strategies
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<dyn ShardingStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the parameterless strategies under their usual names
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("modulo", ModuloStrategy);
        registry
    }

    /// Register (or replace) a strategy
    pub fn register(&mut self, name: impl Into<String>, strategy: impl ShardingStrategy + 'static) {
        self.strategies.insert(name.into(), Arc::new(strategy));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ShardingStrategy>> {
        self.strategies.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.strategies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.names())
            .finish()
    }
}
