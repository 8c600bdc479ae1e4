//! Lookup-table Sharding Strategy
//!
//! Routes keys through an explicit directory, typically loaded from a tenant
//! registry. Keys are compared by their display form, so `Int(42)` and
//! `Text("42")` land on the same entry.

use std::collections::HashMap;
use tracing::trace;

use strata_core::TableConfig;
use strata_types::Value;

use super::ShardingStrategy;
use crate::types::ShardId;

/// Directory-based sharding strategy
#[derive(Debug, Clone, Default)]
pub struct LookupStrategy {
    directory: HashMap<String, ShardId>,
    default_shard: Option<ShardId>,
}

impl LookupStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map one key to a shard
    pub fn with_entry(mut self, key: impl Into<Value>, shard: impl Into<ShardId>) -> Self {
        self.insert(key, shard);
        self
    }

    /// Shard used for keys missing from the directory
    pub fn with_default(mut self, shard: impl Into<ShardId>) -> Self {
        self.default_shard = Some(shard.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<Value>, shard: impl Into<ShardId>) {
        self.directory.insert(key.into().to_string(), shard.into());
    }

    pub fn len(&self) -> usize {
        self.directory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directory.is_empty()
    }
}

impl ShardingStrategy for LookupStrategy {
    fn shard_id(&self, _table: &TableConfig, key: &Value) -> Option<ShardId> {
        if key.is_null() {
            return None;
        }

        let found = self.directory.get(&key.to_string());
        trace!(key = %key, hit = found.is_some(), "Lookup shard directory");
        found.or(self.default_shard.as_ref()).cloned()
    }

    fn name(&self) -> &'static str {
        "Lookup"
    }
}
