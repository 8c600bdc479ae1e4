//! Range Sharding Strategy
//!
//! Each shard owns a half-open range of integer keys starting at its lower
//! bound and ending at the next shard's lower bound.

use std::collections::BTreeMap;
use tracing::trace;

use strata_core::TableConfig;
use strata_types::Value;

use super::ShardingStrategy;
use crate::types::ShardId;

/// Integer range sharding strategy
#[derive(Debug, Clone, Default)]
pub struct RangeStrategy {
    /// Lower bound → shard identifier
    bounds: BTreeMap<i64, ShardId>,
}

impl RangeStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys from `lower_bound` up to the next bound go to `shard`
    pub fn with_range(mut self, lower_bound: i64, shard: impl Into<ShardId>) -> Self {
        self.bounds.insert(lower_bound, shard.into());
        self
    }
}

impl ShardingStrategy for RangeStrategy {
    fn shard_id(&self, _table: &TableConfig, key: &Value) -> Option<ShardId> {
        let key = key.as_i64()?;
        let (lower, shard) = self.bounds.range(..=key).next_back()?;
        trace!(key, lower_bound = *lower, shard = %shard, "Range shard lookup");
        Some(shard.clone())
    }

    fn name(&self) -> &'static str {
        "Range"
    }
}
