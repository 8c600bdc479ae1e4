//! Modulo Sharding Strategy
//!
//! Spreads keys over the table's shards by remainder. Shards of a table using
//! this strategy are expected to be named `0` to `n - 1`.

use blake3::Hasher;
use tracing::trace;

use strata_core::TableConfig;
use strata_types::Value;

use super::ShardingStrategy;
use crate::types::ShardId;

/// Hash/modulo sharding strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuloStrategy;

impl ModuloStrategy {
    /// Hash a text key using blake3
    fn hash_key(key: &str) -> u64 {
        let mut hasher = Hasher::new();
        hasher.update(key.as_bytes());
        let hash = hasher.finalize();
        let bytes = hash.as_bytes();
        u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3],
            bytes[4], bytes[5], bytes[6], bytes[7],
        ])
    }

    /// Remainder of a key over `shard_count` shards
    fn bucket(key: &Value, shard_count: u64) -> Option<u64> {
        // Numeric text behaves like the number it spells
        if let Some(n) = key.as_i64() {
            return Some(n.rem_euclid(shard_count as i64) as u64);
        }
        match key {
            Value::Text(s) => Some(Self::hash_key(s) % shard_count),
            _ => None,
        }
    }
}

impl ShardingStrategy for ModuloStrategy {
    fn shard_id(&self, table: &TableConfig, key: &Value) -> Option<ShardId> {
        let shard_count = table.shard_count() as u64;
        if shard_count == 0 {
            return None;
        }

        let bucket = Self::bucket(key, shard_count)?;
        trace!(key = %key, shard_count, bucket, "Modulo shard lookup");
        Some(bucket.to_string())
    }

    fn name(&self) -> &'static str {
        "Modulo"
    }
}
