//! Common types for the resolver module
//!
//! Centralizes type definitions to avoid duplication across modules.

pub use strata_core::ShardId;

/// Identifier column used when the caller names none
pub const DEFAULT_ID_FIELD: &str = "id";

/// Separator between a logical table name and its shard suffix
pub const SHARD_SUFFIX_SEPARATOR: char = '_';

/// Physical name of a table on a shard: `users` + `3` → `users_3`
pub fn physical_table_name(table: &str, shard: Option<&str>) -> String {
    match shard {
        Some(shard) => format!("{}{}{}", table, SHARD_SUFFIX_SEPARATOR, shard),
        None => table.to_string(),
    }
}
