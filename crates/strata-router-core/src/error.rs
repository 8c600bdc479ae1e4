//! Error types for shard resolution and statement construction

use strata_core::ConnectionError;
use thiserror::Error;

/// Schema resolver error types
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Table is not in the schema configuration
    #[error("{0} is not in given configuration")]
    UnknownTable(String),

    /// Table names a strategy that was never registered
    #[error("Sharding strategy {strategy} not found for table {table}")]
    UnknownStrategy { strategy: String, table: String },

    /// No shard could be resolved and the table has several
    #[error("Table {table} is not configured as sharded: {shards} connections found")]
    AmbiguousShard { table: String, shards: usize },

    /// The strategy picked a shard that has no connection
    #[error("No connection found for table {table} and shard {shard}")]
    ShardNotFound { table: String, shard: String },

    /// Joined tables live on different connections
    #[error("Expected connection {expected}, but {table} uses {found}")]
    CrossShardJoin {
        expected: String,
        table: String,
        found: String,
    },

    /// Query would scan the whole table without being allowed to
    #[error("Trying to load from {0} with no criteria")]
    EmptyCriteria(String),

    /// No table was given
    #[error("Table name must not be empty")]
    EmptyTableName,

    /// Criterion shape not accepted by this statement kind
    #[error("Unsupported value for criterion {key}: {reason}")]
    UnsupportedCriteriaValue { key: String, reason: &'static str },

    /// Connection provider or driver failure
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}
