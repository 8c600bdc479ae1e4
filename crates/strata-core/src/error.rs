//! Error types for configuration loading and connection access

use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Schema file could not be read
    #[error("Failed to read schema file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Schema document is not valid JSON for the expected shape
    #[error("Invalid schema configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A table was configured without any shard
    #[error("Table {0} has no shards configured")]
    EmptyShards(String),

    /// A required environment variable is not set
    #[error("Environment variable {0} is not set")]
    MissingVariable(&'static str),
}

/// Connection error types
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The provider does not know the connection name
    #[error("Unknown connection: {0}")]
    UnknownConnection(String),

    /// The driver rejected or failed the statement
    #[error("Query failed on {connection}: {message}")]
    Query { connection: String, message: String },
}
