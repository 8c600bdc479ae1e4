//! Configuration module for Strata
//!
//! Two layers:
//! - `SchemaConfig`: per-table shard maps, loaded from a JSON document
//! - `StrataConfig`: process settings read from the environment

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ConfigError;

/// Shard identifier, as written in the schema configuration
pub type ShardId = String;

/// Shard configuration of one logical table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Shard identifier → connection name
    pub shards: BTreeMap<ShardId, String>,

    /// Name of the registered sharding strategy, if the table is sharded
    #[serde(
        rename = "shardingStrategy",
        alias = "sharding_strategy",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sharding_strategy: Option<String>,
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table living on a single connection
    pub fn single(connection: impl Into<String>) -> Self {
        Self::new().with_shard("0", connection)
    }

    pub fn with_shard(mut self, shard_id: impl Into<ShardId>, connection: impl Into<String>) -> Self {
        self.shards.insert(shard_id.into(), connection.into());
        self
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.sharding_strategy = Some(strategy.into());
        self
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Connection name of a shard
    pub fn connection_for(&self, shard_id: &str) -> Option<&str> {
        self.shards.get(shard_id).map(String::as_str)
    }

    /// The only connection of an unsharded table
    pub fn single_connection(&self) -> Option<&str> {
        if self.shards.len() == 1 {
            self.shards.values().next().map(String::as_str)
        } else {
            None
        }
    }
}

/// Schema configuration: logical table name → shard configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaConfig {
    tables: BTreeMap<String, TableConfig>,
}

impl SchemaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: impl Into<String>, table: TableConfig) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    pub fn table(&self, name: &str) -> Option<&TableConfig> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = (&String, &TableConfig)> {
        self.tables.iter()
    }

    /// Every table must map at least one shard
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, table) in &self.tables {
            if table.shards.is_empty() {
                return Err(ConfigError::EmptyShards(name.clone()));
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON schema document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SchemaConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON schema file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        debug!(path = %path.display(), tables = config.tables.len(), "Loaded schema configuration");
        Ok(config)
    }
}

/// Process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrataConfig {
    /// Path to the schema JSON file
    pub schema_path: Option<PathBuf>,

    /// Route reads to master connections
    pub force_master: bool,

    /// Tracing filter directive
    pub log_filter: String,
}

impl Default for StrataConfig {
    fn default() -> Self {
        Self {
            schema_path: None,
            force_master: false,
            log_filter: "info".to_string(),
        }
    }
}

impl StrataConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = StrataConfig::default();

        // Schema file
        if let Ok(path) = std::env::var("STRATA_SCHEMA") {
            if !path.trim().is_empty() {
                config.schema_path = Some(PathBuf::from(path));
            }
        }

        // Master reads
        if let Ok(flag) = std::env::var("STRATA_FORCE_MASTER") {
            config.force_master = matches!(flag.trim(), "1" | "true" | "yes");
        }

        // Log filter
        if let Ok(filter) = std::env::var("STRATA_LOG") {
            config.log_filter = filter;
        }

        config
    }

    /// Load the schema configured by `schema_path`
    pub fn load_schema(&self) -> Result<SchemaConfig, ConfigError> {
        let path = self
            .schema_path
            .as_ref()
            .ok_or(ConfigError::MissingVariable("STRATA_SCHEMA"))?;
        SchemaConfig::from_file(path)
    }
}
