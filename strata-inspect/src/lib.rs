//! Strata Inspect - Routing and query inspection
//!
//! The inspector is responsible for:
//! - Explaining which shard, connection and physical table serve a key
//! - Rendering the identifier query a selector would run, without a database

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use strata_core::{
    ConfigError, ExecutedStatement, Params, RecordingConnectionProvider, SchemaConfig, ShardId,
    StrataConfig,
};
use strata_router_core::{SchemaError, SchemaManager};
use strata_selector::{Chain, DatabaseSource, MemorySource, Selector, SelectorError, SelectorSource};
use strata_types::{CriteriaValue, Value};

/// Filter argument errors
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid filter {0} (expected field=value)")]
    InvalidFilter(String),
}

#[derive(Parser, Debug)]
#[command(name = "strata-inspect")]
#[command(about = "Explain shard routing and render identifier queries")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Shard, connection and physical table serving a key
    Route {
        table: String,
        #[arg(value_parser = parse_key, allow_negative_numbers = true)]
        key: Option<Value>,
    },
    /// Identifier query a selector runs, as a dry run
    Select {
        table: String,
        #[arg(long, value_parser = parse_key, allow_negative_numbers = true)]
        key: Option<Value>,
        /// `field=value`; commas make a list, `null` is NULL
        #[arg(value_parser = parse_filter)]
        filters: Vec<(String, CriteriaValue)>,
    },
}

/// Integer when it parses, `null` for NULL, text otherwise
pub fn parse_value(raw: &str) -> Value {
    if raw == "null" {
        return Value::Null;
    }
    raw.parse::<i64>()
        .map(Value::Int)
        .unwrap_or_else(|_| Value::Text(raw.to_string()))
}

fn parse_key(raw: &str) -> Result<Value, Infallible> {
    Ok(parse_value(raw))
}

/// `field=value`; a comma-separated value becomes a list
pub fn parse_filter(raw: &str) -> Result<(String, CriteriaValue), FilterError> {
    let (field, value) = raw
        .split_once('=')
        .filter(|(field, _)| !field.is_empty())
        .ok_or_else(|| FilterError::InvalidFilter(raw.to_string()))?;

    let value = if value.contains(',') {
        CriteriaValue::list(value.split(',').map(parse_value))
    } else {
        CriteriaValue::from(parse_value(value))
    };
    Ok((field.to_string(), value))
}

/// Where a key of a table lives
#[derive(Debug, Clone, PartialEq)]
pub struct RouteReport {
    pub table: String,
    pub key: Option<Value>,
    pub shard: Option<ShardId>,
    pub connection: String,
    pub physical_table: String,
}

impl fmt::Display for RouteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.key.as_ref().map(Value::to_string).unwrap_or_else(|| "-".to_string());
        let shard = self.shard.as_deref().unwrap_or("-");
        writeln!(f, "table:      {}", self.table)?;
        writeln!(f, "key:        {}", key)?;
        writeln!(f, "shard:      {}", shard)?;
        writeln!(f, "connection: {}", self.connection)?;
        write!(f, "physical:   {}", self.physical_table)
    }
}

/// Statement a selector ran in dry-run mode
#[derive(Debug, Clone, PartialEq)]
pub struct SelectReport {
    pub statement: ExecutedStatement,
}

impl fmt::Display for SelectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let statement = &self.statement;
        writeln!(f, "connection: {} (master: {})", statement.connection, statement.force_master)?;
        write!(f, "sql:        {}", statement.sql)?;
        match &statement.params {
            Params::Named(params) => {
                for (name, value) in params {
                    write!(f, "\n  {} = {}", name, value)?;
                }
            }
            Params::Positional(values) => {
                for (index, value) in values.iter().enumerate() {
                    write!(f, "\n  ?{} = {}", index + 1, value)?;
                }
            }
        }
        Ok(())
    }
}

/// Inspector errors
#[derive(Debug, Error)]
pub enum InspectError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error("No statement was executed")]
    NothingExecuted,
}

/// Dry-run inspector over one schema
pub struct Inspector {
    config: StrataConfig,
    schema: Arc<SchemaManager>,
    provider: RecordingConnectionProvider,
}

impl Inspector {
    /// Create an inspector; statements go to a recording provider
    pub fn new(config: StrataConfig, schema: SchemaConfig) -> Self {
        let provider = RecordingConnectionProvider::new();
        let manager = SchemaManager::new(schema, Arc::new(provider.clone()));
        info!(
            tables = manager.schema().tables().count(),
            strategies = ?manager.strategies().names(),
            "Creating inspector"
        );
        Self {
            config,
            schema: Arc::new(manager),
            provider,
        }
    }

    /// Create from process configuration, loading the schema file
    pub fn from_config(config: StrataConfig) -> Result<Self, ConfigError> {
        let schema = config.load_schema()?;
        Ok(Self::new(config, schema))
    }

    pub fn schema_manager(&self) -> &Arc<SchemaManager> {
        &self.schema
    }

    /// Every statement executed so far
    pub fn executed(&self) -> Vec<ExecutedStatement> {
        self.provider.executed()
    }

    /// Explain where `(table, key)` lives
    pub fn route(&self, table: &str, key: Option<&Value>) -> Result<RouteReport, SchemaError> {
        let shard = self.schema.sharding_identifier(table, key)?;
        let connection = self.schema.connection_name(table, key, self.config.force_master)?;
        let physical_table = self.schema.physical_table(table, key)?;

        Ok(RouteReport {
            table: table.to_string(),
            key: key.cloned(),
            shard,
            connection,
            physical_table,
        })
    }

    /// Run an identifier selector in dry-run mode and report its statement
    pub fn select(
        &self,
        table: &str,
        key: Option<&Value>,
        filters: &[(String, CriteriaValue)],
    ) -> Result<SelectReport, InspectError> {
        let before = self.provider.execution_count();

        let memory: Arc<dyn SelectorSource> = Arc::new(MemorySource::new());
        let database: Arc<dyn SelectorSource> = Arc::new(DatabaseSource::new(Arc::clone(&self.schema)));
        let chain = Chain::new(vec![memory, database])?;

        let mut selector = Selector::new(Arc::new(chain), table);
        selector.force_master(self.config.force_master);
        if let Some(key) = key {
            selector.sharding_key(key.clone());
        }
        for (field, value) in filters {
            selector.filter(field.clone(), value.clone());
        }
        selector.ids()?;

        if self.provider.execution_count() == before {
            return Err(InspectError::NothingExecuted);
        }
        let statement = self.provider.last_executed().ok_or(InspectError::NothingExecuted)?;
        Ok(SelectReport { statement })
    }

    /// Run a parsed command, returning the printable report
    pub fn run(&self, command: &Command) -> Result<String, InspectError> {
        match command {
            Command::Route { table, key } => Ok(self.route(table, key.as_ref())?.to_string()),
            Command::Select { table, key, filters } => {
                Ok(self.select(table, key.as_ref(), filters)?.to_string())
            }
        }
    }
}
