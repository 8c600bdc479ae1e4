//! Schema Resolver
//!
//! Maps a logical table plus an optional sharding key onto a connection name
//! and a physical table, then builds and runs SELECT / DELETE statements.
//!
//! # Resolution Decision Tree
//!
//! ```text
//! (table, sharding key)
//!        │
//!        ▼
//! Key given? ──No──────────────────┐
//!        │                         │
//!       Yes                        │
//!        ▼                         │
//! Table configured? ──No──► UnknownTable
//!        │                         │
//!       Yes                        │
//!        ▼                         │
//! Strategy configured? ──No────────┤
//!        │                         │
//!       Yes                        ▼
//!        ▼                 Exactly one shard? ──No──► AmbiguousShard
//! Strategy → shard id              │
//!        │                        Yes
//!        ▼                         ▼
//! Shard in map? ──No──► ShardNotFound      that shard's connection
//!        │
//!       Yes ──► connection name
//! ```

use std::sync::Arc;
use tracing::{debug, trace};

use strata_core::{ConnectionProvider, Params, SchemaConfig, TableConfig};
use strata_types::{Criteria, Row, Value};

use crate::error::SchemaError;
use crate::query::{
    quote_identifier, render_delete_where, render_where, FetchOptions, JoinSpec, Statement, TableSpec,
};
use crate::strategy::{ShardingStrategy, StrategyRegistry};
use crate::types::{physical_table_name, ShardId};

/// Owns the shard configuration and the strategy registry
pub struct SchemaManager {
    schema: SchemaConfig,
    strategies: StrategyRegistry,
    connections: Arc<dyn ConnectionProvider>,
}

impl SchemaManager {
    /// Create with the default strategy registry
    pub fn new(schema: SchemaConfig, connections: Arc<dyn ConnectionProvider>) -> Self {
        Self::with_registry(schema, StrategyRegistry::with_defaults(), connections)
    }

    /// Create with a custom strategy registry
    pub fn with_registry(
        schema: SchemaConfig,
        strategies: StrategyRegistry,
        connections: Arc<dyn ConnectionProvider>,
    ) -> Self {
        Self {
            schema,
            strategies,
            connections,
        }
    }

    /// Register a strategy under `name` (builder style)
    pub fn with_strategy(mut self, name: impl Into<String>, strategy: impl ShardingStrategy + 'static) -> Self {
        self.add_sharding_strategy(name, strategy);
        self
    }

    /// Register a strategy under `name`
    pub fn add_sharding_strategy(&mut self, name: impl Into<String>, strategy: impl ShardingStrategy + 'static) {
        self.strategies.register(name, strategy);
    }

    pub fn schema(&self) -> &SchemaConfig {
        &self.schema
    }

    pub fn strategies(&self) -> &StrategyRegistry {
        &self.strategies
    }

    fn table_config(&self, table: &str) -> Result<&TableConfig, SchemaError> {
        self.schema
            .table(table)
            .ok_or_else(|| SchemaError::UnknownTable(table.to_string()))
    }

    /// Shard identifier for `(table, key)`, or `None` when sharding does not
    /// apply (no key, or no strategy configured for the table)
    pub fn sharding_identifier(&self, table: &str, key: Option<&Value>) -> Result<Option<ShardId>, SchemaError> {
        let Some(key) = key else {
            return Ok(None);
        };

        let config = self.table_config(table)?;
        let Some(strategy_name) = config.sharding_strategy.as_deref() else {
            return Ok(None);
        };

        let strategy = self
            .strategies
            .get(strategy_name)
            .ok_or_else(|| SchemaError::UnknownStrategy {
                strategy: strategy_name.to_string(),
                table: table.to_string(),
            })?;

        let shard = strategy.shard_id(config, key);
        trace!(table = %table, key = %key, strategy = strategy.name(), shard = ?shard, "Resolved sharding identifier");
        Ok(shard)
    }

    /// Connection name serving `(table, key)`
    pub fn connection_name(&self, table: &str, key: Option<&Value>, force_master: bool) -> Result<String, SchemaError> {
        let shard = self.sharding_identifier(table, key)?;
        let config = self.table_config(table)?;

        let connection = match shard {
            None => config
                .single_connection()
                .ok_or_else(|| SchemaError::AmbiguousShard {
                    table: table.to_string(),
                    shards: config.shard_count(),
                })?,
            Some(shard) => config
                .connection_for(&shard)
                .ok_or_else(|| SchemaError::ShardNotFound {
                    table: table.to_string(),
                    shard: shard.clone(),
                })?,
        };

        debug!(table = %table, connection = %connection, force_master, "Resolved connection");
        Ok(connection.to_string())
    }

    /// Physical table name for `(table, key)`: suffixed when sharding applies
    pub fn physical_table(&self, table: &str, key: Option<&Value>) -> Result<String, SchemaError> {
        let shard = self.sharding_identifier(table, key)?;
        Ok(physical_table_name(table, shard.as_deref()))
    }

    /// Render a SELECT without running it.
    ///
    /// `fields` are inserted verbatim so callers can pass aggregates.
    #[allow(clippy::too_many_arguments)]
    pub fn build_select(
        &self,
        tables: &TableSpec,
        criteria: &Criteria,
        key: Option<&Value>,
        fields: &[String],
        allow_empty_criteria: bool,
        force_master: bool,
        options: &FetchOptions,
    ) -> Result<Statement, SchemaError> {
        if !allow_empty_criteria && criteria.is_empty() {
            return Err(SchemaError::EmptyCriteria(tables.describe()));
        }

        let (connection, from) = match tables {
            TableSpec::Single(table) => {
                if table.is_empty() {
                    return Err(SchemaError::EmptyTableName);
                }
                let connection = self.connection_name(table, key, force_master)?;
                let physical = self.physical_table(table, key)?;
                (connection, quote_identifier(&physical))
            }
            TableSpec::Joined(entries) => self.render_joined(entries, key, force_master)?,
        };

        let mut sql = format!("SELECT {} FROM {}", fields.join(","), from);

        let (clauses, params) = render_where(criteria);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        if let Some(group_by) = &options.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group_by);
        }
        if let Some(order_by) = &options.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }
        if let Some(limit) = options.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        trace!(connection = %connection, sql = %sql, params = params.len(), "Built select");
        Ok(Statement {
            connection,
            force_master,
            sql,
            params: Params::Named(params),
        })
    }

    /// FROM clause for a multi-table read; every table must share one connection
    fn render_joined(
        &self,
        entries: &[(String, JoinSpec)],
        key: Option<&Value>,
        force_master: bool,
    ) -> Result<(String, String), SchemaError> {
        let mut expected: Option<String> = None;
        let mut from = Vec::new();
        let mut joins = Vec::new();

        for (entry, spec) in entries {
            let table = spec.table.as_deref().unwrap_or(entry);
            if table.is_empty() {
                return Err(SchemaError::EmptyTableName);
            }

            let connection = self.connection_name(table, key, force_master)?;
            if let Some(expected) = &expected {
                if *expected != connection {
                    return Err(SchemaError::CrossShardJoin {
                        expected: expected.clone(),
                        table: table.to_string(),
                        found: connection,
                    });
                }
            } else {
                expected = Some(connection);
            }

            let physical = quote_identifier(&self.physical_table(table, key)?);
            match spec.join.as_deref().filter(|j| !j.trim().is_empty()) {
                Some(fragment) => joins.push(fragment.replace("{table}", &physical)),
                None => match &spec.alias {
                    Some(alias) => from.push(format!("{} AS {}", physical, alias)),
                    None => from.push(physical),
                },
            }
        }

        let connection = expected.ok_or(SchemaError::EmptyTableName)?;
        let mut rendered = from.join(",");
        if !joins.is_empty() {
            rendered.push(' ');
            rendered.push_str(&joins.join(" "));
        }
        Ok((connection, rendered))
    }

    /// Build and run a SELECT
    #[allow(clippy::too_many_arguments)]
    pub fn fetch(
        &self,
        tables: &TableSpec,
        criteria: &Criteria,
        key: Option<&Value>,
        fields: &[String],
        allow_empty_criteria: bool,
        force_master: bool,
        options: &FetchOptions,
    ) -> Result<Vec<Row>, SchemaError> {
        let statement = self.build_select(
            tables,
            criteria,
            key,
            fields,
            allow_empty_criteria,
            force_master,
            options,
        )?;
        self.execute_fetch(&statement)
    }

    fn execute_fetch(&self, statement: &Statement) -> Result<Vec<Row>, SchemaError> {
        let connection = self
            .connections
            .connection(&statement.connection, statement.force_master)?;
        let rows = connection.fetch_all(&statement.sql, &statement.params)?;
        debug!(connection = %statement.connection, rows = rows.len(), "Fetched rows");
        Ok(rows)
    }

    /// Fetch every column of the rows matching `criteria`; criteria are mandatory
    pub fn fetch_one(
        &self,
        table: &str,
        criteria: &Criteria,
        key: Option<&Value>,
        force_master: bool,
    ) -> Result<Vec<Row>, SchemaError> {
        self.fetch(
            &TableSpec::from(table),
            criteria,
            key,
            &["*".to_string()],
            false,
            force_master,
            &FetchOptions::default(),
        )
    }

    /// Fetch identifier columns; empty criteria scan the whole table
    pub fn fetch_ids(
        &self,
        tables: &TableSpec,
        criteria: &Criteria,
        fields: &[String],
        key: Option<&Value>,
        force_master: bool,
        options: &FetchOptions,
    ) -> Result<Vec<Row>, SchemaError> {
        self.fetch(tables, criteria, key, fields, true, force_master, options)
    }

    /// Render a DELETE against the master connection of the resolved shard
    pub fn build_delete(&self, table: &str, criteria: &Criteria, key: Option<&Value>) -> Result<Statement, SchemaError> {
        if table.is_empty() {
            return Err(SchemaError::EmptyTableName);
        }
        if criteria.is_empty() {
            return Err(SchemaError::EmptyCriteria(table.to_string()));
        }

        let connection = self.connection_name(table, key, true)?;
        let physical = self.physical_table(table, key)?;
        let (clauses, values) = render_delete_where(criteria)?;

        let sql = format!(
            "DELETE FROM {} WHERE {}",
            quote_identifier(&physical),
            clauses.join(" AND ")
        );

        trace!(connection = %connection, sql = %sql, "Built delete");
        Ok(Statement {
            connection,
            force_master: true,
            sql,
            params: Params::Positional(values),
        })
    }

    /// Delete matching rows, returning the affected-row count
    pub fn remove(&self, table: &str, criteria: &Criteria, key: Option<&Value>) -> Result<u64, SchemaError> {
        let statement = self.build_delete(table, criteria, key)?;
        let connection = self.connections.connection(&statement.connection, true)?;
        let affected = connection.execute_update(&statement.sql, &statement.params)?;
        debug!(table = %table, connection = %statement.connection, affected, "Removed rows");
        Ok(affected)
    }
}

impl std::fmt::Debug for SchemaManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaManager")
            .field("schema", &self.schema)
            .field("strategies", &self.strategies)
            .finish_non_exhaustive()
    }
}
