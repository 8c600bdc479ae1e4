//! Strata Router Core - Shard Resolution Module
//!
//! Maps logical tables onto physical connections and renders the statements
//! that run there.
//!
//! # Architecture
//!
//! ```text
//! (table, sharding key, criteria)
//!     │
//!     ▼
//! ┌─────────────────────────┐
//! │   ShardingStrategy      │  Which shard id?
//! └───────────┬─────────────┘
//!             │
//!             ▼
//! ┌─────────────────────────┐
//! │     SchemaManager       │  Which connection, which physical table?
//! └───────────┬─────────────┘
//!             │
//!             ▼
//! ┌─────────────────────────┐
//! │   Statement builder     │  Parameterized SELECT / DELETE
//! └─────────────────────────┘
//! ```
//!
//! # Sharding Strategies
//!
//! - **ModuloStrategy**: key modulo the table's shard count (registered as `modulo`)
//! - **LookupStrategy**: explicit key → shard directory
//! - **RangeStrategy**: ordered integer ranges
//!
//! # Example
//!
//! ```rust,ignore
//! use strata_router_core::{SchemaManager, TableSpec, FetchOptions};
//!
//! let manager = SchemaManager::new(schema, provider);
//!
//! // users_<shard> on the connection owning user 42
//! let rows = manager.fetch_ids(
//!     &TableSpec::from("users"),
//!     &Criteria::new().with("status", "active"),
//!     &["id".to_string()],
//!     Some(&Value::Int(42)),
//!     false,
//!     &FetchOptions::default(),
//! )?;
//! ```

// Core modules
mod error;
mod types;
mod query;

// Strategy module (contains all sharding strategies)
mod strategy;

// Resolver
mod schema;


// Re-exports: Error types
pub use error::SchemaError;

// Re-exports: Core types
pub use types::{physical_table_name, ShardId, DEFAULT_ID_FIELD, SHARD_SUFFIX_SEPARATOR};

// Re-exports: Statement construction
pub use query::{parameter_name, quote_identifier, FetchOptions, JoinSpec, Statement, TableSpec};

// Re-exports: Strategy trait and implementations
pub use strategy::{LookupStrategy, ModuloStrategy, RangeStrategy, ShardingStrategy, StrategyRegistry};

// Re-exports: Resolver
pub use schema::SchemaManager;
