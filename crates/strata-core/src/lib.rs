//! Strata Core - Shared library for the resolver and selector crates
//!
//! This crate provides the schema configuration and the connection
//! collaborator traits used by strata-router-core and strata-selector.

pub mod config;
pub mod connection;
pub mod error;

pub use config::{SchemaConfig, ShardId, StrataConfig, TableConfig};
pub use connection::{
    Connection, ConnectionProvider, ExecutedStatement, Params, RecordingConnectionProvider,
};
pub use error::{ConfigError, ConnectionError};
