//! Connection collaborators
//!
//! Strata never owns pooling or drivers. It only asks a provider for a named
//! connection and runs fully rendered statements on it.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

use strata_types::{Row, Value};

use crate::error::ConnectionError;

/// Bound statement parameters
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// `:name` placeholders, in rendering order
    Named(Vec<(String, Value)>),
    /// `?` placeholders
    Positional(Vec<Value>),
}

impl Params {
    pub fn len(&self) -> usize {
        match self {
            Params::Named(p) => p.len(),
            Params::Positional(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a named parameter
    pub fn named(&self, name: &str) -> Option<&Value> {
        match self {
            Params::Named(p) => p.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            Params::Positional(_) => None,
        }
    }
}

/// A live connection to one physical database
pub trait Connection: Send + Sync {
    /// Run a query and return every row, in order
    fn fetch_all(&self, sql: &str, params: &Params) -> Result<Vec<Row>, ConnectionError>;

    /// Run a statement and return the affected-row count
    fn execute_update(&self, sql: &str, params: &Params) -> Result<u64, ConnectionError>;
}

/// Hands out connections by name
pub trait ConnectionProvider: Send + Sync {
    fn connection(&self, name: &str, force_master: bool) -> Result<Arc<dyn Connection>, ConnectionError>;
}

/// A statement as it reached a connection
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    pub connection: String,
    pub force_master: bool,
    pub sql: String,
    pub params: Params,
}

#[derive(Default)]
struct RecordingState {
    rows: HashMap<String, Vec<Row>>,
    affected_rows: u64,
    failures: HashMap<String, String>,
    executed: Vec<ExecutedStatement>,
}

/// In-memory provider that records every statement it receives.
///
/// Fetches return the rows seeded for the connection (none by default);
/// updates report the configured affected-row count. Any connection name is
/// accepted unless `restrict_to` limits the known names. Statements on a
/// connection marked with `fail_queries` are recorded, then fail.
#[derive(Clone, Default)]
pub struct RecordingConnectionProvider {
    state: Arc<RwLock<RecordingState>>,
    known: Option<Arc<Vec<String>>>,
}

impl RecordingConnectionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only hand out the given connection names
    pub fn restrict_to<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known = Some(Arc::new(names.into_iter().map(Into::into).collect()));
        self
    }

    /// Rows returned by every fetch on `connection`
    pub fn seed_rows(&self, connection: impl Into<String>, rows: Vec<Row>) {
        self.state.write().rows.insert(connection.into(), rows);
    }

    pub fn set_affected_rows(&self, count: u64) {
        self.state.write().affected_rows = count;
    }

    /// Make every statement on `connection` fail with `message`
    pub fn fail_queries(&self, connection: impl Into<String>, message: impl Into<String>) {
        self.state.write().failures.insert(connection.into(), message.into());
    }

    /// Every statement executed so far, oldest first
    pub fn executed(&self) -> Vec<ExecutedStatement> {
        self.state.read().executed.clone()
    }

    pub fn execution_count(&self) -> usize {
        self.state.read().executed.len()
    }

    pub fn last_executed(&self) -> Option<ExecutedStatement> {
        self.state.read().executed.last().cloned()
    }
}

impl ConnectionProvider for RecordingConnectionProvider {
    fn connection(&self, name: &str, force_master: bool) -> Result<Arc<dyn Connection>, ConnectionError> {
        if let Some(known) = &self.known {
            if !known.iter().any(|k| k == name) {
                return Err(ConnectionError::UnknownConnection(name.to_string()));
            }
        }
        Ok(Arc::new(RecordingConnection {
            name: name.to_string(),
            force_master,
            state: Arc::clone(&self.state),
        }))
    }
}

struct RecordingConnection {
    name: String,
    force_master: bool,
    state: Arc<RwLock<RecordingState>>,
}

impl RecordingConnection {
    fn record(&self, sql: &str, params: &Params) -> Result<(), ConnectionError> {
        trace!(connection = %self.name, sql = %sql, params = params.len(), "Recorded statement");
        let mut state = self.state.write();
        state.executed.push(ExecutedStatement {
            connection: self.name.clone(),
            force_master: self.force_master,
            sql: sql.to_string(),
            params: params.clone(),
        });
        match state.failures.get(&self.name) {
            Some(message) => Err(ConnectionError::Query {
                connection: self.name.clone(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Connection for RecordingConnection {
    fn fetch_all(&self, sql: &str, params: &Params) -> Result<Vec<Row>, ConnectionError> {
        self.record(sql, params)?;
        Ok(self.state.read().rows.get(&self.name).cloned().unwrap_or_default())
    }

    fn execute_update(&self, sql: &str, params: &Params) -> Result<u64, ConnectionError> {
        self.record(sql, params)?;
        Ok(self.state.read().affected_rows)
    }
}
