//! Query options passed from selectors down through sources

use serde::{Deserialize, Serialize};

use strata_router_core::{FetchOptions, DEFAULT_ID_FIELD};
use strata_types::Value;

/// What an identifier query returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultKind {
    /// Identifier rows (plus the sharding-key column when configured)
    Identifiers,
    /// A single row holding the match count
    Count,
}

impl std::fmt::Display for ResultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultKind::Identifiers => write!(f, "identifiers"),
            ResultKind::Count => write!(f, "count"),
        }
    }
}

/// Shape of one identifier query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Logical table
    pub table: Option<String>,

    /// Identifiers or count
    pub result: ResultKind,

    /// Identifier columns (`"col as alias"` accepted)
    pub id_fields: Vec<String>,

    /// Column appended to identifier rows so each row can find its shard again
    pub sharding_key_field: Option<String>,

    /// Sharding key routing this query
    pub sharding_key: Option<Value>,

    /// Read from master connections
    pub force_master: bool,

    pub order_by: Option<String>,
    pub limit: Option<u64>,
    pub group_by: Option<String>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            table: None,
            result: ResultKind::Identifiers,
            id_fields: vec![DEFAULT_ID_FIELD.to_string()],
            sharding_key_field: None,
            sharding_key: None,
            force_master: false,
            order_by: None,
            limit: None,
            group_by: None,
        }
    }
}

impl QueryOptions {
    /// Default options reading from `table`
    pub fn for_table(table: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            ..Self::default()
        }
    }

    pub fn with_result(mut self, result: ResultKind) -> Self {
        self.result = result;
        self
    }

    pub fn with_id_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.id_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sharding_key_field(mut self, field: impl Into<String>) -> Self {
        self.sharding_key_field = Some(field.into());
        self
    }

    pub fn with_sharding_key(mut self, key: impl Into<Value>) -> Self {
        self.sharding_key = Some(key.into());
        self
    }

    pub fn with_force_master(mut self, force_master: bool) -> Self {
        self.force_master = force_master;
        self
    }

    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_group_by(mut self, group_by: impl Into<String>) -> Self {
        self.group_by = Some(group_by.into());
        self
    }

    /// Trailing SELECT clauses
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            group_by: self.group_by.clone(),
            order_by: self.order_by.clone(),
            limit: self.limit,
        }
    }
}
