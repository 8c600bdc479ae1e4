//! Error types for selector sources and cursors

use strata_router_core::SchemaError;
use strata_types::Value;
use thiserror::Error;

/// Selector error types
#[derive(Debug, Error)]
pub enum SelectorError {
    /// Query options carry no table
    #[error("Table must be set for selector source")]
    TableRequired,

    /// Query options carry no identifier field
    #[error("Id field must be set for selector source")]
    IdFieldRequired,

    /// The source cannot be populated
    #[error("{0} selector source can't save results")]
    UnsupportedSave(&'static str),

    /// A chain was built without tiers
    #[error("Chain needs at least one source")]
    EmptyChain,

    /// Every tier declined the query
    #[error("No selector source could load data")]
    NoData,

    /// Cursor is not positioned on an element
    #[error("Can't retrieve the current element")]
    CursorExhausted,

    /// Count query returned something other than an integer
    #[error("Count query returned a non-integer value: {0}")]
    InvalidCount(Value),

    /// Cache key could not be rendered
    #[error("Failed to build cache key: {0}")]
    CacheKey(#[from] serde_json::Error),

    /// Resolution, grammar or connection failure
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
