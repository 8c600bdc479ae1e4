//! Strata Selector - Identifier Resolution Module
//!
//! Resolves identifier queries through an ordered chain of cache tiers
//! before falling back to the database.
//!
//! # Architecture
//!
//! ```text
//! Selector (criteria, order, limit)
//!     │  first cursor / count access
//!     ▼
//! ┌─────────────────────────┐
//! │         Chain           │  Probe tiers in order, backfill misses
//! └───────────┬─────────────┘
//!             │
//!     ┌───────┴────────┐
//!     ▼                ▼
//! MemorySource    DatabaseSource ──► SchemaManager
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use strata_selector::{Chain, DatabaseSource, MemorySource, Selector};
//!
//! let chain = Chain::new(vec![
//!     Arc::new(MemorySource::new()),
//!     Arc::new(DatabaseSource::new(schema_manager)),
//! ])?;
//!
//! let mut selector = Selector::new(Arc::new(chain), "articles");
//! selector.filter("author_id", 42).order_by("id DESC").limit(20);
//!
//! while selector.valid()? {
//!     let row = selector.current()?;
//!     selector.next()?;
//! }
//! ```

mod error;
mod options;
mod selector;
mod source;

// Re-exports: Error types
pub use error::SelectorError;

// Re-exports: Query options
pub use options::{QueryOptions, ResultKind};

// Re-exports: Sources
pub use source::{Chain, DatabaseSource, MemorySource, SelectorSource};

// Re-exports: Cursor
pub use selector::Selector;
