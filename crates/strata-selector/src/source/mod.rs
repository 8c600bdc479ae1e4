//! Selector Sources
//!
//! A source is one tier able to answer an identifier query:
//!
//! - `DatabaseSource`: terminal tier, always answers (possibly with no rows)
//! - `MemorySource`: in-process cache tier, answers only what was saved into it
//! - `Chain`: ordered tiers with fallback probing and write-back
//!
//! # Probe order
//!
//! ```text
//! Chain [Memory, Database]
//!     │
//!     ▼
//! Memory.load_ids ──hit──► data
//!     │
//!    miss
//!     ▼
//! Database.load_ids ──► data ──► Memory.save_ids(data)
//! ```
//!
//! A miss is `Ok(None)`. It never leaves a chain that ends with a
//! `DatabaseSource`; only real failures travel as `Err`.

mod chain;
mod database;
mod memory;

pub use chain::Chain;
pub use database::DatabaseSource;
pub use memory::MemorySource;

use strata_types::{Criteria, IdentifierSet};

use crate::error::SelectorError;
use crate::options::QueryOptions;

/// One tier of identifier resolution
pub trait SelectorSource: Send + Sync {
    /// Answer the query, or `Ok(None)` when this tier holds no data for it
    fn load_ids(&self, criteria: &Criteria, options: &QueryOptions) -> Result<Option<IdentifierSet>, SelectorError>;

    /// Populate this tier with data loaded elsewhere
    fn save_ids(&self, ids: &IdentifierSet, criteria: &Criteria, options: &QueryOptions) -> Result<(), SelectorError>;

    /// Drop everything this tier holds for the options' table
    fn invalidate_global(&self, options: &QueryOptions) -> Result<(), SelectorError>;

    /// Source name for logging
    fn name(&self) -> &'static str;
}
