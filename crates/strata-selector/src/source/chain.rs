//! Chain Source
//!
//! Probes its tiers in order. The first tier holding data answers; every tier
//! that missed before it is then fed that data, in tier order.

use std::sync::Arc;
use tracing::debug;

use strata_types::{Criteria, IdentifierSet};

use super::SelectorSource;
use crate::error::SelectorError;
use crate::options::QueryOptions;

/// Ordered composition of tiers with fallback and write-back
#[derive(Clone)]
pub struct Chain {
    sources: Vec<Arc<dyn SelectorSource>>,
}

impl Chain {
    /// Create a chain; at least one tier is required
    pub fn new(sources: Vec<Arc<dyn SelectorSource>>) -> Result<Self, SelectorError> {
        if sources.is_empty() {
            return Err(SelectorError::EmptyChain);
        }
        Ok(Self { sources })
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Tier names, in lookup order
    pub fn tier_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain").field("tiers", &self.tier_names()).finish()
    }
}

impl SelectorSource for Chain {
    fn load_ids(&self, criteria: &Criteria, options: &QueryOptions) -> Result<Option<IdentifierSet>, SelectorError> {
        let mut missed = Vec::new();

        for (index, source) in self.sources.iter().enumerate() {
            let Some(data) = source.load_ids(criteria, options)? else {
                debug!(tier = index, source = source.name(), "Chain tier missed");
                missed.push(index);
                continue;
            };

            debug!(tier = index, source = source.name(), backfill = missed.len(), "Chain tier hit");
            for &index in &missed {
                self.sources[index].save_ids(&data, criteria, options)?;
            }
            return Ok(Some(data));
        }

        debug!(tiers = self.sources.len(), "Every chain tier missed");
        Ok(None)
    }

    fn save_ids(&self, _ids: &IdentifierSet, _criteria: &Criteria, _options: &QueryOptions) -> Result<(), SelectorError> {
        Err(SelectorError::UnsupportedSave(self.name()))
    }

    fn invalidate_global(&self, options: &QueryOptions) -> Result<(), SelectorError> {
        let mut first_error = None;
        for source in &self.sources {
            if let Err(err) = source.invalidate_global(options) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn name(&self) -> &'static str {
        "Chain"
    }
}
