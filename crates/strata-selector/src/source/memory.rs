//! Memory Source
//!
//! In-process cache tier. Holds only what a chain saved into it, grouped by
//! table so a table's entries can be dropped at once.

use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, trace};

use strata_types::{Criteria, IdentifierSet};

use super::SelectorSource;
use crate::error::SelectorError;
use crate::options::QueryOptions;

/// Cache tier keyed by table, then by rendered query
#[derive(Debug, Default)]
pub struct MemorySource {
    entries: RwLock<HashMap<String, HashMap<String, IdentifierSet>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical key of a query: criteria plus every option shaping the result
    fn cache_key(criteria: &Criteria, options: &QueryOptions) -> Result<String, SelectorError> {
        Ok(serde_json::to_string(&(criteria, options))?)
    }

    fn table_of(options: &QueryOptions) -> String {
        options.table.clone().unwrap_or_default()
    }

    /// Number of cached queries across all tables
    pub fn len(&self) -> usize {
        self.entries.read().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SelectorSource for MemorySource {
    fn load_ids(&self, criteria: &Criteria, options: &QueryOptions) -> Result<Option<IdentifierSet>, SelectorError> {
        let key = Self::cache_key(criteria, options)?;
        let entries = self.entries.read();
        let found = entries
            .get(&Self::table_of(options))
            .and_then(|table| table.get(&key))
            .cloned();

        trace!(table = ?options.table, hit = found.is_some(), "Memory tier lookup");
        Ok(found)
    }

    fn save_ids(&self, ids: &IdentifierSet, criteria: &Criteria, options: &QueryOptions) -> Result<(), SelectorError> {
        let key = Self::cache_key(criteria, options)?;
        self.entries
            .write()
            .entry(Self::table_of(options))
            .or_default()
            .insert(key, ids.clone());
        Ok(())
    }

    fn invalidate_global(&self, options: &QueryOptions) -> Result<(), SelectorError> {
        let mut entries = self.entries.write();
        match &options.table {
            Some(table) => {
                let dropped = entries.remove(table).map(|t| t.len()).unwrap_or(0);
                debug!(table = %table, dropped, "Invalidated memory tier table");
            }
            None => {
                entries.clear();
                debug!("Invalidated whole memory tier");
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ResultKind;
    use strata_types::row;

    #[test]
    fn test_miss_then_hit() {
        let memory = MemorySource::new();
        let criteria = Criteria::new().with("status", "open");
        let options = QueryOptions::for_table("tickets");

        assert_eq!(memory.load_ids(&criteria, &options).unwrap(), None);

        let data = vec![row([("id", 1)]), row([("id", 4)])];
        memory.save_ids(&data, &criteria, &options).unwrap();
        assert_eq!(memory.load_ids(&criteria, &options).unwrap(), Some(data));
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn test_key_covers_result_shape() {
        let memory = MemorySource::new();
        let criteria = Criteria::new().with("status", "open");
        let ids = QueryOptions::for_table("tickets");
        memory.save_ids(&vec![row([("id", 1)])], &criteria, &ids).unwrap();

        let count = ids.clone().with_result(ResultKind::Count);
        assert_eq!(memory.load_ids(&criteria, &count).unwrap(), None);

        let limited = ids.clone().with_limit(1);
        assert_eq!(memory.load_ids(&criteria, &limited).unwrap(), None);

        let other = Criteria::new().with("status", "closed");
        assert_eq!(memory.load_ids(&other, &ids).unwrap(), None);
    }

    #[test]
    fn test_invalidate_by_table() {
        let memory = MemorySource::new();
        let criteria = Criteria::new();
        let tickets = QueryOptions::for_table("tickets");
        let users = QueryOptions::for_table("users");
        memory.save_ids(&vec![], &criteria, &tickets).unwrap();
        memory.save_ids(&vec![], &criteria, &users).unwrap();

        memory.invalidate_global(&tickets).unwrap();
        assert_eq!(memory.load_ids(&criteria, &tickets).unwrap(), None);
        assert_eq!(memory.load_ids(&criteria, &users).unwrap(), Some(vec![]));

        memory.invalidate_global(&QueryOptions::default()).unwrap();
        assert!(memory.is_empty());
    }
}
