//! Selector
//!
//! Lazy cursor over the identifiers matching one query.
//!
//! # Lifecycle
//!
//! ```text
//!            filter / order_by / limit
//!                     │
//!                     ▼
//! UNPREPARED ──first cursor access──► PREPARED        (one IDENTIFIERS load)
//!
//! COUNT_UNPREPARED ──count()──► COUNT_PREPARED        (one COUNT load)
//! ```
//!
//! The two caches are independent: counting and iterating the same selector
//! costs two source round-trips. Order and limit only shape the identifier
//! load, and only if set before it happens.

use std::sync::Arc;
use tracing::debug;

use strata_types::{CriteriaValue, Criteria, IdentifierSet, Row, Value};

use crate::error::SelectorError;
use crate::options::{QueryOptions, ResultKind};
use crate::source::SelectorSource;

/// Stateful identifier cursor driven by one source
pub struct Selector {
    source: Arc<dyn SelectorSource>,
    options: QueryOptions,
    criteria: Criteria,
    order_by: Option<String>,
    limit: Option<u64>,
    ids: Option<IdentifierSet>,
    count: Option<u64>,
    position: usize,
}

impl Selector {
    /// Selector over `table` reading through `source`
    pub fn new(source: Arc<dyn SelectorSource>, table: impl Into<String>) -> Self {
        Self::with_options(source, QueryOptions::for_table(table))
    }

    /// Selector with explicit base options; per-query result, order and
    /// limit are set by the selector itself
    pub fn with_options(source: Arc<dyn SelectorSource>, options: QueryOptions) -> Self {
        Self {
            source,
            options,
            criteria: Criteria::new(),
            order_by: None,
            limit: None,
            ids: None,
            count: None,
            position: 0,
        }
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    // =========================================================================
    // Query shape
    // =========================================================================

    /// Add (or replace) a criterion
    pub fn filter(&mut self, key: impl Into<String>, value: impl Into<CriteriaValue>) -> &mut Self {
        self.criteria.insert(key, value);
        self
    }

    pub fn id_fields<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.id_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn sharding_key_field(&mut self, field: impl Into<String>) -> &mut Self {
        self.options.sharding_key_field = Some(field.into());
        self
    }

    pub fn sharding_key(&mut self, key: impl Into<Value>) -> &mut Self {
        self.options.sharding_key = Some(key.into());
        self
    }

    pub fn force_master(&mut self, force_master: bool) -> &mut Self {
        self.options.force_master = force_master;
        self
    }

    /// Ordering of the identifier load; ignored once prepared
    pub fn order_by(&mut self, order_by: impl Into<String>) -> &mut Self {
        self.order_by = Some(order_by.into());
        self
    }

    /// Limit of the identifier load; ignored once prepared
    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    /// Clear the accumulated criteria.
    ///
    /// Resolved identifiers and count are kept.
    pub fn reset(&mut self) -> &mut Self {
        self.criteria.clear();
        self
    }

    // =========================================================================
    // Preparation
    // =========================================================================

    pub fn is_prepared(&self) -> bool {
        self.ids.is_some()
    }

    pub fn is_count_prepared(&self) -> bool {
        self.count.is_some()
    }

    fn load(&self, options: &QueryOptions) -> Result<IdentifierSet, SelectorError> {
        self.source
            .load_ids(&self.criteria, options)?
            .ok_or(SelectorError::NoData)
    }

    fn prepare_query(&mut self) -> Result<&IdentifierSet, SelectorError> {
        if self.ids.is_none() {
            let mut options = self.options.clone().with_result(ResultKind::Identifiers);
            options.order_by = self.order_by.clone();
            options.limit = self.limit;

            let ids = self.load(&options)?;
            debug!(table = ?options.table, source = self.source.name(), ids = ids.len(), "Prepared selector");
            self.position = 0;
            self.ids = Some(ids);
        }

        Ok(self.ids.get_or_insert_with(Vec::new))
    }

    fn prepare_count(&mut self) -> Result<u64, SelectorError> {
        if let Some(count) = self.count {
            return Ok(count);
        }

        let options = self.options.clone().with_result(ResultKind::Count);
        let rows = self.load(&options)?;
        let count = match rows.first().and_then(|row| row.values().next()) {
            None => 0,
            Some(value) => value
                .as_i64()
                .and_then(|n| u64::try_from(n).ok())
                .ok_or_else(|| SelectorError::InvalidCount(value.clone()))?,
        };

        debug!(table = ?options.table, source = self.source.name(), count, "Prepared selector count");
        self.count = Some(count);
        Ok(count)
    }

    // =========================================================================
    // Results
    // =========================================================================

    /// Every resolved identifier row
    pub fn ids(&mut self) -> Result<&IdentifierSet, SelectorError> {
        self.prepare_query()
    }

    /// Number of matching rows, from its own count query
    pub fn count(&mut self) -> Result<u64, SelectorError> {
        self.prepare_count()
    }

    /// Borrowing iterator over the resolved rows, independent of the cursor
    pub fn iter(&mut self) -> Result<std::slice::Iter<'_, Row>, SelectorError> {
        Ok(self.prepare_query()?.iter())
    }

    /// Drop cached results of this selector's table in every tier
    pub fn invalidate_global(&self) -> Result<(), SelectorError> {
        self.source.invalidate_global(&self.options)
    }

    // =========================================================================
    // Cursor
    // =========================================================================

    /// Row under the cursor
    pub fn current(&mut self) -> Result<&Row, SelectorError> {
        let position = self.position;
        self.prepare_query()?
            .get(position)
            .ok_or(SelectorError::CursorExhausted)
    }

    /// Sharding key of the row under the cursor, when a sharding-key field is set
    pub fn current_sharding_key(&mut self) -> Result<Option<&Value>, SelectorError> {
        let Some(field) = self.options.sharding_key_field.clone() else {
            return Ok(None);
        };
        Ok(self.current()?.get(&field))
    }

    /// Cursor position, or `None` past the end
    pub fn key(&mut self) -> Result<Option<usize>, SelectorError> {
        let position = self.position;
        let len = self.prepare_query()?.len();
        Ok((position < len).then_some(position))
    }

    /// Advance the cursor; it stops one past the last row
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<(), SelectorError> {
        let len = self.prepare_query()?.len();
        self.position = (self.position + 1).min(len);
        Ok(())
    }

    /// Whether the cursor is on a row
    pub fn valid(&mut self) -> Result<bool, SelectorError> {
        Ok(self.key()?.is_some())
    }

    /// Move back to the first row without reloading
    pub fn rewind(&mut self) -> Result<(), SelectorError> {
        self.prepare_query()?;
        self.position = 0;
        Ok(())
    }
}

impl std::fmt::Debug for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selector")
            .field("source", &self.source.name())
            .field("options", &self.options)
            .field("criteria", &self.criteria)
            .field("order_by", &self.order_by)
            .field("limit", &self.limit)
            .field("ids", &self.ids.as_ref().map(Vec::len))
            .field("count", &self.count)
            .field("position", &self.position)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::ScriptedSource;
    use strata_types::row;

    fn ids(values: &[i64]) -> IdentifierSet {
        values.iter().map(|v| row([("id", *v)])).collect()
    }

    fn selector(source: &Arc<ScriptedSource>) -> Selector {
        let source: Arc<dyn SelectorSource> = source.clone();
        Selector::new(source, "items")
    }

    #[test]
    fn test_prepares_once() {
        let source = Arc::new(ScriptedSource::hit(ids(&[1, 2, 3])));
        let mut s = selector(&source);

        assert!(!s.is_prepared());
        assert_eq!(s.ids().unwrap().len(), 3);
        s.current().unwrap();
        s.next().unwrap();
        s.valid().unwrap();
        s.rewind().unwrap();

        assert!(s.is_prepared());
        assert_eq!(source.loads(), 1);
    }

    #[test]
    fn test_walks_rows_in_order() {
        let source = Arc::new(ScriptedSource::hit(ids(&[5, 6])));
        let mut s = selector(&source);

        let mut seen = Vec::new();
        s.rewind().unwrap();
        while s.valid().unwrap() {
            let key = s.key().unwrap().unwrap();
            let id = s.current().unwrap()["id"].clone();
            seen.push((key, id));
            s.next().unwrap();
        }

        assert_eq!(seen, vec![(0, Value::Int(5)), (1, Value::Int(6))]);
        assert_eq!(s.key().unwrap(), None);
        assert!(matches!(s.current(), Err(SelectorError::CursorExhausted)));
    }

    #[test]
    fn test_cursor_saturates_at_end() {
        let source = Arc::new(ScriptedSource::hit(ids(&[1])));
        let mut s = selector(&source);

        for _ in 0..5 {
            s.next().unwrap();
        }
        assert!(!s.valid().unwrap());

        // One rewind is enough to get back, however far next() was pushed
        s.rewind().unwrap();
        assert_eq!(s.current().unwrap()["id"], Value::Int(1));
        assert_eq!(source.loads(), 1);
    }

    #[test]
    fn test_empty_identifier_set() {
        let source = Arc::new(ScriptedSource::hit(vec![]));
        let mut s = selector(&source);

        assert!(!s.valid().unwrap());
        assert!(matches!(s.current(), Err(SelectorError::CursorExhausted)));
    }

    #[test]
    fn test_count_and_iteration_are_separate_loads() {
        let source = Arc::new(ScriptedSource::hit(vec![row([("COUNT(`id`)", Value::from("2"))])]));
        let mut s = selector(&source);

        assert_eq!(s.count().unwrap(), 2);
        s.valid().unwrap();
        assert_eq!(source.loads(), 2);

        // Both are cached afterwards
        s.count().unwrap();
        s.rewind().unwrap();
        assert_eq!(source.loads(), 2);
        assert!(s.is_count_prepared());
    }

    #[test]
    fn test_count_edge_cases() {
        let empty = Arc::new(ScriptedSource::hit(vec![]));
        assert_eq!(selector(&empty).count().unwrap(), 0);

        let bogus = Arc::new(ScriptedSource::hit(vec![row([("c", "many")])]));
        assert!(matches!(
            selector(&bogus).count(),
            Err(SelectorError::InvalidCount(Value::Text(_)))
        ));
    }

    #[test]
    fn test_miss_is_hard_failure() {
        let source = Arc::new(ScriptedSource::miss());
        let mut s = selector(&source);

        assert!(matches!(s.valid(), Err(SelectorError::NoData)));
        assert!(matches!(s.count(), Err(SelectorError::NoData)));
        assert!(!s.is_prepared());
    }

    // Pinned behavior: reset() only clears criteria, cached results survive.
    #[test]
    fn test_reset_keeps_prepared_results() {
        let source = Arc::new(ScriptedSource::hit(ids(&[1, 2])));
        let mut s = selector(&source);
        s.filter("status", "open");

        s.ids().unwrap();
        s.count().ok();
        s.reset();

        assert!(s.criteria().is_empty());
        assert!(s.is_prepared());
        assert_eq!(s.ids().unwrap().len(), 2);
        assert_eq!(source.loads(), 2);
    }

    #[test]
    fn test_fluent_setters_accumulate() {
        let source = Arc::new(ScriptedSource::hit(vec![]));
        let mut s = selector(&source);
        s.filter("a", 1)
            .filter("b", vec![Some(2), None])
            .order_by("id DESC")
            .limit(10)
            .sharding_key_field("tenant_id")
            .force_master(true);

        assert_eq!(s.criteria().len(), 2);
        assert_eq!(s.options().sharding_key_field.as_deref(), Some("tenant_id"));
        assert!(s.options().force_master);
    }

    #[test]
    fn test_current_sharding_key() {
        let rows = vec![row([("id", Value::Int(1)), ("tenant_id", Value::Int(7))])];
        let source = Arc::new(ScriptedSource::hit(rows));

        let mut plain = selector(&source);
        assert_eq!(plain.current_sharding_key().unwrap(), None);

        let mut sharded = selector(&source);
        sharded.sharding_key_field("tenant_id");
        assert_eq!(sharded.current_sharding_key().unwrap(), Some(&Value::Int(7)));
    }

    #[test]
    fn test_invalidate_global_forwards() {
        let source = Arc::new(ScriptedSource::hit(vec![]));
        let s = selector(&source);
        s.invalidate_global().unwrap();
        assert_eq!(source.invalidations(), 1);
    }

    #[test]
    fn test_order_and_limit_shape_only_the_first_identifier_load() {
        let source = Arc::new(ScriptedSource::hit(ids(&[1, 2])));
        let mut s = selector(&source);
        s.order_by("id DESC").limit(2);

        s.ids().unwrap();
        let loaded = source.last_options().unwrap();
        assert_eq!(loaded.result, ResultKind::Identifiers);
        assert_eq!(loaded.order_by.as_deref(), Some("id DESC"));
        assert_eq!(loaded.limit, Some(2));

        // Too late: the identifiers are already resolved
        s.order_by("id ASC").limit(50);
        s.rewind().unwrap();
        assert_eq!(source.loads(), 1);
        assert_eq!(s.current().unwrap()["id"], Value::Int(1));

        // The count query carries neither
        s.count().unwrap();
        let counted = source.last_options().unwrap();
        assert_eq!(counted.result, ResultKind::Count);
        assert_eq!(counted.order_by, None);
        assert_eq!(counted.limit, None);
        assert_eq!(counted.table.as_deref(), Some("items"));
    }
}
