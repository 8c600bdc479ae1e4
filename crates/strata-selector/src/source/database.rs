//! Database Source
//!
//! Terminal tier: renders the identifier (or count) query and runs it through
//! the schema resolver. An empty result is still data, so this tier never
//! answers "no data".

use std::sync::Arc;
use tracing::debug;

use strata_router_core::{quote_identifier, SchemaManager, TableSpec};
use strata_types::{Criteria, IdentifierSet};

use super::SelectorSource;
use crate::error::SelectorError;
use crate::options::{QueryOptions, ResultKind};

/// Authoritative tier backed by the schema resolver
#[derive(Debug, Clone)]
pub struct DatabaseSource {
    schema: Arc<SchemaManager>,
}

impl DatabaseSource {
    pub fn new(schema: Arc<SchemaManager>) -> Self {
        Self { schema }
    }

    /// Column list for the query
    fn fields(options: &QueryOptions) -> Vec<String> {
        match options.result {
            ResultKind::Count => {
                // "col as alias" counts the column, not the alias
                let columns: Vec<String> = options
                    .id_fields
                    .iter()
                    .map(|field| {
                        let column = field.split(" as ").next().unwrap_or(field).trim();
                        quote_identifier(column)
                    })
                    .collect();
                vec![format!("COUNT({})", columns.join(","))]
            }
            ResultKind::Identifiers => {
                let mut fields = options.id_fields.clone();
                if let Some(sharding_key_field) = options.sharding_key_field.as_ref().filter(|f| !f.is_empty()) {
                    fields.push(sharding_key_field.clone());
                }
                fields
            }
        }
    }
}

impl SelectorSource for DatabaseSource {
    fn load_ids(&self, criteria: &Criteria, options: &QueryOptions) -> Result<Option<IdentifierSet>, SelectorError> {
        let table = options
            .table
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(SelectorError::TableRequired)?;
        if options.id_fields.is_empty() {
            return Err(SelectorError::IdFieldRequired);
        }

        let fields = Self::fields(options);
        let rows = self.schema.fetch_ids(
            &TableSpec::from(table),
            criteria,
            &fields,
            options.sharding_key.as_ref(),
            options.force_master,
            &options.fetch_options(),
        )?;

        debug!(table = %table, result = %options.result, rows = rows.len(), "Loaded ids from database");
        Ok(Some(rows))
    }

    fn save_ids(&self, _ids: &IdentifierSet, _criteria: &Criteria, _options: &QueryOptions) -> Result<(), SelectorError> {
        Err(SelectorError::UnsupportedSave(self.name()))
    }

    fn invalidate_global(&self, _options: &QueryOptions) -> Result<(), SelectorError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Database"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{ConnectionError, RecordingConnectionProvider, SchemaConfig, TableConfig};
    use strata_router_core::SchemaError;
    use strata_types::{row, Value};

    fn source() -> (DatabaseSource, RecordingConnectionProvider) {
        let provider = RecordingConnectionProvider::new();
        let schema = SchemaConfig::new()
            .with_table("articles", TableConfig::single("db_main"))
            .with_table(
                "comments",
                TableConfig::new()
                    .with_shard("0", "db_c0")
                    .with_shard("1", "db_c1")
                    .with_strategy("modulo"),
            );
        let manager = SchemaManager::new(schema, Arc::new(provider.clone()));
        (DatabaseSource::new(Arc::new(manager)), provider)
    }

    #[test]
    fn test_identifiers_query() {
        let (db, provider) = source();
        provider.seed_rows("db_main", vec![row([("id", 1)]), row([("id", 2)])]);

        let options = QueryOptions::for_table("articles").with_order_by("id").with_limit(2);
        let ids = db
            .load_ids(&Criteria::new().with("author", 3), &options)
            .unwrap()
            .unwrap();
        assert_eq!(ids.len(), 2);

        let executed = provider.last_executed().unwrap();
        assert_eq!(executed.sql, "SELECT id FROM `articles` WHERE `author`=:author ORDER BY id LIMIT 2");
        assert!(!executed.force_master);
    }

    #[test]
    fn test_empty_result_is_data() {
        let (db, _) = source();
        let ids = db
            .load_ids(&Criteria::new(), &QueryOptions::for_table("articles"))
            .unwrap();
        assert_eq!(ids, Some(vec![]));
    }

    #[test]
    fn test_sharding_key_field_appended() {
        let (db, provider) = source();
        let options = QueryOptions::for_table("comments")
            .with_sharding_key_field("article_id")
            .with_sharding_key(5)
            .with_force_master(true);

        db.load_ids(&Criteria::new().with("article_id", 5), &options).unwrap();

        let executed = provider.last_executed().unwrap();
        assert_eq!(executed.connection, "db_c1");
        assert!(executed.force_master);
        assert_eq!(
            executed.sql,
            "SELECT id,article_id FROM `comments_1` WHERE `article_id`=:article_id"
        );
    }

    #[test]
    fn test_count_query_strips_aliases() {
        let (db, provider) = source();
        provider.seed_rows("db_main", vec![row([("COUNT(`id`)", Value::Int(4))])]);

        let options = QueryOptions::for_table("articles")
            .with_id_fields(["id as article"])
            .with_result(ResultKind::Count);
        let result = db.load_ids(&Criteria::new(), &options).unwrap().unwrap();
        assert_eq!(result[0].values().next(), Some(&Value::Int(4)));

        assert_eq!(provider.last_executed().unwrap().sql, "SELECT COUNT(`id`) FROM `articles`");
    }

    #[test]
    fn test_required_options() {
        let (db, provider) = source();

        assert!(matches!(
            db.load_ids(&Criteria::new(), &QueryOptions::default()),
            Err(SelectorError::TableRequired)
        ));
        assert!(matches!(
            db.load_ids(&Criteria::new(), &QueryOptions::for_table("")),
            Err(SelectorError::TableRequired)
        ));
        assert!(matches!(
            db.load_ids(&Criteria::new(), &QueryOptions::for_table("articles").with_id_fields(Vec::<String>::new())),
            Err(SelectorError::IdFieldRequired)
        ));
        assert_eq!(provider.execution_count(), 0);
    }

    #[test]
    fn test_resolution_errors_propagate() {
        let (db, _) = source();
        assert!(matches!(
            db.load_ids(&Criteria::new(), &QueryOptions::for_table("comments")),
            Err(SelectorError::Schema(SchemaError::AmbiguousShard { .. }))
        ));
    }

    #[test]
    fn test_driver_errors_propagate() {
        let (db, provider) = source();
        provider.fail_queries("db_main", "lost connection");

        assert!(matches!(
            db.load_ids(&Criteria::new(), &QueryOptions::for_table("articles")),
            Err(SelectorError::Schema(SchemaError::Connection(ConnectionError::Query { .. })))
        ));
    }

    #[test]
    fn test_save_unsupported() {
        let (db, _) = source();
        assert!(matches!(
            db.save_ids(&vec![], &Criteria::new(), &QueryOptions::for_table("articles")),
            Err(SelectorError::UnsupportedSave("Database"))
        ));
        assert!(db.invalidate_global(&QueryOptions::default()).is_ok());
    }
}
