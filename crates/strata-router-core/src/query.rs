//! Statement construction
//!
//! Renders criteria into parameterized WHERE clauses. Column keys are always
//! quoted and values always bound; only `Expression` criteria reach the SQL
//! text verbatim.
//!
//! # Criteria rendering
//!
//! ```text
//! scalar / reference   `k`=:k
//! null                 `k` IS NULL
//! expression           <fragment>            (dropped when empty)
//! [v]                  same as v
//! [e.., null, v..]     (e OR `k` IS NULL OR `k` IN (:k0,:k1,..))
//! []                   1 = 0
//! ```
//!
//! Placeholder names are unique within a statement: a name already taken by
//! an earlier criterion gets a `_1`, `_2`, ... suffix.

use std::collections::HashSet;

use strata_core::Params;
use strata_types::{Criteria, CriteriaValue, ListItem, Value};

use crate::error::SchemaError;

/// Tables a SELECT reads from
#[derive(Debug, Clone, PartialEq)]
pub enum TableSpec {
    /// One logical table
    Single(String),
    /// Several logical tables on the same connection, in FROM/JOIN order
    Joined(Vec<(String, JoinSpec)>),
}

impl TableSpec {
    pub fn joined<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, JoinSpec)>,
        S: Into<String>,
    {
        TableSpec::Joined(entries.into_iter().map(|(k, j)| (k.into(), j)).collect())
    }

    /// Comma-separated logical names, for error messages
    pub fn describe(&self) -> String {
        match self {
            TableSpec::Single(table) => table.clone(),
            TableSpec::Joined(entries) => entries
                .iter()
                .map(|(key, _)| key.as_str())
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

impl From<&str> for TableSpec {
    fn from(table: &str) -> Self {
        TableSpec::Single(table.to_string())
    }
}

impl From<String> for TableSpec {
    fn from(table: String) -> Self {
        TableSpec::Single(table)
    }
}

/// How one table takes part in a multi-table read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinSpec {
    /// Logical table, when it differs from the entry key
    pub table: Option<String>,
    /// `AS` alias for tables listed in FROM
    pub alias: Option<String>,
    /// Raw join fragment; `{table}` is replaced by the quoted physical name
    pub join: Option<String>,
}

impl JoinSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn join(mut self, fragment: impl Into<String>) -> Self {
        self.join = Some(fragment.into());
        self
    }
}

/// Trailing clauses of a SELECT, appended verbatim
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOptions {
    pub group_by: Option<String>,
    pub order_by: Option<String>,
    pub limit: Option<u64>,
}

/// A fully rendered statement bound to its connection
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub connection: String,
    pub force_master: bool,
    pub sql: String,
    pub params: Params,
}

/// Quote a possibly dotted key: `users.id` → `` `users`.`id` ``
pub fn quote_identifier(key: &str) -> String {
    key.split('.')
        .map(|part| format!("`{}`", part.replace('`', "``")))
        .collect::<Vec<_>>()
        .join(".")
}

/// Placeholder name for a key: `users.id` → `:users_id`
pub fn parameter_name(key: &str) -> String {
    let sanitized: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!(":{}", sanitized)
}

/// Named parameters of one statement
#[derive(Default)]
struct Bindings {
    taken: HashSet<String>,
    params: Vec<(String, Value)>,
}

impl Bindings {
    /// Bind `value` under `candidate`, or under the first free suffixed name
    fn bind(&mut self, candidate: String, value: &Value) -> String {
        let name = if self.taken.insert(candidate.clone()) {
            candidate
        } else {
            let mut suffix = 1;
            loop {
                let name = format!("{}_{}", candidate, suffix);
                if self.taken.insert(name.clone()) {
                    break name;
                }
                suffix += 1;
            }
        };
        self.params.push((name.clone(), value.clone()));
        name
    }
}

/// Render SELECT criteria into AND-ed clauses plus named parameters
pub(crate) fn render_where(criteria: &Criteria) -> (Vec<String>, Vec<(String, Value)>) {
    let mut clauses = Vec::with_capacity(criteria.len());
    let mut bindings = Bindings::default();

    for (key, value) in criteria.iter() {
        match value {
            CriteriaValue::List(items) if items.len() == 1 => {
                let single = list_item_as_value(&items[0]);
                render_single(key, &single, &mut clauses, &mut bindings);
            }
            CriteriaValue::List(items) => render_list(key, items, &mut clauses, &mut bindings),
            other => render_single(key, other, &mut clauses, &mut bindings),
        }
    }

    (clauses, bindings.params)
}

fn list_item_as_value(item: &ListItem) -> CriteriaValue {
    match item {
        ListItem::Scalar(v) => CriteriaValue::Scalar(v.clone()),
        ListItem::Reference(v) => CriteriaValue::Reference(v.clone()),
        ListItem::Null => CriteriaValue::Null,
        ListItem::Expression(e) => CriteriaValue::Expression(e.clone()),
    }
}

fn render_single(
    key: &str,
    value: &CriteriaValue,
    clauses: &mut Vec<String>,
    bindings: &mut Bindings,
) {
    match value {
        CriteriaValue::Null | CriteriaValue::Scalar(Value::Null) => {
            clauses.push(format!("{} IS NULL", quote_identifier(key)))
        }
        CriteriaValue::Scalar(v) | CriteriaValue::Reference(v) => {
            let name = bindings.bind(parameter_name(key), v);
            clauses.push(format!("{}={}", quote_identifier(key), name));
        }
        CriteriaValue::Expression(fragment) => {
            if !fragment.trim().is_empty() {
                clauses.push(fragment.clone());
            }
        }
        CriteriaValue::List(items) => render_list(key, items, clauses, bindings),
    }
}

fn render_list(
    key: &str,
    items: &[ListItem],
    clauses: &mut Vec<String>,
    bindings: &mut Bindings,
) {
    if items.is_empty() {
        clauses.push("1 = 0".to_string());
        return;
    }

    let base = parameter_name(key);
    let column = quote_identifier(key);
    let mut branches = Vec::new();
    let mut placeholders = Vec::new();
    let mut has_null = false;

    for item in items {
        match item {
            ListItem::Null | ListItem::Scalar(Value::Null) => has_null = true,
            ListItem::Scalar(v) | ListItem::Reference(v) => {
                let name = bindings.bind(format!("{}{}", base, placeholders.len()), v);
                placeholders.push(name);
            }
            ListItem::Expression(fragment) => {
                if !fragment.trim().is_empty() {
                    branches.push(fragment.clone());
                }
            }
        }
    }

    if has_null {
        branches.push(format!("{} IS NULL", column));
    }
    if !placeholders.is_empty() {
        branches.push(format!("{} IN ({})", column, placeholders.join(",")));
    }

    match branches.len() {
        0 => {}
        1 => clauses.extend(branches),
        _ => clauses.push(format!("({})", branches.join(" OR "))),
    }
}

/// Render DELETE criteria into AND-ed clauses plus positional parameters.
///
/// Deletion only accepts equality and inclusion over concrete values.
pub(crate) fn render_delete_where(criteria: &Criteria) -> Result<(Vec<String>, Vec<Value>), SchemaError> {
    let mut clauses = Vec::with_capacity(criteria.len());
    let mut values = Vec::new();

    for (key, value) in criteria.iter() {
        let column = quote_identifier(key);
        match value {
            CriteriaValue::Null | CriteriaValue::Scalar(Value::Null) => {
                return Err(unsupported(key, "null is not supported for delete"));
            }
            CriteriaValue::Scalar(v) | CriteriaValue::Reference(v) => {
                clauses.push(format!("{} = ?", column));
                values.push(v.clone());
            }
            CriteriaValue::List(items) if !items.is_empty() => {
                for item in items {
                    match item {
                        ListItem::Null | ListItem::Scalar(Value::Null) | ListItem::Expression(_) => {
                            return Err(unsupported(key, "delete lists accept values and references only"));
                        }
                        ListItem::Scalar(v) | ListItem::Reference(v) => values.push(v.clone()),
                    }
                }
                clauses.push(format!("{} IN ({})", column, vec!["?"; items.len()].join(",")));
            }
            CriteriaValue::List(_) => return Err(unsupported(key, "empty list")),
            CriteriaValue::Expression(_) => {
                return Err(unsupported(key, "expressions are not supported for delete"));
            }
        }
    }

    Ok((clauses, values))
}

fn unsupported(key: &str, reason: &'static str) -> SchemaError {
    SchemaError::UnsupportedCriteriaValue {
        key: key.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn where_of(criteria: Criteria) -> (String, Vec<(String, Value)>) {
        let (clauses, params) = render_where(&criteria);
        (clauses.join(" AND "), params)
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("id"), "`id`");
        assert_eq!(quote_identifier("users.id"), "`users`.`id`");
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_parameter_name() {
        assert_eq!(parameter_name("users.id"), ":users_id");
        assert_eq!(parameter_name("a b;--"), ":a_b___");
    }

    #[test]
    fn test_list_with_null() {
        let (sql, params) = where_of(Criteria::new().with("x", vec![Some(1), Some(2), None]));

        assert_eq!(sql, "(`x` IS NULL OR `x` IN (:x0,:x1))");
        assert_eq!(
            params,
            vec![(":x0".to_string(), Value::Int(1)), (":x1".to_string(), Value::Int(2))]
        );
    }

    #[test]
    fn test_list_order_only_changes_names() {
        let (sql, params) = where_of(Criteria::new().with("x", vec![None, Some(2), Some(1)]));

        assert_eq!(sql, "(`x` IS NULL OR `x` IN (:x0,:x1))");
        let values: Vec<_> = params.into_iter().map(|(_, v)| v).collect();
        assert_eq!(values, vec![Value::Int(2), Value::Int(1)]);
    }

    #[test]
    fn test_scalar_null_and_reference() {
        let criteria = Criteria::new()
            .with("status", "active")
            .with("deleted_at", Value::Null)
            .with("users.owner_id", CriteriaValue::Reference(Value::Int(9)));
        let (sql, params) = where_of(criteria);

        assert_eq!(
            sql,
            "`deleted_at` IS NULL AND `status`=:status AND `users`.`owner_id`=:users_owner_id"
        );
        assert_eq!(params.len(), 2);
        assert_eq!(params[1], (":users_owner_id".to_string(), Value::Int(9)));
    }

    #[test]
    fn test_single_element_list_collapses() {
        let (sql, params) = where_of(Criteria::new().with("id", vec![5]));
        assert_eq!(sql, "`id`=:id");
        assert_eq!(params, vec![(":id".to_string(), Value::Int(5))]);

        let (sql, params) = where_of(Criteria::new().with("id", vec![None::<i64>]));
        assert_eq!(sql, "`id` IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn test_expressions() {
        let criteria = Criteria::new()
            .with("created", CriteriaValue::expression("`created` > NOW() - INTERVAL 1 DAY"))
            .with("ignored", CriteriaValue::expression("  "));
        let (sql, params) = where_of(criteria);
        assert_eq!(sql, "`created` > NOW() - INTERVAL 1 DAY");
        assert!(params.is_empty());

        let mixed = Criteria::new().with(
            "score",
            CriteriaValue::List(vec![
                ListItem::expression("`score` > 90"),
                ListItem::Scalar(Value::Int(50)),
            ]),
        );
        let (sql, _) = where_of(mixed);
        assert_eq!(sql, "(`score` > 90 OR `score` IN (:score0))");
    }

    #[test]
    fn test_empty_list_matches_nothing() {
        let (sql, params) = where_of(Criteria::new().with("id", Vec::<i64>::new()));
        assert_eq!(sql, "1 = 0");
        assert!(params.is_empty());
    }

    #[test]
    fn test_delete_grammar() {
        let criteria = Criteria::new()
            .with("id", vec![1, 2, 3])
            .with("owner", CriteriaValue::Reference(Value::Int(4)));
        let (clauses, values) = render_delete_where(&criteria).unwrap();

        assert_eq!(clauses, vec!["`id` IN (?,?,?)", "`owner` = ?"]);
        assert_eq!(values, vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)]);
    }

    #[test]
    fn test_delete_rejects_null_and_expressions() {
        let with_null = Criteria::new().with("id", vec![Some(1), None]);
        assert!(matches!(
            render_delete_where(&with_null),
            Err(SchemaError::UnsupportedCriteriaValue { key, .. }) if key == "id"
        ));

        let expr = Criteria::new().with("id", CriteriaValue::expression("id > 3"));
        assert!(render_delete_where(&expr).is_err());

        let null = Criteria::new().with("id", Value::Null);
        assert!(render_delete_where(&null).is_err());

        let empty = Criteria::new().with("id", Vec::<i64>::new());
        assert!(render_delete_where(&empty).is_err());
    }

    #[test]
    fn test_placeholder_names_stay_unique() {
        let (sql, params) = where_of(Criteria::new().with("x", vec![1, 2]).with("x0", 5));
        assert_eq!(sql, "`x` IN (:x0,:x1) AND `x0`=:x0_1");
        assert_eq!(
            params,
            vec![
                (":x0".to_string(), Value::Int(1)),
                (":x1".to_string(), Value::Int(2)),
                (":x0_1".to_string(), Value::Int(5)),
            ]
        );

        let criteria = Criteria::new().with("a-b", 1).with("a.b", 2).with("a_b", 3);
        let (sql, params) = where_of(criteria);
        assert_eq!(sql, "`a-b`=:a_b AND `a`.`b`=:a_b_1 AND `a_b`=:a_b_2");

        let names: HashSet<_> = params.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names.len(), params.len());
    }

    #[test]
    fn test_null_scalars_render_as_is_null() {
        let criteria = Criteria::new()
            .with("deleted_at", CriteriaValue::Scalar(Value::Null))
            .with(
                "parent",
                CriteriaValue::List(vec![
                    ListItem::Scalar(Value::Null),
                    ListItem::Scalar(Value::Int(3)),
                    ListItem::Scalar(Value::Int(4)),
                ]),
            );
        let (sql, params) = where_of(criteria);

        assert_eq!(sql, "`deleted_at` IS NULL AND (`parent` IS NULL OR `parent` IN (:parent0,:parent1))");
        assert_eq!(
            params,
            vec![(":parent0".to_string(), Value::Int(3)), (":parent1".to_string(), Value::Int(4))]
        );

        let single = CriteriaValue::List(vec![ListItem::Scalar(Value::Null)]);
        let (sql, params) = where_of(Criteria::new().with("parent", single));
        assert_eq!(sql, "`parent` IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn test_delete_rejects_null_scalars() {
        let scalar = Criteria::new().with("id", CriteriaValue::Scalar(Value::Null));
        assert!(matches!(
            render_delete_where(&scalar),
            Err(SchemaError::UnsupportedCriteriaValue { key, .. }) if key == "id"
        ));

        let listed = Criteria::new().with(
            "id",
            CriteriaValue::List(vec![ListItem::Scalar(Value::Int(1)), ListItem::Scalar(Value::Null)]),
        );
        assert!(matches!(
            render_delete_where(&listed),
            Err(SchemaError::UnsupportedCriteriaValue { .. })
        ));
    }
}
