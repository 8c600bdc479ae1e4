//! Criteria grammar for identifier queries
//!
//! A criterion binds a field key (optionally dotted `table.column`) to one of:
//!
//! ```text
//! Scalar | List<Scalar | Reference | Null | Expression> | Null | Reference | Expression
//! ```
//!
//! All keys are ANDed together. The SQL rendering lives next to the schema
//! resolver; this module only carries the shape.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::value::Value;

/// Anything that can stand in for its own identifier inside a criterion
pub trait Identifiable {
    fn identifier(&self) -> Value;
}

/// One member of a list criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ListItem {
    Scalar(Value),
    Reference(Value),
    Null,
    Expression(String),
}

impl ListItem {
    pub fn reference<T: Identifiable + ?Sized>(entity: &T) -> Self {
        ListItem::Reference(entity.identifier())
    }

    pub fn expression(fragment: impl Into<String>) -> Self {
        ListItem::Expression(fragment.into())
    }
}

impl From<Value> for ListItem {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => ListItem::Null,
            other => ListItem::Scalar(other),
        }
    }
}

impl From<i64> for ListItem {
    fn from(v: i64) -> Self {
        ListItem::Scalar(Value::Int(v))
    }
}

impl From<i32> for ListItem {
    fn from(v: i32) -> Self {
        ListItem::Scalar(Value::Int(v as i64))
    }
}

impl From<&str> for ListItem {
    fn from(v: &str) -> Self {
        ListItem::Scalar(Value::from(v))
    }
}

impl From<String> for ListItem {
    fn from(v: String) -> Self {
        ListItem::Scalar(Value::Text(v))
    }
}

impl<T: Into<ListItem>> From<Option<T>> for ListItem {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(ListItem::Null)
    }
}

/// Value side of a criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CriteriaValue {
    /// Equality against a bound parameter
    Scalar(Value),
    /// Inclusion; a null member adds an `IS NULL` branch
    List(Vec<ListItem>),
    /// `IS NULL`
    Null,
    /// Equality against an entity's identifier
    Reference(Value),
    /// Pre-rendered boolean fragment, inserted verbatim (caller-trusted)
    Expression(String),
}

impl CriteriaValue {
    pub fn reference<T: Identifiable + ?Sized>(entity: &T) -> Self {
        CriteriaValue::Reference(entity.identifier())
    }

    pub fn expression(fragment: impl Into<String>) -> Self {
        CriteriaValue::Expression(fragment.into())
    }

    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ListItem>,
    {
        CriteriaValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for CriteriaValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => CriteriaValue::Null,
            other => CriteriaValue::Scalar(other),
        }
    }
}

impl From<i64> for CriteriaValue {
    fn from(v: i64) -> Self {
        CriteriaValue::Scalar(Value::Int(v))
    }
}

impl From<i32> for CriteriaValue {
    fn from(v: i32) -> Self {
        CriteriaValue::Scalar(Value::Int(v as i64))
    }
}

impl From<bool> for CriteriaValue {
    fn from(v: bool) -> Self {
        CriteriaValue::Scalar(Value::Bool(v))
    }
}

impl From<&str> for CriteriaValue {
    fn from(v: &str) -> Self {
        CriteriaValue::Scalar(Value::from(v))
    }
}

impl From<String> for CriteriaValue {
    fn from(v: String) -> Self {
        CriteriaValue::Scalar(Value::Text(v))
    }
}

impl<T: Into<ListItem>> From<Vec<T>> for CriteriaValue {
    fn from(items: Vec<T>) -> Self {
        CriteriaValue::list(items)
    }
}

/// Accumulated criteria for one query, keyed by field.
///
/// Keys are kept sorted: key order never changes the result set, and sorted
/// keys keep rendered SQL and cache keys stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Criteria(BTreeMap<String, CriteriaValue>);

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<CriteriaValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a criterion, replacing any previous value for the key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<CriteriaValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&CriteriaValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CriteriaValue)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<CriteriaValue>> FromIterator<(K, V)> for Criteria {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Criteria(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct User {
        id: i64,
    }

    impl Identifiable for User {
        fn identifier(&self) -> Value {
            Value::Int(self.id)
        }
    }

    #[test]
    fn test_reference_unwraps_identifier() {
        let user = User { id: 12 };
        assert_eq!(CriteriaValue::reference(&user), CriteriaValue::Reference(Value::Int(12)));
        assert_eq!(ListItem::reference(&user), ListItem::Reference(Value::Int(12)));
    }

    #[test]
    fn test_null_value_becomes_null_criterion() {
        assert_eq!(CriteriaValue::from(Value::Null), CriteriaValue::Null);
        assert_eq!(ListItem::from(None::<i64>), ListItem::Null);
    }

    #[test]
    fn test_key_order_does_not_matter() {
        let a = Criteria::new().with("b", 2).with("a", 1);
        let b = Criteria::new().with("a", 1).with("b", 2);
        assert_eq!(a, b);

        let keys: Vec<_> = a.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_insert_replaces_previous_value() {
        let mut criteria = Criteria::new();
        criteria.insert("status", "draft");
        criteria.insert("status", vec![Some(1), None]);

        assert_eq!(criteria.len(), 1);
        assert_eq!(
            criteria.get("status"),
            Some(&CriteriaValue::List(vec![ListItem::Scalar(Value::Int(1)), ListItem::Null]))
        );
    }
}
