use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::sort::SortDirection;

/// Comparison operator carried by a [`Predicate`].
///
/// Generic substring filtering only ever emits [`Operator::Like`]; the rest
/// exist for override handlers that need typed comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
}

/// A single AND-combined condition on the query being built
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub operator: Operator,
    pub value: Value,
}

impl Predicate {
    pub fn new(column: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            column: column.into(),
            operator,
            value,
        }
    }

    /// Substring-match predicate, the engine's generic filter shape
    pub fn contains(column: impl Into<String>, needle: &str) -> Self {
        Self::new(column, Operator::Like, Value::String(format!("%{needle}%")))
    }
}

/// OR-combined predicates applied to the query as one scoped group
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateGroup {
    predicates: Vec<Predicate>,
}

impl PredicateGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn or(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// Failure while applying one predicate or ordering clause to a query
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    #[error("value for column {column} cannot be used in a {operator:?} predicate")]
    UnsupportedValue { column: String, operator: Operator },

    #[error("{0}")]
    Backend(String),
}

/// Minimum surface the engine needs from a query-building collaborator.
///
/// Predicates combine with AND, predicate groups combine OR internally, and
/// ordering clauses append in call order. Implementations report failures
/// instead of panicking; the engine isolates them per field.
#[cfg_attr(test, mockall::automock)]
pub trait QueryBuilder {
    fn add_predicate(&mut self, predicate: Predicate) -> Result<(), QueryError>;

    /// Apply `group` as one scoped, OR-combined condition
    fn add_predicate_group(&mut self, group: PredicateGroup) -> Result<(), QueryError>;

    fn add_ordering(&mut self, column: &str, direction: SortDirection) -> Result<(), QueryError>;

    /// Table names of the joins already registered on the query
    fn joined_tables(&self) -> Vec<String>;

    /// Whether `table` is already joined, by exact table-name match.
    ///
    /// For override handlers that want to add a join at most once.
    fn is_joined(&self, table: &str) -> bool {
        self.joined_tables().iter().any(|t| t == table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_wraps_value_in_wildcards() {
        let predicate = Predicate::contains("email", "x@y.com");
        assert_eq!(predicate.operator, Operator::Like);
        assert_eq!(predicate.value, Value::String("%x@y.com%".to_string()));
    }

    #[test]
    fn test_group_preserves_insertion_order() {
        let group = PredicateGroup::new()
            .or(Predicate::contains("name", "jo"))
            .or(Predicate::contains("email", "jo"));
        let columns: Vec<&str> = group.predicates().iter().map(|p| p.column.as_str()).collect();
        assert_eq!(columns, ["name", "email"]);
    }
}
