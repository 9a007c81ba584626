//! [`QueryBuilder`] adapter over a `sea_orm::Select`

use sea_orm::sea_query::{Alias, Condition, Expr, IntoColumnRef, Order, SimpleExpr};
use sea_orm::{EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationDef, Select};
use serde_json::Value;

use crate::query::{Operator, Predicate, PredicateGroup, QueryBuilder, QueryError};
use crate::sort::SortDirection;

/// Wraps a `Select` so the engine can add predicates and ordering clauses by
/// column name, and tracks the table names of joins registered through
/// [`join`](Self::join) for the join guard.
pub struct SeaOrmQuery<E: EntityTrait> {
    select: Option<Select<E>>,
    joins: Vec<String>,
}

impl<E: EntityTrait> SeaOrmQuery<E> {
    pub fn new(select: Select<E>) -> Self {
        Self {
            select: Some(select),
            joins: Vec::new(),
        }
    }

    /// Register a join and record its table name for [`QueryBuilder::is_joined`]
    pub fn join(&mut self, table: impl Into<String>, join: JoinType, relation: RelationDef) {
        self.update(|select| QuerySelect::join(select, join, relation));
        self.joins.push(table.into());
    }

    /// Hand the underlying select back for execution
    pub fn into_select(mut self) -> Select<E> {
        // `select` is only vacant inside an `update` call
        self.select.take().unwrap_or_else(E::find)
    }

    fn update(&mut self, f: impl FnOnce(Select<E>) -> Select<E>) {
        if let Some(select) = self.select.take() {
            self.select = Some(f(select));
        }
    }
}

impl<E: EntityTrait> From<Select<E>> for SeaOrmQuery<E> {
    fn from(select: Select<E>) -> Self {
        Self::new(select)
    }
}

impl<E: EntityTrait> QueryBuilder for SeaOrmQuery<E> {
    fn add_predicate(&mut self, predicate: Predicate) -> Result<(), QueryError> {
        let expr = predicate_expr(&predicate)?;
        self.update(|select| select.filter(expr));
        Ok(())
    }

    fn add_predicate_group(&mut self, group: PredicateGroup) -> Result<(), QueryError> {
        let mut condition = Condition::any();
        for predicate in group.predicates() {
            condition = condition.add(predicate_expr(predicate)?);
        }
        self.update(|select| select.filter(condition));
        Ok(())
    }

    fn add_ordering(&mut self, column: &str, direction: SortDirection) -> Result<(), QueryError> {
        let order = match direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };
        let expr = SimpleExpr::Column(Alias::new(column).into_column_ref());
        self.update(|select| select.order_by(expr, order));
        Ok(())
    }

    fn joined_tables(&self) -> Vec<String> {
        self.joins.clone()
    }
}

fn predicate_expr(predicate: &Predicate) -> Result<SimpleExpr, QueryError> {
    let column = Expr::col(Alias::new(predicate.column.as_str()));
    Ok(match predicate.operator {
        Operator::Eq => column.eq(scalar_value(predicate)?),
        Operator::Ne => column.ne(scalar_value(predicate)?),
        Operator::Gt => column.gt(scalar_value(predicate)?),
        Operator::Gte => column.gte(scalar_value(predicate)?),
        Operator::Lt => column.lt(scalar_value(predicate)?),
        Operator::Lte => column.lte(scalar_value(predicate)?),
        Operator::Like => column.like(pattern_text(predicate)?),
    })
}

fn scalar_value(predicate: &Predicate) -> Result<sea_orm::Value, QueryError> {
    match &predicate.value {
        Value::String(s) => Ok(s.clone().into()),
        Value::Bool(b) => Ok((*b).into()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i.into())
            } else if let Some(f) = n.as_f64() {
                Ok(f.into())
            } else {
                Err(unsupported(predicate))
            }
        }
        _ => Err(unsupported(predicate)),
    }
}

fn pattern_text(predicate: &Predicate) -> Result<String, QueryError> {
    match &predicate.value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(unsupported(predicate)),
    }
}

fn unsupported(predicate: &Predicate) -> QueryError {
    QueryError::UnsupportedValue {
        column: predicate.column.clone(),
        operator: predicate.operator,
    }
}
