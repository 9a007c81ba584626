use serde_json::{Map, Value};
use tracing::debug;

use crate::definition::FilterDefinition;
use crate::diagnostics::{Diagnostic, Stage};
use crate::query::{Operator, Predicate, PredicateGroup, QueryBuilder, QueryError};
use crate::sort::{SortSegment, parse_sort_expression};

/// Reserved request key carrying the sort expression
pub const SORT_KEY: &str = "sort";

/// Sentinel sort value disabling explicit ordering for one request while
/// keeping the mandatory trailing clause
pub const NO_SORT: &str = "NO_SORT";

/// Untyped request parameters in insertion order, e.g. a decoded query string
pub type FilterRequest = Map<String, Value>;

/// One-shot engine binding a query, a request and a [`FilterDefinition`] for
/// a single filter+sort pass.
///
/// The pipeline is fixed: the filter stage consumes every request key except
/// [`SORT_KEY`], the sort stage consumes the sort expression, and each
/// per-field step is isolated so one malformed field never aborts the rest.
/// Both stages run at most once per engine; [`finish`](Self::finish) runs
/// whatever has not run yet and hands the query back for execution.
pub struct FilterEngine<'a, Q: QueryBuilder> {
    query: Q,
    definition: &'a FilterDefinition<Q>,
    request: &'a FilterRequest,
    default_sort: Option<String>,
    filtered: bool,
    sorted: bool,
    diagnostics: Vec<Diagnostic>,
}

impl<'a, Q: QueryBuilder> FilterEngine<'a, Q> {
    pub fn new(query: Q, definition: &'a FilterDefinition<Q>, request: &'a FilterRequest) -> Self {
        Self {
            query,
            definition,
            request,
            default_sort: definition.default_sort_expression().map(str::to_owned),
            filtered: false,
            sorted: false,
            diagnostics: Vec::new(),
        }
    }

    /// Replace the definition-level default sort expression for this pass
    pub fn with_default_sort(mut self, expression: impl Into<String>) -> Self {
        self.default_sort = Some(expression.into());
        self
    }

    /// Apply the filter stage: per request key, invoke the override handler
    /// registered for it, fall back to the generic substring predicate when
    /// the key is declared filterable, otherwise ignore the key.
    pub fn apply_filters(&mut self) {
        if self.filtered {
            return;
        }
        self.filtered = true;

        let definition = self.definition;
        if let Some(hook) = definition.initial_hook() {
            if let Err(err) = hook(&mut self.query) {
                self.record(Stage::Filter, "<initial>", err);
            }
        }

        let request = self.request;
        for (key, value) in request {
            if key == SORT_KEY {
                continue;
            }
            if let Err(err) = self.apply_filter_field(key, value) {
                self.record(Stage::Filter, key, err);
            }
        }
    }

    /// Apply the sort stage: parse the effective sort expression, apply each
    /// segment (override or generic), then append the mandatory trailing
    /// clause when one is configured.
    pub fn apply_sort(&mut self) {
        if self.sorted {
            return;
        }
        self.sorted = true;

        if let Some(expression) = self.sort_expression() {
            for segment in parse_sort_expression(&expression) {
                if let Err(err) = self.apply_sort_segment(&segment) {
                    self.record(Stage::Sort, &segment.column, err);
                }
            }
        }

        // Appended even when it duplicates an explicit clause; trailing
        // position is what guarantees deterministic pagination.
        if let Some((column, direction)) = self.definition.mandatory_sort_clause() {
            if let Err(err) = self.query.add_ordering(column, direction) {
                self.record(Stage::Sort, column, err.into());
            }
        }
    }

    /// Per-field failures swallowed so far
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Run any stage that has not run yet, then hand the query back
    pub fn finish(mut self) -> Q {
        self.apply_filters();
        self.apply_sort();
        self.query
    }

    /// Like [`finish`](Self::finish), also yielding the swallowed diagnostics
    pub fn finish_with_diagnostics(mut self) -> (Q, Vec<Diagnostic>) {
        self.apply_filters();
        self.apply_sort();
        (self.query, self.diagnostics)
    }

    fn apply_filter_field(&mut self, key: &str, value: &Value) -> anyhow::Result<()> {
        let definition = self.definition;
        if let Some(handler) = definition.filter_handler(key) {
            return handler(&mut self.query, value);
        }
        if definition.is_search_key(key) {
            return self.search(key, value);
        }
        if definition.is_filterable(key) {
            let column = definition.resolve(key);
            self.column_search(column, value)?;
            return Ok(());
        }
        debug!(field = key, "ignoring undeclared filter field");
        Ok(())
    }

    fn apply_sort_segment(&mut self, segment: &SortSegment) -> anyhow::Result<()> {
        let definition = self.definition;
        let column = definition.resolve(&segment.column);
        if let Some(handler) = definition.sort_handler(column) {
            return handler(&mut self.query, segment.direction);
        }
        if definition.is_sortable(column) || definition.is_sortable(&segment.column) {
            self.query.add_ordering(column, segment.direction)?;
            return Ok(());
        }
        debug!(column, "ignoring undeclared sort column");
        Ok(())
    }

    /// Effective sort expression for this pass: the request value unless it
    /// is the [`NO_SORT`] sentinel, else the configured default. A non-string
    /// request value counts as absent.
    fn sort_expression(&self) -> Option<String> {
        match self.request.get(SORT_KEY).and_then(Value::as_str) {
            Some(NO_SORT) => None,
            Some(explicit) => Some(explicit.to_owned()),
            None => self.default_sort.clone(),
        }
    }

    fn column_search(&mut self, column: &str, value: &Value) -> Result<(), QueryError> {
        let needle = scalar_text(column, value)?;
        self.query.add_predicate(Predicate::contains(column, &needle))
    }

    /// One OR-grouped substring match across every filterable column
    fn search(&mut self, key: &str, value: &Value) -> anyhow::Result<()> {
        let definition = self.definition;
        let needle = scalar_text(key, value)?;
        let mut group = PredicateGroup::new();
        for column in definition.filterable_columns() {
            group = group.or(Predicate::contains(column, &needle));
        }
        if group.is_empty() {
            return Ok(());
        }
        self.query.add_predicate_group(group)?;
        Ok(())
    }

    fn record(&mut self, stage: Stage, field: &str, err: anyhow::Error) {
        debug!(?stage, field, error = %err, "skipping field after per-field failure");
        self.diagnostics.push(Diagnostic {
            stage,
            field: field.to_string(),
            message: err.to_string(),
        });
    }
}

/// Stringify a scalar request value for a substring match
fn scalar_text(column: &str, value: &Value) -> Result<String, QueryError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(QueryError::UnsupportedValue {
            column: column.to_string(),
            operator: Operator::Like,
        }),
    }
}
