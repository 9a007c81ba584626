use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::sort::SortDirection;

/// Override handler replacing generic filtering for one request key.
///
/// The handler fully owns the mutation for its field and receives the raw
/// request value unchanged, structured values included.
pub type FilterHandler<Q> = Box<dyn Fn(&mut Q, &Value) -> anyhow::Result<()> + Send + Sync>;

/// Override handler replacing generic ordering for one resolved column
pub type SortHandler<Q> = Box<dyn Fn(&mut Q, SortDirection) -> anyhow::Result<()> + Send + Sync>;

type InitialHook<Q> = Box<dyn Fn(&mut Q) -> anyhow::Result<()> + Send + Sync>;

/// Declarative configuration for one filtering use case: which columns may be
/// filtered and sorted generically, how external field names map to columns,
/// the mandatory trailing sort, and the override handlers that replace
/// generic behavior for specific fields.
///
/// Definitions are built once with the fluent methods below and never mutated
/// during a pass. Handlers are `Send + Sync`, so a definition can be shared
/// read-only across threads, e.g. from a [`FilterRegistry`](crate::FilterRegistry).
pub struct FilterDefinition<Q> {
    filterable: Vec<String>,
    sortable: Vec<String>,
    aliases: HashMap<String, String>,
    mandatory_sort: Option<(String, SortDirection)>,
    default_sort: Option<String>,
    filter_handlers: HashMap<String, FilterHandler<Q>>,
    sort_handlers: HashMap<String, SortHandler<Q>>,
    search_keys: HashSet<String>,
    initial: Option<InitialHook<Q>>,
}

impl<Q> Default for FilterDefinition<Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q> FilterDefinition<Q> {
    pub fn new() -> Self {
        Self {
            filterable: Vec::new(),
            sortable: Vec::new(),
            aliases: HashMap::new(),
            mandatory_sort: None,
            default_sort: None,
            filter_handlers: HashMap::new(),
            sort_handlers: HashMap::new(),
            search_keys: HashSet::new(),
            initial: None,
        }
    }

    /// Declare columns eligible for the generic substring filter
    pub fn filterable<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filterable.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Declare columns eligible for generic ordering
    pub fn sortable<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sortable.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Map an external field name to an internal column name
    pub fn alias(mut self, external: impl Into<String>, column: impl Into<String>) -> Self {
        self.aliases.insert(external.into(), column.into());
        self
    }

    /// Ordering clause appended unconditionally after all explicit clauses,
    /// guaranteeing a deterministic result order regardless of caller input.
    pub fn mandatory_sort(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.mandatory_sort = Some((column.into(), direction));
        self
    }

    /// Sort expression used when the request carries none; same format as the
    /// `sort` request value.
    pub fn default_sort(mut self, expression: impl Into<String>) -> Self {
        self.default_sort = Some(expression.into());
        self
    }

    /// Register an override handler invoked instead of generic filtering for
    /// `field`, even when the field is also declared filterable.
    pub fn on_filter(
        mut self,
        field: impl Into<String>,
        handler: impl Fn(&mut Q, &Value) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.filter_handlers.insert(field.into(), Box::new(handler));
        self
    }

    /// Register an override handler invoked instead of generic ordering for
    /// the resolved column `column`.
    pub fn on_sort(
        mut self,
        column: impl Into<String>,
        handler: impl Fn(&mut Q, SortDirection) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.sort_handlers.insert(column.into(), Box::new(handler));
        self
    }

    /// Wire `key` to the free-text search: one OR-grouped substring match
    /// across every filterable column.
    pub fn search_key(mut self, key: impl Into<String>) -> Self {
        self.search_keys.insert(key.into());
        self
    }

    /// Hook run once at the start of the filter stage, for predicates common
    /// to every request of this use case.
    pub fn initial(
        mut self,
        hook: impl Fn(&mut Q) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.initial = Some(Box::new(hook));
        self
    }

    /// Alias-mapped column for `name`, or `name` itself when no alias exists
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Whether `key` (raw or alias-resolved) is declared filterable
    pub fn is_filterable(&self, key: &str) -> bool {
        let resolved = self.resolve(key);
        self.filterable.iter().any(|c| c == key || c == resolved)
    }

    /// Whether `column` is declared sortable
    pub fn is_sortable(&self, column: &str) -> bool {
        self.sortable.iter().any(|c| c == column)
    }

    /// Filterable columns in declaration order
    pub fn filterable_columns(&self) -> &[String] {
        &self.filterable
    }

    pub fn filter_handler(&self, field: &str) -> Option<&FilterHandler<Q>> {
        self.filter_handlers.get(field)
    }

    pub fn sort_handler(&self, column: &str) -> Option<&SortHandler<Q>> {
        self.sort_handlers.get(column)
    }

    pub fn is_search_key(&self, key: &str) -> bool {
        self.search_keys.contains(key)
    }

    pub fn mandatory_sort_clause(&self) -> Option<(&str, SortDirection)> {
        self.mandatory_sort
            .as_ref()
            .map(|(column, direction)| (column.as_str(), *direction))
    }

    pub fn default_sort_expression(&self) -> Option<&str> {
        self.default_sort.as_deref()
    }

    pub(crate) fn initial_hook(&self) -> Option<&InitialHook<Q>> {
        self.initial.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::MockQueryBuilder;

    fn definition() -> FilterDefinition<MockQueryBuilder> {
        FilterDefinition::new()
            .filterable(["email", "name"])
            .sortable(["created_at"])
            .alias("mail", "email")
    }

    #[test]
    fn test_resolve_is_identity_without_alias() {
        let definition = definition();
        assert_eq!(definition.resolve("mail"), "email");
        assert_eq!(definition.resolve("name"), "name");
    }

    #[test]
    fn test_alias_and_target_are_interchangeable() {
        let definition = definition();
        assert!(definition.is_filterable("email"));
        assert!(definition.is_filterable("mail"));
        assert!(!definition.is_filterable("age"));
    }

    #[test]
    fn test_sortable_checks_exact_column() {
        let definition = definition();
        assert!(definition.is_sortable("created_at"));
        assert!(!definition.is_sortable("email"));
    }
}
