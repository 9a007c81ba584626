//! Declarative translation of untyped request parameters into query
//! modifications.
//!
//! A [`FilterDefinition`] declares, per use case, which columns may be
//! filtered by a generic substring match, which may be sorted, how external
//! field names alias to columns, and which fields carry override handlers
//! that fully own their mutation. A [`FilterEngine`] binds one definition,
//! one request mapping and one query for a single filter+sort pass; any
//! failure while resolving or applying a single field is swallowed and
//! recorded as a [`Diagnostic`], so one malformed parameter never aborts an
//! otherwise valid query. A configured mandatory trailing sort is always
//! appended last, keeping pagination deterministic regardless of caller
//! input.
//!
//! The engine targets anything implementing the small [`QueryBuilder`] port;
//! an adapter for `sea_orm::Select` ships behind the default `sea-orm`
//! feature, and an axum extractor for the request mapping behind the `axum`
//! feature.

pub mod definition;
pub mod diagnostics;
pub mod engine;
pub mod infrastructure;
pub mod query;
pub mod registry;
pub mod sort;

pub use definition::{FilterDefinition, FilterHandler, SortHandler};
pub use diagnostics::{Diagnostic, Stage};
pub use engine::{FilterEngine, FilterRequest, NO_SORT, SORT_KEY};
pub use query::{Operator, Predicate, PredicateGroup, QueryBuilder, QueryError};
pub use registry::{FilterRegistry, ResolveError};
pub use sort::{SortDirection, SortSegment, parse_sort_expression};
