use std::collections::HashMap;

use thiserror::Error;

use crate::definition::FilterDefinition;
use crate::engine::{FilterEngine, FilterRequest};
use crate::query::QueryBuilder;

#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("no filter definition registered for subject {0:?}")]
    UnknownSubject(String),
}

/// Explicit subject → [`FilterDefinition`] registry.
///
/// Callers that dispatch on a subject identifier (an entity name, a route
/// tag) register each definition up front and resolve it here; a miss is the
/// one fatal error of a pass. Registering a definition of the wrong shape is
/// unrepresentable, the registry only stores `FilterDefinition<Q>`.
pub struct FilterRegistry<Q> {
    definitions: HashMap<String, FilterDefinition<Q>>,
}

impl<Q> Default for FilterRegistry<Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q> FilterRegistry<Q> {
    pub fn new() -> Self {
        Self {
            definitions: HashMap::new(),
        }
    }

    pub fn register(mut self, subject: impl Into<String>, definition: FilterDefinition<Q>) -> Self {
        self.definitions.insert(subject.into(), definition);
        self
    }

    pub fn resolve(&self, subject: &str) -> Result<&FilterDefinition<Q>, ResolveError> {
        self.definitions
            .get(subject)
            .ok_or_else(|| ResolveError::UnknownSubject(subject.to_string()))
    }
}

impl<Q: QueryBuilder> FilterRegistry<Q> {
    /// Resolve `subject` and drive a full pass over `query`: filter, sort,
    /// hand the query back for execution.
    pub fn apply(&self, subject: &str, query: Q, request: &FilterRequest) -> Result<Q, ResolveError> {
        let definition = self.resolve(subject)?;
        Ok(FilterEngine::new(query, definition, request).finish())
    }
}
