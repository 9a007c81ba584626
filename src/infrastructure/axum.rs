//! Axum extractor for the engine's request mapping

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use serde_json::Value;

use crate::engine::FilterRequest;

/// Extractor decoding the query string into a [`FilterRequest`], one entry
/// per parameter in query-string order.
///
/// Extraction never rejects: an absent or undecodable query string yields an
/// empty request. Repeated parameters keep the last value, matching the
/// one-entry-per-key request mapping.
///
/// Usage:
/// ```rust,ignore
/// async fn handler(FilterParams(request): FilterParams) -> Result<Response, ApiError> {
///     let query = registry.apply("users", query, &request)?;
///     // execute the query
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct FilterParams(pub FilterRequest);

impl<S> FromRequestParts<S> for FilterParams
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(FilterParams(decode_query(parts.uri.query().unwrap_or(""))))
    }
}

fn decode_query(query_string: &str) -> FilterRequest {
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_str(query_string).unwrap_or_default();

    let mut request = FilterRequest::new();
    for (key, value) in pairs {
        request.insert(key, Value::String(value));
    }
    request
}
