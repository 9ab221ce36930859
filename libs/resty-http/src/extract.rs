use std::ops::Deref;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use resty_query::{PreparedQuery, QueryBuilder, QueryParams};

use crate::error::query_error_to_problem;
use crate::problem::{bad_request, ProblemResponse};

pub const MAX_QUERY_LEN: usize = 8 * 1024;

/// Axum extractor for list-query parameters.
///
/// Usage in handlers:
///   async fn list_widgets(State(s): State<AppState>, query: ListQuery) { query.prepare(&s.builder)? ... }
#[derive(Debug, Clone)]
pub struct ListQuery {
    params: QueryParams,
    instance: String,
}

impl ListQuery {
    pub fn new(params: QueryParams, instance: impl Into<String>) -> Self {
        Self {
            params,
            instance: instance.into(),
        }
    }

    #[inline]
    pub fn into_inner(self) -> QueryParams {
        self.params
    }

    /// Request path, used as the Problem `instance`.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Validate against a view's builder; errors come back as Problem responses.
    pub fn prepare(&self, builder: &QueryBuilder) -> Result<PreparedQuery, ProblemResponse> {
        builder
            .prepare(&self.params)
            .map_err(|e| query_error_to_problem(&e, &self.instance))
    }
}

impl Deref for ListQuery {
    type Target = QueryParams;
    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.params
    }
}

impl AsRef<QueryParams> for ListQuery {
    #[inline]
    fn as_ref(&self) -> &QueryParams {
        &self.params
    }
}

impl<S> FromRequestParts<S> for ListQuery
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts.uri.query().unwrap_or("");
        if raw.len() > MAX_QUERY_LEN {
            return Err(bad_request("Query string too long"));
        }
        let params = QueryParams::parse(raw);
        tracing::trace!(
            filters = params.filters.len(),
            sort = ?params.sort,
            page = ?params.page,
            "extracted list query"
        );
        Ok(ListQuery::new(params, parts.uri.path()))
    }
}
