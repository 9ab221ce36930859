use axum::{
    response::{IntoResponse, Response},
    Json,
};
use resty_query::{PageMeta, QueryResult};
use serde::{Deserialize, Serialize};

/// List body: `{"data": [...], "meta": {...}}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>, meta: PageMeta) -> Self {
        Self { data, meta }
    }
}

impl<T> From<QueryResult<T>> for ListResponse<T> {
    fn from(r: QueryResult<T>) -> Self {
        Self {
            data: r.items,
            meta: r.meta,
        }
    }
}

impl<T: Serialize> IntoResponse for ListResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
