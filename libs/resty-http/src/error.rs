use std::fmt::Display;

use axum::http::StatusCode;
use resty_query::{CursorError, Error as QueryError, FetchError};

use crate::problem::{internal_error, Problem, ProblemResponse, ValidationError};

/// Map a list-query error to an RFC 9457 Problem response.
///
/// Page-size and page-parameter errors are 422; everything else is 400.
pub fn query_error_to_problem(e: &QueryError, instance: &str) -> ProblemResponse {
    let (status, title, code) = match e {
        QueryError::UnknownFilterField(_) => {
            (StatusCode::BAD_REQUEST, "Unknown Filter", "UNKNOWN_FILTER_FIELD")
        }
        QueryError::InvalidFilterValue { .. } => (
            StatusCode::BAD_REQUEST,
            "Invalid Filter Value",
            "INVALID_FILTER_VALUE",
        ),
        QueryError::InvalidSortField(_) => (
            StatusCode::BAD_REQUEST,
            "Unsupported Sort Field",
            "INVALID_SORT_FIELD",
        ),
        QueryError::InvalidCursor(c) => {
            (StatusCode::BAD_REQUEST, "Invalid Cursor", cursor_code(c))
        }
        QueryError::ConflictingPaginationParameters => (
            StatusCode::BAD_REQUEST,
            "Conflicting Pagination Parameters",
            "CONFLICTING_PAGINATION_PARAMETERS",
        ),
        QueryError::PageSizeExceeded { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "Page Size Exceeded",
            "PAGE_SIZE_EXCEEDED",
        ),
        QueryError::InvalidPageParameter { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid Page Parameter",
            "INVALID_PAGE_PARAMETER",
        ),
    };

    let detail = e.to_string();
    let mut problem = Problem::new(status, title, detail.clone())
        .with_code(code)
        .with_instance(instance);
    if let Some(pointer) = e.param() {
        problem = problem.with_errors(vec![ValidationError { detail, pointer }]);
    }
    problem.into()
}

fn cursor_code(e: &CursorError) -> &'static str {
    match e {
        CursorError::InvalidBase64 => "CURSOR_INVALID_BASE64",
        CursorError::InvalidJson => "CURSOR_INVALID_JSON",
        CursorError::InvalidVersion => "CURSOR_INVALID_VERSION",
        CursorError::KeyCountMismatch { .. } => "CURSOR_INVALID_KEYS",
        CursorError::KindMismatch { .. } => "CURSOR_INVALID_KEYS",
    }
}

/// Map a fetch failure: query errors as above, collection errors as 500.
pub fn fetch_error_to_problem<E: Display>(e: &FetchError<E>, instance: &str) -> ProblemResponse {
    match e {
        FetchError::Query(q) => query_error_to_problem(q, instance),
        FetchError::Collection(inner) => {
            tracing::error!(error = %inner, "collection failed while listing");
            let mut resp = internal_error("An internal error occurred");
            resp.0 = resp.0.with_code("COLLECTION_ERROR").with_instance(instance);
            resp
        }
    }
}

impl From<QueryError> for ProblemResponse {
    fn from(e: QueryError) -> Self {
        query_error_to_problem(&e, "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_filter_points_at_param() {
        let resp = query_error_to_problem(&QueryError::UnknownFilterField("shape".into()), "/w");
        let p = resp.0;
        assert_eq!(p.status, 400);
        assert_eq!(p.code, "UNKNOWN_FILTER_FIELD");
        assert_eq!(p.instance, "/w");
        assert_eq!(
            p.errors.unwrap(),
            vec![ValidationError {
                detail: "unknown filter field: shape".into(),
                pointer: "filter[shape]".into(),
            }]
        );
    }

    #[test]
    fn page_errors_are_unprocessable() {
        let p = query_error_to_problem(
            &QueryError::PageSizeExceeded {
                requested: 500,
                max: 100,
            },
            "/",
        )
        .0;
        assert_eq!(p.status, 422);
        assert!(p.errors.is_none());

        let p = query_error_to_problem(
            &QueryError::InvalidPageParameter {
                param: "number".into(),
                reason: "page numbers start at 1".into(),
            },
            "/",
        )
        .0;
        assert_eq!(p.status, 422);
        assert_eq!(p.errors.unwrap()[0].pointer, "page[number]");
    }

    #[test]
    fn cursor_errors_have_specific_codes() {
        let p = query_error_to_problem(&QueryError::InvalidCursor(CursorError::InvalidJson), "/").0;
        assert_eq!(p.status, 400);
        assert_eq!(p.code, "CURSOR_INVALID_JSON");
    }

    #[test]
    fn collection_errors_hide_details() {
        let e: FetchError<&str> = FetchError::Collection("disk on fire");
        let p = fetch_error_to_problem(&e, "/w").0;
        assert_eq!(p.status, 500);
        assert_eq!(p.code, "COLLECTION_ERROR");
        assert!(!p.detail.contains("disk"));
    }
}
